//! # Event Bus
//!
//! Per-instance publish/subscribe channel with first-class one-shot
//! listeners.
//!
//! One-shot registration is a bus primitive here: `once` listeners are
//! consumed by the emission that fires them, with no unsubscribe
//! bookkeeping on the caller's side. The bus is generic over the context
//! value handed to listeners; the instance core uses `EventBus<Skein>` so
//! listeners receive the instance handle itself.
//!
//! ## Emission Protocol
//!
//! Emission is split into [`EventBus::take`] and [`EventBus::restore`] so
//! the emitter can release its borrow of the bus while listeners run.
//! Listeners may therefore subscribe, emit, or mutate the instance freely.
//! Listeners added during an emission do not run in that emission; they
//! are appended after the surviving listeners when the emitter restores.

use crate::types::EventKind;
use std::collections::BTreeMap;

/// A listener that fires on every emission of its event.
pub type PersistentListener<C> = Box<dyn FnMut(&C)>;

/// A listener consumed by the first emission of its event.
pub type OnceListener<C> = Box<dyn FnOnce(&C)>;

/// One registered listener.
pub enum Slot<C> {
    /// Fires every time; retained across emissions.
    Persistent(PersistentListener<C>),
    /// Fires once; dropped by the emission that fires it.
    Once(OnceListener<C>),
}

/// Per-instance event channel.
pub struct EventBus<C> {
    listeners: BTreeMap<EventKind, Vec<Slot<C>>>,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self {
            listeners: BTreeMap::new(),
        }
    }
}

impl<C> EventBus<C> {
    /// Create a new empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a persistent listener.
    pub fn on(&mut self, kind: EventKind, listener: PersistentListener<C>) {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Slot::Persistent(listener));
    }

    /// Register a one-shot listener.
    pub fn once(&mut self, kind: EventKind, listener: OnceListener<C>) {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Slot::Once(listener));
    }

    /// Number of listeners currently registered for an event.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Remove and return all listeners for an event.
    ///
    /// The emitter calls the returned slots in registration order, keeping
    /// the persistent ones, then hands the survivors back via
    /// [`EventBus::restore`].
    #[must_use]
    pub fn take(&mut self, kind: EventKind) -> Vec<Slot<C>> {
        self.listeners.remove(&kind).unwrap_or_default()
    }

    /// Reinstate surviving listeners after an emission.
    ///
    /// Survivors keep their original order and precede any listeners that
    /// were registered while the emission was in flight.
    pub fn restore(&mut self, kind: EventKind, mut kept: Vec<Slot<C>>) {
        let added_during_emit = self.listeners.remove(&kind).unwrap_or_default();
        kept.extend(added_during_emit);
        if !kept.is_empty() {
            self.listeners.insert(kind, kept);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
