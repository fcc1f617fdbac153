//! # Instance Registry
//!
//! Process-wide association between display surfaces and live instances.
//!
//! The registry is an explicit service object handed to construction, not
//! a side table ambiently attached to the surface. It enforces surface
//! exclusivity: claiming a surface destroys any live prior occupant
//! before the replacement is recorded. It also carries the queue of ready
//! callbacks registered against a surface before any instance existed
//! there; the queue survives occupant replacement and is consumed exactly
//! once, on the new occupant's ready transition.

use crate::instance::{ReadyCallback, Skein};
use crate::types::SurfaceId;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Default)]
struct RegistryEntry {
    /// The current live occupant, if any.
    instance: Option<Skein>,
    /// Ready callbacks awaiting the next occupant's ready transition.
    readies: Vec<ReadyCallback>,
}

/// Shared, cheap-clone handle over the surface/instance association.
#[derive(Clone, Default)]
pub struct InstanceRegistry {
    inner: Rc<RefCell<BTreeMap<SurfaceId, RegistryEntry>>>,
}

impl InstanceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an instance as the occupant of a surface.
    ///
    /// A live, non-destroyed prior occupant is destroyed first. Pending
    /// ready callbacks are preserved across the replacement.
    pub fn claim(&self, surface: SurfaceId, instance: &Skein) {
        let prior = {
            let mut inner = self.inner.borrow_mut();
            inner.entry(surface).or_default().instance.take()
        };
        // Destroy outside the borrow: destroy listeners may re-enter.
        if let Some(prior) = prior {
            if !prior.is_destroyed() {
                tracing::debug!(surface = surface.0, "registry: destroying prior occupant");
                prior.destroy();
            }
        }
        let mut inner = self.inner.borrow_mut();
        if let Some(entry) = inner.get_mut(&surface) {
            entry.instance = Some(instance.clone());
        }
    }

    /// The current occupant of a surface, if any.
    #[must_use]
    pub fn get(&self, surface: SurfaceId) -> Option<Skein> {
        self.inner
            .borrow()
            .get(&surface)
            .and_then(|entry| entry.instance.clone())
    }

    /// Run a callback when an instance on this surface is ready.
    ///
    /// When a ready occupant is already registered, the callback runs
    /// immediately, as if the ready event had just fired. Otherwise it is
    /// queued and bound on the next occupant's ready transition.
    pub fn on_ready(&self, surface: SurfaceId, callback: impl FnOnce(&Skein) + 'static) {
        let ready_instance = {
            let inner = self.inner.borrow();
            inner
                .get(&surface)
                .and_then(|entry| entry.instance.clone())
                .filter(|instance| instance.is_ready() && !instance.is_destroyed())
        };
        match ready_instance {
            Some(instance) => callback(&instance),
            None => {
                self.inner
                    .borrow_mut()
                    .entry(surface)
                    .or_default()
                    .readies
                    .push(Box::new(callback));
            }
        }
    }

    /// Drain the pending ready callbacks for a surface.
    ///
    /// Called by the occupant exactly once, on its ready transition.
    #[must_use]
    pub fn take_readies(&self, surface: SurfaceId) -> Vec<ReadyCallback> {
        self.inner
            .borrow_mut()
            .get_mut(&surface)
            .map(|entry| std::mem::take(&mut entry.readies))
            .unwrap_or_default()
    }

    /// Number of ready callbacks pending for a surface.
    #[must_use]
    pub fn pending_readies(&self, surface: SurfaceId) -> usize {
        self.inner
            .borrow()
            .get(&surface)
            .map_or(0, |entry| entry.readies.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::InstanceOptions;
    use crate::types::Surface;
    use std::cell::Cell;

    const SURFACE: Surface = Surface::new(1, 800, 600);

    #[tokio::test]
    async fn claim_destroys_prior_occupant() {
        let registry = InstanceRegistry::new();
        let first = Skein::new(
            InstanceOptions::new().container(SURFACE),
            &registry,
        )
        .await
        .expect("first");
        assert!(first.is_ready());

        let second = Skein::new(
            InstanceOptions::new().container(SURFACE),
            &registry,
        )
        .await
        .expect("second");

        assert!(first.is_destroyed());
        assert!(!second.is_destroyed());
        assert!(second.is_ready());
    }

    #[tokio::test]
    async fn callbacks_queued_before_any_instance_run_on_ready() {
        let registry = InstanceRegistry::new();
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        registry.on_ready(SURFACE.id, move |_| h.set(h.get() + 1));
        let h = Rc::clone(&hits);
        registry.on_ready(SURFACE.id, move |_| h.set(h.get() + 10));
        assert_eq!(registry.pending_readies(SURFACE.id), 2);

        let _cy = Skein::new(
            InstanceOptions::new().container(SURFACE),
            &registry,
        )
        .await
        .expect("construct");

        assert_eq!(hits.get(), 11);
        assert_eq!(registry.pending_readies(SURFACE.id), 0, "queue consumed once");
    }

    #[tokio::test]
    async fn on_ready_runs_immediately_for_a_ready_occupant() {
        let registry = InstanceRegistry::new();
        let _cy = Skein::new(
            InstanceOptions::new().container(SURFACE),
            &registry,
        )
        .await
        .expect("construct");

        let hit = Rc::new(Cell::new(false));
        let h = Rc::clone(&hit);
        registry.on_ready(SURFACE.id, move |cy| h.set(cy.is_ready()));
        assert!(hit.get());
    }
}
