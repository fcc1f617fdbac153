//! # Scratch Storage
//!
//! A typed key-value store for free-form per-instance annotations.
//!
//! The pad is parameterized by event-emission behavior at construction:
//! when emission is on, every mutation reports back to the caller so the
//! instance can emit a `scratch` change event. The pad itself never
//! touches the event bus; it only records whether it is configured to
//! emit, keeping it reusable for silent bookkeeping.

use std::collections::BTreeMap;

/// Per-instance scratch map with configurable change notification.
#[derive(Debug, Clone, Default)]
pub struct ScratchPad {
    entries: BTreeMap<String, serde_json::Value>,
    emit_on_change: bool,
}

impl ScratchPad {
    /// Create a pad, emitting change events or not.
    #[must_use]
    pub fn new(emit_on_change: bool) -> Self {
        Self {
            entries: BTreeMap::new(),
            emit_on_change,
        }
    }

    /// Whether mutations should be announced as change events.
    #[must_use]
    pub fn emits(&self) -> bool {
        self.emit_on_change
    }

    /// Read an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    /// Write an entry. Returns true when the stored value changed.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) -> bool {
        let key = key.into();
        if self.entries.get(&key) == Some(&value) {
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    /// Remove an entry. Returns true when an entry was actually removed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pad holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_change_only_when_value_differs() {
        let mut pad = ScratchPad::new(true);
        assert!(pad.set("k", serde_json::json!(1)));
        assert!(!pad.set("k", serde_json::json!(1)));
        assert!(pad.set("k", serde_json::json!(2)));
    }

    #[test]
    fn remove_reports_whether_an_entry_existed() {
        let mut pad = ScratchPad::new(false);
        pad.set("k", serde_json::json!("v"));
        assert!(pad.remove("k"));
        assert!(!pad.remove("k"));
        assert!(pad.is_empty());
    }

    #[test]
    fn emission_flag_is_fixed_at_construction() {
        assert!(ScratchPad::new(true).emits());
        assert!(!ScratchPad::new(false).emits());
    }
}
