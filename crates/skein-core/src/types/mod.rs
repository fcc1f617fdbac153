//! # Core Type Definitions
//!
//! This module contains the shared types for the Skein instance core:
//! - Identifiers (`ElementId`, `SurfaceId`)
//! - Element descriptions (`ElementDesc`, `Group`, `Position`)
//! - The display-surface handle (`Surface`)
//! - Instance event names (`EventKind`)
//! - Error types (`SkeinError`)
//!
//! ## Wire Compatibility
//!
//! Types that appear in snapshots serialize with the exact key spelling of
//! the snapshot format (`camelCase` fields, `nodes`/`edges` group names),
//! so a captured snapshot is directly interchangeable with external tools.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Free-form attribute map used for element data and style overrides.
///
/// Backed by `serde_json::Map`, which keeps keys in sorted order, so
/// serialization of the same logical map is deterministic.
pub type AttrMap = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Caller-visible identifier of an element, unique within one pool.
///
/// Identifiers are stable: updating an element through snapshot
/// synchronization never changes its id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    /// Create a new element id from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of a display surface. The registry keys on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

// =============================================================================
// DISPLAY SURFACE
// =============================================================================

/// An opaque handle to a display surface (the "container").
///
/// An instance constructed without a surface is headless; its renderer is
/// the no-op `null` backend and the registry is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surface {
    /// Surface identity, used for registry exclusivity.
    pub id: SurfaceId,
    /// Surface width in device-independent units.
    pub width: u32,
    /// Surface height in device-independent units.
    pub height: u32,
}

impl Surface {
    /// Create a new surface handle.
    #[must_use]
    pub const fn new(id: u64, width: u32, height: u32) -> Self {
        Self {
            id: SurfaceId(id),
            width,
            height,
        }
    }
}

// =============================================================================
// ELEMENT DESCRIPTIONS
// =============================================================================

/// Element group: node or edge.
///
/// Wire names are the plural `nodes`/`edges`, matching the grouped form of
/// the snapshot's element section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Group {
    /// A vertex of the graph.
    #[serde(rename = "nodes")]
    Nodes,
    /// A connection between two nodes (`source` -> `target` in data).
    #[serde(rename = "edges")]
    Edges,
}

/// A model position in the graph plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Declarative description of one element.
///
/// This is the form elements take inside snapshots and construction
/// options: `{ group?, data: { id, ... }, position?, style }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ElementDesc {
    /// Explicit group. When absent the group is inferred from the snapshot
    /// section the description was read from, or from the presence of
    /// `source`/`target` keys in `data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    /// Free-form element data. The `id` key, when present, must be a string.
    #[serde(default)]
    pub data: AttrMap,
    /// Model position. Meaningful for nodes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Per-element style overrides.
    #[serde(default, skip_serializing_if = "AttrMap::is_empty")]
    pub style: AttrMap,
}

impl ElementDesc {
    /// Describe a node with the given id.
    #[must_use]
    pub fn node(id: impl Into<String>) -> Self {
        let mut data = AttrMap::new();
        data.insert("id".to_string(), serde_json::Value::String(id.into()));
        Self {
            group: Some(Group::Nodes),
            data,
            ..Self::default()
        }
    }

    /// Describe an edge with the given id and endpoints.
    #[must_use]
    pub fn edge(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        let mut data = AttrMap::new();
        data.insert("id".to_string(), serde_json::Value::String(id.into()));
        data.insert("source".to_string(), serde_json::Value::String(source.into()));
        data.insert("target".to_string(), serde_json::Value::String(target.into()));
        Self {
            group: Some(Group::Edges),
            data,
            ..Self::default()
        }
    }

    /// Add a data entry.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Set the model position.
    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    /// The id carried in `data`, if any.
    #[must_use]
    pub fn id(&self) -> Option<ElementId> {
        match self.data.get("id") {
            Some(serde_json::Value::String(s)) => Some(ElementId::new(s.clone())),
            _ => None,
        }
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// Selection interaction mode for the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    /// One element selected at a time.
    #[default]
    Single,
    /// Selections accumulate.
    Additive,
}

// =============================================================================
// INSTANCE EVENTS
// =============================================================================

/// Events emitted by an instance over its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// Layout positions computed, not yet settled.
    LayoutReady,
    /// Layout fully settled.
    LayoutStop,
    /// Initial elements loaded and visible (one-shot).
    Load,
    /// Bootstrap fully settled (one-shot).
    Done,
    /// Instance ready for use (exactly once).
    Ready,
    /// Instance destroyed.
    Destroy,
    /// Display surface attached after headless construction.
    Mount,
    /// Display surface detached.
    Unmount,
    /// Scratch data changed.
    Scratch,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors produced by the Skein instance core.
///
/// Lifecycle operations on a destroyed instance are safe no-ops; data
/// operations fail fast with [`SkeinError::Destroyed`]. Collaborator
/// failures propagate unchanged to the immediate caller.
#[derive(Debug, Error)]
pub enum SkeinError {
    /// A data operation was attempted on a destroyed instance.
    #[error("instance has been destroyed")]
    Destroyed,

    /// An element with the same id already exists in the pool.
    #[error("duplicate element id: {0}")]
    DuplicateElement(ElementId),

    /// The requested element was not found in the pool.
    #[error("element not found: {0}")]
    ElementNotFound(ElementId),

    /// An edge description names an endpoint that is not in the pool.
    #[error("edge {edge} references missing endpoint {endpoint}")]
    MissingEndpoint {
        edge: ElementId,
        endpoint: ElementId,
    },

    /// An edge description is missing its `source` or `target` key.
    #[error("edge {0} is missing source or target")]
    IncompleteEdge(ElementId),

    /// The named layout algorithm is not registered.
    #[error("unknown layout: {0}")]
    UnknownLayout(String),

    /// The named renderer backend is not registered.
    #[error("unknown renderer: {0}")]
    UnknownRenderer(String),

    /// A zoom bounds update would invert the range.
    #[error("invalid zoom range: min {min} > max {max}")]
    InvalidZoomRange { min: f64, max: f64 },

    /// A serialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A deserialization error occurred.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// An I/O error occurred (app layer only; the core does no I/O).
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_desc_extracts_string_id() {
        let desc = ElementDesc::node("a");
        assert_eq!(desc.id(), Some(ElementId::new("a")));
    }

    #[test]
    fn element_desc_without_id() {
        let desc = ElementDesc::default();
        assert_eq!(desc.id(), None);

        let desc = ElementDesc::default().with_data("id", 7);
        assert_eq!(desc.id(), None, "non-string ids are not ids");
    }

    #[test]
    fn group_wire_names_are_plural() {
        let json = serde_json::to_string(&Group::Nodes).expect("serialize");
        assert_eq!(json, "\"nodes\"");
        let json = serde_json::to_string(&Group::Edges).expect("serialize");
        assert_eq!(json, "\"edges\"");
    }

    #[test]
    fn edge_desc_carries_endpoints() {
        let desc = ElementDesc::edge("ab", "a", "b");
        assert_eq!(desc.group, Some(Group::Edges));
        assert_eq!(
            desc.data.get("source"),
            Some(&serde_json::Value::String("a".to_string()))
        );
        assert_eq!(
            desc.data.get("target"),
            Some(&serde_json::Value::String("b".to_string()))
        );
    }
}
