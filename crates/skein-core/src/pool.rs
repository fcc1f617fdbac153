//! # Element Pool
//!
//! The ordered, identity-indexed set of live graph elements owned by one
//! instance.
//!
//! The pool is the canonical element store: every element has a
//! caller-visible id that is unique within the pool and stable across
//! in-place updates. Bulk addition sorts nodes before edges so that edge
//! endpoint validation always sees its nodes first, and node removal
//! cascades to incident edges so the pool never holds a dangling edge.

use crate::types::{AttrMap, ElementDesc, ElementId, Group, Position, SkeinError};
use std::collections::BTreeMap;

// =============================================================================
// ELEMENT
// =============================================================================

/// One live element in the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    group: Group,
    data: AttrMap,
    position: Position,
    style: AttrMap,
}

impl Element {
    /// The element's stable id.
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// The element's group.
    #[must_use]
    pub fn group(&self) -> Group {
        self.group
    }

    /// The element's data map.
    #[must_use]
    pub fn data(&self) -> &AttrMap {
        &self.data
    }

    /// The element's model position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Move the element to a new model position.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// The element's style overrides.
    #[must_use]
    pub fn style(&self) -> &AttrMap {
        &self.style
    }

    /// Edge source id, when this element is an edge.
    #[must_use]
    pub fn source(&self) -> Option<ElementId> {
        self.string_field("source")
    }

    /// Edge target id, when this element is an edge.
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        self.string_field("target")
    }

    /// Compound parent id, when this node is nested inside another.
    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.string_field("parent")
    }

    fn string_field(&self, key: &str) -> Option<ElementId> {
        match self.data.get(key) {
            Some(serde_json::Value::String(s)) => Some(ElementId::new(s.clone())),
            _ => None,
        }
    }

    /// Apply a description as an in-place update.
    ///
    /// Data and style entries present in the description overwrite the
    /// element's entries; attributes not mentioned are preserved. The id
    /// is never changed by an update.
    pub fn apply_desc(&mut self, desc: &ElementDesc) {
        for (key, value) in &desc.data {
            if key == "id" {
                continue;
            }
            self.data.insert(key.clone(), value.clone());
        }
        if let Some(position) = desc.position {
            self.position = position;
        }
        for (key, value) in &desc.style {
            self.style.insert(key.clone(), value.clone());
        }
    }

    /// Serialize the element back to its description form.
    #[must_use]
    pub fn to_desc(&self) -> ElementDesc {
        ElementDesc {
            group: Some(self.group),
            data: self.data.clone(),
            position: match self.group {
                Group::Nodes => Some(self.position),
                Group::Edges => None,
            },
            style: self.style.clone(),
        }
    }
}

// =============================================================================
// ELEMENT POOL
// =============================================================================

/// The identity-indexed live element set of one instance.
///
/// Insertion order is preserved for iteration and capture; lookup is by
/// id. The pool is exclusively owned by its instance and never shared.
#[derive(Debug, Clone, Default)]
pub struct ElementPool {
    /// Insertion order of element ids.
    order: Vec<ElementId>,
    /// Identity index: id -> element.
    elements: BTreeMap<ElementId, Element>,
    /// Counter for generated ids of descriptions that carry none.
    next_generated: u64,
}

impl ElementPool {
    /// Create a new empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether an element with the given id exists.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Look up an element by id.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Look up an element by id for mutation.
    #[must_use]
    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// All element ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<ElementId> {
        self.order.clone()
    }

    /// Iterate elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Whether any node in the pool is a compound (has a `parent` key).
    #[must_use]
    pub fn has_compound(&self) -> bool {
        self.iter()
            .any(|ele| ele.group() == Group::Nodes && ele.parent().is_some())
    }

    /// Add one element from a description.
    ///
    /// The group is taken from the description's explicit field, then from
    /// the snapshot section the description was read from (`section`), and
    /// finally inferred: data carrying both `source` and `target` describes
    /// an edge, anything else a node. Descriptions without an id get a
    /// generated one. Edge endpoints must already exist as nodes.
    pub fn add(
        &mut self,
        desc: ElementDesc,
        section: Option<Group>,
    ) -> Result<ElementId, SkeinError> {
        let group = desc.group.or(section).unwrap_or_else(|| {
            if desc.data.contains_key("source") && desc.data.contains_key("target") {
                Group::Edges
            } else {
                Group::Nodes
            }
        });

        let id = match desc.id() {
            Some(id) => {
                if self.contains(&id) {
                    return Err(SkeinError::DuplicateElement(id));
                }
                id
            }
            None => self.generate_id(),
        };

        let mut data = desc.data;
        data.insert("id".to_string(), serde_json::Value::String(id.0.clone()));

        let element = Element {
            id: id.clone(),
            group,
            data,
            position: desc.position.unwrap_or_default(),
            style: desc.style,
        };

        if group == Group::Edges {
            self.check_endpoints(&element)?;
        }

        self.order.push(id.clone());
        self.elements.insert(id.clone(), element);
        Ok(id)
    }

    /// Add a batch of descriptions, nodes before edges.
    ///
    /// Returns the ids of the added elements in description order.
    pub fn add_all(
        &mut self,
        descs: Vec<ElementDesc>,
        section: Option<Group>,
    ) -> Result<Vec<ElementId>, SkeinError> {
        let (nodes, edges): (Vec<_>, Vec<_>) = descs.into_iter().partition(|desc| {
            let group = desc.group.or(section);
            match group {
                Some(g) => g == Group::Nodes,
                None => !(desc.data.contains_key("source") && desc.data.contains_key("target")),
            }
        });

        let mut ids = Vec::with_capacity(nodes.len() + edges.len());
        for desc in nodes {
            ids.push(self.add(desc, section)?);
        }
        for desc in edges {
            ids.push(self.add(desc, section)?);
        }
        Ok(ids)
    }

    /// Apply a description to an existing element in place.
    pub fn update(&mut self, id: &ElementId, desc: &ElementDesc) -> Result<(), SkeinError> {
        let element = self
            .elements
            .get_mut(id)
            .ok_or_else(|| SkeinError::ElementNotFound(id.clone()))?;
        element.apply_desc(desc);
        Ok(())
    }

    /// Remove an element, cascading node removal to incident edges.
    ///
    /// Returns the ids actually removed, in removal order. Removing an
    /// absent id removes nothing.
    pub fn remove(&mut self, id: &ElementId) -> Vec<ElementId> {
        let Some(element) = self.elements.get(id) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        if element.group() == Group::Nodes {
            let incident: Vec<ElementId> = self
                .iter()
                .filter(|ele| {
                    ele.group() == Group::Edges
                        && (ele.source().as_ref() == Some(id) || ele.target().as_ref() == Some(id))
                })
                .map(|ele| ele.id().clone())
                .collect();
            for edge_id in incident {
                self.elements.remove(&edge_id);
                self.order.retain(|other| other != &edge_id);
                removed.push(edge_id);
            }
        }

        self.elements.remove(id);
        self.order.retain(|other| other != id);
        removed.push(id.clone());
        removed
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.order.clear();
        self.elements.clear();
    }

    fn check_endpoints(&self, edge: &Element) -> Result<(), SkeinError> {
        let (Some(source), Some(target)) = (edge.source(), edge.target()) else {
            return Err(SkeinError::IncompleteEdge(edge.id().clone()));
        };
        for endpoint in [source, target] {
            let exists_as_node = self
                .get(&endpoint)
                .is_some_and(|ele| ele.group() == Group::Nodes);
            if !exists_as_node {
                return Err(SkeinError::MissingEndpoint {
                    edge: edge.id().clone(),
                    endpoint,
                });
            }
        }
        Ok(())
    }

    fn generate_id(&mut self) -> ElementId {
        loop {
            let candidate = ElementId::new(format!("ele{}", self.next_generated));
            self.next_generated = self.next_generated.saturating_add(1);
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
