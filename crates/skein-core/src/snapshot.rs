//! # Snapshot Synchronization
//!
//! Bidirectional sync between a serializable snapshot and the live
//! instance.
//!
//! [`Skein::capture`] exports the whole instance: elements grouped by
//! kind, the stylesheet (when styling is enabled), viewport, bounds,
//! flags, and renderer display options. [`Skein::apply`] is the inverse:
//! a full-replacement reconciliation where described elements are updated
//! in place by id (identity-preserving), undescribed ones are created,
//! and pool elements the snapshot does not mention are removed — exactly
//! those. `apply(capture())` is the identity on pool contents, flags,
//! zoom, and pan.

use crate::instance::Skein;
use crate::render::{Notification, RendererOptions};
use crate::style::Stylesheet;
use crate::types::{ElementDesc, ElementId, Group, Position, SkeinError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// The element section of a snapshot: grouped by kind, or one flat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementsSection {
    /// `{ "nodes": [...], "edges": [...] }`
    Grouped {
        #[serde(default)]
        nodes: Vec<ElementDesc>,
        #[serde(default)]
        edges: Vec<ElementDesc>,
    },
    /// `[...]` with groups inferred per description.
    Flat(Vec<ElementDesc>),
}

impl Default for ElementsSection {
    fn default() -> Self {
        Self::Flat(Vec::new())
    }
}

impl ElementsSection {
    /// Number of descriptions in the section.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Grouped { nodes, edges } => nodes.len() + edges.len(),
            Self::Flat(descs) => descs.len(),
        }
    }

    /// Whether the section describes no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptions paired with their section group hint, nodes first.
    ///
    /// Ordering nodes first means freshly created edges always find their
    /// endpoints, whichever order the snapshot listed them in.
    fn descs_nodes_first(&self) -> Vec<(&ElementDesc, Option<Group>)> {
        match self {
            Self::Grouped { nodes, edges } => nodes
                .iter()
                .map(|desc| (desc, Some(Group::Nodes)))
                .chain(edges.iter().map(|desc| (desc, Some(Group::Edges))))
                .collect(),
            Self::Flat(descs) => {
                let is_edge = |desc: &ElementDesc| match desc.group {
                    Some(group) => group == Group::Edges,
                    None => {
                        desc.data.contains_key("source") && desc.data.contains_key("target")
                    }
                };
                descs
                    .iter()
                    .filter(|desc| !is_edge(desc))
                    .map(|desc| (desc, None))
                    .chain(descs.iter().filter(|desc| is_edge(desc)).map(|desc| (desc, None)))
                    .collect()
            }
        }
    }
}

/// Serializable description of a whole instance.
///
/// Every field is optional on the way in: `apply` only touches what the
/// snapshot mentions. `capture` fills all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<ElementsSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Stylesheet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zooming_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_zooming_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panning_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_panning_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_selection_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autolock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoungrabify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autounselectify: Option<bool>,
    /// Renderer configuration; captured for export, not consumed by apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<RendererOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_edges_on_viewport: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_on_viewport: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheel_sensitivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_blur: Option<bool>,
}

// =============================================================================
// CAPTURE / APPLY
// =============================================================================

impl Skein {
    /// Export the instance as a snapshot.
    #[must_use]
    pub fn capture(&self) -> Snapshot {
        let (nodes, edges) = self.with_pool(|pool| {
            let mut nodes = Vec::new();
            let mut edges = Vec::new();
            for ele in pool.iter() {
                match ele.group() {
                    Group::Nodes => nodes.push(ele.to_desc()),
                    Group::Edges => edges.push(ele.to_desc()),
                }
            }
            (nodes, edges)
        });

        let settings = self.options();
        Snapshot {
            elements: Some(ElementsSection::Grouped { nodes, edges }),
            style: settings.style_enabled.then(|| self.style_sheet()),
            zoom: Some(settings.zoom),
            pan: Some(settings.pan),
            min_zoom: Some(settings.min_zoom),
            max_zoom: Some(settings.max_zoom),
            zooming_enabled: Some(settings.zooming_enabled),
            user_zooming_enabled: Some(settings.user_zooming_enabled),
            panning_enabled: Some(settings.panning_enabled),
            user_panning_enabled: Some(settings.user_panning_enabled),
            box_selection_enabled: Some(settings.box_selection_enabled),
            autolock: Some(settings.autolock),
            autoungrabify: Some(settings.autoungrabify),
            autounselectify: Some(settings.autounselectify),
            renderer: Some(settings.renderer),
            hide_edges_on_viewport: Some(settings.hide_edges_on_viewport),
            texture_on_viewport: Some(settings.texture_on_viewport),
            wheel_sensitivity: Some(settings.wheel_sensitivity),
            motion_blur: Some(settings.motion_blur),
        }
    }

    /// Reconcile the instance against a snapshot.
    ///
    /// Runs as one logically atomic batch: renderer notifications are
    /// suspended for the duration and a single batch notification follows.
    /// Must not be called recursively while notifications are already
    /// suspended.
    ///
    /// Removal cascades through edges: a snapshot that mentions an edge
    /// but omits one of its endpoint nodes removes that endpoint, and the
    /// cascade takes the mentioned edge with it.
    pub fn apply(&self, snapshot: &Snapshot) -> Result<(), SkeinError> {
        if self.is_destroyed() {
            return Err(SkeinError::Destroyed);
        }
        self.set_notifications(false);
        let result = self.apply_inner(snapshot);
        self.set_notifications(true);
        if result.is_ok() {
            self.notify_renderer(&Notification::Batch);
        }
        result
    }

    fn apply_inner(&self, snapshot: &Snapshot) -> Result<(), SkeinError> {
        if let Some(section) = &snapshot.elements {
            let mut mentioned = BTreeSet::new();

            for (desc, group_hint) in section.descs_nodes_first() {
                match desc.id() {
                    Some(id) if self.has_element(&id) => {
                        // Existing element: in-place update, identity kept.
                        self.with_pool_mut(|pool| pool.update(&id, desc))?;
                        mentioned.insert(id);
                    }
                    _ => {
                        let id = self
                            .with_pool_mut(|pool| pool.add(desc.clone(), group_hint))?;
                        mentioned.insert(id);
                    }
                }
            }

            // Elements the snapshot does not mention are removed — exactly
            // those. Edges go first so node-removal cascades cannot touch a
            // mentioned edge.
            let stale: Vec<ElementId> = self
                .element_ids()
                .into_iter()
                .filter(|id| !mentioned.contains(id))
                .collect();
            let stale_edges: Vec<&ElementId> = stale
                .iter()
                .filter(|id| {
                    self.element(id).is_some_and(|ele| ele.group() == Group::Edges)
                })
                .collect();
            for id in stale_edges {
                self.with_pool_mut(|pool| pool.remove(id));
            }
            for id in &stale {
                if self.has_element(id) {
                    self.with_pool_mut(|pool| pool.remove(id));
                }
            }
        }

        if let Some(style) = &snapshot.style {
            self.set_style(style.clone());
        }

        if let Some(zoom) = snapshot.zoom {
            if zoom != self.zoom() {
                self.set_zoom(zoom);
            }
        }
        if let Some(pan) = snapshot.pan {
            if pan != self.pan() {
                self.set_pan(pan);
            }
        }

        match (snapshot.min_zoom, snapshot.max_zoom) {
            (Some(min), Some(max)) => self.zoom_range(min, max)?,
            (Some(min), None) => self.set_min_zoom(min)?,
            (None, Some(max)) => self.set_max_zoom(max)?,
            (None, None) => {}
        }

        if let Some(enabled) = snapshot.zooming_enabled {
            self.set_zooming_enabled(enabled);
        }
        if let Some(enabled) = snapshot.user_zooming_enabled {
            self.set_user_zooming_enabled(enabled);
        }
        if let Some(enabled) = snapshot.panning_enabled {
            self.set_panning_enabled(enabled);
        }
        if let Some(enabled) = snapshot.user_panning_enabled {
            self.set_user_panning_enabled(enabled);
        }
        if let Some(enabled) = snapshot.box_selection_enabled {
            self.set_box_selection_enabled(enabled);
        }
        if let Some(enabled) = snapshot.autolock {
            self.set_autolock(enabled);
        }
        if let Some(enabled) = snapshot.autoungrabify {
            self.set_autoungrabify(enabled);
        }
        if let Some(enabled) = snapshot.autounselectify {
            self.set_autounselectify(enabled);
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
