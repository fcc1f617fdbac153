//! # Construction Options
//!
//! Caller-supplied options for a new instance, the deferred-input wrapper,
//! and the resolved configuration kept in private state.
//!
//! Malformed option values are defaulted rather than rejected wherever a
//! reasonable default exists: unspecified flags fall back to documented
//! defaults, non-finite viewport numbers are ignored, and the historical
//! `autolockNodes`/`autoungrabifyNodes` aliases map onto the same flags as
//! their modern spellings.

use crate::instance::ReadyCallback;
use crate::layout::LayoutOptions;
use crate::render::RendererOptions;
use crate::snapshot::ElementsSection;
use crate::style::Stylesheet;
use crate::types::{Position, SelectionKind, SkeinError, Surface};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Default lower zoom bound.
pub const DEFAULT_MIN_ZOOM: f64 = 1e-50;

/// Default upper zoom bound.
pub const DEFAULT_MAX_ZOOM: f64 = 1e50;

// =============================================================================
// DEFERRED INPUTS
// =============================================================================

/// A bootstrap input that is either immediately available or still being
/// computed.
///
/// Style and initial elements may both be deferred; the bootstrap resolves
/// them through a single joined await before any synchronous step
/// proceeds, so the order the two tasks complete in never affects the
/// resulting pool contents.
pub enum Deferred<T> {
    /// The value is available now; resolution completes in the same turn.
    Value(T),
    /// The value is produced by an async task.
    Task(Pin<Box<dyn Future<Output = Result<T, SkeinError>>>>),
}

impl<T: Default> Default for Deferred<T> {
    fn default() -> Self {
        Self::Value(T::default())
    }
}

impl<T> From<T> for Deferred<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T> Deferred<T> {
    /// Wrap an async provider.
    pub fn task(fut: impl Future<Output = Result<T, SkeinError>> + 'static) -> Self {
        Self::Task(Box::pin(fut))
    }

    /// Whether resolution requires awaiting a task.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Task(_))
    }

    /// Resolve to the final value. Immediate for `Value`.
    pub async fn resolve(self) -> Result<T, SkeinError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Task(fut) => fut.await,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Task(_) => f.write_str("Task(..)"),
        }
    }
}

// =============================================================================
// INSTANCE OPTIONS
// =============================================================================

/// Options accepted by instance construction.
///
/// All fields are optional in the snapshot sense: anything unspecified
/// falls back to its documented default during resolution.
#[derive(Default)]
pub struct InstanceOptions {
    /// Display surface; absent means headless.
    pub container: Option<Surface>,
    /// Force a headless bootstrap even when a surface is supplied.
    pub headless: bool,
    /// Initial element descriptions, possibly deferred.
    pub elements: Deferred<ElementsSection>,
    /// Initial stylesheet, possibly deferred.
    pub style: Deferred<Stylesheet>,
    /// Layout algorithm; defaults to `grid` mounted, `null` headless.
    pub layout: Option<LayoutOptions>,
    /// Renderer backend; defaults to `raster` mounted, `null` headless.
    pub renderer: Option<RendererOptions>,
    /// Overrides the default styling enablement (default: mounted only).
    pub style_enabled: Option<bool>,
    /// Initial zoom; default 1.
    pub zoom: Option<f64>,
    /// Initial pan offset; default (0, 0).
    pub pan: Option<Position>,
    /// Lower zoom bound; default 1e-50.
    pub min_zoom: Option<f64>,
    /// Upper zoom bound; default 1e50.
    pub max_zoom: Option<f64>,
    pub zooming_enabled: Option<bool>,
    pub user_zooming_enabled: Option<bool>,
    pub panning_enabled: Option<bool>,
    pub user_panning_enabled: Option<bool>,
    pub box_selection_enabled: Option<bool>,
    pub autolock: Option<bool>,
    /// Historical alias for `autolock`, consulted when it is unset.
    pub autolock_nodes: Option<bool>,
    pub autoungrabify: Option<bool>,
    /// Historical alias for `autoungrabify`, consulted when it is unset.
    pub autoungrabify_nodes: Option<bool>,
    pub autounselectify: Option<bool>,
    /// Selection interaction mode.
    pub selection_type: Option<SelectionKind>,
    pub hide_edges_on_viewport: Option<bool>,
    pub texture_on_viewport: Option<bool>,
    /// Wheel zoom sensitivity; default 1.0.
    pub wheel_sensitivity: Option<f64>,
    pub motion_blur: Option<bool>,
    /// Callback bound to the `ready` event before queued ready callbacks.
    pub ready: Option<ReadyCallback>,
    /// Callback bound to the one-shot `done` event.
    pub done: Option<ReadyCallback>,
}

impl InstanceOptions {
    /// Empty options: a headless instance with no elements and no style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a display surface.
    #[must_use]
    pub fn container(mut self, surface: Surface) -> Self {
        self.container = Some(surface);
        self
    }

    /// Supply initial elements, immediate or deferred.
    #[must_use]
    pub fn elements(mut self, elements: impl Into<Deferred<ElementsSection>>) -> Self {
        self.elements = elements.into();
        self
    }

    /// Supply the initial stylesheet, immediate or deferred.
    #[must_use]
    pub fn style(mut self, style: impl Into<Deferred<Stylesheet>>) -> Self {
        self.style = style.into();
        self
    }

    /// Override the default styling enablement.
    #[must_use]
    pub fn style_enabled(mut self, enabled: bool) -> Self {
        self.style_enabled = Some(enabled);
        self
    }

    /// Pick the layout algorithm.
    #[must_use]
    pub fn layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Pick the renderer backend.
    #[must_use]
    pub fn renderer(mut self, renderer: RendererOptions) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Set the initial zoom.
    #[must_use]
    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    /// Bind a callback to the `ready` event.
    #[must_use]
    pub fn ready(mut self, callback: impl FnOnce(&crate::instance::Skein) + 'static) -> Self {
        self.ready = Some(Box::new(callback));
        self
    }

    /// Bind a callback to the one-shot `done` event.
    #[must_use]
    pub fn done(mut self, callback: impl FnOnce(&crate::instance::Skein) + 'static) -> Self {
        self.done = Some(Box::new(callback));
        self
    }

    /// Whether construction will reach the async join point.
    #[must_use]
    pub fn has_deferred_inputs(&self) -> bool {
        self.elements.is_deferred() || self.style.is_deferred()
    }

    /// Fill every unset field with its documented default.
    ///
    /// `head` is true when a surface is attached and headless mode is not
    /// forced; it selects the layout/renderer defaults and the styling
    /// enablement default.
    #[must_use]
    pub fn resolve_settings(&self, head: bool) -> ResolvedOptions {
        let finite = |value: Option<f64>, default: f64| match value {
            Some(v) if v.is_finite() => v,
            _ => default,
        };

        ResolvedOptions {
            layout: self.layout.clone().unwrap_or_else(|| {
                LayoutOptions::named(if head { "grid" } else { "null" })
            }),
            renderer: self.renderer.clone().unwrap_or_else(|| {
                RendererOptions::named(if head { "raster" } else { "null" })
            }),
            style_enabled: self.style_enabled.unwrap_or(head),
            zoom: finite(self.zoom, 1.0),
            pan: Position::new(
                finite(self.pan.map(|p| p.x), 0.0),
                finite(self.pan.map(|p| p.y), 0.0),
            ),
            min_zoom: finite(self.min_zoom, DEFAULT_MIN_ZOOM),
            max_zoom: finite(self.max_zoom, DEFAULT_MAX_ZOOM),
            zooming_enabled: self.zooming_enabled.unwrap_or(true),
            user_zooming_enabled: self.user_zooming_enabled.unwrap_or(true),
            panning_enabled: self.panning_enabled.unwrap_or(true),
            user_panning_enabled: self.user_panning_enabled.unwrap_or(true),
            box_selection_enabled: self.box_selection_enabled.unwrap_or(true),
            autolock: self.autolock.or(self.autolock_nodes).unwrap_or(false),
            autoungrabify: self
                .autoungrabify
                .or(self.autoungrabify_nodes)
                .unwrap_or(false),
            autounselectify: self.autounselectify.unwrap_or(false),
            selection_type: self.selection_type.unwrap_or_default(),
            hide_edges_on_viewport: self.hide_edges_on_viewport.unwrap_or(false),
            texture_on_viewport: self.texture_on_viewport.unwrap_or(false),
            wheel_sensitivity: finite(self.wheel_sensitivity, 1.0),
            motion_blur: self.motion_blur.unwrap_or(false),
        }
    }
}

// =============================================================================
// RESOLVED OPTIONS
// =============================================================================

/// The fully-defaulted configuration kept in private state.
///
/// Immutable after construction except through explicit setters (mount
/// replaces the renderer section). `options()` hands callers a defensive
/// copy of this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOptions {
    pub layout: LayoutOptions,
    pub renderer: RendererOptions,
    pub style_enabled: bool,
    pub zoom: f64,
    pub pan: Position,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zooming_enabled: bool,
    pub user_zooming_enabled: bool,
    pub panning_enabled: bool,
    pub user_panning_enabled: bool,
    pub box_selection_enabled: bool,
    pub autolock: bool,
    pub autoungrabify: bool,
    pub autounselectify: bool,
    pub selection_type: SelectionKind,
    pub hide_edges_on_viewport: bool,
    pub texture_on_viewport: bool,
    pub wheel_sensitivity: f64,
    pub motion_blur: bool,
}

// =============================================================================
// TESTS
// =============================================================================
