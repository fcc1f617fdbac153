//! # Renderer Adapter Contract
//!
//! The renderer collaborator attaches the instance to a display surface
//! and receives change notifications from the core. Notifications are
//! suspended by the lifecycle controller during bulk mutation, so an
//! adapter only ever sees settled state transitions.
//!
//! Built-ins: `null` (the headless no-op every unmounted instance uses)
//! and `raster` (the default when a surface is attached; a bookkeeping
//! stand-in for a real drawing backend).

use crate::types::{Position, SkeinError, Surface};
use serde::{Deserialize, Serialize};

// =============================================================================
// RENDERER OPTIONS
// =============================================================================

/// Resolved renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererOptions {
    /// Registered renderer name.
    pub name: String,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            name: "null".to_string(),
        }
    }
}

impl RendererOptions {
    /// Options for the named renderer.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// A change notification dispatched from the core to its renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Initial elements loaded; fired once per bootstrap.
    Load { element_count: usize },
    /// Stylesheet replaced or appended.
    Style,
    /// Zoom or pan changed.
    Viewport { zoom: f64, pan: Position },
    /// Elements added to the pool.
    Add { count: usize },
    /// Elements removed from the pool.
    Remove { count: usize },
    /// A suspended bulk mutation (snapshot apply) has settled.
    Batch,
}

// =============================================================================
// RENDERER ADAPTER CONTRACT
// =============================================================================

/// A renderer backend bound to one instance.
pub trait RendererAdapter {
    /// Registered name of the renderer.
    fn name(&self) -> &'static str;

    /// Whether this renderer draws nothing (no display attachment).
    fn is_headless(&self) -> bool;

    /// Bind the renderer to a surface (or none, for headless backends).
    fn init(&mut self, surface: Option<&Surface>) -> Result<(), SkeinError>;

    /// Receive a change notification. Never called while notifications
    /// are suspended or after the instance is destroyed.
    fn notify(&mut self, notification: &Notification);

    /// Release display resources. Called on unmount and destroy.
    fn destroy(&mut self);
}

/// Instantiate a built-in renderer by name.
pub fn create(name: &str) -> Result<Box<dyn RendererAdapter>, SkeinError> {
    match name {
        "null" => Ok(Box::new(NullRenderer)),
        "raster" => Ok(Box::new(RasterRenderer::default())),
        other => Err(SkeinError::UnknownRenderer(other.to_string())),
    }
}

// =============================================================================
// BUILT-IN ADAPTERS
// =============================================================================

/// The headless no-op renderer.
pub struct NullRenderer;

impl RendererAdapter for NullRenderer {
    fn name(&self) -> &'static str {
        "null"
    }

    fn is_headless(&self) -> bool {
        true
    }

    fn init(&mut self, _surface: Option<&Surface>) -> Result<(), SkeinError> {
        Ok(())
    }

    fn notify(&mut self, _notification: &Notification) {}

    fn destroy(&mut self) {}
}

/// Bookkeeping renderer used as the mounted default.
///
/// Tracks the bound surface and the notification stream so display state
/// can be asserted without a real drawing backend.
#[derive(Default)]
pub struct RasterRenderer {
    surface: Option<Surface>,
    notify_count: u64,
    last: Option<Notification>,
}

impl RasterRenderer {
    /// The surface this renderer is bound to, if initialized.
    #[must_use]
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Total notifications received since init.
    #[must_use]
    pub fn notify_count(&self) -> u64 {
        self.notify_count
    }

    /// The most recent notification.
    #[must_use]
    pub fn last_notification(&self) -> Option<&Notification> {
        self.last.as_ref()
    }
}

impl RendererAdapter for RasterRenderer {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn is_headless(&self) -> bool {
        false
    }

    fn init(&mut self, surface: Option<&Surface>) -> Result<(), SkeinError> {
        self.surface = surface.copied();
        self.notify_count = 0;
        self.last = None;
        Ok(())
    }

    fn notify(&mut self, notification: &Notification) {
        self.notify_count = self.notify_count.saturating_add(1);
        self.last = Some(notification.clone());
    }

    fn destroy(&mut self) {
        self.surface = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================
