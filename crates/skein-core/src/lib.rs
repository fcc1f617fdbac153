//! # skein-core
//!
//! The lifecycle core of an interactive graph instance - THE LOGIC.
//!
//! This crate implements the instance state machine: staged bootstrap
//! (options resolution, renderer attachment, element load, first layout),
//! the ready/destroyed lifecycle, the event bus, display mount/unmount,
//! viewport state with zoom clamping, behavioral flags, and snapshot
//! capture/apply with full-replacement reconciliation.
//!
//! ## Collaborator Architecture
//!
//! The core owns state and sequencing; pluggable collaborators do the
//! domain work behind narrow trait contracts:
//! - `layout::LayoutRunner` computes element positions
//! - `render::RendererAdapter` binds a display surface and receives
//!   change notifications
//! - `registry::InstanceRegistry` enforces surface exclusivity
//!
//! ## Concurrency Model
//!
//! Instances are single-threaded and cooperatively scheduled. A `Skein`
//! handle is a cheap clone over shared interior state; construction is
//! `async` with exactly one join point for deferred inputs, and resolves
//! synchronously when all inputs are immediate.

// =============================================================================
// MODULES
// =============================================================================

pub mod event;
pub mod formats;
pub mod instance;
pub mod layout;
pub mod options;
pub mod pool;
pub mod registry;
pub mod render;
pub mod scratch;
pub mod snapshot;
pub mod style;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AttrMap, ElementDesc, ElementId, EventKind, Group, Position, SelectionKind, SkeinError,
    Surface, SurfaceId,
};

// =============================================================================
// RE-EXPORTS: Instance Core
// =============================================================================

pub use event::EventBus;
pub use instance::{ReadyCallback, Skein};
pub use options::{
    DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, Deferred, InstanceOptions, ResolvedOptions,
};
pub use pool::{Element, ElementPool};
pub use registry::InstanceRegistry;
pub use scratch::ScratchPad;
pub use snapshot::{ElementsSection, Snapshot};

// =============================================================================
// RE-EXPORTS: Collaborators
// =============================================================================

pub use layout::{
    GridLayout, LayoutFeed, LayoutOptions, LayoutRunner, LayoutSignal, NullLayout, PresetLayout,
};
pub use render::{Notification, NullRenderer, RasterRenderer, RendererAdapter, RendererOptions};
pub use style::{StyleEngine, StyleRule, Stylesheet};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{EnvelopeHeader, snapshot_from_bytes, snapshot_to_bytes};
