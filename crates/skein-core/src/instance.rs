//! # Instance Core
//!
//! The `Skein` handle and its lifecycle controller.
//!
//! A `Skein` is a cheap-clone handle over one instance's private state.
//! Construction drives the staged bootstrap: options are resolved, the
//! registry claims the surface, style is seeded, the renderer attaches,
//! deferred inputs are awaited through a single join, the pool is loaded
//! under notification suspension, the layout runs, and the event sequence
//! (`layoutready` -> `load` -> `ready`, plus `done` on settle) fires.
//!
//! Everything is single-threaded and cooperative: state lives behind
//! `Rc<RefCell<..>>`, and the only suspension point is the join on
//! deferred style/elements. If the instance is destroyed while that join
//! is pending (a registry takeover, for example), the steps after the
//! join check the destroyed flag and no-op instead of resurrecting state.

use crate::event::{EventBus, OnceListener, Slot};
use crate::layout::{self, LayoutFeed, LayoutRunner, LayoutSignal};
use crate::options::InstanceOptions;
use crate::options::ResolvedOptions;
use crate::pool::{Element, ElementPool};
use crate::registry::InstanceRegistry;
use crate::render::{self, Notification, RendererAdapter, RendererOptions};
use crate::scratch::ScratchPad;
use crate::snapshot::ElementsSection;
use crate::style::{StyleEngine, Stylesheet};
use crate::types::{ElementDesc, ElementId, EventKind, Group, Position, SelectionKind, SkeinError, Surface, SurfaceId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;

/// A callback bound to a one-shot lifecycle moment (`ready`, `done`).
pub type ReadyCallback = Box<dyn FnOnce(&Skein)>;

// =============================================================================
// PRIVATE STATE
// =============================================================================

/// Animation scheduler bookkeeping.
///
/// The scheduler itself is an external collaborator; the instance only
/// tracks whether the clock runs and which elements are animating.
#[derive(Debug, Clone, Default)]
struct AnimationState {
    running: bool,
    /// Elements currently animating.
    current: Vec<ElementId>,
    /// Animations waiting for the clock to start.
    queue: VecDeque<ElementId>,
}

/// The mutable record owned by one instance.
struct PrivateState {
    /// Display surface; absent means headless.
    container: Option<Surface>,
    /// Whether the first bootstrap completed. Never reverts to false.
    ready: bool,
    /// Whether destroy completed. Monotonic.
    destroyed: bool,
    /// Resolved configuration; mutated only through explicit setters.
    settings: ResolvedOptions,
    /// The live element pool.
    pool: ElementPool,
    /// Free-form per-instance annotations.
    scratch: ScratchPad,
    /// The layout handle from the most recent run.
    layout: Option<Box<dyn LayoutRunner>>,
    /// The attached renderer backend.
    renderer: Box<dyn RendererAdapter>,
    /// Simple (reentrant-unsafe) renderer notification toggle.
    notifications_enabled: bool,
    /// Style binding; holds enablement and the stylesheet.
    style: StyleEngine,
    animation: AnimationState,
    /// Whether any compound (nested) elements exist in the pool.
    has_compound_nodes: bool,
}

struct Shared {
    state: RefCell<PrivateState>,
    bus: RefCell<EventBus<Skein>>,
}

// =============================================================================
// INSTANCE HANDLE
// =============================================================================

/// One live visualization instance.
///
/// Clones share the same private state; the handle is the "instance"
/// returned to callers and passed to event listeners.
pub struct Skein {
    shared: Rc<Shared>,
}

impl Clone for Skein {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl std::fmt::Debug for Skein {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.state();
        f.debug_struct("Skein")
            .field("ready", &st.ready)
            .field("destroyed", &st.destroyed)
            .field("elements", &st.pool.len())
            .field("headless", &st.renderer.is_headless())
            .finish()
    }
}

impl Skein {
    // =========================================================================
    // CONSTRUCTION / BOOTSTRAP
    // =========================================================================

    /// Construct an instance and run its bootstrap.
    ///
    /// When neither the style nor the elements option is deferred, the
    /// whole bootstrap completes synchronously within this call and the
    /// returned instance is already ready. With deferred inputs, the
    /// future suspends once at the join and finishes the bootstrap when
    /// both inputs have resolved.
    ///
    /// Constructing against a surface that already hosts a live instance
    /// destroys the prior occupant first; ready callbacks queued against
    /// the surface before any instance existed are preserved and bound on
    /// this instance's ready transition.
    pub async fn new(
        options: InstanceOptions,
        registry: &InstanceRegistry,
    ) -> Result<Self, SkeinError> {
        let head = options.container.is_some() && !options.headless;
        let settings = options.resolve_settings(head);

        if settings.min_zoom > settings.max_zoom {
            return Err(SkeinError::InvalidZoomRange {
                min: settings.min_zoom,
                max: settings.max_zoom,
            });
        }

        let InstanceOptions {
            container,
            elements,
            style,
            ready: ready_callback,
            done: done_callback,
            ..
        } = options;

        let mut style_engine = StyleEngine::new(settings.style_enabled);
        if settings.style_enabled {
            // Seed with the empty stylesheet so style queries are
            // well-defined before the external stylesheet resolves.
            style_engine.set(Stylesheet::empty());
        }

        let mut renderer = render::create(&settings.renderer.name)?;
        renderer.init(container.as_ref())?;

        let initial_zoom = settings.zoom.clamp(settings.min_zoom, settings.max_zoom);

        let state = PrivateState {
            container,
            ready: false,
            destroyed: false,
            settings: ResolvedOptions {
                zoom: initial_zoom,
                ..settings
            },
            pool: ElementPool::new(),
            scratch: ScratchPad::new(true),
            layout: None,
            renderer,
            notifications_enabled: true,
            style: style_engine,
            animation: AnimationState::default(),
            has_compound_nodes: false,
        };

        let handle = Self {
            shared: Rc::new(Shared {
                state: RefCell::new(state),
                bus: RefCell::new(EventBus::new()),
            }),
        };

        if let Some(surface) = handle.surface_id() {
            registry.claim(surface, &handle);
        }

        tracing::debug!(head, "bootstrap: resolving external data");
        let sheet = style.resolve().await?;
        let elements = elements.resolve().await?;

        // Destroyed while the join was pending (e.g. registry takeover):
        // do not resurrect state.
        if handle.is_destroyed() {
            tracing::debug!("bootstrap: instance destroyed during join, skipping load");
            return Ok(handle);
        }

        if handle.style_enabled() {
            handle.append_style(sheet);
        }

        handle.load(elements, ready_callback, done_callback, registry.clone())?;
        Ok(handle)
    }

    /// Initial load: populate the pool, wire the layout lifecycle, and run
    /// the layout. Renderer notifications are suspended until the layout
    /// signals ready.
    fn load(
        &self,
        elements: ElementsSection,
        on_ready: Option<ReadyCallback>,
        on_done: Option<ReadyCallback>,
        registry: InstanceRegistry,
    ) -> Result<(), SkeinError> {
        self.set_notifications(false);

        {
            let mut st = self.state_mut();
            st.pool.clear();
        }
        self.add_section(elements)?;
        tracing::debug!(elements = self.element_count(), "bootstrap: elements loaded");

        let surface = self.surface_id();
        self.once_boxed(
            EventKind::LayoutReady,
            Box::new(move |cy: &Skein| {
                cy.set_notifications(true);
                let element_count = cy.element_count();
                cy.notify_renderer(&Notification::Load { element_count });

                cy.once_boxed(
                    EventKind::Load,
                    Box::new(move |cy: &Skein| {
                        cy.start_animations();
                        cy.mark_ready();

                        // Binding order: the ready option callback first,
                        // then callbacks queued against the surface before
                        // this instance existed, in queue order.
                        if let Some(callback) = on_ready {
                            cy.once_boxed(EventKind::Ready, callback);
                        }
                        if let Some(surface) = surface {
                            for callback in registry.take_readies(surface) {
                                cy.once_boxed(EventKind::Ready, callback);
                            }
                        }

                        tracing::debug!("bootstrap: ready");
                        cy.emit(EventKind::Ready);
                    }),
                );
                cy.emit(EventKind::Load);
            }),
        );
        self.once_boxed(
            EventKind::LayoutStop,
            Box::new(move |cy: &Skein| {
                if let Some(callback) = on_done {
                    cy.once_boxed(EventKind::Done, callback);
                }
                cy.emit(EventKind::Done);
            }),
        );

        self.run_layout()
    }

    /// Run the configured layout over the full element set and replay its
    /// lifecycle signals through the bus.
    fn run_layout(&self) -> Result<(), SkeinError> {
        let opts = self.state().settings.layout.clone();
        let mut runner = layout::create(&opts.name)?;
        let mut feed = LayoutFeed::new();

        {
            let mut st = self.state_mut();
            let st = &mut *st;
            runner.run(&mut st.pool, &opts, &mut feed)?;
            st.layout = Some(runner);
        }

        for signal in feed.into_signals() {
            match signal {
                LayoutSignal::Ready => self.emit(EventKind::LayoutReady),
                LayoutSignal::Stop => self.emit(EventKind::LayoutStop),
            }
        }
        Ok(())
    }

    fn mark_ready(&self) {
        self.state_mut().ready = true;
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Whether the first bootstrap has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state().ready
    }

    /// Whether destroy has completed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Invoke a callback when the instance is ready.
    ///
    /// Called on an already-ready instance, the callback runs immediately,
    /// as if the ready event had just fired; otherwise it is bound as a
    /// one-shot ready listener.
    pub fn ready(&self, callback: impl FnOnce(&Skein) + 'static) {
        if self.is_ready() {
            callback(self);
        } else {
            self.once_boxed(EventKind::Ready, Box::new(callback));
        }
    }

    /// Destroy the instance. Idempotent: a repeat call is a no-op.
    ///
    /// Stops the animation clock, detaches the renderer, emits `destroy`,
    /// and sets the monotonic destroyed flag.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        tracing::debug!("destroy");
        self.stop_animations();
        self.state_mut().renderer.destroy();
        self.emit(EventKind::Destroy);
        self.state_mut().destroyed = true;
    }

    /// Attach a display surface after headless construction.
    ///
    /// Preserves elements and style; replaces the renderer, enables
    /// styling, reapplies the stylesheet, and emits `mount`. A no-op on a
    /// destroyed instance.
    pub fn mount(
        &self,
        surface: Surface,
        renderer_options: Option<RendererOptions>,
    ) -> Result<(), SkeinError> {
        if self.is_destroyed() {
            return Ok(());
        }
        let renderer_options = renderer_options.unwrap_or_else(|| RendererOptions::named("raster"));
        let mut renderer = render::create(&renderer_options.name)?;

        self.stop_animations();
        {
            let mut st = self.state_mut();
            st.renderer.destroy();
            st.settings.renderer = renderer_options;
            st.container = Some(surface);
            st.settings.style_enabled = true;
            st.style.set_enabled(true);
            renderer.init(Some(&surface))?;
            st.renderer = renderer;
        }
        self.start_animations();

        // Reapply the stylesheet against the fresh renderer.
        let sheet = self.state().style.sheet().clone();
        self.set_style(sheet);

        tracing::debug!(surface = surface.id.0, "mount");
        self.emit(EventKind::Mount);
        Ok(())
    }

    /// Detach the display surface, keeping elements and style.
    ///
    /// The renderer is replaced with the headless no-op backend. A no-op
    /// on a destroyed instance.
    pub fn unmount(&self) {
        if self.is_destroyed() {
            return;
        }
        self.stop_animations();
        {
            let mut st = self.state_mut();
            st.renderer.destroy();
            st.renderer = Box::new(render::NullRenderer);
            st.settings.renderer = RendererOptions::named("null");
            st.container = None;
        }
        tracing::debug!("unmount");
        self.emit(EventKind::Unmount);
    }

    /// Whether the renderer is the headless no-op.
    #[must_use]
    pub fn is_headless(&self) -> bool {
        self.state().renderer.is_headless()
    }

    /// The attached display surface, if any.
    #[must_use]
    pub fn container(&self) -> Option<Surface> {
        self.state().container
    }

    /// A defensive copy of the resolved configuration.
    #[must_use]
    pub fn options(&self) -> ResolvedOptions {
        self.state().settings.clone()
    }

    /// The name of the layout from the most recent run, if any ran.
    #[must_use]
    pub fn layout_name(&self) -> Option<String> {
        self.state().layout.as_ref().map(|l| l.name().to_string())
    }

    pub(crate) fn surface_id(&self) -> Option<SurfaceId> {
        self.state().container.map(|s| s.id)
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Register a persistent listener.
    pub fn on(&self, kind: EventKind, listener: impl FnMut(&Skein) + 'static) {
        self.shared.bus.borrow_mut().on(kind, Box::new(listener));
    }

    /// Register a one-shot listener.
    pub fn once(&self, kind: EventKind, listener: impl FnOnce(&Skein) + 'static) {
        self.once_boxed(kind, Box::new(listener));
    }

    fn once_boxed(&self, kind: EventKind, listener: OnceListener<Skein>) {
        self.shared.bus.borrow_mut().once(kind, listener);
    }

    /// Emit an event to all current listeners, in registration order.
    ///
    /// The bus borrow is released while listeners run, so listeners may
    /// freely mutate the instance or subscribe; listeners added during the
    /// emission fire on the next one.
    pub fn emit(&self, kind: EventKind) {
        let slots = self.shared.bus.borrow_mut().take(kind);
        let mut kept = Vec::new();
        for slot in slots {
            match slot {
                Slot::Persistent(mut listener) => {
                    listener(self);
                    kept.push(Slot::Persistent(listener));
                }
                Slot::Once(listener) => listener(self),
            }
        }
        self.shared.bus.borrow_mut().restore(kind, kept);
    }

    // =========================================================================
    // ELEMENT POOL
    // =========================================================================

    /// Add one element from a description.
    pub fn add(&self, desc: ElementDesc) -> Result<ElementId, SkeinError> {
        let id = {
            let mut st = self.state_mut();
            if st.destroyed {
                return Err(SkeinError::Destroyed);
            }
            let id = st.pool.add(desc, None)?;
            st.has_compound_nodes = st.pool.has_compound();
            id
        };
        self.notify_renderer(&Notification::Add { count: 1 });
        Ok(id)
    }

    /// Add a whole element section (grouped or flat descriptions).
    pub fn add_section(&self, section: ElementsSection) -> Result<Vec<ElementId>, SkeinError> {
        let ids = {
            let mut st = self.state_mut();
            if st.destroyed {
                return Err(SkeinError::Destroyed);
            }
            let ids = match section {
                ElementsSection::Grouped { nodes, edges } => {
                    let mut ids = st.pool.add_all(nodes, Some(Group::Nodes))?;
                    ids.extend(st.pool.add_all(edges, Some(Group::Edges))?);
                    ids
                }
                ElementsSection::Flat(descs) => st.pool.add_all(descs, None)?,
            };
            st.has_compound_nodes = st.pool.has_compound();
            ids
        };
        if !ids.is_empty() {
            self.notify_renderer(&Notification::Add { count: ids.len() });
        }
        Ok(ids)
    }

    /// Remove an element (cascading to incident edges for nodes).
    ///
    /// Returns the ids actually removed.
    pub fn remove(&self, id: &ElementId) -> Result<Vec<ElementId>, SkeinError> {
        let removed = {
            let mut st = self.state_mut();
            if st.destroyed {
                return Err(SkeinError::Destroyed);
            }
            let removed = st.pool.remove(id);
            st.has_compound_nodes = st.pool.has_compound();
            removed
        };
        if !removed.is_empty() {
            self.notify_renderer(&Notification::Remove {
                count: removed.len(),
            });
        }
        Ok(removed)
    }

    /// Number of elements in the pool.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.state().pool.len()
    }

    /// All element ids in insertion order.
    #[must_use]
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.state().pool.ids()
    }

    /// Whether an element with the given id exists.
    #[must_use]
    pub fn has_element(&self, id: &ElementId) -> bool {
        self.state().pool.contains(id)
    }

    /// A copy of the element with the given id.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<Element> {
        self.state().pool.get(id).cloned()
    }

    /// Whether any compound (nested) elements exist.
    #[must_use]
    pub fn has_compound_nodes(&self) -> bool {
        self.state().has_compound_nodes
    }

    pub(crate) fn with_pool<R>(&self, f: impl FnOnce(&ElementPool) -> R) -> R {
        f(&self.state().pool)
    }

    pub(crate) fn with_pool_mut<R>(&self, f: impl FnOnce(&mut ElementPool) -> R) -> R {
        let mut st = self.state_mut();
        let result = f(&mut st.pool);
        st.has_compound_nodes = st.pool.has_compound();
        result
    }

    // =========================================================================
    // STYLE
    // =========================================================================

    /// Whether styling is enabled for this instance.
    #[must_use]
    pub fn style_enabled(&self) -> bool {
        self.state().style.is_enabled()
    }

    /// Replace the stylesheet. A no-op on a destroyed instance.
    pub fn set_style(&self, sheet: Stylesheet) {
        {
            let mut st = self.state_mut();
            if st.destroyed {
                return;
            }
            st.style.set(sheet);
        }
        self.notify_renderer(&Notification::Style);
    }

    /// Append rules after the current stylesheet. A no-op on a destroyed
    /// instance.
    pub fn append_style(&self, sheet: Stylesheet) {
        {
            let mut st = self.state_mut();
            if st.destroyed {
                return;
            }
            st.style.append(sheet);
        }
        self.notify_renderer(&Notification::Style);
    }

    /// A copy of the current stylesheet.
    #[must_use]
    pub fn style_sheet(&self) -> Stylesheet {
        self.state().style.sheet().clone()
    }

    // =========================================================================
    // VIEWPORT
    // =========================================================================

    /// Current zoom level.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.state().settings.zoom
    }

    /// Set the zoom level, clamped to the zoom bounds.
    ///
    /// Ignored when zooming is disabled, the value is not finite, or the
    /// instance is destroyed.
    pub fn set_zoom(&self, zoom: f64) {
        let changed = {
            let mut st = self.state_mut();
            if st.destroyed || !st.settings.zooming_enabled || !zoom.is_finite() {
                false
            } else {
                let clamped = zoom.clamp(st.settings.min_zoom, st.settings.max_zoom);
                let changed = clamped != st.settings.zoom;
                st.settings.zoom = clamped;
                changed
            }
        };
        if changed {
            self.notify_viewport();
        }
    }

    /// Current pan offset.
    #[must_use]
    pub fn pan(&self) -> Position {
        self.state().settings.pan
    }

    /// Set the pan offset.
    ///
    /// Ignored when panning is disabled, a component is not finite, or
    /// the instance is destroyed.
    pub fn set_pan(&self, pan: Position) {
        let changed = {
            let mut st = self.state_mut();
            if st.destroyed
                || !st.settings.panning_enabled
                || !pan.x.is_finite()
                || !pan.y.is_finite()
            {
                false
            } else {
                let changed = pan != st.settings.pan;
                st.settings.pan = pan;
                changed
            }
        };
        if changed {
            self.notify_viewport();
        }
    }

    /// Lower zoom bound.
    #[must_use]
    pub fn min_zoom(&self) -> f64 {
        self.state().settings.min_zoom
    }

    /// Upper zoom bound.
    #[must_use]
    pub fn max_zoom(&self) -> f64 {
        self.state().settings.max_zoom
    }

    /// Set both zoom bounds at once.
    ///
    /// An inverted or non-finite range is rejected, leaving the bounds
    /// unchanged; the current zoom is re-clamped into the new range.
    pub fn zoom_range(&self, min: f64, max: f64) -> Result<(), SkeinError> {
        let changed = {
            let mut st = self.state_mut();
            if st.destroyed {
                return Err(SkeinError::Destroyed);
            }
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(SkeinError::InvalidZoomRange { min, max });
            }
            st.settings.min_zoom = min;
            st.settings.max_zoom = max;
            let clamped = st.settings.zoom.clamp(min, max);
            let changed = clamped != st.settings.zoom;
            st.settings.zoom = clamped;
            changed
        };
        if changed {
            self.notify_viewport();
        }
        Ok(())
    }

    /// Set the lower zoom bound, keeping the upper one.
    pub fn set_min_zoom(&self, min: f64) -> Result<(), SkeinError> {
        let max = self.max_zoom();
        self.zoom_range(min, max)
    }

    /// Set the upper zoom bound, keeping the lower one.
    pub fn set_max_zoom(&self, max: f64) -> Result<(), SkeinError> {
        let min = self.min_zoom();
        self.zoom_range(min, max)
    }

    fn notify_viewport(&self) {
        let (zoom, pan) = {
            let st = self.state();
            (st.settings.zoom, st.settings.pan)
        };
        self.notify_renderer(&Notification::Viewport { zoom, pan });
    }

    // =========================================================================
    // FLAGS
    // =========================================================================

    /// Apply a settings mutation; a no-op on a destroyed instance.
    fn update_settings(&self, f: impl FnOnce(&mut ResolvedOptions)) {
        let mut st = self.state_mut();
        if st.destroyed {
            return;
        }
        f(&mut st.settings);
    }

    /// Selection interaction mode.
    #[must_use]
    pub fn selection_type(&self) -> SelectionKind {
        self.state().settings.selection_type
    }

    /// Change the selection interaction mode.
    pub fn set_selection_type(&self, kind: SelectionKind) {
        self.update_settings(|settings| settings.selection_type = kind);
    }

    #[must_use]
    pub fn zooming_enabled(&self) -> bool {
        self.state().settings.zooming_enabled
    }

    pub fn set_zooming_enabled(&self, enabled: bool) {
        self.update_settings(|settings| settings.zooming_enabled = enabled);
    }

    #[must_use]
    pub fn user_zooming_enabled(&self) -> bool {
        self.state().settings.user_zooming_enabled
    }

    pub fn set_user_zooming_enabled(&self, enabled: bool) {
        self.update_settings(|settings| settings.user_zooming_enabled = enabled);
    }

    #[must_use]
    pub fn panning_enabled(&self) -> bool {
        self.state().settings.panning_enabled
    }

    pub fn set_panning_enabled(&self, enabled: bool) {
        self.update_settings(|settings| settings.panning_enabled = enabled);
    }

    #[must_use]
    pub fn user_panning_enabled(&self) -> bool {
        self.state().settings.user_panning_enabled
    }

    pub fn set_user_panning_enabled(&self, enabled: bool) {
        self.update_settings(|settings| settings.user_panning_enabled = enabled);
    }

    #[must_use]
    pub fn box_selection_enabled(&self) -> bool {
        self.state().settings.box_selection_enabled
    }

    pub fn set_box_selection_enabled(&self, enabled: bool) {
        self.update_settings(|settings| settings.box_selection_enabled = enabled);
    }

    #[must_use]
    pub fn autolock(&self) -> bool {
        self.state().settings.autolock
    }

    pub fn set_autolock(&self, enabled: bool) {
        self.update_settings(|settings| settings.autolock = enabled);
    }

    #[must_use]
    pub fn autoungrabify(&self) -> bool {
        self.state().settings.autoungrabify
    }

    pub fn set_autoungrabify(&self, enabled: bool) {
        self.update_settings(|settings| settings.autoungrabify = enabled);
    }

    #[must_use]
    pub fn autounselectify(&self) -> bool {
        self.state().settings.autounselectify
    }

    pub fn set_autounselectify(&self, enabled: bool) {
        self.update_settings(|settings| settings.autounselectify = enabled);
    }

    // =========================================================================
    // NOTIFICATIONS
    // =========================================================================

    /// Suspend or resume renderer notifications.
    ///
    /// A simple toggle: nested suspend/resume is not supported, and bulk
    /// operations must not be run recursively while suspended. A no-op on
    /// a destroyed instance.
    pub fn set_notifications(&self, enabled: bool) {
        let mut st = self.state_mut();
        if st.destroyed {
            return;
        }
        st.notifications_enabled = enabled;
    }

    /// Whether renderer notifications are currently enabled.
    #[must_use]
    pub fn notifications_enabled(&self) -> bool {
        self.state().notifications_enabled
    }

    pub(crate) fn notify_renderer(&self, notification: &Notification) {
        let mut st = self.state_mut();
        if st.destroyed || !st.notifications_enabled {
            return;
        }
        st.renderer.notify(notification);
    }

    // =========================================================================
    // ANIMATION CLOCK
    // =========================================================================

    /// Whether the animation clock is running.
    #[must_use]
    pub fn is_animation_running(&self) -> bool {
        self.state().animation.running
    }

    /// Queue an element animation; promoted when the clock runs. A no-op
    /// on a destroyed instance.
    pub fn queue_animation(&self, id: ElementId) {
        let mut st = self.state_mut();
        if st.destroyed {
            return;
        }
        if st.animation.running {
            st.animation.current.push(id);
        } else {
            st.animation.queue.push_back(id);
        }
    }

    /// Elements currently animating.
    #[must_use]
    pub fn animating_elements(&self) -> Vec<ElementId> {
        self.state().animation.current.clone()
    }

    fn start_animations(&self) {
        let mut st = self.state_mut();
        st.animation.running = true;
        while let Some(id) = st.animation.queue.pop_front() {
            st.animation.current.push(id);
        }
    }

    fn stop_animations(&self) {
        let mut st = self.state_mut();
        st.animation.running = false;
        st.animation.current.clear();
    }

    // =========================================================================
    // SCRATCH STORAGE
    // =========================================================================

    /// Read a scratch entry.
    #[must_use]
    pub fn scratch(&self, key: &str) -> Option<serde_json::Value> {
        self.state().scratch.get(key).cloned()
    }

    /// Write a scratch entry, emitting `scratch` on change. A no-op on a
    /// destroyed instance.
    pub fn set_scratch(&self, key: impl Into<String>, value: serde_json::Value) {
        let (changed, emits) = {
            let mut st = self.state_mut();
            if st.destroyed {
                return;
            }
            let changed = st.scratch.set(key, value);
            (changed, st.scratch.emits())
        };
        if changed && emits {
            self.emit(EventKind::Scratch);
        }
    }

    /// Remove a scratch entry, emitting `scratch` when one existed. A
    /// no-op on a destroyed instance.
    pub fn remove_scratch(&self, key: &str) {
        let (changed, emits) = {
            let mut st = self.state_mut();
            if st.destroyed {
                return;
            }
            let changed = st.scratch.remove(key);
            (changed, st.scratch.emits())
        };
        if changed && emits {
            self.emit(EventKind::Scratch);
        }
    }

    // =========================================================================
    // STATE ACCESS
    // =========================================================================

    fn state(&self) -> Ref<'_, PrivateState> {
        self.shared.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, PrivateState> {
        self.shared.state.borrow_mut()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    async fn headless() -> Skein {
        Skein::new(InstanceOptions::new(), &InstanceRegistry::new())
            .await
            .expect("construct")
    }

    #[tokio::test]
    async fn empty_headless_bootstrap_reaches_ready() {
        let cy = headless().await;
        assert!(cy.is_ready());
        assert!(!cy.is_destroyed());
        assert!(cy.is_headless());
        assert_eq!(cy.element_count(), 0);
        assert_eq!(cy.zoom(), 1.0);
        assert_eq!(cy.pan(), Position::new(0.0, 0.0));
    }

    #[tokio::test]
    async fn destroy_is_idempotent_and_fires_once() {
        let cy = headless().await;
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        cy.on(EventKind::Destroy, move |_| h.set(h.get() + 1));

        cy.destroy();
        cy.destroy();
        assert!(cy.is_destroyed());
        assert_eq!(hits.get(), 1);
    }

    #[tokio::test]
    async fn ready_callback_runs_immediately_when_already_ready() {
        let cy = headless().await;
        let hit = Rc::new(Cell::new(false));
        let h = Rc::clone(&hit);
        cy.ready(move |_| h.set(true));
        assert!(hit.get());
    }

    #[tokio::test]
    async fn data_operations_fail_fast_after_destroy() {
        let cy = headless().await;
        cy.destroy();
        let err = cy.add(ElementDesc::node("a")).expect_err("destroyed");
        assert!(matches!(err, SkeinError::Destroyed));
        let err = cy.zoom_range(0.5, 2.0).expect_err("destroyed");
        assert!(matches!(err, SkeinError::Destroyed));
    }

    #[tokio::test]
    async fn flag_and_style_setters_are_noops_after_destroy() {
        use crate::style::StyleRule;
        use crate::types::AttrMap;

        let cy = headless().await;
        cy.destroy();

        cy.set_autolock(true);
        cy.set_zooming_enabled(false);
        cy.set_box_selection_enabled(false);
        cy.set_selection_type(SelectionKind::Additive);
        cy.set_style(Stylesheet(vec![StyleRule::new("node", AttrMap::new())]));
        cy.append_style(Stylesheet(vec![StyleRule::new("edge", AttrMap::new())]));
        cy.queue_animation(ElementId::new("a"));

        assert!(!cy.autolock());
        assert!(cy.zooming_enabled());
        assert!(cy.box_selection_enabled());
        assert_eq!(cy.selection_type(), SelectionKind::Single);
        assert!(cy.style_sheet().is_empty());
        assert!(cy.animating_elements().is_empty());
    }

    #[tokio::test]
    async fn scratch_mutators_are_silent_after_destroy() {
        let cy = headless().await;
        cy.set_scratch("k", serde_json::json!(1));

        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        cy.on(EventKind::Scratch, move |_| h.set(h.get() + 1));

        cy.destroy();
        cy.set_scratch("k", serde_json::json!(2));
        cy.remove_scratch("k");

        assert_eq!(cy.scratch("k"), Some(serde_json::json!(1)));
        assert_eq!(hits.get(), 0);
    }

    #[tokio::test]
    async fn lifecycle_operations_are_noops_after_destroy() {
        let cy = headless().await;
        cy.destroy();
        cy.unmount();
        cy.mount(Surface::new(9, 100, 100), None).expect("mount");
        assert!(cy.is_headless());
        assert_eq!(cy.container(), None);
    }

    #[tokio::test]
    async fn zoom_clamps_to_bounds() {
        let cy = headless().await;
        cy.zoom_range(0.5, 2.0).expect("range");
        cy.set_zoom(10.0);
        assert_eq!(cy.zoom(), 2.0);
        cy.set_zoom(0.001);
        assert_eq!(cy.zoom(), 0.5);
        cy.set_zoom(f64::NAN);
        assert_eq!(cy.zoom(), 0.5);
    }

    #[tokio::test]
    async fn inverted_zoom_range_is_rejected() {
        let cy = headless().await;
        let err = cy.zoom_range(2.0, 1.0).expect_err("inverted");
        assert!(matches!(err, SkeinError::InvalidZoomRange { .. }));
        assert!(cy.min_zoom() <= cy.max_zoom());
    }

    #[tokio::test]
    async fn disabled_zooming_ignores_set_zoom() {
        let cy = headless().await;
        cy.set_zooming_enabled(false);
        cy.set_zoom(3.0);
        assert_eq!(cy.zoom(), 1.0);
    }

    #[tokio::test]
    async fn mount_transitions_out_of_headless_without_touching_elements() {
        let cy = Skein::new(
            InstanceOptions::new().elements(ElementsSection::Flat(vec![
                ElementDesc::node("a"),
                ElementDesc::node("b"),
            ])),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");
        assert!(cy.is_headless());
        let ids = cy.element_ids();

        cy.mount(Surface::new(7, 640, 480), None).expect("mount");
        assert!(!cy.is_headless());
        assert!(cy.style_enabled());
        assert!(cy.is_animation_running());
        assert_eq!(cy.element_ids(), ids);

        cy.unmount();
        assert!(cy.is_headless());
        assert_eq!(cy.element_ids(), ids);
    }

    #[tokio::test]
    async fn mount_emits_mount_and_unmount_emits_unmount() {
        let cy = headless().await;
        let mounts = Rc::new(Cell::new(0));
        let unmounts = Rc::new(Cell::new(0));
        let m = Rc::clone(&mounts);
        cy.on(EventKind::Mount, move |_| m.set(m.get() + 1));
        let u = Rc::clone(&unmounts);
        cy.on(EventKind::Unmount, move |_| u.set(u.get() + 1));

        cy.mount(Surface::new(1, 10, 10), None).expect("mount");
        cy.unmount();
        assert_eq!((mounts.get(), unmounts.get()), (1, 1));
    }

    #[tokio::test]
    async fn scratch_changes_emit_scratch_event() {
        let cy = headless().await;
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        cy.on(EventKind::Scratch, move |_| h.set(h.get() + 1));

        cy.set_scratch("k", serde_json::json!(1));
        cy.set_scratch("k", serde_json::json!(1)); // unchanged, no event
        cy.remove_scratch("k");
        cy.remove_scratch("k"); // absent, no event
        assert_eq!(hits.get(), 2);
        assert_eq!(cy.scratch("k"), None);
    }

    #[tokio::test]
    async fn queued_animations_promote_when_clock_starts() {
        let cy = headless().await;
        assert!(cy.is_animation_running());

        cy.unmount(); // stops the clock
        assert!(!cy.is_animation_running());
        cy.queue_animation(ElementId::new("a"));
        assert!(cy.animating_elements().is_empty());

        cy.mount(Surface::new(3, 10, 10), None).expect("mount");
        assert!(cy.is_animation_running());
        assert_eq!(cy.animating_elements(), vec![ElementId::new("a")]);
    }
}
