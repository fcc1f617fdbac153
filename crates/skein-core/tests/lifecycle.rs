//! # Lifecycle Integration Tests
//!
//! End-to-end bootstrap, event ordering, display attachment, registry
//! exclusivity, and snapshot synchronization through the public API.

use skein_core::{
    Deferred, ElementDesc, ElementId, ElementsSection, EventKind, InstanceOptions,
    InstanceRegistry, LayoutOptions, Position, Skein, SkeinError, Snapshot, StyleRule, Stylesheet,
    Surface, snapshot_from_bytes, snapshot_to_bytes,
};
use std::cell::RefCell;
use std::rc::Rc;

fn three_nodes() -> ElementsSection {
    ElementsSection::Flat(vec![
        ElementDesc::node("a"),
        ElementDesc::node("b"),
        ElementDesc::edge("ab", "a", "b"),
    ])
}

// =============================================================================
// BOOTSTRAP AND EVENT ORDERING
// =============================================================================

mod bootstrap {
    use super::*;

    #[tokio::test]
    async fn ready_sees_loaded_elements_and_computed_layout() {
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);

        let cy = Skein::new(
            InstanceOptions::new()
                .elements(three_nodes())
                .layout(LayoutOptions::named("grid"))
                .ready(move |cy: &Skein| {
                    *s.borrow_mut() = Some((cy.is_ready(), cy.element_count()));
                }),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");

        assert_eq!(*seen.borrow(), Some((true, 3)));
        assert_eq!(cy.layout_name().as_deref(), Some("grid"));
    }

    #[tokio::test]
    async fn done_fires_after_ready() {
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        let p = Rc::clone(&order);
        let _cy = Skein::new(
            InstanceOptions::new()
                .ready(move |_: &Skein| o.borrow_mut().push("ready"))
                .done(move |_: &Skein| p.borrow_mut().push("done")),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");

        assert_eq!(*order.borrow(), vec!["ready", "done"]);
    }

    #[tokio::test]
    async fn grid_layout_assigns_distinct_positions() {
        let cy = Skein::new(
            InstanceOptions::new()
                .elements(ElementsSection::Flat(vec![
                    ElementDesc::node("a"),
                    ElementDesc::node("b"),
                    ElementDesc::node("c"),
                    ElementDesc::node("d"),
                ]))
                .layout(LayoutOptions::named("grid")),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");

        let positions: Vec<Position> = cy
            .element_ids()
            .iter()
            .filter_map(|id| cy.element(id))
            .map(|ele| ele.position())
            .collect();
        assert_eq!(positions[0], Position::new(0.0, 0.0));
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert_ne!(a, b, "grid positions must not collide");
            }
        }
    }

    #[tokio::test]
    async fn preset_layout_keeps_supplied_positions() {
        let cy = Skein::new(
            InstanceOptions::new()
                .elements(ElementsSection::Flat(vec![
                    ElementDesc::node("a").with_position(7.0, 8.0),
                ]))
                .layout(LayoutOptions::named("preset")),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");

        let ele = cy.element(&ElementId::new("a")).expect("element");
        assert_eq!(ele.position(), Position::new(7.0, 8.0));
    }

    #[tokio::test]
    async fn deferred_inputs_join_before_load() {
        let cy = Skein::new(
            InstanceOptions::new()
                .elements(Deferred::task(async { Ok(three_nodes()) }))
                .style(Deferred::task(async {
                    Ok(Stylesheet(vec![StyleRule::new(
                        "node",
                        serde_json::Map::new(),
                    )]))
                }))
                .style_enabled(true),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");

        assert!(cy.is_ready());
        assert_eq!(cy.element_count(), 3);
        assert_eq!(cy.style_sheet().len(), 1);
    }

    /// Deferred elements input that stays pending until opened, so the
    /// bootstrap can be observed mid-flight.
    struct GatedElements {
        open: Rc<std::cell::Cell<bool>>,
    }

    impl std::future::Future for GatedElements {
        type Output = Result<ElementsSection, SkeinError>;

        fn poll(
            self: std::pin::Pin<&mut Self>,
            cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Self::Output> {
            if self.open.get() {
                std::task::Poll::Ready(Ok(three_nodes()))
            } else {
                cx.waker().wake_by_ref();
                std::task::Poll::Pending
            }
        }
    }

    #[tokio::test]
    async fn load_fires_before_ready_and_ready_emits_once() {
        use std::task::Poll;

        let registry = InstanceRegistry::new();
        let surface = Surface::new(21, 800, 600);
        let open = Rc::new(std::cell::Cell::new(false));

        let mut construction = Box::pin(Skein::new(
            InstanceOptions::new()
                .container(surface)
                .elements(Deferred::task(GatedElements {
                    open: Rc::clone(&open),
                })),
            &registry,
        ));

        // The bootstrap suspends at the deferred-elements join; the
        // surface is already claimed, so the handle is reachable.
        let early = std::future::poll_fn(|cx| match construction.as_mut().poll(cx) {
            Poll::Pending => Poll::Ready(None),
            Poll::Ready(result) => Poll::Ready(Some(result)),
        })
        .await;
        assert!(early.is_none(), "construction must wait for deferred elements");

        let pending = registry.get(surface.id).expect("claimed before the join");
        assert!(!pending.is_ready());

        let order = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&order);
        pending.on(EventKind::Load, move |_: &Skein| o.borrow_mut().push("load"));
        let o = Rc::clone(&order);
        pending.on(EventKind::Ready, move |_: &Skein| o.borrow_mut().push("ready"));
        // Multiple pre-ready registrations bind to the same emission.
        let o = Rc::clone(&order);
        pending.ready(move |_: &Skein| o.borrow_mut().push("cb1"));
        let o = Rc::clone(&order);
        pending.ready(move |_: &Skein| o.borrow_mut().push("cb2"));

        open.set(true);
        let cy = construction.await.expect("construct");

        assert!(cy.is_ready());
        assert_eq!(*order.borrow(), vec!["load", "ready", "cb1", "cb2"]);
        assert_eq!(
            order.borrow().iter().filter(|e| **e == "ready").count(),
            1,
            "ready fires exactly once"
        );
    }

    #[tokio::test]
    async fn generated_ids_fill_in_for_anonymous_nodes() {
        let cy = Skein::new(
            InstanceOptions::new().elements(ElementsSection::Flat(vec![
                ElementDesc::default(),
                ElementDesc::node("named"),
                ElementDesc::default(),
            ])),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");

        assert_eq!(cy.element_count(), 3);
        assert!(cy.has_element(&ElementId::new("named")));
    }
}

// =============================================================================
// REGISTRY EXCLUSIVITY
// =============================================================================

mod registry {
    use super::*;
    use std::cell::Cell;

    const SURFACE: Surface = Surface::new(11, 1024, 768);

    #[tokio::test]
    async fn surface_takeover_destroys_prior_and_preserves_queued_readies() {
        let registry = InstanceRegistry::new();
        let first = Skein::new(InstanceOptions::new().container(SURFACE), &registry)
            .await
            .expect("first");

        let order = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&order);
        registry.on_ready(SURFACE.id, move |cy: &Skein| {
            o.borrow_mut().push(cy.element_count());
        });
        // First occupant is already ready, so the callback ran immediately.
        assert_eq!(*order.borrow(), vec![0]);

        let second = Skein::new(
            InstanceOptions::new().container(SURFACE).elements(three_nodes()),
            &registry,
        )
        .await
        .expect("second");

        assert!(first.is_destroyed());
        assert!(second.is_ready());
        assert_eq!(
            registry.get(SURFACE.id).map(|cy| cy.element_count()),
            Some(3)
        );
    }

    #[tokio::test]
    async fn option_ready_runs_before_queued_surface_readies() {
        let registry = InstanceRegistry::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        registry.on_ready(SURFACE.id, move |_: &Skein| o.borrow_mut().push("queued"));

        let o = Rc::clone(&order);
        let _cy = Skein::new(
            InstanceOptions::new()
                .container(SURFACE)
                .ready(move |_: &Skein| o.borrow_mut().push("option")),
            &registry,
        )
        .await
        .expect("construct");

        assert_eq!(*order.borrow(), vec!["option", "queued"]);
    }

    #[tokio::test]
    async fn headless_instances_never_touch_the_registry() {
        let registry = InstanceRegistry::new();
        let _cy = Skein::new(InstanceOptions::new(), &registry)
            .await
            .expect("construct");
        assert!(registry.get(SURFACE.id).is_none());
    }

    #[tokio::test]
    async fn destroy_event_fires_on_takeover() {
        let registry = InstanceRegistry::new();
        let first = Skein::new(InstanceOptions::new().container(SURFACE), &registry)
            .await
            .expect("first");

        let destroyed = Rc::new(Cell::new(false));
        let d = Rc::clone(&destroyed);
        first.on(EventKind::Destroy, move |_: &Skein| d.set(true));

        let _second = Skein::new(InstanceOptions::new().container(SURFACE), &registry)
            .await
            .expect("second");
        assert!(destroyed.get());
    }
}

// =============================================================================
// DISPLAY ATTACHMENT
// =============================================================================

mod display {
    use super::*;

    #[tokio::test]
    async fn mounted_construction_uses_raster_renderer_and_grid_layout() {
        let cy = Skein::new(
            InstanceOptions::new().container(Surface::new(5, 320, 240)),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");

        assert!(!cy.is_headless());
        assert!(cy.style_enabled());
        assert_eq!(cy.options().renderer.name, "raster");
        assert_eq!(cy.options().layout.name, "grid");
    }

    #[tokio::test]
    async fn unmount_reports_the_headless_backend_in_captures() {
        let cy = Skein::new(
            InstanceOptions::new().container(Surface::new(6, 320, 240)),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");
        assert_eq!(cy.capture().renderer.map(|r| r.name), Some("raster".to_string()));

        cy.unmount();
        assert!(cy.is_headless());
        assert_eq!(cy.capture().renderer.map(|r| r.name), Some("null".to_string()));
    }

    #[tokio::test]
    async fn mount_after_headless_construction_keeps_state() {
        let cy = Skein::new(
            InstanceOptions::new().elements(three_nodes()).zoom(2.0),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");
        let ids = cy.element_ids();

        cy.mount(Surface::new(8, 640, 480), None).expect("mount");
        assert!(!cy.is_headless());
        assert_eq!(cy.element_ids(), ids);
        assert_eq!(cy.zoom(), 2.0);
    }
}

// =============================================================================
// SNAPSHOT SYNC AND ENVELOPE
// =============================================================================

mod sync {
    use super::*;

    async fn populated() -> Skein {
        let cy = Skein::new(
            InstanceOptions::new().elements(three_nodes()),
            &InstanceRegistry::new(),
        )
        .await
        .expect("construct");
        cy.zoom_range(0.1, 10.0).expect("range");
        cy.set_zoom(2.5);
        cy.set_pan(Position::new(-3.0, 4.0));
        cy.set_autolock(true);
        cy
    }

    #[tokio::test]
    async fn capture_apply_reproduces_an_instance() {
        let source = populated().await;
        let snapshot = source.capture();

        let target = Skein::new(InstanceOptions::new(), &InstanceRegistry::new())
            .await
            .expect("construct");
        target.apply(&snapshot).expect("apply");

        assert_eq!(target.element_ids(), source.element_ids());
        assert_eq!(target.zoom(), source.zoom());
        assert_eq!(target.pan(), source.pan());
        assert_eq!(target.autolock(), source.autolock());
        assert_eq!(target.min_zoom(), source.min_zoom());
        assert_eq!(target.max_zoom(), source.max_zoom());
    }

    #[tokio::test]
    async fn apply_reconciles_a_running_instance() {
        let cy = populated().await;
        let snapshot = Snapshot {
            elements: Some(ElementsSection::Flat(vec![
                ElementDesc::node("a").with_data("label", "kept"),
                ElementDesc::node("z"),
            ])),
            ..Snapshot::default()
        };
        cy.apply(&snapshot).expect("apply");

        assert_eq!(
            cy.element_ids(),
            vec![ElementId::new("a"), ElementId::new("z")]
        );
        let kept = cy.element(&ElementId::new("a")).expect("element");
        assert_eq!(kept.data().get("label"), Some(&serde_json::json!("kept")));
    }

    #[tokio::test]
    async fn capture_travels_through_the_binary_envelope() {
        let cy = populated().await;
        let bytes = snapshot_to_bytes(&cy.capture()).expect("encode");
        let restored = snapshot_from_bytes(&bytes).expect("decode");

        let target = Skein::new(InstanceOptions::new(), &InstanceRegistry::new())
            .await
            .expect("construct");
        target.apply(&restored).expect("apply");
        assert_eq!(target.element_ids(), cy.element_ids());
        assert_eq!(target.zoom(), cy.zoom());
    }
}
