//! # Layout Runner Contract
//!
//! The layout collaborator computes element positions and signals two
//! lifecycle moments: *ready* (positions computed, not yet settled) and
//! *stop* (fully settled). Layouts report those through a [`LayoutFeed`];
//! the lifecycle controller replays the recorded signals through the event
//! bus once the layout has released its borrow of the pool.
//!
//! The built-in runners are deterministic reference backends, not layout
//! physics: `null` for headless instances, `grid` for mounted ones, and
//! `preset` to keep caller-supplied positions untouched.

use crate::pool::ElementPool;
use crate::types::{Group, Position, SkeinError};
use serde::{Deserialize, Serialize};

// =============================================================================
// LAYOUT OPTIONS
// =============================================================================

/// Resolved layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    /// Registered layout name.
    pub name: String,
    /// Node spacing used by position-assigning layouts.
    pub spacing: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            name: "null".to_string(),
            spacing: 100.0,
        }
    }
}

impl LayoutOptions {
    /// Options for the named layout with default spacing.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

// =============================================================================
// LAYOUT FEED
// =============================================================================

/// Lifecycle signal reported by a layout run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSignal {
    /// Positions computed, not yet settled.
    Ready,
    /// Fully settled.
    Stop,
}

/// Ordered record of the signals one layout run emitted.
#[derive(Debug, Default)]
pub struct LayoutFeed {
    signals: Vec<LayoutSignal>,
}

impl LayoutFeed {
    /// Create an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the *ready* signal.
    pub fn ready(&mut self) {
        self.signals.push(LayoutSignal::Ready);
    }

    /// Record the *stop* signal.
    pub fn stop(&mut self) {
        self.signals.push(LayoutSignal::Stop);
    }

    /// Consume the feed, yielding signals in emission order.
    #[must_use]
    pub fn into_signals(self) -> Vec<LayoutSignal> {
        self.signals
    }
}

// =============================================================================
// LAYOUT RUNNER CONTRACT
// =============================================================================

/// A layout algorithm implementation.
pub trait LayoutRunner {
    /// Registered name of the layout.
    fn name(&self) -> &'static str;

    /// Compute positions over the pool, reporting lifecycle signals.
    ///
    /// Every run must signal `ready` and `stop` through the feed, in that
    /// order, before returning.
    fn run(
        &mut self,
        pool: &mut ElementPool,
        opts: &LayoutOptions,
        feed: &mut LayoutFeed,
    ) -> Result<(), SkeinError>;
}

/// Instantiate a built-in layout by name.
pub fn create(name: &str) -> Result<Box<dyn LayoutRunner>, SkeinError> {
    match name {
        "null" => Ok(Box::new(NullLayout)),
        "grid" => Ok(Box::new(GridLayout)),
        "preset" => Ok(Box::new(PresetLayout)),
        other => Err(SkeinError::UnknownLayout(other.to_string())),
    }
}

// =============================================================================
// BUILT-IN RUNNERS
// =============================================================================

/// Deterministic non-visual layout: every node at the origin.
///
/// The default for headless instances.
pub struct NullLayout;

impl LayoutRunner for NullLayout {
    fn name(&self) -> &'static str {
        "null"
    }

    fn run(
        &mut self,
        pool: &mut ElementPool,
        _opts: &LayoutOptions,
        feed: &mut LayoutFeed,
    ) -> Result<(), SkeinError> {
        for id in node_ids(pool) {
            if let Some(ele) = pool.get_mut(&id) {
                ele.set_position(Position::default());
            }
        }
        feed.ready();
        feed.stop();
        Ok(())
    }
}

/// Row/column placement in insertion order.
///
/// The default when a display surface is attached.
pub struct GridLayout;

impl LayoutRunner for GridLayout {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn run(
        &mut self,
        pool: &mut ElementPool,
        opts: &LayoutOptions,
        feed: &mut LayoutFeed,
    ) -> Result<(), SkeinError> {
        let ids = node_ids(pool);
        let columns = (ids.len() as f64).sqrt().ceil().max(1.0) as usize;
        for (index, id) in ids.iter().enumerate() {
            let row = index / columns;
            let col = index % columns;
            if let Some(ele) = pool.get_mut(id) {
                ele.set_position(Position::new(
                    col as f64 * opts.spacing,
                    row as f64 * opts.spacing,
                ));
            }
        }
        feed.ready();
        feed.stop();
        Ok(())
    }
}

/// Keeps positions already carried by the element descriptions.
pub struct PresetLayout;

impl LayoutRunner for PresetLayout {
    fn name(&self) -> &'static str {
        "preset"
    }

    fn run(
        &mut self,
        _pool: &mut ElementPool,
        _opts: &LayoutOptions,
        feed: &mut LayoutFeed,
    ) -> Result<(), SkeinError> {
        feed.ready();
        feed.stop();
        Ok(())
    }
}

fn node_ids(pool: &ElementPool) -> Vec<crate::types::ElementId> {
    pool.iter()
        .filter(|ele| ele.group() == Group::Nodes)
        .map(|ele| ele.id().clone())
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementDesc;

    fn pool_with_nodes(count: usize) -> ElementPool {
        let mut pool = ElementPool::new();
        for i in 0..count {
            pool.add(
                ElementDesc::node(format!("n{i}")).with_position(5.0, 5.0),
                None,
            )
            .expect("add node");
        }
        pool
    }

    #[test]
    fn unknown_layout_is_rejected() {
        let err = create("orbital").map(|_| ()).expect_err("unknown");
        assert!(matches!(err, SkeinError::UnknownLayout(_)));
    }

    #[test]
    fn null_layout_zeroes_positions_and_signals_in_order() {
        let mut pool = pool_with_nodes(3);
        let mut feed = LayoutFeed::new();
        let mut layout = create("null").expect("create");

        layout
            .run(&mut pool, &LayoutOptions::named("null"), &mut feed)
            .expect("run");

        for ele in pool.iter() {
            assert_eq!(ele.position(), Position::default());
        }
        assert_eq!(
            feed.into_signals(),
            vec![LayoutSignal::Ready, LayoutSignal::Stop]
        );
    }

    #[test]
    fn grid_layout_spaces_nodes() {
        let mut pool = pool_with_nodes(4);
        let mut feed = LayoutFeed::new();
        let opts = LayoutOptions {
            name: "grid".to_string(),
            spacing: 50.0,
        };

        GridLayout.run(&mut pool, &opts, &mut feed).expect("run");

        let positions: Vec<Position> = pool.iter().map(|ele| ele.position()).collect();
        assert_eq!(positions[0], Position::new(0.0, 0.0));
        assert_eq!(positions[1], Position::new(50.0, 0.0));
        assert_eq!(positions[2], Position::new(0.0, 50.0));
        assert_eq!(positions[3], Position::new(50.0, 50.0));
    }

    #[test]
    fn preset_layout_keeps_positions() {
        let mut pool = pool_with_nodes(2);
        let mut feed = LayoutFeed::new();

        PresetLayout
            .run(&mut pool, &LayoutOptions::named("preset"), &mut feed)
            .expect("run");

        for ele in pool.iter() {
            assert_eq!(ele.position(), Position::new(5.0, 5.0));
        }
    }
}
