//! # Style Engine Binding
//!
//! Holds the instance's stylesheet and its enablement state.
//!
//! The core does not parse or match selectors; it owns the stylesheet as
//! data, so style queries are well-defined from the moment the engine is
//! seeded with the empty stylesheet, before any external stylesheet
//! resolves. A generation counter lets renderers detect restyles cheaply.

use serde::{Deserialize, Serialize};
use crate::types::AttrMap;

// =============================================================================
// STYLESHEET
// =============================================================================

/// One selector/declaration-block pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    /// Selector text; matching is the style collaborator's concern.
    pub selector: String,
    /// Property declarations for matched elements.
    pub style: AttrMap,
}

impl StyleRule {
    /// Create a rule from a selector and declarations.
    #[must_use]
    pub fn new(selector: impl Into<String>, style: AttrMap) -> Self {
        Self {
            selector: selector.into(),
            style,
        }
    }
}

/// An ordered list of style rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Stylesheet(pub Vec<StyleRule>);

impl Stylesheet {
    /// The empty stylesheet.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the stylesheet has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// STYLE ENGINE
// =============================================================================

/// The instance's style binding.
#[derive(Debug, Clone, Default)]
pub struct StyleEngine {
    enabled: bool,
    sheet: Stylesheet,
    generation: u64,
}

impl StyleEngine {
    /// Create a style engine, enabled or not.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            sheet: Stylesheet::empty(),
            generation: 0,
        }
    }

    /// Whether styling is enabled for this instance.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable styling. Mounting a headless instance enables it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replace the stylesheet.
    pub fn set(&mut self, sheet: Stylesheet) {
        self.sheet = sheet;
        self.generation = self.generation.saturating_add(1);
    }

    /// Append rules after the current stylesheet.
    pub fn append(&mut self, sheet: Stylesheet) {
        if sheet.is_empty() {
            return;
        }
        self.sheet.0.extend(sheet.0);
        self.generation = self.generation.saturating_add(1);
    }

    /// The current stylesheet.
    #[must_use]
    pub fn sheet(&self) -> &Stylesheet {
        &self.sheet
    }

    /// Restyle generation; bumped on every set or non-empty append.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(selector: &str) -> StyleRule {
        StyleRule::new(selector, AttrMap::new())
    }

    #[test]
    fn seed_then_append_keeps_order() {
        let mut engine = StyleEngine::new(true);
        engine.set(Stylesheet::empty());
        engine.append(Stylesheet(vec![rule("node"), rule("edge")]));

        assert_eq!(engine.sheet().len(), 2);
        assert_eq!(engine.sheet().0[0].selector, "node");
    }

    #[test]
    fn set_replaces_previous_rules() {
        let mut engine = StyleEngine::new(true);
        engine.set(Stylesheet(vec![rule("node")]));
        engine.set(Stylesheet(vec![rule("edge")]));

        assert_eq!(engine.sheet().len(), 1);
        assert_eq!(engine.sheet().0[0].selector, "edge");
    }

    #[test]
    fn empty_append_does_not_bump_generation() {
        let mut engine = StyleEngine::new(true);
        let before = engine.generation();
        engine.append(Stylesheet::empty());
        assert_eq!(engine.generation(), before);

        engine.append(Stylesheet(vec![rule("node")]));
        assert_eq!(engine.generation(), before + 1);
    }
}
