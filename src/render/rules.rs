//! Ordered classification rules for text runs.
//!
//! Heading rules are checked largest threshold first, then list rules in
//! insertion order. The first match wins; anything unmatched is body text.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// A run larger than `min_size` points becomes a heading of `level`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingRule {
    /// Exclusive lower bound on the font size
    pub min_size: f32,
    /// Markdown heading level (1-6)
    pub level: u8,
}

/// What to do with body text matching a list pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    /// Drop the glyph and emit a `- ` list item
    Bullet,
    /// Emit the text unchanged on its own line
    Numbered,
}

/// A list pattern and the action it triggers.
#[derive(Debug, Clone)]
pub struct ListRule {
    /// Pattern tested against the trimmed run text
    pub pattern: Regex,
    /// Action on match
    pub action: ListAction,
}

/// Outcome of classifying one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Heading of the given level
    Heading(u8),
    /// Bulleted list item
    Bullet,
    /// Numbered list item
    Numbered,
    /// Paragraph text
    Body,
}

impl Classification {
    /// Check if this is a list item of either kind.
    pub fn is_list_item(&self) -> bool {
        matches!(self, Classification::Bullet | Classification::Numbered)
    }
}

/// Data-driven rule table for the block formatter.
#[derive(Debug, Clone)]
pub struct BlockRules {
    headings: Vec<HeadingRule>,
    lists: Vec<ListRule>,
}

impl BlockRules {
    /// A table with no rules; everything is body text.
    pub fn empty() -> Self {
        Self {
            headings: Vec::new(),
            lists: Vec::new(),
        }
    }

    /// Add a heading threshold.
    pub fn with_heading(mut self, min_size: f32, level: u8) -> Self {
        self.headings.push(HeadingRule {
            min_size,
            level: level.clamp(1, 6),
        });
        self.headings.sort_by(|a, b| b.min_size.total_cmp(&a.min_size));
        self
    }

    /// Add a list pattern, evaluated after the ones already present.
    pub fn with_list_pattern(mut self, pattern: &str, action: ListAction) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Render(format!("invalid list pattern {:?}: {}", pattern, e)))?;
        self.lists.push(ListRule { pattern, action });
        Ok(self)
    }

    /// Heading rules, largest threshold first.
    pub fn headings(&self) -> &[HeadingRule] {
        &self.headings
    }

    /// Classify trimmed run text by size, then by list patterns.
    pub fn classify(&self, text: &str, font_size: f32) -> Classification {
        if let Some(rule) = self.headings.iter().find(|r| font_size > r.min_size) {
            return Classification::Heading(rule.level);
        }

        self.lists
            .iter()
            .find(|r| r.pattern.is_match(text))
            .map(|r| match r.action {
                ListAction::Bullet => Classification::Bullet,
                ListAction::Numbered => Classification::Numbered,
            })
            .unwrap_or(Classification::Body)
    }
}

impl Default for BlockRules {
    fn default() -> Self {
        Self {
            headings: vec![
                HeadingRule {
                    min_size: 16.0,
                    level: 1,
                },
                HeadingRule {
                    min_size: 13.0,
                    level: 2,
                },
                HeadingRule {
                    min_size: 11.0,
                    level: 3,
                },
            ],
            lists: vec![
                ListRule {
                    pattern: Regex::new(r"^[•\-–●]\s+").unwrap(),
                    action: ListAction::Bullet,
                },
                ListRule {
                    pattern: Regex::new(r"^\d+\.\s+").unwrap(),
                    action: ListAction::Numbered,
                },
            ],
        }
    }
}

/// Shared instance of the default rules.
pub fn default_rules() -> &'static BlockRules {
    static RULES: OnceLock<BlockRules> = OnceLock::new();
    RULES.get_or_init(BlockRules::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_thresholds() {
        let rules = BlockRules::default();
        assert_eq!(rules.classify("Title", 17.0), Classification::Heading(1));
        assert_eq!(rules.classify("Title", 14.0), Classification::Heading(2));
        assert_eq!(rules.classify("Title", 12.0), Classification::Heading(3));
        assert_eq!(rules.classify("Title", 10.0), Classification::Body);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let rules = BlockRules::default();
        assert_eq!(rules.classify("x", 16.0), Classification::Heading(2));
        assert_eq!(rules.classify("x", 11.0), Classification::Body);
    }

    #[test]
    fn test_list_patterns() {
        let rules = BlockRules::default();
        assert_eq!(rules.classify("• Item", 10.0), Classification::Bullet);
        assert_eq!(rules.classify("– Item", 10.0), Classification::Bullet);
        assert_eq!(rules.classify("3. Step", 10.0), Classification::Numbered);
        assert_eq!(rules.classify("3.Step", 10.0), Classification::Body);
        assert_eq!(rules.classify("-dash", 10.0), Classification::Body);
    }

    #[test]
    fn test_heading_wins_over_list() {
        let rules = BlockRules::default();
        assert_eq!(rules.classify("1. Introduction", 18.0), Classification::Heading(1));
    }

    #[test]
    fn test_custom_rules_sorted() {
        let rules = BlockRules::empty()
            .with_heading(10.0, 3)
            .with_heading(20.0, 1)
            .with_list_pattern(r"^\*\s+", ListAction::Bullet)
            .unwrap();

        assert_eq!(rules.headings()[0].min_size, 20.0);
        assert_eq!(rules.classify("big", 25.0), Classification::Heading(1));
        assert_eq!(rules.classify("* star", 9.0), Classification::Bullet);
        assert_eq!(rules.classify("• dot", 9.0), Classification::Body);
    }

    #[test]
    fn test_invalid_pattern() {
        let result = BlockRules::empty().with_list_pattern("(", ListAction::Bullet);
        assert!(matches!(result, Err(Error::Render(_))));
    }
}
