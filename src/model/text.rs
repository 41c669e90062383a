//! Text runs, lines and blocks as delivered by the text extractor.

use super::BoundingBox;
use serde::{Deserialize, Serialize};

/// A contiguous piece of text sharing one font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Text content, untrimmed
    pub text: String,
    /// Font size in points
    pub font_size: f32,
}

impl Run {
    /// Create a new run.
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
        }
    }
}

/// One visual line of a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Runs in left-to-right order
    pub runs: Vec<Run>,
}

impl TextLine {
    /// Create a line from runs.
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    /// Create a line holding a single run.
    pub fn single(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            runs: vec![Run::new(text, font_size)],
        }
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A paragraph-like group of lines with its extent on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Extent of the block
    pub bbox: BoundingBox,
    /// Lines in top-to-bottom order
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    /// Create a block.
    pub fn new(bbox: BoundingBox, lines: Vec<TextLine>) -> Self {
        Self { bbox, lines }
    }

    /// Combined text of all lines, one line per row.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if the block carries no visible text.
    pub fn is_empty(&self) -> bool {
        self.lines
            .iter()
            .flat_map(|l| &l.runs)
            .all(|r| r.text.trim().is_empty())
    }

    /// Total number of runs.
    pub fn run_count(&self) -> usize {
        self.lines.iter().map(|l| l.runs.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_text() {
        let block = TextBlock::new(
            BoundingBox::new(0.0, 0.0, 100.0, 30.0),
            vec![
                TextLine::new(vec![Run::new("Hello ", 10.0), Run::new("world", 12.0)]),
                TextLine::single("Second", 10.0),
            ],
        );
        assert_eq!(block.text(), "Hello world\nSecond");
        assert_eq!(block.run_count(), 3);
        assert!(!block.is_empty());
    }

    #[test]
    fn test_whitespace_block_is_empty() {
        let block = TextBlock::new(
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            vec![TextLine::single("   ", 10.0), TextLine::default()],
        );
        assert!(block.is_empty());
    }
}
