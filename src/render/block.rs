//! Markdown rendering for text blocks.

use crate::model::TextBlock;

use super::rules::{default_rules, BlockRules, Classification};

/// Render a block with the default rules.
pub fn format_block(block: &TextBlock) -> String {
    BlockFormatter::new(default_rules()).format(block)
}

/// Renders text blocks as headings, list items and paragraph text.
#[derive(Debug, Clone, Copy)]
pub struct BlockFormatter<'a> {
    rules: &'a BlockRules,
}

impl<'a> BlockFormatter<'a> {
    /// Create a formatter over a rule table.
    pub fn new(rules: &'a BlockRules) -> Self {
        Self { rules }
    }

    /// Render a block to Markdown.
    pub fn format(&self, block: &TextBlock) -> String {
        let mut output = String::new();
        self.render(&mut output, block, |_| {});
        output
    }

    /// Render a block, reporting the classification of every emitted run.
    pub fn render<F>(&self, output: &mut String, block: &TextBlock, mut on_run: F)
    where
        F: FnMut(Classification),
    {
        for line in &block.lines {
            for run in &line.runs {
                let text = run.text.trim();
                if text.is_empty() {
                    continue;
                }

                let class = self.rules.classify(text, run.font_size);
                self.render_run(output, text, class);
                on_run(class);
            }
            output.push('\n');
        }
    }

    fn render_run(&self, output: &mut String, text: &str, class: Classification) {
        match class {
            Classification::Heading(level) => {
                output.push('\n');
                for _ in 0..level {
                    output.push('#');
                }
                output.push(' ');
                output.push_str(text);
                output.push('\n');
            }
            Classification::Bullet => {
                // Glyph plus one separator; any further whitespace is trimmed
                let rest: String = text.chars().skip(2).collect();
                output.push_str("- ");
                output.push_str(rest.trim());
                output.push('\n');
            }
            Classification::Numbered => {
                output.push_str(text);
                output.push('\n');
            }
            Classification::Body => {
                output.push_str(text);
                output.push(' ');
            }
        }
    }
}
