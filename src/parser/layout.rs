//! Layout analysis for PDF pages.
//!
//! Turns a decoded content stream into positioned text spans, groups spans
//! into lines and lines into paragraph blocks, and renders blocks as HTML.
//! All coordinates leaving this module use a top-left origin.

use std::cmp::Ordering;

use lopdf::content::Operation;
use lopdf::Object;

use crate::model::{BoundingBox, Run, TextBlock, TextLine};

/// Share of the font size above the baseline.
const ASCENT: f32 = 0.8;
/// Share of the font size below the baseline.
const DESCENT: f32 = 0.2;
/// Average glyph advance as a share of the font size.
const CHAR_WIDTH: f32 = 0.5;

/// A text span with position and size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Baseline, measured down from the top of the page
    pub baseline: f32,
    /// Estimated advance width
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a span, estimating its width from the character count.
    pub fn new(text: impl Into<String>, x: f32, baseline: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = estimate_width(&text, font_size);
        Self {
            text,
            x,
            baseline,
            width,
            font_size,
        }
    }

    /// Top edge (approximate ascender).
    pub fn top(&self) -> f32 {
        self.baseline - self.font_size * ASCENT
    }

    /// Bottom edge (approximate descender).
    pub fn bottom(&self) -> f32 {
        self.baseline + self.font_size * DESCENT
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Extent of the span.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.top(), self.right(), self.bottom())
    }
}

/// Glyph metrics are not resolved, so widths are estimated.
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * CHAR_WIDTH
}

/// Tuning for line and block grouping.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Baseline tolerance for spans on one line (fraction of font size)
    pub line_tolerance: f32,
    /// Horizontal gap that splits a line into separate fragments (multiple of font size)
    pub fragment_gap: f32,
    /// Baseline spacing, relative to the page average, that starts a new block
    pub paragraph_gap_factor: f32,
    /// Font size change that starts a new block (points)
    pub font_size_break: f32,
    /// Left margin change that starts a new block (points)
    pub indent_break: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 0.3,
            fragment_gap: 3.0,
            paragraph_gap_factor: 1.5,
            font_size_break: 1.0,
            indent_break: 20.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Content stream interpretation
// ---------------------------------------------------------------------------

/// Text matrix for tracking position in content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32, // X translation
    f: f32, // Y translation
    line_e: f32,
    line_f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, m: [f32; 6]) {
        let [a, b, c, d, e, f] = m;
        *self = Self {
            a,
            b,
            c,
            d,
            e,
            f,
            line_e: e,
            line_f: f,
        };
    }

    /// Move to the start of the next line, offset from the current line start.
    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    /// Advance along the baseline after showing text.
    fn advance(&mut self, width: f32) {
        self.e += width * self.a;
        self.f += width * self.b;
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Graphics state that matters for text positioning.
#[derive(Debug, Clone)]
struct TextState {
    matrix: TextMatrix,
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: TextMatrix::default(),
            font: Vec::new(),
            font_size: 12.0,
            leading: 12.0,
        }
    }
}

impl TextState {
    fn next_line(&mut self) {
        self.matrix.translate(0.0, -self.leading);
    }
}

/// Interpret text operators into spans.
///
/// `decode` receives the current font resource name and the raw string bytes.
/// `page_top` is the top edge of the MediaBox; it flips PDF user space
/// (origin bottom-left) to a top-left origin.
pub fn extract_spans<F>(operations: &[Operation], page_top: f32, mut decode: F) -> Vec<TextSpan>
where
    F: FnMut(&[u8], &[u8]) -> String,
{
    let mut spans = Vec::new();
    let mut state = TextState::default();
    let mut in_text_block = false;

    for op in operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                state.matrix = TextMatrix::default();
            }
            "ET" => {
                in_text_block = false;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    state.font = name.clone();
                }
                if let Some(size) = operands.get(1).and_then(get_number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(get_number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(get_number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(get_number).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = -ty;
                }
                state.matrix.translate(tx, ty);
            }
            "Tm" => {
                if operands.len() >= 6 {
                    let mut m = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                    for (slot, operand) in m.iter_mut().zip(operands) {
                        if let Some(v) = get_number(operand) {
                            *slot = v;
                        }
                    }
                    state.matrix.set(m);
                }
            }
            "T*" => state.next_line(),
            "Tj" | "'" | "\"" | "TJ" => {
                if op.operator == "'" || op.operator == "\"" {
                    state.next_line();
                }
                if !in_text_block {
                    continue;
                }
                let text = match op.operator.as_str() {
                    "Tj" | "'" => string_operand(operands.first(), &state.font, &mut decode),
                    "\"" => string_operand(operands.get(2), &state.font, &mut decode),
                    _ => match operands.first() {
                        Some(Object::Array(items)) => {
                            show_array(items, &state.font, &mut decode)
                        }
                        _ => String::new(),
                    },
                };
                show_text(&mut spans, &mut state, text, page_top);
            }
            _ => {}
        }
    }

    log::trace!("extracted {} spans from {} operations", spans.len(), operations.len());
    spans
}

fn string_operand<F>(operand: Option<&Object>, font: &[u8], decode: &mut F) -> String
where
    F: FnMut(&[u8], &[u8]) -> String,
{
    match operand {
        Some(Object::String(bytes, _)) => decode(font, bytes),
        _ => String::new(),
    }
}

/// TJ: array of strings and positioning adjustments.
///
/// Adjustments are in 1/1000 text space units; large negative values
/// stand in for word spaces.
fn show_array<F>(items: &[Object], font: &[u8], decode: &mut F) -> String
where
    F: FnMut(&[u8], &[u8]) -> String,
{
    let space_threshold = 200.0;
    let mut combined = String::new();

    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode(font, bytes)),
            other => {
                let Some(n) = get_number(other) else {
                    continue;
                };
                if -n > space_threshold
                    && !combined.is_empty()
                    && !combined.ends_with(' ')
                    && !combined.ends_with('\u{00A0}')
                    && !combined.chars().last().is_some_and(is_spaceless_script_char)
                {
                    combined.push(' ');
                }
            }
        }
    }

    combined
}

fn show_text(spans: &mut Vec<TextSpan>, state: &mut TextState, text: String, page_top: f32) {
    if text.is_empty() {
        return;
    }
    let advance = estimate_width(&text, state.font_size);
    if !text.trim().is_empty() {
        let size = state.font_size * state.matrix.scale();
        let baseline = page_top - state.matrix.f;
        spans.push(TextSpan::new(text, state.matrix.e, baseline, size));
    }
    state.matrix.advance(advance);
}

/// Helper to extract number from PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// Line and block grouping
// ---------------------------------------------------------------------------

/// A horizontal run of spans sharing a baseline, not crossing a column gap.
#[derive(Debug, Clone)]
struct LineFragment {
    spans: Vec<TextSpan>,
    baseline: f32,
    x: f32,
    right: f32,
    font_size: f32,
}

impl LineFragment {
    fn from_spans(spans: Vec<TextSpan>) -> Self {
        let baseline = spans.first().map(|s| s.baseline).unwrap_or(0.0);
        let x = spans.iter().map(|s| s.x).fold(f32::INFINITY, f32::min);
        let right = spans.iter().map(|s| s.right()).fold(f32::NEG_INFINITY, f32::max);

        // Dominant font size, weighted by text length
        let total_chars: usize = spans.iter().map(|s| s.text.chars().count()).sum();
        let font_size = if total_chars > 0 {
            spans
                .iter()
                .map(|s| s.font_size * s.text.chars().count() as f32)
                .sum::<f32>()
                / total_chars as f32
        } else {
            spans.first().map(|s| s.font_size).unwrap_or(0.0)
        };

        Self {
            spans,
            baseline,
            x,
            right,
            font_size,
        }
    }

    fn bbox(&self) -> BoundingBox {
        self.spans
            .iter()
            .map(TextSpan::bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| BoundingBox::new(self.x, self.baseline, self.right, self.baseline))
    }

    fn overlaps_horizontally(&self, other: &LineFragment) -> bool {
        self.x < other.right && other.x < self.right
    }

    /// Merge neighbouring spans of equal size into runs.
    fn into_line(self) -> TextLine {
        let mut runs: Vec<Run> = Vec::new();
        let mut prev: Option<TextSpan> = None;

        for span in self.spans {
            match (runs.last_mut(), &prev) {
                (Some(run), Some(prev_span)) if (run.font_size - span.font_size).abs() < 0.1 => {
                    if needs_space(prev_span, &span) {
                        run.text.push(' ');
                    }
                    run.text.push_str(&span.text);
                }
                _ => runs.push(Run::new(span.text.clone(), span.font_size)),
            }
            prev = Some(span);
        }

        TextLine::new(runs)
    }
}

/// Whether a word space belongs between two adjacent spans.
fn needs_space(prev: &TextSpan, curr: &TextSpan) -> bool {
    let gap = curr.x - prev.right();
    let threshold = curr.font_size * CHAR_WIDTH * 0.2;
    if gap <= threshold {
        return false;
    }

    let prev_ends_with_space = prev.text.ends_with(' ') || prev.text.ends_with('\u{00A0}');
    let curr_starts_with_space = curr.text.starts_with(' ') || curr.text.starts_with('\u{00A0}');
    if prev_ends_with_space || curr_starts_with_space {
        return false;
    }

    let prev_cjk = prev.text.chars().last().is_some_and(is_spaceless_script_char);
    let curr_cjk = curr.text.chars().next().is_some_and(is_spaceless_script_char);
    !(prev_cjk && curr_cjk)
}

/// A block under construction.
struct BlockBuilder {
    lines: Vec<LineFragment>,
    bbox: BoundingBox,
}

impl BlockBuilder {
    fn new(line: LineFragment) -> Self {
        let bbox = line.bbox();
        Self {
            lines: vec![line],
            bbox,
        }
    }

    fn push(&mut self, line: LineFragment) {
        self.bbox = self.bbox.union(&line.bbox());
        self.lines.push(line);
    }

    fn last(&self) -> &LineFragment {
        // Builders are never empty
        &self.lines[self.lines.len() - 1]
    }

    fn build(self) -> TextBlock {
        TextBlock::new(
            self.bbox,
            self.lines.into_iter().map(LineFragment::into_line).collect(),
        )
    }
}

/// Groups spans into lines and lines into paragraph blocks.
#[derive(Debug, Clone, Default)]
pub struct LayoutAnalyzer {
    config: LayoutConfig,
}

impl LayoutAnalyzer {
    /// Create an analyzer with the given configuration.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Group a page's spans into blocks, ordered by their first line.
    pub fn blocks(&self, spans: Vec<TextSpan>) -> Vec<TextBlock> {
        let lines = self.group_into_lines(spans);
        let blocks = self.group_into_blocks(lines);
        log::debug!("layout: {} blocks", blocks.len());
        blocks
    }

    /// Group spans into line fragments by baseline, splitting at wide gaps.
    fn group_into_lines(&self, mut spans: Vec<TextSpan>) -> Vec<LineFragment> {
        if spans.is_empty() {
            return vec![];
        }

        spans.sort_by(|a, b| {
            a.baseline
                .total_cmp(&b.baseline)
                .then_with(|| a.x.total_cmp(&b.x))
        });

        let mut rows: Vec<Vec<TextSpan>> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in spans {
            let tolerance = span.font_size * self.config.line_tolerance;
            match (current_y, rows.last_mut()) {
                (Some(y), Some(row)) if (span.baseline - y).abs() <= tolerance => row.push(span),
                _ => {
                    current_y = Some(span.baseline);
                    rows.push(vec![span]);
                }
            }
        }

        let mut lines = Vec::new();
        for mut row in rows {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            let mut fragment: Vec<TextSpan> = Vec::new();
            for span in row {
                if let Some(prev) = fragment.last() {
                    let gap = span.x - prev.right();
                    if gap > prev.font_size.max(span.font_size) * self.config.fragment_gap {
                        lines.push(LineFragment::from_spans(std::mem::take(&mut fragment)));
                    }
                }
                fragment.push(span);
            }
            if !fragment.is_empty() {
                lines.push(LineFragment::from_spans(fragment));
            }
        }

        lines
    }

    /// Attach each line to the open block directly above it, or start a new one.
    fn group_into_blocks(&self, lines: Vec<LineFragment>) -> Vec<TextBlock> {
        let avg_spacing = average_line_spacing(&lines);
        let mut builders: Vec<BlockBuilder> = Vec::new();

        for line in lines {
            let target = builders
                .iter()
                .rposition(|b| self.continues_block(b.last(), &line, avg_spacing));
            match target {
                Some(i) => builders[i].push(line),
                None => builders.push(BlockBuilder::new(line)),
            }
        }

        builders.into_iter().map(BlockBuilder::build).collect()
    }

    fn continues_block(&self, prev: &LineFragment, curr: &LineFragment, avg_spacing: f32) -> bool {
        if !prev.overlaps_horizontally(curr) {
            return false;
        }

        // Same row: a separate fragment, never a continuation
        let spacing = curr.baseline - prev.baseline;
        if spacing <= prev.font_size * self.config.line_tolerance {
            return false;
        }

        // Large spacing indicates new paragraph
        if spacing > avg_spacing * self.config.paragraph_gap_factor {
            return false;
        }

        if (prev.font_size - curr.font_size).abs() > self.config.font_size_break {
            return false;
        }

        (prev.x - curr.x).abs() <= self.config.indent_break
    }
}

/// Mean distance between consecutive distinct baselines.
fn average_line_spacing(lines: &[LineFragment]) -> f32 {
    let mut baselines: Vec<f32> = lines.iter().map(|l| l.baseline).collect();
    baselines.sort_by(|a, b| a.total_cmp(b));

    let spacings: Vec<f32> = baselines
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|s| *s > 0.1)
        .collect();

    if spacings.is_empty() {
        return 12.0;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

/// Compare spans top to bottom, then left to right.
pub fn reading_order(a: &TextSpan, b: &TextSpan) -> Ordering {
    a.baseline
        .total_cmp(&b.baseline)
        .then_with(|| a.x.total_cmp(&b.x))
}

// ---------------------------------------------------------------------------
// HTML export
// ---------------------------------------------------------------------------

/// Render a page's blocks as a positioned HTML fragment.
pub fn blocks_to_html(page: u32, width: f32, height: f32, blocks: &[TextBlock]) -> String {
    let mut html = format!(
        "<div id=\"page{}\" style=\"position:relative;width:{:.1}pt;height:{:.1}pt\">\n",
        page, width, height
    );

    for block in blocks {
        html.push_str(&format!(
            "<p style=\"position:absolute;top:{:.1}pt;left:{:.1}pt\">",
            block.bbox.top, block.bbox.left
        ));
        for (i, line) in block.lines.iter().enumerate() {
            if i > 0 {
                html.push_str("<br/>");
            }
            for run in &line.runs {
                html.push_str(&format!(
                    "<span style=\"font-size:{:.1}pt\">{}</span>",
                    run.font_size,
                    html_escape::encode_text(&run.text)
                ));
            }
        }
        html.push_str("</p>\n");
    }

    html.push_str("</div>");
    html
}
