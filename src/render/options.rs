//! Rendering options and configuration.

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

use super::rules::BlockRules;

/// Options for rendering a document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Word in the page separator heading ("## Page 3")
    pub page_label: String,

    /// Label line emitted before each table
    pub table_label: String,

    /// Heading and list classification rules
    pub rules: BlockRules,

    /// Page selection
    pub page_selection: PageSelection,

    /// Compose pages concurrently
    pub parallel: bool,

    /// Refuse to start pages after this instant
    pub deadline: Option<Instant>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page separator label.
    pub fn with_page_label(mut self, label: impl Into<String>) -> Self {
        self.page_label = label.into();
        self
    }

    /// Set the table label.
    pub fn with_table_label(mut self, label: impl Into<String>) -> Self {
        self.table_label = label.into();
        self
    }

    /// Set the classification rules.
    pub fn with_rules(mut self, rules: BlockRules) -> Self {
        self.rules = rules;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Set specific pages.
    pub fn with_page_list(mut self, pages: Vec<u32>) -> Self {
        self.page_selection = PageSelection::Pages(pages);
        self
    }

    /// Enable or disable parallel page composition.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Compose pages one at a time.
    pub fn sequential(self) -> Self {
        self.with_parallel(false)
    }

    /// Set a deadline, checked before each page.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub(crate) fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_label: "Page".to_string(),
            table_label: "Table:".to_string(),
            rules: BlockRules::default(),
            page_selection: PageSelection::All,
            parallel: true,
            deadline: None,
        }
    }
}

/// Page selection for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Render specific pages (1-indexed)
    Pages(Vec<u32>),
    /// Render several inclusive ranges, sorted and non-overlapping
    Ranges(Vec<RangeInclusive<u32>>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
            PageSelection::Ranges(ranges) => ranges.iter().any(|r| r.contains(&page)),
        }
    }

    /// Selected pages of a document, ascending.
    ///
    /// An explicit selection that names no existing page is an error; an
    /// empty document with `All` simply yields no pages.
    pub fn resolve(&self, page_count: u32) -> Result<Vec<u32>> {
        let pages: Vec<u32> = (1..=page_count).filter(|p| self.includes(*p)).collect();
        if pages.is_empty() && *self != PageSelection::All {
            return Err(Error::InvalidPageRange(format!(
                "{} selects none of {} pages",
                self, page_count
            )));
        }
        Ok(pages)
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());
        let number = |part: &str| -> Result<u32> {
            match part.trim().parse::<u32>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(n) => Ok(n),
            }
        };

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut ranges = Vec::new();
        for part in s.split(',') {
            let range = match part.split_once('-') {
                Some((start, end)) => (number(start)?, number(end)?),
                None => {
                    let page = number(part)?;
                    (page, page)
                }
            };
            if range.0 > range.1 {
                return Err(invalid());
            }
            ranges.push(range);
        }

        // Ranges stay unexpanded until resolved against a page count
        ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        if merged.iter().all(|(start, end)| start == end) {
            return Ok(PageSelection::Pages(merged.into_iter().map(|(p, _)| p).collect()));
        }
        Ok(PageSelection::Ranges(
            merged.into_iter().map(|(start, end)| start..=end).collect(),
        ))
    }
}

impl std::fmt::Display for PageSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageSelection::All => write!(f, "all"),
            PageSelection::Range(range) => write!(f, "{}-{}", range.start(), range.end()),
            PageSelection::Pages(pages) => {
                let parts: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            PageSelection::Ranges(ranges) => {
                let parts: Vec<String> = ranges
                    .iter()
                    .map(|r| {
                        if r.start() == r.end() {
                            r.start().to_string()
                        } else {
                            format!("{}-{}", r.start(), r.end())
                        }
                    })
                    .collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl std::str::FromStr for PageSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
