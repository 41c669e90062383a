//! Parsing options and configuration.

use super::layout::LayoutConfig;
use super::table_detector::TableDetectorConfig;

/// Options for the lopdf-backed extractors.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Whether to run the stream-mode table detector
    pub detect_tables: bool,

    /// Table detector tuning
    pub table_config: TableDetectorConfig,

    /// Line and block grouping tuning
    pub layout: LayoutConfig,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, detect: bool) -> Self {
        self.detect_tables = detect;
        self
    }

    /// Disable table detection; every block is emitted as prose.
    pub fn without_tables(mut self) -> Self {
        self.detect_tables = false;
        self
    }

    /// Set table detector configuration.
    pub fn with_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.table_config = config;
        self
    }

    /// Set layout grouping configuration.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            detect_tables: true,
            table_config: TableDetectorConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .without_tables()
            .with_table_config(TableDetectorConfig {
                max_columns: 10,
                ..Default::default()
            });

        assert!(!options.detect_tables);
        assert_eq!(options.table_config.max_columns, 10);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(options.detect_tables);
        assert_eq!(options.table_config.min_rows, 2);
    }
}
