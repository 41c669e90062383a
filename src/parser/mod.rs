//! PDF parsing: collaborator traits and their lopdf implementation.

mod backend;
mod layout;
mod options;
mod table_detector;

pub use backend::{PageSize, PageSource, PdfDocument, TableExtractor, TextExtractor};
pub use layout::{
    blocks_to_html, decode_text_simple, estimate_width, extract_spans, LayoutAnalyzer,
    LayoutConfig, TextSpan,
};
pub use options::ParseOptions;
pub use table_detector::{TableDetector, TableDetectorConfig};
