//! Error types for pagemark.

use std::io;
use thiserror::Error;

/// Result type alias for pagemark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a PDF.
///
/// Table grids without a header row and misclassified headings are not
/// errors; they render leniently. Everything here aborts the whole document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The PDF structure is corrupted or malformed.
    #[error("Corrupted PDF structure: {0}")]
    Corrupted(String),

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error detecting or extracting tables.
    #[error("Table extraction error: {0}")]
    TableExtract(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// A failure raised while composing one page.
    #[error("page {page}: {source}")]
    Page {
        /// 1-based page number
        page: u32,
        /// Underlying collaborator failure
        #[source]
        source: Box<Error>,
    },

    /// The caller's deadline passed before the given page was started.
    #[error("Deadline exceeded before page {page}")]
    DeadlineExceeded {
        /// 1-based page number that was not started
        page: u32,
    },

    /// Error during rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Attribute this error to a page, unless it already names one.
    pub fn on_page(self, page: u32) -> Self {
        match self {
            Error::Page { .. } | Error::DeadlineExceeded { .. } => self,
            other => Error::Page {
                page,
                source: Box::new(other),
            },
        }
    }

    /// The 1-based page this error is attributed to, if any.
    pub fn page(&self) -> Option<u32> {
        match self {
            Error::Page { page, .. } | Error::DeadlineExceeded { page } => Some(*page),
            _ => None,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
