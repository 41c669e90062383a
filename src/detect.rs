//! PDF header sniffing.
//!
//! Rejects non-PDF input before it reaches lopdf, so the caller gets
//! [`Error::UnknownFormat`] instead of an opaque parse failure.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Readers tolerate up to this many bytes of junk before the header.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Header information found at the start of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Byte offset of `%PDF-` (non-zero when the file has leading junk)
    pub offset: usize,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Sniff the header of a file on disk.
///
/// Only the first kilobyte is read.
pub fn sniff_file<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let mut file = File::open(path)?;
    let mut head = Vec::with_capacity(HEADER_SEARCH_WINDOW);
    file.by_ref()
        .take(HEADER_SEARCH_WINDOW as u64)
        .read_to_end(&mut head)?;
    sniff_bytes(&head)
}

/// Sniff the header of an in-memory PDF.
pub fn sniff_bytes(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_start = offset + PDF_MAGIC.len();
    let version_bytes = data
        .get(version_start..version_start + VERSION_LEN)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    log::trace!("PDF header v{} at offset {}", version, offset);
    Ok(PdfHeader { version, offset })
}

/// Check if bytes start like a PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    sniff_bytes(data).is_ok()
}

/// Versions look like "1.4" or "2.0".
fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_valid_pdf() {
        let header = sniff_bytes(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap();
        assert_eq!(header.version, "1.7");
        assert_eq!(header.offset, 0);
        assert_eq!(header.to_string(), "PDF 1.7");
    }

    #[test]
    fn test_sniff_leading_junk() {
        let header = sniff_bytes(b"\r\n\x00garbage%PDF-2.0\n").unwrap();
        assert_eq!(header.version, "2.0");
        assert_eq!(header.offset, 10);
    }

    #[test]
    fn test_sniff_not_pdf() {
        assert!(matches!(
            sniff_bytes(b"<!DOCTYPE html><html></html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(sniff_bytes(b""), Err(Error::UnknownFormat)));
        assert!(matches!(sniff_bytes(b"%PDF-"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_sniff_bad_version() {
        assert!(matches!(
            sniff_bytes(b"%PDF-x.y\n"),
            Err(Error::UnsupportedVersion(v)) if v == "x.y"
        ));
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\n"));
        assert!(!is_pdf_bytes(b"Not a PDF"));
    }

    #[test]
    fn test_sniff_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.5\n%rest of file").unwrap();
        let header = sniff_file(file.path()).unwrap();
        assert_eq!(header.version, "1.5");
    }
}
