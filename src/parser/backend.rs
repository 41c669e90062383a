//! Collaborator traits and the lopdf-backed document handle.
//!
//! The page compositor only sees [`TextExtractor`] and [`TableExtractor`];
//! [`PdfDocument`] is one implementation of both, isolating lopdf from the
//! Markdown logic. Page numbers are 1-based at every trait boundary.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::{TableRegion, TextBlock};

use super::layout::{blocks_to_html, decode_text_simple, extract_spans, LayoutAnalyzer, TextSpan};
use super::options::ParseOptions;
use super::table_detector::TableDetector;

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// A document made of numbered pages.
pub trait PageSource {
    /// Number of pages.
    fn page_count(&self) -> u32;
}

/// Text-extraction collaborator.
pub trait TextExtractor: PageSource {
    /// Paragraph blocks of a page, in discovery order.
    fn text_blocks(&self, page: u32) -> Result<Vec<TextBlock>>;

    /// HTML rendering of a page's text.
    fn page_html(&self, page: u32) -> Result<String>;
}

/// Table-extraction collaborator.
pub trait TableExtractor: PageSource {
    /// Detected tables of a page, in detection order.
    fn find_tables(&self, page: u32) -> Result<Vec<TableRegion>>;

    /// Text blocks and tables of a page together.
    ///
    /// The default asks both collaborators in turn. Implementations that
    /// derive both from one pass over the page override it.
    fn page_items(&self, page: u32) -> Result<(Vec<TextBlock>, Vec<TableRegion>)>
    where
        Self: TextExtractor,
    {
        Ok((self.text_blocks(page)?, self.find_tables(page)?))
    }
}

/// Page geometry from the MediaBox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
    /// Top edge in PDF user space
    pub top: f32,
}

/// An open PDF document.
///
/// The underlying lopdf document is released when this value is dropped.
pub struct PdfDocument {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
    options: ParseOptions,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("version", &self.doc.version)
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl PdfDocument {
    /// Open a PDF file with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        crate::detect::sniff_file(path)?;
        log::debug!("opening {}", path.display());
        let doc = LopdfDocument::load(path).map_err(Error::from)?;
        Self::from_lopdf(doc, options)
    }

    /// Load a PDF from bytes with default options.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Load a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        crate::detect::sniff_bytes(data)?;
        let doc = LopdfDocument::load_mem(data).map_err(Error::from)?;
        Self::from_lopdf(doc, options)
    }

    /// Load a PDF from a reader with default options.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Load a PDF from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Wrap an already loaded lopdf document.
    pub fn from_lopdf(doc: LopdfDocument, options: ParseOptions) -> Result<Self> {
        if doc.is_encrypted() {
            log::warn!("document is encrypted; text may not decode");
        }
        let pages = doc.get_pages();
        log::debug!("loaded PDF {} with {} pages", doc.version, pages.len());
        Ok(Self {
            doc,
            pages,
            options,
        })
    }

    /// Replace the parse options.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Current parse options.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// PDF version string, e.g. "1.7".
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.pages.len() as u32))
    }

    /// Page dimensions, following MediaBox inheritance up the page tree.
    pub fn page_size(&self, page: u32) -> Result<PageSize> {
        let page_id = self.page_id(page)?;
        let [x0, y0, x1, y1] = self.media_box(page_id).unwrap_or(DEFAULT_MEDIA_BOX);
        Ok(PageSize {
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
            top: y0.max(y1),
        })
    }

    fn media_box(&self, page_id: ObjectId) -> Option<[f32; 4]> {
        let mut dict = self.doc.get_dictionary(page_id).ok()?;

        // Bounded walk; malformed trees may loop
        for _ in 0..32 {
            if let Some(rect) = dict.get(b"MediaBox").ok().and_then(|o| self.rect(o)) {
                return Some(rect);
            }
            dict = self.parent(dict)?;
        }
        None
    }

    fn parent(&self, dict: &Dictionary) -> Option<&Dictionary> {
        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        self.doc.get_dictionary(parent_id).ok()
    }

    fn rect(&self, obj: &Object) -> Option<[f32; 4]> {
        let obj = match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok()?,
            other => other,
        };
        let array = obj.as_array().ok()?;
        if array.len() < 4 {
            return None;
        }
        let mut rect = [0.0; 4];
        for (slot, value) in rect.iter_mut().zip(array) {
            *slot = value.as_float().ok()?;
        }
        Some(rect)
    }

    /// Decompressed content stream of a page, concatenated when split.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken
            Err(_) => return Ok(Vec::new()),
        };

        let stream_data = |id: ObjectId| -> Result<Vec<u8>> {
            match self.doc.get_object(id)? {
                Object::Stream(stream) => stream_bytes(id, stream),
                _ => Err(Error::Corrupted(format!("content {:?} is not a stream", id))),
            }
        };

        match contents {
            Object::Reference(id) => match self.doc.get_object(*id)? {
                Object::Array(parts) => self.concat_streams(parts, stream_data),
                _ => stream_data(*id),
            },
            Object::Array(parts) => self.concat_streams(parts, stream_data),
            _ => Err(Error::Corrupted("invalid /Contents entry".to_string())),
        }
    }

    fn concat_streams<F>(&self, parts: &[Object], stream_data: F) -> Result<Vec<u8>>
    where
        F: Fn(ObjectId) -> Result<Vec<u8>>,
    {
        let mut content = Vec::new();
        for part in parts {
            if let Object::Reference(id) = part {
                content.extend_from_slice(&stream_data(*id)?);
                content.push(b' ');
            }
        }
        Ok(content)
    }

    /// Positioned text spans of a page, top-left origin.
    pub fn page_spans(&self, page: u32) -> Result<Vec<TextSpan>> {
        let page_id = self.page_id(page)?;
        let size = self.page_size(page)?;
        let data = self.page_content(page_id)?;
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let content = lopdf::content::Content::decode(&data)
            .map_err(|e| Error::TextExtract(format!("content stream: {}", e)))?;

        let fonts = self.doc.get_page_fonts(page_id).unwrap_or_default();
        let decode = |font: &[u8], bytes: &[u8]| -> String {
            fonts
                .get(font)
                .and_then(|dict| dict.get_font_encoding(&self.doc).ok())
                .and_then(|encoding| LopdfDocument::decode_text(&encoding, bytes).ok())
                .unwrap_or_else(|| decode_text_simple(bytes))
        };

        let spans = extract_spans(&content.operations, size.top, decode);
        log::trace!("page {}: {} spans", page, spans.len());
        Ok(spans)
    }
}

/// Decoded bytes of a content stream.
///
/// lopdf's own Flate decoder drops inflate errors, so Flate is inflated
/// here and a stream that does not decode is an error rather than a blank page.
fn stream_bytes(id: ObjectId, stream: &Stream) -> Result<Vec<u8>> {
    let filters: Vec<&[u8]> = match stream.dict.get(b"Filter") {
        // Unfiltered streams are stored as-is
        Err(_) => return Ok(stream.content.clone()),
        Ok(Object::Name(name)) => vec![name.as_slice()],
        Ok(Object::Array(names)) => names.iter().filter_map(|n| n.as_name().ok()).collect(),
        Ok(_) => {
            return Err(Error::Corrupted(format!(
                "content {:?} has an invalid /Filter",
                id
            )))
        }
    };
    let corrupt =
        |reason: String| Error::Corrupted(format!("content {:?} does not decode: {}", id, reason));

    if filters.first().copied() == Some(b"FlateDecode".as_slice()) {
        let mut inflated = Vec::new();
        ZlibDecoder::new(stream.content.as_slice())
            .read_to_end(&mut inflated)
            .map_err(|e| corrupt(e.to_string()))?;
        if filters.len() == 1 && stream.dict.get(b"DecodeParms").is_err() {
            return Ok(inflated);
        }
    }

    stream
        .decompressed_content()
        .map_err(|e| corrupt(e.to_string()))
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }
}

impl PdfDocument {
    fn analyze(&self, spans: Vec<TextSpan>) -> Vec<TextBlock> {
        LayoutAnalyzer::new(self.options.layout.clone()).blocks(spans)
    }

    fn detect_tables(&self, spans: &[TextSpan]) -> Vec<TableRegion> {
        if !self.options.detect_tables {
            return Vec::new();
        }
        TableDetector::with_config(self.options.table_config.clone()).detect(spans)
    }
}

impl TextExtractor for PdfDocument {
    fn text_blocks(&self, page: u32) -> Result<Vec<TextBlock>> {
        Ok(self.analyze(self.page_spans(page)?))
    }

    fn page_html(&self, page: u32) -> Result<String> {
        let size = self.page_size(page)?;
        let blocks = self.text_blocks(page)?;
        Ok(blocks_to_html(page, size.width, size.height, &blocks))
    }
}

impl TableExtractor for PdfDocument {
    fn find_tables(&self, page: u32) -> Result<Vec<TableRegion>> {
        if !self.options.detect_tables {
            return Ok(Vec::new());
        }
        Ok(self.detect_tables(&self.page_spans(page)?))
    }

    // One content-stream pass feeds both the layout analyzer and the detector
    fn page_items(&self, page: u32) -> Result<(Vec<TextBlock>, Vec<TableRegion>)> {
        let spans = self.page_spans(page)?;
        let tables = self.detect_tables(&spans);
        Ok((self.analyze(spans), tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    /// One page, with the MediaBox on the page tree root.
    fn build_pdf(operations: Vec<Operation>) -> Vec<u8> {
        let content = Content { operations };
        build_pdf_with_stream(Stream::new(dictionary! {}, content.encode().unwrap()))
    }

    fn build_pdf_with_stream(contents: Stream) -> Vec<u8> {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content_id = doc.add_object(contents);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 400.into(), 500.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn text_op(size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    #[test]
    fn test_inherited_media_box() {
        let bytes = build_pdf(text_op(12, 50, 400, "Hello"));
        let doc = PdfDocument::from_bytes(&bytes).unwrap();

        assert_eq!(doc.page_count(), 1);
        let size = doc.page_size(1).unwrap();
        assert_eq!(size.width, 400.0);
        assert_eq!(size.height, 500.0);
    }

    #[test]
    fn test_page_spans_top_left_origin() {
        let bytes = build_pdf(text_op(12, 50, 400, "Hello"));
        let doc = PdfDocument::from_bytes(&bytes).unwrap();

        let spans = doc.page_spans(1).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Hello");
        assert_eq!(spans[0].baseline, 100.0);
    }

    #[test]
    fn test_text_blocks_and_html() {
        let bytes = build_pdf(text_op(18, 50, 400, "Heading & more"));
        let doc = PdfDocument::from_bytes(&bytes).unwrap();

        let blocks = doc.text_blocks(1).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines[0].runs[0].font_size, 18.0);

        let html = doc.page_html(1).unwrap();
        assert!(html.contains("id=\"page1\""));
        assert!(html.contains("Heading &amp; more"));
    }

    #[test]
    fn test_page_out_of_range() {
        let bytes = build_pdf(text_op(12, 50, 400, "Hello"));
        let doc = PdfDocument::from_bytes(&bytes).unwrap();

        assert!(matches!(doc.text_blocks(5), Err(Error::PageOutOfRange(5, 1))));
    }

    #[test]
    fn test_tables_disabled() {
        let mut ops = Vec::new();
        for (row, y) in [700, 685, 670].iter().enumerate() {
            ops.extend(text_op(10, 50, *y - 300, &format!("r{}", row)));
            ops.extend(text_op(10, 200, *y - 300, &format!("v{}", row)));
        }
        let bytes = build_pdf(ops);

        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.find_tables(1).unwrap().len(), 1);

        let doc = doc.with_options(ParseOptions::new().without_tables());
        assert!(doc.find_tables(1).unwrap().is_empty());
    }

    #[test]
    fn test_flate_content_stream() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"BT /F1 12 Tf 50 400 Td (Packed) Tj ET").unwrap();
        let stream = Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            encoder.finish().unwrap(),
        );
        let doc = PdfDocument::from_bytes(&build_pdf_with_stream(stream)).unwrap();

        let spans = doc.page_spans(1).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Packed");
    }

    #[test]
    fn test_corrupt_flate_stream_is_error() {
        let stream = Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            b"\x78\x9c\xde\xad\xbe\xef garbage not zlib".to_vec(),
        );
        let doc = PdfDocument::from_bytes(&build_pdf_with_stream(stream)).unwrap();

        assert!(matches!(doc.text_blocks(1), Err(Error::Corrupted(_))));
        assert!(crate::convert(&doc, &crate::RenderOptions::default()).is_err());
    }

    #[test]
    fn test_mislabelled_plain_stream_is_error() {
        let stream = Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            b"BT /F1 12 Tf 50 400 Td (Leak) Tj ET".to_vec(),
        );
        let doc = PdfDocument::from_bytes(&build_pdf_with_stream(stream)).unwrap();

        assert!(doc.text_blocks(1).is_err());
    }

    #[test]
    fn test_page_items_match_separate_calls() {
        let mut ops = text_op(16, 50, 450, "Summary");
        for (row, y) in [400, 385, 370].iter().enumerate() {
            ops.extend(text_op(10, 50, *y, &format!("r{}", row)));
            ops.extend(text_op(10, 200, *y, &format!("v{}", row)));
        }
        let doc = PdfDocument::from_bytes(&build_pdf(ops)).unwrap();

        let (blocks, tables) = doc.page_items(1).unwrap();
        assert_eq!(blocks, doc.text_blocks(1).unwrap());
        assert_eq!(tables, doc.find_tables(1).unwrap());
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn test_not_a_pdf() {
        assert!(PdfDocument::from_bytes(b"plain text").is_err());
    }
}
