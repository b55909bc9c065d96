//! Document text extraction
//!
//! Opens an uploaded PDF from memory and flattens its text into one string:
//! text runs on a page are joined with a single space, pages are joined with
//! a single space in page order, and the result is trimmed.

use lopdf::content::Content;
use lopdf::{Document, Encoding, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Text extracted from one uploaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    text: String,
    page_count: usize,
}

impl DocumentText {
    pub fn new(text: impl Into<String>, page_count: usize) -> Self {
        Self {
            text: text.into(),
            page_count,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// True for documents with no extractable text (scanned or image-only)
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl AsRef<str> for DocumentText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("document is empty")]
    Empty,

    #[error("document could not be opened: {0}")]
    Unreadable(String),

    #[error("document text could not be read: {0}")]
    PageText(String),

    #[error("extraction worker failed: {0}")]
    Worker(String),
}

impl From<lopdf::Error> for ExtractionError {
    fn from(e: lopdf::Error) -> Self {
        ExtractionError::PageText(e.to_string())
    }
}

// TJ adjustments below this (thousandths of an em) are treated as a word gap
const WORD_GAP_ADJUSTMENT: i64 = -100;

pub struct FileUploadAgent;

impl FileUploadAgent {
    /// Extract the full text of a PDF held in memory
    pub fn extract_text(content: &[u8]) -> Result<DocumentText, ExtractionError> {
        if content.is_empty() {
            return Err(ExtractionError::Empty);
        }

        let document = Document::load_mem(content)
            .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;

        // get_pages is keyed by page number, so iteration is already 1..=n
        let pages = document.get_pages();
        let mut page_texts = Vec::with_capacity(pages.len());
        for &page_id in pages.values() {
            let items = Self::page_items(&document, page_id)?;
            debug!(items = items.len(), "Collected page text items");
            page_texts.push(items.join(" "));
        }

        let text = page_texts.join(" ").trim().to_string();
        info!(
            bytes = content.len(),
            pages = page_texts.len(),
            chars = text.chars().count(),
            "Extracted document text"
        );

        Ok(DocumentText::new(text, page_texts.len()))
    }

    /// Every text-showing operation on a page is one item; blank items are dropped
    fn page_items(document: &Document, page_id: ObjectId) -> Result<Vec<String>, ExtractionError> {
        let encodings = document
            .get_page_fonts(page_id)?
            .into_iter()
            .map(|(name, font)| font.get_font_encoding(document).map(|encoding| (name, encoding)))
            .collect::<Result<BTreeMap<Vec<u8>, Encoding>, _>>()?;
        let content = Content::decode(&document.get_page_content(page_id)?)?;

        let mut items = Vec::new();
        let mut current = None;
        for operation in &content.operations {
            match operation.operator.as_str() {
                "Tf" => {
                    current = operation
                        .operands
                        .first()
                        .and_then(|name| name.as_name().ok())
                        .and_then(|name| encodings.get(name));
                }
                "Tj" | "TJ" | "'" | "\"" => {
                    let Some(encoding) = current else {
                        warn!(operator = %operation.operator, "Text shown without a known font");
                        continue;
                    };
                    let mut item = String::new();
                    Self::collect_text(&mut item, encoding, &operation.operands)?;
                    let item = item.trim();
                    if !item.is_empty() {
                        items.push(item.to_string());
                    }
                }
                _ => {}
            }
        }
        Ok(items)
    }

    fn collect_text(out: &mut String, encoding: &Encoding, operands: &[Object]) -> Result<(), ExtractionError> {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => out.push_str(&Document::decode_text(encoding, bytes)?),
                Object::Array(parts) => Self::collect_text(out, encoding, parts)?,
                Object::Integer(adjustment) if *adjustment < WORD_GAP_ADJUSTMENT => out.push(' '),
                Object::Real(adjustment) if (*adjustment as i64) < WORD_GAP_ADJUSTMENT => out.push(' '),
                _ => {}
            }
        }
        Ok(())
    }

    /// Check the declared content type / filename before decoding
    pub fn looks_like_pdf(filename: Option<&str>, content_type: Option<&str>) -> bool {
        let by_type = content_type
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .map(|m| m.essence_str() == mime::APPLICATION_PDF.essence_str())
            .unwrap_or(false);
        let by_name = filename
            .map(|name| name.to_ascii_lowercase().ends_with(".pdf"))
            .unwrap_or(false);
        by_type || by_name
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build an in-memory PDF from raw content operations, one list per page
    pub(crate) fn pdf_from_operations(pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Build an in-memory PDF whose pages each hold one text object with the
    /// given runs positioned on separate lines
    pub(crate) fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
        let pages = pages
            .iter()
            .map(|runs| {
                let mut operations = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                ];
                for run in runs.iter() {
                    operations.push(Operation::new("Tj", vec![Object::string_literal(*run)]));
                    operations.push(Operation::new("Td", vec![0.into(), (-20).into()]));
                }
                operations.push(Operation::new("ET", vec![]));
                operations
            })
            .collect();
        pdf_from_operations(pages)
    }

    #[test]
    fn test_single_page() {
        let pdf = pdf_with_pages(&[&["The sky is blue."]]);
        let text = FileUploadAgent::extract_text(&pdf).unwrap();
        assert_eq!(text.as_str(), "The sky is blue.");
        assert_eq!(text.page_count(), 1);
    }

    #[test]
    fn test_pages_joined_in_order() {
        let pdf = pdf_with_pages(&[&["First page"], &["Second page"], &["Third page"]]);
        let text = FileUploadAgent::extract_text(&pdf).unwrap();
        assert_eq!(text.as_str(), "First page Second page Third page");
        assert_eq!(text.page_count(), 3);
    }

    #[test]
    fn test_items_on_a_page_joined_with_space() {
        let pdf = pdf_with_pages(&[&["Alpha", "Beta"], &["Gamma"]]);
        let text = FileUploadAgent::extract_text(&pdf).unwrap();
        assert_eq!(text.as_str(), "Alpha Beta Gamma");
    }

    #[test]
    fn test_empty_buffer_fails() {
        let err = FileUploadAgent::extract_text(&[]).unwrap_err();
        assert!(matches!(err, ExtractionError::Empty));
    }

    #[test]
    fn test_corrupt_buffer_fails() {
        let err = FileUploadAgent::extract_text(b"this is definitely not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Unreadable(_)));
    }

    #[test]
    fn test_runs_in_one_text_object_are_separate_items() {
        let pdf = pdf_with_pages(&[&["Hello", "World"]]);
        let text = FileUploadAgent::extract_text(&pdf).unwrap();
        assert_eq!(text.as_str(), "Hello World");
    }

    #[test]
    fn test_show_text_operators() {
        let pdf = pdf_from_operations(vec![vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Ker"),
                    (-20).into(),
                    Object::string_literal("ned"),
                    (-250).into(),
                    Object::string_literal("words"),
                ])],
            ),
            Operation::new("'", vec![Object::string_literal("next line")]),
            Operation::new(
                "\"",
                vec![1.into(), 1.into(), Object::string_literal("spaced line")],
            ),
            Operation::new("Tj", vec![Object::string_literal("   ")]),
            Operation::new("ET", vec![]),
        ]]);
        let text = FileUploadAgent::extract_text(&pdf).unwrap();
        assert_eq!(text.as_str(), "Kerned words next line spaced line");
    }

    #[test]
    fn test_text_before_font_selection_is_skipped() {
        let pdf = pdf_from_operations(vec![vec![
            Operation::new("BT", vec![]),
            Operation::new("Tj", vec![Object::string_literal("orphan")]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Tj", vec![Object::string_literal("kept")]),
            Operation::new("ET", vec![]),
        ]]);
        let text = FileUploadAgent::extract_text(&pdf).unwrap();
        assert_eq!(text.as_str(), "kept");
    }

    #[test]
    fn test_page_without_text_yields_empty_document() {
        let pdf = pdf_with_pages(&[&[]]);
        let text = FileUploadAgent::extract_text(&pdf).unwrap();
        assert!(text.is_empty());
        assert_eq!(text.page_count(), 1);
    }

    #[test]
    fn test_looks_like_pdf() {
        assert!(FileUploadAgent::looks_like_pdf(None, Some("application/pdf")));
        assert!(FileUploadAgent::looks_like_pdf(Some("Report.PDF"), None));
        assert!(FileUploadAgent::looks_like_pdf(
            Some("blob"),
            Some("application/pdf; charset=binary")
        ));
        assert!(!FileUploadAgent::looks_like_pdf(Some("notes.txt"), Some("text/plain")));
        assert!(!FileUploadAgent::looks_like_pdf(None, None));
    }
}
