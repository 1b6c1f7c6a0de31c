use std::path::Path;
use tracing::info;

use super::pdf_parser::PdfSource;
use super::text_loader::PlainTextSource;
use crate::error::{ConvertError, Result};

/// Raw lines recovered from a source document, in page order.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pub lines: Vec<String>,
    pub page_count: usize,
    /// Cover image bytes, when the source can provide one.
    pub cover: Option<Vec<u8>>,
}

impl ExtractedText {
    /// Split extracted text into lines, treating form feeds as page breaks.
    pub fn from_pages(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut page_count = 0;

        for (page_num, page) in text.split('\x0C').enumerate() {
            page_count += 1;
            if page.trim().is_empty() {
                info!("Page {} has no text", page_num + 1);
                continue;
            }
            lines.extend(page.lines().map(str::to_string));
        }

        Self {
            lines,
            page_count,
            cover: None,
        }
    }

    pub fn has_text(&self) -> bool {
        self.lines.iter().any(|l| !l.trim().is_empty())
    }
}

/// Trait for text extraction collaborators
pub trait TextSource {
    /// Read the document at `path` into raw lines
    fn extract(&self, path: &Path) -> Result<ExtractedText>;

    /// Short name used in log messages
    fn name(&self) -> &'static str;
}

/// Pick a source by file extension.
pub fn source_for(path: &Path) -> Result<Box<dyn TextSource>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "pdf" => Ok(Box::new(PdfSource)),
        "txt" | "text" => Ok(Box::new(PlainTextSource)),
        _ => Err(ConvertError::Extraction {
            path: path.to_path_buf(),
            message: format!("unsupported file format: {:?}", ext),
        }),
    }
}

pub fn is_supported(path: &Path) -> bool {
    source_for(path).is_ok()
}
