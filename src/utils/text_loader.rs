use std::fs;
use std::path::Path;
use tracing::info;

use super::source::{ExtractedText, TextSource};
use crate::error::{ConvertError, Result};

/// Already-extracted text, one physical line per line, form feeds between pages.
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn extract(&self, path: &Path) -> Result<ExtractedText> {
        let bytes = fs::read(path).map_err(|e| ConvertError::Extraction {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let text = String::from_utf8_lossy(&bytes);

        info!("Loaded text file: {:?} ({} characters)", path, text.len());

        let content = ExtractedText::from_pages(&text);
        if !content.has_text() {
            return Err(ConvertError::EmptyDocument(path.to_path_buf()));
        }

        Ok(content)
    }

    fn name(&self) -> &'static str {
        "text"
    }
}
