mod assemble;

pub use assemble::DocumentAssembler;

use serde::Serialize;
use std::path::Path;

use crate::config::ConvertConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    /// Text that preceded the first accepted heading.
    FrontMatter,
    Chapter,
}

/// One reading-order unit with its rendered XHTML body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub kind: SectionKind,
    pub body_markup: String,
}

/// The ordered sections handed to the packager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookDocument {
    pub sections: Vec<Section>,
}

impl BookDocument {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.title.as_str())
    }

    pub fn has_front_matter(&self) -> bool {
        self.sections
            .first()
            .is_some_and(|s| s.kind == SectionKind::FrontMatter)
    }
}

/// Book-level metadata for the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub language: String,
}

impl BookMetadata {
    /// Fill blanks with defaults: the title falls back to the source file
    /// stem and the author to the configured default.
    pub fn resolve(
        source: &Path,
        title: Option<&str>,
        author: Option<&str>,
        config: &ConvertConfig,
    ) -> Self {
        let title = non_blank(title).unwrap_or_else(|| {
            source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Untitled".to_string())
        });
        let author = non_blank(author).unwrap_or_else(|| config.default_author.clone());

        Self {
            title,
            author,
            language: config.epub.language.clone(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_defaults() {
        let config = ConvertConfig::default();
        let meta = BookMetadata::resolve(Path::new("/books/Moby Dick.pdf"), None, Some("  "), &config);
        assert_eq!(meta.title, "Moby Dick");
        assert_eq!(meta.author, "Unknown");
        assert_eq!(meta.language, "en");
    }

    #[test]
    fn test_metadata_overrides() {
        let config = ConvertConfig::default();
        let meta = BookMetadata::resolve(
            Path::new("scan_0042.pdf"),
            Some(" Moby-Dick "),
            Some("Herman Melville"),
            &config,
        );
        assert_eq!(meta.title, "Moby-Dick");
        assert_eq!(meta.author, "Herman Melville");
    }
}
