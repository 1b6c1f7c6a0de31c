//! End-to-end conversion: extractor, text engine, packager.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::book::{BookDocument, BookMetadata, DocumentAssembler};
use crate::config::{ConvertConfig, HeuristicsConfig};
use crate::error::{ConvertError, Result};
use crate::text::{ChapterSegmenter, HeadingMatcher, LineMerger, Segmentation};
use crate::utils::{is_supported, source_for, EpubPackager, ExtractedText, Packager};

/// The pure text engine: raw lines in, assembled book out.
pub struct TextEngine {
    matcher: HeadingMatcher,
    heuristics: HeuristicsConfig,
}

impl TextEngine {
    pub fn new(heuristics: HeuristicsConfig) -> Self {
        Self {
            matcher: HeadingMatcher::new(),
            heuristics,
        }
    }

    pub fn heuristics(&self) -> &HeuristicsConfig {
        &self.heuristics
    }

    pub fn merge<S: AsRef<str>>(&self, lines: &[S]) -> String {
        LineMerger::new(&self.matcher, &self.heuristics).merge(lines)
    }

    pub fn segment(&self, merged: &str) -> Segmentation {
        ChapterSegmenter::new(&self.matcher, &self.heuristics).segment(merged)
    }

    /// Merge, segment and assemble in one pass.
    pub fn reconstruct<S: AsRef<str>>(&self, lines: &[S]) -> BookDocument {
        let merged = self.merge(lines);
        let segmentation = self.segment(&merged);
        DocumentAssembler::new(&self.heuristics)
            .assemble(&segmentation.front_matter, &segmentation.sections)
    }
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new(HeuristicsConfig::default())
    }
}

/// One document to convert.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub title: Option<String>,
    pub author: Option<String>,
    /// Cover image file; overrides any cover the source provides.
    pub cover: Option<PathBuf>,
    /// Also write the assembled document as pretty JSON here.
    pub json_dump: Option<PathBuf>,
}

impl ConvertRequest {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub title: String,
    pub author: String,
    pub page_count: usize,
    pub line_count: usize,
    pub sections: Vec<String>,
    pub has_front_matter: bool,
    pub has_cover: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub source: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub converted: Vec<ConversionReport>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }
}

pub struct Converter<P: Packager = EpubPackager> {
    config: ConvertConfig,
    engine: TextEngine,
    packager: P,
}

impl Converter<EpubPackager> {
    pub fn new(config: ConvertConfig) -> Result<Self> {
        let packager = EpubPackager::new(config.epub.clone());
        Self::with_packager(config, packager)
    }
}

impl<P: Packager> Converter<P> {
    pub fn with_packager(config: ConvertConfig, packager: P) -> Result<Self> {
        config.validate()?;
        let engine = TextEngine::new(config.heuristics.clone());
        Ok(Self {
            config,
            engine,
            packager,
        })
    }

    pub fn engine(&self) -> &TextEngine {
        &self.engine
    }

    pub fn packager(&self) -> &P {
        &self.packager
    }

    /// Read raw lines from a source document.
    pub fn extract(&self, source: &Path) -> Result<ExtractedText> {
        let extractor = source_for(source)?;
        info!("Reading {:?} with the {} extractor", source, extractor.name());
        extractor.extract(source)
    }

    pub fn convert(&self, request: &ConvertRequest) -> Result<ConversionReport> {
        let extracted = self.extract(&request.source)?;

        let cover = match &request.cover {
            Some(path) => Some(fs::read(path).map_err(|e| ConvertError::Extraction {
                path: path.clone(),
                message: format!("cannot read cover image: {}", e),
            })?),
            None => extracted.cover.clone(),
        };

        let document = self.engine.reconstruct(&extracted.lines);
        let metadata = BookMetadata::resolve(
            &request.source,
            request.title.as_deref(),
            request.author.as_deref(),
            &self.config,
        );
        info!(
            "Assembled '{}' by {}: {} sections",
            metadata.title,
            metadata.author,
            document.len()
        );

        if let Some(path) = &request.json_dump {
            fs::write(path, serde_json::to_string_pretty(&document)?)?;
            info!("Document JSON written to: {:?}", path);
        }

        self.packager
            .package(&document, &metadata, cover.as_deref(), &request.destination)?;

        Ok(ConversionReport {
            source: request.source.clone(),
            destination: request.destination.clone(),
            title: metadata.title,
            author: metadata.author,
            page_count: extracted.page_count,
            line_count: extracted.lines.len(),
            sections: document.titles().map(str::to_string).collect(),
            has_front_matter: document.has_front_matter(),
            has_cover: cover.is_some(),
        })
    }

    /// Convert every supported document under `input` into `output`,
    /// mirroring the directory layout. Per-file failures are recorded, not fatal.
    pub fn convert_directory(
        &self,
        input: &Path,
        output: &Path,
        author: Option<&str>,
    ) -> Result<BatchReport> {
        fs::create_dir_all(output).map_err(|source| ConvertError::Packaging {
            path: output.to_path_buf(),
            source,
        })?;

        let sources = find_sources(input);
        info!("Found {} source files", sources.len());

        let mut report = BatchReport::default();
        for (idx, source) in sources.iter().enumerate() {
            info!("Processing {}/{}: {:?}", idx + 1, sources.len(), source);

            let mut request = ConvertRequest::new(source, batch_destination(input, source, output));
            request.author = author.map(str::to_string);

            match self.convert(&request) {
                Ok(converted) => report.converted.push(converted),
                Err(e) => {
                    warn!("Failed to process {:?}: {}", source, e);
                    report.failed.push(BatchFailure {
                        source: source.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Batch complete: {} converted, {} failed",
            report.converted.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

/// Supported documents under `dir`, in path order.
pub fn find_sources(dir: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_supported(p))
        .collect();
    sources.sort();
    sources
}

/// `<source stem>.epub`, next to the source unless `output_dir` is given.
pub fn default_destination(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    let file_name = Path::new(source.file_name().unwrap_or_default()).with_extension("epub");
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => source.with_file_name(file_name),
    }
}

fn batch_destination(input: &Path, source: &Path, output: &Path) -> PathBuf {
    let relative = source
        .strip_prefix(input)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| PathBuf::from(source.file_name().unwrap_or_default()));
    output.join(relative).with_extension("epub")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::SectionKind;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingPackager {
        calls: RefCell<Vec<(BookMetadata, Vec<String>, Option<usize>, PathBuf)>>,
    }

    impl Packager for RecordingPackager {
        fn package(
            &self,
            document: &BookDocument,
            metadata: &BookMetadata,
            cover: Option<&[u8]>,
            destination: &Path,
        ) -> Result<()> {
            self.calls.borrow_mut().push((
                metadata.clone(),
                document.titles().map(str::to_string).collect(),
                cover.map(<[u8]>::len),
                destination.to_path_buf(),
            ));
            Ok(())
        }
    }

    fn recording_converter() -> Converter<RecordingPackager> {
        Converter::with_packager(ConvertConfig::default(), RecordingPackager::default()).unwrap()
    }

    const BOOK: &str = "My Little Book\n\nChapter 1\n\nThe morning was\ncold and grey.\n\nChapter 2\n\nNight fell over\nthe quiet town.\n";

    #[test]
    fn test_engine_reconstructs_document() {
        let lines: Vec<&str> = BOOK.lines().collect();
        let doc = TextEngine::default().reconstruct(&lines);

        assert_eq!(
            doc.titles().collect::<Vec<_>>(),
            vec!["Introduction", "Chapter 1", "Chapter 2"]
        );
        assert_eq!(doc.sections[0].kind, SectionKind::FrontMatter);
        assert!(doc.sections[1]
            .body_markup
            .contains("<p>The morning was cold and grey.</p>"));
    }

    #[test]
    fn test_convert_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("little.txt");
        fs::write(&source, BOOK).unwrap();
        let json = dir.path().join("little.json");

        let converter = recording_converter();
        let mut request = ConvertRequest::new(&source, dir.path().join("little.epub"));
        request.json_dump = Some(json.clone());
        let report = converter.convert(&request).unwrap();

        assert_eq!(report.title, "little");
        assert_eq!(report.author, "Unknown");
        assert_eq!(report.sections.len(), 3);
        assert!(report.has_front_matter);
        assert!(!report.has_cover);

        let calls = converter.packager().calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, report.sections);

        let dumped: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(dumped["sections"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_extraction_failure_never_reaches_packager() {
        let converter = recording_converter();
        let request = ConvertRequest::new("/nonexistent/book.txt", "/tmp/never.epub");

        assert!(matches!(
            converter.convert(&request),
            Err(ConvertError::Extraction { .. })
        ));
        assert!(converter.packager().calls.borrow().is_empty());
    }

    #[test]
    fn test_cover_file_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.txt");
        fs::write(&source, BOOK).unwrap();
        let cover = dir.path().join("cover.bin");
        fs::write(&cover, [1u8, 2, 3, 4]).unwrap();

        let converter = recording_converter();
        let mut request = ConvertRequest::new(&source, dir.path().join("book.epub"));
        request.cover = Some(cover);
        request.title = Some("Given Title".to_string());
        let report = converter.convert(&request).unwrap();

        assert!(report.has_cover);
        let calls = converter.packager().calls.borrow();
        assert_eq!(calls[0].0.title, "Given Title");
        assert_eq!(calls[0].2, Some(4));
    }

    #[test]
    fn test_convert_directory_counts_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::create_dir_all(input.path().join("nested")).unwrap();
        fs::write(input.path().join("a.txt"), BOOK).unwrap();
        fs::write(input.path().join("nested/b.txt"), BOOK).unwrap();
        fs::write(input.path().join("blank.txt"), "\n\n").unwrap();
        fs::write(input.path().join("notes.md"), "ignored").unwrap();

        let converter = recording_converter();
        let report = converter
            .convert_directory(input.path(), output.path(), Some("Batch Author"))
            .unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.converted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.converted.iter().all(|r| r.author == "Batch Author"));
        assert!(report
            .converted
            .iter()
            .any(|r| r.destination == output.path().join("nested/b.epub")));
    }

    #[test]
    fn test_default_destination() {
        assert_eq!(
            default_destination(Path::new("/books/novel.pdf"), None),
            PathBuf::from("/books/novel.epub")
        );
        assert_eq!(
            default_destination(Path::new("/books/novel.pdf"), Some(Path::new("/out"))),
            PathBuf::from("/out/novel.epub")
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ConvertConfig::default();
        config.epub.compression_level = 42;
        assert!(matches!(
            Converter::new(config),
            Err(ConvertError::InvalidConfig(_))
        ));
    }
}
