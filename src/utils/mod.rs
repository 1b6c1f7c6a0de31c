pub mod cover;
pub mod epub_writer;
pub mod pdf_parser;
pub mod source;
pub mod text_loader;

pub use cover::{prepare_cover, CoverImage};
pub use epub_writer::{EpubPackager, Packager};
pub use pdf_parser::PdfSource;
pub use source::{is_supported, source_for, ExtractedText, TextSource};
pub use text_loader::PlainTextSource;
