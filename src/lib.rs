// Library exports for the CLI binaries and integration tests

pub mod book;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod text;
pub mod utils;

// Re-export commonly used types
pub use book::{BookDocument, BookMetadata, Section, SectionKind};
pub use config::ConvertConfig;
pub use error::{ConvertError, Result};
pub use pipeline::{ConversionReport, ConvertRequest, Converter, TextEngine};
