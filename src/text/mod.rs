pub mod heading;
pub mod markup;
pub mod merge;
pub mod paragraph;
pub mod segment;

pub use heading::{HeadingCandidate, HeadingKind, HeadingMatcher};
pub use merge::LineMerger;
pub use paragraph::detect_paragraphs;
pub use segment::{ChapterSegment, ChapterSegmenter, Segmentation};
