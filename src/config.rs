use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{ConvertError, Result};

const MAX_SUBTITLE_LOOKAHEAD: usize = 16;
const MAX_SUBTITLE_WORDS: usize = 16;

/// Knobs for the heading and subtitle heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// A line of at most this many words right after a heading is kept on its
    /// own line by the merger and absorbed into the title by the segmenter.
    pub subtitle_max_words: usize,
    /// Number of merged lines after a heading searched for a subtitle.
    pub subtitle_lookahead: usize,
    pub front_matter_title: String,
    pub fallback_title: String,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            subtitle_max_words: 2,
            subtitle_lookahead: 2,
            front_matter_title: "Introduction".to_string(),
            fallback_title: "Chapter 1".to_string(),
        }
    }
}

impl HeuristicsConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SUBTITLE_LOOKAHEAD).contains(&self.subtitle_lookahead) {
            return Err(invalid("subtitle_lookahead must be within [1,16]"));
        }
        if self.subtitle_max_words > MAX_SUBTITLE_WORDS {
            return Err(invalid("subtitle_max_words must be within [0,16]"));
        }
        if self.front_matter_title.trim().is_empty() {
            return Err(invalid("front_matter_title must not be empty"));
        }
        if self.fallback_title.trim().is_empty() {
            return Err(invalid("fallback_title must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpubConfig {
    pub language: String,
    /// Deflate level, 0-9.
    pub compression_level: u32,
    /// JPEG quality used when recompressing the cover, 1-100.
    pub cover_quality: u8,
}

impl Default for EpubConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            compression_level: 6,
            cover_quality: 75,
        }
    }
}

impl EpubConfig {
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(invalid("language must not be empty"));
        }
        if self.compression_level > 9 {
            return Err(invalid("compression_level must be within [0,9]"));
        }
        if !(1..=100).contains(&self.cover_quality) {
            return Err(invalid("cover_quality must be within [1,100]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub heuristics: HeuristicsConfig,
    pub epub: EpubConfig,
    pub default_author: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            heuristics: HeuristicsConfig::default(),
            epub: EpubConfig::default(),
            default_author: "Unknown".to_string(),
        }
    }
}

impl ConvertConfig {
    /// Load a JSON configuration file; missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: ConvertConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.heuristics.validate()?;
        self.epub.validate()?;
        if self.default_author.trim().is_empty() {
            return Err(invalid("default_author must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for ConvertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn invalid(message: &str) -> ConvertError {
    ConvertError::InvalidConfig(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConvertConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.heuristics.subtitle_max_words, 2);
        assert_eq!(config.default_author, "Unknown");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ConvertConfig =
            serde_json::from_str(r#"{"epub": {"language": "fr"}}"#).unwrap();
        assert_eq!(config.epub.language, "fr");
        assert_eq!(config.epub.cover_quality, 75);
        assert_eq!(config.heuristics.fallback_title, "Chapter 1");
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = ConvertConfig::default();
        config.epub.compression_level = 12;
        assert!(matches!(
            config.validate(),
            Err(ConvertError::InvalidConfig(_))
        ));

        let mut config = ConvertConfig::default();
        config.heuristics.subtitle_lookahead = 0;
        assert!(config.validate().is_err());

        let mut config = ConvertConfig::default();
        config.epub.cover_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_heuristics() {
        let raw = format!(r#"{{"heuristics": {{"subtitle_lookahead": {}}}}}"#, usize::MAX);
        let config: ConvertConfig = serde_json::from_str(&raw).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConvertError::InvalidConfig(_))
        ));

        let mut config = ConvertConfig::default();
        config.heuristics.subtitle_max_words = 1_000;
        assert!(config.validate().is_err());

        let mut config = ConvertConfig::default();
        config.heuristics.subtitle_lookahead = 16;
        assert!(config.validate().is_ok());
    }
}
