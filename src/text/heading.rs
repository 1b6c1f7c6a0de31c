//! Chapter and named-section heading recognition.
//!
//! Both patterns are compiled once in [`HeadingMatcher::new`] and the matcher
//! is then shared by the merger and the segmenter for a whole document.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::HashMap;

const UNITS: [&str; 9] = [
    "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE",
];
const TEENS: [&str; 10] = [
    "TEN", "ELEVEN", "TWELVE", "THIRTEEN", "FOURTEEN", "FIFTEEN", "SIXTEEN", "SEVENTEEN",
    "EIGHTEEN", "NINETEEN",
];
const TENS: [&str; 8] = [
    "TWENTY", "THIRTY", "FORTY", "FIFTY", "SIXTY", "SEVENTY", "EIGHTY", "NINETY",
];

pub const NAMED_SECTIONS: [&str; 7] = [
    "PROLOGUE",
    "EPILOGUE",
    "PREFACE",
    "FOREWORD",
    "INTRODUCTION",
    "AFTERWORD",
    "POSTSCRIPT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeadingKind {
    Numbered,
    Roman,
    Textual,
    NamedSection,
}

/// A line recognized as a possible chapter or section start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingCandidate {
    pub text: String,
    /// Set for numbered, Roman and spelled-out headings only.
    pub ordinal: Option<u32>,
    pub kind: HeadingKind,
}

impl HeadingCandidate {
    pub fn is_named_section(&self) -> bool {
        self.kind == HeadingKind::NamedSection
    }
}

pub struct HeadingMatcher {
    chapter: Regex,
    named: Regex,
    textual_values: HashMap<String, u32>,
}

impl HeadingMatcher {
    pub fn new() -> Self {
        let mut textual = textual_numbers();
        let textual_values: HashMap<String, u32> = textual.iter().cloned().collect();

        // Longest alternatives first so "TWENTY ONE" is never read as "TWENTY" plus a title.
        textual.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        let textual_union = textual
            .iter()
            .map(|(words, _)| regex::escape(words))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = format!(
            r"^(?:chapter\s+(?:(?P<cdigits>[0-9]{{1,3}})|(?P<croman>[IVXLCDM]+)|(?P<cword>{textual_union}))(?:[:\-\s]+.+)?|(?P<roman>[IVXLCDM]+)|(?P<digits>[0-9]{{1,3}}))$"
        );
        let chapter = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(64 * (1 << 20))
            .build()
            .expect("chapter heading pattern is valid");

        let named = RegexBuilder::new(&format!(r"^(?:{})$", NAMED_SECTIONS.join("|")))
            .case_insensitive(true)
            .build()
            .expect("named section pattern is valid");

        Self {
            chapter,
            named,
            textual_values,
        }
    }

    /// Classify a clean (tag-stripped, trimmed) line.
    pub fn classify(&self, clean_line: &str) -> Option<HeadingCandidate> {
        if let Some(caps) = self.chapter.captures(clean_line) {
            let (kind, ordinal) = if let Some(m) = caps.name("cdigits").or(caps.name("digits")) {
                (HeadingKind::Numbered, m.as_str().parse().ok())
            } else if let Some(m) = caps.name("croman").or(caps.name("roman")) {
                (HeadingKind::Roman, Some(roman_to_int(m.as_str())))
            } else {
                let words = caps.name("cword").map(|m| m.as_str().to_uppercase());
                let value = words.and_then(|w| self.textual_values.get(&w).copied());
                (HeadingKind::Textual, value)
            };

            return Some(HeadingCandidate {
                text: clean_line.to_string(),
                ordinal,
                kind,
            });
        }

        if self.named.is_match(clean_line) {
            return Some(HeadingCandidate {
                text: clean_line.to_string(),
                ordinal: None,
                kind: HeadingKind::NamedSection,
            });
        }

        None
    }

    pub fn is_chapter(&self, clean_line: &str) -> bool {
        self.chapter.is_match(clean_line)
    }

    pub fn is_named_section(&self, clean_line: &str) -> bool {
        self.named.is_match(clean_line)
    }

    pub fn is_heading(&self, clean_line: &str) -> bool {
        self.is_chapter(clean_line) || self.is_named_section(clean_line)
    }
}

impl Default for HeadingMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of a Roman numeral: scan right to left, subtracting any symbol
/// smaller than the largest seen so far.
pub fn roman_to_int(roman: &str) -> u32 {
    let mut value: u32 = 0;
    let mut max_seen: u32 = 0;

    for ch in roman.chars().rev() {
        let current = match ch.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => 0,
        };
        if current < max_seen {
            value = value.saturating_sub(current);
        } else {
            value = value.saturating_add(current);
            max_seen = current;
        }
    }

    value
}

/// Spelled-out cardinals from ONE to ONE THOUSAND with their values.
///
/// Compounds below one hundred appear both hyphenated and space separated;
/// hundreds continue with "AND" ("ONE HUNDRED AND FIVE").
pub fn textual_numbers() -> Vec<(String, u32)> {
    let mut below_hundred: Vec<(String, u32)> = Vec::new();

    for (i, unit) in UNITS.iter().enumerate() {
        below_hundred.push((unit.to_string(), i as u32 + 1));
    }
    for (i, teen) in TEENS.iter().enumerate() {
        below_hundred.push((teen.to_string(), i as u32 + 10));
    }
    for (i, ten) in TENS.iter().enumerate() {
        let tens_value = (i as u32 + 2) * 10;
        below_hundred.push((ten.to_string(), tens_value));
        for (j, unit) in UNITS.iter().enumerate() {
            let value = tens_value + j as u32 + 1;
            below_hundred.push((format!("{ten}-{unit}"), value));
            below_hundred.push((format!("{ten} {unit}"), value));
        }
    }

    let mut numbers = below_hundred.clone();
    for (i, unit) in UNITS.iter().enumerate() {
        let hundreds_value = (i as u32 + 1) * 100;
        numbers.push((format!("{unit} HUNDRED"), hundreds_value));
        for (words, value) in &below_hundred {
            numbers.push((format!("{unit} HUNDRED AND {words}"), hundreds_value + value));
        }
    }

    numbers.push(("ONE THOUSAND".to_string(), 1000));
    numbers
}
