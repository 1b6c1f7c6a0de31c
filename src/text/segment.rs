//! Chapter segmentation over merged text.
//!
//! Heading candidates are accepted only in ordinal sequence and never twice
//! in a row. When a candidate arrives directly after an accepted heading, that
//! heading is retracted: it was most likely a page artifact announcing the real
//! heading. The candidate then gets one more chance against the restored
//! ordinal, so a pair like "Chapter 2" / "2" collapses into a single chapter.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::heading::{HeadingCandidate, HeadingMatcher};
use super::markup::{clean_line, word_count};
use crate::config::HeuristicsConfig;

/// A detected chapter or named section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterSegment {
    /// Heading text, followed by the absorbed subtitle if there is one.
    pub title: String,
    /// The absorbed subtitle line as it appears in `body`.
    pub subtitle: Option<String>,
    /// Merged lines strictly between this heading and the next one.
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Segmentation {
    pub sections: Vec<ChapterSegment>,
    pub front_matter: Vec<String>,
}

/// An accepted heading on the retraction stack.
#[derive(Debug)]
struct AcceptedHeading {
    line: usize,
    title: String,
    subtitle: Option<String>,
    consumes_ordinal: bool,
}

pub struct ChapterSegmenter<'a> {
    matcher: &'a HeadingMatcher,
    heuristics: &'a HeuristicsConfig,
}

impl<'a> ChapterSegmenter<'a> {
    pub fn new(matcher: &'a HeadingMatcher, heuristics: &'a HeuristicsConfig) -> Self {
        Self {
            matcher,
            heuristics,
        }
    }

    pub fn segment(&self, merged: &str) -> Segmentation {
        let lines: Vec<&str> = merged.lines().collect();
        let mut accepted: Vec<AcceptedHeading> = Vec::new();

        let mut prev_was_heading = false;
        let mut expected_ordinal: u32 = 1;
        let mut consecutive_run: usize = 0;

        for (i, line) in lines.iter().enumerate() {
            let clean = clean_line(line);
            if clean.is_empty() {
                continue;
            }

            let candidate = match self.matcher.classify(&clean) {
                Some(candidate) => candidate,
                None => {
                    prev_was_heading = false;
                    continue;
                }
            };

            if candidate.is_named_section() {
                if clean.eq_ignore_ascii_case("EPILOGUE") && accepted.is_empty() {
                    debug!("Epilogue at line {} cannot open a document", i + 1);
                    continue;
                }
                info!("Section '{}' found at line {}", clean, i + 1);
                accepted.push(AcceptedHeading {
                    line: i,
                    title: line.trim().to_string(),
                    subtitle: None,
                    consumes_ordinal: false,
                });
                prev_was_heading = true;
                continue;
            }

            if prev_was_heading {
                consecutive_run += 1;
            } else {
                consecutive_run = 0;
            }

            let in_sequence = candidate.ordinal.map_or(true, |n| n == expected_ordinal);
            if in_sequence && !prev_was_heading {
                self.accept(&lines, i, &candidate, &mut accepted, &mut expected_ordinal);
                prev_was_heading = true;
                continue;
            }

            debug!("Skipped potential chapter indicator at line {}: {}", i + 1, clean);
            prev_was_heading = false;

            if consecutive_run == 1 {
                if let Some(retracted) = accepted.pop() {
                    if retracted.consumes_ordinal {
                        expected_ordinal -= 1;
                    }
                    debug!(
                        "Retracted heading '{}' at line {}",
                        retracted.title,
                        retracted.line + 1
                    );

                    if candidate.ordinal.map_or(true, |n| n == expected_ordinal) {
                        self.accept(&lines, i, &candidate, &mut accepted, &mut expected_ordinal);
                        prev_was_heading = true;
                    }
                }
            }
        }

        self.carve(merged, &lines, accepted)
    }

    fn accept(
        &self,
        lines: &[&str],
        index: usize,
        candidate: &HeadingCandidate,
        accepted: &mut Vec<AcceptedHeading>,
        expected_ordinal: &mut u32,
    ) {
        info!(
            "Chapter {} found at line {}: {}",
            expected_ordinal,
            index + 1,
            candidate.text
        );
        *expected_ordinal += 1;

        let subtitle = self.find_subtitle(lines, index);
        let title = match &subtitle {
            Some(sub) => format!("{} {}", candidate.text, sub),
            None => candidate.text.clone(),
        };

        accepted.push(AcceptedHeading {
            line: index,
            title,
            subtitle,
            consumes_ordinal: true,
        });
    }

    /// The first non-blank line within the lookahead window, if it is short.
    fn find_subtitle(&self, lines: &[&str], index: usize) -> Option<String> {
        let end = (index + 1)
            .saturating_add(self.heuristics.subtitle_lookahead)
            .min(lines.len());
        let next = lines[index + 1..end]
            .iter()
            .map(|line| line.trim())
            .find(|line| !line.is_empty())?;

        if word_count(&clean_line(next)) <= self.heuristics.subtitle_max_words {
            Some(next.to_string())
        } else {
            None
        }
    }

    fn carve(&self, merged: &str, lines: &[&str], accepted: Vec<AcceptedHeading>) -> Segmentation {
        let first_line = match accepted.first() {
            Some(first) => first.line,
            None => {
                warn!("No chapters found in document");
                return Segmentation {
                    sections: vec![ChapterSegment {
                        title: self.heuristics.fallback_title.clone(),
                        subtitle: None,
                        body: merged.to_string(),
                    }],
                    front_matter: Vec::new(),
                };
            }
        };

        let front_matter = lines[..first_line].iter().map(|l| l.to_string()).collect();

        let boundaries: Vec<usize> = accepted
            .iter()
            .skip(1)
            .map(|h| h.line)
            .chain(std::iter::once(lines.len()))
            .collect();

        let sections = accepted
            .into_iter()
            .zip(boundaries)
            .map(|(heading, end)| ChapterSegment {
                title: heading.title,
                subtitle: heading.subtitle,
                body: lines[heading.line + 1..end].join("\n"),
            })
            .collect();

        Segmentation {
            sections,
            front_matter,
        }
    }
}
