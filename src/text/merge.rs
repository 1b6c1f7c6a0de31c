use super::heading::HeadingMatcher;
use super::markup::{clean_line, word_count};
use crate::config::HeuristicsConfig;

/// Characters after which a line break is taken to be intentional.
const TERMINATORS: [char; 11] = ['.', ':', '"', '!', '?', '\u{201D}', '\'', ')', ']', '}', '\n'];

/// Undoes page-forced line breaks while keeping headings on their own lines.
pub struct LineMerger<'a> {
    matcher: &'a HeadingMatcher,
    subtitle_max_words: usize,
}

impl<'a> LineMerger<'a> {
    pub fn new(matcher: &'a HeadingMatcher, heuristics: &HeuristicsConfig) -> Self {
        Self {
            matcher,
            subtitle_max_words: heuristics.subtitle_max_words,
        }
    }

    /// Merge raw lines into blank-line-delimited blocks.
    ///
    /// Headings are surrounded by blank lines. A line continues the previous
    /// one unless the text so far ends in a terminator. A short line right
    /// after a heading is closed off so it can be read as a subtitle.
    pub fn merge<S: AsRef<str>>(&self, lines: &[S]) -> String {
        let mut merged = String::new();
        let mut prev_was_heading = false;

        for line in lines {
            let stripped = line.as_ref().trim();
            if stripped.is_empty() {
                continue;
            }
            let clean = clean_line(stripped);

            if self.matcher.is_heading(&clean) {
                push_heading(&mut merged, stripped);
                prev_was_heading = true;
            } else if !merged.is_empty() && !merged.ends_with(TERMINATORS) {
                merged.push(' ');
                merged.push_str(stripped);

                // a heading split over two physical lines ("CHAPTER" / "ONE")
                let start = merged.rfind('\n').unwrap_or(0);
                let open = merged[start..].trim_start_matches('\n');
                if self.matcher.is_heading(&clean_line(open)) {
                    let heading = merged.split_off(start);
                    push_heading(&mut merged, heading.trim_start_matches('\n'));
                    prev_was_heading = true;
                } else {
                    prev_was_heading = false;
                }
            } else {
                if !merged.is_empty() {
                    merged.push('\n');
                }
                merged.push_str(stripped);

                if prev_was_heading && word_count(&clean) <= self.subtitle_max_words {
                    merged.push('\n');
                }
                prev_was_heading = false;
            }
        }

        merged
    }
}

/// Put a heading on its own line with a blank line before and after it.
fn push_heading(merged: &mut String, heading: &str) {
    if !merged.is_empty() {
        merged.push('\n');
    }
    merged.push('\n');
    merged.push_str(heading);
    merged.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(lines: &[&str]) -> String {
        let matcher = HeadingMatcher::new();
        LineMerger::new(&matcher, &HeuristicsConfig::default()).merge(lines)
    }

    #[test]
    fn test_joins_broken_sentences() {
        let merged = merge(&["She walked", "alone.", "Then", "it rained."]);
        assert_eq!(merged, "She walked alone.\nThen it rained.");
    }

    #[test]
    fn test_isolates_headings() {
        let merged = merge(&["the end of it", "Chapter 2", "A new day began."]);
        assert_eq!(merged, "the end of it\n\nChapter 2\n\nA new day began.");
    }

    #[test]
    fn test_isolates_short_line_after_heading() {
        let merged = merge(&["CHAPTER ONE", "The Beginning", "It was a dark night."]);
        assert_eq!(merged, "\nCHAPTER ONE\n\nThe Beginning\n\nIt was a dark night.");
    }

    #[test]
    fn test_long_line_after_heading_continues() {
        let merged = merge(&["Chapter 1", "It was a dark and", "stormy night."]);
        assert_eq!(merged, "\nChapter 1\n\nIt was a dark and stormy night.");
    }

    #[test]
    fn test_skips_blank_lines_and_keeps_markup() {
        let merged = merge(&["", "<b>Chapter 1</b>", "   ", "<i>Quiet</i> words fell", "softly."]);
        assert_eq!(merged, "\n<b>Chapter 1</b>\n\n<i>Quiet</i> words fell softly.");
    }

    #[test]
    fn test_heading_split_across_lines_is_isolated() {
        let lines = ["It ended.", "CHAPTER", "ONE", "The night was long."];
        let once = merge(&lines);
        assert_eq!(once, "It ended.\n\nCHAPTER ONE\n\nThe night was long.");

        let again: Vec<&str> = once.lines().collect();
        assert_eq!(merge(&again), once);
    }

    #[test]
    fn test_split_heading_at_document_start() {
        let merged = merge(&["Chapter", "Twelve", "It was late and the", "rain fell."]);
        assert_eq!(merged, "\nChapter Twelve\n\nIt was late and the rain fell.");
    }

    #[test]
    fn test_merge_is_a_fixed_point() {
        let lines = [
            "Title Page",
            "PROLOGUE",
            "Long ago, the",
            "kingdom fell.",
            "Chapter 1",
            "Dawn",
            "The sun rose over",
            "the hills.",
            "\"Wake up,\" she said.",
            "II",
            "Night came.",
        ];
        let first = merge(&lines);
        let again: Vec<&str> = first.lines().collect();
        assert_eq!(merge(&again), first);
    }
}
