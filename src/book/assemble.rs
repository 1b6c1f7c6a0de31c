use tracing::debug;

use super::{BookDocument, Section, SectionKind};
use crate::config::HeuristicsConfig;
use crate::text::markup::escape_markup;
use crate::text::{detect_paragraphs, ChapterSegment};

/// Renders front matter and chapters into the ordered book sections.
pub struct DocumentAssembler<'a> {
    heuristics: &'a HeuristicsConfig,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(heuristics: &'a HeuristicsConfig) -> Self {
        Self { heuristics }
    }

    pub fn assemble<S: AsRef<str>>(
        &self,
        front_matter: &[S],
        chapters: &[ChapterSegment],
    ) -> BookDocument {
        let mut sections = Vec::with_capacity(chapters.len() + 1);

        let intro_lines: Vec<&str> = front_matter
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .collect();

        if !intro_lines.is_empty() {
            let title = &self.heuristics.front_matter_title;
            let mut markup = heading(title);
            for line in &intro_lines {
                push_paragraph(&mut markup, line);
            }
            sections.push(Section {
                title: title.clone(),
                kind: SectionKind::FrontMatter,
                body_markup: markup,
            });
        }

        for chapter in chapters {
            let lines = body_lines(chapter);
            let paragraphs = detect_paragraphs(&lines);
            debug!("'{}': {} paragraphs", chapter.title, paragraphs.len());

            let mut markup = heading(&chapter.title);
            for paragraph in paragraphs.iter().filter(|p| **p != chapter.title) {
                push_paragraph(&mut markup, paragraph);
            }
            sections.push(Section {
                title: chapter.title.clone(),
                kind: SectionKind::Chapter,
                body_markup: markup,
            });
        }

        BookDocument { sections }
    }
}

/// Body lines without the leading subtitle line already shown in the title.
fn body_lines(chapter: &ChapterSegment) -> Vec<&str> {
    let mut lines: Vec<&str> = chapter.body.lines().collect();

    if let Some(subtitle) = &chapter.subtitle {
        let first = lines.iter().position(|l| !l.trim().is_empty());
        if let Some(idx) = first.filter(|&idx| lines[idx].trim() == subtitle) {
            lines.remove(idx);
        }
    }

    lines
}

fn heading(title: &str) -> String {
    format!("<h1>{}</h1>\n", escape_markup(title))
}

fn push_paragraph(markup: &mut String, text: &str) {
    markup.push_str("<p>");
    markup.push_str(&escape_markup(text));
    markup.push_str("</p>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(title: &str, subtitle: Option<&str>, body: &str) -> ChapterSegment {
        ChapterSegment {
            title: title.to_string(),
            subtitle: subtitle.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_front_matter_becomes_introduction() {
        let heuristics = HeuristicsConfig::default();
        let front = vec!["", "A Novel", "  ", "by Nobody"];
        let doc = DocumentAssembler::new(&heuristics).assemble(&front, &[]);

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.sections[0].title, "Introduction");
        assert_eq!(doc.sections[0].kind, SectionKind::FrontMatter);
        assert_eq!(
            doc.sections[0].body_markup,
            "<h1>Introduction</h1>\n<p>A Novel</p>\n<p>by Nobody</p>\n"
        );
    }

    #[test]
    fn test_blank_front_matter_is_dropped() {
        let heuristics = HeuristicsConfig::default();
        let front = vec!["", "   "];
        let doc = DocumentAssembler::new(&heuristics)
            .assemble(&front, &[chapter("Chapter 1", None, "Text.")]);

        assert_eq!(doc.titles().collect::<Vec<_>>(), vec!["Chapter 1"]);
        assert!(!doc.has_front_matter());
    }

    #[test]
    fn test_chapter_markup_skips_subtitle_and_title() {
        let heuristics = HeuristicsConfig::default();
        let chapters = [
            chapter(
                "Chapter 1 Dawn",
                Some("Dawn"),
                "\nDawn\n\nThe sun rose.\nBirds & bees woke.",
            ),
            chapter("Chapter 2", None, "\nThe text ends.\nChapter 2"),
        ];
        let doc = DocumentAssembler::new(&heuristics).assemble::<&str>(&[], &chapters);

        assert_eq!(
            doc.sections[0].body_markup,
            "<h1>Chapter 1 Dawn</h1>\n<p>The sun rose.</p>\n<p>Birds &amp; bees woke.</p>\n"
        );
        assert_eq!(
            doc.sections[1].body_markup,
            "<h1>Chapter 2</h1>\n<p>The text ends.</p>\n"
        );
    }

    #[test]
    fn test_inline_formatting_survives() {
        let heuristics = HeuristicsConfig::default();
        let chapters = [chapter("Chapter 1", None, "<i>Softly</i> it began.")];
        let doc = DocumentAssembler::new(&heuristics).assemble::<&str>(&[], &chapters);

        assert!(doc.sections[0]
            .body_markup
            .contains("<p><i>Softly</i> it began.</p>"));
    }
}
