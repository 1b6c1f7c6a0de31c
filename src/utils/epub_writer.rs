//! EPUB packaging for assembled books.
//!
//! Writes an EPUB 3 container with an NCX table of contents for older readers.
//! Spine and table of contents follow the section order of the document.

use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::cover::{prepare_cover, CoverImage};
use crate::book::{BookDocument, BookMetadata, SectionKind};
use crate::config::EpubConfig;
use crate::error::{ConvertError, Result};
use crate::text::markup::{escape_xml, strip_tags};

/// Trait for packaging collaborators
pub trait Packager {
    /// Write `document` with `metadata` (and an optional cover) to `destination`
    fn package(
        &self,
        document: &BookDocument,
        metadata: &BookMetadata,
        cover: Option<&[u8]>,
        destination: &Path,
    ) -> Result<()>;
}

pub struct EpubPackager {
    config: EpubConfig,
}

impl EpubPackager {
    pub fn new(config: EpubConfig) -> Self {
        Self { config }
    }

    /// Write the EPUB archive to any seekable writer.
    pub fn write<W: Write + Seek>(
        &self,
        document: &BookDocument,
        metadata: &BookMetadata,
        cover: Option<&CoverImage>,
        writer: W,
    ) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.config.compression_level as i64));

        // mimetype must be first and uncompressed
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML)?;

        let items = section_items(document);
        let language = &metadata.language;

        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(generate_opf(metadata, &items, cover).as_bytes())?;

        zip.start_file("OEBPS/toc.ncx", deflated)?;
        zip.write_all(generate_ncx(metadata, &items).as_bytes())?;

        zip.start_file("OEBPS/nav.xhtml", deflated)?;
        zip.write_all(generate_nav(language, &items).as_bytes())?;

        if let Some(cover) = cover {
            let image_name = format!("OEBPS/cover.{}", cover.extension);
            zip.start_file(image_name.as_str(), stored)?;
            zip.write_all(&cover.bytes)?;

            let page = xhtml_document(
                language,
                "Cover",
                &format!(
                    "<div class=\"cover\"><img src=\"cover.{}\" alt=\"Cover\"/></div>\n",
                    cover.extension
                ),
            );
            zip.start_file("OEBPS/cover.xhtml", deflated)?;
            zip.write_all(page.as_bytes())?;
        }

        for item in &items {
            let page = xhtml_document(language, &item.label, item.markup);
            let path = format!("OEBPS/{}", item.href);
            zip.start_file(path.as_str(), deflated)?;
            zip.write_all(page.as_bytes())?;
            debug!("Added {}: {}", item.href, item.label);
        }

        zip.finish()?.flush()?;
        Ok(())
    }
}

impl Packager for EpubPackager {
    fn package(
        &self,
        document: &BookDocument,
        metadata: &BookMetadata,
        cover: Option<&[u8]>,
        destination: &Path,
    ) -> Result<()> {
        let cover = cover.and_then(|bytes| prepare_cover(bytes, self.config.cover_quality));
        let packaging = |source: std::io::Error| ConvertError::Packaging {
            path: destination.to_path_buf(),
            source,
        };

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(packaging)?;
            }
        }
        let file = File::create(destination).map_err(packaging)?;

        self.write(document, metadata, cover.as_ref(), BufWriter::new(file))
            .map_err(|e| match e {
                ConvertError::Io(source) => packaging(source),
                other => other,
            })?;

        for (i, title) in document.titles().enumerate() {
            info!("Added section {}: {}", i + 1, title);
        }
        info!("EPUB successfully created at: {:?}", destination);
        Ok(())
    }
}

/// A section's place in the package.
struct SectionItem<'a> {
    id: String,
    href: String,
    label: String,
    markup: &'a str,
}

fn section_items(document: &BookDocument) -> Vec<SectionItem<'_>> {
    let mut chapter_number = 0;

    document
        .sections
        .iter()
        .map(|section| {
            let (id, href) = match section.kind {
                SectionKind::FrontMatter => ("intro".to_string(), "intro.xhtml".to_string()),
                SectionKind::Chapter => {
                    chapter_number += 1;
                    (
                        format!("chapter_{}", chapter_number),
                        format!("chapter_{}.xhtml", chapter_number),
                    )
                }
            };
            SectionItem {
                id,
                href,
                label: strip_tags(&section.title).trim().to_string(),
                markup: &section.body_markup,
            }
        })
        .collect()
}

const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

fn generate_opf(metadata: &BookMetadata, items: &[SectionItem], cover: Option<&CoverImage>) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_xml(&book_identifier(metadata))
    ));
    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_xml(&metadata.title)
    ));
    opf.push_str(&format!(
        "    <dc:creator>{}</dc:creator>\n",
        escape_xml(&metadata.author)
    ));
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_xml(&metadata.language)
    ));
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        utc_timestamp()
    ));
    if cover.is_some() {
        opf.push_str("    <meta name=\"cover\" content=\"cover-image\"/>\n");
    }
    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    opf.push_str(
        "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
    );
    if let Some(cover) = cover {
        opf.push_str(&format!(
            "    <item id=\"cover-image\" href=\"cover.{}\" media-type=\"{}\" properties=\"cover-image\"/>\n",
            cover.extension, cover.media_type
        ));
        opf.push_str(
            "    <item id=\"cover\" href=\"cover.xhtml\" media-type=\"application/xhtml+xml\"/>\n",
        );
    }
    for item in items {
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            item.id, item.href
        ));
    }
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine toc=\"ncx\">\n");
    if cover.is_some() {
        opf.push_str("    <itemref idref=\"cover\"/>\n");
    }
    opf.push_str("    <itemref idref=\"nav\"/>\n");
    for item in items {
        opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", item.id));
    }
    opf.push_str("  </spine>\n");

    opf.push_str("</package>\n");
    opf
}

fn generate_ncx(metadata: &BookMetadata, items: &[SectionItem]) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
"#,
    );
    ncx.push_str(&format!(
        "    <meta name=\"dtb:uid\" content=\"{}\"/>\n",
        escape_xml(&book_identifier(metadata))
    ));
    ncx.push_str(
        r#"    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
"#,
    );
    ncx.push_str(&format!(
        "  <docTitle>\n    <text>{}</text>\n  </docTitle>\n  <navMap>\n",
        escape_xml(&metadata.title)
    ));

    for (i, item) in items.iter().enumerate() {
        let play_order = i + 1;
        ncx.push_str(&format!(
            "    <navPoint id=\"navPoint-{}\" playOrder=\"{}\">\n",
            play_order, play_order
        ));
        ncx.push_str(&format!(
            "      <navLabel><text>{}</text></navLabel>\n",
            escape_xml(&item.label)
        ));
        ncx.push_str(&format!("      <content src=\"{}\"/>\n", item.href));
        ncx.push_str("    </navPoint>\n");
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn generate_nav(language: &str, items: &[SectionItem]) -> String {
    let mut body = String::from("<nav epub:type=\"toc\" id=\"toc\">\n<h1>Contents</h1>\n<ol>\n");
    for item in items {
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            item.href,
            escape_xml(&item.label)
        ));
    }
    body.push_str("</ol>\n</nav>\n");
    xhtml_document(language, "Contents", &body)
}

fn xhtml_document(language: &str, title: &str, body: &str) -> String {
    let language = escape_xml(language);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{language}" lang="{language}">
<head>
  <title>{}</title>
</head>
<body>
{}</body>
</html>
"#,
        escape_xml(title),
        body
    )
}

/// Stable identifier derived from title and author.
fn book_identifier(metadata: &BookMetadata) -> String {
    let mut slug = String::new();
    for ch in format!("{} {}", metadata.title, metadata.author).chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    format!("urn:pdf2epub:{}", slug.trim_end_matches('-'))
}

fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Section;

    fn sample_document() -> BookDocument {
        BookDocument {
            sections: vec![
                Section {
                    title: "Introduction".to_string(),
                    kind: SectionKind::FrontMatter,
                    body_markup: "<h1>Introduction</h1>\n<p>Hi</p>\n".to_string(),
                },
                Section {
                    title: "<b>Chapter 1</b> Fish & Chips".to_string(),
                    kind: SectionKind::Chapter,
                    body_markup: "<h1><b>Chapter 1</b> Fish &amp; Chips</h1>\n".to_string(),
                },
            ],
        }
    }

    fn sample_metadata() -> BookMetadata {
        BookMetadata {
            title: "Sea & Sky".to_string(),
            author: "A. Writer".to_string(),
            language: "en".to_string(),
        }
    }

    #[test]
    fn test_section_items_naming() {
        let doc = sample_document();
        let items = section_items(&doc);
        assert_eq!(items[0].href, "intro.xhtml");
        assert_eq!(items[1].href, "chapter_1.xhtml");
        assert_eq!(items[1].label, "Chapter 1 Fish & Chips");
    }

    #[test]
    fn test_opf_lists_sections_in_order() {
        let doc = sample_document();
        let opf = generate_opf(&sample_metadata(), &section_items(&doc), None);
        assert!(opf.contains("<dc:title>Sea &amp; Sky</dc:title>"));
        let intro = opf.find("<itemref idref=\"intro\"/>").unwrap();
        let chapter = opf.find("<itemref idref=\"chapter_1\"/>").unwrap();
        assert!(intro < chapter);
        assert!(!opf.contains("cover-image"));
    }

    #[test]
    fn test_ncx_escapes_labels() {
        let doc = sample_document();
        let ncx = generate_ncx(&sample_metadata(), &section_items(&doc));
        assert!(ncx.contains("<text>Chapter 1 Fish &amp; Chips</text>"));
        assert!(ncx.contains("playOrder=\"2\""));
    }

    #[test]
    fn test_opf_modified_timestamp() {
        let doc = sample_document();
        let opf = generate_opf(&sample_metadata(), &section_items(&doc), None);
        let start = opf.find("dcterms:modified\">").unwrap() + "dcterms:modified\">".len();
        let stamp = &opf[start..start + 20];
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%SZ").is_ok());
    }

    #[test]
    fn test_book_identifier() {
        assert_eq!(
            book_identifier(&sample_metadata()),
            "urn:pdf2epub:sea-sky-a-writer"
        );
    }
}
