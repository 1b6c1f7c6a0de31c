use image::{DynamicImage, GrayImage, ImageOutputFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_extract::extract_text;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use super::source::{ExtractedText, TextSource};
use crate::error::{ConvertError, Result};

/// Text extraction from PDF files via `pdf-extract`.
///
/// The first image on the first page, if any, is kept as the cover.
pub struct PdfSource;

impl TextSource for PdfSource {
    fn extract(&self, path: &Path) -> Result<ExtractedText> {
        info!("Extracting text from PDF: {:?}", path);

        let text = extract_text(path).map_err(|e| ConvertError::Extraction {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut content = ExtractedText::from_pages(&text);

        if !content.has_text() {
            warn!("PDF appears to be scanned or has no extractable text: {:?}", path);
            return Err(ConvertError::EmptyDocument(path.to_path_buf()));
        }

        info!(
            "Extracted {} pages ({} lines) from PDF",
            content.page_count,
            content.lines.len()
        );

        content.cover = extract_cover(path);
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// Bytes of the first image drawn on the first page.
///
/// JPEG streams are returned as stored. Unfiltered or Flate-compressed 8-bit
/// RGB and grayscale rasters are re-encoded as PNG. Other encodings are skipped.
pub fn extract_cover(path: &Path) -> Option<Vec<u8>> {
    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Could not extract cover image: {}", e);
            return None;
        }
    };

    let (_, first_page) = doc.get_pages().into_iter().next()?;
    let cover = page_images(&doc, first_page)
        .into_iter()
        .find_map(image_bytes);

    match &cover {
        Some(bytes) => info!("Cover image extracted from first page ({} bytes)", bytes.len()),
        None => debug!("No usable image on the first page of {:?}", path),
    }
    cover
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Resources of a page, following the page tree for inherited entries.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    for _ in 0..32 {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve(doc, resources)?.as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn page_images(doc: &Document, page_id: ObjectId) -> Vec<&Stream> {
    let xobjects = page_resources(doc, page_id)
        .and_then(|resources| resources.get(b"XObject").ok())
        .and_then(|xobjects| resolve(doc, xobjects))
        .and_then(|xobjects| xobjects.as_dict().ok());

    let Some(xobjects) = xobjects else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, object)| resolve(doc, object)?.as_stream().ok())
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .map_or(false, |name| name == b"Image")
        })
        .collect()
}

fn stream_filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(names)) => names
            .iter()
            .filter_map(|n| n.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn image_bytes(stream: &Stream) -> Option<Vec<u8>> {
    let filters = stream_filters(stream);

    if filters.len() == 1 && filters[0] == b"DCTDecode" {
        return Some(stream.content.clone());
    }
    if !filters.iter().all(|f| f == b"FlateDecode") {
        debug!("Skipping image with unsupported filters");
        return None;
    }

    let raw = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream.decompressed_content().ok()?
    };

    let dimension = |key: &[u8]| {
        stream
            .dict
            .get(key)
            .and_then(Object::as_i64)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
    };
    let width = dimension(b"Width")?;
    let height = dimension(b"Height")?;
    if dimension(b"BitsPerComponent") != Some(8) {
        return None;
    }

    let color_space = stream.dict.get(b"ColorSpace").and_then(Object::as_name).ok()?;
    let image = match color_space {
        b"DeviceRGB" => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, raw)?),
        b"DeviceGray" => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, raw)?),
        _ => return None,
    };

    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
        .ok()?;
    Some(out)
}
