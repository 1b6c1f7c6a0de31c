use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat, ImageOutputFormat};
use std::io::Cursor;
use tracing::{info, warn};

/// A cover image ready to be stored in the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub media_type: &'static str,
}

/// Recompress a cover to keep the package small.
///
/// Opaque images become JPEG at `quality`, images with alpha are re-encoded
/// as PNG. If decoding or encoding fails the original bytes are kept. Returns
/// `None` only when the bytes are not a recognizable image at all.
pub fn prepare_cover(bytes: &[u8], quality: u8) -> Option<CoverImage> {
    let original_format = match image::guess_format(bytes) {
        Ok(format) => format,
        Err(e) => {
            warn!("Could not identify cover image: {}", e);
            return None;
        }
    };

    match compress(bytes, quality) {
        Ok(cover) => {
            info!(
                "Cover image recompressed: {} -> {} bytes",
                bytes.len(),
                cover.bytes.len()
            );
            Some(cover)
        }
        Err(e) => {
            warn!("Image compression failed: {}", e);
            let (extension, media_type) = format_names(original_format)?;
            Some(CoverImage {
                bytes: bytes.to_vec(),
                extension,
                media_type,
            })
        }
    }
}

fn compress(bytes: &[u8], quality: u8) -> image::ImageResult<CoverImage> {
    let img = image::load_from_memory(bytes)?;
    let mut out = Vec::new();

    if img.color().has_alpha() {
        img.write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)?;
        return Ok(CoverImage {
            bytes: out,
            extension: "png",
            media_type: "image/png",
        });
    }

    let rgb = img.to_rgb8();
    JpegEncoder::new_with_quality(&mut out, quality).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    Ok(CoverImage {
        bytes: out,
        extension: "jpg",
        media_type: "image/jpeg",
    })
}

fn format_names(format: ImageFormat) -> Option<(&'static str, &'static str)> {
    match format {
        ImageFormat::Jpeg => Some(("jpg", "image/jpeg")),
        ImageFormat::Png => Some(("png", "image/png")),
        ImageFormat::Gif => Some(("gif", "image/gif")),
        ImageFormat::WebP => Some(("webp", "image/webp")),
        _ => None,
    }
}
