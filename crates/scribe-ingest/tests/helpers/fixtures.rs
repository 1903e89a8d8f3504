//! Test fixtures: encoded images and article bodies.

use image::{ImageBuffer, Rgb, RgbImage};

/// Smooth photo-like content that lossy encoders shrink well.
pub fn sample_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let fx = x as f32 / width as f32;
        let fy = y as f32 / height as f32;
        Rgb([
            (128.0 + 127.0 * (fx * 11.0).sin()) as u8,
            (128.0 + 127.0 * (fy * 6.0).cos()) as u8,
            (128.0 + 127.0 * ((fx - fy) * 4.0).sin()) as u8,
        ])
    })
}

/// Maximum-quality JPEG, as straight out of a camera export.
pub fn camera_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 100);
    encoder
        .encode_image(&sample_image(width, height))
        .expect("encode fixture jpeg");
    out
}

pub const ARTICLE: &[u8] = b"\xEF\xBB\xBF# Release notes\r\n\r\nBatch uploads are here.\r\n";
