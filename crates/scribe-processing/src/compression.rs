use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use img_parts::{DynImage, ImageEXIF};
use scribe_core::{CompressionProfile, NormalizedPayload, OutputFormat, ProgressSink};
use std::io::Cursor;

use crate::compressor::CompressionError;

/// Quality removed per extra pass when the output is over the size target
const QUALITY_STEP: f32 = 0.10;
/// Extra passes after the first one
const MAX_EXTRA_PASSES: usize = 3;
/// Floor for the quality search
const MIN_QUALITY: f32 = 0.50;

/// Largest side libjpeg accepts
const JPEG_MAX_DIMENSION: u32 = 65_500;

const PROGRESS_STARTED: u8 = 5;
const PROGRESS_DECODED: u8 = 20;
const PROGRESS_ENCODED: u8 = 90;

/// Image re-encoder
///
/// Decodes the raw payload and re-encodes it to the profile's output format, keeping the
/// original resolution. The size target is soft: lossy formats are re-encoded at lower
/// quality a bounded number of times, and the smallest output wins even if it is still
/// over the target.
///
/// Nothing here ever resizes. `preserve_resolution` makes the compressor verify that from the
/// output header and fail the item when it does not hold.
pub struct ImageCompressor;

impl ImageCompressor {
    pub fn compress(
        raw: &[u8],
        profile: &CompressionProfile,
        progress: &dyn ProgressSink,
    ) -> Result<NormalizedPayload, CompressionError> {
        progress.on_progress(PROGRESS_STARTED);

        let img = image::load_from_memory(raw)
            .map_err(|e| CompressionError::Decode(e.to_string()))?;
        let (width, height) = img.dimensions();
        progress.on_progress(PROGRESS_DECODED);

        let format = profile.output_format;
        let passes = if format.is_lossy() {
            1 + MAX_EXTRA_PASSES
        } else {
            1
        };

        let mut quality = profile.quality.min(1.0);
        let mut best: Option<Bytes> = None;

        for pass in 0..passes {
            let encoded = Self::encode(&img, format, quality)?;
            tracing::debug!(
                pass = pass,
                quality = quality,
                size = encoded.len(),
                target = profile.max_size_bytes,
                "Encoded image"
            );

            let done = encoded.len() <= profile.max_size_bytes;
            if best.as_ref().map_or(true, |b| encoded.len() < b.len()) {
                best = Some(encoded);
            }

            let step = (PROGRESS_ENCODED - PROGRESS_DECODED) as usize * (pass + 1) / passes;
            progress.on_progress(PROGRESS_DECODED + step as u8);

            let next_quality = quality - QUALITY_STEP;
            if done || next_quality < MIN_QUALITY {
                break;
            }
            quality = next_quality;
        }

        let encoded = best.ok_or_else(|| CompressionError::Encode("no output produced".into()))?;
        if encoded.len() > profile.max_size_bytes {
            tracing::debug!(
                size = encoded.len(),
                target = profile.max_size_bytes,
                "Output still above size target, keeping smallest attempt"
            );
        }

        let bytes = if profile.preserve_metadata {
            Self::carry_metadata(raw, encoded)
        } else {
            encoded
        };
        if profile.preserve_resolution {
            Self::check_resolution(&bytes, (width, height))?;
        }

        tracing::debug!(
            width = width,
            height = height,
            original = raw.len(),
            normalized = bytes.len(),
            format = format.to_mime_type(),
            "Image normalized"
        );

        Ok(NormalizedPayload {
            bytes,
            content_type: format.to_mime_type(),
        })
    }

    /// Encode with a quality in (0, 1]
    fn encode(
        img: &DynamicImage,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Bytes, CompressionError> {
        match format {
            OutputFormat::Jpeg => Self::compress_jpeg(img, quality),
            OutputFormat::Png => Self::compress_png(img),
            OutputFormat::WebP => Self::compress_webp(img, quality),
        }
    }

    /// Compress to JPEG using mozjpeg
    fn compress_jpeg(img: &DynamicImage, quality: f32) -> Result<Bytes, CompressionError> {
        let (width, height) = img.dimensions();
        if width > JPEG_MAX_DIMENSION || height > JPEG_MAX_DIMENSION {
            return Err(CompressionError::Encode(format!(
                "{}x{} exceeds the JPEG limit of {} px",
                width, height, JPEG_MAX_DIMENSION
            )));
        }
        let rgb_img = img.to_rgb8();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality * 100.0);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let encode_err = |e: std::io::Error| CompressionError::Encode(e.to_string());
        let mut comp = comp.start_compress(Vec::new()).map_err(encode_err)?;
        comp.write_scanlines(&rgb_img).map_err(encode_err)?;
        let jpeg_data = comp.finish().map_err(encode_err)?;

        Ok(Bytes::from(jpeg_data))
    }

    /// Compress to PNG
    fn compress_png(img: &DynamicImage) -> Result<Bytes, CompressionError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        img.write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| CompressionError::Encode(e.to_string()))?;

        Ok(Bytes::from(buffer))
    }

    /// Compress to WebP
    ///
    /// Sides above 16383 px are refused by libwebp and surface as an encode error.
    fn compress_webp(img: &DynamicImage, quality: f32) -> Result<Bytes, CompressionError> {
        let (width, height) = img.dimensions();

        // Convert to RGBA for WebP encoding
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder
            .encode_simple(false, quality * 100.0)
            .map_err(|e| CompressionError::Encode(format!("{:?} ({}x{})", e, width, height)))?;

        Ok(Bytes::copy_from_slice(&webp_data))
    }

    /// Compare the output header against the source dimensions.
    fn check_resolution(output: &[u8], source: (u32, u32)) -> Result<(), CompressionError> {
        let encoded = image::ImageReader::new(Cursor::new(output))
            .with_guessed_format()
            .map_err(|e| CompressionError::Encode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| CompressionError::Encode(e.to_string()))?;

        if encoded != source {
            return Err(CompressionError::Encode(format!(
                "output is {}x{}, source is {}x{}",
                encoded.0, encoded.1, source.0, source.1
            )));
        }
        Ok(())
    }

    /// Copy the source EXIF block into the encoded output.
    ///
    /// Returns the output untouched when the source has no EXIF or either container is not
    /// understood.
    fn carry_metadata(source: &[u8], output: Bytes) -> Bytes {
        let exif = match DynImage::from_bytes(Bytes::copy_from_slice(source)) {
            Ok(Some(img)) => img.exif(),
            _ => None,
        };
        let Some(exif) = exif else {
            return output;
        };

        match DynImage::from_bytes(output.clone()) {
            Ok(Some(mut encoded)) => {
                encoded.set_exif(Some(exif));
                encoded.encoder().bytes()
            }
            _ => {
                tracing::debug!("Output container does not take EXIF, dropping metadata");
                output
            }
        }
    }
}
