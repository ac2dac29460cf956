// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Photo compression before analysis and upload.
//!
//! Decodes any supported image, bounds its longest side, and re-encodes it
//! as a JPEG data URI. The same input bytes always produce the same output.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// A re-encoded JPEG ready for analysis and upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedPhoto {
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
    /// Raw JPEG bytes (hashed for the storage key)
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Errors from image compression. Callers treat these as non-fatal.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Could not encode JPEG: {0}")]
    Encode(String),
}

/// Fixed-parameter JPEG compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCompressor {
    /// Longest side allowed after compression, in pixels
    pub max_dimension: u32,
    /// JPEG quality, 1-100
    pub quality: u8,
}

impl ImageCompressor {
    /// Sighting photos sent to the model and to storage.
    pub const REPORT_PHOTO: Self = Self {
        max_dimension: 800,
        quality: 70,
    };

    /// Profile pictures.
    pub const AVATAR: Self = Self {
        max_dimension: 256,
        quality: 80,
    };

    /// Decode, downscale if needed, and re-encode as JPEG.
    pub fn compress(&self, bytes: &[u8]) -> Result<CompressedPhoto, CompressError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| CompressError::Decode(e.to_string()))?;

        let (width, height) = decoded.dimensions();
        let resized = if width.max(height) > self.max_dimension {
            // resize() keeps the aspect ratio and fits inside the bounding box
            decoded.resize(self.max_dimension, self.max_dimension, FilterType::Triangle)
        } else {
            decoded
        };

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        let mut jpeg = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, self.quality))
            .map_err(|e| CompressError::Encode(e.to_string()))?;

        let data_uri = format!("{}{}", DATA_URI_PREFIX, BASE64.encode(&jpeg));

        tracing::debug!(
            original_width = width,
            original_height = height,
            width = rgb.width(),
            height = rgb.height(),
            bytes_in = bytes.len(),
            bytes_out = jpeg.len(),
            "Compressed photo"
        );

        Ok(CompressedPhoto {
            data_uri,
            width: rgb.width(),
            height: rgb.height(),
            jpeg,
        })
    }

    /// Run `compress` on the blocking thread pool.
    pub async fn compress_blocking(
        &self,
        bytes: Vec<u8>,
    ) -> Result<CompressedPhoto, CompressError> {
        let compressor = *self;
        tokio::task::spawn_blocking(move || compressor.compress(&bytes))
            .await
            .map_err(|e| CompressError::Encode(format!("compression task failed: {}", e)))?
    }
}
