// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Image preparation for vision models

use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;
use tracing::debug;

use crate::Result;

/// Decode an image, shrink it so its longest side is at most `max_dimension`
/// and re-encode it as base64 JPEG.
pub fn prepare_image(data: &[u8], max_dimension: u32) -> Result<String> {
    let img = image::load_from_memory(data)?;
    let (width, height) = img.dimensions();

    // resize() keeps the aspect ratio within the bounding box
    let img = if width > max_dimension || height > max_dimension {
        img.resize(max_dimension, max_dimension, image::imageops::FilterType::Triangle)
    } else {
        img
    };
    debug!("Prepared image {}x{} -> {}x{}", width, height, img.width(), img.height());

    // JPEG has no alpha channel
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)?;

    Ok(general_purpose::STANDARD.encode(&buffer))
}
