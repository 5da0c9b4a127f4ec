// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image file loading and export encoding.
//!
//! This module handles decoding image files into RGBA buffers for the
//! editor and encoding the edited result back into PNG bytes.

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// A decoded image ready to hand to the editor.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

/// Decode an image file into RGBA pixels.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let decoded = image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    let pixels = decoded.to_rgba8();

    Ok(LoadedImage {
        width: pixels.width(),
        height: pixels.height(),
        pixels,
    })
}

/// Encode RGBA pixels as PNG.
pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(bytes)
}

/// Write encoded export bytes to disk.
pub fn save_encoded(bytes: &[u8], path: &Path) -> Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_png_export_roundtrips_through_loader() {
        let pixels = RgbaImage::from_pixel(5, 3, Rgba([10, 20, 30, 255]));
        let bytes = encode_png(&pixels).unwrap();

        let path = std::env::temp_dir().join(format!("retouch-media-{}.png", std::process::id()));
        save_encoded(&bytes, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!((loaded.width, loaded.height), (5, 3));
        assert_eq!(*loaded.pixels.get_pixel(4, 2), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(load_image(Path::new("/definitely/not/here.png")).is_err());
    }
}
