// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Text rasteriser used to burn text annotations into image pixels.
//!
//! Glyph outlines are drawn with `ab_glyph` from the same font data egui
//! ships, so committed text matches the typeface of the input overlay.
//! Fonts are tried in order; a character uses the first one that has it.

use super::raster::blend;
use crate::util::geometry::Point;
use ab_glyph::{point, Font, FontArc, FontVec, GlyphId, ScaleFont};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

pub struct TextRenderer {
    fonts: Vec<FontArc>,
}

impl TextRenderer {
    pub fn new(fonts: Vec<FontArc>) -> Self {
        Self { fonts }
    }

    /// Load the proportional family of `definitions`, in fallback order.
    pub fn from_definitions(definitions: &egui::FontDefinitions) -> Result<Self> {
        let names = definitions
            .families
            .get(&egui::FontFamily::Proportional)
            .cloned()
            .unwrap_or_default();

        let mut fonts = Vec::with_capacity(names.len());
        for name in &names {
            let Some(data) = definitions.font_data.get(name) else {
                log::warn!("Font family lists unknown font {:?}", name);
                continue;
            };
            let font = FontVec::try_from_vec_and_index(data.font.to_vec(), data.index)
                .with_context(|| format!("Failed to parse font {:?}", name))?;
            fonts.push(FontArc::new(font));
        }
        log::debug!("Text renderer ready with {} fonts", fonts.len());
        Ok(Self::new(fonts))
    }

    /// The fonts egui draws its default proportional text with.
    pub fn egui_default() -> Result<Self> {
        Self::from_definitions(&egui::FontDefinitions::default())
    }

    fn font_for(&self, ch: char) -> Option<&FontArc> {
        self.fonts.iter().find(|font| font.glyph_id(ch) != GlyphId(0))
    }

    /// Characters of `text` that no font can draw.
    pub fn missing(&self, text: &str) -> Vec<char> {
        let mut missing: Vec<char> = text
            .chars()
            .filter(|ch| !ch.is_control() && self.font_for(*ch).is_none())
            .collect();
        missing.dedup();
        missing
    }

    /// Distance between baselines at `font_size` pixels.
    pub fn line_height(&self, font_size: f32) -> f32 {
        match self.fonts.first() {
            Some(font) => {
                let scaled = font.as_scaled(font_size);
                scaled.height() + scaled.line_gap()
            }
            None => font_size,
        }
    }

    /// Rasterise `text` into `target` with its top-left at `origin`, wrapping
    /// at `max_width`. Characters no font has are skipped with a warning.
    pub fn draw_text(
        &self,
        target: &mut RgbaImage,
        text: &str,
        origin: Point,
        font_size: f64,
        max_width: f64,
        color: Rgba<u8>,
    ) {
        let missing = self.missing(text);
        if !missing.is_empty() {
            log::warn!("No font can draw {:?}; skipping them", missing);
        }
        let Some(primary) = self.fonts.first() else {
            return;
        };

        let size = font_size as f32;
        let line_height = self.line_height(size);
        let ascent = primary.as_scaled(size).ascent();
        let left = origin.x as f32;
        let right = left + max_width as f32;
        let mut pen = point(left, origin.y as f32 + ascent);
        let mut previous: Option<(&FontArc, GlyphId)> = None;

        for ch in text.chars() {
            if ch == '\n' {
                pen = point(left, pen.y + line_height);
                previous = None;
                continue;
            }
            let Some(font) = self.font_for(ch) else {
                continue;
            };
            let scaled = font.as_scaled(size);
            let id = font.glyph_id(ch);
            if let Some((previous_font, previous_id)) = previous {
                if std::ptr::eq(previous_font, font) {
                    pen.x += scaled.kern(previous_id, id);
                }
            }
            let advance = scaled.h_advance(id);
            if pen.x > left && pen.x + advance > right {
                pen = point(left, pen.y + line_height);
            }

            let glyph = id.with_scale_and_position(size, pen);
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let (width, height) = target.dimensions();
                outlined.draw(|x, y, coverage| {
                    let px = bounds.min.x + x as f32;
                    let py = bounds.min.y + y as f32;
                    if px < 0.0 || py < 0.0 || px >= width as f32 || py >= height as f32 {
                        return;
                    }
                    blend(target.get_pixel_mut(px as u32, py as u32), color, coverage);
                });
            }
            pen.x += advance;
            previous = Some((font, id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn inked(image: &RgbaImage) -> Vec<(u32, u32)> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] > 0)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    fn render(text: &str, font_size: f64, max_width: f64) -> RgbaImage {
        let renderer = TextRenderer::egui_default().expect("bundled fonts parse");
        let mut target = RgbaImage::new(200, 200);
        renderer.draw_text(&mut target, text, Point::new(5.0, 5.0), font_size, max_width, BLACK);
        target
    }

    #[test]
    fn test_default_fonts_cover_accented_text() {
        let renderer = TextRenderer::egui_default().expect("bundled fonts parse");
        assert!(renderer.missing("café über straße €5 \u{2014} ok").is_empty());
    }

    #[test]
    fn test_accent_is_drawn() {
        let plain = inked(&render("e", 40.0, 190.0));
        let accented = inked(&render("é", 40.0, 190.0));
        assert!(!plain.is_empty());
        assert!(accented.len() > plain.len());
        // The accent sits above the top of the plain letter
        let top = |ink: &[(u32, u32)]| ink.iter().map(|&(_, y)| y).min().unwrap_or(0);
        assert!(top(&accented) < top(&plain));
    }

    #[test]
    fn test_larger_font_covers_more() {
        let small = inked(&render("H", 20.0, 190.0)).len();
        let large = inked(&render("H", 40.0, 190.0)).len();
        assert!(large > small * 2);
    }

    #[test]
    fn test_text_wraps_at_width() {
        let renderer = TextRenderer::egui_default().expect("bundled fonts parse");
        let line_height = renderer.line_height(30.0);
        let one_line = inked(&render("HHHH", 30.0, 190.0));
        let wrapped = inked(&render("HHHH", 30.0, 30.0));

        let bottom = |ink: &[(u32, u32)]| ink.iter().map(|&(_, y)| y).max().unwrap_or(0);
        let rightmost = |ink: &[(u32, u32)]| ink.iter().map(|&(x, _)| x).max().unwrap_or(0);
        assert!(bottom(&wrapped) as f32 > bottom(&one_line) as f32 + line_height);
        assert!(rightmost(&wrapped) < rightmost(&one_line));
    }

    #[test]
    fn test_no_fonts_draws_nothing() {
        let renderer = TextRenderer::new(Vec::new());
        let mut target = RgbaImage::new(20, 20);
        assert_eq!(renderer.missing("ab\n"), vec!['a', 'b']);
        renderer.draw_text(&mut target, "ab", Point::new(0.0, 0.0), 12.0, 20.0, BLACK);
        assert!(inked(&target).is_empty());
    }
}
