// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Software rendering surface backed by an RGBA pixel buffer.
//!
//! Every drawing primitive works by inverse-mapping destination pixel centres
//! through the current affine transform, which keeps rotated blits and fills
//! on the same code path as axis-aligned ones.

use super::surface::RenderSurface;
use crate::io::media;
use crate::util::geometry::{Point, Rect, Size};
use anyhow::Result;
use image::{Rgba, RgbaImage};
use std::sync::mpsc::{channel, Receiver};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Canvas-style affine transform `(a, b, c, d, e, f)`:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// `self * other`: apply `other` first, then `self`.
    fn then(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Affine {
        self.then(&Affine {
            e: dx,
            f: dy,
            ..Affine::IDENTITY
        })
    }

    pub fn rotated(&self, radians: f64) -> Affine {
        let (sin, cos) = radians.sin_cos();
        self.then(&Affine {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn inverse(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

/// Source-over blend of `src` onto `dst`, scaled by `coverage` (0..=1).
pub fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let sa = src[3] as f32 / 255.0 * coverage;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = TRANSPARENT;
        return;
    }
    for i in 0..3 {
        let s = src[i] as f32 / 255.0;
        let d = dst[i] as f32 / 255.0;
        let c = (s * sa + d * da * (1.0 - sa)) / out_a;
        dst[i] = (c * 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

/// Visit every target pixel whose centre falls inside `local` once mapped
/// through `transform`. The callback receives the pixel and the local-space
/// coordinates of its centre.
fn for_each_covered(
    target: &mut RgbaImage,
    local: Rect,
    transform: &Affine,
    mut visit: impl FnMut(&mut Rgba<u8>, Point),
) {
    if local.is_empty() {
        return;
    }
    let Some(inverse) = transform.inverse() else {
        return;
    };

    let corners = [
        transform.apply(Point::new(local.x, local.y)),
        transform.apply(Point::new(local.right(), local.y)),
        transform.apply(Point::new(local.right(), local.bottom())),
        transform.apply(Point::new(local.x, local.bottom())),
    ];
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let (width, height) = target.dimensions();
    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil().max(0.0) as u32).min(width);
    let y1 = (max_y.ceil().max(0.0) as u32).min(height);

    for py in y0..y1 {
        for px in x0..x1 {
            let p = inverse.apply(Point::new(px as f64 + 0.5, py as f64 + 0.5));
            if p.x >= local.x && p.x < local.right() && p.y >= local.y && p.y < local.bottom() {
                visit(target.get_pixel_mut(px, py), p);
            }
        }
    }
}

/// Fill `rect` (in local space) with `color`.
pub fn fill_rect(target: &mut RgbaImage, rect: Rect, color: Rgba<u8>, transform: &Affine) {
    for_each_covered(target, rect, transform, |pixel, _| blend(pixel, color, 1.0));
}

/// Outline `rect` with a stroke of `width` pixels drawn inside its edges.
pub fn stroke_rect(
    target: &mut RgbaImage,
    rect: Rect,
    width: f64,
    color: Rgba<u8>,
    transform: &Affine,
) {
    let w = width.min(rect.width / 2.0).min(rect.height / 2.0).max(1.0);
    let sides = [
        Rect::new(rect.x, rect.y, rect.width, w),
        Rect::new(rect.x, rect.bottom() - w, rect.width, w),
        Rect::new(rect.x, rect.y + w, w, rect.height - 2.0 * w),
        Rect::new(rect.right() - w, rect.y + w, w, rect.height - 2.0 * w),
    ];
    for side in sides {
        fill_rect(target, side, color, transform);
    }
}

/// Make `rect` (in local space) fully transparent.
pub fn clear_rect(target: &mut RgbaImage, rect: Rect, transform: &Affine) {
    for_each_covered(target, rect, transform, |pixel, _| *pixel = TRANSPARENT);
}

/// Draw the `src` region of `source` into `dst`, nearest-neighbour sampled.
pub fn draw_image(
    target: &mut RgbaImage,
    source: &RgbaImage,
    src: Rect,
    dst: Rect,
    transform: &Affine,
) {
    if src.is_empty() || dst.is_empty() {
        return;
    }
    let (sw, sh) = source.dimensions();
    let sx = src.width / dst.width;
    let sy = src.height / dst.height;

    for_each_covered(target, dst, transform, |pixel, p| {
        let u = (src.x + (p.x - dst.x) * sx).floor();
        let v = (src.y + (p.y - dst.y) * sy).floor();
        if u < 0.0 || v < 0.0 || u >= sw as f64 || v >= sh as f64 {
            return;
        }
        blend(pixel, *source.get_pixel(u as u32, v as u32), 1.0);
    });
}

/// Software [`RenderSurface`].
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    transform: Affine,
    saved: Vec<Affine>,
    /// Bumped on every mutation so viewers know when to re-upload
    revision: u64,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            transform: Affine::IDENTITY,
            saved: Vec::new(),
            revision: 0,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl RenderSurface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
        self.transform = Affine::IDENTITY;
        self.saved.clear();
        self.touch();
    }

    fn clear(&mut self, region: Rect) {
        clear_rect(&mut self.image, region, &self.transform);
        self.touch();
    }

    fn blit(&mut self, source: &RgbaImage, src: Rect, dst: Rect) {
        draw_image(&mut self.image, source, src, dst, &self.transform);
        self.touch();
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        fill_rect(&mut self.image, rect, color, &self.transform);
        self.touch();
    }

    fn stroke_rect(&mut self, rect: Rect, width: f64, color: Rgba<u8>) {
        stroke_rect(&mut self.image, rect, width, color, &self.transform);
        self.touch();
    }

    fn save(&mut self) {
        self.saved.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.saved.pop() {
            self.transform = transform;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform = self.transform.translated(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.transform = self.transform.rotated(radians);
    }

    fn reset_transform(&mut self) {
        self.transform = Affine::IDENTITY;
    }

    fn to_encoded_blob(&self) -> Receiver<Result<Vec<u8>>> {
        let (sender, receiver) = channel();
        let pixels = self.image.clone();

        std::thread::spawn(move || {
            let result = media::encode_png(&pixels);
            if let Ok(ref bytes) = result {
                log::info!(
                    "Encoded {}x{} export ({} bytes)",
                    pixels.width(),
                    pixels.height(),
                    bytes.len()
                );
            }
            let _ = sender.send(result);
        });

        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn test_fill_and_clear() {
        let mut surface = RasterSurface::new(10, 10);
        surface.fill_rect(Rect::new(2.0, 2.0, 4.0, 4.0), RED);
        assert_eq!(*surface.image().get_pixel(3, 3), RED);
        assert_eq!(surface.image().get_pixel(7, 7)[3], 0);

        surface.clear(Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(surface.image().get_pixel(3, 3)[3], 0);
        assert_eq!(*surface.image().get_pixel(5, 5), RED);
    }

    #[test]
    fn test_blit_scales_source() {
        let source = RgbaImage::from_fn(4, 4, |x, _| if x < 2 { RED } else { BLUE });
        let mut surface = RasterSurface::new(8, 8);
        surface.blit(&source, Rect::new(0.0, 0.0, 4.0, 4.0), Rect::new(0.0, 0.0, 8.0, 8.0));
        assert_eq!(*surface.image().get_pixel(3, 0), RED);
        assert_eq!(*surface.image().get_pixel(4, 7), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_half_alpha_dims_pixels() {
        let mut surface = RasterSurface::new(1, 1);
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba([255, 255, 255, 255]));
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba([0, 0, 0, 128]));
        let px = surface.image().get_pixel(0, 0);
        assert_eq!(px[3], 255);
        assert!((126..=128).contains(&px[0]), "{px:?}");
    }

    #[test]
    fn test_rotated_blit_quarter_turn() {
        // 2x1 source: red then blue; rotate 90 degrees clockwise about the centre
        let source = RgbaImage::from_fn(2, 1, |x, _| if x == 0 { RED } else { BLUE });
        let mut surface = RasterSurface::new(1, 2);
        surface.save();
        surface.translate(0.5, 1.0);
        surface.rotate(std::f64::consts::FRAC_PI_2);
        surface.blit(&source, Rect::new(0.0, 0.0, 2.0, 1.0), Rect::new(-1.0, -0.5, 2.0, 1.0));
        surface.restore();

        assert_eq!(*surface.image().get_pixel(0, 0), RED);
        assert_eq!(*surface.image().get_pixel(0, 1), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_set_size_resets_transform_and_pixels() {
        let mut surface = RasterSurface::new(4, 4);
        surface.translate(100.0, 100.0);
        surface.set_size(2, 2);
        surface.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), RED);
        assert_eq!(*surface.image().get_pixel(1, 1), RED);
    }

    #[test]
    fn test_encoded_blob_is_png() {
        let mut surface = RasterSurface::new(3, 2);
        surface.fill_rect(Rect::new(0.0, 0.0, 3.0, 2.0), RED);
        let bytes = surface
            .to_encoded_blob()
            .recv()
            .expect("encoder thread hung up")
            .expect("encoding failed");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
