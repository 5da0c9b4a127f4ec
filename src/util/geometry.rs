// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric primitives and coordinate-space conversions.
//!
//! Two coordinate spaces are in play: the full-resolution model space of the
//! edited image, and the scaled preview space shown on the rendering surface
//! (`preview = model * scale`).

/// A 2D point in surface or model pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Placeholder for "nothing drawn yet".
    pub const SENTINEL: Point = Point { x: -1.0, y: -1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// Clamp the point into `[0, width] x [0, height]`.
    pub fn clamped(self, width: f64, height: f64) -> Self {
        Self {
            x: self.x.clamp(0.0, width.max(0.0)),
            y: self.y.clamp(0.0, height.max(0.0)),
        }
    }
}

/// Integer pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Dimensions after multiplying by `scale`, rounded to whole pixels.
    pub fn scaled(&self, scale: f64) -> Size {
        Size {
            width: (self.width as f64 * scale).round() as u32,
            height: (self.height as f64 * scale).round() as u32,
        }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

/// An axis-aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a rectangle from two opposite corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Square of side `2 * radius` centred on `center`.
    pub fn around(center: Point, radius: f64) -> Self {
        Self::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Multiply every component by `factor`.
    pub fn scaled(&self, factor: f64) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Intersection with `[0, width] x [0, height]`.
    pub fn clamped_to(&self, width: f64, height: f64) -> Rect {
        let x = self.x.clamp(0.0, width);
        let y = self.y.clamp(0.0, height);
        let right = self.right().clamp(0.0, width);
        let bottom = self.bottom().clamp(0.0, height);
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }

    /// Round every edge to the nearest whole pixel.
    pub fn rounded(&self) -> Rect {
        let x = self.x.round();
        let y = self.y.round();
        Rect::new(x, y, self.right().round() - x, self.bottom().round() - y)
    }
}

/// Preview scale for an image of `size` shown inside a `max_width x max_height`
/// viewport. Never upscales.
pub fn fit_scale(size: Size, max_width: u32, max_height: u32) -> f64 {
    if size.is_empty() {
        return 1.0;
    }
    let by_width = max_width as f64 / size.width as f64;
    let by_height = max_height as f64 / size.height as f64;
    by_width.min(by_height).min(1.0)
}

/// Convert a preview-space rectangle into model space.
pub fn preview_to_model(rect: Rect, scale: f64) -> Rect {
    if scale <= 0.0 {
        return rect;
    }
    rect.scaled(1.0 / scale)
}

/// True when `degrees` is a whole number of quarter turns.
pub fn is_quarter_turn(degrees: f64) -> bool {
    (degrees / 90.0 - (degrees / 90.0).round()).abs() < 1e-9
}

/// Bounding box of `size` rotated by `degrees` about its centre.
pub fn rotated_bounds(size: Size, degrees: f64) -> Size {
    if is_quarter_turn(degrees) {
        let quarters = ((degrees / 90.0).round() as i64).rem_euclid(4);
        return if quarters % 2 == 1 {
            Size::new(size.height, size.width)
        } else {
            size
        };
    }
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let w = size.width as f64;
    let h = size.height as f64;
    Size::new(
        (w * cos + h * sin).round() as u32,
        (w * sin + h * cos).round() as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_scale_limits_to_viewport() {
        let scale = fit_scale(Size::new(1200, 800), 643, 400);
        assert!((scale - 0.5).abs() < 1e-12);
        assert_eq!(Size::new(1200, 800).scaled(scale), Size::new(600, 400));
    }

    #[test]
    fn test_fit_scale_never_upscales() {
        assert_eq!(fit_scale(Size::new(100, 50), 643, 400), 1.0);
        assert_eq!(fit_scale(Size::new(0, 50), 643, 400), 1.0);
    }

    #[test]
    fn test_fit_scale_keeps_preview_inside_viewport() {
        for (w, h) in [(1921, 1081), (643, 401), (5000, 17), (17, 5000), (999, 999)] {
            let size = Size::new(w, h);
            let scale = fit_scale(size, 643, 400);
            let preview = size.scaled(scale);
            assert!(scale <= 1.0);
            assert!(preview.width <= 643, "{w}x{h} -> {preview:?}");
            assert!(preview.height <= 400, "{w}x{h} -> {preview:?}");
        }
    }

    #[test]
    fn test_preview_to_model_divides_by_scale() {
        let preview = Rect::new(10.0, 10.0, 580.0, 380.0);
        let model = preview_to_model(preview, 0.5);
        assert_eq!(model, Rect::new(20.0, 20.0, 1160.0, 760.0));
        assert_eq!(preview_to_model(preview, 0.0), preview);
    }

    #[test]
    fn test_rect_from_corners_normalises() {
        let r = Rect::from_corners(Point::new(150.0, 120.0), Point::new(50.0, 50.0));
        assert_eq!(r, Rect::new(50.0, 50.0, 100.0, 70.0));
    }

    #[test]
    fn test_rotated_bounds() {
        assert_eq!(rotated_bounds(Size::new(600, 400), 90.0), Size::new(400, 600));
        assert_eq!(rotated_bounds(Size::new(600, 400), -270.0), Size::new(400, 600));
        assert_eq!(rotated_bounds(Size::new(600, 400), 180.0), Size::new(600, 400));
        // 45 degrees keeps the whole rotated content
        let diag = rotated_bounds(Size::new(100, 100), 45.0);
        assert_eq!(diag, Size::new(141, 141));
    }
}
