// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Rectangle annotation: a stroked box with corner resize handles.

use super::annotation::{AnnotationShape, AnnotationState, Handle};
use crate::io::config::AnnotationStyle;
use crate::render::surface::RenderSurface;
use crate::util::geometry::{Point, Rect, Size};
use image::Rgba;

/// Extra grab tolerance around a handle square.
const HIT_SLOP: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct RectangleAnnotation {
    state: AnnotationState,
    style: AnnotationStyle,
}

impl RectangleAnnotation {
    pub fn new(bounds: Size, style: AnnotationStyle) -> Self {
        Self {
            state: AnnotationState::new(bounds),
            style,
        }
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    pub fn rect(&self) -> Option<Rect> {
        self.state.rect()
    }

    /// Pointer is not over any handle.
    pub fn is_none_point(&self) -> bool {
        self.state.is_none_point()
    }

    /// Centres of the eight drawn handles: corners, then edge midpoints.
    pub fn handle_centers(&self) -> Vec<Point> {
        let Some(r) = self.rect() else {
            return Vec::new();
        };
        let c = r.center();
        vec![
            Point::new(r.x, r.y),
            Point::new(r.right(), r.y),
            Point::new(r.right(), r.bottom()),
            Point::new(r.x, r.bottom()),
            Point::new(c.x, r.y),
            Point::new(r.right(), c.y),
            Point::new(c.x, r.bottom()),
            Point::new(r.x, c.y),
        ]
    }
}

impl AnnotationShape for RectangleAnnotation {
    fn state(&self) -> &AnnotationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AnnotationState {
        &mut self.state
    }

    fn draw(&self, surface: &mut dyn RenderSurface) {
        if let Some(rect) = self.rect() {
            surface.stroke_rect(rect, self.style.stroke_width, self.style.stroke());
        }
    }

    fn draw_handles(&self, surface: &mut dyn RenderSurface) {
        let half = self.style.handle_size / 2.0;
        for center in self.handle_centers() {
            let square = Rect::around(center, half);
            surface.fill_rect(square, self.style.handle());
            surface.stroke_rect(square, 1.0, Rgba([0, 0, 0, 255]));
        }
    }

    fn hit_test(&self, p: Point) -> Option<Handle> {
        let rect = self.rect()?;
        let radius = self.style.handle_size / 2.0 + HIT_SLOP;
        Handle::CORNERS
            .into_iter()
            .find(|&handle| Rect::around(self.state.handle_position(handle), radius).contains(p))
            .or_else(|| rect.contains(p).then_some(Handle::Body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::raster::RasterSurface;

    fn drawn() -> RectangleAnnotation {
        let mut annotation =
            RectangleAnnotation::new(Size::new(600, 400), AnnotationStyle::default());
        annotation.state_mut().set_start_point(Point::new(50.0, 50.0));
        annotation.state_mut().move_end_point(Point::new(150.0, 120.0));
        annotation
    }

    #[test]
    fn test_hit_test_names_handles() {
        let annotation = drawn();
        assert_eq!(annotation.hit_test(Point::new(51.0, 49.0)), Some(Handle::LeftTop));
        assert_eq!(annotation.hit_test(Point::new(150.0, 120.0)), Some(Handle::RightBottom));
        assert_eq!(annotation.hit_test(Point::new(50.0, 120.0)), Some(Handle::Start));
        assert_eq!(annotation.hit_test(Point::new(148.0, 52.0)), Some(Handle::End));
        assert_eq!(annotation.hit_test(Point::new(100.0, 85.0)), Some(Handle::Body));
        assert_eq!(annotation.hit_test(Point::new(300.0, 300.0)), None);
    }

    #[test]
    fn test_eight_handles_drawn() {
        let annotation = drawn();
        assert_eq!(annotation.handle_centers().len(), 8);

        let mut surface = RasterSurface::new(600, 400);
        annotation.draw(&mut surface);
        annotation.draw_handles(&mut surface);
        // Midpoint handle of the top edge is white
        assert_eq!(*surface.image().get_pixel(100, 50), Rgba([255, 255, 255, 255]));
        // Stroke away from handles is red
        assert_eq!(*surface.image().get_pixel(75, 50), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_nothing_drawn_before_placement() {
        let annotation = RectangleAnnotation::new(Size::new(10, 10), AnnotationStyle::default());
        let mut surface = RasterSurface::new(10, 10);
        annotation.draw(&mut surface);
        assert!(annotation.handle_centers().is_empty());
        assert!(surface.image().pixels().all(|p| p[3] == 0));
        assert_eq!(annotation.hit_test(Point::new(5.0, 5.0)), None);
    }
}
