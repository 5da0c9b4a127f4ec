// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Text annotation: a placed box that hosts a text-input overlay.
//!
//! Pointer input for a text annotation arrives through its own overlay
//! region rather than the surface. The region is identified by a number
//! that changes whenever the region is rebuilt.

use super::annotation::{AnnotationShape, AnnotationState, Handle};
use crate::io::config::AnnotationStyle;
use crate::render::surface::RenderSurface;
use crate::util::geometry::{Point, Rect, Size};

const DASH: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct TextAnnotation {
    state: AnnotationState,
    style: AnnotationStyle,
    text: String,
    area: u32,
}

impl TextAnnotation {
    pub fn new(bounds: Size, style: AnnotationStyle) -> Self {
        Self {
            state: AnnotationState::new(bounds),
            style,
            text: String::new(),
            area: 0,
        }
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    pub fn rect(&self) -> Option<Rect> {
        self.state.rect()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Identifier of the overlay region receiving pointer input.
    pub fn area(&self) -> u32 {
        self.area
    }

    /// Replace the overlay region; returns the new identifier.
    pub fn recreate_area(&mut self) -> u32 {
        self.area = self.area.wrapping_add(1);
        self.area
    }
}

impl AnnotationShape for TextAnnotation {
    fn state(&self) -> &AnnotationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AnnotationState {
        &mut self.state
    }

    /// Dashed placement box.
    fn draw(&self, surface: &mut dyn RenderSurface) {
        let Some(r) = self.rect() else {
            return;
        };
        let color = self.style.stroke();

        let mut x = r.x;
        while x < r.right() {
            let len = DASH.min(r.right() - x);
            surface.fill_rect(Rect::new(x, r.y, len, 1.0), color);
            surface.fill_rect(Rect::new(x, r.bottom() - 1.0, len, 1.0), color);
            x += DASH * 2.0;
        }
        let mut y = r.y;
        while y < r.bottom() {
            let len = DASH.min(r.bottom() - y);
            surface.fill_rect(Rect::new(r.x, y, 1.0, len), color);
            surface.fill_rect(Rect::new(r.right() - 1.0, y, 1.0, len), color);
            y += DASH * 2.0;
        }
    }

    /// The overlay takes the place of handles.
    fn draw_handles(&self, _surface: &mut dyn RenderSurface) {}

    fn hit_test(&self, p: Point) -> Option<Handle> {
        self.rect()?.contains(p).then_some(Handle::Body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::raster::RasterSurface;

    #[test]
    fn test_dashed_box() {
        let mut annotation = TextAnnotation::new(Size::new(40, 40), AnnotationStyle::default());
        annotation.state_mut().set_start_point(Point::new(0.0, 0.0));
        annotation.state_mut().move_end_point(Point::new(20.0, 10.0));

        let mut surface = RasterSurface::new(40, 40);
        annotation.draw(&mut surface);
        assert_eq!(surface.image().get_pixel(1, 0)[3], 255);
        assert_eq!(surface.image().get_pixel(5, 0)[3], 0);
        assert_eq!(surface.image().get_pixel(10, 5)[3], 0);
    }

    #[test]
    fn test_only_body_is_hit() {
        let mut annotation = TextAnnotation::new(Size::new(40, 40), AnnotationStyle::default());
        assert_eq!(annotation.hit_test(Point::new(5.0, 5.0)), None);
        annotation.state_mut().set_start_point(Point::new(0.0, 0.0));
        annotation.state_mut().move_end_point(Point::new(20.0, 10.0));
        assert_eq!(annotation.hit_test(Point::new(5.0, 5.0)), Some(Handle::Body));
        assert_eq!(annotation.hit_test(Point::new(25.0, 5.0)), None);
    }

    #[test]
    fn test_recreate_area_changes_identifier() {
        let mut annotation = TextAnnotation::new(Size::new(40, 40), AnnotationStyle::default());
        let before = annotation.area();
        assert_ne!(annotation.recreate_area(), before);
    }
}
