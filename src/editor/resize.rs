// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Positioning mode shown after a resize is staged.
//!
//! The staged image is shown 1:1. On an axis where it is at least as large
//! as the viewport the user can pan it, and the pan is clamped so no empty
//! margin appears. On an axis where it is smaller the viewport shrinks to
//! the content and the offset stays at zero.

use crate::util::geometry::{Point, Size};

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeView {
    content: Size,
    viewport: Size,
    /// Where the drag started
    start_point: Point,
    /// Offset of the content when the drag started
    start_position: Point,
    /// Pointer travel of the current drag
    distance: Point,
    dragging: bool,
}

impl ResizeView {
    /// Show `content` inside a viewport of at most `max`.
    pub fn open(content: Size, max: Size) -> Self {
        let viewport = Size::new(content.width.min(max.width), content.height.min(max.height));
        log::debug!("Resize view {:?} in {:?}", content, viewport);
        Self {
            content,
            viewport,
            start_point: Point::default(),
            start_position: Point::default(),
            distance: Point::default(),
            dragging: false,
        }
    }

    pub fn content(&self) -> Size {
        self.content
    }

    /// Size the surface takes while positioning.
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn pointer_down(&mut self, p: Point) {
        self.dragging = true;
        self.start_point = p;
        self.distance = Point::default();
    }

    /// Pan with the pointer. Returns true when the view must be redrawn.
    pub fn pointer_move(&mut self, p: Point) -> bool {
        if !self.dragging {
            return false;
        }
        let before = self.offset();
        self.distance = Point::new(p.x - self.start_point.x, p.y - self.start_point.y);
        self.offset() != before
    }

    pub fn pointer_up(&mut self) {
        self.finish_drag();
    }

    /// Leaving the surface ends the drag where it is.
    pub fn pointer_leave(&mut self) {
        self.finish_drag();
    }

    fn finish_drag(&mut self) {
        if !self.dragging {
            return;
        }
        self.start_position = self.offset();
        self.distance = Point::default();
        self.dragging = false;
    }

    /// Top-left of the content relative to the viewport.
    pub fn offset(&self) -> Point {
        Point::new(
            clamp_axis(
                self.start_position.x + self.distance.x,
                self.content.width,
                self.viewport.width,
            ),
            clamp_axis(
                self.start_position.y + self.distance.y,
                self.content.height,
                self.viewport.height,
            ),
        )
    }
}

fn clamp_axis(value: f64, content: u32, viewport: u32) -> f64 {
    if content >= viewport {
        value.clamp(viewport as f64 - content as f64, 0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn large() -> ResizeView {
        ResizeView::open(Size::new(1000, 300), Size::new(643, 400))
    }

    #[test]
    fn test_viewport_limits_each_axis() {
        let view = large();
        assert_eq!(view.viewport(), Size::new(643, 300));
        assert_eq!(view.offset(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_pan_is_clamped_to_content() {
        let mut view = large();
        view.pointer_down(Point::new(300.0, 100.0));
        assert!(view.pointer_move(Point::new(100.0, 50.0)));
        assert_eq!(view.offset(), Point::new(-200.0, 0.0));

        // Dragging right past the left edge reveals nothing
        assert!(view.pointer_move(Point::new(400.0, 100.0)));
        assert_eq!(view.offset(), Point::new(0.0, 0.0));

        view.pointer_move(Point::new(-1000.0, 100.0));
        assert_eq!(view.offset(), Point::new(-357.0, 0.0));
        view.pointer_up();

        view.pointer_down(Point::new(0.0, 0.0));
        view.pointer_move(Point::new(-50.0, 0.0));
        assert_eq!(view.offset(), Point::new(-357.0, 0.0));
    }

    #[test]
    fn test_leave_folds_drag_into_position() {
        let mut view = large();
        view.pointer_down(Point::new(300.0, 100.0));
        view.pointer_move(Point::new(250.0, 100.0));
        view.pointer_leave();
        assert!(!view.is_dragging());
        assert!(!view.pointer_move(Point::new(0.0, 0.0)));

        view.pointer_down(Point::new(300.0, 100.0));
        view.pointer_move(Point::new(290.0, 100.0));
        assert_eq!(view.offset(), Point::new(-60.0, 0.0));
    }

    #[test]
    fn test_small_content_is_fixed() {
        let mut view = ResizeView::open(Size::new(200, 100), Size::new(643, 400));
        assert_eq!(view.viewport(), Size::new(200, 100));
        view.pointer_down(Point::new(10.0, 10.0));
        assert!(!view.pointer_move(Point::new(60.0, 60.0)));
        assert_eq!(view.offset(), Point::new(0.0, 0.0));
    }
}
