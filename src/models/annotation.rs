// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation draw/edit state machine.
//!
//! An annotation starts in draw mode. A press-drag-release places it
//! directly; a click without movement switches to click placement, where a
//! second click fixes the opposite corner. Once placed it enters edit mode,
//! where its handles can be dragged until it is saved or cleared.

use super::rectangle::RectangleAnnotation;
use super::text::TextAnnotation;
use crate::render::surface::RenderSurface;
use crate::util::cursor::Cursor;
use crate::util::geometry::{Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Draw,
    Edit,
}

/// Progress of placement while in draw mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPhase {
    /// Nothing placed yet
    Empty,
    /// Pointer pressed; the end point follows the pointer
    Dragging,
    /// First corner fixed by a click; waiting for the second click
    ClickPlaced,
}

/// Hit-testable part of an annotation.
///
/// Corner handles sit at `LeftTop = (start.x, start.y)`,
/// `RightBottom = (end.x, end.y)`, `Start = (start.x, end.y)` and
/// `End = (end.x, start.y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Start,
    LeftTop,
    RightBottom,
    End,
    Body,
}

impl Handle {
    pub const CORNERS: [Handle; 4] =
        [Handle::LeftTop, Handle::RightBottom, Handle::Start, Handle::End];
}

/// What a pointer event did to the annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed
    None,
    /// A drag started (draw) or a handle was engaged (edit)
    Pressed,
    /// Geometry changed and should be re-rendered
    Preview,
    /// Hover state changed only
    Hover,
    /// A click without movement switched to click placement
    ClickPlaced,
    /// Placement finished; the annotation is now in edit mode
    Committed,
    /// A handle drag finished
    DragEnded,
}

/// State shared by every annotation variant, in surface pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationState {
    pub mode: Mode,
    pub phase: DrawPhase,
    pub start: Point,
    pub end: Point,
    /// Handle being dragged in edit mode
    pub point: Option<Handle>,
    /// Handle under the pointer in edit mode
    pub hover: Option<Handle>,
    /// Start and end have crossed on exactly one axis
    pub invert: bool,
    /// Last pointer position during a body drag
    grab: Point,
    bounds: Size,
}

impl AnnotationState {
    pub fn new(bounds: Size) -> Self {
        Self {
            mode: Mode::Draw,
            phase: DrawPhase::Empty,
            start: Point::SENTINEL,
            end: Point::SENTINEL,
            point: None,
            hover: None,
            invert: false,
            grab: Point::SENTINEL,
            bounds,
        }
    }

    pub fn set_bounds(&mut self, bounds: Size) {
        self.bounds = bounds;
    }

    pub fn is_click_mode(&self) -> bool {
        self.phase == DrawPhase::ClickPlaced
    }

    /// True when no handle is engaged or hovered.
    pub fn is_none_point(&self) -> bool {
        self.point.is_none() && self.hover.is_none()
    }

    pub fn is_placed(&self) -> bool {
        !self.start.is_sentinel() && !self.end.is_sentinel()
    }

    fn clamp(&self, p: Point) -> Point {
        p.clamped(self.bounds.width as f64, self.bounds.height as f64)
    }

    /// Anchor both corners at `p`.
    pub fn set_start_point(&mut self, p: Point) {
        let p = self.clamp(p);
        self.start = p;
        self.end = p;
    }

    pub fn move_end_point(&mut self, p: Point) {
        self.end = self.clamp(p);
        self.update_invert();
    }

    /// Normalised rectangle, or None while nothing is placed.
    pub fn rect(&self) -> Option<Rect> {
        self.is_placed().then(|| Rect::from_corners(self.start, self.end))
    }

    pub fn handle_position(&self, handle: Handle) -> Point {
        match handle {
            Handle::LeftTop => self.start,
            Handle::RightBottom => self.end,
            Handle::Start => Point::new(self.start.x, self.end.y),
            Handle::End => Point::new(self.end.x, self.start.y),
            Handle::Body => Rect::from_corners(self.start, self.end).center(),
        }
    }

    /// Inverted when exactly one axis has crossed. Crossing both mirrors the
    /// rectangle onto the same diagonal, so the glyph must not flip.
    fn update_invert(&mut self) {
        self.invert = (self.start.x > self.end.x) != (self.start.y > self.end.y);
    }

    /// Move the engaged handle to `p`. Each corner owns one x and one y
    /// coordinate, so the diagonally opposite corner never moves.
    pub fn calculate_position(&mut self, p: Point) {
        let p = self.clamp(p);
        match self.point {
            Some(Handle::LeftTop) => self.start = p,
            Some(Handle::RightBottom) => self.end = p,
            Some(Handle::Start) => {
                self.start.x = p.x;
                self.end.y = p.y;
            }
            Some(Handle::End) => {
                self.end.x = p.x;
                self.start.y = p.y;
            }
            Some(Handle::Body) => {
                let rect = Rect::from_corners(self.start, self.end);
                let max_dx = self.bounds.width as f64 - rect.right();
                let max_dy = self.bounds.height as f64 - rect.bottom();
                let dx = (p.x - self.grab.x).clamp(-rect.x, max_dx.max(-rect.x));
                let dy = (p.y - self.grab.y).clamp(-rect.y, max_dy.max(-rect.y));
                self.start = Point::new(self.start.x + dx, self.start.y + dy);
                self.end = Point::new(self.end.x + dx, self.end.y + dy);
                self.grab = p;
            }
            None => return,
        }
        self.update_invert();
    }

    /// Cursor for the engaged or hovered handle.
    pub fn cursor(&self) -> Cursor {
        let Some(handle) = self.point.or(self.hover) else {
            return Cursor::Auto;
        };
        let (regular, inverted) = match handle {
            Handle::Start | Handle::End => (Cursor::NeswResize, Cursor::NwseResize),
            Handle::LeftTop | Handle::RightBottom => (Cursor::NwseResize, Cursor::NeswResize),
            Handle::Body => return Cursor::Move,
        };
        if self.invert {
            inverted
        } else {
            regular
        }
    }

    /// Back to an empty draw-mode annotation.
    pub fn clear(&mut self) {
        *self = Self::new(self.bounds);
    }

    fn finish_placement(&mut self) -> Transition {
        self.mode = Mode::Edit;
        self.phase = DrawPhase::Empty;
        self.point = None;
        self.hover = None;
        self.update_invert();
        log::debug!("Annotation placed at {:?} -> {:?}", self.start, self.end);
        Transition::Committed
    }

    /// Pointer pressed on the annotation's region; `hit` is the handle
    /// under the pointer.
    pub fn pointer_down(&mut self, p: Point, hit: Option<Handle>) -> Transition {
        match self.mode {
            Mode::Draw => {
                if self.is_click_mode() {
                    return Transition::None;
                }
                self.set_start_point(p);
                self.phase = DrawPhase::Dragging;
                Transition::Pressed
            }
            Mode::Edit => {
                self.point = hit;
                self.grab = self.clamp(p);
                if hit.is_some() {
                    Transition::Pressed
                } else {
                    Transition::None
                }
            }
        }
    }

    /// Pointer moved over the annotation's region.
    pub fn pointer_move(
        &mut self,
        p: Point,
        primary_held: bool,
        hit: Option<Handle>,
    ) -> Transition {
        match self.mode {
            Mode::Draw => {
                if self.phase != DrawPhase::Dragging {
                    return Transition::None;
                }
                self.move_end_point(p);
                Transition::Preview
            }
            Mode::Edit => {
                if self.point.is_none() {
                    self.hover = hit;
                    return Transition::Hover;
                }
                if !primary_held {
                    return Transition::Hover;
                }
                self.calculate_position(p);
                Transition::Preview
            }
        }
    }

    /// Pointer released over the annotation's region.
    pub fn pointer_up(&mut self, p: Point) -> Transition {
        match self.mode {
            Mode::Draw => match self.phase {
                DrawPhase::Empty => Transition::None,
                _ if self.start == self.clamp(p) => {
                    self.set_start_point(p);
                    self.phase = DrawPhase::ClickPlaced;
                    log::debug!("Click placement at {:?}", self.start);
                    Transition::ClickPlaced
                }
                _ => {
                    self.move_end_point(p);
                    self.finish_placement()
                }
            },
            Mode::Edit => {
                if self.point.is_none() {
                    return Transition::None;
                }
                self.calculate_position(p);
                self.point = None;
                Transition::DragEnded
            }
        }
    }

    /// Pointer released somewhere else in the document. A drag that left
    /// the surface is finished exactly as if it had been released on it.
    pub fn release_outside(&mut self, on_surface: bool) -> Transition {
        if on_surface {
            return Transition::None;
        }
        match self.mode {
            Mode::Draw if self.phase == DrawPhase::Dragging => self.finish_placement(),
            Mode::Edit if self.point.is_some() => {
                self.point = None;
                Transition::DragEnded
            }
            _ => Transition::None,
        }
    }
}

/// Capabilities every annotation variant provides.
pub trait AnnotationShape {
    fn state(&self) -> &AnnotationState;

    fn state_mut(&mut self) -> &mut AnnotationState;

    /// Render the shape itself.
    fn draw(&self, surface: &mut dyn RenderSurface);

    /// Render edit-mode handles.
    fn draw_handles(&self, surface: &mut dyn RenderSurface);

    fn hit_test(&self, p: Point) -> Option<Handle>;
}

/// The annotation currently being drawn or edited.
#[derive(Debug, Clone)]
pub enum Annotation {
    Rectangle(RectangleAnnotation),
    Text(TextAnnotation),
}

impl Annotation {
    pub fn shape(&self) -> &dyn AnnotationShape {
        match self {
            Annotation::Rectangle(rect) => rect,
            Annotation::Text(text) => text,
        }
    }

    pub fn shape_mut(&mut self) -> &mut dyn AnnotationShape {
        match self {
            Annotation::Rectangle(rect) => rect,
            Annotation::Text(text) => text,
        }
    }

    pub fn state(&self) -> &AnnotationState {
        self.shape().state()
    }

    pub fn state_mut(&mut self) -> &mut AnnotationState {
        self.shape_mut().state_mut()
    }

    pub fn mode(&self) -> Mode {
        self.state().mode
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Annotation::Text(_))
    }

    pub fn draw(&self, surface: &mut dyn RenderSurface) {
        self.shape().draw(surface);
    }

    pub fn draw_handles(&self, surface: &mut dyn RenderSurface) {
        self.shape().draw_handles(surface);
    }

    pub fn pointer_down(&mut self, p: Point) -> Transition {
        let hit = self.shape().hit_test(p);
        self.state_mut().pointer_down(p, hit)
    }

    pub fn pointer_move(&mut self, p: Point, primary_held: bool) -> Transition {
        let hit = self.shape().hit_test(p);
        self.state_mut().pointer_move(p, primary_held, hit)
    }

    pub fn pointer_up(&mut self, p: Point) -> Transition {
        self.state_mut().pointer_up(p)
    }

    pub fn release_outside(&mut self, on_surface: bool) -> Transition {
        self.state_mut().release_outside(on_surface)
    }

    /// Reset geometry to the sentinel and return to draw mode.
    pub fn clear(&mut self) {
        self.state_mut().clear();
        if let Annotation::Text(text) = self {
            text.set_text(String::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AnnotationState {
        AnnotationState::new(Size::new(600, 400))
    }

    fn placed(start: Point, end: Point) -> AnnotationState {
        let mut s = state();
        s.pointer_down(start, None);
        s.pointer_move(end, true, None);
        assert_eq!(s.pointer_up(end), Transition::Committed);
        s
    }

    #[test]
    fn test_drag_places_and_enters_edit() {
        let s = placed(Point::new(50.0, 50.0), Point::new(150.0, 120.0));
        assert_eq!(s.mode, Mode::Edit);
        assert_eq!(s.start, Point::new(50.0, 50.0));
        assert_eq!(s.end, Point::new(150.0, 120.0));
        assert!(!s.invert);
        assert!(s.point.is_none());
    }

    #[test]
    fn test_sentinels_until_pressed() {
        let mut s = state();
        assert!(s.start.is_sentinel() && s.end.is_sentinel());
        assert_eq!(s.pointer_move(Point::new(10.0, 10.0), false, None), Transition::None);
        assert!(s.rect().is_none());
        s.pointer_down(Point::new(10.0, 10.0), None);
        assert_eq!(s.start, s.end);
    }

    #[test]
    fn test_click_then_click_places() {
        let mut s = state();
        s.pointer_down(Point::new(30.0, 30.0), None);
        assert_eq!(s.pointer_up(Point::new(30.0, 30.0)), Transition::ClickPlaced);
        assert!(s.is_click_mode());

        // Moving without a drag does not resize in click placement
        assert_eq!(s.pointer_move(Point::new(90.0, 90.0), false, None), Transition::None);
        assert_eq!(s.pointer_down(Point::new(90.0, 90.0), None), Transition::None);
        assert_eq!(s.pointer_up(Point::new(90.0, 90.0)), Transition::Committed);
        assert_eq!(s.rect(), Some(Rect::new(30.0, 30.0, 60.0, 60.0)));
    }

    #[test]
    fn test_release_off_surface_commits_drag() {
        let mut s = state();
        s.pointer_down(Point::new(500.0, 300.0), None);
        s.pointer_move(Point::new(640.0, 390.0), true, None);
        assert_eq!(s.release_outside(true), Transition::None);
        assert_eq!(s.release_outside(false), Transition::Committed);
        assert_eq!(s.mode, Mode::Edit);
        // The tracked end point was clamped to the surface
        assert_eq!(s.end, Point::new(600.0, 390.0));
    }

    #[test]
    fn test_release_outside_ignored_in_click_mode() {
        let mut s = state();
        s.pointer_down(Point::new(30.0, 30.0), None);
        s.pointer_up(Point::new(30.0, 30.0));
        assert_eq!(s.release_outside(false), Transition::None);
        assert_eq!(s.mode, Mode::Draw);
    }

    #[test]
    fn test_corner_drag_keeps_opposite_corner() {
        let origin = placed(Point::new(50.0, 50.0), Point::new(150.0, 120.0));
        let opposite = |h: Handle| match h {
            Handle::LeftTop => Handle::RightBottom,
            Handle::RightBottom => Handle::LeftTop,
            Handle::Start => Handle::End,
            _ => Handle::Start,
        };

        for handle in Handle::CORNERS {
            let mut s = origin.clone();
            let fixed = s.handle_position(opposite(handle));
            s.pointer_down(s.handle_position(handle), Some(handle));
            s.pointer_move(Point::new(300.0, 10.0), true, None);
            s.pointer_up(Point::new(310.0, 5.0));
            assert_eq!(s.handle_position(opposite(handle)), fixed, "{:?}", handle);
            assert!(s.point.is_none());
        }
    }

    #[test]
    fn test_crossing_flips_cursor() {
        let mut s = placed(Point::new(50.0, 50.0), Point::new(150.0, 120.0));
        s.hover = Some(Handle::Start);
        assert_eq!(s.cursor(), Cursor::NeswResize);
        s.hover = None;

        s.pointer_down(s.handle_position(Handle::End), Some(Handle::End));
        s.pointer_move(Point::new(40.0, 30.0), true, None);
        assert!(s.invert);
        s.pointer_up(Point::new(40.0, 30.0));

        s.hover = Some(Handle::Start);
        assert_eq!(s.cursor(), Cursor::NwseResize);
    }

    #[test]
    fn test_crossing_both_axes_keeps_cursor() {
        let mut s = placed(Point::new(50.0, 50.0), Point::new(150.0, 120.0));
        s.pointer_down(s.end, Some(Handle::RightBottom));
        s.pointer_move(Point::new(20.0, 20.0), true, None);
        assert!(!s.invert);
        assert_eq!(s.cursor(), Cursor::NwseResize);
    }

    #[test]
    fn test_move_without_button_does_not_resize() {
        let mut s = placed(Point::new(50.0, 50.0), Point::new(150.0, 120.0));
        s.pointer_down(s.end, Some(Handle::RightBottom));
        assert_eq!(s.pointer_move(Point::new(200.0, 200.0), false, None), Transition::Hover);
        assert_eq!(s.end, Point::new(150.0, 120.0));
    }

    #[test]
    fn test_body_drag_is_clamped() {
        let mut s = placed(Point::new(50.0, 50.0), Point::new(150.0, 120.0));
        s.pointer_down(Point::new(100.0, 100.0), Some(Handle::Body));
        s.pointer_move(Point::new(-400.0, 100.0), true, None);
        s.pointer_up(Point::new(-400.0, 100.0));
        assert_eq!(s.rect(), Some(Rect::new(0.0, 50.0, 100.0, 70.0)));
    }

    #[test]
    fn test_clear_resets_to_draw() {
        let mut s = placed(Point::new(50.0, 50.0), Point::new(150.0, 120.0));
        s.clear();
        assert_eq!(s.mode, Mode::Draw);
        assert_eq!(s.phase, DrawPhase::Empty);
        assert!(s.start.is_sentinel() && s.end.is_sentinel());
        // Still clamped to the same surface
        s.set_start_point(Point::new(700.0, 500.0));
        assert_eq!(s.start, Point::new(600.0, 400.0));
    }
}
