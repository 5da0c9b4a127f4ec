// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Crop frame over the preview.
//!
//! The frame stores each edge as an offset from the matching canvas margin,
//! so dragging one edge never disturbs the others. Eight control points sit
//! on the corners and edge midpoints; grabbing the interior moves the whole
//! frame.

use crate::util::cursor::Cursor;
use crate::util::geometry::{Point, Rect, Size};

/// Control points in clockwise order from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPoint {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl ControlPoint {
    pub const ALL: [ControlPoint; 8] = [
        ControlPoint::NorthWest,
        ControlPoint::North,
        ControlPoint::NorthEast,
        ControlPoint::East,
        ControlPoint::SouthEast,
        ControlPoint::South,
        ControlPoint::SouthWest,
        ControlPoint::West,
    ];

    fn moves_left(&self) -> bool {
        matches!(self, ControlPoint::NorthWest | ControlPoint::West | ControlPoint::SouthWest)
    }

    fn moves_right(&self) -> bool {
        matches!(self, ControlPoint::NorthEast | ControlPoint::East | ControlPoint::SouthEast)
    }

    fn moves_top(&self) -> bool {
        matches!(self, ControlPoint::NorthWest | ControlPoint::North | ControlPoint::NorthEast)
    }

    fn moves_bottom(&self) -> bool {
        matches!(self, ControlPoint::SouthWest | ControlPoint::South | ControlPoint::SouthEast)
    }

    fn is_corner(&self) -> bool {
        (self.moves_left() || self.moves_right()) && (self.moves_top() || self.moves_bottom())
    }

    pub fn cursor(&self) -> Cursor {
        match self {
            ControlPoint::NorthWest | ControlPoint::SouthEast => Cursor::NwseResize,
            ControlPoint::NorthEast | ControlPoint::SouthWest => Cursor::NeswResize,
            ControlPoint::North | ControlPoint::South => Cursor::NsResize,
            ControlPoint::East | ControlPoint::West => Cursor::EwResize,
        }
    }
}

/// What the pointer holds while dragging the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameGrip {
    Point(ControlPoint),
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub left_edge: f64,
    pub top_edge: f64,
    pub right_edge: f64,
    pub bottom_edge: f64,
    width: f64,
    height: f64,
    current: Option<FrameGrip>,
    grab: Point,
    /// Pointer has left the canvas
    is_out: bool,
    aspect_ratio: Option<f64>,
    min_size: f64,
    handle_radius: f64,
}

impl Frame {
    /// A frame covering the whole `canvas`.
    pub fn new(canvas: Size, min_size: f64, handle_radius: f64) -> Self {
        let width = canvas.width as f64;
        let height = canvas.height as f64;
        Self {
            left_edge: 0.0,
            top_edge: 0.0,
            right_edge: 0.0,
            bottom_edge: 0.0,
            width,
            height,
            current: None,
            grab: Point::default(),
            is_out: false,
            aspect_ratio: None,
            // A canvas smaller than the gap could never satisfy it
            min_size: min_size.min(width).min(height).max(0.0),
            handle_radius,
        }
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.aspect_ratio
    }

    pub fn edges(&self) -> (f64, f64, f64, f64) {
        (self.left_edge, self.top_edge, self.right_edge, self.bottom_edge)
    }

    /// Crop rectangle in canvas pixels.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.left_edge,
            self.top_edge,
            self.width - self.left_edge - self.right_edge,
            self.height - self.top_edge - self.bottom_edge,
        )
    }

    pub fn point_center(&self, point: ControlPoint) -> Point {
        let r = self.rect();
        let c = r.center();
        match point {
            ControlPoint::NorthWest => Point::new(r.x, r.y),
            ControlPoint::North => Point::new(c.x, r.y),
            ControlPoint::NorthEast => Point::new(r.right(), r.y),
            ControlPoint::East => Point::new(r.right(), c.y),
            ControlPoint::SouthEast => Point::new(r.right(), r.bottom()),
            ControlPoint::South => Point::new(c.x, r.bottom()),
            ControlPoint::SouthWest => Point::new(r.x, r.bottom()),
            ControlPoint::West => Point::new(r.x, c.y),
        }
    }

    /// Grab areas of the control points, in [`ControlPoint::ALL`] order.
    pub fn points(&self) -> [Rect; 8] {
        ControlPoint::ALL.map(|point| Rect::around(self.point_center(point), self.handle_radius))
    }

    pub fn hit_test(&self, p: Point) -> Option<FrameGrip> {
        ControlPoint::ALL
            .into_iter()
            .find(|&point| Rect::around(self.point_center(point), self.handle_radius).contains(p))
            .map(FrameGrip::Point)
            .or_else(|| self.rect().contains(p).then_some(FrameGrip::Body))
    }

    /// Start dragging whatever is under `p`. Returns false when nothing is.
    pub fn grab(&mut self, p: Point) -> bool {
        self.current = self.hit_test(p);
        self.grab = p.clamped(self.width, self.height);
        if let Some(grip) = self.current {
            log::debug!("Crop frame grabbed: {:?}", grip);
        }
        self.current.is_some()
    }

    pub fn release(&mut self) {
        self.current = None;
    }

    pub fn set_out(&mut self, is_out: bool) {
        self.is_out = is_out;
    }

    /// Glyph for the pointer at `p`. A grab in progress keeps its glyph even
    /// off the canvas; otherwise the pointer outside shows the default.
    pub fn cursor_at(&self, p: Point) -> Cursor {
        let hovered = if self.is_out { None } else { self.hit_test(p) };
        match self.current.or(hovered) {
            Some(FrameGrip::Point(point)) => point.cursor(),
            Some(FrameGrip::Body) => Cursor::Move,
            None => Cursor::Default,
        }
    }

    /// Follow the pointer with the grabbed point or body. Returns true when
    /// any edge changed.
    pub fn handle_mouse_move(&mut self, p: Point) -> bool {
        let Some(grip) = self.current else {
            return false;
        };
        let before = self.edges();
        let p = p.clamped(self.width, self.height);

        match grip {
            FrameGrip::Body => self.move_body(p),
            FrameGrip::Point(point) => {
                self.drag_point(point, p);
                if let Some(ratio) = self.aspect_ratio {
                    self.fit_ratio(point, ratio);
                }
            }
        }
        self.edges() != before
    }

    fn move_body(&mut self, p: Point) {
        let dx = (p.x - self.grab.x).clamp(-self.left_edge, self.right_edge);
        let dy = (p.y - self.grab.y).clamp(-self.top_edge, self.bottom_edge);
        self.left_edge += dx;
        self.right_edge -= dx;
        self.top_edge += dy;
        self.bottom_edge -= dy;
        self.grab = p;
    }

    fn drag_point(&mut self, point: ControlPoint, p: Point) {
        if point.moves_left() {
            self.left_edge = p.x.clamp(0.0, self.max_left());
        }
        if point.moves_right() {
            self.right_edge = (self.width - p.x).clamp(0.0, self.max_right());
        }
        if point.moves_top() {
            self.top_edge = p.y.clamp(0.0, self.max_top());
        }
        if point.moves_bottom() {
            self.bottom_edge = (self.height - p.y).clamp(0.0, self.max_bottom());
        }
    }

    fn max_left(&self) -> f64 {
        (self.width - self.right_edge - self.min_size).max(0.0)
    }

    fn max_right(&self) -> f64 {
        (self.width - self.left_edge - self.min_size).max(0.0)
    }

    fn max_top(&self) -> f64 {
        (self.height - self.bottom_edge - self.min_size).max(0.0)
    }

    fn max_bottom(&self) -> f64 {
        (self.height - self.top_edge - self.min_size).max(0.0)
    }

    /// Re-establish `ratio` after `point` was dragged. Corners keep their
    /// opposite corner fixed; midpoints grow the other axis about the centre.
    fn fit_ratio(&mut self, point: ControlPoint, ratio: f64) {
        let rect = self.rect();

        if point.is_corner() {
            let room_w = if point.moves_left() {
                self.width - self.right_edge
            } else {
                self.width - self.left_edge
            };
            let room_h = if point.moves_top() {
                self.height - self.bottom_edge
            } else {
                self.height - self.top_edge
            };
            let mut w = rect.width.max(self.min_size);
            let mut h = w / ratio;
            if h > room_h {
                h = room_h;
                w = h * ratio;
            }
            if w > room_w {
                w = room_w;
                h = w / ratio;
            }
            if point.moves_left() {
                self.left_edge = self.width - self.right_edge - w;
            } else {
                self.right_edge = self.width - self.left_edge - w;
            }
            if point.moves_top() {
                self.top_edge = self.height - self.bottom_edge - h;
            } else {
                self.bottom_edge = self.height - self.top_edge - h;
            }
        } else if point.moves_top() || point.moves_bottom() {
            let center = rect.center().x;
            let room_w = 2.0 * center.min(self.width - center);
            let mut h = rect.height;
            let mut w = h * ratio;
            if w > room_w {
                w = room_w;
                h = w / ratio;
                if point.moves_top() {
                    self.top_edge = self.height - self.bottom_edge - h;
                } else {
                    self.bottom_edge = self.height - self.top_edge - h;
                }
            }
            self.left_edge = center - w / 2.0;
            self.right_edge = self.width - center - w / 2.0;
        } else {
            let center = rect.center().y;
            let room_h = 2.0 * center.min(self.height - center);
            let mut w = rect.width;
            let mut h = w / ratio;
            if h > room_h {
                h = room_h;
                w = h * ratio;
                if point.moves_left() {
                    self.left_edge = self.width - self.right_edge - w;
                } else {
                    self.right_edge = self.width - self.left_edge - w;
                }
            }
            self.top_edge = center - h / 2.0;
            self.bottom_edge = self.height - center - h / 2.0;
        }
    }

    /// Lock the frame to a named proportion such as `"16:9"`, keeping its
    /// centre. `"free"` or an empty name unlocks it. Unknown names are
    /// ignored and return false.
    pub fn change_proportion(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("free") {
            self.aspect_ratio = None;
            return true;
        }
        let Some(ratio) = parse_ratio(name) else {
            log::warn!("Unknown crop proportion: {:?}", name);
            return false;
        };
        self.aspect_ratio = Some(ratio);

        let rect = self.rect();
        let center = rect.center();
        let room_w = 2.0 * center.x.min(self.width - center.x);
        let room_h = 2.0 * center.y.min(self.height - center.y);

        // Largest box of the ratio that fits both the current frame and the canvas
        let mut w = rect.width.min(room_w);
        let mut h = w / ratio;
        let limit_h = rect.height.min(room_h);
        if h > limit_h {
            h = limit_h;
            w = h * ratio;
        }

        self.left_edge = center.x - w / 2.0;
        self.right_edge = self.width - center.x - w / 2.0;
        self.top_edge = center.y - h / 2.0;
        self.bottom_edge = self.height - center.y - h / 2.0;
        log::debug!("Crop proportion {} -> {:?}", name, self.rect());
        true
    }
}

fn parse_ratio(name: &str) -> Option<f64> {
    let (w, h) = name.split_once(':')?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;
    (w > 0.0 && h > 0.0).then(|| w / h)
}
