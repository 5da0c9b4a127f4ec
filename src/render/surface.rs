// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Contracts for the drawing surface and the text-input overlay.

use crate::util::geometry::{Rect, Size};
use anyhow::Result;
use image::{Rgba, RgbaImage};
use std::sync::mpsc::Receiver;

/// A 2D drawing surface with canvas-like semantics.
///
/// Resizing the surface wipes its contents and resets the transform.
/// Drawing calls are affected by the current transform.
pub trait RenderSurface {
    fn size(&self) -> Size;

    fn set_size(&mut self, width: u32, height: u32);

    /// Make `region` fully transparent.
    fn clear(&mut self, region: Rect);

    /// Draw the `src` part of `source` into `dst`, scaling as needed.
    fn blit(&mut self, source: &RgbaImage, src: Rect, dst: Rect);

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>);

    /// Outline `rect` with a stroke of `width` pixels drawn inside it.
    fn stroke_rect(&mut self, rect: Rect, width: f64, color: Rgba<u8>);

    /// Push the current transform.
    fn save(&mut self);

    /// Pop the transform pushed by the last `save`.
    fn restore(&mut self);

    fn translate(&mut self, dx: f64, dy: f64);

    fn rotate(&mut self, radians: f64);

    fn reset_transform(&mut self);

    /// Encode the surface as PNG off the calling thread.
    fn to_encoded_blob(&self) -> Receiver<Result<Vec<u8>>>;

    /// Clear the whole surface.
    fn clear_all(&mut self) {
        let rect = self.size().as_rect();
        self.clear(rect);
    }
}

/// An externally rendered text-input region anchored over the surface.
pub trait TextOverlay {
    /// Show the input, focused and bound to `rect` (surface pixels).
    fn open(&mut self, rect: Rect);

    /// Hide and detach the input.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// The text typed so far.
    fn text(&self) -> String;
}
