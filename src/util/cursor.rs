// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer cursor glyphs requested by the editing engine.

/// Cursor the host should show over the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Auto,
    Grab,
    Grabbing,
    Move,
    NwseResize,
    NeswResize,
    NsResize,
    EwResize,
    Crosshair,
}
