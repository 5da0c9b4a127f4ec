// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Rendering collaborators used by the editing engine.
//!
//! The engine only talks to the [`surface::RenderSurface`] and
//! [`surface::TextOverlay`] traits. [`raster::RasterSurface`] is the software
//! implementation shown by the UI and used for export.

pub mod raster;
pub mod surface;
pub mod text;
