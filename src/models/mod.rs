// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing state: the edited image with its history, the crop frame and
//! annotations.

pub mod annotation;
pub mod edited_image;
pub mod frame;
pub mod history;
pub mod rectangle;
pub mod text;
