// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The interactive editing engine: input routing, tool sessions and the
//! controller tying them to the model.

pub mod controller;
pub mod events;
pub mod resize;
