// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Retouch - raster image editor
//!
//! A cross-platform desktop application for cropping, rotating, resizing
//! and annotating images with full undo/redo.

mod app;
mod editor;
mod io;
mod models;
mod render;
mod ui;
mod util;

use anyhow::Result;
use app::RetouchApp;
use env_logger::Env;
use io::config::{self, EditorConfig};

fn main() -> Result<()> {
    // Configuration decides the default log level, so read it first
    let (config, config_error) = match config::path_from_env() {
        Some(path) => match config::load(&path) {
            Ok(config) => (config, None),
            Err(e) => (
                EditorConfig::default(),
                Some(format!("Ignoring config {}: {:#}", path.display(), e)),
            ),
        },
        None => (EditorConfig::default(), None),
    };

    // Initialize logging; RUST_LOG still wins over the configured level
    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_filter()))
        .init();
    if let Some(message) = config_error {
        log::warn!("{}", message);
    }

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Retouch"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Retouch",
        options,
        Box::new(move |_cc| Ok(Box::new(RetouchApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
