// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration and its serialization.
//!
//! Settings are read from a YAML or JSON file (picked by extension) whose
//! path is given in the `RETOUCH_CONFIG` environment variable. Any field
//! left out of the file keeps its default.

use anyhow::{bail, Result};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "RETOUCH_CONFIG";

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter string understood by env_logger.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Bounds of the on-screen preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            max_width: 643,
            max_height: 400,
        }
    }
}

/// Look of annotations and their handles, in preview pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    pub stroke_width: f64,
    pub stroke_color: [u8; 4],
    pub handle_size: f64,
    pub handle_color: [u8; 4],
    pub font_size: f64,
    pub text_color: [u8; 4],
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            stroke_width: 2.0,
            stroke_color: [255, 0, 0, 255],
            handle_size: 8.0,
            handle_color: [255, 255, 255, 255],
            font_size: 16.0,
            text_color: [255, 0, 0, 255],
        }
    }
}

impl AnnotationStyle {
    pub fn stroke(&self) -> Rgba<u8> {
        Rgba(self.stroke_color)
    }

    pub fn handle(&self) -> Rgba<u8> {
        Rgba(self.handle_color)
    }

    pub fn text(&self) -> Rgba<u8> {
        Rgba(self.text_color)
    }
}

/// Crop frame behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Smallest crop width/height in preview pixels
    pub min_size: f64,
    /// Grab radius around each control point
    pub handle_radius: f64,
    /// Alpha of the mask drawn outside the crop rectangle
    pub dim_alpha: u8,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            min_size: 10.0,
            handle_radius: 6.0,
            dim_alpha: 128,
        }
    }
}

/// Complete editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub viewport: ViewportConfig,
    pub annotation: AnnotationStyle,
    pub crop: CropConfig,
    /// Maximum number of undo entries kept
    pub history_limit: usize,
    pub log_level: LogLevel,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            annotation: AnnotationStyle::default(),
            crop: CropConfig::default(),
            history_limit: 50,
            log_level: LogLevel::default(),
        }
    }
}

/// Configuration path from the environment, if set.
pub fn path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV).map(PathBuf::from)
}

/// Load configuration, choosing the format from the file extension.
pub fn load(path: &Path) -> Result<EditorConfig> {
    let text = std::fs::read_to_string(path)?;
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&text)?),
        Some("json") => Ok(serde_json::from_str(&text)?),
        other => bail!("Unsupported config extension: {:?}", other),
    }
}

/// Write configuration, choosing the format from the file extension.
pub fn save(config: &EditorConfig, path: &Path) -> Result<()> {
    let text = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::to_string(config)?,
        Some("json") => serde_json::to_string_pretty(config)?,
        other => bail!("Unsupported config extension: {:?}", other),
    };
    std::fs::write(path, text)?;
    Ok(())
}
