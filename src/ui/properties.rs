// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tool properties panel.
//!
//! Shows the controls of the active tool: target size for resizing, the
//! crop proportion, and save/cancel buttons for whatever is in progress.

use crate::app::Tool;
use crate::editor::controller::ActiveTool;
use crate::util::geometry::Size;

/// Crop proportions offered in the panel.
pub const PROPORTIONS: [&str; 5] = ["free", "1:1", "4:3", "3:2", "16:9"];

/// Result of properties panel interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesAction {
    None,
    ApplyResize(u32, u32),
    SaveResize,
    CancelResize,
    Proportion(String),
    SaveCrop,
    CancelCrop,
    SaveAnnotation,
    ClearAnnotation,
    RemoveAnnotation,
}

/// Values edited in the panel, kept between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertiesState {
    pub width: u32,
    pub height: u32,
    pub keep_ratio: bool,
    pub proportion: String,
}

impl Default for PropertiesState {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            keep_ratio: true,
            proportion: PROPORTIONS[0].to_string(),
        }
    }
}

impl PropertiesState {
    /// Reset the resize inputs to `size`.
    pub fn sync_size(&mut self, size: Size) {
        self.width = size.width;
        self.height = size.height;
    }
}

/// Display the properties of the active tool.
pub fn show(
    ui: &mut egui::Ui,
    state: &mut PropertiesState,
    tool: Option<Tool>,
    active: ActiveTool,
    image_size: Option<Size>,
) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Properties");
    ui.separator();

    let Some(size) = image_size else {
        ui.label(egui::RichText::new("No image loaded").weak());
        return action;
    };

    ui.label(format!("Image: {} x {}", size.width, size.height));
    ui.separator();

    match tool {
        Some(Tool::Resize) => {
            ui.label("New size");
            let before = (state.width, state.height);
            ui.horizontal(|ui| {
                ui.label("Width");
                ui.add(egui::DragValue::new(&mut state.width).range(1..=20000));
            });
            ui.horizontal(|ui| {
                ui.label("Height");
                ui.add(egui::DragValue::new(&mut state.height).range(1..=20000));
            });
            ui.checkbox(&mut state.keep_ratio, "Keep proportions");
            if state.keep_ratio && !size.is_empty() {
                let ratio = size.width as f64 / size.height as f64;
                if state.width != before.0 {
                    state.height = ((state.width as f64 / ratio).round() as u32).max(1);
                } else if state.height != before.1 {
                    state.width = ((state.height as f64 * ratio).round() as u32).max(1);
                }
            }

            ui.add_space(8.0);
            if ui.button("Apply size").clicked() {
                action = PropertiesAction::ApplyResize(state.width, state.height);
            }
            ui.horizontal(|ui| {
                let staged = active == ActiveTool::Resize;
                if ui.add_enabled(staged, egui::Button::new("Save")).clicked() {
                    action = PropertiesAction::SaveResize;
                }
                if ui.button("Cancel").clicked() {
                    action = PropertiesAction::CancelResize;
                }
            });
        }
        Some(Tool::Crop) => {
            ui.label("Proportion");
            egui::ComboBox::from_id_source("crop_proportion")
                .selected_text(state.proportion.clone())
                .show_ui(ui, |ui| {
                    for name in PROPORTIONS {
                        if ui
                            .selectable_value(&mut state.proportion, name.to_string(), name)
                            .clicked()
                        {
                            action = PropertiesAction::Proportion(name.to_string());
                        }
                    }
                });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Save crop").clicked() {
                    action = PropertiesAction::SaveCrop;
                }
                if ui.button("Cancel").clicked() {
                    action = PropertiesAction::CancelCrop;
                }
            });
        }
        Some(Tool::Rectangle) | Some(Tool::Text) => {
            let enabled = active == ActiveTool::Annotation;
            ui.horizontal(|ui| {
                if ui.add_enabled(enabled, egui::Button::new("Save")).clicked() {
                    action = PropertiesAction::SaveAnnotation;
                }
                if ui.add_enabled(enabled, egui::Button::new("Clear")).clicked() {
                    action = PropertiesAction::ClearAnnotation;
                }
                if ui.add_enabled(enabled, egui::Button::new("Remove")).clicked() {
                    action = PropertiesAction::RemoveAnnotation;
                }
            });
        }
        None => {
            ui.label(egui::RichText::new("Select a tool in the toolbar").weak());
        }
    }

    action
}
