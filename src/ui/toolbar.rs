// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with the editing tools and history controls.

use crate::app::Tool;

/// Result of toolbar interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolbarAction {
    None,
    Select(Tool),
    Rotate(f64),
    Undo,
    Redo,
}

/// Display the toolbar. Controls are disabled until an image is loaded;
/// undo and redo follow the history cursor.
pub fn show(
    ui: &mut egui::Ui,
    current_tool: Option<Tool>,
    has_image: bool,
    can_undo: bool,
    can_redo: bool,
) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");

        ui.separator();

        ui.add_enabled_ui(has_image, |ui| {
            for (tool, label) in [
                (Tool::Crop, "✂ Crop"),
                (Tool::Resize, "⤢ Resize"),
                (Tool::Rectangle, "▭ Rectangle"),
                (Tool::Text, "T Text"),
            ] {
                if ui.selectable_label(current_tool == Some(tool), label).clicked() {
                    action = ToolbarAction::Select(tool);
                }
            }

            ui.separator();

            if ui.button("⟲ Rotate left").clicked() {
                action = ToolbarAction::Rotate(-90.0);
            }
            if ui.button("⟳ Rotate right").clicked() {
                action = ToolbarAction::Rotate(90.0);
            }
        });

        ui.separator();

        if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
            action = ToolbarAction::Undo;
        }
        if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
            action = ToolbarAction::Redo;
        }

        ui.separator();

        let tool_text = match current_tool {
            None => "Pick a tool to start editing",
            Some(Tool::Crop) => "Drag the frame handles or body, then save the crop",
            Some(Tool::Resize) => "Enter a size and apply, then drag to inspect before saving",
            Some(Tool::Rectangle) => {
                "Drag or click twice to place; drag handles to adjust; Delete clears"
            }
            Some(Tool::Text) => "Drag or click twice to place a text box, then type",
        };

        ui.label(egui::RichText::new(tool_text).italics().weak());
    });

    action
}
