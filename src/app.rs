// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! Owns the editor controller and wires the menu, toolbar, properties
//! panel and canvas to it. Image decoding and PNG encoding run on
//! background threads; their results are polled once per frame.

use crate::editor::controller::{ActiveTool, HistoryStep};
use crate::io::config::{self, EditorConfig};
use crate::io::media::{self, LoadedImage};
use crate::models::annotation::Annotation;
use crate::models::rectangle::RectangleAnnotation;
use crate::models::text::TextAnnotation;
use crate::render::text::TextRenderer;
use crate::render::raster::RasterSurface;
use crate::ui::canvas::{self, CanvasView, Editor, EguiTextOverlay};
use crate::ui::properties::{self, PropertiesAction, PropertiesState};
use crate::ui::toolbar::{self, ToolbarAction};
use crate::util::geometry::Size;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

/// Editing tool selected in the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Crop,
    Resize,
    Rectangle,
    Text,
}

/// Main application state.
pub struct RetouchApp {
    editor: Editor,
    canvas: CanvasView,

    /// Tool chosen in the toolbar
    current_tool: Option<Tool>,

    /// Inputs of the properties panel
    properties: PropertiesState,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedImage, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Export destination and the encoder's result
    pending_export: Option<(PathBuf, Receiver<anyhow::Result<Vec<u8>>>)>,
}

impl RetouchApp {
    /// Create a new application instance.
    pub fn new(config: EditorConfig) -> Self {
        let overlay = EguiTextOverlay::new(config.annotation);
        let mut editor = Editor::new(Some(RasterSurface::new(0, 0)), overlay, config);
        match TextRenderer::egui_default() {
            Ok(renderer) => editor.set_text_renderer(Some(Arc::new(renderer))),
            Err(e) => log::warn!("Text annotations will not be drawn: {:#}", e),
        }
        Self {
            editor,
            canvas: CanvasView::default(),
            current_tool: None,
            properties: PropertiesState::default(),
            image_loader: None,
            loading_message: None,
            pending_export: None,
        }
    }

    /// Load an image file (asynchronously).
    pub fn load_image_file(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        std::thread::spawn(move || {
            let result = media::load_image(&path)
                .map(|loaded| {
                    log::info!(
                        "Loaded image: {} ({}x{})",
                        path.display(),
                        loaded.width,
                        loaded.height
                    );
                    loaded
                })
                .map_err(|e| format!("Failed to load image: {:#}", e));
            let _ = sender.send(result);
        });
    }

    /// Commit pending work and write the result as PNG (asynchronously).
    fn export_png(&mut self, path: PathBuf) {
        match self.editor.upload_image() {
            Some(receiver) => {
                self.current_tool = None;
                self.pending_export = Some((path, receiver));
            }
            None => log::warn!("Nothing to export"),
        }
    }

    /// Write the active configuration so it can be passed via `RETOUCH_CONFIG`.
    fn save_settings(&self, path: PathBuf) {
        match config::save(self.editor.config(), &path) {
            Ok(()) => log::info!("Saved settings to {}", path.display()),
            Err(e) => log::error!("Failed to save settings: {:#}", e),
        }
    }

    fn poll_background(&mut self) {
        if let Some(ref receiver) = self.image_loader {
            if let Ok(result) = receiver.try_recv() {
                self.image_loader = None;
                self.loading_message = None;

                match result {
                    Ok(loaded) => {
                        self.current_tool = None;
                        self.editor.replace_image(loaded.pixels);
                        self.sync_properties();
                        log::info!("Image loaded successfully");
                    }
                    Err(e) => log::error!("{}", e),
                }
            }
        }

        if let Some((path, receiver)) = self.pending_export.take() {
            match receiver.try_recv() {
                Ok(Ok(bytes)) => match media::save_encoded(&bytes, &path) {
                    Ok(()) => log::info!("Exported image to {}", path.display()),
                    Err(e) => log::error!("Failed to export image: {:#}", e),
                },
                Ok(Err(e)) => log::error!("Failed to encode image: {:#}", e),
                Err(std::sync::mpsc::TryRecvError::Empty) => {
                    self.pending_export = Some((path, receiver));
                }
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    log::error!("Image encoder stopped without a result");
                }
            }
        }
    }

    fn image_size(&self) -> Option<Size> {
        self.editor.edited().map(|edited| edited.size())
    }

    fn sync_properties(&mut self) {
        if let Some(size) = self.image_size() {
            self.properties.sync_size(size);
        }
    }

    /// Switch to `tool`, closing whatever the previous tool left open.
    fn select_tool(&mut self, tool: Tool) {
        if !self.editor.has_image() {
            return;
        }
        self.close_tool();
        self.current_tool = Some(tool);

        let style = self.editor.config().annotation;
        match tool {
            Tool::Crop => {
                self.editor.open_cut_frame();
                let proportion = self.properties.proportion.clone();
                self.editor.change_cut_proportion(&proportion);
            }
            Tool::Resize => self.sync_properties(),
            Tool::Rectangle => {
                let rectangle = RectangleAnnotation::new(Size::default(), style);
                self.editor.add_annotation(Annotation::Rectangle(rectangle));
            }
            Tool::Text => {
                let text = TextAnnotation::new(Size::default(), style);
                self.editor.add_annotation(Annotation::Text(text));
            }
        }
        log::debug!("Selected tool {:?}", tool);
    }

    /// Leave the current tool. Crop frames and annotations are dropped; a
    /// resize already applied is kept.
    fn close_tool(&mut self) {
        match self.editor.active_tool() {
            ActiveTool::Crop => self.editor.close_cut_frame(),
            ActiveTool::Resize => {
                self.editor.save_resize();
                self.sync_properties();
            }
            ActiveTool::Annotation => self.editor.remove_annotation(),
            ActiveTool::None => {}
        }
        self.current_tool = None;
    }

    /// Escape: like [`Self::close_tool`], but a staged resize is dropped too.
    fn cancel_tool(&mut self) {
        if self.editor.active_tool() == ActiveTool::Resize {
            self.editor.cancel_resize();
            self.current_tool = None;
        } else {
            self.close_tool();
        }
    }

    fn undo(&mut self) {
        let step = self.editor.undo();
        self.after_history_step("Undo", step);
    }

    fn redo(&mut self) {
        let step = self.editor.redo();
        self.after_history_step("Redo", step);
    }

    fn after_history_step(&mut self, label: &str, step: HistoryStep) {
        log::info!("{} -> {:?}", label, step);
        self.current_tool = None;
        self.sync_properties();
    }

    fn handle_toolbar(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::Select(tool) => {
                if self.current_tool == Some(tool) {
                    self.close_tool();
                } else {
                    self.select_tool(tool);
                }
            }
            ToolbarAction::Rotate(angle) => {
                self.close_tool();
                self.editor.turn(angle);
                self.sync_properties();
            }
            ToolbarAction::Undo => self.undo(),
            ToolbarAction::Redo => self.redo(),
            ToolbarAction::None => {}
        }
    }

    fn handle_properties(&mut self, action: PropertiesAction) {
        match action {
            PropertiesAction::ApplyResize(width, height) => {
                if !self.editor.resize(width, height) {
                    log::warn!("Cannot resize to {}x{}", width, height);
                }
            }
            PropertiesAction::SaveResize => {
                self.editor.save_resize();
                self.current_tool = None;
                self.sync_properties();
            }
            PropertiesAction::CancelResize => {
                self.editor.cancel_resize();
                self.current_tool = None;
            }
            PropertiesAction::Proportion(name) => {
                if !self.editor.change_cut_proportion(&name) {
                    self.properties.proportion = properties::PROPORTIONS[0].to_string();
                }
            }
            PropertiesAction::SaveCrop => {
                self.editor.save_current_crop();
                self.current_tool = None;
                self.sync_properties();
            }
            PropertiesAction::CancelCrop => self.close_tool(),
            PropertiesAction::SaveAnnotation => {
                if self.editor.save_annotation() {
                    log::info!("Annotation saved");
                }
            }
            PropertiesAction::ClearAnnotation => self.editor.clear_annotation(),
            PropertiesAction::RemoveAnnotation => self.close_tool(),
            PropertiesAction::None => {}
        }
    }

    /// Drop the toolbar selection once the editor has closed the tool itself.
    fn sync_tool(&mut self) {
        let closed = match self.current_tool {
            Some(Tool::Crop) => self.editor.active_tool() != ActiveTool::Crop,
            Some(Tool::Rectangle) | Some(Tool::Text) => {
                self.editor.active_tool() != ActiveTool::Annotation
            }
            Some(Tool::Resize) | None => false,
        };
        if closed {
            self.current_tool = None;
            self.sync_properties();
        }
    }
}

impl eframe::App for RetouchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background();

        // Keep polling while background work is in flight
        if self.loading_message.is_some() || self.pending_export.is_some() {
            ctx.request_repaint();
        }

        let has_image = self.editor.has_image();

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter(
                                "Images",
                                &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff", "tif"],
                            )
                            .pick_file()
                        {
                            self.load_image_file(path);
                        }
                        ui.close_menu();
                    }
                    if ui.add_enabled(has_image, egui::Button::new("Export PNG...")).clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("PNG", &["png"])
                            .set_file_name("edited.png")
                            .save_file()
                        {
                            self.export_png(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Save Settings As...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("YAML", &["yaml", "yml"])
                            .add_filter("JSON", &["json"])
                            .set_file_name("retouch.yaml")
                            .save_file()
                        {
                            self.save_settings(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui
                        .add_enabled(self.editor.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                        .clicked()
                    {
                        self.undo();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(
                            self.editor.can_redo(),
                            egui::Button::new("Redo (Ctrl+Shift+Z)"),
                        )
                        .clicked()
                    {
                        self.redo();
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                toolbar::show(
                    ui,
                    self.current_tool,
                    self.editor.has_image(),
                    self.editor.can_undo(),
                    self.editor.can_redo(),
                )
            })
            .inner;
        self.handle_toolbar(toolbar_action);

        // Properties panel (right side)
        let image_size = self.image_size();
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| {
                properties::show(
                    ui,
                    &mut self.properties,
                    self.current_tool,
                    self.editor.active_tool(),
                    image_size,
                )
            })
            .inner;
        self.handle_properties(properties_action);

        // Undo/redo shortcuts, unless a text field has focus
        if !ctx.wants_keyboard_input() {
            let undo_pressed = ctx.input(|i| {
                i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift
            });
            if undo_pressed && self.editor.can_undo()
            {
                self.undo();
            }
            if ctx.input(|i| {
                (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                    || (i.modifiers.command && i.key_pressed(egui::Key::Y))
            }) && self.editor.can_redo()
            {
                self.redo();
            }
        }

        // Main canvas (center)
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    canvas::CanvasAction::None
                } else {
                    canvas::show(ui, &mut self.editor, &mut self.canvas)
                }
            })
            .inner;

        match canvas_action {
            canvas::CanvasAction::Cancel => self.cancel_tool(),
            canvas::CanvasAction::None => {}
        }
        self.sync_tool();

        // Surface edits made this frame show up on the next one
        if self
            .editor
            .surface()
            .is_some_and(|surface| Some(surface.revision()) != self.canvas.revision())
        {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn app_with_image() -> RetouchApp {
        let mut app = RetouchApp::new(EditorConfig::default());
        app.editor
            .replace_image(RgbaImage::from_pixel(1200, 800, Rgba([0, 0, 255, 255])));
        app.sync_properties();
        app
    }

    #[test]
    fn test_tools_need_an_image() {
        let mut app = RetouchApp::new(EditorConfig::default());
        app.handle_toolbar(ToolbarAction::Select(Tool::Crop));
        assert_eq!(app.current_tool, None);
        assert_eq!(app.editor.active_tool(), ActiveTool::None);
    }

    #[test]
    fn test_switching_tools_closes_previous() {
        let mut app = app_with_image();
        app.handle_toolbar(ToolbarAction::Select(Tool::Crop));
        assert_eq!(app.editor.active_tool(), ActiveTool::Crop);

        app.handle_toolbar(ToolbarAction::Select(Tool::Rectangle));
        assert_eq!(app.current_tool, Some(Tool::Rectangle));
        assert_eq!(app.editor.active_tool(), ActiveTool::Annotation);

        // Selecting the same tool again closes it
        app.handle_toolbar(ToolbarAction::Select(Tool::Rectangle));
        assert_eq!(app.current_tool, None);
        assert_eq!(app.editor.active_tool(), ActiveTool::None);
    }

    #[test]
    fn test_resize_panel_flow() {
        let mut app = app_with_image();
        app.handle_toolbar(ToolbarAction::Select(Tool::Resize));
        assert_eq!(app.properties.width, 1200);
        assert_eq!(app.properties.height, 800);

        app.handle_properties(PropertiesAction::ApplyResize(600, 400));
        assert_eq!(app.editor.active_tool(), ActiveTool::Resize);
        app.handle_properties(PropertiesAction::SaveResize);

        assert_eq!(app.current_tool, None);
        assert_eq!(app.image_size(), Some(Size::new(600, 400)));
        assert_eq!(app.properties.width, 600);
        assert!(app.editor.can_undo());
    }

    #[test]
    fn test_switching_tools_keeps_applied_resize() {
        let mut app = app_with_image();
        app.handle_toolbar(ToolbarAction::Select(Tool::Resize));
        app.handle_properties(PropertiesAction::ApplyResize(600, 400));
        app.handle_toolbar(ToolbarAction::Select(Tool::Crop));

        assert_eq!(app.editor.active_tool(), ActiveTool::Crop);
        assert_eq!(app.image_size(), Some(Size::new(600, 400)));
        assert_eq!(app.properties.width, 600);
        assert!(app.editor.can_undo());
    }

    #[test]
    fn test_escape_drops_staged_resize() {
        let mut app = app_with_image();
        app.handle_toolbar(ToolbarAction::Select(Tool::Resize));
        app.handle_properties(PropertiesAction::ApplyResize(600, 400));
        app.cancel_tool();

        assert_eq!(app.current_tool, None);
        assert_eq!(app.image_size(), Some(Size::new(1200, 800)));
        assert!(!app.editor.can_undo());
    }

    #[test]
    fn test_crop_save_syncs_tool() {
        let mut app = app_with_image();
        app.handle_toolbar(ToolbarAction::Select(Tool::Crop));
        app.handle_properties(PropertiesAction::Proportion("1:1".to_string()));
        app.handle_properties(PropertiesAction::SaveCrop);

        assert_eq!(app.current_tool, None);
        assert_eq!(app.editor.active_tool(), ActiveTool::None);
        let size = app.image_size().unwrap();
        assert_eq!(size.width, size.height);
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let mut app = app_with_image();
        app.handle_toolbar(ToolbarAction::Rotate(90.0));
        assert_eq!(app.image_size(), Some(Size::new(800, 1200)));
        app.undo();
        assert_eq!(app.image_size(), Some(Size::new(1200, 800)));
    }
}
