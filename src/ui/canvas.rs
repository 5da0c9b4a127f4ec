// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing canvas.
//!
//! Shows the editor's render surface as a texture and translates egui
//! pointer/keyboard input into [`InputEvent`]s. Events over the surface go
//! to the element the editor asks for and then bubble to the document;
//! everything else goes to the document only.

use crate::editor::controller::{pointer, ActiveTool, EditorController};
use crate::editor::events::{InputEvent, Key, Target, PRIMARY_BUTTON};
use crate::io::config::AnnotationStyle;
use crate::render::raster::RasterSurface;
use crate::render::surface::{RenderSurface, TextOverlay};
use crate::util::cursor::Cursor;
use crate::util::geometry::Rect;

/// The editor as the application uses it.
pub type Editor = EditorController<RasterSurface, EguiTextOverlay>;

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    /// Escape pressed and no tool consumed it
    Cancel,
}

/// Text input shown over a placed text annotation.
pub struct EguiTextOverlay {
    rect: Option<Rect>,
    text: String,
    style: AnnotationStyle,
    focus_pending: bool,
}

impl EguiTextOverlay {
    pub fn new(style: AnnotationStyle) -> Self {
        Self {
            rect: None,
            text: String::new(),
            style,
            focus_pending: false,
        }
    }

    /// Paint the input over the canvas whose top-left is `origin`.
    fn show(&mut self, ctx: &egui::Context, origin: egui::Pos2) {
        let Some(rect) = self.rect else {
            return;
        };
        let [r, g, b, a] = self.style.text_color;
        let color = egui::Color32::from_rgba_unmultiplied(r, g, b, a);
        let font = egui::FontId::proportional(self.style.font_size as f32);
        let size = egui::vec2(rect.width as f32, rect.height as f32);

        egui::Area::new(egui::Id::new("text_annotation_input"))
            .fixed_pos(origin + egui::vec2(rect.x as f32, rect.y as f32))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let edit = egui::TextEdit::multiline(&mut self.text)
                    .font(font)
                    .text_color(color)
                    .desired_width(size.x)
                    .desired_rows(1);
                let response = ui.add_sized(size, edit);
                if self.focus_pending {
                    response.request_focus();
                    self.focus_pending = false;
                }
            });
    }
}

impl TextOverlay for EguiTextOverlay {
    fn open(&mut self, rect: Rect) {
        self.rect = Some(rect);
        self.text.clear();
        self.focus_pending = true;
    }

    fn close(&mut self) {
        self.rect = None;
        self.focus_pending = false;
    }

    fn is_open(&self) -> bool {
        self.rect.is_some()
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

/// Per-canvas UI state kept between frames.
#[derive(Default)]
pub struct CanvasView {
    texture: Option<egui::TextureHandle>,
    /// Surface revision the texture was built from
    revision: Option<u64>,
    /// Pointer was over the surface last frame
    inside: bool,
    /// Last pointer position relative to the surface
    last_pos: egui::Vec2,
}

impl CanvasView {
    /// Surface revision currently shown, if any.
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }
}

/// Display the canvas and forward input to the editor.
pub fn show(ui: &mut egui::Ui, editor: &mut Editor, view: &mut CanvasView) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let size = editor.surface().map(|s| s.size()).unwrap_or_default();
        if size.is_empty() {
            welcome(ui);
            return;
        }

        // Center the surface, shown 1:1
        let available = ui.available_size();
        let offset = egui::vec2(
            ((available.x - size.width as f32) / 2.0).max(0.0),
            ((available.y - size.height as f32) / 2.0).max(0.0),
        );
        let image_rect = egui::Rect::from_min_size(
            ui.min_rect().min + offset,
            egui::vec2(size.width as f32, size.height as f32),
        );
        let response = ui.allocate_rect(image_rect, egui::Sense::click_and_drag());

        action = forward_input(ui.ctx(), editor, view, image_rect);
        upload_texture(ui.ctx(), editor, view);

        if let Some(texture) = &view.texture {
            // The surface may have been resized by this frame's input
            let paint_rect = egui::Rect::from_min_size(image_rect.min, texture.size_vec2());
            ui.painter().image(
                texture.id(),
                paint_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
            if paint_rect.size() != image_rect.size() {
                ui.ctx().request_repaint();
            }
        }

        editor.overlay_mut().show(ui.ctx(), image_rect.min);
        let _ = response.on_hover_cursor(cursor_icon(editor.cursor()));
    });

    // Status line
    ui.separator();
    ui.horizontal(|ui| {
        let tool = match editor.active_tool() {
            ActiveTool::None => "none",
            ActiveTool::Crop => "crop",
            ActiveTool::Resize => "resize",
            ActiveTool::Annotation => "annotation",
        };
        ui.label(format!("Active tool: {}", tool));
        ui.separator();
        match editor.edited() {
            Some(edited) => {
                let size = edited.size();
                let unsaved = if edited.has_pending() { " (unsaved)" } else { "" };
                let base = edited.base();
                ui.label(format!("{} x {}{}", size.width, size.height, unsaved))
                    .on_hover_text(format!("Original {} x {}", base.width(), base.height()));
                ui.separator();
                ui.label(format!("Angle {:.0}°", edited.angle()));
                ui.separator();
                ui.label(format!("Preview {:.0}%", editor.scale() * 100.0));
                ui.separator();
                ui.label(format!(
                    "History {}/{}",
                    edited.history_index() + 1,
                    edited.history_len()
                ));
            }
            None => {
                ui.label("No image loaded");
            }
        }
        if let Some(frame) = editor.frame() {
            let rect = frame.rect();
            let locked = if frame.aspect_ratio().is_some() { ", locked" } else { "" };
            ui.separator();
            ui.label(format!("Crop {:.0} x {:.0}{}", rect.width, rect.height, locked));
        }
        if let Some(view) = editor.resize_view() {
            let offset = view.offset();
            ui.separator();
            ui.label(format!("Offset {:.0}, {:.0}", offset.x, offset.y));
        }
    });

    action
}

/// Send `event` to the element under the pointer (if any), then bubble it
/// to the document.
fn deliver(editor: &mut Editor, on_element: bool, event: InputEvent) -> bool {
    let mut consumed = false;
    if on_element {
        let target = editor.pointer_target();
        consumed |= editor.handle_event(target, event);
    }
    consumed |= editor.handle_event(Target::Document, event);
    consumed
}

fn forward_input(
    ctx: &egui::Context,
    editor: &mut Editor,
    view: &mut CanvasView,
    image_rect: egui::Rect,
) -> CanvasAction {
    let (hover, delta, pressed, released, held) = ctx.input(|i| {
        (
            i.pointer.hover_pos(),
            i.pointer.delta(),
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.primary_down(),
        )
    });
    let buttons = if held { PRIMARY_BUTTON } else { 0 };
    let inside = hover.is_some_and(|p| image_rect.contains(p));
    if let Some(p) = hover {
        view.last_pos = p - image_rect.min;
    }
    let (x, y) = (view.last_pos.x as f64, view.last_pos.y as f64);

    if inside != view.inside {
        let event = if inside {
            InputEvent::PointerEnter
        } else {
            InputEvent::PointerLeave
        };
        deliver(editor, true, event);
        view.inside = inside;
    }
    if pressed && inside {
        deliver(editor, true, InputEvent::PointerDown(pointer(x, y, buttons)));
    }
    if hover.is_some() && delta != egui::Vec2::ZERO {
        deliver(editor, inside, InputEvent::PointerMove(pointer(x, y, buttons)));
    }
    if released {
        deliver(editor, inside, InputEvent::PointerUp(pointer(x, y, 0)));
    }

    if ctx.wants_keyboard_input() {
        return CanvasAction::None;
    }
    if ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
        deliver(editor, false, InputEvent::KeyDown(Key::Delete));
    }
    if ctx.input(|i| i.key_pressed(egui::Key::Escape))
        && !deliver(editor, false, InputEvent::KeyDown(Key::Escape))
    {
        return CanvasAction::Cancel;
    }
    CanvasAction::None
}

/// Re-upload the surface pixels when they changed.
fn upload_texture(ctx: &egui::Context, editor: &Editor, view: &mut CanvasView) {
    let Some(surface) = editor.surface() else {
        return;
    };
    if view.texture.is_some() && view.revision == Some(surface.revision()) {
        return;
    }
    let image = surface.image();
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let size = [image.width() as usize, image.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
    match view.texture.as_mut() {
        Some(texture) => texture.set(color_image, egui::TextureOptions::NEAREST),
        None => {
            let options = egui::TextureOptions::NEAREST;
            let texture = ctx.load_texture("edited_image", color_image, options);
            view.texture = Some(texture);
        }
    }
    view.revision = Some(surface.revision());
}

fn cursor_icon(cursor: Cursor) -> egui::CursorIcon {
    match cursor {
        Cursor::Default | Cursor::Auto => egui::CursorIcon::Default,
        Cursor::Grab => egui::CursorIcon::Grab,
        Cursor::Grabbing => egui::CursorIcon::Grabbing,
        Cursor::Move => egui::CursorIcon::Move,
        Cursor::NwseResize => egui::CursorIcon::ResizeNwSe,
        Cursor::NeswResize => egui::CursorIcon::ResizeNeSw,
        Cursor::NsResize => egui::CursorIcon::ResizeVertical,
        Cursor::EwResize => egui::CursorIcon::ResizeHorizontal,
        Cursor::Crosshair => egui::CursorIcon::Crosshair,
    }
}

fn welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("Retouch")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Open an image to begin editing")
                    .color(egui::Color32::from_gray(180)),
            );
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new("File > Open Image...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_open_resets_text() {
        let mut overlay = EguiTextOverlay::new(AnnotationStyle::default());
        overlay.open(Rect::new(1.0, 2.0, 30.0, 10.0));
        overlay.text.push_str("note");
        assert!(overlay.is_open());
        assert_eq!(overlay.text(), "note");

        overlay.close();
        assert!(!overlay.is_open());
        overlay.open(Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(overlay.text(), "");
    }

    #[test]
    fn test_resize_cursors_map_to_diagonals() {
        assert_eq!(cursor_icon(Cursor::NwseResize), egui::CursorIcon::ResizeNwSe);
        assert_eq!(cursor_icon(Cursor::NeswResize), egui::CursorIcon::ResizeNeSw);
        assert_eq!(cursor_icon(Cursor::Auto), egui::CursorIcon::Default);
    }
}
