// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing orchestration.
//!
//! [`EditorController`] owns the edited image, the surface it renders to and
//! at most one interactive session (crop frame, resize positioning, or an
//! annotation). Input is routed to the active session, which decides what to
//! re-render and when to commit into the history.
//!
//! Operations that need the surface quietly do nothing when the controller
//! was built without one.

use super::events::{
    Channel, EventHub, InputEvent, Key, PointerEvent, Subscription, Target, POINTER_CHANNELS,
};
use super::resize::ResizeView;
use crate::io::config::EditorConfig;
use crate::models::annotation::{Annotation, Mode, Transition};
use crate::models::edited_image::EditedImage;
use crate::models::frame::Frame;
use crate::render::surface::{RenderSurface, TextOverlay};
use crate::render::text::TextRenderer;
use crate::util::cursor::Cursor;
use crate::util::geometry::{fit_scale, rotated_bounds, Point, Rect, Size};
use anyhow::Result;
use image::{Rgba, RgbaImage};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Outcome of an undo or redo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    /// Already at the boundary; nothing changed
    Boundary,
    /// Moved one step
    Moved,
    /// Moved one step and reached the boundary
    ReachedEnd,
}

impl HistoryStep {
    pub fn code(&self) -> u8 {
        match self {
            HistoryStep::Boundary => 0,
            HistoryStep::Moved => 1,
            HistoryStep::ReachedEnd => 2,
        }
    }
}

/// Which interactive tool currently owns the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTool {
    None,
    Crop,
    Resize,
    Annotation,
}

enum Session {
    Idle,
    Crop {
        frame: Frame,
        _listeners: Vec<Subscription>,
    },
    Resize {
        view: ResizeView,
        _listeners: Subscription,
    },
    Annotate {
        annotation: Annotation,
        /// Pointer currently over the annotation's region
        on_region: bool,
        /// Listeners on the surface or text area; dropped once a text box
        /// is placed
        region: Option<Subscription>,
        _document: Subscription,
    },
}

pub struct EditorController<S: RenderSurface, T: TextOverlay> {
    surface: Option<S>,
    overlay: T,
    config: EditorConfig,
    edited: Option<EditedImage>,
    /// Current preview-to-model ratio of what the surface shows
    scale: f64,
    hub: EventHub,
    session: Session,
    cursor: Cursor,
    text: Option<Arc<TextRenderer>>,
}

impl<S: RenderSurface, T: TextOverlay> EditorController<S, T> {
    pub fn new(surface: Option<S>, overlay: T, config: EditorConfig) -> Self {
        if surface.is_none() {
            log::warn!("No rendering surface; drawing operations are disabled");
        }
        Self {
            surface,
            overlay,
            config,
            edited: None,
            scale: 1.0,
            hub: EventHub::new(),
            session: Session::Idle,
            cursor: Cursor::Default,
            text: None,
        }
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    #[cfg(test)]
    pub fn overlay(&self) -> &T {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut T {
        &mut self.overlay
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn edited(&self) -> Option<&EditedImage> {
        self.edited.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.edited.is_some()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[cfg(test)]
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    pub fn can_undo(&self) -> bool {
        self.edited.as_ref().is_some_and(EditedImage::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.edited.as_ref().is_some_and(EditedImage::can_redo)
    }

    pub fn active_tool(&self) -> ActiveTool {
        match self.session {
            Session::Idle => ActiveTool::None,
            Session::Crop { .. } => ActiveTool::Crop,
            Session::Resize { .. } => ActiveTool::Resize,
            Session::Annotate { .. } => ActiveTool::Annotation,
        }
    }

    pub fn frame(&self) -> Option<&Frame> {
        match &self.session {
            Session::Crop { frame, .. } => Some(frame),
            _ => None,
        }
    }

    pub fn resize_view(&self) -> Option<&ResizeView> {
        match &self.session {
            Session::Resize { view, .. } => Some(view),
            _ => None,
        }
    }

    pub fn annotation(&self) -> Option<&Annotation> {
        match &self.session {
            Session::Annotate { annotation, .. } => Some(annotation),
            _ => None,
        }
    }

    /// Element the host should address pointer input over the surface to.
    pub fn pointer_target(&self) -> Target {
        match &self.session {
            Session::Annotate {
                annotation: Annotation::Text(text),
                ..
            } => Target::TextArea(text.area()),
            _ => Target::Surface,
        }
    }

    /// Install the renderer used to burn text annotations into the image.
    pub fn set_text_renderer(&mut self, text: Option<Arc<TextRenderer>>) {
        if let Some(edited) = self.edited.as_mut() {
            edited.set_text_renderer(text.clone());
        }
        self.text = text;
    }

    fn preview_size(&self) -> Size {
        match (&self.surface, &self.edited) {
            (Some(surface), _) => surface.size(),
            (None, Some(edited)) => edited.size().scaled(self.scale),
            (None, None) => Size::default(),
        }
    }

    fn max_size(&self) -> Size {
        Size::new(self.config.viewport.max_width, self.config.viewport.max_height)
    }

    /// Show `image`. The first call builds the model from it; later calls
    /// keep the model and its history and only refresh the preview.
    pub fn load_image(&mut self, image: RgbaImage) {
        if self.edited.is_none() {
            let mut edited = EditedImage::new(
                image,
                self.config.viewport.max_width,
                self.config.viewport.max_height,
                self.config.history_limit,
            );
            edited.set_text_renderer(self.text.clone());
            self.edited = Some(edited);
        } else {
            log::debug!("Image already loaded; refreshing preview");
        }
        self.redraw();
    }

    /// Start over with a different image, dropping the old history.
    pub fn replace_image(&mut self, image: RgbaImage) {
        self.end_session();
        self.edited = None;
        self.load_image(image);
    }

    /// Commit pending work and encode the full-resolution result.
    ///
    /// The surface is resized to model size for the encode and put back to
    /// the preview afterwards. Returns None without a surface or an image.
    pub fn upload_image(&mut self) -> Option<Receiver<Result<Vec<u8>>>> {
        self.apply_changes();
        self.end_session();
        let edited = self.edited.as_ref()?;
        let surface = self.surface.as_mut()?;

        let size = edited.size();
        let current = Arc::clone(edited.current());
        surface.set_size(size.width, size.height);
        surface.blit(&current, size.as_rect(), size.as_rect());
        let receiver = surface.to_encoded_blob();
        log::info!("Exporting {}x{} image", size.width, size.height);

        self.redraw();
        Some(receiver)
    }

    pub fn undo(&mut self) -> HistoryStep {
        self.end_session();
        let Some(edited) = self.edited.as_mut() else {
            return HistoryStep::Boundary;
        };
        let step = if !edited.back_history() {
            HistoryStep::Boundary
        } else if edited.is_at_start() {
            HistoryStep::ReachedEnd
        } else {
            HistoryStep::Moved
        };
        log::debug!("Undo: {:?} (entry {})", step, edited.history_index());
        self.redraw();
        step
    }

    pub fn redo(&mut self) -> HistoryStep {
        self.end_session();
        let Some(edited) = self.edited.as_mut() else {
            return HistoryStep::Boundary;
        };
        let step = if !edited.forward_history() {
            HistoryStep::Boundary
        } else if edited.is_at_end() {
            HistoryStep::ReachedEnd
        } else {
            HistoryStep::Moved
        };
        log::debug!("Redo: {:?} (entry {})", step, edited.history_index());
        self.redraw();
        step
    }

    /// Stage a resample to `width x height` and open positioning mode.
    ///
    /// The staged size reaches the history on [`Self::save_resize`] or when
    /// another tool takes over; only [`Self::cancel_resize`] drops it.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if matches!(self.session, Session::Resize { .. }) {
            // Resample from the last committed image, not the staged one
            if let Some(edited) = self.edited.as_mut() {
                edited.discard_pending();
            }
        }
        self.end_session();
        if let Some(surface) = self.surface.as_mut() {
            surface.clear_all();
        }
        let Some(edited) = self.edited.as_mut() else {
            return false;
        };
        if !edited.temp_update_size(width, height) {
            self.redraw();
            return false;
        }
        self.open_resize_editor();
        true
    }

    /// Show the staged image 1:1 so it can be panned.
    pub fn open_resize_editor(&mut self) {
        let Some(edited) = self.edited.as_ref() else {
            return;
        };
        let view = ResizeView::open(edited.size(), self.max_size());
        let listeners = self.hub.subscribe(Target::Surface, &POINTER_CHANNELS);
        self.session = Session::Resize {
            view,
            _listeners: listeners,
        };
        self.cursor = Cursor::Grab;
        self.redraw();
    }

    /// Commit the staged resize.
    pub fn save_resize(&mut self) -> bool {
        if !matches!(self.session, Session::Resize { .. }) {
            return false;
        }
        let committed = self.apply_changes();
        self.end_session();
        self.redraw();
        committed
    }

    /// Drop the staged resize.
    pub fn cancel_resize(&mut self) {
        if matches!(self.session, Session::Resize { .. }) {
            if let Some(edited) = self.edited.as_mut() {
                edited.discard_pending();
            }
            self.end_session();
            self.redraw();
        }
    }

    fn render_resize(&mut self) {
        let (Some(surface), Some(edited), Session::Resize { view, .. }) =
            (self.surface.as_mut(), self.edited.as_ref(), &self.session)
        else {
            return;
        };
        let viewport = view.viewport();
        let offset = view.offset();
        let content = view.content();
        surface.set_size(viewport.width, viewport.height);
        surface.blit(
            &edited.working().image,
            content.as_rect(),
            Rect::new(offset.x, offset.y, content.width as f64, content.height as f64),
        );
        self.scale = 1.0;
    }

    /// Rotate by `angle` degrees about the centre and commit.
    pub fn turn(&mut self, angle: f64) {
        if self.surface.is_none() {
            log::warn!("Rotation needs a rendering surface");
            return;
        }
        self.end_session();
        let Some(edited) = self.edited.as_mut() else {
            return;
        };
        let source = Arc::clone(&edited.working().image);
        let before = edited.size();
        let bounds = rotated_bounds(before, angle);
        let viewport = &self.config.viewport;
        let scale = fit_scale(bounds, viewport.max_width, viewport.max_height);
        let preview = bounds.scaled(scale);

        if let Some(surface) = self.surface.as_mut() {
            surface.save();
            surface.set_size(preview.width, preview.height);
            surface.translate(preview.width as f64 / 2.0, preview.height as f64 / 2.0);
            surface.rotate(angle.to_radians());
            let w = before.width as f64 * scale;
            let h = before.height as f64 * scale;
            surface.blit(&source, before.as_rect(), Rect::new(-w / 2.0, -h / 2.0, w, h));
            surface.reset_transform();
            surface.restore();
        }
        self.scale = scale;

        edited.update_angle(angle);
        self.apply_changes();
        log::info!("Rotated by {} degrees", angle);
    }

    /// Start cropping with a frame covering the preview.
    pub fn open_cut_frame(&mut self) {
        if self.surface.is_none() || self.edited.is_none() {
            return;
        }
        self.end_session();
        let crop = &self.config.crop;
        let frame = Frame::new(self.preview_size(), crop.min_size, crop.handle_radius);
        let listeners = vec![
            self.hub.subscribe(Target::Surface, &POINTER_CHANNELS),
            self.hub
                .subscribe(Target::Document, &[Channel::PointerMove, Channel::PointerUp]),
        ];
        let (l, t, r, b) = frame.edges();
        self.session = Session::Crop {
            frame,
            _listeners: listeners,
        };
        self.draw_cropped_image(l, t, r, b);
    }

    /// Lock or unlock the crop proportion. Returns false for unknown names.
    pub fn change_cut_proportion(&mut self, proportion: &str) -> bool {
        let Session::Crop { frame, .. } = &mut self.session else {
            return false;
        };
        if !frame.change_proportion(proportion) {
            return false;
        }
        let (l, t, r, b) = frame.edges();
        self.draw_cropped_image(l, t, r, b);
        true
    }

    /// Dim the preview and show the area inside the given edge offsets at
    /// full opacity.
    pub fn draw_cropped_image(&mut self, left: f64, top: f64, right: f64, bottom: f64) {
        self.redraw();
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let size = surface.size();
        surface.fill_rect(size.as_rect(), Rgba([0, 0, 0, self.config.crop.dim_alpha]));

        let width = size.width as f64 - right - left;
        let height = size.height as f64 - bottom - top;
        self.cropping(left + 1.0, top + 1.0, width - 2.0, height - 2.0);

        if let Session::Crop { frame, .. } = &self.session {
            let Some(surface) = self.surface.as_mut() else {
                return;
            };
            let white = Rgba([255, 255, 255, 255]);
            surface.stroke_rect(frame.rect(), 1.0, white);
            for point in frame.points() {
                surface.fill_rect(point, white);
            }
        }
    }

    /// Redraw the preview region `(x, y, width, height)` from the source.
    pub fn cropping(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (Some(surface), Some(edited)) = (self.surface.as_mut(), self.edited.as_ref()) else {
            return;
        };
        let dst = Rect::new(x, y, width, height);
        if dst.is_empty() || self.scale <= 0.0 {
            return;
        }
        surface.blit(&edited.working().image, dst.scaled(1.0 / self.scale), dst);
    }

    /// Commit a crop given as edge offsets from the preview margins.
    ///
    /// A crop covering the whole preview changes nothing and adds no history
    /// entry. The crop frame is closed either way.
    pub fn save_cropping(&mut self, left: f64, top: f64, right: f64, bottom: f64) -> bool {
        let canvas = self.preview_size();
        let width = canvas.width as f64 - right - left;
        let height = canvas.height as f64 - bottom - top;

        let mut committed = false;
        if !(width == canvas.width as f64 && height == canvas.height as f64) {
            if let Some(edited) = self.edited.as_mut() {
                if edited.update_crop(left, top, width, height) {
                    committed = self.apply_changes();
                }
            }
        } else {
            log::debug!("Crop covers the whole preview; nothing to do");
        }

        self.close_cut_frame();
        committed
    }

    /// Commit the crop currently shown by the frame.
    pub fn save_current_crop(&mut self) -> bool {
        let Session::Crop { frame, .. } = &self.session else {
            return false;
        };
        let (l, t, r, b) = frame.edges();
        self.save_cropping(l, t, r, b)
    }

    pub fn close_cut_frame(&mut self) {
        if matches!(self.session, Session::Crop { .. }) {
            self.end_session();
        }
        self.redraw();
    }

    /// Fit the working image into the viewport and draw it.
    pub fn redraw(&mut self) {
        if matches!(self.session, Session::Resize { .. }) {
            self.render_resize();
            return;
        }
        let (Some(surface), Some(edited)) = (self.surface.as_mut(), self.edited.as_ref()) else {
            return;
        };
        self.scale = edited.scale();
        let model = edited.size();
        let preview = model.scaled(self.scale);
        surface.set_size(preview.width, preview.height);
        surface.blit(&edited.working().image, model.as_rect(), preview.as_rect());
    }

    /// Make `annotation` the active tool.
    pub fn add_annotation(&mut self, mut annotation: Annotation) {
        if self.surface.is_none() || self.edited.is_none() {
            return;
        }
        self.end_session();
        annotation.state_mut().set_bounds(self.preview_size());

        let region = self.subscribe_region(&annotation);
        let document = self
            .hub
            .subscribe(Target::Document, &[Channel::PointerUp, Channel::KeyDown]);
        self.session = Session::Annotate {
            annotation,
            on_region: false,
            region: Some(region),
            _document: document,
        };
        self.cursor = Cursor::Crosshair;
        log::debug!("Annotation tool active");
    }

    fn subscribe_region(&self, annotation: &Annotation) -> Subscription {
        let target = match annotation {
            Annotation::Text(text) => Target::TextArea(text.area()),
            Annotation::Rectangle(_) => Target::Surface,
        };
        self.hub.subscribe(target, &POINTER_CHANNELS)
    }

    /// Re-render the image with the active annotation on top.
    pub fn draw_annotation(&mut self) {
        self.redraw();
        let (Some(surface), Session::Annotate { annotation, .. }) =
            (self.surface.as_mut(), &self.session)
        else {
            return;
        };
        let editing = annotation.mode() == Mode::Edit;
        if !(editing && annotation.is_text()) {
            annotation.draw(&mut *surface);
        }
        if editing && !annotation.is_text() {
            annotation.draw_handles(&mut *surface);
        }
    }

    /// Commit the active annotation into the image and close the tool.
    pub fn save_annotation(&mut self) -> bool {
        let Session::Annotate { annotation, .. } = &mut self.session else {
            return false;
        };
        let staged = match (annotation, self.edited.as_mut()) {
            (Annotation::Text(text), Some(edited)) => {
                text.set_text(self.overlay.text());
                edited.update_text_annotation(text)
            }
            (Annotation::Rectangle(rect), Some(edited)) => edited.update_annotation(rect),
            (_, None) => false,
        };
        let committed = staged && self.apply_changes();
        self.end_session();
        self.redraw();
        committed
    }

    /// Reset the active annotation so it can be drawn again.
    pub fn clear_annotation(&mut self) {
        let Session::Annotate { annotation, region, on_region, .. } = &mut self.session else {
            return;
        };
        annotation.clear();
        if let Annotation::Text(text) = annotation {
            self.overlay.close();
            // The old input region is gone; listen on its replacement
            let area = text.recreate_area();
            *region = Some(self.hub.subscribe(Target::TextArea(area), &POINTER_CHANNELS));
            *on_region = false;
        } else if region.is_none() {
            *region = Some(self.hub.subscribe(Target::Surface, &POINTER_CHANNELS));
        }
        log::debug!("Annotation cleared");
        self.redraw();
        self.cursor = Cursor::Crosshair;
    }

    /// Abandon the active annotation without touching the history.
    pub fn remove_annotation(&mut self) {
        if matches!(self.session, Session::Annotate { .. }) {
            self.end_session();
            self.redraw();
            self.cursor = Cursor::Auto;
        }
    }

    /// Commit staged edits into the history. Returns false when nothing
    /// was staged.
    pub fn apply_changes(&mut self) -> bool {
        self.edited.as_mut().is_some_and(EditedImage::commit)
    }

    /// Drop the active session and everything it listens to. A staged resize
    /// still pending is committed.
    fn end_session(&mut self) {
        match std::mem::replace(&mut self.session, Session::Idle) {
            Session::Idle => return,
            Session::Resize { .. } => {
                if self.edited.as_mut().is_some_and(EditedImage::commit) {
                    log::info!("Committed staged resize on leaving the tool");
                }
                // Back from the 1:1 positioning view to the fitted preview
                self.redraw();
            }
            Session::Annotate {
                annotation: Annotation::Text(_),
                ..
            } => self.overlay.close(),
            _ => {}
        }
        self.cursor = Cursor::Default;
        log::debug!("Session ended; {} listeners left", self.hub.listener_count());
    }

    /// Route one input event. Returns true when it was consumed by the
    /// active tool.
    pub fn handle_event(&mut self, target: Target, event: InputEvent) -> bool {
        if !self.hub.is_listening(target, event.channel()) {
            return false;
        }
        match self.session {
            Session::Idle => false,
            Session::Crop { .. } => self.crop_event(target, event),
            Session::Resize { .. } => self.resize_event(event),
            Session::Annotate { .. } => self.annotation_event(target, event),
        }
    }

    fn crop_event(&mut self, target: Target, event: InputEvent) -> bool {
        let Session::Crop { frame, .. } = &mut self.session else {
            return false;
        };
        match (target, event) {
            (Target::Surface, InputEvent::PointerDown(e)) => {
                frame.grab(e.pos);
                self.cursor = frame.cursor_at(e.pos);
            }
            (Target::Surface, InputEvent::PointerMove(e)) => self.cursor = frame.cursor_at(e.pos),
            (Target::Surface, InputEvent::PointerEnter) => frame.set_out(false),
            (Target::Surface, InputEvent::PointerLeave) => {
                frame.set_out(true);
                self.cursor = frame.cursor_at(Point::SENTINEL);
            }
            (Target::Document, InputEvent::PointerMove(e)) => {
                if frame.handle_mouse_move(e.pos) {
                    let (l, t, r, b) = frame.edges();
                    self.draw_cropped_image(l, t, r, b);
                }
            }
            (Target::Document, InputEvent::PointerUp(_)) => frame.release(),
            _ => return false,
        }
        true
    }

    fn resize_event(&mut self, event: InputEvent) -> bool {
        let Session::Resize { view, .. } = &mut self.session else {
            return false;
        };
        match event {
            InputEvent::PointerDown(e) => {
                view.pointer_down(e.pos);
                self.cursor = Cursor::Grabbing;
            }
            InputEvent::PointerMove(e) => {
                self.cursor = if view.is_dragging() {
                    Cursor::Grabbing
                } else {
                    Cursor::Grab
                };
                if view.pointer_move(e.pos) {
                    self.render_resize();
                }
            }
            InputEvent::PointerUp(_) | InputEvent::PointerLeave => {
                if matches!(event, InputEvent::PointerUp(_)) {
                    view.pointer_up();
                } else {
                    view.pointer_leave();
                }
                self.cursor = Cursor::Grab;
            }
            _ => return false,
        }
        true
    }

    fn annotation_event(&mut self, target: Target, event: InputEvent) -> bool {
        let Session::Annotate {
            annotation, on_region, ..
        } = &mut self.session
        else {
            return false;
        };

        let transition = match (target, event) {
            (Target::Document, InputEvent::KeyDown(Key::Delete)) => {
                self.clear_annotation();
                return true;
            }
            (Target::Document, InputEvent::KeyDown(_)) => return false,
            (Target::Document, InputEvent::PointerUp(_)) => annotation.release_outside(*on_region),
            (_, InputEvent::PointerEnter) => {
                *on_region = true;
                Transition::None
            }
            (_, InputEvent::PointerLeave) => {
                *on_region = false;
                Transition::None
            }
            (_, InputEvent::PointerDown(e)) => {
                *on_region = true;
                annotation.pointer_down(e.pos)
            }
            (_, InputEvent::PointerMove(e)) => annotation.pointer_move(e.pos, e.primary_only()),
            (_, InputEvent::PointerUp(e)) => annotation.pointer_up(e.pos),
            _ => return false,
        };
        self.apply_transition(transition);
        true
    }

    fn apply_transition(&mut self, transition: Transition) {
        match transition {
            Transition::None | Transition::Pressed | Transition::ClickPlaced => {}
            Transition::Preview | Transition::DragEnded => self.draw_annotation(),
            Transition::Hover => {}
            Transition::Committed => self.annotation_placed(),
        }
        if let Session::Annotate { annotation, .. } = &self.session {
            self.cursor = match annotation.mode() {
                Mode::Draw => Cursor::Crosshair,
                Mode::Edit if annotation.is_text() => Cursor::Auto,
                Mode::Edit => annotation.state().cursor(),
            };
        }
    }

    /// Placement finished: rectangles show their handles, text boxes open
    /// the input overlay and stop listening for pointer input.
    fn annotation_placed(&mut self) {
        let Session::Annotate { annotation, region, .. } = &mut self.session else {
            return;
        };
        match annotation {
            Annotation::Text(text) => {
                let rect = text.rect();
                *region = None;
                self.redraw();
                if let Some(rect) = rect {
                    self.overlay.open(rect);
                }
            }
            Annotation::Rectangle(_) => self.draw_annotation(),
        }
        log::info!("Annotation placed");
    }
}

/// Convenience for hosts that forward raw pointer data.
pub fn pointer(x: f64, y: f64, buttons: u8) -> PointerEvent {
    PointerEvent {
        pos: Point::new(x, y),
        buttons,
    }
}
