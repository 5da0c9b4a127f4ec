// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Authoritative edited-image state and its undo history.
//!
//! Edits are staged onto a single pending snapshot and become part of the
//! history only on [`EditedImage::commit`]. Every history entry is an
//! immutable snapshot holding fully materialised pixels, so moving the
//! cursor never has to replay operations.

use super::history::History;
use super::rectangle::RectangleAnnotation;
use super::text::TextAnnotation;
use crate::render::raster::{self, Affine};
use crate::render::text::TextRenderer;
use crate::util::geometry::{
    fit_scale, is_quarter_turn, preview_to_model, rotated_bounds, Point, Rect, Size,
};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// A committed annotation, in the model space of the snapshot it was
/// committed into.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationRecord {
    Rectangle {
        rect: Rect,
        stroke_width: f64,
        color: Rgba<u8>,
    },
    Text {
        rect: Rect,
        text: String,
        font_size: f64,
        color: Rgba<u8>,
    },
}

/// Immutable editable state recorded in the history.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Materialised pixels
    pub image: Arc<RgbaImage>,
    /// Cumulative rotation in degrees, in `[0, 360)`
    pub angle: f64,
    /// Last crop applied, in the model space of the previous snapshot
    pub crop: Option<Rect>,
    /// Every annotation committed so far
    pub annotations: Vec<AnnotationRecord>,
}

impl Snapshot {
    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

/// The image being edited.
pub struct EditedImage {
    base: Arc<RgbaImage>,
    history: History<Snapshot>,
    /// Staged edits not yet in the history
    pending: Option<Snapshot>,
    max_width: u32,
    max_height: u32,
    text: Option<Arc<TextRenderer>>,
}

impl EditedImage {
    /// Start editing `base`; the history holds just the original.
    pub fn new(base: RgbaImage, max_width: u32, max_height: u32, history_limit: usize) -> Self {
        let base = Arc::new(base);
        let initial = Snapshot {
            image: Arc::clone(&base),
            angle: 0.0,
            crop: None,
            annotations: Vec::new(),
        };
        log::info!("Editing {}x{} image", base.width(), base.height());

        Self {
            base,
            history: History::with_limit(initial, history_limit),
            pending: None,
            max_width,
            max_height,
            text: None,
        }
    }

    pub fn set_text_renderer(&mut self, text: Option<Arc<TextRenderer>>) {
        self.text = text;
    }

    pub fn base(&self) -> &Arc<RgbaImage> {
        &self.base
    }

    /// Pixels of the live history entry.
    pub fn current(&self) -> &Arc<RgbaImage> {
        &self.history.current().image
    }

    /// The staged snapshot if any, otherwise the live history entry.
    pub fn working(&self) -> &Snapshot {
        self.pending.as_ref().unwrap_or_else(|| self.history.current())
    }

    /// Model dimensions of the working state.
    pub fn size(&self) -> Size {
        self.working().size()
    }

    /// Preview-to-model ratio for the working state.
    pub fn scale(&self) -> f64 {
        fit_scale(self.size(), self.max_width, self.max_height)
    }

    pub fn angle(&self) -> f64 {
        self.working().angle
    }

    pub fn annotations(&self) -> &[AnnotationRecord] {
        &self.working().annotations
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_index(&self) -> usize {
        self.history.index()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_at_start(&self) -> bool {
        self.history.is_at_start()
    }

    pub fn is_at_end(&self) -> bool {
        self.history.is_at_end()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn staging(&mut self) -> &mut Snapshot {
        let history = &self.history;
        self.pending.get_or_insert_with(|| history.current().clone())
    }

    /// Stage a resample to `width x height` without touching the history.
    pub fn temp_update_size(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return false;
        }
        let staged = self.staging();
        let resized = imageops::resize(staged.image.as_ref(), width, height, FilterType::Triangle);
        staged.image = Arc::new(resized);
        log::debug!("Staged resize to {}x{}", width, height);
        true
    }

    /// Stage a crop given in preview pixels.
    ///
    /// The rectangle is converted to model space by dividing by the current
    /// scale and clamped to the image. Returns false when nothing is left.
    pub fn update_crop(&mut self, x: f64, y: f64, width: f64, height: f64) -> bool {
        let scale = self.scale();
        let size = self.size();
        let model = preview_to_model(Rect::new(x, y, width, height), scale)
            .rounded()
            .clamped_to(size.width as f64, size.height as f64);
        if model.is_empty() {
            log::warn!("Ignoring empty crop {:?}", model);
            return false;
        }

        let staged = self.staging();
        let cropped = imageops::crop_imm(
            staged.image.as_ref(),
            model.x as u32,
            model.y as u32,
            model.width as u32,
            model.height as u32,
        )
        .to_image();
        staged.image = Arc::new(cropped);
        staged.crop = Some(model);
        log::debug!("Staged crop {:?}", model);
        true
    }

    /// Stage a rotation by `degrees` about the image centre.
    ///
    /// Quarter turns swap width and height. Other angles keep the whole
    /// rotated bounding box, leaving the corners transparent.
    pub fn update_angle(&mut self, degrees: f64) {
        let staged = self.staging();
        staged.image = Arc::new(rotate_image(staged.image.as_ref(), degrees));
        staged.angle = (staged.angle + degrees).rem_euclid(360.0);
        log::debug!("Staged rotation by {} (total {})", degrees, staged.angle);
    }

    /// Burn a committed rectangle annotation into the staged pixels.
    pub fn update_annotation(&mut self, annotation: &RectangleAnnotation) -> bool {
        let Some(preview) = annotation.rect() else {
            return false;
        };
        let scale = self.scale();
        let rect = preview_to_model(preview, scale);
        let stroke_width = annotation.style().stroke_width / scale;
        let color = annotation.style().stroke();

        let staged = self.staging();
        raster::stroke_rect(
            Arc::make_mut(&mut staged.image),
            rect,
            stroke_width,
            color,
            &Affine::IDENTITY,
        );
        staged.annotations.push(AnnotationRecord::Rectangle {
            rect,
            stroke_width,
            color,
        });
        log::debug!("Staged rectangle annotation {:?}", rect);
        true
    }

    /// Burn a committed text annotation into the staged pixels.
    pub fn update_text_annotation(&mut self, annotation: &TextAnnotation) -> bool {
        let Some(preview) = annotation.rect() else {
            return false;
        };
        if annotation.text().trim().is_empty() {
            log::debug!("Skipping empty text annotation");
            return false;
        }
        let scale = self.scale();
        let rect = preview_to_model(preview, scale);
        let font_size = annotation.style().font_size / scale;
        let color = annotation.style().text();
        let text = annotation.text().to_string();
        let renderer = self.text.clone();

        let staged = self.staging();
        match renderer {
            Some(renderer) => renderer.draw_text(
                Arc::make_mut(&mut staged.image),
                &text,
                Point::new(rect.x, rect.y),
                font_size,
                rect.width,
                color,
            ),
            None => {
                log::warn!("No text renderer installed; keeping text annotation as a record only")
            }
        }
        staged.annotations.push(AnnotationRecord::Text {
            rect,
            text,
            font_size,
            color,
        });
        log::debug!("Staged text annotation {:?}", rect);
        true
    }

    /// Append the staged snapshot to the history. Returns false if nothing
    /// was staged.
    pub fn commit(&mut self) -> bool {
        let Some(snapshot) = self.pending.take() else {
            return false;
        };
        self.history.push(snapshot);
        log::info!(
            "Committed edit {} of {} ({}x{})",
            self.history.index() + 1,
            self.history.len(),
            self.size().width,
            self.size().height
        );
        true
    }

    /// Drop staged edits.
    pub fn discard_pending(&mut self) {
        if self.pending.take().is_some() {
            log::debug!("Discarded staged edits");
        }
    }

    /// Undo one step. Staged edits are discarded.
    pub fn back_history(&mut self) -> bool {
        self.discard_pending();
        self.history.back()
    }

    /// Redo one step. Staged edits are discarded.
    pub fn forward_history(&mut self) -> bool {
        self.discard_pending();
        self.history.forward()
    }
}

/// Rotate `source` clockwise by `degrees` about its centre.
fn rotate_image(source: &RgbaImage, degrees: f64) -> RgbaImage {
    if is_quarter_turn(degrees) {
        return match ((degrees / 90.0).round() as i64).rem_euclid(4) {
            1 => imageops::rotate90(source),
            2 => imageops::rotate180(source),
            3 => imageops::rotate270(source),
            _ => source.clone(),
        };
    }

    let size = Size::new(source.width(), source.height());
    let bounds = rotated_bounds(size, degrees);
    let mut target = RgbaImage::new(bounds.width, bounds.height);
    let transform = Affine::IDENTITY
        .translated(bounds.width as f64 / 2.0, bounds.height as f64 / 2.0)
        .rotated(degrees.to_radians());
    let (w, h) = (size.width as f64, size.height as f64);
    raster::draw_image(
        &mut target,
        source,
        size.as_rect(),
        Rect::new(-w / 2.0, -h / 2.0, w, h),
        &transform,
    );
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::AnnotationStyle;
    use crate::models::annotation::AnnotationShape;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255]))
    }

    fn editor() -> EditedImage {
        EditedImage::new(gradient(1200, 800), 643, 400, 50)
    }

    #[test]
    fn test_initial_scale() {
        let image = editor();
        assert!((image.scale() - 0.5).abs() < 1e-12);
        assert_eq!(image.size().scaled(image.scale()), Size::new(600, 400));
        assert_eq!(image.history_len(), 1);
        assert!(!image.can_undo());
    }

    #[test]
    fn test_crop_divides_by_scale() {
        let mut image = editor();
        // l=t=r=b=10 on a 600x400 preview
        assert!(image.update_crop(10.0, 10.0, 580.0, 380.0));
        assert!(image.commit());

        let snapshot = image.working();
        assert_eq!(snapshot.crop, Some(Rect::new(20.0, 20.0, 1160.0, 760.0)));
        assert_eq!(image.size(), Size::new(1160, 760));
        assert_eq!(image.history_len(), 2);
        // Pixel (0,0) of the crop was (20,20) of the original
        assert_eq!(*image.current().get_pixel(0, 0), Rgba([20, 20, 0, 255]));
    }

    #[test]
    fn test_staging_does_not_touch_history() {
        let mut image = editor();
        assert!(image.temp_update_size(300, 200));
        assert_eq!(image.history_len(), 1);
        assert_eq!(image.size(), Size::new(300, 200));
        assert_eq!(image.current().dimensions(), (1200, 800));

        image.discard_pending();
        assert_eq!(image.size(), Size::new(1200, 800));
        assert!(!image.commit());
    }

    #[test]
    fn test_quarter_turn_swaps_dimensions() {
        let mut image = editor();
        image.update_angle(90.0);
        image.commit();
        assert_eq!(image.size(), Size::new(800, 1200));
        assert_eq!(image.angle(), 90.0);

        image.update_angle(-90.0);
        image.commit();
        assert_eq!(image.size(), Size::new(1200, 800));
        assert_eq!(image.angle(), 0.0);
    }

    #[test]
    fn test_free_rotation_keeps_bounding_box() {
        let mut image = EditedImage::new(gradient(100, 100), 643, 400, 50);
        image.update_angle(45.0);
        image.commit();
        assert_eq!(image.size(), Size::new(141, 141));
        // Corners are transparent, the centre is not
        assert_eq!(image.current().get_pixel(0, 0)[3], 0);
        assert_eq!(image.current().get_pixel(70, 70)[3], 255);
    }

    #[test]
    fn test_undo_discards_pending_and_moves_cursor() {
        let mut image = editor();
        image.update_angle(90.0);
        image.commit();
        image.temp_update_size(10, 10);

        assert!(image.back_history());
        assert!(!image.has_pending());
        assert_eq!(image.size(), Size::new(1200, 800));
        assert!(!image.back_history());
        assert_eq!(image.history_index(), 0);
        assert!(image.forward_history());
        assert_eq!(image.size(), Size::new(800, 1200));
    }

    #[test]
    fn test_rectangle_annotation_is_burned_in_model_space() {
        let mut image = editor();
        let mut annotation =
            RectangleAnnotation::new(Size::new(600, 400), AnnotationStyle::default());
        annotation.state_mut().set_start_point(Point::new(50.0, 50.0));
        annotation.state_mut().move_end_point(Point::new(150.0, 120.0));

        assert!(image.update_annotation(&annotation));
        assert!(image.commit());

        match &image.annotations()[0] {
            AnnotationRecord::Rectangle { rect, stroke_width, .. } => {
                assert_eq!(*rect, Rect::new(100.0, 100.0, 200.0, 140.0));
                assert_eq!(*stroke_width, 4.0);
            }
            other => panic!("unexpected record {other:?}"),
        }
        assert_eq!(*image.current().get_pixel(101, 150), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.current().get_pixel(150, 150), Rgba([150, 150, 0, 255]));
    }

    #[test]
    fn test_empty_text_is_not_recorded() {
        let mut image = editor();
        let mut annotation = TextAnnotation::new(Size::new(600, 400), AnnotationStyle::default());
        annotation.state_mut().set_start_point(Point::new(10.0, 10.0));
        annotation.state_mut().move_end_point(Point::new(100.0, 40.0));

        assert!(!image.update_text_annotation(&annotation));
        annotation.set_text("label".to_string());
        assert!(image.update_text_annotation(&annotation));
        assert!(image.commit());
        assert!(matches!(
            &image.annotations()[0],
            AnnotationRecord::Text { text, .. } if text == "label"
        ));
    }

    #[test]
    fn test_accented_text_is_burned_in() {
        let mut image = editor();
        let renderer = TextRenderer::egui_default().expect("bundled fonts parse");
        image.set_text_renderer(Some(Arc::new(renderer)));
        let mut annotation = TextAnnotation::new(Size::new(600, 400), AnnotationStyle::default());
        annotation.state_mut().set_start_point(Point::new(10.0, 10.0));
        annotation.state_mut().move_end_point(Point::new(100.0, 40.0));
        annotation.set_text("é".to_string());

        assert!(image.update_text_annotation(&annotation));
        assert!(image.commit());
        // Model rect is (20, 20, 180, 60); count pixels the glyph changed
        let original = gradient(1200, 800);
        let changed = (20..80)
            .flat_map(|y| (20..200).map(move |x| (x, y)))
            .filter(|&(x, y)| image.current().get_pixel(x, y) != original.get_pixel(x, y))
            .count();
        assert!(changed > 20, "only {changed} pixels changed");
    }
}
