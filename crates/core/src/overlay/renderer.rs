use ab_glyph::PxScale;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut,
};
use imageproc::rect::Rect;

use crate::detection::domain::face_detection::FaceDetection;
use crate::detection::domain::face_record::FaceRecord;
use crate::overlay::canvas::OverlayCanvas;
use crate::overlay::font::OverlayFont;

const BOX_COLOR: Rgba<u8> = Rgba([64, 160, 255, 255]);
const LANDMARK_COLOR: Rgba<u8> = Rgba([80, 220, 120, 255]);
const MESH_COLOR: Rgba<u8> = Rgba([255, 90, 90, 255]);
const PANEL_COLOR: Rgba<u8> = Rgba([20, 20, 20, 170]);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BAR_TRACK_COLOR: Rgba<u8> = Rgba([30, 30, 30, 140]);
const BAR_FILL_COLOR: Rgba<u8> = Rgba([255, 200, 60, 230]);

const LANDMARK_DOT_RADIUS: i32 = 1;
const MESH_POINT_RADIUS: i32 = 2;

const PANEL_LINE_HEIGHT: u32 = 16;
const PANEL_PADDING: u32 = 5;
const PANEL_MIN_WIDTH: u32 = 150;
const PANEL_TEXT_SCALE: f32 = 14.0;

const BAR_TRACK_WIDTH: u32 = 72;
const BAR_HEIGHT: u32 = 8;
const BAR_GAP: u32 = 3;
const BAR_TEXT_SCALE: f32 = 10.0;

/// How detected faces are visualized on the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    /// Landmark points as small dots.
    Landmarks,
    /// One horizontal bar per expression category, length proportional to
    /// its probability.
    ExpressionBars,
    /// Landmark points as larger filled circles. Points stay isolated; no
    /// connecting edges are drawn between them.
    PointMesh,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 3] = [
        DisplayMode::Landmarks,
        DisplayMode::ExpressionBars,
        DisplayMode::PointMesh,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DisplayMode::Landmarks => "Landmarks",
            DisplayMode::ExpressionBars => "Expression bars",
            DisplayMode::PointMesh => "Point mesh",
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-cycle view settings applied by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    pub mode: DisplayMode,
    pub show_details: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Landmarks,
            show_details: true,
        }
    }
}

/// Redraws the overlay for one cycle's results.
///
/// The canvas is cleared first, then every face gets its bounding box, the
/// mode-specific layer, and (when enabled) the details panel. Nothing
/// accumulates across calls, so stale drawings cannot survive a redraw.
pub fn render(
    canvas: &mut OverlayCanvas,
    detections: &[FaceDetection],
    records: &[FaceRecord],
    options: &RenderOptions,
    font: Option<&OverlayFont>,
) {
    canvas.clear();
    let image = canvas.image_mut();
    for (detection, record) in detections.iter().zip(records.iter()) {
        let (bx, by, bw, bh) = detection.bounding_box.to_pixel_rect();
        let (bx, by) = (bx as i32, by as i32);
        draw_box_outline(image, bx, by, bw, bh);
        match options.mode {
            DisplayMode::Landmarks => {
                draw_landmark_points(image, detection, LANDMARK_DOT_RADIUS, LANDMARK_COLOR);
            }
            DisplayMode::ExpressionBars => {
                draw_expression_bars(image, detection, bx, by + bh as i32, font);
            }
            DisplayMode::PointMesh => {
                draw_landmark_points(image, detection, MESH_POINT_RADIUS, MESH_COLOR);
            }
        }
        if options.show_details {
            draw_details_panel(image, record, bx, by, bw, font);
        }
    }
}

// ---------------------------------------------------------------------------

fn draw_box_outline(image: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32) {
    if width == 0 || height == 0 {
        return;
    }
    draw_hollow_rect_mut(image, Rect::at(x, y).of_size(width, height), BOX_COLOR);
    // Second inset outline thickens the box to two pixels
    if width > 2 && height > 2 {
        draw_hollow_rect_mut(
            image,
            Rect::at(x + 1, y + 1).of_size(width - 2, height - 2),
            BOX_COLOR,
        );
    }
}

fn draw_landmark_points(
    image: &mut RgbaImage,
    detection: &FaceDetection,
    radius: i32,
    color: Rgba<u8>,
) {
    for point in &detection.landmarks {
        let center = (point.x.round() as i32, point.y.round() as i32);
        draw_filled_circle_mut(image, center, radius, color);
    }
}

fn draw_expression_bars(
    image: &mut RgbaImage,
    detection: &FaceDetection,
    x: i32,
    top: i32,
    font: Option<&OverlayFont>,
) {
    for (index, (expression, probability)) in detection.expressions.iter().enumerate() {
        let y = top + 2 + index as i32 * (BAR_HEIGHT + BAR_GAP) as i32;
        draw_filled_rect_mut(
            image,
            Rect::at(x, y).of_size(BAR_TRACK_WIDTH, BAR_HEIGHT),
            BAR_TRACK_COLOR,
        );
        let fill = (probability.clamp(0.0, 1.0) * BAR_TRACK_WIDTH as f32).round() as u32;
        if fill > 0 {
            draw_filled_rect_mut(image, Rect::at(x, y).of_size(fill, BAR_HEIGHT), BAR_FILL_COLOR);
        }
        if let Some(font) = font {
            draw_text_mut(
                image,
                TEXT_COLOR,
                x + BAR_TRACK_WIDTH as i32 + 4,
                y - 1,
                PxScale::from(BAR_TEXT_SCALE),
                font.as_font(),
                expression.name(),
            );
        }
    }
}

fn draw_details_panel(
    image: &mut RgbaImage,
    record: &FaceRecord,
    x: i32,
    box_top: i32,
    box_width: u32,
    font: Option<&OverlayFont>,
) {
    let lines = record.panel_lines();
    let height = 2 * PANEL_LINE_HEIGHT + 2 * PANEL_PADDING;
    let width = box_width.max(PANEL_MIN_WIDTH);
    // Sits above the box, clamped back inside the frame near the top edge
    let y = (box_top - height as i32).max(0);
    draw_filled_rect_mut(image, Rect::at(x, y).of_size(width, height), PANEL_COLOR);
    if let Some(font) = font {
        for (index, line) in lines.iter().enumerate() {
            draw_text_mut(
                image,
                TEXT_COLOR,
                x + PANEL_PADDING as i32,
                y + PANEL_PADDING as i32 + index as i32 * PANEL_LINE_HEIGHT as i32,
                PxScale::from(PANEL_TEXT_SCALE),
                font.as_font(),
                line,
            );
        }
    }
}
