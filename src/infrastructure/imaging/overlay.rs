use crate::domain::annotation::entity::Vertex;
use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgba};
use imageproc::drawing::{draw_hollow_polygon_mut, draw_text_mut};
use imageproc::point::Point;
use std::path::Path;

/// Drawing options passed explicitly to every overlay call.
///
/// Without a font, text is skipped and only outlines are drawn.
#[derive(Clone)]
pub struct OverlayStyle {
    pub font: Option<FontArc>,
    pub font_size: f32,
    pub text_color: Rgba<u8>,
    pub stroke_color: Rgba<u8>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 14.0,
            text_color: Rgba([0, 0, 0, 255]),
            stroke_color: Rgba([255, 0, 0, 255]),
        }
    }
}

impl std::fmt::Debug for OverlayStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayStyle")
            .field("font", &self.font.as_ref().map(|_| "<font>"))
            .field("font_size", &self.font_size)
            .field("text_color", &self.text_color)
            .field("stroke_color", &self.stroke_color)
            .finish()
    }
}

impl OverlayStyle {
    pub fn with_font_file(mut self, path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Failed to read font {}: {}", path.display(), e))?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| anyhow::anyhow!("Invalid font {}: {}", path.display(), e))?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }
}

/// Returns false when no font is configured and nothing was drawn.
pub fn draw_text(image: &mut DynamicImage, text: &str, x: i32, y: i32, style: &OverlayStyle) -> bool {
    let Some(font) = style.font.as_ref() else {
        return false;
    };
    draw_text_mut(
        image,
        style.text_color,
        x,
        y,
        PxScale::from(style.font_size),
        font,
        text,
    );
    true
}

/// Outline a closed polygon. Fewer than two distinct points draws nothing.
pub fn draw_polygon(image: &mut DynamicImage, vertices: &[Vertex], style: &OverlayStyle) -> bool {
    let mut points: Vec<Point<f32>> = vertices
        .iter()
        .map(|v| Point::new(v.x as f32, v.y as f32))
        .collect();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 2 {
        return false;
    }
    draw_hollow_polygon_mut(image, &points, style.stroke_color);
    true
}
