use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_text_mut},
    rect::Rect,
};

use crate::{
    error::{CircleError, Result},
    types::{Circle, DetectionResult},
};

/// 3x5 bitmap glyphs for radius labels, one row per entry, high bit on the left.
fn glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'r' => [0b000, 0b101, 0b110, 0b100, 0b100],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        _ => [0; 5],
    }
}

/// How radius labels are drawn
#[derive(Clone)]
pub enum LabelFace {
    /// Built-in blocky digits, `scale` screen pixels per glyph pixel
    Bitmap { scale: u32 },
    /// A TrueType/OpenType font loaded at runtime
    Font { font: FontArc, scale: PxScale },
}

impl Default for LabelFace {
    fn default() -> Self {
        Self::Bitmap { scale: 2 }
    }
}

impl std::fmt::Debug for LabelFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bitmap { scale } => f.debug_struct("Bitmap").field("scale", scale).finish(),
            Self::Font { scale, .. } => f.debug_struct("Font").field("scale", &scale.y).finish(),
        }
    }
}

/// Draws detection overlays onto a copy of the source image
#[derive(Debug, Clone)]
pub struct Renderer {
    pub outline_color: Rgb<u8>,
    pub outline_thickness: u32,
    pub center_color: Rgb<u8>,
    pub center_radius: i32,
    pub label_color: Rgb<u8>,
    pub label_face: LabelFace,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            outline_color: Rgb([0, 255, 0]),
            outline_thickness: 2,
            center_color: Rgb([255, 0, 0]),
            center_radius: 3,
            label_color: Rgb([255, 255, 255]),
            label_face: LabelFace::default(),
        }
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a font file for labels instead of the bitmap digits
    pub fn with_font_file<P: AsRef<Path>>(self, path: P, size: f32) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| {
            CircleError::InvalidParameter(format!("{}: {e}", path.as_ref().display()))
        })?;
        Ok(self.with_font(font, size))
    }

    pub fn with_font(mut self, font: FontArc, size: f32) -> Self {
        self.label_face = LabelFace::Font {
            font,
            scale: PxScale::from(size),
        };
        self
    }

    /// Render every circle of `result` onto a fresh RGB copy of `image`.
    pub fn render(&self, image: &DynamicImage, result: &DetectionResult) -> RgbImage {
        let mut canvas = image.to_rgb8();
        for circle in &result.circles {
            self.draw_circle(&mut canvas, circle);
        }
        canvas
    }

    fn draw_circle(&self, canvas: &mut RgbImage, circle: &Circle) {
        let center = (circle.center.x, circle.center.y);
        let radius = circle.radius as i32;

        // Thickness grows inwards from the detected radius
        for t in 0..self.outline_thickness as i32 {
            let r = radius - t;
            if r >= 0 {
                draw_hollow_circle_mut(canvas, center, r, self.outline_color);
            }
        }
        draw_filled_circle_mut(canvas, center, self.center_radius, self.center_color);

        let label = format!("r={}", circle.radius);
        self.draw_label(canvas, circle.center.x - 20, circle.center.y - radius - 10, &label);
    }

    fn draw_label(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str) {
        match &self.label_face {
            LabelFace::Font { font, scale } => {
                draw_text_mut(canvas, self.label_color, x, y, *scale, font, text);
            }
            LabelFace::Bitmap { scale } => {
                let scale = (*scale).max(1);
                let step = scale as i32;
                let mut pen_x = x;
                for c in text.chars() {
                    for (row, bits) in glyph(c).iter().enumerate() {
                        for col in 0..3 {
                            if bits & (0b100 >> col) != 0 {
                                let rect = Rect::at(pen_x + col * step, y + row as i32 * step)
                                    .of_size(scale, scale);
                                draw_filled_rect_mut(canvas, rect, self.label_color);
                            }
                        }
                    }
                    pen_x += 4 * step;
                }
            }
        }
    }
}
