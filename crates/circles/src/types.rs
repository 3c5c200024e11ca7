use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CircleError, Result};

/// Tunable inputs of the Hough gradient transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DetectionParameters {
    /// Inverse ratio of accumulator resolution to image resolution
    pub dp: f64,
    /// Minimum distance between detected centers, in pixels
    pub min_dist: f64,
    /// Upper threshold of the Canny edge detector
    pub param1: f64,
    /// Accumulator threshold for circle centers
    pub param2: f64,
    pub min_radius: u32,
    pub max_radius: u32,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            dp: 1.2,
            min_dist: 100.0,
            param1: 50.0,
            param2: 30.0,
            min_radius: 10,
            max_radius: 200,
        }
    }
}

impl DetectionParameters {
    /// Copy of these parameters with the radius bounds replaced where given.
    pub fn with_radius_overrides(mut self, min_radius: Option<u32>, max_radius: Option<u32>) -> Self {
        if let Some(min_radius) = min_radius {
            self.min_radius = min_radius;
        }
        if let Some(max_radius) = max_radius {
            self.max_radius = max_radius;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(CircleError::InvalidParameter(format!(
                    "{name} must be a positive number, got {value}"
                )))
            }
        };
        positive("dp", self.dp)?;
        positive("min_dist", self.min_dist)?;
        positive("param1", self.param1)?;
        positive("param2", self.param2)?;

        if self.min_radius == 0 {
            return Err(CircleError::InvalidParameter(
                "min_radius must be greater than 0".to_string(),
            ));
        }
        if self.min_radius >= self.max_radius {
            return Err(CircleError::InvalidParameter(format!(
                "min_radius ({}) must be less than max_radius ({})",
                self.min_radius, self.max_radius
            )));
        }
        Ok(())
    }
}

/// Integer pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct Circle {
    pub center: Point,
    pub radius: u32,
}

impl Circle {
    pub fn new(x: i32, y: i32, radius: u32) -> Self {
        Self {
            center: Point { x, y },
            radius,
        }
    }

    /// Bounding square `center ± radius` clipped to a `width` x `height` image.
    ///
    /// Returns `None` when the square does not overlap the image at all.
    pub fn clipped_bounds(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let r = i64::from(self.radius);
        let (cx, cy) = (i64::from(self.center.x), i64::from(self.center.y));

        let x0 = (cx - r).max(0);
        let y0 = (cy - r).max(0);
        let x1 = (cx + r + 1).min(i64::from(width));
        let y1 = (cy + r + 1).min(i64::from(height));

        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        Some(BoundingBox {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct DetectionResult {
    pub count: usize,
    /// Mean radius, 0 when nothing was found
    pub average_radius: f64,
    pub min_radius: u32,
    pub max_radius: u32,
    /// Population standard deviation of the radii
    pub std_radius: f64,
    pub image_width: u32,
    pub image_height: u32,
    pub circles: Vec<Circle>,
}

impl DetectionResult {
    pub fn new(circles: Vec<Circle>, image_width: u32, image_height: u32) -> Self {
        let count = circles.len();
        let (average_radius, std_radius) = if count == 0 {
            (0.0, 0.0)
        } else {
            let n = count as f64;
            let mean = circles.iter().map(|c| f64::from(c.radius)).sum::<f64>() / n;
            let variance = circles
                .iter()
                .map(|c| (f64::from(c.radius) - mean).powi(2))
                .sum::<f64>()
                / n;
            (mean, variance.sqrt())
        };

        Self {
            count,
            average_radius,
            min_radius: circles.iter().map(|c| c.radius).min().unwrap_or(0),
            max_radius: circles.iter().map(|c| c.radius).max().unwrap_or(0),
            std_radius,
            image_width,
            image_height,
            circles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// A detected circle cut out of its source image.
#[derive(Debug, Clone)]
pub struct ExtractedCircle {
    /// 1-based position in detection order
    pub id: usize,
    pub circle: Circle,
    pub bounds: BoundingBox,
    pub image: image::RgbaImage,
}
