use image::{DynamicImage, Rgba, imageops};
use tracing::debug;

use crate::types::{DetectionResult, ExtractedCircle};

/// Crops each detected circle out of its source image
#[derive(Debug, Clone)]
pub struct CircleExtractor {
    /// Clear pixels of the crop that fall outside the circle
    pub mask_outside: bool,
}

impl Default for CircleExtractor {
    fn default() -> Self {
        Self { mask_outside: true }
    }
}

impl CircleExtractor {
    /// One crop per circle, in detection order.
    ///
    /// Crops are clipped to the image; circles whose bounding square misses the
    /// image entirely are skipped. Ids are 1-based detection positions, so a
    /// skipped circle leaves a gap.
    pub fn extract(&self, image: &DynamicImage, result: &DetectionResult) -> Vec<ExtractedCircle> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        result
            .circles
            .iter()
            .enumerate()
            .filter_map(|(i, circle)| {
                let Some(bounds) = circle.clipped_bounds(width, height) else {
                    debug!(id = i + 1, ?circle, "circle lies outside the image, skipping");
                    return None;
                };

                let mut crop = imageops::crop_imm(&rgba, bounds.x, bounds.y, bounds.width, bounds.height)
                    .to_image();

                if self.mask_outside {
                    let r_sq = i64::from(circle.radius).pow(2);
                    for (px, py, pixel) in crop.enumerate_pixels_mut() {
                        let dx = i64::from(bounds.x + px) - i64::from(circle.center.x);
                        let dy = i64::from(bounds.y + py) - i64::from(circle.center.y);
                        if dx * dx + dy * dy > r_sq {
                            *pixel = Rgba([0, 0, 0, 0]);
                        }
                    }
                }

                Some(ExtractedCircle {
                    id: i + 1,
                    circle: *circle,
                    bounds,
                    image: crop,
                })
            })
            .collect()
    }
}
