use image::GrayImage;
use crate::{error::Result, types::{Circle, DetectionParameters}};

/// Trait for image preprocessing algorithms
pub trait ImagePreprocessor: Send + Sync {
    /// Preprocess the intensity image (e.g., denoise) before the transform runs
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for circle transform algorithms
pub trait CircleTransform: Send + Sync {
    /// Find circles in a preprocessed intensity image.
    ///
    /// Circles come back in the transform's native order. An empty vector is a
    /// valid outcome, not an error.
    fn find_circles(&self, image: &GrayImage, params: &DetectionParameters) -> Result<Vec<Circle>>;
}
