pub mod builder;

use image::{DynamicImage, GrayImage};
use tracing::info;

use crate::{
    error::{CircleError, Result},
    traits::{CircleTransform, ImagePreprocessor},
    types::{DetectionParameters, DetectionResult},
};

/// Grayscale conversion, preprocessing stages and a circle transform, run in order
pub struct Detector {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    transform: Box<dyn CircleTransform>,
    params: DetectionParameters,
}

impl Detector {
    /// Create a new detector builder
    pub fn builder() -> builder::DetectorBuilder {
        builder::DetectorBuilder::new()
    }

    /// Create a new detector with the given components
    pub fn new(
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        transform: Box<dyn CircleTransform>,
        params: DetectionParameters,
    ) -> Self {
        Self {
            preprocessors,
            transform,
            params,
        }
    }

    /// Parameters used by [`Detector::detect`]
    pub fn params(&self) -> &DetectionParameters {
        &self.params
    }

    /// Detect circles using the detector's own parameters
    pub fn detect(&self, image: &DynamicImage) -> Result<DetectionResult> {
        self.detect_with(image, &self.params)
    }

    /// Detect circles with per-call parameters
    pub fn detect_with(&self, image: &DynamicImage, params: &DetectionParameters) -> Result<DetectionResult> {
        self.detect_gray(&image.to_luma8(), params)
    }

    /// Detect circles in an image that is already single-channel
    pub fn detect_gray(&self, image: &GrayImage, params: &DetectionParameters) -> Result<DetectionResult> {
        params.validate()?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CircleError::InvalidImage("image has zero size".to_string()));
        }

        let mut processed = image.clone();
        for preprocessor in &self.preprocessors {
            processed = preprocessor.preprocess(&processed)?;
        }

        let circles = self.transform.find_circles(&processed, params)?;
        let result = DetectionResult::new(circles, width, height);

        info!(
            count = result.count,
            average_radius = result.average_radius,
            width,
            height,
            "circle detection finished"
        );
        Ok(result)
    }

    /// Get information about the detector configuration
    pub fn info(&self) -> String {
        format!(
            "Detector: {} preprocessors, 1 circle transform, dp={}, min_dist={}, param1={}, param2={}, radius {}..{}",
            self.preprocessors.len(),
            self.params.dp,
            self.params.min_dist,
            self.params.param1,
            self.params.param2,
            self.params.min_radius,
            self.params.max_radius,
        )
    }
}

impl Default for Detector {
    fn default() -> Self {
        builder::DetectorBuilder::build_standard(DetectionParameters::default())
    }
}
