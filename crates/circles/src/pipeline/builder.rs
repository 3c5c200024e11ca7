use crate::{
    algorithms::{GaussianBlurPreprocessor, HoughGradientTransform, MedianBlurPreprocessor},
    pipeline::Detector,
    traits::{CircleTransform, ImagePreprocessor},
    types::DetectionParameters,
};

/// Builder for creating detectors with a fluent API
pub struct DetectorBuilder {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    transform: Option<Box<dyn CircleTransform>>,
    params: DetectionParameters,
}

impl DetectorBuilder {
    /// Create a new detector builder
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            transform: None,
            params: DetectionParameters::default(),
        }
    }

    /// Add a preprocessor to the detector
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the circle transform (replaces any existing one)
    pub fn set_transform<T>(mut self, transform: T) -> Self
    where
        T: CircleTransform + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn with_params(mut self, params: DetectionParameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_radius_range(mut self, min_radius: u32, max_radius: u32) -> Self {
        self.params.min_radius = min_radius;
        self.params.max_radius = max_radius;
        self
    }

    /// Add a median blur with the given half-width
    pub fn with_median_blur(self, radius: u32) -> Self {
        self.add_preprocessor(MedianBlurPreprocessor { radius })
    }

    /// Add a Gaussian blur
    pub fn with_gaussian_blur(self, sigma: f32) -> Self {
        self.add_preprocessor(GaussianBlurPreprocessor { sigma })
    }

    /// Build the detector, falling back to the Hough gradient transform
    pub fn build(self) -> Detector {
        let transform = self.transform
            .unwrap_or_else(|| Box::new(HoughGradientTransform::default()));

        Detector::new(self.preprocessors, transform, self.params)
    }

    /// Median blur 5x5 followed by the Hough gradient transform
    pub fn build_standard(params: DetectionParameters) -> Detector {
        Self::new()
            .with_median_blur(2)
            .with_params(params)
            .build()
    }
}

impl Default for DetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
