use image::GrayImage;
use crate::{error::Result, traits::ImagePreprocessor};

/// Median blur preprocessor, suppresses salt-and-pepper noise while keeping edges sharp
#[derive(Debug, Clone)]
pub struct MedianBlurPreprocessor {
    /// Half the kernel size; 2 gives a 5x5 window
    pub radius: u32,
}

impl Default for MedianBlurPreprocessor {
    fn default() -> Self {
        Self { radius: 2 }
    }
}

impl ImagePreprocessor for MedianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        if self.radius == 0 {
            return Ok(image.clone());
        }
        Ok(imageproc::filter::median_filter(image, self.radius, self.radius))
    }
}

/// Gaussian blur preprocessor for noise reduction
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

impl ImagePreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        if self.sigma <= 0.0 {
            return Ok(image.clone());
        }
        Ok(imageproc::filter::gaussian_blur_f32(image, self.sigma))
    }
}
