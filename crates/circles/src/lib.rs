//! # Circle Detection Library
//!
//! Finds circular objects in raster images with a gradient Hough transform,
//! reports their centres and radii, draws them onto the image and cuts each
//! one out as its own picture.
//!
//! ## Core Features
//!
//! - **Trait-based Architecture**: swap preprocessing stages or the circle transform
//! - **Detector Pipeline**: grayscale, median blur, Hough gradient voting
//! - **Rendering**: outlines, centre dots and radius labels
//! - **Extraction**: one RGBA crop per circle, masked to the circle
//! - **HTTP API**: axum service exposing detection and extraction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use circles::{Detector, Renderer, load_image};
//!
//! let image = load_image("coins.jpg")?;
//! let detector = Detector::default();
//! let result = detector.detect(&image)?;
//! println!("{} circles, mean radius {:.1}", result.count, result.average_radius);
//!
//! let annotated = Renderer::default().render(&image, &result);
//! annotated.save("coins_detected.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Detector
//!
//! ```rust,no_run
//! use circles::{Detector, algorithms::*};
//!
//! let detector = Detector::builder()
//!     .add_preprocessor(GaussianBlurPreprocessor { sigma: 1.5 })
//!     .set_transform(HoughGradientTransform::default())
//!     .with_radius_range(20, 80)
//!     .build();
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;
pub mod commands;
pub mod config;
pub mod api;

// Re-exports for convenience
pub use error::{CircleError, Result};
pub use types::*;
pub use traits::*;
pub use algorithms::{CircleExtractor, HoughGradientTransform, Renderer};
pub use pipeline::{Detector, builder::DetectorBuilder};
pub use io::*;
pub use commands::CircleCommand;
pub use config::ServerConfig;
