pub mod preprocessing;
pub mod hough;
pub mod rendering;
pub mod extraction;

pub use preprocessing::*;
pub use hough::*;
pub use rendering::*;
pub use extraction::*;
