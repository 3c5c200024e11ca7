//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{DetectionResult, Point};

/// JSON body of `POST /detect_base64`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectBase64Request {
    /// Base64 image, optionally as a `data:` URI
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub min_radius: Option<u32>,
    #[serde(default)]
    pub max_radius: Option<u32>,
}

/// Response of `POST /detect` and `POST /detect_base64`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DetectResponse {
    pub success: bool,
    pub message: String,
    pub data: DetectionResult,
    /// Annotated image as a PNG data URI
    pub result_image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExtractedCircleResponse {
    pub id: usize,
    pub radius: u32,
    pub center: Point,
    /// Cropped circle as a PNG data URI
    pub image: String,
}

/// Response of `POST /extract`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExtractResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub circles: Vec<ExtractedCircleResponse>,
}

/// Body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
