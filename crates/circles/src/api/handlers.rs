use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
};
use image::DynamicImage;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{
    AppState,
    error::ApiError,
    models::{DetectBase64Request, DetectResponse, ExtractResponse, ExtractedCircleResponse},
};
use crate::{
    commands::CircleCommand,
    error::{CircleError, Result},
    io::{allowed_file, decode_base64_image, decode_image, encode_png_data_uri},
    types::DetectionParameters,
};

/// Fields read from a multipart upload
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<(String, Bytes)>,
    min_radius: Option<u32>,
    max_radius: Option<u32>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart, limit: usize) -> std::result::Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::from_multipart(e, limit))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await.map_err(|e| ApiError::from_multipart(e, limit))?;
                    form.image = Some((filename, data));
                }
                "min_radius" | "max_radius" => {
                    let text = field.text().await.map_err(|e| ApiError::from_multipart(e, limit))?;
                    let value = parse_radius(&name, &text)?;
                    if name == "min_radius" {
                        form.min_radius = value;
                    } else {
                        form.max_radius = value;
                    }
                }
                other => debug!(field = other, "ignoring unknown form field"),
            }
        }
        Ok(form)
    }

    /// The uploaded file, after the presence and extension checks
    fn into_image(self) -> std::result::Result<Bytes, ApiError> {
        let (filename, data) = self.image.ok_or(ApiError::MissingImage("No image file provided"))?;
        if filename.is_empty() {
            return Err(ApiError::MissingImage("No file selected"));
        }
        if !allowed_file(&filename) {
            return Err(ApiError::InvalidFileType);
        }
        Ok(data)
    }
}

fn parse_radius(name: &str, text: &str) -> std::result::Result<Option<u32>, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<u32>()
        .map(Some)
        .map_err(|_| ApiError::InvalidParameter(format!("{name} must be a non-negative integer, got '{text}'")))
}

/// Run CPU-bound work off the async executor
async fn blocking<T, F>(work: F) -> std::result::Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {e}")))?
        .map_err(ApiError::from)
}

fn detect_and_render(state: &AppState, image: &DynamicImage, params: &DetectionParameters) -> Result<DetectResponse> {
    let result = state.detector.detect_with(image, params)?;
    let annotated = state.renderer.render(image, &result);
    let result_image = encode_png_data_uri(&DynamicImage::ImageRgb8(annotated))?;

    Ok(DetectResponse {
        success: true,
        message: format!("Detected {} circles", result.count),
        data: result,
        result_image,
    })
}

fn extract_circles(state: &AppState, image: &DynamicImage) -> Result<ExtractResponse> {
    let result = state.detector.detect(image)?;
    let circles = state
        .extractor
        .extract(image, &result)
        .into_iter()
        .map(|extracted| {
            Ok(ExtractedCircleResponse {
                id: extracted.id,
                radius: extracted.circle.radius,
                center: extracted.circle.center,
                image: encode_png_data_uri(&DynamicImage::ImageRgba8(extracted.image))?,
            })
        })
        .collect::<std::result::Result<Vec<_>, CircleError>>()?;

    Ok(ExtractResponse {
        success: true,
        message: format!("Extracted {} circles", circles.len()),
        count: circles.len(),
        circles,
    })
}

/// `GET /`
pub async fn index() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "service": "Circle Detection API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": CircleCommand::all()
            .iter()
            .map(|command| json!({
                "path": command.endpoint(),
                "method": "POST",
                "description": command.description(),
            }))
            .collect::<Vec<_>>(),
    }))
}

/// `GET /info`
pub async fn info(State(state): State<AppState>) -> Json<Value> {
    let endpoints: serde_json::Map<String, Value> = CircleCommand::all()
        .iter()
        .map(|command| {
            let parameters: serde_json::Map<String, Value> = command
                .parameters_info()
                .into_iter()
                .map(|(name, description, required)| {
                    (name.to_string(), json!({ "description": description, "required": required }))
                })
                .collect();
            (
                command.endpoint().to_string(),
                json!({
                    "method": "POST",
                    "description": command.description(),
                    "parameters": parameters,
                }),
            )
        })
        .collect();

    Json(json!({
        "success": true,
        "detector": state.detector.info(),
        "defaults": state.detector.params(),
        "max_content_length": state.config.max_content_length,
        "allowed_extensions": crate::io::ALLOWED_EXTENSIONS,
        "endpoints": endpoints,
        "schema": CircleCommand::schema(),
    }))
}

/// `POST /detect`: multipart upload in, annotated image and statistics out
pub async fn detect(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<DetectResponse>, ApiError> {
    let limit = state.config.max_content_length;
    let multipart = multipart.map_err(|e| ApiError::from_rejection(e.status(), e.body_text(), limit))?;
    let form = UploadForm::read(multipart, limit).await?;
    let params = state.detector.params().with_radius_overrides(form.min_radius, form.max_radius);
    let data = form.into_image()?;

    let worker_state = state.clone();
    let response = blocking(move || {
        let image = decode_image(&data)?;
        detect_and_render(&worker_state, &image, &params)
    })
    .await?;

    info!(count = response.data.count, "detect request served");
    Ok(Json(response))
}

/// `POST /detect_base64`: JSON body with a base64 image
pub async fn detect_base64(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DetectBase64Request>, JsonRejection>,
) -> std::result::Result<Json<DetectResponse>, ApiError> {
    let limit = state.config.max_content_length;
    let Json(request) = payload.map_err(|e| ApiError::from_rejection(e.status(), e.body_text(), limit))?;
    let encoded = request
        .image
        .filter(|data| !data.trim().is_empty())
        .ok_or(ApiError::MissingImage("No image data provided"))?;
    let params = state.detector.params().with_radius_overrides(request.min_radius, request.max_radius);

    let worker_state = state.clone();
    let response = blocking(move || {
        let image = decode_base64_image(&encoded)?;
        detect_and_render(&worker_state, &image, &params)
    })
    .await?;

    info!(count = response.data.count, "detect_base64 request served");
    Ok(Json(response))
}

/// `POST /extract`: multipart upload in, one PNG per circle out
pub async fn extract(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<ExtractResponse>, ApiError> {
    let limit = state.config.max_content_length;
    let multipart = multipart.map_err(|e| ApiError::from_rejection(e.status(), e.body_text(), limit))?;
    let data = UploadForm::read(multipart, limit).await?.into_image()?;

    let worker_state = state.clone();
    let response = blocking(move || {
        let image = decode_image(&data)?;
        extract_circles(&worker_state, &image)
    })
    .await?;

    info!(count = response.count, "extract request served");
    Ok(Json(response))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
