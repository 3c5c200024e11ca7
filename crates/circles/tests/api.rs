use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use circles::{
    ServerConfig,
    api::{AppState, DetectResponse, ExtractResponse, router},
    decode_base64_image, encode_png,
};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "circle-test-boundary";

fn app() -> Router {
    app_with(ServerConfig::default())
}

fn app_with(config: ServerConfig) -> Router {
    router(AppState::new(config).expect("default config is valid"))
}

/// Three light discs, radii 20, 30 and 40, on a dark background
fn three_discs_png() -> Vec<u8> {
    let mut img = RgbImage::from_pixel(400, 200, Rgb([20, 20, 20]));
    for (x, y, r) in [(70, 100, 20), (200, 100, 30), (330, 100, 40)] {
        draw_filled_circle_mut(&mut img, (x, y), r, Rgb([230, 230, 230]));
    }
    encode_png(&DynamicImage::ImageRgb8(img)).unwrap()
}

fn blank_png() -> Vec<u8> {
    encode_png(&DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 80, Rgb([128, 128, 128])))).unwrap()
}

enum Part<'a> {
    File { name: &'a str, filename: &'a str, data: &'a [u8] },
    Text { name: &'a str, value: &'a str },
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, filename, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}").as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn json_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn assert_failure(status: StatusCode, body: &Value, expected: StatusCode) {
    assert_eq!(status, expected, "unexpected status, body: {body}");
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn detect_base64_finds_three_discs() {
    let payload = json!({ "image": format!("data:image/png;base64,{}", STANDARD.encode(three_discs_png())) });
    let (status, body) = send(app(), json_request("/detect_base64", payload.to_string())).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let response: DetectResponse = serde_json::from_value(body).unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Detected 3 circles");
    assert_eq!(response.data.count, 3);
    assert!((response.data.average_radius - 30.0).abs() <= 3.0);
    assert_eq!(response.data.image_width, 400);
    assert_eq!(response.data.image_height, 200);
    assert!(response.result_image.starts_with("data:image/png;base64,"));

    let annotated = decode_base64_image(&response.result_image).unwrap();
    assert_eq!((annotated.width(), annotated.height()), (400, 200));
}

#[tokio::test]
async fn detect_base64_accepts_bare_base64() {
    let payload = json!({ "image": STANDARD.encode(three_discs_png()) });
    let (status, body) = send(app(), json_request("/detect_base64", payload.to_string())).await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["data"]["count"], 3);
}

#[tokio::test]
async fn blank_image_is_a_successful_empty_result() {
    let payload = json!({ "image": STANDARD.encode(blank_png()) });
    let (status, body) = send(app(), json_request("/detect_base64", payload.to_string())).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Detected 0 circles");
    assert_eq!(body["data"]["count"], 0);
    assert_eq!(body["data"]["average_radius"], 0.0);
    assert_eq!(body["data"]["circles"], json!([]));
}

#[tokio::test]
async fn radius_overrides_narrow_the_search() {
    let payload = json!({
        "image": STANDARD.encode(three_discs_png()),
        "min_radius": 35,
        "max_radius": 60,
    });
    let (status, body) = send(app(), json_request("/detect_base64", payload.to_string())).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let response: DetectResponse = serde_json::from_value(body).unwrap();
    assert!(response.data.count >= 1);
    for circle in &response.data.circles {
        assert!((35..=60).contains(&circle.radius), "radius {} out of range", circle.radius);
    }
}

#[tokio::test]
async fn detect_base64_rejects_bad_input() {
    let corrupt = json!({ "image": STANDARD.encode(b"\x89PNG\r\n\x1a\nthis is not an image") });
    let (status, body) = send(app(), json_request("/detect_base64", corrupt.to_string())).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);

    let (status, body) = send(app(), json_request("/detect_base64", json!({}).to_string())).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No image data provided");

    let (status, body) = send(app(), json_request("/detect_base64", "{not json")).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);

    let inverted = json!({ "image": STANDARD.encode(blank_png()), "min_radius": 50, "max_radius": 40 });
    let (status, body) = send(app(), json_request("/detect_base64", inverted.to_string())).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = ServerConfig { max_content_length: 1024, ..Default::default() };
    let payload = json!({ "image": "A".repeat(4096) });
    let (status, body) = send(app_with(config), json_request("/detect_base64", payload.to_string())).await;
    assert_failure(status, &body, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn detect_upload_finds_three_discs() {
    let png = three_discs_png();
    let request = multipart_request("/detect", &[Part::File { name: "image", filename: "discs.png", data: &png }]);
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["count"], 3);
    assert_eq!(body["data"]["circles"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn detect_upload_validation() {
    let png = three_discs_png();

    let request = multipart_request("/detect", &[Part::Text { name: "min_radius", value: "10" }]);
    let (status, body) = send(app(), request).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No image file provided");

    let request = multipart_request("/detect", &[Part::File { name: "image", filename: "discs.txt", data: &png }]);
    let (status, body) = send(app(), request).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid file type");

    let request = multipart_request(
        "/detect",
        &[
            Part::File { name: "image", filename: "discs.png", data: &png },
            Part::Text { name: "max_radius", value: "huge" },
        ],
    );
    let (status, body) = send(app(), request).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);

    let request = multipart_request(
        "/detect",
        &[Part::File { name: "image", filename: "broken.jpg", data: b"definitely not a jpeg" }],
    );
    let (status, body) = send(app(), request).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn extract_returns_one_crop_per_circle() {
    let png = three_discs_png();
    let request = multipart_request("/extract", &[Part::File { name: "image", filename: "discs.png", data: &png }]);
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let response: ExtractResponse = serde_json::from_value(body).unwrap();
    assert!(response.success);
    assert_eq!(response.count, 3);
    assert_eq!(response.message, "Extracted 3 circles");

    let mut ids: Vec<_> = response.circles.iter().map(|c| c.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);

    for circle in &response.circles {
        let crop = decode_base64_image(&circle.image).unwrap();
        let side = circle.radius * 2 + 1;
        assert_eq!((crop.width(), crop.height()), (side, side));

        // Corners lie outside the circle and are cleared
        let rgba = crop.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0)[3], 0);
    }
}

#[tokio::test]
async fn upload_endpoints_reject_non_multipart_bodies() {
    for uri in ["/detect", "/extract"] {
        let (status, body) = send(app(), json_request(uri, json!({ "image": "abc" }).to_string())).await;
        assert_failure(status, &body, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn extract_requires_an_image() {
    let request = multipart_request("/extract", &[]);
    let (status, body) = send(app(), request).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let request = Request::builder().uri("/does-not-exist").body(Body::empty()).unwrap();
    let (status, body) = send(app(), request).await;
    assert_failure(status, &body, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Endpoint not found");
}

#[tokio::test]
async fn service_metadata() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["endpoints"].as_array().map(Vec::len), Some(3));

    let request = Request::builder().uri("/info").body(Body::empty()).unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["defaults"]["min_radius"], 10);
    assert_eq!(body["defaults"]["max_radius"], 200);
    assert!(body["endpoints"]["/detect"]["parameters"]["image"]["required"].as_bool().unwrap());
}
