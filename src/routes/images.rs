use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ImageUploadResponse, TemplatePayload};
use crate::state::AppState;
use crate::validation::normalize_new_at;

pub const IMAGE_FIELD: &str = "image";
pub const IMAGE_ONLY_CONTENT: &str = "Image-only template";
const UPLOAD_SUCCESS_MESSAGE: &str = "Image uploaded successfully";
const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

pub fn image_path(template_id: i64) -> String {
    format!("/api/templates/{template_id}/image")
}

pub fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .ok()
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or(FALLBACK_IMAGE_MIME)
}

// Parse errors keep axum's 4xx status; stream read failures come back as 500.
fn multipart_error(err: MultipartError) -> AppError {
    let status = err.status();
    if status.is_server_error() {
        error!(error = %err, "failed to read image bytes");
        AppError::new(status, format!("failed to read image bytes: {err}"))
    } else {
        warn!(error = %err, %status, "invalid multipart data");
        AppError::new(status, format!("invalid multipart data: {}", err.body_text()))
    }
}

pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ImageUploadResponse>> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(|mime| mime.to_string());
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((content_type, data.to_vec()));
    }

    let (content_type, bytes) = upload.ok_or_else(|| {
        warn!("upload rejected: missing image field");
        AppError::bad_request("image field is required")
    })?;

    if bytes.is_empty() {
        warn!("upload rejected: empty image payload");
        return Err(AppError::bad_request("Please select a file to upload"));
    }

    let is_image = content_type
        .as_deref()
        .is_some_and(|mime| mime.starts_with("image/"));
    if !is_image {
        warn!(content_type = ?content_type, "upload rejected: not an image");
        return Err(AppError::bad_request("Only image files are allowed"));
    }

    let now = Utc::now();
    let payload = TemplatePayload {
        title: Some(format!("Image Upload {}", now.timestamp_millis())),
        content: Some(IMAGE_ONLY_CONTENT.to_string()),
        image_data: Some(bytes),
        is_image_only: Some(true),
        ..Default::default()
    };
    let template = state
        .templates
        .insert(normalize_new_at(payload, now.naive_utc()))
        .await?;

    info!(
        template_id = template.id,
        content_type = ?content_type,
        size_bytes = template.image_data.as_ref().map_or(0, Vec::len),
        "image upload stored"
    );

    Ok(Json(ImageUploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        image_url: image_path(template.id),
        image_id: template.id,
    }))
}

pub async fn get_template_image(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let bytes = state
        .templates
        .find(template_id)
        .await?
        .and_then(|template| template.image_data)
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(AppError::not_found)?;

    let mime = sniff_image_mime(&bytes);
    Ok(([(header::CONTENT_TYPE, mime)], bytes))
}
