use crate::app::server::AppState;
use crate::domain::model::{CandidateMatch, ImageUpload};
use crate::domain::ports::RecognitionClient;
use crate::utils::error::PokedexError;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

pub const LIVENESS_REPLY: &str = "Pikachu";
pub const INVALID_PICTURE_MESSAGE: &str = "Invalid picture, Try again";
pub const EXHAUSTED_MESSAGE: &str = "Failed to identify Pokémon after multiple attempts";
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request";

/// Multipart field the capture client puts the picture in.
const UPLOAD_FIELD: &str = "mon";

/// Every reply uses this envelope: candidates on success, a display string
/// on failure. The client switches on `success`, not on the status code.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: ApiMessage,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiMessage {
    Candidates(Vec<CandidateMatch>),
    Text(String),
}

impl ApiResponse {
    pub fn identified(candidates: Vec<CandidateMatch>) -> Self {
        Self {
            success: true,
            message: ApiMessage::Candidates(candidates),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: ApiMessage::Text(message.into()),
        }
    }
}

pub async fn liveness_handler() -> &'static str {
    LIVENESS_REPLY
}

pub async fn pokedex_handler<C: RecognitionClient + 'static>(
    State(state): State<AppState<C>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = format!("req_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f"));

    let image = match read_upload(multipart).await {
        Ok(image) => image,
        Err(e) => {
            tracing::info!("[{}] Rejected upload: {}", request_id, e);
            return reply(
                StatusCode::BAD_REQUEST,
                ApiResponse::failure(INVALID_PICTURE_MESSAGE),
            );
        }
    };

    tracing::info!(
        "[{}] 📸 Received capture ({} bytes, {})",
        request_id,
        image.bytes.len(),
        image.mime_type
    );

    match state.engine.identify(&image).await {
        Ok(candidates) => reply(StatusCode::OK, ApiResponse::identified(candidates)),
        Err(PokedexError::AttemptsExhaustedError { attempts }) => {
            tracing::warn!("[{}] Giving up after {} attempts", request_id, attempts);
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure(EXHAUSTED_MESSAGE),
            )
        }
        Err(e) => {
            tracing::error!("[{}] Error processing request: {}", request_id, e);
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure(GENERIC_ERROR_MESSAGE),
            )
        }
    }
}

fn reply(status: StatusCode, body: ApiResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Pulls the picture out of the form. Anything short of a typed, non-empty
/// image under the expected field name is rejected the same way.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ImageUpload, PokedexError> {
    let mut multipart = multipart.map_err(|e| PokedexError::InvalidPictureError {
        reason: format!("request is not multipart: {}", e),
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PokedexError::InvalidPictureError {
            reason: e.to_string(),
        })?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let Some(mime_type) = field.content_type().map(str::to_string) else {
            return Err(PokedexError::InvalidPictureError {
                reason: format!("field '{}' has no declared content type", UPLOAD_FIELD),
            });
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| PokedexError::InvalidPictureError {
                reason: e.to_string(),
            })?;

        let upload = ImageUpload::new(bytes.to_vec(), mime_type);
        if upload.bytes.is_empty() {
            return Err(PokedexError::InvalidPictureError {
                reason: "empty image payload".to_string(),
            });
        }
        if !upload.is_image() {
            return Err(PokedexError::InvalidPictureError {
                reason: format!("unsupported content type: {}", upload.mime_type),
            });
        }
        return Ok(upload);
    }

    Err(PokedexError::InvalidPictureError {
        reason: format!("missing '{}' field", UPLOAD_FIELD),
    })
}
