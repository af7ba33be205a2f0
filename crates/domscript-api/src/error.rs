use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domscript_core::DomScriptError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("DomScript error: {0}")]
    DomScript(#[from] DomScriptError),

    #[error("Not found: {0}")]
    NotFound(String),

}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::DomScript(DomScriptError::NotFound(_)) | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::DomScript(DomScriptError::InvalidOperation(_)) => StatusCode::BAD_REQUEST,
            ApiError::DomScript(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
