use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};

use crate::domain::{Season, Week};
use crate::errors::{find_pool_error, PoolError};

/// JSON envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(result: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(result)))
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Missing or invalid admin token")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match find_pool_error(&err) {
            Some(e @ PoolError::NotFound(_)) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            Some(e @ PoolError::AlreadyExists(_)) => Self::new(StatusCode::CONFLICT, e.to_string()),
            Some(e @ PoolError::InvalidInput(_)) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            None => {
                error!("Request failed: {:?}", err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub season: Option<Season>,
    pub week: Option<Week>,
}

#[derive(Debug, Deserialize)]
pub struct SurvivorPickRequest {
    pub team: String,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OverrideResult<T> {
    pub override_id: String,
    pub scoring: T,
}
