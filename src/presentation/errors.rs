// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::application::use_cases::scan_use_case::ScanUseCaseError;
use crate::domain::repositories::scan_repository::RepositoryError;

/// 应用错误类型
///
/// 封装处理器中可能出现的全部错误，用例错误按类别映射为HTTP状态码，
/// 其余错误一律视为服务端错误
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    /// 请求体无法解析等输入错误
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(ScanUseCaseError::ValidationError(message.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0.downcast::<ScanUseCaseError>() {
            Ok(err) => <(StatusCode, Json<Value>)>::from(err),
            Err(other) => match other.downcast_ref::<RepositoryError>() {
                Some(RepositoryError::NotFound) => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": other.to_string() })),
                ),
                _ => {
                    error!("Unhandled error: {:#}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": other.to_string() })),
                    )
                }
            },
        };
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl From<ScanUseCaseError> for (StatusCode, Json<Value>) {
    fn from(err: ScanUseCaseError) -> Self {
        let message = err.to_string();
        match err {
            ScanUseCaseError::ValidationError(_) | ScanUseCaseError::InvalidState(_) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
            }
            ScanUseCaseError::NotFound(_) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
            }
            ScanUseCaseError::RateLimited {
                remaining,
                reset_time,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": message,
                    "remaining": remaining,
                    "reset_time": reset_time,
                })),
            ),
            ScanUseCaseError::Repository(_) | ScanUseCaseError::Internal(_) => {
                error!("Scan request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
            }
        }
    }
}
