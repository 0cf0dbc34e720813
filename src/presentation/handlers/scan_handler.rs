// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        dto::scan_request::{CreateScanRequestDto, ListScansQuery, ResumeScanRequestDto},
        use_cases::{cancel_scan_use_case::CancelScanUseCase, scan_use_case::ScanUseCase},
    },
    presentation::errors::AppError,
};

/// 创建扫描任务
///
/// 准入通过后立即返回 201，扫描在后台执行
pub async fn create_scan(
    Extension(use_case): Extension<Arc<ScanUseCase>>,
    payload: Result<Json<CreateScanRequestDto>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let scan = use_case.create_scan(payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "scan": scan }))).into_response())
}

/// 列出扫描任务，`?status=` 过滤
pub async fn list_scans(
    Extension(use_case): Extension<Arc<ScanUseCase>>,
    Query(query): Query<ListScansQuery>,
) -> Result<Response, AppError> {
    let scans = use_case.list_scans(query.status.as_deref()).await?;
    Ok((StatusCode::OK, Json(scans)).into_response())
}

/// 获取扫描任务详情
pub async fn get_scan(
    Extension(use_case): Extension<Arc<ScanUseCase>>,
    Path(scan_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let scan = use_case.get_scan(scan_id).await?;
    Ok((StatusCode::OK, Json(json!({ "scan": scan }))).into_response())
}

pub async fn get_progress(
    Extension(use_case): Extension<Arc<ScanUseCase>>,
    Path(scan_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let progress = use_case.get_progress(scan_id).await?;
    Ok((StatusCode::OK, Json(json!({ "progress": progress }))).into_response())
}

pub async fn get_violations(
    Extension(use_case): Extension<Arc<ScanUseCase>>,
    Path(scan_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let violations = use_case.get_violations(scan_id).await?;
    Ok((StatusCode::OK, Json(json!({ "violations": violations }))).into_response())
}

/// 取消进行中的扫描任务
pub async fn cancel_scan(
    Extension(use_case): Extension<Arc<CancelScanUseCase>>,
    Path(scan_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let outcome = use_case.cancel(scan_id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Scan cancelled",
            "scan_id": outcome.scan_id,
            "status": outcome.status,
        })),
    )
        .into_response())
}

/// 恢复或重新开始扫描任务
///
/// 请求体可以为空，此时从任务记录的 `resume_index` 继续
pub async fn resume_scan(
    Extension(use_case): Extension<Arc<ScanUseCase>>,
    Path(scan_id): Path<Uuid>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload = if body.iter().all(|b| b.is_ascii_whitespace()) {
        ResumeScanRequestDto::default()
    } else {
        serde_json::from_slice::<ResumeScanRequestDto>(&body)
            .map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e)))?
    };

    let scan = use_case.resume_scan(scan_id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "scan": scan }))).into_response())
}
