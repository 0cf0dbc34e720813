// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::{
    cancel_scan_use_case::CancelScanUseCase, scan_use_case::ScanUseCase,
};
use crate::presentation::handlers::scan_handler;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `scan_use_case` - 准入、查询与恢复用例
/// * `cancel_use_case` - 取消处理器
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(scan_use_case: Arc<ScanUseCase>, cancel_use_case: Arc<CancelScanUseCase>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version));

    let scan_routes = Router::new()
        .route(
            "/scans",
            post(scan_handler::create_scan).get(scan_handler::list_scans),
        )
        .route("/scans/{id}", get(scan_handler::get_scan))
        .route("/scans/{id}/progress", get(scan_handler::get_progress))
        .route("/scans/{id}/violations", get(scan_handler::get_violations))
        .route("/scans/{id}/cancel", post(scan_handler::cancel_scan))
        .route("/scans/{id}/resume", post(scan_handler::resume_scan))
        .layer(Extension(scan_use_case))
        .layer(Extension(cancel_use_case));

    Router::new()
        .merge(public_routes)
        .merge(scan_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
