// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含扫描编排所需的纯逻辑与服务接口：
/// - 准入限流（rate_limiting_service）
/// - 结果聚合（result_aggregator）
/// - 超时守卫（timeout_guard）
/// - 进度输出（progress_reporter）
/// - 违规持久化（violation_persister）
/// - 活动日志（activity_logger）
/// - 后台调度接口（scan_scheduler）
pub mod activity_logger;
pub mod progress_reporter;
pub mod rate_limiting_service;
pub mod result_aggregator;
pub mod scan_scheduler;
pub mod timeout_guard;
pub mod violation_persister;
