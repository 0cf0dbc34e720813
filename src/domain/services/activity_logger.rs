// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// 审计事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEvent {
    /// 事件名称，例如 `scan.cancelled`
    pub action: &'static str,
    pub scan_id: Uuid,
    pub site_id: Uuid,
    pub detail: String,
}

/// 外部活动/审计日志接口
#[async_trait]
pub trait ActivityLogger: Send + Sync {
    async fn log(&self, event: ActivityEvent);
}

/// 以结构化 tracing 事件输出审计日志
#[derive(Debug, Clone, Default)]
pub struct TracingActivityLogger;

#[async_trait]
impl ActivityLogger for TracingActivityLogger {
    async fn log(&self, event: ActivityEvent) {
        info!(
            target: "activity",
            action = event.action,
            scan_id = %event.scan_id,
            site_id = %event.site_id,
            "{}",
            event.detail
        );
    }
}
