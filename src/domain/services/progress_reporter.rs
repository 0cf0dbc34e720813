// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::domain::models::page_result::EngineKind;

/// 进度存储错误
#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Progress backend error: {0}")]
    Backend(String),
}

/// 按任务组织的只追加进度日志
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// 追加一条消息
    async fn append(&self, scan_id: Uuid, message: &str) -> Result<(), ProgressError>;
    /// 按写入顺序读取全部消息
    async fn fetch(&self, scan_id: Uuid) -> Result<Vec<String>, ProgressError>;
    /// 清空任务的进度
    async fn clear(&self, scan_id: Uuid) -> Result<(), ProgressError>;
}

/// 单个任务的进度输出器
///
/// 进度是尽力而为的：写入失败只记录警告，不影响扫描
#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<dyn ProgressStore>,
    scan_id: Uuid,
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn ProgressStore>, scan_id: Uuid) -> Self {
        Self { store, scan_id }
    }

    /// 输出一条进度消息
    pub async fn emit(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if let Err(e) = self.store.append(self.scan_id, message).await {
            warn!(scan_id = %self.scan_id, "Failed to record progress: {}", e);
        }
    }

    /// 页面粒度的进度
    pub async fn page(&self, engine: EngineKind, done: i32, total: i32, url: &str, outcome: &str) {
        self.emit(format!("[{}] {}/{} {} - {}", engine, done, total, url, outcome))
            .await;
    }

    /// 里程碑进度
    pub async fn milestone(&self, message: impl AsRef<str>) {
        self.emit(format!("== {}", message.as_ref())).await;
    }

    /// 重新开始时清空旧进度
    pub async fn reset(&self) {
        if let Err(e) = self.store.clear(self.scan_id).await {
            warn!(scan_id = %self.scan_id, "Failed to clear progress: {}", e);
        }
    }
}
