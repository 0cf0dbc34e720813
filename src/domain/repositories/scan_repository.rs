// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scan::{ScanJob, ScanStatus};
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 扫描任务仓库特质
///
/// 扫描任务行是状态的唯一事实来源。所有状态写入都以期望的旧状态为条件
/// (compare-and-set)，以便取消请求与后台任务并发写入时不会互相覆盖。
#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// 创建扫描任务
    async fn create(&self, scan: &ScanJob) -> Result<ScanJob, RepositoryError>;

    /// 根据ID查找扫描任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanJob>, RepositoryError>;

    /// 按状态列出扫描任务，最新的在前
    async fn list(&self, status: Option<ScanStatus>) -> Result<Vec<ScanJob>, RepositoryError>;

    /// 仅当存储中的状态属于 `expected` 时写入整个任务
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 写入成功
    /// * `Ok(false)` - 其他写入者已先改变了状态
    /// * `Err(RepositoryError)` - 数据库错误
    async fn update_if_status(
        &self,
        scan: &ScanJob,
        expected: &[ScanStatus],
    ) -> Result<bool, RepositoryError>;

    /// 在页面边界写入进度，仅当任务仍处于 InProgress 时生效
    ///
    /// 返回 `false` 表示任务已被其他写入者移出 InProgress（例如被取消）
    async fn record_progress(
        &self,
        id: Uuid,
        pages_scanned: i32,
        resume_index: i32,
    ) -> Result<bool, RepositoryError>;
}
