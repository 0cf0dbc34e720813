// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::scan_repository::RepositoryError;
use crate::domain::models::violation::ViolationRecord;
use async_trait::async_trait;
use uuid::Uuid;

/// 违规记录仓库特质
#[async_trait]
pub trait ViolationRepository: Send + Sync {
    /// 批量插入，返回插入条数
    async fn insert_many(&self, records: &[ViolationRecord]) -> Result<u64, RepositoryError>;
    /// 查询扫描任务的违规记录
    async fn find_by_scan(&self, scan_id: Uuid) -> Result<Vec<ViolationRecord>, RepositoryError>;
    /// 删除扫描任务的违规记录
    async fn delete_by_scan(&self, scan_id: Uuid) -> Result<u64, RepositoryError>;
}
