// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::scan_repository::RepositoryError;
use crate::domain::models::page_result::{EngineKind, PageAuditResult};
use async_trait::async_trait;
use uuid::Uuid;

/// 页面审计结果仓库特质
#[async_trait]
pub trait PageResultRepository: Send + Sync {
    /// 保存一条页面结果
    async fn create(&self, result: &PageAuditResult) -> Result<(), RepositoryError>;

    /// 查询扫描任务的全部页面结果，按引擎与页面索引排序
    async fn find_by_scan(&self, scan_id: Uuid) -> Result<Vec<PageAuditResult>, RepositoryError>;

    /// 删除某个引擎从 `from_page_index` 开始的结果，用于从较早位置恢复
    async fn delete_from(
        &self,
        scan_id: Uuid,
        engine: EngineKind,
        from_page_index: i32,
    ) -> Result<u64, RepositoryError>;

    /// 删除扫描任务的全部页面结果
    async fn delete_by_scan(&self, scan_id: Uuid) -> Result<u64, RepositoryError>;
}
