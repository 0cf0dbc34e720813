// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::scan_repository::RepositoryError;
use crate::domain::models::site::Site;
use async_trait::async_trait;
use uuid::Uuid;

/// 站点仓库特质
///
/// 站点的增删改属于外部管理功能，这里只需要读取和测试数据写入
#[async_trait]
pub trait SiteRepository: Send + Sync {
    /// 创建站点
    async fn create(&self, site: &Site) -> Result<Site, RepositoryError>;
    /// 根据ID查找站点
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Site>, RepositoryError>;
    /// 批量查找站点
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Site>, RepositoryError>;
}
