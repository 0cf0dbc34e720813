// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::page_result::{EngineKind, PageAuditResult, PageStatus};
use crate::domain::repositories::page_result_repository::PageResultRepository;
use crate::domain::repositories::scan_repository::RepositoryError;
use crate::infrastructure::database::entities::page_audit_result as result_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 页面审计结果仓库实现
#[derive(Clone)]
pub struct PageResultRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl PageResultRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<result_entity::Model> for PageAuditResult {
    fn from(model: result_entity::Model) -> Self {
        Self {
            id: model.id,
            scan_id: model.scan_id,
            page_url: model.page_url,
            page_index: model.page_index,
            engine: model.engine.parse().unwrap_or(EngineKind::Axe),
            status: model
                .status
                .parse()
                .unwrap_or(PageStatus::Failed),
            score: model.score,
            violation_count: model.violation_count,
            violations: serde_json::from_value(model.violations).unwrap_or_default(),
            error_message: model.error_message,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl PageResultRepository for PageResultRepositoryImpl {
    async fn create(&self, result: &PageAuditResult) -> Result<(), RepositoryError> {
        let model = result_entity::ActiveModel {
            id: Set(result.id),
            scan_id: Set(result.scan_id),
            page_url: Set(result.page_url.clone()),
            page_index: Set(result.page_index),
            engine: Set(result.engine.to_string()),
            status: Set(result.status.to_string()),
            score: Set(result.score),
            violation_count: Set(result.violation_count),
            violations: Set(serde_json::json!(result.violations)),
            error_message: Set(result.error_message.clone()),
            created_at: Set(result.created_at),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_by_scan(&self, scan_id: Uuid) -> Result<Vec<PageAuditResult>, RepositoryError> {
        let models = result_entity::Entity::find()
            .filter(result_entity::Column::ScanId.eq(scan_id))
            .order_by_asc(result_entity::Column::Engine)
            .order_by_asc(result_entity::Column::PageIndex)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete_from(
        &self,
        scan_id: Uuid,
        engine: EngineKind,
        from_page_index: i32,
    ) -> Result<u64, RepositoryError> {
        let result = result_entity::Entity::delete_many()
            .filter(result_entity::Column::ScanId.eq(scan_id))
            .filter(result_entity::Column::Engine.eq(engine.to_string()))
            .filter(result_entity::Column::PageIndex.gte(from_page_index))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_by_scan(&self, scan_id: Uuid) -> Result<u64, RepositoryError> {
        let result = result_entity::Entity::delete_many()
            .filter(result_entity::Column::ScanId.eq(scan_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[path = "page_result_repo_impl_test.rs"]
mod tests;
