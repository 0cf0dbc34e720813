// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scan::{ScanJob, ScanStatus};
use crate::domain::repositories::scan_repository::{RepositoryError, ScanRepository};
use crate::infrastructure::database::entities::scan as scan_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 扫描任务仓库实现
///
/// 所有状态写入都是带条件的更新：只有存储中的状态仍符合预期时才会生效，
/// 以此在执行任务与取消请求之间做并发仲裁
#[derive(Clone)]
pub struct ScanRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ScanRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<scan_entity::Model> for ScanJob {
    fn from(model: scan_entity::Model) -> Self {
        Self {
            id: model.id,
            site_id: model.site_id,
            scan_type: model.scan_type.parse().unwrap_or_default(),
            status: model.status.parse().unwrap_or_default(),
            page_url: model.page_url,
            page_urls: serde_json::from_value(model.page_urls).unwrap_or_default(),
            pages_total: model.pages_total,
            pages_scanned: model.pages_scanned,
            resume_index: model.resume_index,
            total_violations_sum: model.total_violations_sum,
            worst_page_url: model.worst_page_url,
            worst_page_violation_count: model.worst_page_violation_count,
            axe_score: model.axe_score,
            lighthouse_score: model.lighthouse_score,
            started_at: model.started_at,
            completed_at: model.completed_at,
            timeout_at: model.timeout_at,
            error_message: model.error_message,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<ScanJob> for scan_entity::ActiveModel {
    fn from(scan: ScanJob) -> Self {
        Self {
            id: Set(scan.id),
            site_id: Set(scan.site_id),
            scan_type: Set(scan.scan_type.to_string()),
            status: Set(scan.status.to_string()),
            page_url: Set(scan.page_url),
            page_urls: Set(serde_json::json!(scan.page_urls)),
            pages_total: Set(scan.pages_total),
            pages_scanned: Set(scan.pages_scanned),
            resume_index: Set(scan.resume_index),
            total_violations_sum: Set(scan.total_violations_sum),
            worst_page_url: Set(scan.worst_page_url),
            worst_page_violation_count: Set(scan.worst_page_violation_count),
            axe_score: Set(scan.axe_score),
            lighthouse_score: Set(scan.lighthouse_score),
            started_at: Set(scan.started_at),
            completed_at: Set(scan.completed_at),
            timeout_at: Set(scan.timeout_at),
            error_message: Set(scan.error_message),
            created_at: Set(scan.created_at),
            updated_at: Set(scan.updated_at),
        }
    }
}

#[async_trait]
impl ScanRepository for ScanRepositoryImpl {
    async fn create(&self, scan: &ScanJob) -> Result<ScanJob, RepositoryError> {
        let model: scan_entity::ActiveModel = scan.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanJob>, RepositoryError> {
        let model = scan_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list(&self, status: Option<ScanStatus>) -> Result<Vec<ScanJob>, RepositoryError> {
        let mut query = scan_entity::Entity::find();
        if let Some(status) = status {
            query = query.filter(scan_entity::Column::Status.eq(status.to_string()));
        }

        let models = query
            .order_by_desc(scan_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update_if_status(
        &self,
        scan: &ScanJob,
        expected: &[ScanStatus],
    ) -> Result<bool, RepositoryError> {
        let mut model: scan_entity::ActiveModel = scan.clone().into();
        model.id = NotSet;
        model.created_at = NotSet;
        model.updated_at = Set(Utc::now());

        let result = scan_entity::Entity::update_many()
            .set(model)
            .filter(scan_entity::Column::Id.eq(scan.id))
            .filter(scan_entity::Column::Status.is_in(expected.iter().map(|s| s.to_string())))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn record_progress(
        &self,
        id: Uuid,
        pages_scanned: i32,
        resume_index: i32,
    ) -> Result<bool, RepositoryError> {
        let result = scan_entity::Entity::update_many()
            .col_expr(scan_entity::Column::PagesScanned, Expr::value(pages_scanned))
            .col_expr(scan_entity::Column::ResumeIndex, Expr::value(resume_index))
            .col_expr(scan_entity::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(scan_entity::Column::Id.eq(id))
            .filter(scan_entity::Column::Status.eq(ScanStatus::InProgress.to_string()))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[path = "scan_repo_impl_test.rs"]
mod tests;
