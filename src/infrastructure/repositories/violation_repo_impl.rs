// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::page_result::EngineKind;
use crate::domain::models::violation::ViolationRecord;
use crate::domain::repositories::scan_repository::RepositoryError;
use crate::domain::repositories::violation_repository::ViolationRepository;
use crate::infrastructure::database::entities::violation as violation_entity;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 违规记录仓库实现
#[derive(Clone)]
pub struct ViolationRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ViolationRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<violation_entity::Model> for ViolationRecord {
    fn from(model: violation_entity::Model) -> Self {
        Self {
            id: model.id,
            scan_id: model.scan_id,
            engine: model.engine.parse().unwrap_or(EngineKind::Axe),
            rule_id: model.rule_id,
            name: model.name,
            impact: model.impact,
            page_url: model.page_url,
            element_count: model.element_count,
            help_url: model.help_url,
            created_at: model.created_at,
        }
    }
}

impl From<&ViolationRecord> for violation_entity::ActiveModel {
    fn from(record: &ViolationRecord) -> Self {
        Self {
            id: Set(record.id),
            scan_id: Set(record.scan_id),
            engine: Set(record.engine.to_string()),
            rule_id: Set(record.rule_id.clone()),
            name: Set(record.name.clone()),
            impact: Set(record.impact.clone()),
            page_url: Set(record.page_url.clone()),
            element_count: Set(record.element_count),
            help_url: Set(record.help_url.clone()),
            created_at: Set(record.created_at),
        }
    }
}

#[async_trait]
impl ViolationRepository for ViolationRepositoryImpl {
    async fn insert_many(&self, records: &[ViolationRecord]) -> Result<u64, RepositoryError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut inserted = 0u64;
        // sqlite 单条语句的绑定参数有上限
        for chunk in records.chunks(500) {
            violation_entity::Entity::insert_many(chunk.iter().map(Into::<violation_entity::ActiveModel>::into))
                .exec_without_returning(self.db.as_ref())
                .await?;
            inserted += chunk.len() as u64;
        }
        Ok(inserted)
    }

    async fn find_by_scan(&self, scan_id: Uuid) -> Result<Vec<ViolationRecord>, RepositoryError> {
        let models = violation_entity::Entity::find()
            .filter(violation_entity::Column::ScanId.eq(scan_id))
            .order_by_asc(violation_entity::Column::PageUrl)
            .order_by_asc(violation_entity::Column::RuleId)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete_by_scan(&self, scan_id: Uuid) -> Result<u64, RepositoryError> {
        let result = violation_entity::Entity::delete_many()
            .filter(violation_entity::Column::ScanId.eq(scan_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
