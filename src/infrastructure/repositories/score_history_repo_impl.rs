// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::score_history::ScoreHistoryEntry;
use crate::domain::repositories::scan_repository::RepositoryError;
use crate::domain::repositories::score_history_repository::ScoreHistoryRepository;
use crate::infrastructure::database::entities::score_history as history_entity;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;

/// 站点得分历史仓库实现
#[derive(Clone)]
pub struct ScoreHistoryRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ScoreHistoryRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScoreHistoryRepository for ScoreHistoryRepositoryImpl {
    async fn append(&self, entry: &ScoreHistoryEntry) -> Result<(), RepositoryError> {
        let model = history_entity::ActiveModel {
            id: Set(entry.id),
            site_id: Set(entry.site_id),
            scan_id: Set(entry.scan_id),
            axe_score: Set(entry.axe_score),
            lighthouse_score: Set(entry.lighthouse_score),
            total_violations: Set(entry.total_violations),
            recorded_at: Set(entry.recorded_at),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }
}
