// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::scan_repository::RepositoryError;
use crate::domain::models::score_history::ScoreHistoryEntry;
use async_trait::async_trait;

/// 分数历史仓库特质（只写）
#[async_trait]
pub trait ScoreHistoryRepository: Send + Sync {
    async fn append(&self, entry: &ScoreHistoryEntry) -> Result<(), RepositoryError>;
}
