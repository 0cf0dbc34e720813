// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scan::ScanJob;

/// 分数历史记录，扫描完成时追加，供外部趋势报表使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreHistoryEntry {
    pub id: Uuid,
    pub site_id: Uuid,
    pub scan_id: Uuid,
    pub axe_score: Option<i32>,
    pub lighthouse_score: Option<i32>,
    pub total_violations: i32,
    pub recorded_at: DateTime<Utc>,
}

impl From<&ScanJob> for ScoreHistoryEntry {
    fn from(scan: &ScanJob) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id: scan.site_id,
            scan_id: scan.id,
            axe_score: scan.axe_score,
            lighthouse_score: scan.lighthouse_score,
            total_violations: scan.total_violations_sum,
            recorded_at: scan.completed_at.unwrap_or_else(Utc::now),
        }
    }
}
