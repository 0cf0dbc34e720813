// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::models::page_result::PageAuditResult;
use crate::domain::models::violation::ViolationRecord;
use crate::domain::repositories::violation_repository::ViolationRepository;

/// 违规持久化器
///
/// 把每个页面的违规列表展开为单独的记录，并以任务为单位批量写入
pub struct ViolationPersister {
    repository: Arc<dyn ViolationRepository>,
}

impl ViolationPersister {
    pub fn new(repository: Arc<dyn ViolationRepository>) -> Self {
        Self { repository }
    }

    /// 展开成功页面的违规，每条记录带实际被扫描的页面URL
    pub fn flatten(scan_id: Uuid, results: &[PageAuditResult]) -> Vec<ViolationRecord> {
        results
            .iter()
            .filter(|r| r.is_success() && !r.violations.is_empty())
            .flat_map(|r| {
                r.violations
                    .iter()
                    .map(move |v| ViolationRecord::from_violation(scan_id, r.engine, &r.page_url, v))
            })
            .collect()
    }

    /// 尽力写入，失败只记录日志，不影响已完成的任务
    ///
    /// # 返回值
    ///
    /// 实际写入的记录数
    pub async fn persist(&self, scan_id: Uuid, results: &[PageAuditResult]) -> u64 {
        let records = Self::flatten(scan_id, results);
        if records.is_empty() {
            return 0;
        }

        match self.repository.insert_many(&records).await {
            Ok(count) => {
                info!(scan_id = %scan_id, "Persisted {} violation records", count);
                count
            }
            Err(e) => {
                error!(scan_id = %scan_id, "Failed to persist violations: {}", e);
                0
            }
        }
    }
}
