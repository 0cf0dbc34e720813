// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::{
    application::use_cases::scan_use_case::ScanUseCaseError,
    domain::{
        models::scan::ScanStatus,
        repositories::{
            page_result_repository::PageResultRepository, scan_repository::ScanRepository,
            violation_repository::ViolationRepository,
        },
        services::{
            activity_logger::{ActivityEvent, ActivityLogger},
            scan_scheduler::ScanScheduler,
        },
    },
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// 取消结果
#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub scan_id: Uuid,
    pub status: ScanStatus,
}

/// 取消处理器
///
/// 先以条件更新把任务行改为 Cancelled（与执行任务的完成写入竞争），
/// 再通知本进程中的执行任务停止，最后尽力清理部分结果
pub struct CancelScanUseCase {
    scan_repo: Arc<dyn ScanRepository>,
    page_result_repo: Arc<dyn PageResultRepository>,
    violation_repo: Arc<dyn ViolationRepository>,
    scheduler: Arc<dyn ScanScheduler>,
    activity: Arc<dyn ActivityLogger>,
}

impl CancelScanUseCase {
    pub fn new(
        scan_repo: Arc<dyn ScanRepository>,
        page_result_repo: Arc<dyn PageResultRepository>,
        violation_repo: Arc<dyn ViolationRepository>,
        scheduler: Arc<dyn ScanScheduler>,
        activity: Arc<dyn ActivityLogger>,
    ) -> Self {
        Self {
            scan_repo,
            page_result_repo,
            violation_repo,
            scheduler,
            activity,
        }
    }

    pub async fn cancel(&self, id: Uuid) -> Result<CancelOutcome, ScanUseCaseError> {
        let scan = self
            .scan_repo
            .find_by_id(id)
            .await?
            .ok_or(ScanUseCaseError::NotFound("Scan"))?;
        let site_id = scan.site_id;
        let previous = scan.status;

        let cancelled = scan.cancel()?;
        if !self
            .scan_repo
            .update_if_status(&cancelled, &ScanStatus::CANCELLABLE)
            .await?
        {
            // 执行任务抢先写入了终止状态
            return Err(ScanUseCaseError::InvalidState(
                "Scan is no longer cancellable".to_string(),
            ));
        }

        let signalled = self.scheduler.cancel(id);
        metrics::counter!("scans_finished_total", "status" => "cancelled").increment(1);

        if let Err(e) = self.page_result_repo.delete_by_scan(id).await {
            error!(scan_id = %id, "Failed to delete page results of cancelled scan: {}", e);
        }
        if let Err(e) = self.violation_repo.delete_by_scan(id).await {
            error!(scan_id = %id, "Failed to delete violations of cancelled scan: {}", e);
        }

        info!(scan_id = %id, %previous, signalled, "Scan cancelled");
        self.activity
            .log(ActivityEvent {
                action: "scan.cancelled",
                scan_id: id,
                site_id,
                detail: format!("cancelled while {}", previous),
            })
            .await;

        Ok(CancelOutcome {
            scan_id: id,
            status: ScanStatus::Cancelled,
        })
    }
}

#[cfg(test)]
#[path = "cancel_scan_use_case_test.rs"]
mod tests;
