// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::{
    application::dto::scan_request::{CreateScanRequestDto, ResumeScanRequestDto},
    domain::{
        models::{
            scan::{DomainError, ScanJob, ScanStatus},
            violation::ViolationRecord,
        },
        repositories::{
            page_result_repository::PageResultRepository,
            scan_repository::{RepositoryError, ScanRepository},
            site_repository::SiteRepository,
            violation_repository::ViolationRepository,
        },
        services::{
            activity_logger::{ActivityEvent, ActivityLogger},
            progress_reporter::{ProgressReporter, ProgressStore},
            rate_limiting_service::RateLimitingService,
            scan_scheduler::{RunMode, ScanScheduler},
        },
    },
    utils::site_semaphore::SiteSemaphore,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Error, Debug)]
pub enum ScanUseCaseError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Rate limit exceeded")]
    RateLimited {
        remaining: u32,
        reset_time: DateTime<Utc>,
    },
    #[error("{0}")]
    InvalidState(String),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for ScanUseCaseError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidStateTransition { from, action } => {
                ScanUseCaseError::InvalidState(format!("Cannot {} a scan that is {}", action, from))
            }
            DomainError::ValidationError(msg) => ScanUseCaseError::ValidationError(msg),
        }
    }
}

/// 列表项：任务加上派生的站点名称
#[derive(Debug, Clone, Serialize)]
pub struct ScanListItem {
    #[serde(flatten)]
    pub scan: ScanJob,
    pub site_name: Option<String>,
}

/// 扫描生命周期用例
///
/// 负责准入（校验、限流、创建、调度）以及查询与恢复
pub struct ScanUseCase {
    scan_repo: Arc<dyn ScanRepository>,
    site_repo: Arc<dyn SiteRepository>,
    page_result_repo: Arc<dyn PageResultRepository>,
    violation_repo: Arc<dyn ViolationRepository>,
    rate_limiter: Arc<dyn RateLimitingService>,
    progress_store: Arc<dyn ProgressStore>,
    scheduler: Arc<dyn ScanScheduler>,
    activity: Arc<dyn ActivityLogger>,
    scan_budget: chrono::Duration,
    /// 同一站点的准入（判定、创建、记录）串行执行
    admission: SiteSemaphore,
}

/// 用例依赖
pub struct ScanUseCaseDeps {
    pub scan_repo: Arc<dyn ScanRepository>,
    pub site_repo: Arc<dyn SiteRepository>,
    pub page_result_repo: Arc<dyn PageResultRepository>,
    pub violation_repo: Arc<dyn ViolationRepository>,
    pub rate_limiter: Arc<dyn RateLimitingService>,
    pub progress_store: Arc<dyn ProgressStore>,
    pub scheduler: Arc<dyn ScanScheduler>,
    pub activity: Arc<dyn ActivityLogger>,
    pub scan_budget: chrono::Duration,
}

impl ScanUseCase {
    pub fn new(deps: ScanUseCaseDeps) -> Self {
        Self {
            scan_repo: deps.scan_repo,
            site_repo: deps.site_repo,
            page_result_repo: deps.page_result_repo,
            violation_repo: deps.violation_repo,
            rate_limiter: deps.rate_limiter,
            progress_store: deps.progress_store,
            scheduler: deps.scheduler,
            activity: deps.activity,
            scan_budget: deps.scan_budget,
            admission: SiteSemaphore::default(),
        }
    }

    /// 准入并创建扫描任务，立即返回，执行在后台进行
    pub async fn create_scan(&self, dto: CreateScanRequestDto) -> Result<ScanJob, ScanUseCaseError> {
        dto.validate()
            .map_err(|e| ScanUseCaseError::ValidationError(e.to_string()))?;

        let site = self
            .site_repo
            .find_by_id(dto.site_id)
            .await?
            .ok_or(ScanUseCaseError::NotFound("Site"))?;

        if dto.page_url.is_none() && !site.has_page_source() {
            return Err(ScanUseCaseError::ValidationError(
                "Site has no sitemap to resolve pages from".to_string(),
            ));
        }

        let cost = dto.scan_type.admission_cost();
        let scan = {
            let _admission = self
                .admission
                .acquire(site.id)
                .await
                .map_err(|e| ScanUseCaseError::Internal(e.to_string()))?;

            let decision = self
                .rate_limiter
                .admit(site.id, cost)
                .await
                .map_err(|e| ScanUseCaseError::Internal(e.to_string()))?;
            if !decision.allowed {
                metrics::counter!("scans_rate_limited_total").increment(1);
                warn!(site_id = %site.id, remaining = decision.remaining, "Scan rejected by rate limiter");
                return Err(ScanUseCaseError::RateLimited {
                    remaining: decision.remaining,
                    reset_time: decision.reset_time,
                });
            }

            let scan = self
                .scan_repo
                .create(&ScanJob::new(site.id, dto.scan_type, dto.page_url))
                .await?;

            if let Err(e) = self.rate_limiter.record(site.id, cost).await {
                warn!(scan_id = %scan.id, "Failed to record rate limit usage: {}", e);
            }
            scan
        };
        metrics::counter!("scans_admitted_total").increment(1);

        info!(scan_id = %scan.id, site_id = %site.id, scan_type = %scan.scan_type, "Scan admitted");
        self.activity
            .log(ActivityEvent {
                action: "scan.created",
                scan_id: scan.id,
                site_id: site.id,
                detail: format!("{} scan of {}", scan.scan_type, site.name),
            })
            .await;

        self.scheduler.schedule(scan.clone(), RunMode::Fresh);
        Ok(scan)
    }

    /// 列出任务，可按状态过滤
    pub async fn list_scans(
        &self,
        status: Option<&str>,
    ) -> Result<Vec<ScanListItem>, ScanUseCaseError> {
        let status = match status.filter(|s| !s.is_empty()) {
            Some(s) => Some(s.parse::<ScanStatus>().map_err(|_| {
                ScanUseCaseError::ValidationError(format!("Unknown scan status '{}'", s))
            })?),
            None => None,
        };

        let scans = self.scan_repo.list(status).await?;
        let site_ids: Vec<Uuid> = scans
            .iter()
            .map(|s| s.site_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names: HashMap<Uuid, String> = self
            .site_repo
            .find_by_ids(&site_ids)
            .await?
            .into_iter()
            .map(|site| (site.id, site.name))
            .collect();

        Ok(scans
            .into_iter()
            .map(|scan| ScanListItem {
                site_name: names.get(&scan.site_id).cloned(),
                scan,
            })
            .collect())
    }

    pub async fn get_scan(&self, id: Uuid) -> Result<ScanJob, ScanUseCaseError> {
        self.scan_repo
            .find_by_id(id)
            .await?
            .ok_or(ScanUseCaseError::NotFound("Scan"))
    }

    /// 任务的进度日志
    pub async fn get_progress(&self, id: Uuid) -> Result<Vec<String>, ScanUseCaseError> {
        self.get_scan(id).await?;
        self.progress_store
            .fetch(id)
            .await
            .map_err(|e| ScanUseCaseError::Internal(e.to_string()))
    }

    /// 任务的违规记录
    pub async fn get_violations(&self, id: Uuid) -> Result<Vec<ViolationRecord>, ScanUseCaseError> {
        self.get_scan(id).await?;
        Ok(self.violation_repo.find_by_scan(id).await?)
    }

    /// 从暂停位置恢复，或清空进度后重新开始
    ///
    /// 不经过限流：没有启动新的扫描
    pub async fn resume_scan(
        &self,
        id: Uuid,
        dto: ResumeScanRequestDto,
    ) -> Result<ScanJob, ScanUseCaseError> {
        dto.validate()
            .map_err(|e| ScanUseCaseError::ValidationError(e.to_string()))?;

        let scan = self.get_scan(id).await?;
        let site_id = scan.site_id;

        let (scan, expected, mode, action) = if dto.restart {
            let expected = [ScanStatus::Paused, ScanStatus::Failed, ScanStatus::Completed];
            (scan.restart()?, expected.to_vec(), RunMode::Fresh, "scan.restarted")
        } else {
            let from = dto.resume_from_index.unwrap_or(scan.resume_index);
            let resumed = scan.resume(from, self.scan_budget)?;
            (resumed, vec![ScanStatus::Paused], RunMode::Resume, "scan.resumed")
        };

        if !self.scan_repo.update_if_status(&scan, &expected).await? {
            return Err(ScanUseCaseError::InvalidState(
                "Scan status changed concurrently".to_string(),
            ));
        }

        // the row is already pending: cleanup failures must not keep it from being scheduled
        if mode == RunMode::Fresh {
            if let Err(e) = self.page_result_repo.delete_by_scan(id).await {
                warn!(scan_id = %id, "Failed to clear page results before restart: {}", e);
            }
            if let Err(e) = self.violation_repo.delete_by_scan(id).await {
                warn!(scan_id = %id, "Failed to clear violations before restart: {}", e);
            }
            ProgressReporter::new(self.progress_store.clone(), id)
                .reset()
                .await;
        }

        info!(scan_id = %id, resume_index = scan.resume_index, "{}", action);
        self.activity
            .log(ActivityEvent {
                action,
                scan_id: id,
                site_id,
                detail: format!("from visit {}", scan.resume_index),
            })
            .await;

        self.scheduler.schedule(scan.clone(), mode);
        Ok(scan)
    }
}

#[cfg(test)]
#[path = "scan_use_case_test.rs"]
mod tests;
