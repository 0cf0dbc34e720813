// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::future::join_all;
use metrics::{counter, gauge};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::models::page_result::{EngineKind, PageAuditResult, PageStatus};
use crate::domain::models::scan::{DomainError, ScanJob, ScanStatus};
use crate::domain::models::score_history::ScoreHistoryEntry;
use crate::domain::repositories::page_result_repository::PageResultRepository;
use crate::domain::repositories::scan_repository::{RepositoryError, ScanRepository};
use crate::domain::repositories::score_history_repository::ScoreHistoryRepository;
use crate::domain::repositories::site_repository::SiteRepository;
use crate::domain::repositories::violation_repository::ViolationRepository;
use crate::domain::services::activity_logger::{ActivityEvent, ActivityLogger};
use crate::domain::services::progress_reporter::{ProgressReporter, ProgressStore};
use crate::domain::services::result_aggregator::ResultAggregator;
use crate::domain::services::scan_scheduler::RunMode;
use crate::domain::services::timeout_guard::TimeoutGuard;
use crate::domain::services::violation_persister::ViolationPersister;
use crate::engines::sitemap::SitemapResolver;
use crate::engines::traits::AuditEngine;

/// 超时暂停时写入任务的原因
pub const TIMEOUT_REASON: &str = "scan exceeded time budget";
/// 停机中断时写入任务的原因
pub const SHUTDOWN_REASON: &str = "interrupted by shutdown";

/// 扫描执行错误
///
/// 任何未被单独处理的错误都会让任务进入 Failed
#[derive(Error, Debug)]
pub enum ScanRunError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Site {0} not found")]
    SiteNotFound(Uuid),

    #[error("No audit engine configured for {0}")]
    MissingEngine(EngineKind),

    #[error("Scan has no resolved page list")]
    MissingPages,
}

/// 扫描执行器依赖
pub struct ScanRunnerDeps {
    pub scan_repo: Arc<dyn ScanRepository>,
    pub site_repo: Arc<dyn SiteRepository>,
    pub page_result_repo: Arc<dyn PageResultRepository>,
    pub violation_repo: Arc<dyn ViolationRepository>,
    pub score_history_repo: Arc<dyn ScoreHistoryRepository>,
    pub sitemap: Arc<dyn SitemapResolver>,
    pub engines: Vec<Arc<dyn AuditEngine>>,
    pub progress_store: Arc<dyn ProgressStore>,
    pub activity: Arc<dyn ActivityLogger>,
    /// 单次执行的时间预算
    pub scan_budget: Duration,
}

/// 扫描执行器
///
/// 在后台驱动一个扫描任务：解析页面、按引擎轮次逐页审计、在页面边界
/// 检查取消与超时，结束时汇总结果。所有状态写入都带期望状态条件，
/// 与取消请求竞争时以先写入者为准。
pub struct ScanRunner {
    scan_repo: Arc<dyn ScanRepository>,
    site_repo: Arc<dyn SiteRepository>,
    page_result_repo: Arc<dyn PageResultRepository>,
    violation_repo: Arc<dyn ViolationRepository>,
    score_history_repo: Arc<dyn ScoreHistoryRepository>,
    sitemap: Arc<dyn SitemapResolver>,
    engines: HashMap<EngineKind, Arc<dyn AuditEngine>>,
    progress_store: Arc<dyn ProgressStore>,
    activity: Arc<dyn ActivityLogger>,
    persister: ViolationPersister,
    scan_budget: Duration,
}

impl ScanRunner {
    pub fn new(deps: ScanRunnerDeps) -> Self {
        let engines = deps
            .engines
            .into_iter()
            .map(|engine| (engine.kind(), engine))
            .collect();

        Self {
            persister: ViolationPersister::new(deps.violation_repo.clone()),
            scan_repo: deps.scan_repo,
            site_repo: deps.site_repo,
            page_result_repo: deps.page_result_repo,
            violation_repo: deps.violation_repo,
            score_history_repo: deps.score_history_repo,
            sitemap: deps.sitemap,
            engines,
            progress_store: deps.progress_store,
            activity: deps.activity,
            scan_budget: deps.scan_budget,
        }
    }

    fn budget(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.scan_budget).unwrap_or(chrono::Duration::hours(2))
    }

    fn engine(&self, kind: EngineKind) -> Result<Arc<dyn AuditEngine>, ScanRunError> {
        self.engines
            .get(&kind)
            .cloned()
            .ok_or(ScanRunError::MissingEngine(kind))
    }

    /// 执行扫描任务直到它离开 InProgress
    ///
    /// # 返回值
    ///
    /// 任务最终所处的状态（可能由其他写入者写入）
    #[instrument(skip(self, scan, token), fields(scan_id = %scan.id, site_id = %scan.site_id, scan_type = %scan.scan_type, mode = ?mode))]
    pub async fn run(&self, scan: ScanJob, mode: RunMode, token: CancellationToken) -> ScanStatus {
        let scan_id = scan.id;
        let progress = ProgressReporter::new(self.progress_store.clone(), scan_id);
        gauge!("scans_running").increment(1.0);

        let status = match self.execute(scan, mode, &token, &progress).await {
            Ok(status) => status,
            Err(e) => {
                error!("Scan execution failed: {}", e);
                self.force_fail(scan_id, &e.to_string(), &progress).await
            }
        };

        gauge!("scans_running").decrement(1.0);
        counter!("scans_finished_total", "status" => status.to_string()).increment(1);
        info!("Scan finished with status {}", status);
        status
    }

    async fn execute(
        &self,
        scan: ScanJob,
        mode: RunMode,
        token: &CancellationToken,
        progress: &ProgressReporter,
    ) -> Result<ScanStatus, ScanRunError> {
        let scan = match mode {
            RunMode::Fresh => match self.start(scan, progress).await? {
                Ok(scan) => scan,
                Err(status) => return Ok(status),
            },
            RunMode::Resume => {
                self.prune_from_resume_point(&scan).await?;
                progress
                    .milestone(format!(
                        "Resuming at visit {}/{}",
                        scan.resume_index, scan.pages_total
                    ))
                    .await;
                scan
            }
            RunMode::Reclaim => {
                let scan = scan.reclaim(self.budget())?;
                if !self
                    .scan_repo
                    .update_if_status(&scan, &[ScanStatus::InProgress])
                    .await?
                {
                    return self.settle_lost_race(scan.id, progress).await;
                }
                self.prune_from_resume_point(&scan).await?;
                progress
                    .milestone(format!(
                        "Reclaimed after restart at visit {}/{}",
                        scan.resume_index, scan.pages_total
                    ))
                    .await;
                scan
            }
        };

        if scan.page_urls.is_empty() {
            return Err(ScanRunError::MissingPages);
        }

        let guard = TimeoutGuard::start(self.scan_budget);
        debug!(budget = ?guard.remaining(), "Time budget armed");
        if scan.is_single_page() {
            self.run_single_page(scan, &guard, token, progress).await
        } else {
            self.run_passes(scan, &guard, token, progress).await
        }
    }

    /// 新任务：解析页面列表并进入 InProgress
    ///
    /// 内层 `Err` 表示任务已经终止（页面解析失败或被抢先取消）
    async fn start(
        &self,
        scan: ScanJob,
        progress: &ProgressReporter,
    ) -> Result<Result<ScanJob, ScanStatus>, ScanRunError> {
        let pages = match scan.page_url.clone() {
            Some(url) => vec![url],
            None => {
                let site = self
                    .site_repo
                    .find_by_id(scan.site_id)
                    .await?
                    .ok_or(ScanRunError::SiteNotFound(scan.site_id))?;

                match self.sitemap.resolve(&site).await {
                    Ok(pages) => pages,
                    Err(e) => {
                        warn!("Page resolution failed: {}", e);
                        let failed = scan.fail(e.to_string())?;
                        if self
                            .scan_repo
                            .update_if_status(&failed, &[ScanStatus::Pending])
                            .await?
                        {
                            progress.milestone(format!("Scan failed: {}", e)).await;
                            return Ok(Err(ScanStatus::Failed));
                        }
                        return self.settle_lost_race(failed.id, progress).await.map(Err);
                    }
                }
            }
        };

        let scan = scan.begin(pages, self.budget())?;
        if !self
            .scan_repo
            .update_if_status(&scan, &[ScanStatus::Pending])
            .await?
        {
            return self.settle_lost_race(scan.id, progress).await.map(Err);
        }

        info!(pages = scan.pages_per_pass(), "Scan started");
        progress
            .milestone(format!(
                "Resolved {} page(s), {} visit(s) planned",
                scan.pages_per_pass(),
                scan.pages_total
            ))
            .await;
        Ok(Ok(scan))
    }

    /// 删除恢复点及之后的结果，保证每个访问位置最多一条结果
    async fn prune_from_resume_point(&self, scan: &ScanJob) -> Result<(), ScanRunError> {
        let per_pass = scan.pages_per_pass();
        for (pass, &kind) in scan.scan_type.engines().iter().enumerate() {
            let pass_start = scan.pass_offset(pass);
            if scan.resume_index >= pass_start + per_pass {
                continue;
            }
            let from = (scan.resume_index - pass_start).max(0);
            let removed = self
                .page_result_repo
                .delete_from(scan.id, kind, from)
                .await?;
            if removed > 0 {
                debug!(engine = %kind, from, removed, "Pruned results past resume point");
            }
        }
        Ok(())
    }

    /// 多页模式：每个引擎完整跑一轮，轮次之间不交错
    async fn run_passes(
        &self,
        mut scan: ScanJob,
        guard: &TimeoutGuard,
        token: &CancellationToken,
        progress: &ProgressReporter,
    ) -> Result<ScanStatus, ScanRunError> {
        let per_pass = scan.pages_per_pass();

        for (pass, &kind) in scan.scan_type.engines().iter().enumerate() {
            let pass_start = scan.pass_offset(pass);
            if scan.resume_index >= pass_start + per_pass {
                continue;
            }
            let engine = self.engine(kind)?;
            progress.milestone(format!("Starting {} pass", kind)).await;

            let first = (scan.resume_index - pass_start).max(0);
            for page_index in first..per_pass {
                if token.is_cancelled() {
                    return self.stop_on_signal(scan, progress).await;
                }
                if guard.expired() {
                    return self.pause_on_timeout(scan, guard, progress).await;
                }

                let url = scan.page_urls[page_index as usize].clone();
                let result = self
                    .audit_page(engine.as_ref(), scan.id, page_index, &url)
                    .await;
                self.page_result_repo.create(&result).await?;
                scan.record_page();
                progress
                    .page(
                        kind,
                        scan.pages_scanned,
                        scan.pages_total,
                        &url,
                        &describe(&result),
                    )
                    .await;

                if !self
                    .scan_repo
                    .record_progress(scan.id, scan.pages_scanned, scan.resume_index)
                    .await?
                {
                    return self.settle_lost_race(scan.id, progress).await;
                }
                if guard.expired() {
                    return self.pause_on_timeout(scan, guard, progress).await;
                }
            }

            progress.milestone(format!("Finished {} pass", kind)).await;
        }

        self.finalize(scan, progress).await
    }

    /// 单页模式：所有引擎并发审计同一页面，全部失败时任务失败
    async fn run_single_page(
        &self,
        mut scan: ScanJob,
        guard: &TimeoutGuard,
        token: &CancellationToken,
        progress: &ProgressReporter,
    ) -> Result<ScanStatus, ScanRunError> {
        if token.is_cancelled() {
            return self.stop_on_signal(scan, progress).await;
        }
        if guard.expired() {
            return self.pause_on_timeout(scan, guard, progress).await;
        }

        let url = scan.page_urls[0].clone();
        let mut pending = Vec::new();
        for (pass, &kind) in scan.scan_type.engines().iter().enumerate() {
            if scan.pass_offset(pass) >= scan.resume_index {
                pending.push(self.engine(kind)?);
            }
        }

        let results = join_all(
            pending
                .iter()
                .map(|engine| self.audit_page(engine.as_ref(), scan.id, 0, &url)),
        )
        .await;

        let mut failures = Vec::new();
        for result in &results {
            self.page_result_repo.create(result).await?;
            scan.record_page();
            progress
                .page(
                    result.engine,
                    scan.pages_scanned,
                    scan.pages_total,
                    &url,
                    &describe(result),
                )
                .await;
            if result.status == PageStatus::Failed {
                failures.push(format!(
                    "{}: {}",
                    result.engine,
                    result.error_message.as_deref().unwrap_or("unknown error")
                ));
            }
        }

        if !self
            .scan_repo
            .record_progress(scan.id, scan.pages_scanned, scan.resume_index)
            .await?
        {
            return self.settle_lost_race(scan.id, progress).await;
        }

        if !results.is_empty() && failures.len() == results.len() {
            let message = failures.join("; ");
            warn!("Every engine failed: {}", message);
            let failed = scan.fail(message.clone())?;
            if !self
                .scan_repo
                .update_if_status(&failed, &[ScanStatus::InProgress])
                .await?
            {
                return self.settle_lost_race(failed.id, progress).await;
            }
            progress.milestone(format!("Scan failed: {}", message)).await;
            return Ok(ScanStatus::Failed);
        }
        if guard.expired() {
            return self.pause_on_timeout(scan, guard, progress).await;
        }

        self.finalize(scan, progress).await
    }

    async fn audit_page(
        &self,
        engine: &dyn AuditEngine,
        scan_id: Uuid,
        page_index: i32,
        url: &str,
    ) -> PageAuditResult {
        let kind = engine.kind();
        let result = if !is_auditable(url) {
            PageAuditResult::skipped(scan_id, kind, page_index, url, "unsupported URL scheme")
        } else {
            match engine.audit(url).await {
                Ok(audit) => PageAuditResult::success(scan_id, kind, page_index, url, audit),
                Err(e) => {
                    warn!(engine = %kind, url, "Page audit failed: {}", e);
                    PageAuditResult::failed(scan_id, kind, page_index, url, e.to_string())
                }
            }
        };

        counter!(
            "page_audits_total",
            "engine" => kind.to_string(),
            "status" => result.status.to_string()
        )
        .increment(1);
        result
    }

    /// 汇总结果并完成任务，之后尽力写入违规记录与分数历史
    async fn finalize(
        &self,
        scan: ScanJob,
        progress: &ProgressReporter,
    ) -> Result<ScanStatus, ScanRunError> {
        let results = self.page_result_repo.find_by_scan(scan.id).await?;
        let summary = ResultAggregator::summarize(&results);
        let completed = scan.complete(summary)?;

        if !self
            .scan_repo
            .update_if_status(&completed, &[ScanStatus::InProgress])
            .await?
        {
            return self.settle_lost_race(completed.id, progress).await;
        }

        let persisted = self.persister.persist(completed.id, &results).await;
        if let Err(e) = self
            .score_history_repo
            .append(&ScoreHistoryEntry::from(&completed))
            .await
        {
            warn!("Failed to append score history: {}", e);
        }

        progress
            .milestone(format!(
                "Scan completed: axe={} lighthouse={} violations={}",
                fmt_score(completed.axe_score),
                fmt_score(completed.lighthouse_score),
                completed.total_violations_sum
            ))
            .await;
        self.activity
            .log(ActivityEvent {
                action: "scan.completed",
                scan_id: completed.id,
                site_id: completed.site_id,
                detail: format!(
                    "{} violation(s), {} record(s) persisted",
                    completed.total_violations_sum, persisted
                ),
            })
            .await;
        Ok(ScanStatus::Completed)
    }

    async fn pause(
        &self,
        scan: ScanJob,
        reason: &str,
        progress: &ProgressReporter,
    ) -> Result<ScanStatus, ScanRunError> {
        let paused = scan.pause(reason)?;
        if !self
            .scan_repo
            .update_if_status(&paused, &[ScanStatus::InProgress])
            .await?
        {
            return self.settle_lost_race(paused.id, progress).await;
        }

        info!(resume_index = paused.resume_index, "Scan paused: {}", reason);
        progress
            .milestone(format!(
                "Scan paused at visit {}/{}: {}",
                paused.resume_index, paused.pages_total, reason
            ))
            .await;
        Ok(ScanStatus::Paused)
    }

    async fn pause_on_timeout(
        &self,
        scan: ScanJob,
        guard: &TimeoutGuard,
        progress: &ProgressReporter,
    ) -> Result<ScanStatus, ScanRunError> {
        warn!(
            elapsed = ?guard.elapsed(),
            budget = ?guard.budget(),
            "Scan ran out of time budget"
        );
        self.pause(scan, TIMEOUT_REASON, progress).await
    }

    /// 取消令牌触发：任务已被取消时清理，否则视为停机并暂停
    async fn stop_on_signal(
        &self,
        scan: ScanJob,
        progress: &ProgressReporter,
    ) -> Result<ScanStatus, ScanRunError> {
        match self.observed_status(scan.id).await? {
            ScanStatus::InProgress => self.pause(scan, SHUTDOWN_REASON, progress).await,
            _ => self.settle_lost_race(scan.id, progress).await,
        }
    }

    /// 条件写入失败后，以存储中的状态为准
    async fn settle_lost_race(
        &self,
        scan_id: Uuid,
        progress: &ProgressReporter,
    ) -> Result<ScanStatus, ScanRunError> {
        let status = self.observed_status(scan_id).await?;
        if status == ScanStatus::Cancelled {
            self.discard_results(scan_id).await;
            progress.milestone("Scan cancelled").await;
        }
        debug!("Scan left in_progress externally, now {}", status);
        Ok(status)
    }

    async fn observed_status(&self, scan_id: Uuid) -> Result<ScanStatus, ScanRunError> {
        Ok(self
            .scan_repo
            .find_by_id(scan_id)
            .await?
            .map(|s| s.status)
            .unwrap_or(ScanStatus::Cancelled))
    }

    /// 已取消任务的结果不保留
    async fn discard_results(&self, scan_id: Uuid) {
        if let Err(e) = self.page_result_repo.delete_by_scan(scan_id).await {
            warn!("Failed to delete page results of cancelled scan: {}", e);
        }
        if let Err(e) = self.violation_repo.delete_by_scan(scan_id).await {
            warn!("Failed to delete violations of cancelled scan: {}", e);
        }
    }

    /// 未处理错误：仍可失败的任务写入 Failed，其余保持原状
    async fn force_fail(
        &self,
        scan_id: Uuid,
        message: &str,
        progress: &ProgressReporter,
    ) -> ScanStatus {
        let current = match self.scan_repo.find_by_id(scan_id).await {
            Ok(Some(scan)) => scan,
            Ok(None) => return ScanStatus::Failed,
            Err(e) => {
                error!("Cannot read scan to mark it failed: {}", e);
                return ScanStatus::Failed;
            }
        };

        let status = current.status;
        let failed = match current.fail(message) {
            Ok(failed) => failed,
            Err(_) => return status,
        };

        match self
            .scan_repo
            .update_if_status(&failed, &ScanStatus::CANCELLABLE)
            .await
        {
            Ok(true) => {
                progress.milestone(format!("Scan failed: {}", message)).await;
                ScanStatus::Failed
            }
            Ok(false) => self
                .observed_status(scan_id)
                .await
                .unwrap_or(ScanStatus::Failed),
            Err(e) => {
                error!("Failed to mark scan as failed: {}", e);
                ScanStatus::Failed
            }
        }
    }
}

fn is_auditable(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn describe(result: &PageAuditResult) -> String {
    match result.status {
        PageStatus::Success => format!(
            "{} violation(s), score {}",
            result.violation_count,
            fmt_score(result.score)
        ),
        PageStatus::Failed => format!(
            "failed: {}",
            result.error_message.as_deref().unwrap_or("unknown error")
        ),
        PageStatus::Skipped => format!(
            "skipped: {}",
            result.error_message.as_deref().unwrap_or("not auditable")
        ),
    }
}

fn fmt_score(score: Option<i32>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| s.to_string())
}

#[cfg(test)]
#[path = "scan_worker_test.rs"]
mod tests;
