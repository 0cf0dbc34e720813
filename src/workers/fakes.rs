// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 带状态的内存实现，供执行器与调度器测试使用

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::models::page_result::{EngineKind, PageAudit, PageAuditResult, Violation};
use crate::domain::models::scan::{ScanJob, ScanStatus};
use crate::domain::models::score_history::ScoreHistoryEntry;
use crate::domain::models::site::Site;
use crate::domain::models::violation::ViolationRecord;
use crate::domain::repositories::page_result_repository::PageResultRepository;
use crate::domain::repositories::scan_repository::{RepositoryError, ScanRepository};
use crate::domain::repositories::score_history_repository::ScoreHistoryRepository;
use crate::domain::repositories::site_repository::SiteRepository;
use crate::domain::repositories::violation_repository::ViolationRepository;
use crate::domain::services::activity_logger::TracingActivityLogger;
use crate::engines::sitemap::{SitemapError, SitemapResolver};
use crate::engines::traits::{AuditEngine, EngineError};
use crate::infrastructure::services::progress_store_impl::InMemoryProgressStore;
use crate::workers::scan_worker::{ScanRunner, ScanRunnerDeps};

#[derive(Default)]
pub struct FakeScanRepo {
    pub rows: Mutex<HashMap<Uuid, ScanJob>>,
}

impl FakeScanRepo {
    pub fn get(&self, id: Uuid) -> ScanJob {
        self.rows.lock().unwrap()[&id].clone()
    }

    pub fn put(&self, scan: ScanJob) {
        self.rows.lock().unwrap().insert(scan.id, scan);
    }
}

#[async_trait]
impl ScanRepository for FakeScanRepo {
    async fn create(&self, scan: &ScanJob) -> Result<ScanJob, RepositoryError> {
        // a real insert suspends on the database round-trip
        tokio::task::yield_now().await;
        self.put(scan.clone());
        Ok(scan.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanJob>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self, status: Option<ScanStatus>) -> Result<Vec<ScanJob>, RepositoryError> {
        let mut rows: Vec<ScanJob> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| status.map_or(true, |st| s.status == st))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_if_status(
        &self,
        scan: &ScanJob,
        expected: &[ScanStatus],
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get(&scan.id) {
            Some(current) if expected.contains(&current.status) => {
                rows.insert(scan.id, scan.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_progress(
        &self,
        id: Uuid,
        pages_scanned: i32,
        resume_index: i32,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(row) if row.status == ScanStatus::InProgress => {
                row.pages_scanned = pages_scanned;
                row.resume_index = resume_index;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct FakeSiteRepo {
    pub sites: Mutex<HashMap<Uuid, Site>>,
}

#[async_trait]
impl SiteRepository for FakeSiteRepo {
    async fn create(&self, site: &Site) -> Result<Site, RepositoryError> {
        self.sites.lock().unwrap().insert(site.id, site.clone());
        Ok(site.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Site>, RepositoryError> {
        Ok(self.sites.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Site>, RepositoryError> {
        let sites = self.sites.lock().unwrap();
        Ok(ids.iter().filter_map(|id| sites.get(id).cloned()).collect())
    }
}

#[derive(Default)]
pub struct FakePageResults {
    pub rows: Mutex<Vec<PageAuditResult>>,
}

impl FakePageResults {
    pub fn for_scan(&self, scan_id: Uuid) -> Vec<PageAuditResult> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.scan_id == scan_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PageResultRepository for FakePageResults {
    async fn create(&self, result: &PageAuditResult) -> Result<(), RepositoryError> {
        self.rows.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn find_by_scan(&self, scan_id: Uuid) -> Result<Vec<PageAuditResult>, RepositoryError> {
        let mut rows = self.for_scan(scan_id);
        rows.sort_by_key(|r| (r.engine, r.page_index));
        Ok(rows)
    }

    async fn delete_from(
        &self,
        scan_id: Uuid,
        engine: EngineKind,
        from_page_index: i32,
    ) -> Result<u64, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !(r.scan_id == scan_id && r.engine == engine && r.page_index >= from_page_index));
        Ok((before - rows.len()) as u64)
    }

    async fn delete_by_scan(&self, scan_id: Uuid) -> Result<u64, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.scan_id != scan_id);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct FakeViolations {
    pub rows: Mutex<Vec<ViolationRecord>>,
}

#[async_trait]
impl ViolationRepository for FakeViolations {
    async fn insert_many(&self, records: &[ViolationRecord]) -> Result<u64, RepositoryError> {
        self.rows.lock().unwrap().extend_from_slice(records);
        Ok(records.len() as u64)
    }

    async fn find_by_scan(&self, scan_id: Uuid) -> Result<Vec<ViolationRecord>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.scan_id == scan_id)
            .cloned()
            .collect())
    }

    async fn delete_by_scan(&self, scan_id: Uuid) -> Result<u64, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.scan_id != scan_id);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct FakeHistory {
    pub rows: Mutex<Vec<ScoreHistoryEntry>>,
}

#[async_trait]
impl ScoreHistoryRepository for FakeHistory {
    async fn append(&self, entry: &ScoreHistoryEntry) -> Result<(), RepositoryError> {
        self.rows.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// 返回固定页面列表；为空时模拟站点地图抓取失败
pub struct FakeSitemap {
    pub pages: Vec<String>,
}

#[async_trait]
impl SitemapResolver for FakeSitemap {
    async fn resolve(&self, site: &Site) -> Result<Vec<String>, SitemapError> {
        if self.pages.is_empty() {
            return Err(SitemapError::Fetch {
                url: site.sitemap_url.clone().unwrap_or_default(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.pages.clone())
    }
}

/// 可配置延迟与失败的审计引擎，记录每次被审计的URL
pub struct FakeEngine {
    kind: EngineKind,
    delay: Mutex<Duration>,
    fail: bool,
    score: Option<i32>,
    violations_per_page: usize,
    pub calls: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn new(kind: EngineKind) -> Self {
        Self {
            kind,
            delay: Mutex::new(Duration::ZERO),
            fail: false,
            score: Some(90),
            violations_per_page: 1,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: EngineKind) -> Self {
        Self {
            fail: true,
            ..Self::new(kind)
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditEngine for FakeEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn audit(&self, url: &str) -> Result<PageAudit, EngineError> {
        self.calls.lock().unwrap().push(url.to_string());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(EngineError::Status(503));
        }
        Ok(PageAudit {
            score: self.score,
            violations: (0..self.violations_per_page)
                .map(|i| Violation {
                    rule_id: format!("rule-{}", i),
                    name: format!("Rule {}", i),
                    impact: "serious".to_string(),
                    element_count: 1,
                    help_url: None,
                })
                .collect(),
        })
    }
}

/// 执行器测试环境
pub struct Harness {
    pub scans: Arc<FakeScanRepo>,
    pub sites: Arc<FakeSiteRepo>,
    pub results: Arc<FakePageResults>,
    pub violations: Arc<FakeViolations>,
    pub history: Arc<FakeHistory>,
    pub progress: Arc<InMemoryProgressStore>,
    pub site: Site,
}

impl Default for Harness {
    fn default() -> Self {
        let site = Site::new(
            "Example",
            "https://example.com",
            Some("https://example.com/sitemap.xml".to_string()),
        );
        let sites = FakeSiteRepo::default();
        sites.sites.lock().unwrap().insert(site.id, site.clone());

        Self {
            scans: Arc::new(FakeScanRepo::default()),
            sites: Arc::new(sites),
            results: Arc::new(FakePageResults::default()),
            violations: Arc::new(FakeViolations::default()),
            history: Arc::new(FakeHistory::default()),
            progress: Arc::new(InMemoryProgressStore::new()),
            site,
        }
    }
}

impl Harness {
    pub fn runner(
        &self,
        engines: Vec<Arc<FakeEngine>>,
        pages: Vec<String>,
        budget: Duration,
    ) -> ScanRunner {
        ScanRunner::new(ScanRunnerDeps {
            scan_repo: self.scans.clone(),
            site_repo: self.sites.clone(),
            page_result_repo: self.results.clone(),
            violation_repo: self.violations.clone(),
            score_history_repo: self.history.clone(),
            sitemap: Arc::new(FakeSitemap { pages }),
            engines: engines
                .into_iter()
                .map(|e| e as Arc<dyn AuditEngine>)
                .collect(),
            progress_store: self.progress.clone(),
            activity: Arc::new(TracingActivityLogger),
            scan_budget: budget,
        })
    }
}

pub fn pages(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("https://example.com/page-{}", i))
        .collect()
}
