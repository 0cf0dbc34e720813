// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::page_result::{EngineKind, PageAuditResult};
use crate::domain::models::scan::{ScanJob, ScanStatus};
use crate::domain::models::site::Site;
use crate::domain::models::violation::ViolationRecord;
use crate::domain::repositories::page_result_repository::PageResultRepository;
use crate::domain::repositories::scan_repository::{RepositoryError, ScanRepository};
use crate::domain::repositories::site_repository::SiteRepository;
use crate::domain::repositories::violation_repository::ViolationRepository;
use crate::domain::services::rate_limiting_service::{
    RateLimitDecision, RateLimitingError, RateLimitingService,
};
use crate::domain::services::scan_scheduler::{RunMode, ScanScheduler};
use async_trait::async_trait;
use mockall::mock;
use uuid::Uuid;

mock! {
    pub ScanRepository {}
    #[async_trait]
    impl ScanRepository for ScanRepository {
        async fn create(&self, scan: &ScanJob) -> Result<ScanJob, RepositoryError>;
        async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanJob>, RepositoryError>;
        async fn list(&self, status: Option<ScanStatus>) -> Result<Vec<ScanJob>, RepositoryError>;
        async fn update_if_status(&self, scan: &ScanJob, expected: &[ScanStatus]) -> Result<bool, RepositoryError>;
        async fn record_progress(&self, id: Uuid, pages_scanned: i32, resume_index: i32) -> Result<bool, RepositoryError>;
    }
}

mock! {
    pub SiteRepository {}
    #[async_trait]
    impl SiteRepository for SiteRepository {
        async fn create(&self, site: &Site) -> Result<Site, RepositoryError>;
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Site>, RepositoryError>;
        async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Site>, RepositoryError>;
    }
}

mock! {
    pub PageResultRepository {}
    #[async_trait]
    impl PageResultRepository for PageResultRepository {
        async fn create(&self, result: &PageAuditResult) -> Result<(), RepositoryError>;
        async fn find_by_scan(&self, scan_id: Uuid) -> Result<Vec<PageAuditResult>, RepositoryError>;
        async fn delete_from(&self, scan_id: Uuid, engine: EngineKind, from_page_index: i32) -> Result<u64, RepositoryError>;
        async fn delete_by_scan(&self, scan_id: Uuid) -> Result<u64, RepositoryError>;
    }
}

mock! {
    pub ViolationRepository {}
    #[async_trait]
    impl ViolationRepository for ViolationRepository {
        async fn insert_many(&self, records: &[ViolationRecord]) -> Result<u64, RepositoryError>;
        async fn find_by_scan(&self, scan_id: Uuid) -> Result<Vec<ViolationRecord>, RepositoryError>;
        async fn delete_by_scan(&self, scan_id: Uuid) -> Result<u64, RepositoryError>;
    }
}

mock! {
    pub RateLimiter {}
    #[async_trait]
    impl RateLimitingService for RateLimiter {
        async fn admit(&self, site_id: Uuid, cost: u32) -> Result<RateLimitDecision, RateLimitingError>;
        async fn record(&self, site_id: Uuid, cost: u32) -> Result<(), RateLimitingError>;
    }
}

mock! {
    pub Scheduler {}
    impl ScanScheduler for Scheduler {
        fn schedule(&self, scan: ScanJob, mode: RunMode);
        fn cancel(&self, scan_id: Uuid) -> bool;
    }
}
