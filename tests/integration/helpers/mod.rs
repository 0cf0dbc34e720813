// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use auditrs::application::use_cases::cancel_scan_use_case::CancelScanUseCase;
use auditrs::application::use_cases::scan_use_case::{ScanUseCase, ScanUseCaseDeps};
use auditrs::domain::models::site::Site;
use auditrs::domain::repositories::site_repository::SiteRepository;
use auditrs::domain::services::activity_logger::TracingActivityLogger;
use auditrs::domain::services::rate_limiting_service::SlidingWindowPolicy;
use auditrs::domain::services::scan_scheduler::ScanScheduler;
use auditrs::engines::axe_engine::AxeEngine;
use auditrs::engines::lighthouse_engine::LighthouseEngine;
use auditrs::engines::runner_client::AuditRunnerClient;
use auditrs::engines::sitemap::HttpSitemapResolver;
use auditrs::engines::traits::AuditEngine;
use auditrs::infrastructure::repositories::page_result_repo_impl::PageResultRepositoryImpl;
use auditrs::infrastructure::repositories::scan_repo_impl::ScanRepositoryImpl;
use auditrs::infrastructure::repositories::score_history_repo_impl::ScoreHistoryRepositoryImpl;
use auditrs::infrastructure::repositories::site_repo_impl::SiteRepositoryImpl;
use auditrs::infrastructure::repositories::violation_repo_impl::ViolationRepositoryImpl;
use auditrs::infrastructure::services::progress_store_impl::InMemoryProgressStore;
use auditrs::infrastructure::services::rate_limiting_service_impl::InMemoryRateLimiter;
use auditrs::presentation::routes;
use auditrs::workers::manager::ScanSupervisor;
use auditrs::workers::scan_worker::{ScanRunner, ScanRunnerDeps};
use axum_test::TestServer;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<DatabaseConnection>,
    pub supervisor: Arc<ScanSupervisor>,
    /// 同时扮演审计服务与站点（站点地图）
    pub audit_runner: MockServer,
    site_repo: Arc<SiteRepositoryImpl>,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_limit(50).await
}

pub async fn create_test_app_with_limit(scans_per_hour: u32) -> TestApp {
    let db = Arc::new(Database::connect("sqlite::memory:").await.unwrap());
    Migrator::up(db.as_ref(), None).await.unwrap();

    let audit_runner = MockServer::start().await;

    let scan_repo = Arc::new(ScanRepositoryImpl::new(db.clone()));
    let site_repo = Arc::new(SiteRepositoryImpl::new(db.clone()));
    let page_result_repo = Arc::new(PageResultRepositoryImpl::new(db.clone()));
    let violation_repo = Arc::new(ViolationRepositoryImpl::new(db.clone()));
    let progress_store = Arc::new(InMemoryProgressStore::new());
    let activity = Arc::new(TracingActivityLogger);

    let client = |engine: &str| {
        AuditRunnerClient::new(
            format!("{}/{}", audit_runner.uri(), engine),
            0,
            Duration::from_secs(10),
        )
        .with_initial_backoff(Duration::from_millis(10))
    };
    let engines: Vec<Arc<dyn AuditEngine>> = vec![
        Arc::new(AxeEngine::new(client("axe"))),
        Arc::new(LighthouseEngine::new(client("lighthouse"))),
    ];

    let runner = Arc::new(ScanRunner::new(ScanRunnerDeps {
        scan_repo: scan_repo.clone(),
        site_repo: site_repo.clone(),
        page_result_repo: page_result_repo.clone(),
        violation_repo: violation_repo.clone(),
        score_history_repo: Arc::new(ScoreHistoryRepositoryImpl::new(db.clone())),
        sitemap: Arc::new(HttpSitemapResolver::new(500, Duration::from_secs(10))),
        engines,
        progress_store: progress_store.clone(),
        activity: activity.clone(),
        scan_budget: Duration::from_secs(2 * 60 * 60),
    }));
    let supervisor = Arc::new(ScanSupervisor::new(runner, scan_repo.clone()));
    let scheduler: Arc<dyn ScanScheduler> = supervisor.clone();

    let scan_use_case = Arc::new(ScanUseCase::new(ScanUseCaseDeps {
        scan_repo: scan_repo.clone(),
        site_repo: site_repo.clone(),
        page_result_repo: page_result_repo.clone(),
        violation_repo: violation_repo.clone(),
        rate_limiter: Arc::new(InMemoryRateLimiter::new(SlidingWindowPolicy::new(
            scans_per_hour,
            chrono::Duration::hours(1),
        ))),
        progress_store,
        scheduler: scheduler.clone(),
        activity: activity.clone(),
        scan_budget: chrono::Duration::hours(2),
    }));
    let cancel_use_case = Arc::new(CancelScanUseCase::new(
        scan_repo,
        page_result_repo,
        violation_repo,
        scheduler,
        activity,
    ));

    let server = TestServer::new(routes::routes(scan_use_case, cancel_use_case)).unwrap();

    TestApp {
        server,
        db,
        supervisor,
        audit_runner,
        site_repo,
    }
}

#[allow(dead_code)]
impl TestApp {
    pub fn page_urls(&self, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("{}/page-{}", self.audit_runner.uri(), i))
            .collect()
    }

    /// 创建站点；`with_sitemap` 为 false 时只能使用单页模式
    pub async fn create_site(&self, with_sitemap: bool) -> Site {
        let sitemap = with_sitemap.then(|| format!("{}/sitemap.xml", self.audit_runner.uri()));
        let site = Site::new("Example Shop", self.audit_runner.uri(), sitemap);
        self.site_repo.create(&site).await.unwrap()
    }

    /// 挂载站点地图与两个审计端点
    pub async fn mount_audit_runner(&self, page_count: usize, audit_delay: Duration) {
        let urls: String = self
            .page_urls(page_count)
            .iter()
            .map(|u| format!("<url><loc>{}</loc></url>", u))
            .collect();
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
                urls
            )))
            .mount(&self.audit_runner)
            .await;

        Mock::given(method("POST"))
            .and(path("/axe"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(axe_body())
                    .set_delay(audit_delay),
            )
            .mount(&self.audit_runner)
            .await;

        Mock::given(method("POST"))
            .and(path("/lighthouse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(lighthouse_body())
                    .set_delay(audit_delay),
            )
            .mount(&self.audit_runner)
            .await;
    }

    pub async fn create_scan(&self, body: Value) -> Value {
        let response = self.server.post("/scans").json(&body).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["scan"].clone()
    }

    /// 轮询直到任务进入给定状态之一
    pub async fn wait_for_status(&self, scan_id: &str, statuses: &[&str]) -> Value {
        for _ in 0..200 {
            let scan = self.server.get(&format!("/scans/{}", scan_id)).await.json::<Value>()["scan"]
                .clone();
            if statuses.iter().any(|s| scan["status"] == *s) {
                return scan;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("scan {} never reached {:?}", scan_id, statuses);
    }
}

/// 两条违规，每页 axe 分数 90
pub fn axe_body() -> Value {
    json!({
        "violations": [
            {
                "id": "image-alt",
                "impact": "critical",
                "help": "Images must have alternate text",
                "helpUrl": "https://dequeuniversity.com/rules/axe/4.8/image-alt",
                "nodes": [{ "target": ["img.hero"] }, { "target": ["img.logo"] }]
            },
            {
                "id": "label",
                "impact": "serious",
                "help": "Form elements must have labels",
                "helpUrl": "https://dequeuniversity.com/rules/axe/4.8/label",
                "nodes": [{ "target": ["#email"] }]
            }
        ]
    })
}

/// 一条未通过的审计，每页 lighthouse 分数 85
pub fn lighthouse_body() -> Value {
    json!({
        "lhr": {
            "categories": {
                "accessibility": {
                    "score": 0.85,
                    "auditRefs": [
                        { "id": "color-contrast", "weight": 7 },
                        { "id": "document-title", "weight": 3 }
                    ]
                }
            },
            "audits": {
                "color-contrast": {
                    "title": "Background and foreground colors do not have a sufficient contrast ratio.",
                    "description": "Low-contrast text is difficult to read. [Learn more](https://dequeuniversity.com/rules/axe/4.8/color-contrast).",
                    "score": 0,
                    "scoreDisplayMode": "binary",
                    "details": { "items": [{}, {}, {}] }
                },
                "document-title": {
                    "title": "Document has a `<title>` element",
                    "score": 1,
                    "scoreDisplayMode": "binary"
                }
            }
        }
    })
}

#[allow(dead_code)]
pub fn random_id() -> String {
    Uuid::new_v4().to_string()
}
