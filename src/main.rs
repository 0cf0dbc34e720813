// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Context;
use auditrs::application::use_cases::cancel_scan_use_case::CancelScanUseCase;
use auditrs::application::use_cases::scan_use_case::{ScanUseCase, ScanUseCaseDeps};
use auditrs::config::settings::{Backend, Settings};
use auditrs::domain::repositories::page_result_repository::PageResultRepository;
use auditrs::domain::repositories::scan_repository::ScanRepository;
use auditrs::domain::repositories::score_history_repository::ScoreHistoryRepository;
use auditrs::domain::repositories::site_repository::SiteRepository;
use auditrs::domain::repositories::violation_repository::ViolationRepository;
use auditrs::domain::services::activity_logger::{ActivityLogger, TracingActivityLogger};
use auditrs::domain::services::progress_reporter::ProgressStore;
use auditrs::domain::services::rate_limiting_service::{RateLimitingService, SlidingWindowPolicy};
use auditrs::domain::services::scan_scheduler::ScanScheduler;
use auditrs::engines::axe_engine::AxeEngine;
use auditrs::engines::lighthouse_engine::LighthouseEngine;
use auditrs::engines::runner_client::AuditRunnerClient;
use auditrs::engines::sitemap::HttpSitemapResolver;
use auditrs::engines::traits::AuditEngine;
use auditrs::infrastructure::cache::redis_client::RedisClient;
use auditrs::infrastructure::database::connection;
use auditrs::infrastructure::metrics;
use auditrs::infrastructure::repositories::page_result_repo_impl::PageResultRepositoryImpl;
use auditrs::infrastructure::repositories::scan_repo_impl::ScanRepositoryImpl;
use auditrs::infrastructure::repositories::score_history_repo_impl::ScoreHistoryRepositoryImpl;
use auditrs::infrastructure::repositories::site_repo_impl::SiteRepositoryImpl;
use auditrs::infrastructure::repositories::violation_repo_impl::ViolationRepositoryImpl;
use auditrs::infrastructure::services::progress_store_impl::{
    InMemoryProgressStore, RedisProgressStore,
};
use auditrs::infrastructure::services::rate_limiting_service_impl::{
    InMemoryRateLimiter, RedisRateLimiter,
};
use auditrs::presentation::routes;
use auditrs::utils::telemetry;
use auditrs::workers::manager::{wait_for_shutdown_signal, ScanSupervisor};
use auditrs::workers::scan_worker::{ScanRunner, ScanRunnerDeps};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// 停机时等待扫描任务暂停的宽限期
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting auditrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!(environment = %settings.environment, "Configuration loaded");

    metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    connection::run_migrations(db.as_ref()).await?;
    info!("Database migrations applied");

    // 4. Redis, only when a component needs it
    let redis = if settings.needs_redis() {
        let url = settings
            .redis
            .url
            .as_deref()
            .context("redis.url is required when a redis backend is selected")?;
        let client = Arc::new(RedisClient::new(url).await?);
        info!("Redis client initialized");
        Some(client)
    } else {
        None
    };

    // 5. Stateful services
    let policy = SlidingWindowPolicy::new(settings.scan_limit_per_hour(), settings.rate_limit_window());
    let rate_limiter: Arc<dyn RateLimitingService> = match (settings.rate_limiting.backend, &redis) {
        (Backend::Redis, Some(redis)) => Arc::new(RedisRateLimiter::new(redis.clone(), policy)),
        _ => Arc::new(InMemoryRateLimiter::new(policy)),
    };
    info!(
        limit = policy.limit,
        backend = ?settings.rate_limiting.backend,
        "Rate limiter initialized"
    );

    let progress_store: Arc<dyn ProgressStore> = match (settings.progress.backend, &redis) {
        (Backend::Redis, Some(redis)) => Arc::new(RedisProgressStore::new(
            redis.clone(),
            settings.progress.ttl_secs as i64,
        )),
        _ => Arc::new(InMemoryProgressStore::new()),
    };

    // 6. Repositories
    let scan_repo: Arc<dyn ScanRepository> = Arc::new(ScanRepositoryImpl::new(db.clone()));
    let site_repo: Arc<dyn SiteRepository> = Arc::new(SiteRepositoryImpl::new(db.clone()));
    let page_result_repo: Arc<dyn PageResultRepository> =
        Arc::new(PageResultRepositoryImpl::new(db.clone()));
    let violation_repo: Arc<dyn ViolationRepository> =
        Arc::new(ViolationRepositoryImpl::new(db.clone()));
    let score_history_repo: Arc<dyn ScoreHistoryRepository> =
        Arc::new(ScoreHistoryRepositoryImpl::new(db.clone()));
    let activity: Arc<dyn ActivityLogger> = Arc::new(TracingActivityLogger);

    // 7. Audit engines
    let engines: Vec<Arc<dyn AuditEngine>> = vec![
        Arc::new(AxeEngine::new(AuditRunnerClient::new(
            settings.engines.axe_url.clone(),
            settings.engines.max_retries,
            settings.page_timeout(),
        ))),
        Arc::new(LighthouseEngine::new(AuditRunnerClient::new(
            settings.engines.lighthouse_url.clone(),
            settings.engines.max_retries,
            settings.page_timeout(),
        ))),
    ];

    // 8. Scan execution
    let runner = Arc::new(ScanRunner::new(ScanRunnerDeps {
        scan_repo: scan_repo.clone(),
        site_repo: site_repo.clone(),
        page_result_repo: page_result_repo.clone(),
        violation_repo: violation_repo.clone(),
        score_history_repo,
        sitemap: Arc::new(HttpSitemapResolver::new(
            settings.scan.max_pages,
            settings.page_timeout(),
        )),
        engines,
        progress_store: progress_store.clone(),
        activity: activity.clone(),
        scan_budget: settings.scan_budget(),
    }));
    let supervisor = Arc::new(ScanSupervisor::new(runner, scan_repo.clone()));

    if settings.scan.reclaim_on_startup {
        match supervisor.reclaim_orphans().await {
            Ok(0) => {}
            Ok(count) => info!("Rescheduled {} scan(s) left by a previous run", count),
            Err(e) => warn!("Failed to reclaim orphaned scans: {}", e),
        }
    }

    let scheduler: Arc<dyn ScanScheduler> = supervisor.clone();
    let scan_use_case = Arc::new(ScanUseCase::new(ScanUseCaseDeps {
        scan_repo: scan_repo.clone(),
        site_repo,
        page_result_repo: page_result_repo.clone(),
        violation_repo: violation_repo.clone(),
        rate_limiter,
        progress_store,
        scheduler: scheduler.clone(),
        activity: activity.clone(),
        scan_budget: chrono::Duration::from_std(settings.scan_budget())?,
    }));
    let cancel_use_case = Arc::new(CancelScanUseCase::new(
        scan_repo,
        page_result_repo,
        violation_repo,
        scheduler,
        activity,
    ));

    // 9. Start HTTP server
    let app = routes::routes(scan_use_case, cancel_use_case);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    supervisor.shutdown(SHUTDOWN_GRACE).await;
    info!("auditrs stopped");
    Ok(())
}
