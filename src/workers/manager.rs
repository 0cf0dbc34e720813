// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::models::scan::{ScanJob, ScanStatus};
use crate::domain::repositories::scan_repository::{RepositoryError, ScanRepository};
use crate::domain::services::scan_scheduler::{RunMode, ScanScheduler};
use crate::workers::scan_worker::ScanRunner;
use crate::utils::site_semaphore::SiteSemaphore;

struct RunHandle {
    generation: u64,
    token: CancellationToken,
}

/// 扫描任务调度器
///
/// 每个任务在独立的 tokio 任务中执行，与请求生命周期解耦。
/// 任务的取消令牌是根令牌的子令牌，停机时统一触发；
/// 同一站点的任务通过站点信号量串行执行。
pub struct ScanSupervisor {
    runner: Arc<ScanRunner>,
    scan_repo: Arc<dyn ScanRepository>,
    sites: SiteSemaphore,
    running: Arc<DashMap<Uuid, RunHandle>>,
    generation: AtomicU64,
    root: CancellationToken,
    tracker: TaskTracker,
}

impl ScanSupervisor {
    pub fn new(runner: Arc<ScanRunner>, scan_repo: Arc<dyn ScanRepository>) -> Self {
        Self {
            runner,
            scan_repo,
            sites: SiteSemaphore::default(),
            running: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            root: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// 本进程中已调度且尚未结束的任务数
    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// 接管上个进程遗留的任务
    ///
    /// Pending 任务从头执行，InProgress 任务从 `resume_index` 继续
    ///
    /// # 返回值
    ///
    /// 重新调度的任务数
    pub async fn reclaim_orphans(&self) -> Result<usize, RepositoryError> {
        let mut pending = self.scan_repo.list(Some(ScanStatus::Pending)).await?;
        let mut in_progress = self.scan_repo.list(Some(ScanStatus::InProgress)).await?;
        pending.reverse();
        in_progress.reverse();

        let count = pending.len() + in_progress.len();
        for scan in in_progress {
            info!(scan_id = %scan.id, resume_index = scan.resume_index, "Reclaiming orphaned scan");
            self.schedule(scan, RunMode::Reclaim);
        }
        for scan in pending {
            info!(scan_id = %scan.id, "Rescheduling pending scan");
            self.schedule(scan, RunMode::Fresh);
        }
        Ok(count)
    }

    /// 停机：触发所有任务的令牌，在宽限期内等待它们写入暂停状态
    pub async fn shutdown(&self, grace: Duration) {
        info!(
            "Stopping {} running scan(s) across {} site(s)...",
            self.running_count(),
            self.sites.active_sites()
        );
        self.root.cancel();
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(
                "{} scan(s) did not stop within {:?}; they will be reclaimed on next start",
                self.running_count(),
                grace
            );
        } else {
            info!("All scans stopped");
        }
    }
}

impl ScanScheduler for ScanSupervisor {
    fn schedule(&self, scan: ScanJob, mode: RunMode) {
        let scan_id = scan.id;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        self.running.insert(
            scan_id,
            RunHandle {
                generation,
                token: token.clone(),
            },
        );

        let runner = self.runner.clone();
        let sites = self.sites.clone();
        let running = self.running.clone();

        self.tracker.spawn(async move {
            let permit = tokio::select! {
                permit = sites.acquire(scan.site_id) => permit,
                _ = token.cancelled() => {
                    info!(scan_id = %scan_id, "Scan stopped before it started");
                    running.remove_if(&scan_id, |_, h| h.generation == generation);
                    return;
                }
            };

            match permit {
                Ok(_permit) => {
                    runner.run(scan, mode, token).await;
                }
                Err(e) => error!(scan_id = %scan_id, "Site semaphore closed: {}", e),
            }

            running.remove_if(&scan_id, |_, h| h.generation == generation);
        });
    }

    fn cancel(&self, scan_id: Uuid) -> bool {
        match self.running.get(&scan_id) {
            Some(handle) => {
                handle.token.cancel();
                true
            }
            None => false,
        }
    }
}

/// 等待进程关闭信号（Ctrl+C 或 SIGTERM）
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => error!("Unable to listen for SIGTERM: {}", err),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
