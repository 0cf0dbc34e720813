// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

type SemaphoreMap = Arc<DashMap<Uuid, Arc<Semaphore>>>;

/// 每站点信号量
///
/// 同一站点同一时刻只允许固定数量的持有者，后到的调用排队等待许可。
/// 扫描执行与扫描准入各持有一个实例。
#[derive(Clone, Debug)]
pub struct SiteSemaphore {
    semaphores: SemaphoreMap,
    permits_per_site: usize,
}

/// 站点许可
///
/// 释放时若该站点已没有持有者或等待者，就从表中移除对应的信号量
#[derive(Debug)]
pub struct SitePermit {
    permit: Option<OwnedSemaphorePermit>,
    site_id: Uuid,
    semaphores: SemaphoreMap,
}

impl Drop for SitePermit {
    fn drop(&mut self) {
        drop(self.permit.take());
        // only the map's own reference left: nobody holds or waits for this site
        self.semaphores
            .remove_if(&self.site_id, |_, sem| Arc::strong_count(sem) == 1);
    }
}

impl Default for SiteSemaphore {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SiteSemaphore {
    /// # 参数
    ///
    /// * `permits_per_site` - 每个站点允许同时持有的许可数
    pub fn new(permits_per_site: usize) -> Self {
        Self {
            semaphores: Arc::new(DashMap::new()),
            permits_per_site: permits_per_site.max(1),
        }
    }

    /// 等待站点的许可，许可随返回值释放
    pub async fn acquire(&self, site_id: Uuid) -> Result<SitePermit, AcquireError> {
        let permit = self.get_or_create(site_id).acquire_owned().await?;
        Ok(SitePermit {
            permit: Some(permit),
            site_id,
            semaphores: self.semaphores.clone(),
        })
    }

    /// 当前有持有者或等待者的站点数
    pub fn active_sites(&self) -> usize {
        self.semaphores.len()
    }

    fn get_or_create(&self, site_id: Uuid) -> Arc<Semaphore> {
        self.semaphores
            .entry(site_id)
            .or_insert_with(|| Arc::new(Semaphore::new(self.permits_per_site)))
            .clone()
    }
}
