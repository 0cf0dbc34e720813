// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::services::progress_reporter::{ProgressError, ProgressStore};
use crate::infrastructure::cache::redis_client::RedisClient;

/// 进程内进度日志
#[derive(Default)]
pub struct InMemoryProgressStore {
    entries: DashMap<Uuid, Vec<String>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn append(&self, scan_id: Uuid, message: &str) -> Result<(), ProgressError> {
        self.entries
            .entry(scan_id)
            .or_default()
            .push(message.to_string());
        Ok(())
    }

    async fn fetch(&self, scan_id: Uuid) -> Result<Vec<String>, ProgressError> {
        Ok(self
            .entries
            .get(&scan_id)
            .map(|e| e.clone())
            .unwrap_or_default())
    }

    async fn clear(&self, scan_id: Uuid) -> Result<(), ProgressError> {
        self.entries.remove(&scan_id);
        Ok(())
    }
}

/// Redis 列表进度日志，带过期时间，进程重启后仍可轮询
pub struct RedisProgressStore {
    redis: Arc<RedisClient>,
    ttl_seconds: i64,
}

impl RedisProgressStore {
    pub fn new(redis: Arc<RedisClient>, ttl_seconds: i64) -> Self {
        Self { redis, ttl_seconds }
    }

    fn key(scan_id: Uuid) -> String {
        format!("auditrs:progress:{}", scan_id)
    }
}

fn backend(e: anyhow::Error) -> ProgressError {
    ProgressError::Backend(e.to_string())
}

#[async_trait]
impl ProgressStore for RedisProgressStore {
    async fn append(&self, scan_id: Uuid, message: &str) -> Result<(), ProgressError> {
        self.redis
            .rpush_with_ttl(&Self::key(scan_id), message, self.ttl_seconds)
            .await
            .map_err(backend)
    }

    async fn fetch(&self, scan_id: Uuid) -> Result<Vec<String>, ProgressError> {
        self.redis
            .lrange_all(&Self::key(scan_id))
            .await
            .map_err(backend)
    }

    async fn clear(&self, scan_id: Uuid) -> Result<(), ProgressError> {
        self.redis.del(&Self::key(scan_id)).await.map_err(backend)
    }
}
