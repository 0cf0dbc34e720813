// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::services::rate_limiting_service::{
    RateLimitDecision, RateLimitingError, RateLimitingService, SlidingWindowPolicy,
};
use crate::infrastructure::cache::redis_client::RedisClient;

/// 进程内滑动窗口限流
///
/// 单实例部署使用；每个站点保存窗口内的启动时间戳
pub struct InMemoryRateLimiter {
    policy: SlidingWindowPolicy,
    windows: DashMap<Uuid, Vec<DateTime<Utc>>>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: SlidingWindowPolicy) -> Self {
        Self {
            policy,
            windows: DashMap::new(),
        }
    }

    /// 以指定时刻做准入判定
    pub fn admit_at(&self, site_id: Uuid, cost: u32, now: DateTime<Utc>) -> RateLimitDecision {
        match self.windows.get(&site_id) {
            Some(stamps) => self.policy.decide(&stamps, now, cost),
            None => self.policy.decide(&[], now, cost),
        }
    }

    /// 以指定时刻记录启动，并顺带清理过期时间戳
    pub fn record_at(&self, site_id: Uuid, cost: u32, now: DateTime<Utc>) {
        let start = self.policy.window_start(now);
        let mut stamps = self.windows.entry(site_id).or_default();
        stamps.retain(|t| *t > start);
        stamps.extend(std::iter::repeat(now).take(cost as usize));
    }
}

#[async_trait]
impl RateLimitingService for InMemoryRateLimiter {
    async fn admit(&self, site_id: Uuid, cost: u32) -> Result<RateLimitDecision, RateLimitingError> {
        Ok(self.admit_at(site_id, cost, Utc::now()))
    }

    async fn record(&self, site_id: Uuid, cost: u32) -> Result<(), RateLimitingError> {
        self.record_at(site_id, cost, Utc::now());
        Ok(())
    }
}

/// 基于 Redis 有序集合的滑动窗口限流
///
/// 成员分数为启动时间（毫秒），多实例共享同一窗口
pub struct RedisRateLimiter {
    redis: Arc<RedisClient>,
    policy: SlidingWindowPolicy,
    key_prefix: String,
}

impl RedisRateLimiter {
    pub fn new(redis: Arc<RedisClient>, policy: SlidingWindowPolicy) -> Self {
        Self {
            redis,
            policy,
            key_prefix: "auditrs:ratelimit".to_string(),
        }
    }

    fn key(&self, site_id: Uuid) -> String {
        format!("{}:site:{}", self.key_prefix, site_id)
    }
}

fn backend(e: anyhow::Error) -> RateLimitingError {
    RateLimitingError::Backend(e.to_string())
}

#[async_trait]
impl RateLimitingService for RedisRateLimiter {
    async fn admit(&self, site_id: Uuid, cost: u32) -> Result<RateLimitDecision, RateLimitingError> {
        let now = Utc::now();
        let start = self.policy.window_start(now).timestamp_millis();
        let stamps: Vec<DateTime<Utc>> = self
            .redis
            .zscores_above(&self.key(site_id), start)
            .await
            .map_err(backend)?
            .into_iter()
            .filter_map(|ms| Utc.timestamp_millis_opt(ms).single())
            .collect();

        Ok(self.policy.decide(&stamps, now, cost))
    }

    async fn record(&self, site_id: Uuid, cost: u32) -> Result<(), RateLimitingError> {
        let now = Utc::now();
        let score = now.timestamp_millis();
        let members: Vec<(String, i64)> = (0..cost)
            .map(|_| (format!("{}:{}", score, Uuid::new_v4()), score))
            .collect();

        self.redis
            .zadd_window(
                &self.key(site_id),
                &members,
                self.policy.window_start(now).timestamp_millis(),
                self.policy.window.num_seconds().max(1),
            )
            .await
            .map_err(backend)
    }
}
