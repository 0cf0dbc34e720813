// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// 准入判定结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// 是否允许
    pub allowed: bool,
    /// 窗口内剩余令牌数
    pub remaining: u32,
    /// 窗口中最早的时间戳过期的时间
    pub reset_time: DateTime<Utc>,
}

/// 滑动窗口策略
///
/// 窗口为尾随的固定时长，窗口内每次扫描启动记录一个时间戳
#[derive(Debug, Clone, Copy)]
pub struct SlidingWindowPolicy {
    /// 窗口内允许的令牌数
    pub limit: u32,
    /// 窗口长度
    pub window: Duration,
}

impl SlidingWindowPolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    /// 窗口下界（不含）
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// 根据窗口内的时间戳给出判定
    ///
    /// `timestamps` 可以包含已过期的时间戳，这里会忽略它们而不修改输入
    pub fn decide(
        &self,
        timestamps: &[DateTime<Utc>],
        now: DateTime<Utc>,
        cost: u32,
    ) -> RateLimitDecision {
        let start = self.window_start(now);
        let live: Vec<&DateTime<Utc>> = timestamps.iter().filter(|t| **t > start).collect();
        let used = live.len() as u32;

        let reset_time = live
            .iter()
            .min()
            .map(|oldest| **oldest + self.window)
            .unwrap_or(now + self.window);

        RateLimitDecision {
            allowed: used + cost <= self.limit,
            remaining: self.limit.saturating_sub(used),
            reset_time,
        }
    }
}

/// 限流错误类型
#[derive(Error, Debug)]
pub enum RateLimitingError {
    /// 后端存储错误
    #[error("Rate limit backend error: {0}")]
    Backend(String),
}

/// 扫描准入限流服务接口
///
/// 以站点为粒度的滑动窗口准入控制。`admit` 只读，可以反复预检；
/// 只有 `record` 会写入窗口。
#[async_trait]
pub trait RateLimitingService: Send + Sync {
    /// 检查站点是否还能消耗 `cost` 个令牌
    async fn admit(&self, site_id: Uuid, cost: u32) -> Result<RateLimitDecision, RateLimitingError>;

    /// 记录 `cost` 次扫描启动
    async fn record(&self, site_id: Uuid, cost: u32) -> Result<(), RateLimitingError>;
}
