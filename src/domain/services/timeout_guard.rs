// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use tokio::time::Instant;

/// 扫描时间预算守卫
///
/// 只在页面边界与进度输出时检查，不会中断正在审计的页面。
/// 使用 tokio 时钟，测试中可以暂停并推进时间。
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    started: Instant,
    budget: Duration,
}

impl TimeoutGuard {
    /// 从现在开始计时
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// 已经过的时间
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// 是否已超出预算
    pub fn expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    /// 剩余时间
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}
