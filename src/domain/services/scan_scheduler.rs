// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use uuid::Uuid;

use crate::domain::models::scan::ScanJob;

/// 后台执行的起点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 新任务或重新开始：解析页面列表，从第 0 次访问执行
    Fresh,
    /// 显式恢复：任务已处于 InProgress，从 `resume_index` 继续
    Resume,
    /// 启动时接管上个进程遗留的 InProgress 任务
    Reclaim,
}

/// 将扫描任务交给后台执行，并能向执行中的任务发出取消信号
///
/// `schedule` 必须立即返回，执行与请求生命周期解耦
pub trait ScanScheduler: Send + Sync {
    fn schedule(&self, scan: ScanJob, mode: RunMode);

    /// 触发任务的取消令牌；任务不在本进程运行时返回 false
    fn cancel(&self, scan_id: Uuid) -> bool;
}
