// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::page_result::EngineKind;

/// 扫描任务实体
///
/// 表示对一个站点的一次可访问性审计运行。任务由准入请求以 `Pending`
/// 状态创建，之后只由后台执行任务与取消处理器修改；任务从不删除，
/// 只会被同一站点的新任务取代。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanJob {
    /// 扫描任务唯一标识符
    pub id: Uuid,
    /// 所属站点ID
    pub site_id: Uuid,
    /// 扫描类型，决定运行哪些审计引擎
    pub scan_type: ScanType,
    /// 扫描状态
    pub status: ScanStatus,
    /// 单页模式下的目标URL，为空时按站点地图扫描
    pub page_url: Option<String>,
    /// 已解析的页面列表，恢复执行时按同一顺序访问
    #[serde(default, skip_serializing)]
    pub page_urls: Vec<String>,
    /// 页面访问总数（页面数 × 引擎数）
    pub pages_total: i32,
    /// 已完成的页面访问数
    pub pages_scanned: i32,
    /// 恢复执行的起始访问偏移
    pub resume_index: i32,
    /// 所有引擎的违规总数
    pub total_violations_sum: i32,
    /// 违规最多的页面
    pub worst_page_url: Option<String>,
    /// 违规最多页面的违规数
    pub worst_page_violation_count: Option<i32>,
    /// Axe 平均分 (0-100)
    pub axe_score: Option<i32>,
    /// Lighthouse 平均分 (0-100)
    pub lighthouse_score: Option<i32>,
    /// 开始执行时间
    pub started_at: Option<DateTime<Utc>>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 超时截止时间
    pub timeout_at: Option<DateTime<Utc>>,
    /// 失败或暂停原因
    pub error_message: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 扫描类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    /// 仅运行 Axe
    Axe,
    /// 仅运行 Lighthouse
    Lighthouse,
    /// 两个引擎各完整跑一遍
    #[default]
    Both,
}

impl ScanType {
    /// 按执行顺序返回需要运行的引擎
    pub fn engines(&self) -> &'static [EngineKind] {
        match self {
            ScanType::Axe => &[EngineKind::Axe],
            ScanType::Lighthouse => &[EngineKind::Lighthouse],
            ScanType::Both => &[EngineKind::Axe, EngineKind::Lighthouse],
        }
    }

    /// 准入时消耗的限流令牌数，每个引擎一个
    pub fn admission_cost(&self) -> u32 {
        self.engines().len() as u32
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanType::Axe => write!(f, "axe"),
            ScanType::Lighthouse => write!(f, "lighthouse"),
            ScanType::Both => write!(f, "both"),
        }
    }
}

impl FromStr for ScanType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "axe" => Ok(ScanType::Axe),
            "lighthouse" => Ok(ScanType::Lighthouse),
            "both" => Ok(ScanType::Both),
            _ => Err(()),
        }
    }
}

/// 扫描状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → InProgress → Completed/Failed/Cancelled/Paused
/// Paused → InProgress（显式恢复）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// 已创建，等待执行
    #[default]
    Pending,
    /// 执行中
    InProgress,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
    /// 已取消
    Cancelled,
    /// 超时或停机后暂停，可恢复
    Paused,
}

impl ScanStatus {
    /// 可被取消的状态
    pub const CANCELLABLE: [ScanStatus; 2] = [ScanStatus::Pending, ScanStatus::InProgress];

    /// 是否可以取消
    pub fn is_cancellable(&self) -> bool {
        Self::CANCELLABLE.contains(self)
    }

    /// 是否为终止状态（暂停也视为一次执行的终点）
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanStatus::Completed | ScanStatus::Failed | ScanStatus::Cancelled | ScanStatus::Paused
        )
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanStatus::Pending => write!(f, "pending"),
            ScanStatus::InProgress => write!(f, "in_progress"),
            ScanStatus::Completed => write!(f, "completed"),
            ScanStatus::Failed => write!(f, "failed"),
            ScanStatus::Cancelled => write!(f, "cancelled"),
            ScanStatus::Paused => write!(f, "paused"),
        }
    }
}

/// 从字符串解析扫描状态
///
/// `running` 是旧客户端使用的 `in_progress` 别名
impl FromStr for ScanStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "in_progress" | "running" => Ok(ScanStatus::InProgress),
            "completed" => Ok(ScanStatus::Completed),
            "failed" => Ok(ScanStatus::Failed),
            "cancelled" => Ok(ScanStatus::Cancelled),
            "paused" => Ok(ScanStatus::Paused),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} via {action}")]
    InvalidStateTransition {
        from: ScanStatus,
        action: &'static str,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 扫描完成时写入任务的汇总结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub axe_score: Option<i32>,
    pub lighthouse_score: Option<i32>,
    pub total_violations: i32,
    pub worst_page_url: Option<String>,
    pub worst_page_violation_count: Option<i32>,
}

impl ScanJob {
    /// 创建一个新的待执行扫描任务
    ///
    /// # 参数
    ///
    /// * `site_id` - 站点ID
    /// * `scan_type` - 扫描类型
    /// * `page_url` - 单页模式的目标URL
    pub fn new(site_id: Uuid, scan_type: ScanType, page_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            site_id,
            scan_type,
            status: ScanStatus::Pending,
            page_url,
            page_urls: Vec::new(),
            pages_total: 0,
            pages_scanned: 0,
            resume_index: 0,
            total_violations_sum: 0,
            worst_page_url: None,
            worst_page_violation_count: None,
            axe_score: None,
            lighthouse_score: None,
            started_at: None,
            completed_at: None,
            timeout_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 单页模式（不经过站点地图）
    pub fn is_single_page(&self) -> bool {
        self.page_url.is_some()
    }

    /// 每个引擎一轮的页面数
    pub fn pages_per_pass(&self) -> i32 {
        self.page_urls.len() as i32
    }

    /// 第 `pass` 个引擎轮次在全局访问序列中的起始偏移
    pub fn pass_offset(&self, pass: usize) -> i32 {
        pass as i32 * self.pages_per_pass()
    }

    fn invalid(&self, action: &'static str) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.status,
            action,
        }
    }

    /// 开始执行
    ///
    /// 将任务从 Pending 变更为 InProgress，记录页面列表与超时截止时间
    pub fn begin(mut self, page_urls: Vec<String>, budget: Duration) -> Result<Self, DomainError> {
        if self.status != ScanStatus::Pending {
            return Err(self.invalid("begin"));
        }
        if page_urls.is_empty() {
            return Err(DomainError::ValidationError(
                "page list cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        self.pages_total = page_urls.len() as i32 * self.scan_type.engines().len() as i32;
        self.page_urls = page_urls;
        self.pages_scanned = 0;
        self.resume_index = 0;
        self.status = ScanStatus::InProgress;
        self.started_at = Some(now);
        self.timeout_at = Some(now + budget);
        self.error_message = None;
        self.updated_at = now;
        Ok(self)
    }

    /// 从暂停状态恢复执行
    ///
    /// `from` 为访问偏移，不能超过 `pages_total`
    pub fn resume(mut self, from: i32, budget: Duration) -> Result<Self, DomainError> {
        if self.status != ScanStatus::Paused {
            return Err(self.invalid("resume"));
        }
        if from < 0 || from > self.pages_total {
            return Err(DomainError::ValidationError(format!(
                "resume_from_index {} is outside 0..={}",
                from, self.pages_total
            )));
        }

        let now = Utc::now();
        self.status = ScanStatus::InProgress;
        self.resume_index = from;
        self.pages_scanned = from;
        self.timeout_at = Some(now + budget);
        self.error_message = None;
        self.completed_at = None;
        self.updated_at = now;
        Ok(self)
    }

    /// 接管崩溃前遗留的执行中任务，重新计时
    pub fn reclaim(mut self, budget: Duration) -> Result<Self, DomainError> {
        if self.status != ScanStatus::InProgress {
            return Err(self.invalid("reclaim"));
        }
        let now = Utc::now();
        self.pages_scanned = self.resume_index;
        self.timeout_at = Some(now + budget);
        self.updated_at = now;
        Ok(self)
    }

    /// 清除全部进度，回到 Pending 以便从第 0 页重新执行
    pub fn restart(mut self) -> Result<Self, DomainError> {
        match self.status {
            ScanStatus::Paused | ScanStatus::Failed | ScanStatus::Completed => {
                self.status = ScanStatus::Pending;
                self.page_urls = Vec::new();
                self.pages_total = 0;
                self.pages_scanned = 0;
                self.resume_index = 0;
                self.apply_summary(ScanSummary::default());
                self.started_at = None;
                self.completed_at = None;
                self.timeout_at = None;
                self.error_message = None;
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(self.invalid("restart")),
        }
    }

    /// 记录一次页面访问完成
    pub fn record_page(&mut self) {
        self.resume_index += 1;
        self.pages_scanned = (self.pages_scanned + 1).min(self.pages_total);
        self.updated_at = Utc::now();
    }

    /// 暂停任务，保留 resume_index
    pub fn pause(mut self, reason: impl Into<String>) -> Result<Self, DomainError> {
        if self.status != ScanStatus::InProgress {
            return Err(self.invalid("pause"));
        }
        self.status = ScanStatus::Paused;
        self.error_message = Some(reason.into());
        self.updated_at = Utc::now();
        Ok(self)
    }

    /// 完成任务并写入汇总结果
    pub fn complete(mut self, summary: ScanSummary) -> Result<Self, DomainError> {
        if self.status != ScanStatus::InProgress {
            return Err(self.invalid("complete"));
        }
        let now = Utc::now();
        self.apply_summary(summary);
        self.status = ScanStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(self)
    }

    /// 标记任务失败
    pub fn fail(mut self, message: impl Into<String>) -> Result<Self, DomainError> {
        match self.status {
            ScanStatus::Pending | ScanStatus::InProgress => {
                let now = Utc::now();
                self.status = ScanStatus::Failed;
                self.error_message = Some(message.into());
                self.completed_at = Some(now);
                self.updated_at = now;
                Ok(self)
            }
            _ => Err(self.invalid("fail")),
        }
    }

    /// 取消任务
    pub fn cancel(mut self) -> Result<Self, DomainError> {
        if !self.status.is_cancellable() {
            return Err(self.invalid("cancel"));
        }
        let now = Utc::now();
        self.status = ScanStatus::Cancelled;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(self)
    }

    fn apply_summary(&mut self, summary: ScanSummary) {
        self.axe_score = summary.axe_score;
        self.lighthouse_score = summary.lighthouse_score;
        self.total_violations_sum = summary.total_violations;
        self.worst_page_url = summary.worst_page_url;
        self.worst_page_violation_count = summary.worst_page_violation_count;
    }
}

#[cfg(test)]
#[path = "scan_test.rs"]
mod tests;
