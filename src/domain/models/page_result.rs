// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 审计引擎种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// axe-core
    Axe,
    /// Lighthouse 可访问性类别
    Lighthouse,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineKind::Axe => write!(f, "axe"),
            EngineKind::Lighthouse => write!(f, "lighthouse"),
        }
    }
}

impl FromStr for EngineKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "axe" => Ok(EngineKind::Axe),
            "lighthouse" => Ok(EngineKind::Lighthouse),
            _ => Err(()),
        }
    }
}

/// 单页审计状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PageStatus::Success => write!(f, "success"),
            PageStatus::Failed => write!(f, "failed"),
            PageStatus::Skipped => write!(f, "skipped"),
        }
    }
}

impl FromStr for PageStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(PageStatus::Success),
            "failed" => Ok(PageStatus::Failed),
            "skipped" => Ok(PageStatus::Skipped),
            _ => Err(()),
        }
    }
}

/// 引擎报告的一条规则违规
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// 规则ID，例如 `color-contrast`
    pub rule_id: String,
    /// 可读名称
    pub name: String,
    /// 严重程度 (critical, serious, moderate, minor)
    pub impact: String,
    /// 受影响的元素数量
    pub element_count: i32,
    /// 修复参考链接
    pub help_url: Option<String>,
}

/// 引擎对单个页面的审计输出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAudit {
    /// 页面得分 (0-100)，引擎无法给出时为空
    pub score: Option<i32>,
    /// 违规列表
    pub violations: Vec<Violation>,
}

/// 单个引擎对单个页面的审计结果
///
/// 归属于产生它的扫描任务，任务取消时整体删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAuditResult {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub page_url: String,
    /// 页面在本轮中的索引
    pub page_index: i32,
    pub engine: EngineKind,
    pub status: PageStatus,
    pub score: Option<i32>,
    pub violation_count: i32,
    pub violations: Vec<Violation>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PageAuditResult {
    fn base(scan_id: Uuid, engine: EngineKind, page_index: i32, page_url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            scan_id,
            page_url: page_url.to_string(),
            page_index,
            engine,
            status: PageStatus::Success,
            score: None,
            violation_count: 0,
            violations: Vec::new(),
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// 审计成功
    pub fn success(
        scan_id: Uuid,
        engine: EngineKind,
        page_index: i32,
        page_url: &str,
        audit: PageAudit,
    ) -> Self {
        Self {
            score: audit.score,
            violation_count: audit.violations.len() as i32,
            violations: audit.violations,
            ..Self::base(scan_id, engine, page_index, page_url)
        }
    }

    /// 审计失败，不计分但计入已扫描页数
    pub fn failed(
        scan_id: Uuid,
        engine: EngineKind,
        page_index: i32,
        page_url: &str,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: PageStatus::Failed,
            error_message: Some(error.into()),
            ..Self::base(scan_id, engine, page_index, page_url)
        }
    }

    /// 页面无法审计（例如非 http(s) URL）
    pub fn skipped(
        scan_id: Uuid,
        engine: EngineKind,
        page_index: i32,
        page_url: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: PageStatus::Skipped,
            error_message: Some(reason.into()),
            ..Self::base(scan_id, engine, page_index, page_url)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PageStatus::Success
    }
}
