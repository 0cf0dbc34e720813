// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::page_result::{EngineKind, Violation};

/// 可单独查询的违规记录
///
/// 只在页面审计成功后创建，创建后不再修改。
/// `page_url` 是实际被扫描的页面，而非站点根地址。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub engine: EngineKind,
    pub rule_id: String,
    pub name: String,
    pub impact: String,
    pub page_url: String,
    pub element_count: i32,
    pub help_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ViolationRecord {
    pub fn from_violation(
        scan_id: Uuid,
        engine: EngineKind,
        page_url: &str,
        violation: &Violation,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scan_id,
            engine,
            rule_id: violation.rule_id.clone(),
            name: violation.name.clone(),
            impact: violation.impact.clone(),
            page_url: page_url.to_string(),
            element_count: violation.element_count,
            help_url: violation.help_url.clone(),
            created_at: Utc::now(),
        }
    }
}
