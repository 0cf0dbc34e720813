// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::models::page_result::{EngineKind, PageAudit, Violation};
use crate::domain::services::result_aggregator::axe_score;
use crate::engines::runner_client::AuditRunnerClient;
use crate::engines::traits::{AuditEngine, EngineError};

#[derive(Debug, Deserialize)]
struct AxeResults {
    #[serde(default)]
    violations: Vec<AxeViolation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AxeViolation {
    id: String,
    #[serde(default)]
    help: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    help_url: Option<String>,
    #[serde(default)]
    nodes: Vec<serde_json::Value>,
}

impl From<AxeViolation> for Violation {
    fn from(v: AxeViolation) -> Self {
        Violation {
            name: v.help.or(v.description).unwrap_or_else(|| v.id.clone()),
            rule_id: v.id,
            impact: v.impact.unwrap_or_else(|| "minor".to_string()),
            element_count: v.nodes.len() as i32,
            help_url: v.help_url,
        }
    }
}

/// axe-core 审计引擎
///
/// 审计服务返回原始 axe-core 结果，得分由违规数量计算
pub struct AxeEngine {
    client: AuditRunnerClient,
}

impl AxeEngine {
    pub fn new(client: AuditRunnerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditEngine for AxeEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Axe
    }

    async fn audit(&self, url: &str) -> Result<PageAudit, EngineError> {
        let results: AxeResults = self.client.audit(url).await?;
        let violations: Vec<Violation> = results.violations.into_iter().map(Into::into).collect();

        Ok(PageAudit {
            score: Some(axe_score(violations.len())),
            violations,
        })
    }
}

#[cfg(test)]
#[path = "axe_engine_test.rs"]
mod tests;
