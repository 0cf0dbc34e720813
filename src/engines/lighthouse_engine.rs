// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::models::page_result::{EngineKind, PageAudit, Violation};
use crate::domain::services::result_aggregator::lighthouse_score;
use crate::engines::runner_client::AuditRunnerClient;
use crate::engines::traits::{AuditEngine, EngineError};

static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\]\((https?://[^)\s]+)\)").expect("Failed to compile link regex"));

/// 审计服务可能直接返回 LHR，也可能包在 `lhr` 字段里
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LighthouseResponse {
    Wrapped { lhr: LighthouseReport },
    Bare(LighthouseReport),
}

#[derive(Debug, Deserialize)]
struct LighthouseReport {
    categories: Categories,
    #[serde(default)]
    audits: HashMap<String, LighthouseAudit>,
}

#[derive(Debug, Deserialize)]
struct Categories {
    accessibility: Category,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Category {
    score: Option<f64>,
    #[serde(default)]
    audit_refs: Vec<AuditRef>,
}

#[derive(Debug, Deserialize)]
struct AuditRef {
    id: String,
    #[serde(default)]
    weight: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LighthouseAudit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    score: Option<f64>,
    #[serde(default)]
    score_display_mode: Option<String>,
    #[serde(default)]
    details: Option<AuditDetails>,
}

#[derive(Debug, Deserialize)]
struct AuditDetails {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// 按审计项在类别中的权重映射严重程度
fn impact_for_weight(weight: f64) -> &'static str {
    if weight >= 10.0 {
        "critical"
    } else if weight >= 7.0 {
        "serious"
    } else if weight >= 3.0 {
        "moderate"
    } else {
        "minor"
    }
}

fn help_url(description: Option<&str>) -> Option<String> {
    description
        .and_then(|d| MARKDOWN_LINK.captures(d))
        .map(|c| c[1].to_string())
}

impl LighthouseReport {
    /// 可访问性类别中未通过的审计项
    fn violations(&self) -> Vec<Violation> {
        self.categories
            .accessibility
            .audit_refs
            .iter()
            .filter_map(|r| {
                let audit = self.audits.get(&r.id)?;
                // notApplicable / manual / informative 项没有得分
                if !matches!(audit.score_display_mode.as_deref(), None | Some("binary") | Some("numeric")) {
                    return None;
                }
                match audit.score {
                    Some(score) if score < 1.0 => Some(Violation {
                        rule_id: r.id.clone(),
                        name: audit.title.clone().unwrap_or_else(|| r.id.clone()),
                        impact: impact_for_weight(r.weight).to_string(),
                        element_count: audit
                            .details
                            .as_ref()
                            .map(|d| d.items.len() as i32)
                            .unwrap_or(0),
                        help_url: help_url(audit.description.as_deref()),
                    }),
                    _ => None,
                }
            })
            .collect()
    }
}

/// Lighthouse 可访问性类别审计引擎
pub struct LighthouseEngine {
    client: AuditRunnerClient,
}

impl LighthouseEngine {
    pub fn new(client: AuditRunnerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditEngine for LighthouseEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Lighthouse
    }

    async fn audit(&self, url: &str) -> Result<PageAudit, EngineError> {
        let report = match self.client.audit::<LighthouseResponse>(url).await? {
            LighthouseResponse::Wrapped { lhr } => lhr,
            LighthouseResponse::Bare(lhr) => lhr,
        };

        Ok(PageAudit {
            score: report.categories.accessibility.score.map(lighthouse_score),
            violations: report.violations(),
        })
    }
}

#[cfg(test)]
#[path = "lighthouse_engine_test.rs"]
mod tests;
