// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::page_result::{EngineKind, PageAuditResult, PageStatus};
use crate::domain::models::scan::ScanSummary;

/// 每条 Axe 违规扣除的分数
const AXE_PENALTY_PER_VIOLATION: i64 = 5;

/// Axe 单页得分：`max(0, 100 - violations * 5)`
pub fn axe_score(violation_count: usize) -> i32 {
    (100 - violation_count as i64 * AXE_PENALTY_PER_VIOLATION).max(0) as i32
}

/// Lighthouse 单页得分：可访问性类别分数 (0-1) 缩放到 0-100 并四舍五入
pub fn lighthouse_score(category_score: f64) -> i32 {
    (category_score.clamp(0.0, 1.0) * 100.0).round() as i32
}

/// 违规最多的页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorstPage {
    pub url: String,
    pub violation_count: i32,
}

/// 单个引擎一轮的聚合
///
/// 出错的页面不贡献分数，但计入 `pages_scanned`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassAggregate {
    pub pages_scanned: i32,
    pub total_violations: i32,
    pub worst_page: Option<WorstPage>,
    scored_pages: i64,
    score_sum: i64,
}

impl PassAggregate {
    /// 按访问顺序加入一条页面结果
    pub fn push(&mut self, result: &PageAuditResult) {
        self.pages_scanned += 1;

        if let Some(score) = result.score {
            self.scored_pages += 1;
            self.score_sum += score as i64;
        }

        if result.status != PageStatus::Success {
            return;
        }

        self.total_violations += result.violation_count;

        // first-max-wins: only a strictly greater count replaces the current worst page
        let current_max = self
            .worst_page
            .as_ref()
            .map(|w| w.violation_count)
            .unwrap_or(0);
        if result.violation_count > current_max {
            self.worst_page = Some(WorstPage {
                url: result.page_url.clone(),
                violation_count: result.violation_count,
            });
        }
    }

    /// 有分数页面的平均分，四舍五入
    pub fn average_score(&self) -> Option<i32> {
        if self.scored_pages == 0 {
            return None;
        }
        Some((self.score_sum as f64 / self.scored_pages as f64).round() as i32)
    }
}

/// 结果聚合器
///
/// 把一个任务的全部页面结果归约为每个引擎的平均分，再合并成任务汇总
pub struct ResultAggregator;

impl ResultAggregator {
    /// 聚合单个引擎的结果，`results` 需按访问顺序排列
    pub fn aggregate_pass<'a>(results: impl IntoIterator<Item = &'a PageAuditResult>) -> PassAggregate {
        let mut pass = PassAggregate::default();
        for result in results {
            pass.push(result);
        }
        pass
    }

    /// 聚合整个任务
    ///
    /// 按引擎顺序（Axe 在前）分别聚合后合并，违规数相加，
    /// 最差页面在各轮之间同样保持先到先得
    pub fn summarize(results: &[PageAuditResult]) -> ScanSummary {
        let mut ordered: Vec<&PageAuditResult> = results.iter().collect();
        ordered.sort_by_key(|r| (r.engine, r.page_index));

        let axe = Self::aggregate_pass(ordered.iter().copied().filter(|r| r.engine == EngineKind::Axe));
        let lighthouse = Self::aggregate_pass(
            ordered
                .iter()
                .copied()
                .filter(|r| r.engine == EngineKind::Lighthouse),
        );

        let mut worst: Option<WorstPage> = None;
        for candidate in [&axe.worst_page, &lighthouse.worst_page].into_iter().flatten() {
            let current = worst.as_ref().map(|w| w.violation_count).unwrap_or(0);
            if candidate.violation_count > current {
                worst = Some(candidate.clone());
            }
        }

        ScanSummary {
            axe_score: axe.average_score(),
            lighthouse_score: lighthouse.average_score(),
            total_violations: axe.total_violations + lighthouse.total_violations,
            worst_page_url: worst.as_ref().map(|w| w.url.clone()),
            worst_page_violation_count: worst.map(|w| w.violation_count),
        }
    }
}

#[cfg(test)]
#[path = "result_aggregator_test.rs"]
mod tests;
