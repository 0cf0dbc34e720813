// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 扫描任务（scan）：一次站点审计运行及其状态机
/// - 页面审计结果（page_result）：单个引擎对单个页面的结果
/// - 违规记录（violation）：可单独查询的规则违规
/// - 站点（site）：被跟踪的站点及其页面来源
/// - 分数历史（score_history）：完成时追加的趋势数据
pub mod page_result;
pub mod scan;
pub mod score_history;
pub mod site;
pub mod violation;
