// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 扫描任务仓库（scan_repository）：任务状态与进度，带条件写入
/// - 站点仓库（site_repository）：读取站点与页面来源
/// - 页面结果仓库（page_result_repository）：单页审计结果
/// - 违规仓库（violation_repository）：展开后的违规记录
/// - 分数历史仓库（score_history_repository）：完成时追加的趋势数据
pub mod page_result_repository;
pub mod scan_repository;
pub mod score_history_repository;
pub mod site_repository;
pub mod violation_repository;
