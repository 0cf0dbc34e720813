// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口基于 SeaORM 的实现
pub mod page_result_repo_impl;
pub mod scan_repo_impl;
pub mod score_history_repo_impl;
pub mod site_repo_impl;
pub mod violation_repo_impl;
