// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 定义数据库表对应的实体结构
pub mod page_audit_result;
pub mod scan;
pub mod score_history;
pub mod site;
pub mod violation;
