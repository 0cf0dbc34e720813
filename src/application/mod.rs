// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 请求 DTO 与用例，位于表示层与领域层之间
pub mod dto;
pub mod use_cases;
