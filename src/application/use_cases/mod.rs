// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 扫描的准入、查询、恢复与取消
pub mod cancel_scan_use_case;
pub mod scan_use_case;

#[cfg(test)]
pub(crate) mod mocks;
