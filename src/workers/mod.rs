// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供扫描任务的后台执行与调度
/// 包括逐页审计执行、站点级串行化与停机时的暂停
#[cfg(test)]
pub(crate) mod fakes;
pub mod manager;
pub mod scan_worker;

pub use manager::ScanSupervisor;
pub use scan_worker::ScanRunner;
