// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含与外部系统交互的技术实现：
/// - 缓存（cache）：Redis客户端
/// - 数据库（database）：连接池、迁移与实体映射
/// - 指标（metrics）：Prometheus 导出器
/// - 仓库实现（repositories）：领域仓库接口的 SeaORM 实现
/// - 服务实现（services）：限流与进度存储的内存/Redis 实现
pub mod cache;
pub mod database;
pub mod metrics;
pub mod repositories;
pub mod services;
