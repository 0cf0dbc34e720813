// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 提供共享的 Redis 访问，供限流窗口与进度日志使用
pub mod redis_client;
