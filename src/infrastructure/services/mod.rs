// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务实现
pub mod progress_store_impl;
pub mod rate_limiting_service_impl;
