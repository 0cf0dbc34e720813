// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::page_result::{EngineKind, PageAudit};

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 审计服务返回非成功状态码
    #[error("Audit runner returned HTTP {0}")]
    Status(u16),
    /// 响应无法解析
    #[error("Invalid audit response: {0}")]
    InvalidResponse(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            EngineError::Status(code) => *code >= 500 || *code == 429,
            EngineError::Timeout => true,
            EngineError::InvalidResponse(_) => false,
        }
    }
}

/// 审计引擎特质
///
/// 单页审计算法本身由外部审计服务实现，这里只是窄接口：
/// 给定页面URL，返回得分与违规列表
#[async_trait]
pub trait AuditEngine: Send + Sync {
    /// 引擎种类
    fn kind(&self) -> EngineKind;

    /// 审计单个页面
    async fn audit(&self, url: &str) -> Result<PageAudit, EngineError>;
}
