// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use backoff::future::retry;
use backoff::ExponentialBackoff;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use crate::engines::traits::EngineError;

/// 审计服务（无头浏览器旁路服务）HTTP 客户端
///
/// 每次审计 POST `{"url": ...}` 到引擎端点，瞬时错误按指数退避重试
#[derive(Clone)]
pub struct AuditRunnerClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    page_timeout: Duration,
    initial_backoff: Duration,
}

impl AuditRunnerClient {
    /// 创建新的审计服务客户端
    ///
    /// # 参数
    ///
    /// * `endpoint` - 引擎端点URL
    /// * `max_retries` - 瞬时错误的最大重试次数
    /// * `page_timeout` - 单页审计的超时时间
    pub fn new(endpoint: impl Into<String>, max_retries: u32, page_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("auditrs/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            max_retries,
            page_timeout,
            initial_backoff: Duration::from_millis(500),
        }
    }

    /// 调整首次退避间隔
    pub fn with_initial_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 请求审计服务并解析 JSON 响应
    pub async fn audit<T: DeserializeOwned>(&self, url: &str) -> Result<T, EngineError> {
        let policy = ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempts = 0u32;
        retry(policy, || {
            attempts += 1;
            let attempt = attempts;
            async move {
                match self.send_once::<T>(url).await {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_retryable() && attempt <= self.max_retries => {
                        warn!(
                            endpoint = %self.endpoint,
                            url = %url,
                            attempt,
                            "Audit request failed, retrying: {}",
                            e
                        );
                        Err(backoff::Error::transient(e))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        })
        .await
    }

    async fn send_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, EngineError> {
        let request = self
            .client
            .post(&self.endpoint)
            .timeout(self.page_timeout)
            .json(&json!({ "url": url }));

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(EngineError::Timeout),
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))
    }
}
