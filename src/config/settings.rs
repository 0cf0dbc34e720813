// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 生产环境下每个站点每小时的扫描上限
const PRODUCTION_SCANS_PER_HOUR: u32 = 10;
/// 非生产环境下每个站点每小时的扫描上限
const DEVELOPMENT_SCANS_PER_HOUR: u32 = 50;

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 运行环境 (development, production, ...)
    pub environment: String,
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    #[serde(default)]
    pub redis: RedisSettings,
    /// 速率限制配置
    pub rate_limiting: RateLimitingSettings,
    /// 扫描执行配置
    pub scan: ScanSettings,
    /// 进度日志配置
    pub progress: ProgressSettings,
    /// 审计服务配置
    pub engines: EngineSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
}

/// Redis配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL，仅在选择 redis 后端时需要
    pub url: Option<String>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 有状态组件的存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Redis,
}

/// 速率限制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingSettings {
    pub backend: Backend,
    /// 覆盖按环境决定的每小时上限
    pub scans_per_hour: Option<u32>,
    /// 滑动窗口长度（秒）
    pub window_secs: u64,
}

/// 扫描执行配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScanSettings {
    /// 单次执行的时间预算（秒）
    pub timeout_secs: u64,
    /// 站点地图截断的页面数
    pub max_pages: usize,
    /// 单页审计超时（秒）
    pub page_timeout_secs: u64,
    /// 启动时是否接管遗留任务
    pub reclaim_on_startup: bool,
}

/// 进度日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressSettings {
    pub backend: Backend,
    /// Redis 进度日志的过期时间（秒）
    pub ttl_secs: u64,
}

/// 审计服务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// axe-core 审计端点
    pub axe_url: String,
    /// Lighthouse 审计端点
    pub lighthouse_url: String,
    /// 瞬时错误重试次数
    pub max_retries: u32,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加代码默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `AUDITRS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        Self::builder(&env)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("AUDITRS").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅包含代码默认值的构建器
    pub fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://auditrs.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("rate_limiting.backend", "memory")?
            .set_default("rate_limiting.window_secs", 3600)?
            .set_default("scan.timeout_secs", 7200)?
            .set_default("scan.max_pages", 500)?
            .set_default("scan.page_timeout_secs", 120)?
            .set_default("scan.reclaim_on_startup", true)?
            .set_default("progress.backend", "memory")?
            .set_default("progress.ttl_secs", 86400)?
            .set_default("engines.axe_url", "http://127.0.0.1:4000/audit/axe")?
            .set_default("engines.lighthouse_url", "http://127.0.0.1:4000/audit/lighthouse")?
            .set_default("engines.max_retries", 2)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// 每个站点每个窗口允许启动的扫描数
    pub fn scan_limit_per_hour(&self) -> u32 {
        self.rate_limiting.scans_per_hour.unwrap_or(if self.is_production() {
            PRODUCTION_SCANS_PER_HOUR
        } else {
            DEVELOPMENT_SCANS_PER_HOUR
        })
    }

    pub fn rate_limit_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.rate_limiting.window_secs as i64)
    }

    pub fn scan_budget(&self) -> Duration {
        Duration::from_secs(self.scan.timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.scan.page_timeout_secs)
    }

    /// 任一组件选择了 redis 后端
    pub fn needs_redis(&self) -> bool {
        self.rate_limiting.backend == Backend::Redis || self.progress.backend == Backend::Redis
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
