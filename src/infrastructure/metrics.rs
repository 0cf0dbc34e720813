// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

/// 初始化 Prometheus 导出器并注册扫描相关指标
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!("scans_admitted_total", "Scans accepted by admission control");
    describe_counter!(
        "scans_rate_limited_total",
        "Scan requests rejected by the sliding-window rate limiter"
    );
    describe_counter!(
        "scans_finished_total",
        "Scan executions that stopped, labelled by resulting status"
    );
    describe_counter!(
        "page_audits_total",
        "Per-page engine audits, labelled by engine and status"
    );
    describe_gauge!("scans_running", "Scan executions currently in flight");

    info!("Metrics exporter listening on {}", addr);
}
