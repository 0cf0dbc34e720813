// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::models::site::Site;

static LOC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").expect("Failed to compile loc regex"));
static CDATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^<!\[CDATA\[(.*)\]\]>$").expect("Failed to compile cdata regex"));

/// 站点地图解析错误
#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("Site has no sitemap configured")]
    NoSource,
    #[error("Failed to fetch sitemap {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Sitemap {0} contains no page URLs")]
    Empty(String),
}

/// 将站点展开为有序的页面URL列表
#[async_trait]
pub trait SitemapResolver: Send + Sync {
    async fn resolve(&self, site: &Site) -> Result<Vec<String>, SitemapError>;
}

/// 通过 HTTP 拉取 sitemap.xml 的解析器
///
/// 支持一层 `<sitemapindex>` 嵌套，按首次出现去重，并截断到 `max_pages`
pub struct HttpSitemapResolver {
    client: reqwest::Client,
    max_pages: usize,
}

impl HttpSitemapResolver {
    pub fn new(max_pages: usize, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(concat!("auditrs/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            max_pages,
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, SitemapError> {
        let fetch_err = |reason: String| SitemapError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_err(format!("HTTP {}", response.status().as_u16())));
        }

        response.text().await.map_err(|e| fetch_err(e.to_string()))
    }

    fn push_unique(&self, out: &mut Vec<String>, seen: &mut HashSet<String>, urls: Vec<String>) {
        for url in urls {
            if out.len() >= self.max_pages {
                break;
            }
            if seen.insert(url.clone()) {
                out.push(url);
            }
        }
    }
}

/// 提取 `<loc>` 内容，处理 CDATA 与常见 XML 实体
pub fn extract_locs(xml: &str) -> Vec<String> {
    LOC.captures_iter(xml)
        .map(|c| {
            let raw = c[1].trim();
            let raw = CDATA
                .captures(raw)
                .map(|cd| cd[1].trim().to_string())
                .unwrap_or_else(|| raw.to_string());
            unescape(&raw)
        })
        .filter(|u| !u.is_empty())
        .collect()
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn is_sitemap_index(xml: &str) -> bool {
    xml.contains("<sitemapindex")
}

#[async_trait]
impl SitemapResolver for HttpSitemapResolver {
    async fn resolve(&self, site: &Site) -> Result<Vec<String>, SitemapError> {
        let root = site
            .sitemap_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SitemapError::NoSource)?;

        let body = self.fetch(root).await?;
        let mut pages = Vec::new();
        let mut seen = HashSet::new();

        if is_sitemap_index(&body) {
            for child in extract_locs(&body) {
                if pages.len() >= self.max_pages {
                    break;
                }
                // 子站点地图拉取失败不影响其余部分
                match self.fetch(&child).await {
                    Ok(xml) if !is_sitemap_index(&xml) => {
                        self.push_unique(&mut pages, &mut seen, extract_locs(&xml))
                    }
                    Ok(_) => debug!(sitemap = %child, "Skipping nested sitemap index"),
                    Err(e) => warn!(sitemap = %child, "Child sitemap unavailable: {}", e),
                }
            }
        } else {
            self.push_unique(&mut pages, &mut seen, extract_locs(&body));
        }

        if pages.is_empty() {
            return Err(SitemapError::Empty(root.to_string()));
        }

        debug!(site_id = %site.id, pages = pages.len(), "Resolved sitemap");
        Ok(pages)
    }
}

#[cfg(test)]
#[path = "sitemap_test.rs"]
mod tests;
