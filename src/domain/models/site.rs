// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 被跟踪的站点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    /// 站点根地址
    pub url: String,
    /// 页面来源（站点地图），没有时无法进行多页扫描
    pub sitemap_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    pub fn new(name: impl Into<String>, url: impl Into<String>, sitemap_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            sitemap_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否配置了可解析的页面来源
    pub fn has_page_source(&self) -> bool {
        self.sitemap_url
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}
