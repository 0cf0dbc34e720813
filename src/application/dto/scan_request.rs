// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::models::scan::ScanType;

/// 创建扫描请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateScanRequestDto {
    pub site_id: Uuid,
    #[serde(default)]
    pub scan_type: ScanType,
    /// 旧版单页模式，给定时不读取站点地图
    #[validate(url)]
    pub page_url: Option<String>,
}

/// 恢复或重新开始扫描请求
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_resume_request"))]
pub struct ResumeScanRequestDto {
    #[validate(range(min = 0))]
    pub resume_from_index: Option<i32>,
    #[serde(default)]
    pub restart: bool,
}

fn validate_resume_request(dto: &ResumeScanRequestDto) -> Result<(), ValidationError> {
    if dto.restart && dto.resume_from_index.is_some() {
        let mut err = ValidationError::new("restart_and_resume");
        err.message = Some("restart and resume_from_index are mutually exclusive".into());
        return Err(err);
    }
    Ok(())
}

/// 列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListScansQuery {
    pub status: Option<String>,
}
