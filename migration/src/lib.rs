// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub use sea_orm_migration::prelude::*;

mod m20260110_000001_create_sites;
mod m20260110_000002_create_scans;
mod m20260110_000003_create_scan_results;
mod m20260110_000004_create_score_history;

/// 数据库迁移器
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    /// 获取所有迁移
    ///
    /// # 返回值
    ///
    /// 返回迁移列表
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000001_create_sites::Migration),
            Box::new(m20260110_000002_create_scans::Migration),
            Box::new(m20260110_000003_create_scan_results::Migration),
            Box::new(m20260110_000004_create_score_history::Migration),
        ]
    }
}
