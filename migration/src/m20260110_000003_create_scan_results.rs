// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use super::m20260110_000002_create_scans::Scans;

/// 创建页面审计结果表与违规记录表
///
/// 两张表都以 scan_id 级联删除
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PageAuditResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PageAuditResults::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PageAuditResults::ScanId).uuid().not_null())
                    .col(ColumnDef::new(PageAuditResults::PageUrl).string().not_null())
                    .col(ColumnDef::new(PageAuditResults::PageIndex).integer().not_null())
                    .col(ColumnDef::new(PageAuditResults::Engine).string().not_null())
                    .col(ColumnDef::new(PageAuditResults::Status).string().not_null())
                    .col(ColumnDef::new(PageAuditResults::Score).integer())
                    .col(
                        ColumnDef::new(PageAuditResults::ViolationCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PageAuditResults::Violations).json().not_null())
                    .col(ColumnDef::new(PageAuditResults::ErrorMessage).text())
                    .col(
                        ColumnDef::new(PageAuditResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_page_audit_results_scan_id")
                            .from(PageAuditResults::Table, PageAuditResults::ScanId)
                            .to(Scans::Table, Scans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_page_audit_results_scan")
                    .table(PageAuditResults::Table)
                    .col(PageAuditResults::ScanId)
                    .col(PageAuditResults::PageIndex)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Violations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Violations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Violations::ScanId).uuid().not_null())
                    .col(ColumnDef::new(Violations::Engine).string().not_null())
                    .col(ColumnDef::new(Violations::RuleId).string().not_null())
                    .col(ColumnDef::new(Violations::Name).string().not_null())
                    .col(ColumnDef::new(Violations::Impact).string().not_null())
                    .col(ColumnDef::new(Violations::PageUrl).string().not_null())
                    .col(
                        ColumnDef::new(Violations::ElementCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Violations::HelpUrl).string())
                    .col(
                        ColumnDef::new(Violations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_violations_scan_id")
                            .from(Violations::Table, Violations::ScanId)
                            .to(Scans::Table, Scans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_violations_scan_page")
                    .table(Violations::Table)
                    .col(Violations::ScanId)
                    .col(Violations::PageUrl)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Violations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PageAuditResults::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PageAuditResults {
    Table,
    Id,
    ScanId,
    PageUrl,
    PageIndex,
    Engine,
    Status,
    Score,
    ViolationCount,
    Violations,
    ErrorMessage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Violations {
    Table,
    Id,
    ScanId,
    Engine,
    RuleId,
    Name,
    Impact,
    PageUrl,
    ElementCount,
    HelpUrl,
    CreatedAt,
}
