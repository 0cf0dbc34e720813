// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use super::m20260110_000001_create_sites::Sites;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Scans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Scans::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Scans::SiteId).uuid().not_null())
                    .col(ColumnDef::new(Scans::ScanType).string().not_null())
                    .col(ColumnDef::new(Scans::Status).string().not_null())
                    .col(ColumnDef::new(Scans::PageUrl).string())
                    .col(ColumnDef::new(Scans::PageUrls).json().not_null())
                    .col(ColumnDef::new(Scans::PagesTotal).integer().not_null().default(0))
                    .col(ColumnDef::new(Scans::PagesScanned).integer().not_null().default(0))
                    .col(ColumnDef::new(Scans::ResumeIndex).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Scans::TotalViolationsSum)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Scans::WorstPageUrl).string())
                    .col(ColumnDef::new(Scans::WorstPageViolationCount).integer())
                    .col(ColumnDef::new(Scans::AxeScore).integer())
                    .col(ColumnDef::new(Scans::LighthouseScore).integer())
                    .col(ColumnDef::new(Scans::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Scans::CompletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Scans::TimeoutAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Scans::ErrorMessage).text())
                    .col(
                        ColumnDef::new(Scans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Scans::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scans_site_id")
                            .from(Scans::Table, Scans::SiteId)
                            .to(Sites::Table, Sites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scans_site_status")
                    .table(Scans::Table)
                    .col(Scans::SiteId)
                    .col(Scans::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Scans::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Scans {
    Table,
    Id,
    SiteId,
    ScanType,
    Status,
    PageUrl,
    PageUrls,
    PagesTotal,
    PagesScanned,
    ResumeIndex,
    TotalViolationsSum,
    WorstPageUrl,
    WorstPageViolationCount,
    AxeScore,
    LighthouseScore,
    StartedAt,
    CompletedAt,
    TimeoutAt,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}
