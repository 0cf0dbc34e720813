// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScoreHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScoreHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScoreHistory::SiteId).uuid().not_null())
                    .col(ColumnDef::new(ScoreHistory::ScanId).uuid().not_null())
                    .col(ColumnDef::new(ScoreHistory::AxeScore).integer())
                    .col(ColumnDef::new(ScoreHistory::LighthouseScore).integer())
                    .col(
                        ColumnDef::new(ScoreHistory::TotalViolations)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScoreHistory::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_score_history_site")
                    .table(ScoreHistory::Table)
                    .col(ScoreHistory::SiteId)
                    .col(ScoreHistory::RecordedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScoreHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScoreHistory {
    Table,
    Id,
    SiteId,
    ScanId,
    AxeScore,
    LighthouseScore,
    TotalViolations,
    RecordedAt,
}
