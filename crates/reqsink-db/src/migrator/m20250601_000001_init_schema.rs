//! Initial schema: captures and users

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create captures table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Capture::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Capture::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Capture::PublicId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(string_len(Capture::Method, 32).not_null())
                    .col(text(Capture::UrlPath).not_null())
                    .col(text(Capture::QueryParams).not_null().default(""))
                    .col(string_len(Capture::Domain, 255).not_null().default(""))
                    .col(text(Capture::Headers).not_null().default("{}"))
                    .col(text(Capture::Body).not_null().default(""))
                    .col(
                        timestamp_with_time_zone(Capture::MadeAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index on the permalink identifier
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_captures_public_id")
                    .table(Capture::Table)
                    .col(Capture::PublicId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on domain for the current-domain listing filter
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_captures_domain")
                    .table(Capture::Table)
                    .col(Capture::Domain)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_captures_made_at")
                    .table(Capture::Table)
                    .col(Capture::MadeAt)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Username, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len(User::Role, 32).not_null().default("user"))
                    .col(boolean(User::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(User::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_username")
                    .table(User::Table)
                    .col(User::Username)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Capture::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Capture {
    #[sea_orm(iden = "captures")]
    Table,
    Id,
    PublicId,
    Method,
    UrlPath,
    QueryParams,
    Domain,
    Headers,
    Body,
    MadeAt,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    PasswordHash,
    Role,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
