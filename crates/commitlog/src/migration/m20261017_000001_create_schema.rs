//! Initial migration: contributors, repositories and commits.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_contributors(manager).await?;
        self.create_repositories(manager).await?;
        self.create_commits(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Commits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Repositories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contributors::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_contributors(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contributors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contributors::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contributors::Name).string().not_null())
                    .col(ColumnDef::new(Contributors::Email).string().null())
                    .to_owned(),
            )
            .await?;

        // Names are unique across the whole store
        manager
            .create_index(
                Index::create()
                    .name("idx_contributors_name")
                    .table(Contributors::Table)
                    .col(Contributors::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Repositories::Name).string().not_null())
                    .col(ColumnDef::new(Repositories::OwnerId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repositories_owner")
                            .from(Repositories::Table, Repositories::OwnerId)
                            .to(Contributors::Table, Contributors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (name, owner_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_name_owner")
                    .table(Repositories::Table)
                    .col(Repositories::Name)
                    .col(Repositories::OwnerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_commits(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Commits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Commits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Commits::RepositoryId).uuid().not_null())
                    .col(ColumnDef::new(Commits::Sha).string().not_null())
                    .col(ColumnDef::new(Commits::AuthorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Commits::CommittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Commits::Payload).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commits_repository")
                            .from(Commits::Table, Commits::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commits_author")
                            .from(Commits::Table, Commits::AuthorId)
                            .to(Contributors::Table, Contributors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Re-ingesting a commit must hit this constraint, not add a row
        manager
            .create_index(
                Index::create()
                    .name("idx_commits_repository_sha")
                    .table(Commits::Table)
                    .col(Commits::RepositoryId)
                    .col(Commits::Sha)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commits_committed_at")
                    .table(Commits::Table)
                    .col(Commits::CommittedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commits_author")
                    .table(Commits::Table)
                    .col(Commits::AuthorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "contributors")]
enum Contributors {
    Table,
    Id,
    Name,
    Email,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "repositories")]
enum Repositories {
    Table,
    Id,
    Name,
    OwnerId,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "commits")]
enum Commits {
    Table,
    Id,
    RepositoryId,
    Sha,
    AuthorId,
    CommittedAt,
    Payload,
}
