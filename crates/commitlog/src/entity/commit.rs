//! Commit entity - one immutable change, unique per `(repository_id, sha)`.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed-shape payload carried by every commit, stored as a JSON column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CommitPayload {
    /// Full commit message.
    pub message: String,
    /// Canonical API URL of the commit.
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commits")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Identity ────────────────────────────────────────────────────────────
    /// Repository the commit belongs to.
    pub repository_id: Uuid,
    /// Remote SHA. Unique together with `repository_id`.
    pub sha: String,

    // ─── Authorship ──────────────────────────────────────────────────────────
    /// Authoring contributor.
    pub author_id: Uuid,
    /// Author date, normalized to UTC.
    pub committed_at: DateTimeWithTimeZone,

    // ─── Content ─────────────────────────────────────────────────────────────
    #[sea_orm(column_type = "Json")]
    pub payload: CommitPayload,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id",
        on_delete = "Cascade"
    )]
    Repository,
    #[sea_orm(
        belongs_to = "super::contributor::Entity",
        from = "Column::AuthorId",
        to = "super::contributor::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl Related<super::contributor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Calendar date of the commit in UTC.
    pub fn date(&self) -> chrono::NaiveDate {
        self.committed_at.naive_utc().date()
    }
}
