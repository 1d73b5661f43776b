//! Contributor entity - a person who authors commits or owns repositories.
//!
//! Contributors are keyed by the author name the remote API reports, and
//! that name is unique across the whole store.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contributors")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Author name as reported by the remote API.
    #[sea_orm(unique)]
    pub name: String,

    /// Email, filled in the first time one is known and never overwritten.
    pub email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Repositories owned by this contributor.
    #[sea_orm(has_many = "super::repository::Entity")]
    Repositories,
    /// Commits authored by this contributor.
    #[sea_orm(has_many = "super::commit::Entity")]
    Commits,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repositories.def()
    }
}

impl Related<super::commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether a non-blank email is stored.
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}
