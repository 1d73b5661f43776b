use std::collections::HashSet;

use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::entity::contributor::{ActiveModel, Column, Entity as Contributor, Model};

use super::errors::{Result, StoreError};
use super::{CHUNK_SIZE, Lookup};

/// A contributor staged for creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContributor {
    pub name: String,
    pub email: Option<String>,
}

impl NewContributor {
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            name: name.into(),
            email: normalize_email(email),
        }
    }

    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(self.name),
            email: Set(self.email),
        }
    }
}

/// Blank emails are stored as NULL.
fn normalize_email(email: Option<String>) -> Option<String> {
    email.filter(|e| !e.trim().is_empty())
}

fn on_name_conflict() -> OnConflict {
    OnConflict::column(Column::Name).do_nothing().to_owned()
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

/// Find a contributor by its unique name.
pub async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Lookup<Model>> {
    let found = Contributor::find()
        .filter(Column::Name.eq(name))
        .one(db)
        .await?;
    Ok(found.into())
}

/// Find every contributor whose name is in `names`. Order is unspecified.
pub async fn find_by_names<C: ConnectionTrait>(db: &C, names: &[String]) -> Result<Vec<Model>> {
    let mut found = Vec::with_capacity(names.len());
    for chunk in names.chunks(CHUNK_SIZE) {
        let rows = Contributor::find()
            .filter(Column::Name.is_in(chunk.iter().cloned()))
            .all(db)
            .await?;
        found.extend(rows);
    }
    Ok(found)
}

/// Find every contributor whose id is in `ids`. Order is unspecified.
pub async fn find_by_ids<C: ConnectionTrait>(db: &C, ids: &[Uuid]) -> Result<Vec<Model>> {
    let unique: Vec<Uuid> = ids
        .iter()
        .copied()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut found = Vec::with_capacity(unique.len());
    for chunk in unique.chunks(CHUNK_SIZE) {
        let rows = Contributor::find()
            .filter(Column::Id.is_in(chunk.iter().copied()))
            .all(db)
            .await?;
        found.extend(rows);
    }
    Ok(found)
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Insert a contributor and return the stored row.
///
/// If another writer created the same name first, the insert is skipped and
/// that row is returned instead.
///
/// # Errors
/// Returns `StoreError::InvalidInput` for a blank name.
pub async fn create<C: ConnectionTrait>(db: &C, contributor: NewContributor) -> Result<Model> {
    if contributor.name.trim().is_empty() {
        return Err(StoreError::blank("contributor name"));
    }

    let name = contributor.name.clone();
    Contributor::insert(contributor.into_active_model())
        .on_conflict(on_name_conflict())
        .exec_without_returning(db)
        .await?;

    find_by_name(db, &name)
        .await?
        .found()
        .ok_or_else(|| StoreError::contributor_not_found(&name))
}

/// Return the contributor named `name`, creating it without an email if absent.
pub async fn get_or_create<C: ConnectionTrait>(db: &C, name: &str) -> Result<Model> {
    match find_by_name(db, name).await? {
        Lookup::Found(existing) => Ok(existing),
        Lookup::NotFound => {
            tracing::debug!(name, "Creating contributor");
            create(db, NewContributor::new(name, None)).await
        }
    }
}

/// Bulk-insert contributors, skipping names that already exist.
///
/// Returns the number of rows actually inserted.
pub async fn insert_many_ignoring_conflicts<C: ConnectionTrait>(
    db: &C,
    contributors: Vec<NewContributor>,
) -> Result<u64> {
    if contributors.iter().any(|c| c.name.trim().is_empty()) {
        return Err(StoreError::blank("contributor name"));
    }

    let mut inserted = 0u64;
    let mut pending = contributors.into_iter().peekable();
    while pending.peek().is_some() {
        let chunk: Vec<ActiveModel> = pending
            .by_ref()
            .take(CHUNK_SIZE)
            .map(NewContributor::into_active_model)
            .collect();
        inserted += Contributor::insert_many(chunk)
            .on_conflict(on_name_conflict())
            .exec_without_returning(db)
            .await?;
    }
    Ok(inserted)
}

/// Set the email of contributor `id` if its stored email is blank.
///
/// A non-blank stored email is never replaced. Returns `true` when a row
/// was updated.
pub async fn backfill_email<C: ConnectionTrait>(db: &C, id: Uuid, email: &str) -> Result<bool> {
    if email.trim().is_empty() {
        return Ok(false);
    }

    let result = Contributor::update_many()
        .col_expr(Column::Email, Expr::value(email.to_string()))
        .filter(Column::Id.eq(id))
        .filter(
            Condition::any()
                .add(Column::Email.is_null())
                .add(Column::Email.eq("")),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_contributor_drops_blank_email() {
        assert_eq!(NewContributor::new("a", Some(String::new())).email, None);
        assert_eq!(NewContributor::new("a", Some("  ".to_string())).email, None);
        assert_eq!(
            NewContributor::new("a", Some("a@example.com".to_string())).email,
            Some("a@example.com".to_string())
        );
    }

    #[test]
    fn on_name_conflict_targets_name_column() {
        use sea_orm::{DatabaseBackend, QueryTrait};

        let sql = Contributor::insert(NewContributor::new("a", None).into_active_model())
            .on_conflict(on_name_conflict())
            .build(DatabaseBackend::Sqlite)
            .to_string();
        assert!(
            sql.contains(r#"ON CONFLICT ("name") DO NOTHING"#),
            "unexpected sql: {sql}"
        );
    }
}
