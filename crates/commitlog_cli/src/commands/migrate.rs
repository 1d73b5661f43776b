use commitlog::db;
use commitlog::migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;

use crate::MigrateAction;

pub(crate) async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            let pending = pending_names(&db).await?;
            if pending.is_empty() {
                println!("Schema is up to date.");
                return Ok(());
            }
            Migrator::up(&db, None).await?;
            for name in &pending {
                println!("applied  {name}");
            }
        }
        MigrateAction::Down => {
            Migrator::down(&db, Some(1)).await?;
            println!("Rolled back the last migration.");
        }
        MigrateAction::Status => {
            let applied = Migrator::get_applied_migrations(&db).await?;
            let pending = pending_names(&db).await?;
            for migration in &applied {
                println!("applied  {}", migration.name());
            }
            for name in &pending {
                println!("pending  {name}");
            }
            tracing::debug!(
                applied = applied.len(),
                pending = pending.len(),
                "Migration status"
            );
        }
        MigrateAction::Fresh => {
            Migrator::fresh(&db).await?;
            println!("Dropped contributors, repositories and commits; schema recreated.");
        }
    }

    Ok(())
}

async fn pending_names(db: &DatabaseConnection) -> Result<Vec<String>, sea_orm::DbErr> {
    Ok(Migrator::get_pending_migrations(db)
        .await?
        .iter()
        .map(|m| m.name().to_string())
        .collect())
}
