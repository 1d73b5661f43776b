use std::collections::HashMap;
use std::sync::Arc;

use commitlog::db;
use commitlog::entity::commit;
use commitlog::github::GitHubClient;
use commitlog::report::AuthorsQuery;
use commitlog::store;
use commitlog::sync::ingest;
use console::Term;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::FilterArgs;
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Longest commit subject shown in the table.
const SUBJECT_WIDTH: usize = 60;

/// One stored commit, as shown after a sync.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct CommitRow {
    #[tabled(rename = "SHA")]
    pub sha: String,
    #[tabled(rename = "Author")]
    pub author: String,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Message")]
    pub message: String,
}

impl CommitRow {
    fn new(model: &commit::Model, author: &str) -> Self {
        Self {
            sha: model.sha.chars().take(7).collect(),
            author: author.to_string(),
            date: model.date().format("%Y-%m-%d").to_string(),
            message: subject(&model.payload.message),
        }
    }
}

/// First line of a commit message, truncated for display.
fn subject(message: &str) -> String {
    let line = message.lines().next().unwrap_or_default();
    if line.chars().count() <= SUBJECT_WIDTH {
        return line.to_string();
    }
    let mut short: String = line.chars().take(SUBJECT_WIDTH - 1).collect();
    short.push('…');
    short
}

/// Build a GitHub client from configuration.
pub(crate) fn github_client(config: &Config) -> Result<GitHubClient, Box<dyn std::error::Error>> {
    let token = config.github_token().ok_or(
        "No GitHub token configured. Set COMMITLOG_GITHUB_TOKEN or add [github] token to the config file.",
    )?;
    let client = GitHubClient::with_timeout(&token, &config.github.url, config.github_timeout())?;
    Ok(client)
}

pub(crate) async fn handle_sync(
    owner: String,
    repository: String,
    filter: FilterArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = AuthorsQuery {
        repository: Some(repository),
        owner: Some(owner),
        author: filter.author,
        since: filter.since,
        until: filter.until,
    };
    let request = query.validate()?.request;

    let client = github_client(config)?;
    let db = db::connect_and_migrate(database_url).await?;

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let commits = ingest(&client, &db, &request, Some(&callback)).await?;

    let rows = commit_rows(&db, &commits).await?;
    if Term::stdout().is_term() {
        if rows.is_empty() {
            println!("No commits matched.");
        } else {
            let mut table = tabled::Table::new(rows);
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
        }
    } else {
        tracing::info!(
            repo = %request.repository,
            commits = rows.len(),
            "Sync finished"
        );
    }

    Ok(())
}

/// Pair each commit with its author's name.
pub(crate) async fn commit_rows(
    db: &DatabaseConnection,
    commits: &[commit::Model],
) -> Result<Vec<CommitRow>, store::StoreError> {
    let ids: Vec<Uuid> = commits.iter().map(|c| c.author_id).collect();
    let names: HashMap<Uuid, String> = store::contributors::find_by_ids(db, &ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    Ok(commits
        .iter()
        .map(|c| CommitRow::new(c, names.get(&c.author_id).map_or("?", String::as_str)))
        .collect())
}
