use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use clap::ValueEnum;
use commitlog::db;
use commitlog::github::TimeBound;
use commitlog::report::{self, AuthorsOutcome, AuthorsQuery, AuthorsReport};
use commitlog::store::{self, CommitFilter, Lookup, StoreError};
use commitlog::sync::IngestRequest;
use sea_orm::DatabaseConnection;

use crate::FilterArgs;
use crate::commands::sync::github_client;
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Output format for the authors report.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// One table row per commit
    Table,
}

pub(crate) struct AuthorsArgs {
    pub owner: Option<String>,
    pub repository: Option<String>,
    pub filter: FilterArgs,
    pub offline: bool,
    pub output: OutputFormat,
}

impl AuthorsArgs {
    fn query(&self) -> AuthorsQuery {
        AuthorsQuery {
            repository: self.repository.clone(),
            owner: self.owner.clone(),
            author: self.filter.author.clone(),
            since: self.filter.since.clone(),
            until: self.filter.until.clone(),
        }
    }
}

/// A flattened report entry for table output.
#[derive(Debug, Clone, tabled::Tabled)]
struct ReportRow {
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "SHA")]
    sha: String,
}

fn report_rows(report: &AuthorsReport) -> Vec<ReportRow> {
    report
        .authors
        .iter()
        .flat_map(|group| {
            group.commits.iter().flat_map(move |(date, commits)| {
                commits.iter().map(move |c| ReportRow {
                    author: group.name.clone(),
                    email: group.email.clone().unwrap_or_default(),
                    date: date.format("%Y-%m-%d").to_string(),
                    sha: c.sha.chars().take(7).collect(),
                })
            })
        })
        .collect()
}

pub(crate) async fn handle_authors(
    args: AuthorsArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = args.query();
    let request = match query.validate() {
        Ok(validated) => validated.request,
        Err(errors) => {
            print_validation_errors(&errors)?;
            return Err(errors.into());
        }
    };
    let db = db::connect_and_migrate(database_url).await?;

    let outcome = if args.offline {
        offline_outcome(&db, &request).await?
    } else {
        let client = github_client(config)?;
        let reporter = Arc::new(ProgressReporter::new());
        let callback = reporter.as_callback();
        report::run_authors_query(&client, &db, &query, Some(&callback)).await?
    };

    match outcome {
        AuthorsOutcome::NoContent => {
            eprintln!("No commits matched.");
        }
        AuthorsOutcome::Report(report) => match args.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Table => {
                let mut table = tabled::Table::new(report_rows(&report));
                table.with(tabled::settings::Style::rounded());
                println!("{}", table);
            }
        },
    }

    Ok(())
}

/// Print per-field messages as a JSON object on stdout.
fn print_validation_errors(
    errors: &report::ValidationErrors,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(errors)?);
    Ok(())
}

/// Build the report from stored commits, honoring the same filters.
async fn offline_outcome(
    db: &DatabaseConnection,
    request: &IngestRequest,
) -> Result<AuthorsOutcome, StoreError> {
    let mut filter = CommitFilter::default();
    if let Some(author) = &request.author {
        match store::contributors::find_by_name(db, author).await? {
            Lookup::Found(contributor) => filter = filter.with_author(contributor.id),
            Lookup::NotFound => return Ok(AuthorsOutcome::NoContent),
        }
    }
    if let Some(since) = request.since.as_ref().and_then(bound_date) {
        filter = filter.with_since(midnight_utc(since));
    }
    if let Some(until) = request.until.as_ref().and_then(bound_date) {
        filter = filter.with_until(midnight_utc(until));
    }

    report::local_report(
        db,
        &request.repository.owner,
        &request.repository.name,
        &filter,
    )
    .await
}

fn bound_date(bound: &TimeBound) -> Option<NaiveDate> {
    match bound {
        TimeBound::Date(date) => Some(*date),
        TimeBound::DateTime(dt) => Some(dt.date_naive()),
        TimeBound::Formatted(_) => None,
    }
}

fn midnight_utc(date: NaiveDate) -> chrono::DateTime<chrono::FixedOffset> {
    date.and_time(NaiveTime::MIN).and_utc().fixed_offset()
}
