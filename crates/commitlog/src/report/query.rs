//! Validation of the authors query.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::github::TimeBound;
use crate::sync::IngestRequest;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const BAD_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

/// Raw query parameters, as a boundary layer receives them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorsQuery {
    pub repository: Option<String>,
    pub owner: Option<String>,
    pub author: Option<String>,
    /// `YYYY-MM-DD`.
    pub since: Option<String>,
    /// `YYYY-MM-DD`.
    pub until: Option<String>,
}

/// Per-field validation messages, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`.
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A query that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    pub request: IngestRequest,
}

impl AuthorsQuery {
    /// Check required fields and date formats.
    ///
    /// # Errors
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Result<ValidatedQuery, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let repository = required(&mut errors, "repository", self.repository.as_deref());
        let owner = required(&mut errors, "owner", self.owner.as_deref());
        let author = optional_text(&mut errors, "author", self.author.as_deref());
        let since = optional_date(&mut errors, "since", self.since.as_deref());
        let until = optional_date(&mut errors, "until", self.until.as_deref());

        if !errors.is_empty() {
            return Err(errors);
        }
        let (Some(repository), Some(owner)) = (repository, owner) else {
            return Err(errors);
        };

        Ok(ValidatedQuery {
            request: IngestRequest {
                repository: crate::sync::RepositoryRef::new(owner, repository),
                author,
                since: since.map(TimeBound::Date),
                until: until.map(TimeBound::Date),
            },
        })
    }
}

fn required(errors: &mut ValidationErrors, field: &str, value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    Some(value.to_string())
}

fn optional_date(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
) -> Option<NaiveDate> {
    let value = value?.trim();
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, BAD_DATE);
            None
        }
    }
}
