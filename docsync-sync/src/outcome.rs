//! Per-document outcomes and the ordered outcome log.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Store call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Fetch,
    Create,
    Update,
    Publish,
    Unpublish,
    Archive,
    Delete,
    /// The worker reconciling the entry died before reporting.
    Task,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Fetch => "fetch",
            Step::Create => "create",
            Step::Update => "update",
            Step::Publish => "publish",
            Step::Unpublish => "unpublish",
            Step::Archive => "archive",
            Step::Delete => "delete",
            Step::Task => "task",
        };
        f.write_str(name)
    }
}

/// How a missing document was reflected in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Removal {
    /// Only this locale's values were dropped from the entry.
    LocaleRemoved,
    Archived,
    Deleted,
}

/// Terminal state of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Created {
        version: u64,
        published: bool,
    },
    Updated {
        version: u64,
        updated_at: Option<DateTime<Utc>>,
        actor: Option<String>,
    },
    Unchanged,
    WouldCreate,
    WouldUpdate {
        diff: String,
    },
    NoAction {
        reason: String,
    },
    Removed {
        removal: Removal,
    },
    WouldRemove {
        removal: Removal,
    },
    Invalid {
        missing: Vec<&'static str>,
    },
    Failed {
        step: Step,
        detail: String,
    },
}

impl Outcome {
    pub fn no_action(reason: impl Into<String>) -> Self {
        Outcome::NoAction {
            reason: reason.into(),
        }
    }

    pub fn failed(step: Step, detail: impl fmt::Display) -> Self {
        Outcome::Failed {
            step,
            detail: detail.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Outcome::Invalid { .. })
    }

    /// Whether the document changed (or would change) the store.
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Outcome::Created { .. }
                | Outcome::Updated { .. }
                | Outcome::Removed { .. }
                | Outcome::WouldCreate
                | Outcome::WouldUpdate { .. }
                | Outcome::WouldRemove { .. }
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created { version, published } => {
                let state = if *published { "published" } else { "not published" };
                write!(f, "created entry (version {version}, {state})")
            }
            Outcome::Updated {
                version,
                updated_at,
                actor,
            } => {
                write!(f, "updated entry (version {version}")?;
                if let Some(at) = updated_at {
                    write!(f, ", at {}", at.to_rfc3339())?;
                }
                if let Some(actor) = actor {
                    write!(f, ", by {actor}")?;
                }
                write!(f, ")")
            }
            Outcome::Unchanged => write!(f, "unchanged, update skipped"),
            Outcome::WouldCreate => write!(f, "would create entry"),
            Outcome::WouldUpdate { .. } => write!(f, "would update entry"),
            Outcome::NoAction { reason } => write!(f, "no action taken: {reason}"),
            Outcome::Removed { removal } => match removal {
                Removal::LocaleRemoved => write!(f, "removed locale from entry"),
                Removal::Archived => write!(f, "archived entry"),
                Removal::Deleted => write!(f, "deleted entry"),
            },
            Outcome::WouldRemove { removal } => match removal {
                Removal::LocaleRemoved => write!(f, "would remove locale from entry"),
                Removal::Archived => write!(f, "would archive entry"),
                Removal::Deleted => write!(f, "would delete entry"),
            },
            Outcome::Invalid { missing } => {
                write!(f, "missing required front matter: {}", missing.join(", "))
            }
            Outcome::Failed { step, detail } => write!(f, "{step} failed: {detail}"),
        }
    }
}

// ---------------------------------------------------------------------------
// OutcomeLog
// ---------------------------------------------------------------------------

/// `path → Outcome` for one run, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutcomeLog(BTreeMap<String, Outcome>);

/// Counts per outcome class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub changed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub failed: usize,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `outcome` for `path`, replacing any earlier one.
    pub fn insert(&mut self, path: impl Into<String>, outcome: Outcome) {
        self.0.insert(path.into(), outcome);
    }

    pub fn get(&self, path: &str) -> Option<&Outcome> {
        self.0.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.0.iter().map(|(path, outcome)| (path.as_str(), outcome))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any document failed or was invalid.
    pub fn has_errors(&self) -> bool {
        self.0
            .values()
            .any(|outcome| outcome.is_failure() || outcome.is_invalid())
    }

    /// `path → human-readable outcome`.
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(path, outcome)| (path.clone(), outcome.to_string()))
            .collect()
    }

    pub fn summary(&self) -> OutcomeSummary {
        let mut summary = OutcomeSummary::default();
        for outcome in self.0.values() {
            match outcome {
                Outcome::Failed { .. } => summary.failed += 1,
                Outcome::Invalid { .. } => summary.invalid += 1,
                Outcome::Unchanged => summary.unchanged += 1,
                Outcome::NoAction { .. } => summary.skipped += 1,
                _ => summary.changed += 1,
            }
        }
        summary
    }
}

impl Extend<(String, Outcome)> for OutcomeLog {
    fn extend<I: IntoIterator<Item = (String, Outcome)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<(String, Outcome)> for OutcomeLog {
    fn from_iter<I: IntoIterator<Item = (String, Outcome)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
