//! Batch outcome reporting.
//!
//! Every job row ends in exactly one terminal outcome. The summary
//! aggregates them for the operator and decides the process exit code;
//! it serializes to JSON for machine consumers.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Terminal outcome of one job row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RowOutcome {
    /// Raster written, and the overlay too.
    Processed,
    /// GCP table absent on disk; nothing ran.
    SkippedMissingGcp,
    /// Operator flagged the row; nothing ran.
    SkippedIgnored,
    /// Raster written; the row carries no overlay archive.
    SkippedNoOverlay,
    /// The row errored; the run continued without it.
    Failed(String),
}

impl RowOutcome {
    /// Whether the row errored.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short operator-facing label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::SkippedMissingGcp => "skipped (no GCP table)",
            Self::SkippedIgnored => "skipped (ignored)",
            Self::SkippedNoOverlay => "processed (no overlay)",
            Self::Failed(_) => "failed",
        }
    }
}

/// One line of the summary.
#[derive(Debug, Clone, Serialize)]
pub struct RowReport {
    /// Job row id.
    pub id: String,
    /// GCP table that drove the row.
    pub gcp_file: PathBuf,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

/// Aggregated outcomes of one batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    pub rows: Vec<RowReport>,
}

impl BatchSummary {
    /// Rows whose raster output was produced.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Processed | RowOutcome::SkippedNoOverlay))
    }

    /// Rows deliberately skipped before any work ran.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::SkippedMissingGcp | RowOutcome::SkippedIgnored))
    }

    /// Rows that errored.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(RowOutcome::is_failure)
    }

    /// Whether any row errored; drives the process exit code.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.rows.iter().any(|r| r.outcome.is_failure())
    }

    fn count(&self, matcher: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| matcher(&r.outcome)).count()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(
                f,
                "{:<20} {:<24} {}",
                row.id,
                row.outcome.label(),
                row.gcp_file.display()
            )?;
            if let RowOutcome::Failed(reason) = &row.outcome {
                writeln!(f, "{:<20} {reason}", "")?;
            }
        }
        write!(
            f,
            "{} rows: {} processed, {} skipped, {} failed",
            self.rows.len(),
            self.processed(),
            self.skipped(),
            self.failed()
        )
    }
}
