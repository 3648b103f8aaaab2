use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calendar::GameDate;

use super::checks::CheckKind;

/// Entries kept in full; later entries are only counted.
const DEFAULT_MAX_ENTRIES: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    /// Recoverable oddity, e.g. a climate profile that needed a fallback.
    Warning,
    /// A contract check failed.
    Violation,
    /// A job failed outright (error or panic).
    Exception,
}

impl Severity {
    pub fn name(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Violation => "violation",
            Severity::Exception => "exception",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckKind>,
    pub region_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<GameDate>,
    pub message: String,
}

/// Findings of a validation run with per-severity and per-check counters,
/// keyed by name so the log serializes as plain JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationLog {
    entries: Vec<LogEntry>,
    severity_counts: BTreeMap<String, usize>,
    check_counts: BTreeMap<String, usize>,
    max_entries: usize,
    dropped: usize,
}

impl Default for ValidationLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl ValidationLog {
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            severity_counts: BTreeMap::new(),
            check_counts: BTreeMap::new(),
            max_entries,
            dropped: 0,
        }
    }

    pub fn record(&mut self, entry: LogEntry) {
        match entry.severity {
            Severity::Info => debug!("{}: {}", entry.region_id, entry.message),
            Severity::Warning => warn!("{}: {}", entry.region_id, entry.message),
            Severity::Violation | Severity::Exception => warn!(
                "{} {} in region '{}' at {}: {}",
                entry.severity.name(),
                entry.check.map_or("job", CheckKind::name),
                entry.region_id,
                entry
                    .date
                    .map_or_else(|| "-".to_string(), |d| d.to_string()),
                entry.message
            ),
        }
        *self
            .severity_counts
            .entry(entry.severity.name().to_string())
            .or_default() += 1;
        if let Some(check) = entry.check {
            *self.check_counts.entry(check.name().to_string()).or_default() += 1;
        }
        if self.entries.len() < self.max_entries {
            self.entries.push(entry);
        } else {
            self.dropped += 1;
        }
    }

    pub fn violation(
        &mut self,
        check: CheckKind,
        region_id: &str,
        date: GameDate,
        message: impl Into<String>,
    ) {
        self.record(LogEntry {
            severity: Severity::Violation,
            check: Some(check),
            region_id: region_id.to_string(),
            date: Some(date),
            message: message.into(),
        });
    }

    pub fn exception(&mut self, region_id: &str, date: GameDate, message: impl Into<String>) {
        self.record(LogEntry {
            severity: Severity::Exception,
            check: None,
            region_id: region_id.to_string(),
            date: Some(date),
            message: message.into(),
        });
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.severity_counts.get(severity.name()).copied().unwrap_or(0)
    }

    pub fn check_count(&self, check: CheckKind) -> usize {
        self.check_counts.get(check.name()).copied().unwrap_or(0)
    }

    pub fn violations(&self) -> usize {
        self.count(Severity::Violation)
    }

    pub fn exceptions(&self) -> usize {
        self.count(Severity::Exception)
    }

    /// No violations and no exceptions.
    pub fn is_clean(&self) -> bool {
        self.violations() == 0 && self.exceptions() == 0
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries counted but not kept.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
