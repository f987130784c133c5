//! Per-command audit trail.
//!
//! Each executed command becomes one JSON line in
//! `{app_config_dir}/command-logs/YYYY-MM-DD.jsonl`, keyed by UTC day. The
//! line records which backend ran it, the normalized outcome and any typed
//! error code, so a session can be replayed or diffed later. Writing is
//! best-effort and never fails the command.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

use crate::dispatcher::{CommandOutcome, CommandRequest, CommandStatus};
use crate::model::BackendMode;

#[derive(Serialize)]
struct AuditEntry<'a> {
    at: String,
    source: &'a str,
    mode: BackendMode,
    command: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    parameters: &'a Value,
    status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    message: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    duration_ms: u64,
}

/// Appends command outcomes to the daily log files under one directory.
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(app_config_dir: &Path) -> Self {
        Self {
            dir: crate::paths::command_logs_dir(app_config_dir),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record one command. `source` names the entry point (`cli`, `api`, `prompt`).
    pub fn record(
        &self,
        source: &str,
        mode: BackendMode,
        request: &CommandRequest,
        outcome: &CommandOutcome,
        elapsed: Duration,
    ) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let entry = AuditEntry {
            at: UtcStamp::from_epoch(now).timestamp(),
            source,
            mode,
            command: &request.command,
            parameters: &request.parameters,
            status: outcome.status,
            code: outcome.error.as_ref().map(crate::error::EditError::code),
            message: &outcome.message,
            warnings: &outcome.warnings,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        };
        if let Err(e) = self.append(now, &entry) {
            tracing::debug!("Audit write to {} failed: {e}", self.dir.display());
        }
    }

    fn append(&self, epoch_secs: u64, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let line = serde_json::to_string(entry)?;
        let path = self
            .dir
            .join(format!("{}.jsonl", UtcStamp::from_epoch(epoch_secs).day()));
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")
    }
}

/// Calendar fields of a UTC instant, enough to name log files and stamp lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UtcStamp {
    year: i64,
    month: u64,
    day: u64,
    secs_of_day: u64,
}

impl UtcStamp {
    /// Civil date from day count (Howard Hinnant's algorithm).
    #[allow(clippy::unreadable_literal, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn from_epoch(epoch_secs: u64) -> Self {
        let days = (epoch_secs / 86400) as i64;
        let z = days + 719468;
        let era = (if z >= 0 { z } else { z - 146096 }) / 146097;
        let doe = (z - era * 146097) as u64;
        let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = (yoe as i64) + era * 400 + i64::from(month <= 2);
        Self {
            year,
            month,
            day: doy - (153 * mp + 2) / 5 + 1,
            secs_of_day: epoch_secs % 86400,
        }
    }

    fn day(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    fn timestamp(&self) -> String {
        let s = self.secs_of_day;
        format!("{}T{:02}:{:02}:{:02}Z", self.day(), s / 3600, (s % 3600) / 60, s % 60)
    }
}
