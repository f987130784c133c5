//! Sequential command execution with per-command error isolation.
//!
//! A batch is a list of independent intents, not a transaction: each entry is
//! parsed, routed and executed in input order, and its failure is recorded as
//! that entry's outcome without touching the others.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::audit::AuditLog;
use crate::backend::TimelineBackend;
use crate::error::EditError;
use crate::model::{BackendMode, TracksInfo};
use crate::registry::{Command, CommandOutput};
use crate::selection::SelectionTracker;

/// One inbound `{command, parameters}` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default, alias = "params")]
    #[ts(type = "Record<string, unknown> | null")]
    pub parameters: Value,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, parameters: Value) -> Self {
        Self {
            command: command.into(),
            parameters,
        }
    }

    /// Read a raw batch entry. `None` when it is not an object with a string
    /// `command`; parameters may be under `parameters` or `params`.
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let obj = entry.as_object()?;
        let command = obj.get("command")?.as_str()?.to_string();
        let parameters = obj
            .get("parameters")
            .or_else(|| obj.get("params"))
            .cloned()
            .unwrap_or(Value::Null);
        Some(Self {
            command,
            parameters,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CommandStatus {
    Success,
    Error,
}

/// Result of one command in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct CommandOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EditError>,
}

impl CommandOutcome {
    pub fn success(output: CommandOutput) -> Self {
        Self {
            status: CommandStatus::Success,
            message: output.message,
            warnings: output.warnings,
            error: None,
        }
    }

    pub fn failure(error: EditError) -> Self {
        Self {
            status: CommandStatus::Error,
            message: error.to_string(),
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}

/// Outcomes for a whole batch, one per input entry, in input order. The batch
/// itself always succeeds; failures live in the individual results.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BatchResult {
    pub status: CommandStatus,
    pub results: Vec<CommandOutcome>,
}

impl BatchResult {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

/// Routes commands to the backend chosen at startup and keeps the selection
/// mirror in step.
pub struct CommandDispatcher {
    pub(crate) backend: Box<dyn TimelineBackend>,
    pub(crate) selection: SelectionTracker,
    audit: Option<AuditLog>,
}

impl CommandDispatcher {
    pub fn new(backend: Box<dyn TimelineBackend>) -> Self {
        Self {
            backend,
            selection: SelectionTracker::new(),
            audit: None,
        }
    }

    /// Append every executed command to the JSONL audit log under `dir`.
    #[must_use]
    pub fn with_audit_log(mut self, dir: PathBuf) -> Self {
        self.audit = Some(AuditLog::new(&dir));
        self
    }

    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn tracks_info(&mut self) -> Result<TracksInfo, EditError> {
        self.backend.tracks_info()
    }

    /// Run a parsed command. Commands flagged as needing the editor are refused
    /// up front when running emulated.
    pub fn run(&mut self, command: Command) -> Result<CommandOutput, EditError> {
        let info = command.info();
        if info.requires_live && !self.mode().is_connected() {
            return Err(EditError::BackendUnavailable {
                operation: info.name.to_string(),
            });
        }
        command.dispatch(self)
    }

    /// Parse, route and execute one request. Never fails: every error becomes
    /// an error outcome.
    pub fn execute(&mut self, request: &CommandRequest, source: &str) -> CommandOutcome {
        let started = Instant::now();
        let result = Command::from_parts(&request.command, &request.parameters)
            .and_then(|command| self.run(command));

        let outcome = match result {
            Ok(output) => {
                tracing::info!(command = %request.command, "{}", output.message);
                for warning in &output.warnings {
                    tracing::warn!(command = %request.command, "{warning}");
                }
                CommandOutcome::success(output)
            }
            Err(e) => {
                tracing::warn!(command = %request.command, code = e.code(), "{e}");
                CommandOutcome::failure(e)
            }
        };

        if let Some(log) = &self.audit {
            log.record(source, self.mode(), request, &outcome, started.elapsed());
        }
        outcome
    }

    /// Execute raw batch entries in order. The result has exactly one outcome
    /// per entry, including entries that are not valid commands at all.
    pub fn execute_batch(&mut self, entries: &[Value], source: &str) -> BatchResult {
        tracing::info!("Executing batch of {} command(s) from {source}", entries.len());
        let results: Vec<CommandOutcome> = entries
            .iter()
            .map(|entry| match CommandRequest::from_entry(entry) {
                Some(request) => self.execute(&request, source),
                None => {
                    tracing::warn!("Invalid command entry: {entry}");
                    CommandOutcome {
                        message: "invalid command entry".to_string(),
                        ..CommandOutcome::failure(EditError::invalid_parameter(
                            "command",
                            "expected an object with a string \"command\" field",
                        ))
                    }
                }
            })
            .collect();
        let batch = BatchResult {
            status: CommandStatus::Success,
            results,
        };
        if batch.failed() > 0 {
            tracing::info!("Batch finished with {} failure(s)", batch.failed());
        }
        batch
    }

    /// Typed-request variant of [`execute_batch`](Self::execute_batch).
    pub fn execute_requests(&mut self, requests: &[CommandRequest], source: &str) -> BatchResult {
        BatchResult {
            status: CommandStatus::Success,
            results: requests.iter().map(|r| self.execute(r, source)).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::backend::live::fake::{CallLog, FakeBridge};
    use crate::backend::{EmulatedBackend, LiveBackend};
    use crate::model::{ClipRef, TrackKind};
    use serde_json::json;

    fn emulated() -> CommandDispatcher {
        CommandDispatcher::new(Box::new(EmulatedBackend::new()))
    }

    fn live() -> CommandDispatcher {
        live_with_log().0
    }

    /// Live dispatcher plus a handle on the bridge's call journal.
    fn live_with_log() -> (CommandDispatcher, CallLog) {
        let bridge = FakeBridge::standard();
        let log = bridge.calls.clone();
        (CommandDispatcher::new(Box::new(LiveBackend::new(bridge))), log)
    }

    fn calls_starting_with(log: &CallLog, prefix: &str) -> Vec<String> {
        log.lock().iter().filter(|c| c.starts_with(prefix)).cloned().collect()
    }

    fn run(d: &mut CommandDispatcher, commands: Value) -> BatchResult {
        let entries = commands.as_array().cloned().unwrap();
        d.execute_batch(&entries, "test")
    }

    #[test]
    fn empty_batch_yields_empty_results() {
        let result = emulated().execute_batch(&[], "test");
        assert_eq!(result.status, CommandStatus::Success);
        assert!(result.results.is_empty());
    }

    #[test]
    fn unknown_command_does_not_disturb_neighbours() {
        let mut d = emulated();
        let result = run(
            &mut d,
            json!([
                { "command": "mute_audio", "parameters": { "track_index": 1 } },
                { "command": "bogus_cmd", "parameters": {} },
                { "command": "unmute_audio", "parameters": { "track_index": 1 } }
            ]),
        );
        assert_eq!(result.results.len(), 3);
        assert_eq!(result.results[0].status, CommandStatus::Success);
        assert_eq!(result.results[1].status, CommandStatus::Error);
        assert_eq!(result.results[1].message, "unknown command: bogus_cmd");
        assert_eq!(result.results[2].status, CommandStatus::Success);
    }

    #[test]
    fn results_match_input_length_for_any_input() {
        let mut d = emulated();
        let result = run(
            &mut d,
            json!([
                42,
                "mute_audio",
                { "parameters": {} },
                { "command": 7 },
                { "command": "cut", "parameters": "00:00:10" },
                { "command": "hide_video", "params": { "track_index": 2 } },
                null
            ]),
        );
        assert_eq!(result.results.len(), 7);
        assert_eq!(result.results[0].message, "invalid command entry");
        assert_eq!(result.results[2].message, "invalid command entry");
        assert!(matches!(
            result.results[4].error,
            Some(EditError::InvalidParameter { .. })
        ));
        assert!(result.results[5].is_success());
        assert_eq!(result.failed(), 6);
    }

    #[test]
    fn fragment_list_skips_out_of_range_entry() {
        let mut d = emulated();
        let result = run(
            &mut d,
            json!([{
                "command": "select_track_fragment",
                "parameters": { "track_type": "video", "track_index": 1, "fragment_index": "[1,9999]" }
            }]),
        );
        let outcome = &result.results[0];
        assert!(outcome.is_success(), "{}", outcome.message);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("9999"));
        assert_eq!(d.selection().len(), 1);
        assert!(d.selection().is_selected(&ClipRef {
            kind: TrackKind::Video,
            track: 0,
            clip: 0
        }));
    }

    #[test]
    fn cut_with_sentinel_end_is_one_split() {
        let mut d = live();
        let result = run(
            &mut d,
            json!([{
                "command": "cut",
                "parameters": { "track_type": "video", "track_index": 1, "begin_time": "00:00:10", "end_time": "-1" }
            }]),
        );
        assert!(result.results[0].is_success());
        assert_eq!(result.results[0].message, "Cut video track 1 at 00:00:10");
    }

    #[test]
    fn reversed_cut_times_still_make_two_splits() {
        let (mut d, log) = live_with_log();
        let result = run(
            &mut d,
            json!([{
                "command": "cut",
                "parameters": { "track_type": "video", "track_index": 1, "begin_time": "00:00:20", "end_time": "00:00:10" }
            }]),
        );
        assert!(result.results[0].is_success(), "{}", result.results[0].message);
        assert_eq!(
            result.results[0].message,
            "Cut video track 1 from 00:00:20 to 00:00:10"
        );
        assert_eq!(
            calls_starting_with(&log, "razor"),
            vec!["razor video 0 20", "razor video 0 10"]
        );
    }

    #[test]
    fn deselect_all_clears_tracked_clips_without_sweeping() {
        let (mut d, log) = live_with_log();
        run(
            &mut d,
            json!([
                { "command": "select_track_fragment", "parameters": { "track_type": "audio", "track_index": 2, "fragment_index": 1 } },
                { "command": "deselect_all_tracks" }
            ]),
        );
        assert_eq!(
            calls_starting_with(&log, "select"),
            vec!["select audio 1 0 true", "select audio 1 0 false"]
        );
        assert!(d.selection().is_empty());

        // Nothing tracked any more, so the next one sweeps all 4 tracks x 2 clips.
        let result = run(&mut d, json!([{ "command": "deselect_all_tracks" }]));
        assert!(result.results[0].is_success());
        assert_eq!(calls_starting_with(&log, "select").len(), 2 + 8);
    }

    #[test]
    fn stale_tracked_clip_falls_back_to_sweep() {
        let (mut d, log) = live_with_log();
        d.selection.mark_selected([ClipRef {
            kind: TrackKind::Video,
            track: 0,
            clip: 5,
        }]);
        let outcome = d.execute(&CommandRequest::new("deselect_all_tracks", Value::Null), "test");
        assert!(outcome.is_success(), "{}", outcome.message);
        assert_eq!(outcome.message, "Deselected all fragments on every track");
        assert_eq!(calls_starting_with(&log, "select").len(), 1 + 8);
        assert!(d.selection().is_empty());
    }

    #[test]
    fn mute_twice_stays_muted() {
        let mut d = emulated();
        let result = run(
            &mut d,
            json!([
                { "command": "mute_audio", "parameters": { "track_index": 2 } },
                { "command": "mute_audio", "parameters": { "track_index": 2 } }
            ]),
        );
        assert!(result.results.iter().all(CommandOutcome::is_success));
        let info = d.tracks_info().unwrap();
        assert_eq!(info.audio_tracks[1].is_muted, Some(true));
    }

    #[test]
    fn track_index_fallback_warns() {
        let mut d = emulated();
        let outcome = d.execute(
            &CommandRequest::new("hide_video", json!({ "track_index": "first" })),
            "test",
        );
        assert!(outcome.is_success());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(!d.tracks_info().unwrap().video_tracks[0].is_visible.unwrap());
    }

    #[test]
    fn playback_refused_when_emulated() {
        let mut d = emulated();
        let outcome = d.execute(&CommandRequest::new("play_pause", json!({ "action": "play" })), "test");
        assert_eq!(outcome.message, "play_pause requires a connected editor");
        assert!(matches!(outcome.error, Some(EditError::BackendUnavailable { .. })));

        let mut d = live();
        assert!(d
            .execute(&CommandRequest::new("play_pause", json!({})), "test")
            .is_success());
    }

    #[test]
    fn selection_composes_across_a_batch() {
        let mut d = emulated();
        let result = run(
            &mut d,
            json!([
                { "command": "select_track", "parameters": { "track_type": "audio", "track_index": 1 } },
                { "command": "select_track_fragment", "parameters": { "track_type": "video", "track_index": 2, "fragment_index": 2 } },
                { "command": "deselect_track_fragments", "parameters": { "track_type": "audio", "fragment_index": 1 } }
            ]),
        );
        assert!(result.results.iter().all(CommandOutcome::is_success));
        let remaining: Vec<&ClipRef> = d.selection().iter().collect();
        assert_eq!(
            remaining,
            vec![&ClipRef {
                kind: TrackKind::Video,
                track: 1,
                clip: 1
            }]
        );

        let result = run(&mut d, json!([{ "command": "deselect_all_tracks" }]));
        assert!(result.results[0].is_success());
        assert!(d.selection().is_empty());
    }

    #[test]
    fn cut_forgets_tracked_selection_on_that_track() {
        let mut d = emulated();
        run(
            &mut d,
            json!([
                { "command": "select_track", "parameters": { "track_type": "video", "track_index": 1 } },
                { "command": "select_track", "parameters": { "track_type": "video", "track_index": 2 } },
                { "command": "cut", "parameters": { "track_type": "video", "track_index": 1, "begin_time": "00:00:05" } }
            ]),
        );
        assert!(d.selection().iter().all(|c| c.track == 1));
        assert_eq!(d.selection().len(), 2);
    }

    #[test]
    fn errors_carry_typed_codes() {
        let mut d = emulated();
        let result = run(
            &mut d,
            json!([
                { "command": "hide_video", "parameters": { "track_index": 5 } },
                { "command": "select_track", "parameters": { "track_type": "subtitle" } },
                { "command": "cut", "parameters": { "begin_time": "1:2" } },
                { "command": "select_track", "parameters": { "track_type": "video", "fragment_index": "abc" } },
                { "command": "select_track", "parameters": { "track_type": "video", "fragment_index": [7, 8] } },
                { "command": "cut", "parameters": { "begin_time": "-1" } }
            ]),
        );
        let codes: Vec<&str> = result
            .results
            .iter()
            .map(|r| r.error.as_ref().map_or("none", EditError::code))
            .collect();
        assert_eq!(
            codes,
            vec![
                "out_of_range",
                "invalid_track_kind",
                "malformed_time",
                "malformed_selector",
                "no_valid_fragments",
                "invalid_time_range"
            ]
        );
    }

    #[test]
    fn no_active_sequence_is_reported_per_command() {
        let mut d = CommandDispatcher::new(Box::new(EmulatedBackend::without_sequence()));
        let result = run(
            &mut d,
            json!([
                { "command": "mute_audio" },
                { "command": "undo" }
            ]),
        );
        assert_eq!(result.results[0].message, "No active sequence");
        assert!(result.results[1].is_success());
    }

    #[test]
    fn outcome_serialization_is_compact() {
        let ok = CommandOutcome::success(CommandOutput::new("done"));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "status": "success", "message": "done" })
        );
        let err = CommandOutcome::failure(EditError::UnknownCommand { name: "x".into() });
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["error"]["code"], "UnknownCommand");
    }

    #[test]
    fn audit_log_records_each_command() {
        let dir = std::env::temp_dir().join("voxedit_test_dispatch_audit");
        let _ = std::fs::remove_dir_all(&dir);
        let mut d = emulated().with_audit_log(dir.clone());
        run(
            &mut d,
            json!([{ "command": "undo" }, { "command": "nope" }]),
        );
        let logs = crate::paths::command_logs_dir(&dir);
        let file = std::fs::read_dir(&logs).unwrap().next().unwrap().unwrap().path();
        let text = std::fs::read_to_string(file).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("\"source\":\"test\""));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
