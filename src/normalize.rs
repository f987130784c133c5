//! Conversion of loosely typed, LLM-produced parameter values into typed,
//! backend-ready values.
//!
//! Every function here is total: it returns a value or a typed `EditError`.
//! Bounds that depend on live timeline state (track and clip counts) are
//! checked by the caller through [`checked_array_index`] once the count is
//! known.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EditError;
use crate::model::TrackKind;

/// Sentinel accepted wherever a time is optional.
pub const NO_TIME_SENTINEL: &str = "-1";

/// A value produced by lenient coercion, with the warning to surface when a
/// fallback was used.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced<T> {
    pub value: T,
    pub warning: Option<String>,
}

// ── Indices ─────────────────────────────────────────────────────

/// Translate a 1-based user index to the backend's 0-based addressing.
pub fn to_array_index(user_index: i64) -> i64 {
    user_index.saturating_sub(1)
}

/// Translate and bounds-check a 1-based index against `count` items.
/// Anything outside `[0, count)` is `OutOfRange`, never clamped.
pub fn checked_array_index(user_index: i64, count: usize, what: &str) -> Result<usize, EditError> {
    let array_index = to_array_index(user_index);
    usize::try_from(array_index)
        .ok()
        .filter(|i| *i < count)
        .ok_or_else(|| EditError::out_of_range(what, user_index, count))
}

/// Best-effort integer coercion of a track index. Numbers, integral floats and
/// numeric strings are accepted; anything else falls back to track 1 with a
/// warning rather than rejecting the command.
pub fn coerce_track_index(raw: &Value) -> Coerced<i64> {
    if let Some(n) = integer_of(raw) {
        return Coerced {
            value: n,
            warning: None,
        };
    }
    let warning = format!("Could not read track_index {raw} as a number, using track 1");
    tracing::warn!("{warning}");
    Coerced {
        value: 1,
        warning: Some(warning),
    }
}

/// Integer view of a JSON value: integers, integral floats, and trimmed
/// numeric strings.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integer_of(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

// ── Track kind ──────────────────────────────────────────────────

/// Parse `"video"` / `"audio"` (case-insensitive). Missing or anything else is
/// `InvalidTrackKind`.
pub fn parse_track_kind(raw: Option<&Value>) -> Result<TrackKind, EditError> {
    let text = match raw {
        Some(Value::String(s)) => s.trim().to_lowercase(),
        Some(Value::Null) | None => {
            return Err(EditError::InvalidTrackKind {
                value: "(missing)".to_string(),
            })
        }
        Some(other) => {
            return Err(EditError::InvalidTrackKind {
                value: other.to_string(),
            })
        }
    };
    crate::util::from_serde_str::<TrackKind>(&text).ok_or(EditError::InvalidTrackKind { value: text })
}

// ── Times ───────────────────────────────────────────────────────

/// Parse `"HH:MM:SS"` (padding optional) into seconds, or the sentinel `"-1"`
/// into `None`. Minutes and seconds must be below 60.
pub fn parse_time_or_sentinel(s: &str) -> Result<Option<f64>, EditError> {
    let trimmed = s.trim();
    if trimmed == NO_TIME_SENTINEL {
        return Ok(None);
    }
    let malformed = || EditError::MalformedTime {
        value: s.to_string(),
    };
    let parts: Vec<&str> = trimmed.split(':').collect();
    let [h, m, sec] = parts.as_slice() else {
        return Err(malformed());
    };
    let field = |p: &str| -> Option<u32> {
        if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        p.parse().ok()
    };
    let (Some(h), Some(m), Some(sec)) = (field(h), field(m), field(sec)) else {
        return Err(malformed());
    };
    if m >= 60 || sec >= 60 {
        return Err(malformed());
    }
    Ok(Some(f64::from(h) * 3600.0 + f64::from(m) * 60.0 + f64::from(sec)))
}

/// Time parameter as it arrives in JSON: a time string, the sentinel, or a
/// bare number of seconds (`-1` again meaning "no value").
#[allow(clippy::float_cmp)]
pub fn time_value(raw: &Value) -> Result<Option<f64>, EditError> {
    match raw {
        Value::String(s) => parse_time_or_sentinel(s),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == -1.0 => Ok(None),
            Some(f) if f.is_finite() && f >= 0.0 => Ok(Some(f)),
            _ => Err(EditError::MalformedTime {
                value: n.to_string(),
            }),
        },
        Value::Null => Ok(None),
        other => Err(EditError::MalformedTime {
            value: other.to_string(),
        }),
    }
}

/// How many razor cuts a `cut` command performs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutPlan {
    /// One cut at the given offset.
    Single(f64),
    /// Two cuts, first at `start`, then at `end`.
    Range { start: f64, end: f64 },
}

impl CutPlan {
    /// Offsets in the order the cuts are issued.
    pub fn offsets(&self) -> Vec<f64> {
        match *self {
            CutPlan::Single(at) => vec![at],
            CutPlan::Range { start, end } => vec![start, end],
        }
    }
}

/// Decide the cut policy from the resolved begin/end times. Both times are
/// cut in the order given, so a reversed pair still yields two cuts.
pub fn plan_cut(start: Option<f64>, end: Option<f64>) -> Result<CutPlan, EditError> {
    match (start, end) {
        (Some(at), None) => Ok(CutPlan::Single(at)),
        (Some(start), Some(end)) => Ok(CutPlan::Range { start, end }),
        (None, _) => Err(EditError::InvalidTimeRange {
            message: "a begin time is required".to_string(),
        }),
    }
}

/// Format seconds as `HH:MM:SS` for messages.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_seconds(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

// ── Fragment selectors ──────────────────────────────────────────

/// Which clips on a track a selection command targets. Indices are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentSelector {
    All,
    Single(i64),
    List(Vec<i64>),
}

/// A parsed selector plus the list entries that could not be read as indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFragments {
    pub selector: FragmentSelector,
    pub rejected: Vec<String>,
}

impl ParsedFragments {
    fn clean(selector: FragmentSelector) -> Self {
        Self {
            selector,
            rejected: Vec::new(),
        }
    }
}

/// Parse a fragment selector: `"all"`, a single index (number or numeric
/// string), a JSON list, or a bracketed string holding a JSON list.
pub fn parse_fragment_selector(raw: &Value) -> Result<ParsedFragments, EditError> {
    let malformed = || EditError::MalformedSelector {
        value: raw.to_string(),
    };
    match raw {
        Value::Null => Ok(ParsedFragments::clean(FragmentSelector::All)),
        Value::Number(_) => integer_of(raw)
            .map(|n| ParsedFragments::clean(FragmentSelector::Single(n)))
            .ok_or_else(malformed),
        Value::Array(items) => Ok(list_selector(items)),
        Value::String(s) => {
            let text = s.trim();
            if text.eq_ignore_ascii_case("all") {
                return Ok(ParsedFragments::clean(FragmentSelector::All));
            }
            if text.starts_with('[') && text.ends_with(']') {
                return match serde_json::from_str::<Value>(text) {
                    Ok(Value::Array(items)) => Ok(list_selector(&items)),
                    _ => Err(malformed()),
                };
            }
            integer_of(raw)
                .map(|n| ParsedFragments::clean(FragmentSelector::Single(n)))
                .ok_or_else(malformed)
        }
        Value::Bool(_) | Value::Object(_) => Err(malformed()),
    }
}

fn list_selector(items: &[Value]) -> ParsedFragments {
    let mut indices = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();
    for item in items {
        match integer_of(item) {
            Some(n) => indices.push(n),
            None => rejected.push(format!("Skipped fragment entry {item}: not an index")),
        }
    }
    ParsedFragments {
        selector: FragmentSelector::List(indices),
        rejected,
    }
}

/// Clips a selector resolves to on a track with `clip_count` clips.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionPlan {
    /// Zero-based clip indices, in request order, without duplicates.
    pub clips: Vec<usize>,
    /// Warnings for list entries that were skipped.
    pub skipped: Vec<String>,
}

impl SelectionPlan {
    /// The 1-based numbers of the planned clips, for messages.
    pub fn user_indices(&self) -> Vec<usize> {
        self.clips.iter().map(|c| c + 1).collect()
    }
}

/// Resolve a selector against the clip count. A single index out of range is
/// `OutOfRange`; list entries are validated one by one and skipped with a
/// warning, and an empty result is `NoValidFragments`.
pub fn plan_selection(
    selector: &FragmentSelector,
    clip_count: usize,
    track_label: &str,
) -> Result<SelectionPlan, EditError> {
    match selector {
        FragmentSelector::All => Ok(SelectionPlan {
            clips: (0..clip_count).collect(),
            skipped: Vec::new(),
        }),
        FragmentSelector::Single(n) => {
            let idx = checked_array_index(*n, clip_count, "fragment")?;
            Ok(SelectionPlan {
                clips: vec![idx],
                skipped: Vec::new(),
            })
        }
        FragmentSelector::List(entries) => {
            let mut plan = SelectionPlan::default();
            for &n in entries {
                match checked_array_index(n, clip_count, "fragment") {
                    Ok(idx) if !plan.clips.contains(&idx) => plan.clips.push(idx),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Skipping fragment {n} on {track_label}: {e}");
                        plan.skipped.push(format!("Skipped fragment {n}: {e}"));
                    }
                }
            }
            if plan.clips.is_empty() {
                return Err(EditError::NoValidFragments {
                    track: track_label.to_string(),
                });
            }
            Ok(plan)
        }
    }
}

// ── Playback ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackAction {
    Play,
    Pause,
}

pub fn parse_playback_action(raw: &str) -> Result<PlaybackAction, EditError> {
    crate::util::from_serde_str::<PlaybackAction>(&raw.trim().to_lowercase()).ok_or_else(|| {
        EditError::invalid_parameter("action", format!("\"{raw}\" is not 'play' or 'pause'"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_index_round_trip() {
        for count in 1..6usize {
            for user in 1..=i64::try_from(count).unwrap() {
                let idx = checked_array_index(user, count, "track").unwrap();
                assert_eq!(i64::try_from(idx).unwrap() + 1, user);
                assert_eq!(to_array_index(user) + 1, user);
            }
        }
    }

    #[test]
    fn out_of_range_never_clamps() {
        assert!(matches!(
            checked_array_index(0, 3, "track"),
            Err(EditError::OutOfRange { index: 0, available: 3, .. })
        ));
        assert!(matches!(
            checked_array_index(4, 3, "track"),
            Err(EditError::OutOfRange { index: 4, .. })
        ));
        assert!(checked_array_index(-7, 3, "track").is_err());
        assert!(checked_array_index(1, 0, "clip").is_err());
        assert!(checked_array_index(i64::MIN, 3, "track").is_err());
    }

    #[test]
    fn time_sentinel_and_clock() {
        assert_eq!(parse_time_or_sentinel("-1").unwrap(), None);
        assert_eq!(parse_time_or_sentinel("01:02:03").unwrap(), Some(3723.0));
        assert_eq!(parse_time_or_sentinel("0:0:10").unwrap(), Some(10.0));
        assert_eq!(parse_time_or_sentinel(" 00:00:10 ").unwrap(), Some(10.0));
    }

    #[test]
    fn malformed_times() {
        for bad in ["", "10", "1:2", "aa:bb:cc", "00:61:00", "00:00:60", "-1:00:00", "1:2:3:4"] {
            assert!(
                matches!(parse_time_or_sentinel(bad), Err(EditError::MalformedTime { .. })),
                "{bad} should be malformed"
            );
        }
    }

    #[test]
    fn time_value_accepts_numbers() {
        assert_eq!(time_value(&json!(12.5)).unwrap(), Some(12.5));
        assert_eq!(time_value(&json!(-1)).unwrap(), None);
        assert!(time_value(&json!(-3)).is_err());
        assert!(time_value(&json!(true)).is_err());
    }

    #[test]
    fn cut_policy() {
        assert_eq!(plan_cut(Some(10.0), None).unwrap(), CutPlan::Single(10.0));
        assert_eq!(
            plan_cut(Some(10.0), Some(20.0)).unwrap().offsets(),
            vec![10.0, 20.0]
        );
        assert_eq!(
            plan_cut(Some(20.0), Some(10.0)).unwrap().offsets(),
            vec![20.0, 10.0]
        );
        assert!(matches!(
            plan_cut(None, None),
            Err(EditError::InvalidTimeRange { .. })
        ));
        assert!(plan_cut(None, Some(5.0)).is_err());
    }

    #[test]
    fn selector_forms() {
        assert_eq!(
            parse_fragment_selector(&json!("all")).unwrap().selector,
            FragmentSelector::All
        );
        assert_eq!(
            parse_fragment_selector(&json!("ALL")).unwrap().selector,
            FragmentSelector::All
        );
        assert_eq!(
            parse_fragment_selector(&json!("[1,2,3]")).unwrap().selector,
            FragmentSelector::List(vec![1, 2, 3])
        );
        assert_eq!(
            parse_fragment_selector(&json!([2, "3"])).unwrap().selector,
            FragmentSelector::List(vec![2, 3])
        );
        assert_eq!(
            parse_fragment_selector(&json!(2)).unwrap().selector,
            FragmentSelector::Single(2)
        );
        assert_eq!(
            parse_fragment_selector(&json!("2")).unwrap().selector,
            FragmentSelector::Single(2)
        );
    }

    #[test]
    fn malformed_selectors() {
        for bad in [json!("abc"), json!("[1,2"), json!("[1,]"), json!({"a": 1}), json!(true), json!("{}")] {
            assert!(
                matches!(parse_fragment_selector(&bad), Err(EditError::MalformedSelector { .. })),
                "{bad} should be malformed"
            );
        }
    }

    #[test]
    fn list_entries_that_are_not_indices_are_rejected_individually() {
        let parsed = parse_fragment_selector(&json!("[1, \"x\", 2.5, 3]")).unwrap();
        assert_eq!(parsed.selector, FragmentSelector::List(vec![1, 3]));
        assert_eq!(parsed.rejected.len(), 2);
    }

    #[test]
    fn selection_plan_skips_out_of_range_list_entries() {
        let plan = plan_selection(&FragmentSelector::List(vec![1, 9999]), 2, "video track 1").unwrap();
        assert_eq!(plan.clips, vec![0]);
        assert_eq!(plan.skipped.len(), 1);
        assert!(plan.skipped[0].contains("9999"));
    }

    #[test]
    fn selection_plan_errors() {
        assert!(matches!(
            plan_selection(&FragmentSelector::List(vec![0, 5]), 2, "audio track 1"),
            Err(EditError::NoValidFragments { .. })
        ));
        assert!(matches!(
            plan_selection(&FragmentSelector::Single(3), 2, "audio track 1"),
            Err(EditError::OutOfRange { .. })
        ));
        let all = plan_selection(&FragmentSelector::All, 3, "audio track 1").unwrap();
        assert_eq!(all.user_indices(), vec![1, 2, 3]);
        let dup = plan_selection(&FragmentSelector::List(vec![2, 2, 1]), 2, "t").unwrap();
        assert_eq!(dup.clips, vec![1, 0]);
    }

    #[test]
    fn track_index_coercion_falls_back_to_one() {
        assert_eq!(coerce_track_index(&json!(3)).value, 3);
        assert_eq!(coerce_track_index(&json!("2")).value, 2);
        assert_eq!(coerce_track_index(&json!(2.0)).value, 2);
        let fallback = coerce_track_index(&json!("second"));
        assert_eq!(fallback.value, 1);
        assert!(fallback.warning.is_some());
        assert_eq!(coerce_track_index(&json!(null)).value, 1);
    }

    #[test]
    fn track_kinds() {
        assert_eq!(parse_track_kind(Some(&json!("Video"))).unwrap(), TrackKind::Video);
        assert_eq!(parse_track_kind(Some(&json!("audio"))).unwrap(), TrackKind::Audio);
        assert!(matches!(
            parse_track_kind(Some(&json!("subtitle"))),
            Err(EditError::InvalidTrackKind { .. })
        ));
        assert!(parse_track_kind(None).is_err());
        assert!(parse_track_kind(Some(&json!(1))).is_err());
    }

    #[test]
    fn playback_actions() {
        assert_eq!(parse_playback_action("Play").unwrap(), PlaybackAction::Play);
        assert_eq!(parse_playback_action("pause").unwrap(), PlaybackAction::Pause);
        assert!(parse_playback_action("rewind").is_err());
    }

    #[test]
    fn seconds_format() {
        assert_eq!(format_seconds(3723.0), "01:02:03");
        assert_eq!(format_seconds(10.0), "00:00:10");
    }
}
