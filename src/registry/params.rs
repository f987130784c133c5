//! Parameter structs for every command.
//!
//! Fields arrive from a language model and are not trusted to be well typed,
//! so each one is captured as raw JSON and converted by the accessors below
//! through [`crate::normalize`]. Missing fields take the documented defaults.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EditError;
use crate::model::TrackKind;
use crate::normalize::{
    self, Coerced, CutPlan, FragmentSelector, ParsedFragments, PlaybackAction,
};

const DEFAULT_BEGIN_TIME: &str = "00:00:00";
const DEFAULT_ACTION: &str = "play";

fn track_index_or_default(raw: Option<&Value>) -> Coerced<i64> {
    match raw {
        Some(v) => normalize::coerce_track_index(v),
        None => Coerced {
            value: 1,
            warning: None,
        },
    }
}

// ── Track state ─────────────────────────────────────────────────

/// Parameters for mute/unmute/hide/show.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrackParams {
    /// 1-based track number. Defaults to 1.
    #[serde(default)]
    #[schemars(with = "Option<i64>")]
    pub track_index: Option<Value>,
}

impl TrackParams {
    pub fn track_index(&self) -> Coerced<i64> {
        track_index_or_default(self.track_index.as_ref())
    }
}

// ── Selection ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SelectParams {
    /// "video" or "audio".
    #[serde(default)]
    #[schemars(with = "Option<TrackKind>")]
    pub track_type: Option<Value>,
    /// 1-based track number. Defaults to 1.
    #[serde(default)]
    #[schemars(with = "Option<i64>")]
    pub track_index: Option<Value>,
    /// "all", a 1-based clip number, or a list of them (also as a string like "[1,2]").
    /// Defaults to "all".
    #[serde(default)]
    #[schemars(with = "Option<Value>")]
    pub fragment_index: Option<Value>,
}

impl SelectParams {
    pub fn track_kind(&self) -> Result<TrackKind, EditError> {
        normalize::parse_track_kind(self.track_type.as_ref())
    }

    pub fn track_index(&self) -> Coerced<i64> {
        track_index_or_default(self.track_index.as_ref())
    }

    pub fn fragments(&self) -> Result<ParsedFragments, EditError> {
        match &self.fragment_index {
            Some(raw) => normalize::parse_fragment_selector(raw),
            None => Ok(ParsedFragments {
                selector: FragmentSelector::All,
                rejected: Vec::new(),
            }),
        }
    }
}

/// Parameters for deselect commands. Without `track_index` every track of the
/// kind is deselected. `fragment_index` is accepted for compatibility and not
/// used: deselection always clears whole tracks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DeselectParams {
    /// "video" or "audio".
    #[serde(default)]
    #[schemars(with = "Option<TrackKind>")]
    pub track_type: Option<Value>,
    /// 1-based track number. Omit to deselect every track of the kind.
    #[serde(default)]
    #[schemars(with = "Option<i64>")]
    pub track_index: Option<Value>,
    #[serde(default)]
    #[schemars(with = "Option<Value>")]
    pub fragment_index: Option<Value>,
}

impl DeselectParams {
    pub fn track_kind(&self) -> Result<TrackKind, EditError> {
        normalize::parse_track_kind(self.track_type.as_ref())
    }

    pub fn track_index(&self) -> Option<Coerced<i64>> {
        self.track_index.as_ref().map(normalize::coerce_track_index)
    }
}

// ── Edit ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CutParams {
    /// "video" or "audio". `media_type` is accepted as a synonym. Defaults to video.
    #[serde(default)]
    #[schemars(with = "Option<TrackKind>")]
    pub track_type: Option<Value>,
    #[serde(default)]
    #[schemars(with = "Option<TrackKind>")]
    pub media_type: Option<Value>,
    /// 1-based track number. Defaults to 1.
    #[serde(default)]
    #[schemars(with = "Option<i64>")]
    pub track_index: Option<Value>,
    /// "HH:MM:SS". Defaults to "00:00:00".
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub begin_time: Option<Value>,
    /// "HH:MM:SS", or "-1" to cut only at the begin time. Defaults to "-1".
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub end_time: Option<Value>,
}

impl CutParams {
    pub fn track_kind(&self) -> Result<TrackKind, EditError> {
        match self.track_type.as_ref().or(self.media_type.as_ref()) {
            None | Some(Value::Null) => Ok(TrackKind::Video),
            raw => normalize::parse_track_kind(raw),
        }
    }

    pub fn track_index(&self) -> Coerced<i64> {
        track_index_or_default(self.track_index.as_ref())
    }

    /// Resolve begin/end into a cut plan.
    pub fn plan(&self) -> Result<CutPlan, EditError> {
        let start = match &self.begin_time {
            Some(raw) => normalize::time_value(raw)?,
            None => normalize::parse_time_or_sentinel(DEFAULT_BEGIN_TIME)?,
        };
        let end = match &self.end_time {
            Some(raw) => normalize::time_value(raw)?,
            None => None,
        };
        normalize::plan_cut(start, end)
    }
}

// ── Playback ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PlaybackParams {
    /// "play" or "pause". Defaults to "play".
    #[serde(default)]
    #[schemars(with = "Option<PlaybackAction>")]
    pub action: Option<Value>,
}

impl PlaybackParams {
    pub fn action(&self) -> Result<PlaybackAction, EditError> {
        match &self.action {
            None | Some(Value::Null) => normalize::parse_playback_action(DEFAULT_ACTION),
            Some(Value::String(s)) => normalize::parse_playback_action(s),
            Some(other) => Err(EditError::invalid_parameter(
                "action",
                format!("{other} is not 'play' or 'pause'"),
            )),
        }
    }
}
