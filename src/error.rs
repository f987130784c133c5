use std::fmt;

use serde::Serialize;
use ts_rs::TS;

/// Structured error type for command execution. Every failure a command can
/// hit is one of these, so callers can match on `code` instead of parsing
/// message text.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "code", content = "detail")]
#[ts(export)]
pub enum EditError {
    NoActiveSequence,
    OutOfRange {
        what: String,
        index: i64,
        available: usize,
    },
    InvalidTrackKind {
        value: String,
    },
    MalformedTime {
        value: String,
    },
    MalformedSelector {
        value: String,
    },
    NoValidFragments {
        track: String,
    },
    InvalidTimeRange {
        message: String,
    },
    UnknownCommand {
        name: String,
    },
    BackendUnavailable {
        operation: String,
    },
    InvalidParameter {
        name: String,
        message: String,
    },
    Backend {
        message: String,
    },
    Io {
        message: String,
    },
}

impl EditError {
    pub fn out_of_range(what: impl Into<String>, index: i64, available: usize) -> Self {
        EditError::OutOfRange {
            what: what.into(),
            index,
            available,
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        EditError::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Stable snake_case identifier, used in audit lines and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            EditError::NoActiveSequence => "no_active_sequence",
            EditError::OutOfRange { .. } => "out_of_range",
            EditError::InvalidTrackKind { .. } => "invalid_track_kind",
            EditError::MalformedTime { .. } => "malformed_time",
            EditError::MalformedSelector { .. } => "malformed_selector",
            EditError::NoValidFragments { .. } => "no_valid_fragments",
            EditError::InvalidTimeRange { .. } => "invalid_time_range",
            EditError::UnknownCommand { .. } => "unknown_command",
            EditError::BackendUnavailable { .. } => "backend_unavailable",
            EditError::InvalidParameter { .. } => "invalid_parameter",
            EditError::Backend { .. } => "backend",
            EditError::Io { .. } => "io",
        }
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::NoActiveSequence => write!(f, "No active sequence"),
            EditError::OutOfRange {
                what,
                index,
                available,
            } => {
                if *available == 0 {
                    write!(f, "Invalid {what} index: {index}. None available")
                } else {
                    write!(f, "Invalid {what} index: {index}. Available: 1-{available}")
                }
            }
            EditError::InvalidTrackKind { value } => {
                write!(f, "Invalid track type: \"{value}\". Use 'video' or 'audio'")
            }
            EditError::MalformedTime { value } => {
                write!(f, "Malformed time \"{value}\". Expected HH:MM:SS or '-1'")
            }
            EditError::MalformedSelector { value } => {
                write!(f, "Malformed fragment selector: {value}")
            }
            EditError::NoValidFragments { track } => {
                write!(f, "No valid fragments to select on {track}")
            }
            EditError::InvalidTimeRange { message } => write!(f, "Invalid time range: {message}"),
            EditError::UnknownCommand { name } => write!(f, "unknown command: {name}"),
            EditError::BackendUnavailable { operation } => {
                write!(f, "{operation} requires a connected editor")
            }
            EditError::InvalidParameter { name, message } => {
                write!(f, "Invalid parameter '{name}': {message}")
            }
            EditError::Backend { message } => write!(f, "Editor error: {message}"),
            EditError::Io { message } => write!(f, "I/O error: {message}"),
        }
    }
}

impl std::error::Error for EditError {}

impl From<std::io::Error> for EditError {
    fn from(e: std::io::Error) -> Self {
        EditError::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for EditError {
    fn from(e: serde_json::Error) -> Self {
        EditError::Io {
            message: e.to_string(),
        }
    }
}

impl From<EditError> for String {
    fn from(e: EditError) -> String {
        e.to_string()
    }
}
