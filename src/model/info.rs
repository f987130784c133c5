use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::timeline::{Sequence, Track, TrackKind};

/// Which backend variant is serving commands. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BackendMode {
    Live,
    Emulated,
}

impl BackendMode {
    pub fn is_connected(self) -> bool {
        matches!(self, BackendMode::Live)
    }
}

/// One row of the read-only track snapshot. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct TrackInfo {
    pub index: usize,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_count: Option<usize>,
}

impl TrackInfo {
    pub fn from_track(position: usize, track: &Track) -> Self {
        let (is_visible, is_muted) = match track.kind {
            TrackKind::Video => (Some(track.visible), None),
            TrackKind::Audio => (None, Some(track.muted)),
        };
        Self {
            index: position + 1,
            name: track.name.clone(),
            is_visible,
            is_muted,
            clip_count: Some(track.clips.len()),
        }
    }
}

/// Snapshot returned by `tracks_info`.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct TracksInfo {
    pub mode: BackendMode,
    pub sequence_name: String,
    pub video_tracks: Vec<TrackInfo>,
    pub audio_tracks: Vec<TrackInfo>,
}

impl TracksInfo {
    pub fn from_sequence(mode: BackendMode, seq: &Sequence) -> Self {
        let rows = |kind| {
            seq.tracks(kind)
                .iter()
                .enumerate()
                .map(|(i, t)| TrackInfo::from_track(i, t))
                .collect()
        };
        Self {
            mode,
            sequence_name: seq.name.clone(),
            video_tracks: rows(TrackKind::Video),
            audio_tracks: rows(TrackKind::Audio),
        }
    }

    /// Short human-readable listing for CLI output.
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("Sequence \"{}\" ({:?})", self.sequence_name, self.mode)];
        for (label, rows) in [("Video", &self.video_tracks), ("Audio", &self.audio_tracks)] {
            for row in rows {
                let state = match (row.is_visible, row.is_muted) {
                    (Some(true), _) => "visible",
                    (Some(false), _) => "hidden",
                    (_, Some(true)) => "muted",
                    (_, Some(false)) => "audible",
                    _ => "unknown",
                };
                let clips = row
                    .clip_count
                    .map_or_else(String::new, |n| format!(", {n} clip(s)"));
                lines.push(format!("  {label} {}: \"{}\", {state}{clips}", row.index, row.name));
            }
        }
        lines.join("\n")
    }
}
