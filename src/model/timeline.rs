use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A time range within a sequence, in seconds. Start must be < end.
/// Constructed via `TimeRange::new` which enforces this invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(try_from = "TimeRangeRaw")]
#[ts(export)]
pub struct TimeRange {
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
struct TimeRangeRaw {
    start: f64,
    end: f64,
}

impl TryFrom<TimeRangeRaw> for TimeRange {
    type Error = String;
    fn try_from(raw: TimeRangeRaw) -> Result<Self, String> {
        TimeRange::new(raw.start, raw.end)
            .ok_or_else(|| format!("Invalid TimeRange: start={}, end={}", raw.start, raw.end))
    }
}

impl TimeRange {
    /// Create a time range. Returns None if start >= end or either is negative.
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if start.is_finite() && end.is_finite() && start >= 0.0 && end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Split into `[start, t)` and `[t, end)`. None unless `t` lies strictly inside.
    pub fn split_at(&self, t: f64) -> Option<(TimeRange, TimeRange)> {
        if t <= self.start || t >= self.end {
            return None;
        }
        Some((
            TimeRange {
                start: self.start,
                end: t,
            },
            TimeRange { start: t, end: self.end },
        ))
    }
}

/// Video tracks carry visibility, audio tracks carry mute state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub fn all() -> [TrackKind; 2] {
        [TrackKind::Video, TrackKind::Audio]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
        }
    }

    /// Label used in messages: "video track", "audio track".
    pub fn track_label(self) -> String {
        format!("{} track", self.as_str())
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bounded unit of media on a track. Position in the track's clip list is
/// its identity; `selected` is only touched by select/deselect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    pub range: TimeRange,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub kind: TrackKind,
    pub name: String,
    /// Meaningful for video tracks.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Meaningful for audio tracks.
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

fn default_true() -> bool {
    true
}

impl Track {
    pub fn new(kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            visible: true,
            muted: false,
            clips: Vec::new(),
        }
    }

    /// Razor the clip under `t` into two adjacent clips. Returns false when no
    /// clip strictly contains `t` (a cut on a boundary or in a gap is a no-op).
    pub fn split_at(&mut self, t: f64) -> bool {
        let Some(pos) = self
            .clips
            .iter()
            .position(|c| c.range.split_at(t).is_some())
        else {
            return false;
        };
        let Some(clip) = self.clips.get_mut(pos) else {
            return false;
        };
        let Some((left, right)) = clip.range.split_at(t) else {
            return false;
        };
        clip.range = left;
        let tail = Clip {
            name: clip.name.clone(),
            range: right,
            selected: clip.selected,
        };
        self.clips.insert(pos + 1, tail);
        true
    }

    pub fn set_all_selected(&mut self, selected: bool) {
        for clip in &mut self.clips {
            clip.selected = selected;
        }
    }
}

/// The active timeline container. Tracks are never reordered, so a track's
/// 1-based index is stable for the life of the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub video_tracks: Vec<Track>,
    pub audio_tracks: Vec<Track>,
}

impl Sequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            video_tracks: Vec::new(),
            audio_tracks: Vec::new(),
        }
    }

    /// The layout reported by the emulated backend: two video and two audio
    /// tracks, each with two 30-second clips.
    pub fn illustrative() -> Self {
        let mut seq = Sequence::new("Emulated Sequence");
        for kind in TrackKind::all() {
            for n in 1..=2 {
                let prefix = match kind {
                    TrackKind::Video => "Video",
                    TrackKind::Audio => "Audio",
                };
                let mut track = Track::new(kind, format!("{prefix} {n}"));
                for (i, (start, end)) in [(0.0, 30.0), (30.0, 60.0)].into_iter().enumerate() {
                    if let Some(range) = TimeRange::new(start, end) {
                        track.clips.push(Clip {
                            name: format!("{prefix} {n} clip {}", i + 1),
                            range,
                            selected: false,
                        });
                    }
                }
                seq.tracks_mut(kind).push(track);
            }
        }
        seq
    }

    pub fn tracks(&self, kind: TrackKind) -> &[Track] {
        match kind {
            TrackKind::Video => &self.video_tracks,
            TrackKind::Audio => &self.audio_tracks,
        }
    }

    pub fn tracks_mut(&mut self, kind: TrackKind) -> &mut Vec<Track> {
        match kind {
            TrackKind::Video => &mut self.video_tracks,
            TrackKind::Audio => &mut self.audio_tracks,
        }
    }
}

/// Backend-side address of one clip: track kind plus zero-based array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClipRef {
    pub kind: TrackKind,
    pub track: usize,
    pub clip: usize,
}
