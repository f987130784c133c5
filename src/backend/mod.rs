pub mod bridge;
pub mod emulated;
pub mod live;

use crate::error::EditError;
use crate::model::{BackendMode, ClipRef, TrackKind, TracksInfo};
use crate::normalize::{self, CutPlan, FragmentSelector, PlaybackAction, SelectionPlan};
use crate::settings::AppSettings;

pub use bridge::{BridgeError, HostBridge, HttpBridge};
pub use emulated::EmulatedBackend;
pub use live::LiveBackend;

/// The timeline capabilities the dispatcher drives. Track indices arrive
/// 1-based as the user spoke them; each implementation bounds-checks them
/// against its own track and clip counts.
///
/// Implementations never panic on bad input and never leak host failures as
/// anything other than an `EditError`.
pub trait TimelineBackend: Send {
    fn mode(&self) -> BackendMode;

    fn hide_track(&mut self, index: i64) -> Result<String, EditError>;
    fn show_track(&mut self, index: i64) -> Result<String, EditError>;

    fn mute_track(&mut self, index: i64) -> Result<String, EditError>;
    fn unmute_track(&mut self, index: i64) -> Result<String, EditError>;

    /// Razor the track at one or two offsets, in the order the plan gives.
    fn cut_track(&mut self, kind: TrackKind, index: i64, plan: CutPlan) -> Result<String, EditError>;

    fn select_fragments(
        &mut self,
        kind: TrackKind,
        index: i64,
        selector: &FragmentSelector,
    ) -> Result<FragmentSelection, EditError>;

    /// Deselect every clip on one track, or on every track of `kind`.
    fn deselect_track(&mut self, kind: TrackKind, index: Option<i64>) -> Result<String, EditError>;

    fn deselect_all(&mut self) -> Result<String, EditError>;

    /// Deselect exactly these clips, without visiting any other track.
    fn deselect_clips(&mut self, clips: &[ClipRef]) -> Result<String, EditError>;

    fn playback(&mut self, action: PlaybackAction) -> Result<String, EditError>;

    fn undo(&mut self) -> Result<String, EditError>;

    fn tracks_info(&mut self) -> Result<TracksInfo, EditError>;
}

/// What a select command actually selected.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSelection {
    pub message: String,
    pub clips: Vec<ClipRef>,
    pub warnings: Vec<String>,
}

/// Pick the backend for the lifetime of the process: live if the editor
/// answers the probe, emulated otherwise. Never re-probed.
pub fn connect(settings: &AppSettings) -> Box<dyn TimelineBackend> {
    if settings.force_emulation {
        tracing::info!("Emulation forced by settings; not probing the editor");
        return Box::new(EmulatedBackend::new());
    }
    match HttpBridge::probe(&settings.bridge) {
        Ok((bridge, version)) => {
            tracing::info!("Connected to editor {version} at {}", settings.bridge.url);
            Box::new(LiveBackend::new(bridge))
        }
        Err(e) => {
            tracing::warn!(
                "Editor not reachable at {} ({e}); running in emulation mode",
                settings.bridge.url
            );
            Box::new(EmulatedBackend::new())
        }
    }
}

// ── Shared wording ──────────────────────────────────────────────

pub(crate) const DESELECTED_EVERYTHING: &str = "Deselected all fragments on every track";

pub(crate) fn track_title(kind: TrackKind, index: i64) -> String {
    match kind {
        TrackKind::Video => format!("Video track {index}"),
        TrackKind::Audio => format!("Audio track {index}"),
    }
}

pub(crate) fn cut_message(kind: TrackKind, index: i64, plan: CutPlan) -> String {
    match plan {
        CutPlan::Single(at) => format!(
            "Cut {} {index} at {}",
            kind.track_label(),
            normalize::format_seconds(at)
        ),
        CutPlan::Range { start, end } => format!(
            "Cut {} {index} from {} to {}",
            kind.track_label(),
            normalize::format_seconds(start),
            normalize::format_seconds(end)
        ),
    }
}

pub(crate) fn selection_message(
    kind: TrackKind,
    index: i64,
    selector: &FragmentSelector,
    plan: &SelectionPlan,
) -> String {
    let track = format!("{} {index}", kind.track_label());
    match selector {
        FragmentSelector::All if plan.clips.is_empty() => format!("No fragments on {track} to select"),
        FragmentSelector::All => format!("Selected all {} fragment(s) on {track}", plan.clips.len()),
        FragmentSelector::Single(_) | FragmentSelector::List(_) => {
            let numbers: Vec<String> = plan.user_indices().iter().map(ToString::to_string).collect();
            let noun = if numbers.len() == 1 { "fragment" } else { "fragments" };
            format!("Selected {noun} {} on {track}", numbers.join(", "))
        }
    }
}

pub(crate) fn deselect_message(kind: TrackKind, index: Option<i64>) -> String {
    match index {
        Some(i) => format!("Deselected all fragments on {} {i}", kind.track_label()),
        None => format!("Deselected all fragments on every {}", kind.track_label()),
    }
}

/// Resolve a 1-based track index against a track count, with the track kind
/// named in the error.
pub(crate) fn checked_track(kind: TrackKind, index: i64, count: usize) -> Result<usize, EditError> {
    normalize::checked_array_index(index, count, &kind.track_label())
}
