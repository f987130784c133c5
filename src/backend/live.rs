use crate::error::EditError;
use crate::model::{BackendMode, ClipRef, TrackInfo, TrackKind, TracksInfo};
use crate::normalize::{self, CutPlan, FragmentSelector, PlaybackAction};

use super::bridge::{BridgeError, HostBridge};
use super::{FragmentSelection, TimelineBackend};

/// Host command that flips the mute state of the targeted audio tracks.
const TOGGLE_TRACK_MUTE: &str = "ToggleTrackMute";

/// Backend driving a connected editor through a [`HostBridge`].
pub struct LiveBackend<B: HostBridge> {
    bridge: B,
}

impl<B: HostBridge> LiveBackend<B> {
    pub fn new(bridge: B) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    fn track(&mut self, kind: TrackKind, index: i64) -> Result<usize, EditError> {
        let count = self.bridge.track_count(kind)?;
        super::checked_track(kind, index, count)
    }

    fn set_visible(&mut self, index: i64, visible: bool) -> Result<String, EditError> {
        let track = self.track(TrackKind::Video, index)?;
        // Video tracks hide through their mute flag.
        self.bridge.set_muted(TrackKind::Video, track, !visible)?;
        let verb = if visible { "shown" } else { "hidden" };
        Ok(format!("{} {verb}", super::track_title(TrackKind::Video, index)))
    }

    fn set_audio_muted(&mut self, index: i64, muted: bool) -> Result<String, EditError> {
        let track = self.track(TrackKind::Audio, index)?;
        match self.bridge.set_muted(TrackKind::Audio, track, muted) {
            Ok(()) => {}
            Err(BridgeError::Unsupported(reason)) => {
                tracing::warn!("Direct mute setter unavailable ({reason}); using targeted toggle");
                self.toggle_mute_fallback(track, muted)?;
            }
            Err(e) => return Err(e.into()),
        }
        let verb = if muted { "muted" } else { "unmuted" };
        Ok(format!("{} {verb}", super::track_title(TrackKind::Audio, index)))
    }

    /// Target only `track`, read its mute state, and toggle when it differs
    /// from `muted`. When the state cannot be read it is assumed to differ.
    fn toggle_mute_fallback(&mut self, track: usize, muted: bool) -> Result<(), EditError> {
        let count = self.bridge.track_count(TrackKind::Audio)?;
        for i in 0..count {
            self.bridge.set_targeted(TrackKind::Audio, i, i == track)?;
        }
        let current = match self.bridge.is_muted(TrackKind::Audio, track) {
            Ok(state) => state,
            Err(BridgeError::Unsupported(reason)) => {
                tracing::warn!("Mute state unreadable ({reason}); assuming it needs toggling");
                !muted
            }
            Err(e) => return Err(e.into()),
        };
        if current != muted {
            self.bridge.execute_command(TOGGLE_TRACK_MUTE)?;
        }
        Ok(())
    }

    fn deselect_tracks(&mut self, kind: TrackKind, tracks: impl IntoIterator<Item = usize>) -> Result<(), EditError> {
        for track in tracks {
            let clips = self.bridge.clip_count(kind, track)?;
            for clip in 0..clips {
                self.bridge.set_clip_selected(kind, track, clip, false)?;
            }
        }
        Ok(())
    }

    fn track_rows(&mut self, kind: TrackKind) -> Result<Vec<TrackInfo>, EditError> {
        let count = self.bridge.track_count(kind)?;
        let mut rows = Vec::with_capacity(count);
        for i in 0..count {
            let name = self.bridge.track_name(kind, i)?;
            // State queries are optional on some host builds.
            let muted = self.bridge.is_muted(kind, i).ok();
            let clip_count = self.bridge.clip_count(kind, i).ok();
            let (is_visible, is_muted) = match kind {
                TrackKind::Video => (muted.map(|m| !m), None),
                TrackKind::Audio => (None, muted),
            };
            rows.push(TrackInfo {
                index: i + 1,
                name,
                is_visible,
                is_muted,
                clip_count,
            });
        }
        Ok(rows)
    }
}

impl<B: HostBridge> TimelineBackend for LiveBackend<B> {
    fn mode(&self) -> BackendMode {
        BackendMode::Live
    }

    fn hide_track(&mut self, index: i64) -> Result<String, EditError> {
        self.set_visible(index, false)
    }

    fn show_track(&mut self, index: i64) -> Result<String, EditError> {
        self.set_visible(index, true)
    }

    fn mute_track(&mut self, index: i64) -> Result<String, EditError> {
        self.set_audio_muted(index, true)
    }

    fn unmute_track(&mut self, index: i64) -> Result<String, EditError> {
        self.set_audio_muted(index, false)
    }

    fn cut_track(&mut self, kind: TrackKind, index: i64, plan: CutPlan) -> Result<String, EditError> {
        let track = self.track(kind, index)?;
        for at in plan.offsets() {
            self.bridge.razor(kind, track, at)?;
        }
        Ok(super::cut_message(kind, index, plan))
    }

    fn select_fragments(
        &mut self,
        kind: TrackKind,
        index: i64,
        selector: &FragmentSelector,
    ) -> Result<FragmentSelection, EditError> {
        let track = self.track(kind, index)?;
        let clip_count = self.bridge.clip_count(kind, track)?;
        let label = format!("{} {index}", kind.track_label());
        let plan = normalize::plan_selection(selector, clip_count, &label)?;
        for &clip in &plan.clips {
            self.bridge.set_clip_selected(kind, track, clip, true)?;
        }
        Ok(FragmentSelection {
            message: super::selection_message(kind, index, selector, &plan),
            clips: plan
                .clips
                .iter()
                .map(|&clip| ClipRef { kind, track, clip })
                .collect(),
            warnings: plan.skipped,
        })
    }

    fn deselect_track(&mut self, kind: TrackKind, index: Option<i64>) -> Result<String, EditError> {
        match index {
            Some(i) => {
                let track = self.track(kind, i)?;
                self.deselect_tracks(kind, [track])?;
            }
            None => {
                let count = self.bridge.track_count(kind)?;
                self.deselect_tracks(kind, 0..count)?;
            }
        }
        Ok(super::deselect_message(kind, index))
    }

    fn deselect_all(&mut self) -> Result<String, EditError> {
        for kind in TrackKind::all() {
            let count = self.bridge.track_count(kind)?;
            self.deselect_tracks(kind, 0..count)?;
        }
        Ok(super::DESELECTED_EVERYTHING.to_string())
    }

    fn deselect_clips(&mut self, clips: &[ClipRef]) -> Result<String, EditError> {
        for c in clips {
            self.bridge.set_clip_selected(c.kind, c.track, c.clip, false)?;
        }
        Ok(super::DESELECTED_EVERYTHING.to_string())
    }

    fn playback(&mut self, action: PlaybackAction) -> Result<String, EditError> {
        match action {
            PlaybackAction::Play => {
                self.bridge.play()?;
                Ok("Playback started".to_string())
            }
            PlaybackAction::Pause => {
                self.bridge.stop()?;
                Ok("Playback paused".to_string())
            }
        }
    }

    fn undo(&mut self) -> Result<String, EditError> {
        self.bridge.undo()?;
        Ok("Undid the last action".to_string())
    }

    fn tracks_info(&mut self) -> Result<TracksInfo, EditError> {
        let sequence_name = self.bridge.sequence_name()?;
        Ok(TracksInfo {
            mode: BackendMode::Live,
            sequence_name,
            video_tracks: self.track_rows(TrackKind::Video)?,
            audio_tracks: self.track_rows(TrackKind::Audio)?,
        })
    }
}
