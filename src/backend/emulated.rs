use crate::error::EditError;
use crate::model::{BackendMode, ClipRef, Sequence, Track, TrackKind, TracksInfo};
use crate::normalize::{self, CutPlan, FragmentSelector, PlaybackAction};

use super::{FragmentSelection, TimelineBackend};

const PREFIX: &str = "[emulated]";

/// In-memory stand-in used when no editor is reachable. Mutations apply to an
/// illustrative sequence so later commands in a batch see earlier effects.
/// Playback is refused and undo keeps no history.
pub struct EmulatedBackend {
    sequence: Option<Sequence>,
}

impl EmulatedBackend {
    pub fn new() -> Self {
        Self::with_sequence(Sequence::illustrative())
    }

    pub fn with_sequence(sequence: Sequence) -> Self {
        Self {
            sequence: Some(sequence),
        }
    }

    /// An editor with no open sequence; every timeline operation fails.
    pub fn without_sequence() -> Self {
        Self { sequence: None }
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    fn sequence_mut(&mut self) -> Result<&mut Sequence, EditError> {
        self.sequence.as_mut().ok_or(EditError::NoActiveSequence)
    }

    fn track_mut(&mut self, kind: TrackKind, index: i64) -> Result<(usize, &mut Track), EditError> {
        let tracks = self.sequence_mut()?.tracks_mut(kind);
        let pos = super::checked_track(kind, index, tracks.len())?;
        let track = tracks
            .get_mut(pos)
            .ok_or_else(|| EditError::out_of_range(kind.track_label(), index, 0))?;
        Ok((pos, track))
    }

    fn reply(message: impl AsRef<str>) -> String {
        let message = format!("{PREFIX} {}", message.as_ref());
        tracing::info!("{message}");
        message
    }
}

impl Default for EmulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineBackend for EmulatedBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Emulated
    }

    fn hide_track(&mut self, index: i64) -> Result<String, EditError> {
        let (_, track) = self.track_mut(TrackKind::Video, index)?;
        track.visible = false;
        Ok(Self::reply(format!("{} hidden", super::track_title(TrackKind::Video, index))))
    }

    fn show_track(&mut self, index: i64) -> Result<String, EditError> {
        let (_, track) = self.track_mut(TrackKind::Video, index)?;
        track.visible = true;
        Ok(Self::reply(format!("{} shown", super::track_title(TrackKind::Video, index))))
    }

    fn mute_track(&mut self, index: i64) -> Result<String, EditError> {
        let (_, track) = self.track_mut(TrackKind::Audio, index)?;
        track.muted = true;
        Ok(Self::reply(format!("{} muted", super::track_title(TrackKind::Audio, index))))
    }

    fn unmute_track(&mut self, index: i64) -> Result<String, EditError> {
        let (_, track) = self.track_mut(TrackKind::Audio, index)?;
        track.muted = false;
        Ok(Self::reply(format!("{} unmuted", super::track_title(TrackKind::Audio, index))))
    }

    fn cut_track(&mut self, kind: TrackKind, index: i64, plan: CutPlan) -> Result<String, EditError> {
        let (_, track) = self.track_mut(kind, index)?;
        let mut missed = Vec::new();
        for at in plan.offsets() {
            if !track.split_at(at) {
                missed.push(normalize::format_seconds(at));
            }
        }
        let mut message = super::cut_message(kind, index, plan);
        if !missed.is_empty() {
            message.push_str(&format!(" (no clip under {})", missed.join(", ")));
        }
        Ok(Self::reply(message))
    }

    fn select_fragments(
        &mut self,
        kind: TrackKind,
        index: i64,
        selector: &FragmentSelector,
    ) -> Result<FragmentSelection, EditError> {
        let (pos, track) = self.track_mut(kind, index)?;
        let label = format!("{} {index}", kind.track_label());
        let plan = normalize::plan_selection(selector, track.clips.len(), &label)?;
        for &clip in &plan.clips {
            if let Some(c) = track.clips.get_mut(clip) {
                c.selected = true;
            }
        }
        Ok(FragmentSelection {
            message: Self::reply(super::selection_message(kind, index, selector, &plan)),
            clips: plan
                .clips
                .iter()
                .map(|&clip| ClipRef { kind, track: pos, clip })
                .collect(),
            warnings: plan.skipped,
        })
    }

    fn deselect_track(&mut self, kind: TrackKind, index: Option<i64>) -> Result<String, EditError> {
        match index {
            Some(i) => self.track_mut(kind, i)?.1.set_all_selected(false),
            None => self
                .sequence_mut()?
                .tracks_mut(kind)
                .iter_mut()
                .for_each(|t| t.set_all_selected(false)),
        }
        Ok(Self::reply(super::deselect_message(kind, index)))
    }

    fn deselect_all(&mut self) -> Result<String, EditError> {
        let seq = self.sequence_mut()?;
        for kind in TrackKind::all() {
            seq.tracks_mut(kind)
                .iter_mut()
                .for_each(|t| t.set_all_selected(false));
        }
        Ok(Self::reply(super::DESELECTED_EVERYTHING))
    }

    fn deselect_clips(&mut self, clips: &[ClipRef]) -> Result<String, EditError> {
        let seq = self.sequence_mut()?;
        for c in clips {
            let clip = seq
                .tracks_mut(c.kind)
                .get_mut(c.track)
                .and_then(|t| t.clips.get_mut(c.clip))
                .ok_or_else(|| {
                    let number = i64::try_from(c.clip).map_or(i64::MAX, |n| n.saturating_add(1));
                    EditError::out_of_range("clip", number, 0)
                })?;
            clip.selected = false;
        }
        Ok(Self::reply(super::DESELECTED_EVERYTHING))
    }

    fn playback(&mut self, _action: PlaybackAction) -> Result<String, EditError> {
        Err(EditError::BackendUnavailable {
            operation: "Playback".to_string(),
        })
    }

    fn undo(&mut self) -> Result<String, EditError> {
        Ok(Self::reply("Undo requested (emulation keeps no history)"))
    }

    fn tracks_info(&mut self) -> Result<TracksInfo, EditError> {
        let seq = self.sequence.as_ref().ok_or(EditError::NoActiveSequence)?;
        Ok(TracksInfo::from_sequence(BackendMode::Emulated, seq))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn mute_is_idempotent() {
        let mut backend = EmulatedBackend::new();
        assert!(backend.mute_track(1).is_ok());
        assert!(backend.mute_track(1).is_ok());
        assert!(backend.sequence().unwrap().audio_tracks[0].muted);
        let msg = backend.unmute_track(1).unwrap();
        assert_eq!(msg, "[emulated] Audio track 1 unmuted");
        assert!(!backend.sequence().unwrap().audio_tracks[0].muted);
    }

    #[test]
    fn hide_and_show_toggle_visibility() {
        let mut backend = EmulatedBackend::new();
        backend.hide_track(2).unwrap();
        assert!(!backend.sequence().unwrap().video_tracks[1].visible);
        backend.show_track(2).unwrap();
        assert!(backend.sequence().unwrap().video_tracks[1].visible);
    }

    #[test]
    fn out_of_range_track() {
        let mut backend = EmulatedBackend::new();
        assert!(matches!(
            backend.hide_track(3),
            Err(EditError::OutOfRange { index: 3, available: 2, .. })
        ));
        assert!(backend.mute_track(0).is_err());
    }

    #[test]
    fn no_sequence_fails_every_mutation() {
        let mut backend = EmulatedBackend::without_sequence();
        assert_eq!(backend.mute_track(1), Err(EditError::NoActiveSequence));
        assert_eq!(backend.deselect_all(), Err(EditError::NoActiveSequence));
        assert_eq!(
            backend.cut_track(TrackKind::Video, 1, CutPlan::Single(5.0)),
            Err(EditError::NoActiveSequence)
        );
        assert!(backend.tracks_info().is_err());
    }

    #[test]
    fn cut_splits_clips() {
        let mut backend = EmulatedBackend::new();
        backend
            .cut_track(TrackKind::Video, 1, CutPlan::Range { start: 10.0, end: 40.0 })
            .unwrap();
        let clips = &backend.sequence().unwrap().video_tracks[0].clips;
        assert_eq!(clips.len(), 4);
        let starts: Vec<f64> = clips.iter().map(|c| c.range.start()).collect();
        assert_eq!(starts, vec![0.0, 10.0, 30.0, 40.0]);
    }

    #[test]
    fn cut_outside_clips_reports_it() {
        let mut backend = EmulatedBackend::new();
        let msg = backend.cut_track(TrackKind::Audio, 1, CutPlan::Single(120.0)).unwrap();
        assert!(msg.contains("no clip under 00:02:00"));
    }

    #[test]
    fn select_then_deselect() {
        let mut backend = EmulatedBackend::new();
        let sel = backend
            .select_fragments(TrackKind::Video, 1, &FragmentSelector::List(vec![1, 9999]))
            .unwrap();
        assert_eq!(sel.clips, vec![ClipRef { kind: TrackKind::Video, track: 0, clip: 0 }]);
        assert_eq!(sel.warnings.len(), 1);
        assert!(backend.sequence().unwrap().video_tracks[0].clips[0].selected);
        assert!(!backend.sequence().unwrap().video_tracks[0].clips[1].selected);

        backend.deselect_track(TrackKind::Video, None).unwrap();
        assert!(!backend.sequence().unwrap().video_tracks[0].clips[0].selected);
    }

    #[test]
    fn deselect_clips_leaves_untracked_selection_alone() {
        let mut backend = EmulatedBackend::new();
        backend
            .select_fragments(TrackKind::Audio, 1, &FragmentSelector::All)
            .unwrap();
        let first = ClipRef { kind: TrackKind::Audio, track: 0, clip: 0 };
        backend.deselect_clips(&[first]).unwrap();
        let clips = &backend.sequence().unwrap().audio_tracks[0].clips;
        assert!(!clips[0].selected);
        assert!(clips[1].selected);

        let stale = ClipRef { kind: TrackKind::Audio, track: 0, clip: 7 };
        assert!(matches!(
            backend.deselect_clips(&[stale]),
            Err(EditError::OutOfRange { index: 8, .. })
        ));
    }

    #[test]
    fn playback_requires_editor() {
        let mut backend = EmulatedBackend::new();
        assert!(matches!(
            backend.playback(PlaybackAction::Play),
            Err(EditError::BackendUnavailable { .. })
        ));
        assert!(backend.undo().unwrap().starts_with("[emulated]"));
    }

    #[test]
    fn tracks_info_reflects_mutations() {
        let mut backend = EmulatedBackend::new();
        backend.hide_track(1).unwrap();
        let info = backend.tracks_info().unwrap();
        assert_eq!(info.mode, BackendMode::Emulated);
        assert_eq!(info.video_tracks[0].is_visible, Some(false));
        assert_eq!(info.audio_tracks.len(), 2);
    }
}
