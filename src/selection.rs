//! Mirror of which clips the engine has marked selected.
//!
//! The backend owns the real selection state. This tracker only records what
//! select/deselect commands did during the session, in the order they did it,
//! so callers can report and clear it without re-querying every track.

use indexmap::IndexSet;

use crate::model::{ClipRef, TrackKind};

#[derive(Debug, Default, Clone)]
pub struct SelectionTracker {
    selected: IndexSet<ClipRef>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record clips as selected. Returns how many were newly added.
    pub fn mark_selected(&mut self, clips: impl IntoIterator<Item = ClipRef>) -> usize {
        clips
            .into_iter()
            .filter(|clip| self.selected.insert(*clip))
            .count()
    }

    /// Forget selections on one track, or on every track of `kind` when
    /// `track` is None. Returns how many entries were dropped.
    pub fn mark_deselected(&mut self, kind: TrackKind, track: Option<usize>) -> usize {
        let before = self.selected.len();
        self.selected
            .retain(|c| c.kind != kind || track.is_some_and(|t| c.track != t));
        before - self.selected.len()
    }

    /// A razor cut re-indexes the clips on a track, so their recorded
    /// positions are no longer meaningful.
    pub fn forget_track(&mut self, kind: TrackKind, track: usize) {
        self.mark_deselected(kind, Some(track));
    }

    /// Drop everything. Returns how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.selected.len();
        self.selected.clear();
        n
    }

    pub fn is_selected(&self, clip: &ClipRef) -> bool {
        self.selected.contains(clip)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected clips in the order they were selected.
    pub fn iter(&self) -> impl Iterator<Item = &ClipRef> {
        self.selected.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn clip(kind: TrackKind, track: usize, clip: usize) -> ClipRef {
        ClipRef { kind, track, clip }
    }

    #[test]
    fn selection_accumulates_without_duplicates() {
        let mut tracker = SelectionTracker::new();
        assert_eq!(
            tracker.mark_selected([clip(TrackKind::Video, 0, 0), clip(TrackKind::Video, 0, 1)]),
            2
        );
        assert_eq!(tracker.mark_selected([clip(TrackKind::Video, 0, 1)]), 0);
        assert_eq!(tracker.len(), 2);
        let order: Vec<usize> = tracker.iter().map(|c| c.clip).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn deselect_by_track_and_kind() {
        let mut tracker = SelectionTracker::new();
        tracker.mark_selected([
            clip(TrackKind::Video, 0, 0),
            clip(TrackKind::Video, 1, 0),
            clip(TrackKind::Audio, 0, 0),
        ]);
        assert_eq!(tracker.mark_deselected(TrackKind::Video, Some(1)), 1);
        assert!(tracker.is_selected(&clip(TrackKind::Video, 0, 0)));
        assert_eq!(tracker.mark_deselected(TrackKind::Video, None), 1);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.is_selected(&clip(TrackKind::Audio, 0, 0)));
        assert_eq!(tracker.clear(), 1);
        assert!(tracker.is_empty());
    }

    #[test]
    fn cut_forgets_only_that_track() {
        let mut tracker = SelectionTracker::new();
        tracker.mark_selected([clip(TrackKind::Audio, 0, 1), clip(TrackKind::Audio, 1, 1)]);
        tracker.forget_track(TrackKind::Audio, 0);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.is_selected(&clip(TrackKind::Audio, 1, 1)));
    }
}
