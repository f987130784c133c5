#![allow(clippy::needless_pass_by_value)]

use crate::dispatcher::CommandDispatcher;
use crate::error::EditError;
use crate::model::ClipRef;
use crate::normalize;
use crate::registry::params::{DeselectParams, SelectParams};
use crate::registry::CommandOutput;

/// Backs both `select_track` and `select_track_fragment`.
pub fn select_fragments(
    engine: &mut CommandDispatcher,
    p: SelectParams,
) -> Result<CommandOutput, EditError> {
    let kind = p.track_kind()?;
    let index = p.track_index();
    let fragments = p.fragments()?;
    let selected = engine
        .backend
        .select_fragments(kind, index.value, &fragments.selector)?;
    let added = engine.selection.mark_selected(selected.clips.iter().copied());
    tracing::debug!("{added} clip(s) newly tracked as selected");
    Ok(CommandOutput::new(selected.message).with_warnings(
        index
            .warning
            .into_iter()
            .chain(fragments.rejected)
            .chain(selected.warnings),
    ))
}

/// Backs both `deselect_track` and `deselect_track_fragments`.
pub fn deselect_track(
    engine: &mut CommandDispatcher,
    p: DeselectParams,
) -> Result<CommandOutput, EditError> {
    let kind = p.track_kind()?;
    let index = p.track_index();
    let user_index = index.as_ref().map(|c| c.value);
    let message = engine.backend.deselect_track(kind, user_index)?;
    let track = user_index
        .map(normalize::to_array_index)
        .and_then(|i| usize::try_from(i).ok());
    engine.selection.mark_deselected(kind, track);
    Ok(CommandOutput::new(message).with_warnings(index.and_then(|c| c.warning)))
}

/// Deselects the tracked clips directly. With nothing tracked, or when a
/// tracked clip no longer resolves, every track is swept instead.
pub fn deselect_all(engine: &mut CommandDispatcher) -> Result<CommandOutput, EditError> {
    let tracked: Vec<ClipRef> = engine.selection.iter().copied().collect();
    let message = if tracked.is_empty() {
        engine.backend.deselect_all()?
    } else {
        match engine.backend.deselect_clips(&tracked) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Tracked deselect failed ({e}); sweeping every track");
                engine.backend.deselect_all()?
            }
        }
    };
    let cleared = engine.selection.clear();
    tracing::debug!("Cleared {cleared} tracked selection(s)");
    Ok(CommandOutput::new(message))
}
