#![allow(clippy::needless_pass_by_value)]

use crate::dispatcher::CommandDispatcher;
use crate::error::EditError;
use crate::normalize;
use crate::registry::params::CutParams;
use crate::registry::CommandOutput;

pub fn cut(engine: &mut CommandDispatcher, p: CutParams) -> Result<CommandOutput, EditError> {
    let kind = p.track_kind()?;
    let index = p.track_index();
    let plan = p.plan()?;
    let message = engine.backend.cut_track(kind, index.value, plan)?;
    // Clips after the cut point shift, so recorded positions on this track are stale.
    if let Ok(track) = usize::try_from(normalize::to_array_index(index.value)) {
        engine.selection.forget_track(kind, track);
    }
    Ok(CommandOutput::new(message).with_warnings(index.warning))
}

/// The editor may revert a selection change, so the tracker is reset.
pub fn undo(engine: &mut CommandDispatcher) -> Result<CommandOutput, EditError> {
    let message = engine.backend.undo()?;
    engine.selection.clear();
    Ok(CommandOutput::new(message))
}
