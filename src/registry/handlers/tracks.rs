#![allow(clippy::needless_pass_by_value)]

use crate::dispatcher::CommandDispatcher;
use crate::error::EditError;
use crate::registry::params::TrackParams;
use crate::registry::CommandOutput;

pub fn mute_audio(engine: &mut CommandDispatcher, p: TrackParams) -> Result<CommandOutput, EditError> {
    let index = p.track_index();
    let message = engine.backend.mute_track(index.value)?;
    Ok(CommandOutput::new(message).with_warnings(index.warning))
}

pub fn unmute_audio(engine: &mut CommandDispatcher, p: TrackParams) -> Result<CommandOutput, EditError> {
    let index = p.track_index();
    let message = engine.backend.unmute_track(index.value)?;
    Ok(CommandOutput::new(message).with_warnings(index.warning))
}

pub fn hide_video(engine: &mut CommandDispatcher, p: TrackParams) -> Result<CommandOutput, EditError> {
    let index = p.track_index();
    let message = engine.backend.hide_track(index.value)?;
    Ok(CommandOutput::new(message).with_warnings(index.warning))
}

pub fn show_video(engine: &mut CommandDispatcher, p: TrackParams) -> Result<CommandOutput, EditError> {
    let index = p.track_index();
    let message = engine.backend.show_track(index.value)?;
    Ok(CommandOutput::new(message).with_warnings(index.warning))
}
