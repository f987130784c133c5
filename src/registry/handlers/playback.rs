#![allow(clippy::needless_pass_by_value)]

use crate::dispatcher::CommandDispatcher;
use crate::error::EditError;
use crate::registry::params::PlaybackParams;
use crate::registry::CommandOutput;

pub fn play_pause(engine: &mut CommandDispatcher, p: PlaybackParams) -> Result<CommandOutput, EditError> {
    let action = p.action()?;
    let message = engine.backend.playback(action)?;
    Ok(CommandOutput::new(message))
}
