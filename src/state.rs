use std::path::PathBuf;

use parking_lot::Mutex;

use crate::dispatcher::CommandDispatcher;
use crate::model::BackendMode;
use crate::settings::AppSettings;

// ── Application State ──────────────────────────────────────────────

/// State shared by the HTTP API handlers. The dispatcher owns the backend
/// chosen at startup; commands are serialized through its lock.
pub struct AppState {
    pub dispatcher: Mutex<CommandDispatcher>,
    /// Fixed at startup; readable without taking the dispatcher lock.
    pub mode: BackendMode,
    pub settings: AppSettings,
    pub app_config_dir: PathBuf,
    /// Reused for every upstream generator call.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(dispatcher: CommandDispatcher, settings: AppSettings, app_config_dir: PathBuf) -> Self {
        Self {
            mode: dispatcher.mode(),
            dispatcher: Mutex::new(dispatcher),
            settings,
            app_config_dir,
            http: reqwest::Client::new(),
        }
    }

    /// Read-only access to the dispatcher.
    pub fn with_dispatcher<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CommandDispatcher) -> R,
    {
        let guard = self.dispatcher.lock();
        f(&guard)
    }

    /// Mutating access to the dispatcher.
    pub fn with_dispatcher_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CommandDispatcher) -> R,
    {
        let mut guard = self.dispatcher.lock();
        f(&mut guard)
    }
}

/// Build the dispatcher for a session: connect once, then attach the audit
/// log when enabled.
pub fn build_dispatcher(settings: &AppSettings, app_config_dir: &std::path::Path) -> CommandDispatcher {
    let dispatcher = CommandDispatcher::new(crate::backend::connect(settings));
    if settings.audit_log {
        dispatcher.with_audit_log(app_config_dir.to_path_buf())
    } else {
        dispatcher
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn forced_emulation_builds_emulated_dispatcher() {
        let settings = AppSettings {
            force_emulation: true,
            audit_log: false,
            ..AppSettings::default()
        };
        let dir = std::env::temp_dir().join("voxedit_test_state");
        let state = AppState::new(build_dispatcher(&settings, &dir), settings, dir);
        assert_eq!(state.with_dispatcher(CommandDispatcher::mode), BackendMode::Emulated);
        assert_eq!(state.mode, BackendMode::Emulated);
        let info = state.with_dispatcher_mut(CommandDispatcher::tracks_info).unwrap();
        assert_eq!(info.video_tracks.len(), 2);
    }
}
