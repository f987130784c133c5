use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::EditError;
use crate::persist::{read_json, write_json};

// ── Sections ─────────────────────────────────────────────────────

/// Where the host editor's script-evaluation panel listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub struct BridgeSettings {
    pub url: String,
    /// Budget for the single startup probe. Operations themselves have no timeout.
    pub probe_timeout_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000".to_string(),
            probe_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5050,
        }
    }
}

impl ApiSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The service that turns a transcript into a command list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub struct UpstreamSettings {
    pub url: String,
    pub model: String,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            model: "gemini-2.0-flash".to_string(),
        }
    }
}

// ── App settings ─────────────────────────────────────────────────

/// Application-level settings stored in the config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub struct AppSettings {
    pub version: u32,
    #[serde(default)]
    pub bridge: BridgeSettings,
    /// Skip the probe and run emulated even if an editor is reachable.
    #[serde(default)]
    pub force_emulation: bool,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default = "default_true")]
    pub audit_log: bool,
}

fn default_true() -> bool {
    true
}

const SETTINGS_VERSION: u32 = 1;

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            bridge: BridgeSettings::default(),
            force_emulation: false,
            api: ApiSettings::default(),
            upstream: UpstreamSettings::default(),
            audit_log: true,
        }
    }
}

/// Load settings from the app config directory. Returns None if no settings
/// file exists or it cannot be parsed.
pub fn load_settings(app_config_dir: &Path) -> Option<AppSettings> {
    let path = crate::paths::settings_path(app_config_dir);
    if !path.exists() {
        return None;
    }
    match read_json::<AppSettings>(&path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!("Ignoring unreadable settings at {}: {e}", path.display());
            None
        }
    }
}

/// Load settings, falling back to defaults.
pub fn load_or_default(app_config_dir: &Path) -> AppSettings {
    load_settings(app_config_dir).unwrap_or_default()
}

/// Save settings to the app config directory.
pub fn save_settings(app_config_dir: &Path, settings: &AppSettings) -> Result<(), EditError> {
    std::fs::create_dir_all(app_config_dir)?;
    write_json(&crate::paths::settings_path(app_config_dir), settings)
}
