pub mod catalog;
pub mod handlers;
pub mod params;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::dispatcher::CommandDispatcher;
use crate::error::EditError;

use params::{CutParams, DeselectParams, PlaybackParams, SelectParams, TrackParams};

// ── Handler modules (dispatch targets) ──────────────────────────
use handlers::{edit, playback, selection, tracks};

// ── Command metadata ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum CommandCategory {
    Track,
    Selection,
    Edit,
    Playback,
}

impl CommandCategory {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Selection => "selection",
            Self::Edit => "edit",
            Self::Playback => "playback",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Track => "Mute, unmute, hide and show tracks",
            Self::Selection => "Select and deselect clips",
            Self::Edit => "Razor cuts and undo",
            Self::Playback => "Start and stop playback",
        }
    }

    pub fn all() -> &'static [CommandCategory] {
        &[Self::Track, Self::Selection, Self::Edit, Self::Playback]
    }
}

pub struct CommandInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub category: CommandCategory,
    /// Refused unless a live editor is connected.
    pub requires_live: bool,
}

// ── Command output ──────────────────────────────────────────────

/// Result of a successful command: the confirmation text plus any non-fatal
/// warnings raised while interpreting its parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutput {
    pub message: String,
    pub warnings: Vec<String>,
}

impl CommandOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

// ── define_commands! macro ──────────────────────────────────────

/// Single source of truth for all commands. Generates:
/// 1. `Command` enum
/// 2. `Command::info()`: metadata (name, aliases, description, category, flags)
/// 3. `Command::dispatch()`: run against a dispatcher
/// 4. `Command::registry_entries()`: catalog entries with JSON schemas
/// 5. `Command::from_parts()`: build from a (name, JSON parameters) pair,
///    accepting aliases
macro_rules! define_commands {
    (
        params {
            $(
                [ $pc:expr $(, $pf:ident)* ]
                $pv:ident ( $pp:ty )
                => $ph:path, $pn:literal $(| $pa:literal)* : $pd:literal ;
            )*
        }
        no_params {
            $(
                [ $nc:expr $(, $nf:ident)* ]
                $nv:ident
                => $nh:path, $nn:literal $(| $na:literal)* : $nd:literal ;
            )*
        }
    ) => {
        // ── 1. Command enum ──
        /// A fully parsed command. Every surface (CLI, REST, prompt) dispatches
        /// through the same executor. Adding a variant causes compiler errors
        /// until it's fully handled.
        #[derive(Debug, Clone)]
        pub enum Command {
            $( $pv($pp), )*
            $( $nv, )*
        }

        // ── 2. Command::info() ──
        impl Command {
            pub fn info(&self) -> CommandInfo {
                match self {
                    $( Command::$pv(_) => CommandInfo {
                        name: $pn,
                        aliases: &[$($pa),*],
                        description: $pd,
                        category: $pc,
                        requires_live: define_commands!(@has_flag requires_live; $($pf)*),
                    }, )*
                    $( Command::$nv => CommandInfo {
                        name: $nn,
                        aliases: &[$($na),*],
                        description: $nd,
                        category: $nc,
                        requires_live: define_commands!(@has_flag requires_live; $($nf)*),
                    }, )*
                }
            }
        }

        // ── 3. Command::dispatch() ──
        impl Command {
            pub(crate) fn dispatch(
                self,
                engine: &mut CommandDispatcher,
            ) -> Result<CommandOutput, EditError> {
                match self {
                    $( Command::$pv(p) => $ph(engine, p), )*
                    $( Command::$nv => $nh(engine), )*
                }
            }
        }

        // ── 4. Command::registry_entries() ──
        impl Command {
            pub(crate) fn registry_entries() -> Vec<catalog::CommandRegistryEntry> {
                vec![
                    $( catalog::entry(
                        CommandInfo {
                            name: $pn,
                            aliases: &[$($pa),*],
                            description: $pd,
                            category: $pc,
                            requires_live: define_commands!(@has_flag requires_live; $($pf)*),
                        },
                        catalog::schema_value::<$pp>(),
                    ), )*
                    $( catalog::entry(
                        CommandInfo {
                            name: $nn,
                            aliases: &[$($na),*],
                            description: $nd,
                            category: $nc,
                            requires_live: define_commands!(@has_flag requires_live; $($nf)*),
                        },
                        catalog::empty_object_schema(),
                    ), )*
                ]
            }
        }

        // ── 5. Command::from_parts() ──
        impl Command {
            pub fn from_parts(name: &str, parameters: &Value) -> Result<Command, EditError> {
                match name {
                    $( $pn $(| $pa)* => Ok(Command::$pv(catalog::de(parameters)?)), )*
                    $( $nn $(| $na)* => Ok(Command::$nv), )*
                    _ => Err(EditError::UnknownCommand {
                        name: name.to_string(),
                    }),
                }
            }
        }
    };

    // Flag helpers: check whether a specific flag appears in a list of flags.
    // Literal tokens match before metavariables, so e.g. `requires_live` matches
    // the first arm and any other ident falls through to the recursive second arm.
    (@has_flag requires_live; requires_live $($rest:ident)*) => { true };
    (@has_flag requires_live; $_other:ident $($rest:ident)*) => { define_commands!(@has_flag requires_live; $($rest)*) };
    (@has_flag requires_live;) => { false };
}

// ── Command definitions ─────────────────────────────────────────

define_commands! {
    params {
        // ── Track (4) ───────────────────────────────────────────
        [CommandCategory::Track]
        MuteAudio(TrackParams)
        => tracks::mute_audio, "mute_audio": "Mute an audio track. Muting a muted track is a no-op.";

        [CommandCategory::Track]
        UnmuteAudio(TrackParams)
        => tracks::unmute_audio, "unmute_audio": "Unmute an audio track.";

        [CommandCategory::Track]
        HideVideo(TrackParams)
        => tracks::hide_video, "hide_video" | "hide_video_layer": "Hide a video track.";

        [CommandCategory::Track]
        ShowVideo(TrackParams)
        => tracks::show_video, "show_video" | "show_video_layer": "Show a hidden video track.";

        // ── Selection (4) ───────────────────────────────────────
        [CommandCategory::Selection]
        SelectTrack(SelectParams)
        => selection::select_fragments, "select_track": "Select clips on a track. Same as select_track_fragment.";

        [CommandCategory::Selection]
        SelectTrackFragment(SelectParams)
        => selection::select_fragments, "select_track_fragment": "Select one clip, a list of clips, or all clips on a track.";

        [CommandCategory::Selection]
        DeselectTrack(DeselectParams)
        => selection::deselect_track, "deselect_track": "Deselect every clip on a track, or on every track of a kind.";

        [CommandCategory::Selection]
        DeselectTrackFragments(DeselectParams)
        => selection::deselect_track, "deselect_track_fragments": "Same as deselect_track; clears whole tracks.";

        // ── Edit (1) ────────────────────────────────────────────
        [CommandCategory::Edit]
        Cut(CutParams)
        => edit::cut, "cut": "Razor a track at begin_time, and again at end_time when given.";

        // ── Playback (1) ────────────────────────────────────────
        [CommandCategory::Playback, requires_live]
        PlayPause(PlaybackParams)
        => playback::play_pause, "play_pause": "Start or stop playback.";
    }
    no_params {
        [CommandCategory::Selection]
        DeselectAllTracks
        => selection::deselect_all, "deselect_all_tracks": "Deselect every clip on every track.";

        [CommandCategory::Edit]
        Undo
        => edit::undo, "undo": "Undo the editor's last action.";
    }
}
