//! Low-level access to the host editor through its script-evaluation panel.
//!
//! The panel accepts `POST {"to_eval": "<ExtendScript>"}` and answers with the
//! script's return value as plain text. Every script is wrapped so a host-side
//! exception comes back as `!ERR:<text>` instead of tearing down the panel.

use std::fmt;
use std::time::Duration;

use crate::error::EditError;
use crate::model::TrackKind;
use crate::settings::BridgeSettings;

const ERR_MARKER: &str = "!ERR:";
const NO_SEQUENCE_MARKER: &str = "!NOSEQ";
const UNSUPPORTED_MARKER: &str = "!UNSUPPORTED:";

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The host build does not expose the called method.
    Unsupported(String),
    NoActiveSequence,
    /// The panel could not be reached or answered with a non-success status.
    Transport(String),
    /// The script ran and threw, or returned something unparseable.
    Host(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Unsupported(what) => write!(f, "not supported by this editor: {what}"),
            BridgeError::NoActiveSequence => write!(f, "no active sequence"),
            BridgeError::Transport(e) => write!(f, "editor connection failed: {e}"),
            BridgeError::Host(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<BridgeError> for EditError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::NoActiveSequence => EditError::NoActiveSequence,
            other => EditError::Backend {
                message: other.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(e: reqwest::Error) -> Self {
        BridgeError::Transport(e.to_string())
    }
}

/// The primitive calls the live backend composes into timeline operations.
/// Track and clip indices are zero-based.
pub trait HostBridge: Send {
    fn version(&mut self) -> Result<String, BridgeError>;
    fn sequence_name(&mut self) -> Result<String, BridgeError>;
    fn track_count(&mut self, kind: TrackKind) -> Result<usize, BridgeError>;
    fn track_name(&mut self, kind: TrackKind, track: usize) -> Result<String, BridgeError>;
    fn set_muted(&mut self, kind: TrackKind, track: usize, muted: bool) -> Result<(), BridgeError>;
    fn is_muted(&mut self, kind: TrackKind, track: usize) -> Result<bool, BridgeError>;
    fn set_targeted(&mut self, kind: TrackKind, track: usize, targeted: bool) -> Result<(), BridgeError>;
    fn execute_command(&mut self, name: &str) -> Result<(), BridgeError>;
    fn clip_count(&mut self, kind: TrackKind, track: usize) -> Result<usize, BridgeError>;
    fn set_clip_selected(
        &mut self,
        kind: TrackKind,
        track: usize,
        clip: usize,
        selected: bool,
    ) -> Result<(), BridgeError>;
    fn razor(&mut self, kind: TrackKind, track: usize, seconds: f64) -> Result<(), BridgeError>;
    fn play(&mut self) -> Result<(), BridgeError>;
    fn stop(&mut self) -> Result<(), BridgeError>;
    fn undo(&mut self) -> Result<(), BridgeError>;
}

// ── HTTP implementation ─────────────────────────────────────────

pub struct HttpBridge {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpBridge {
    /// Client with no request timeout: a hung editor blocks the caller.
    pub fn new(url: &str) -> Result<Self, BridgeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Ask the panel for the host version within the probe budget. On success
    /// returns a bridge for normal (untimed) use.
    pub fn probe(settings: &BridgeSettings) -> Result<(Self, String), BridgeError> {
        let mut probing = Self {
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_millis(settings.probe_timeout_ms))
                .build()?,
            url: settings.url.trim_end_matches('/').to_string(),
        };
        let version = probing.version()?;
        Ok((Self::new(&settings.url)?, version))
    }

    fn eval(&self, body: &str) -> Result<String, BridgeError> {
        let script = scripts::wrap(body);
        tracing::debug!("eval: {body}");
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "to_eval": script }))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Transport(format!("HTTP {status}")));
        }
        parse_reply(&response.text()?)
    }

    fn eval_unit(&self, body: &str) -> Result<(), BridgeError> {
        self.eval(body).map(|_| ())
    }
}

impl HostBridge for HttpBridge {
    fn version(&mut self) -> Result<String, BridgeError> {
        self.eval(&scripts::version())
    }

    fn sequence_name(&mut self) -> Result<String, BridgeError> {
        self.eval(&scripts::sequence_name())
    }

    fn track_count(&mut self, kind: TrackKind) -> Result<usize, BridgeError> {
        parse_count(&self.eval(&scripts::track_count(kind))?)
    }

    fn track_name(&mut self, kind: TrackKind, track: usize) -> Result<String, BridgeError> {
        self.eval(&scripts::track_name(kind, track))
    }

    fn set_muted(&mut self, kind: TrackKind, track: usize, muted: bool) -> Result<(), BridgeError> {
        self.eval_unit(&scripts::set_muted(kind, track, muted))
    }

    fn is_muted(&mut self, kind: TrackKind, track: usize) -> Result<bool, BridgeError> {
        parse_bool(&self.eval(&scripts::is_muted(kind, track))?)
    }

    fn set_targeted(&mut self, kind: TrackKind, track: usize, targeted: bool) -> Result<(), BridgeError> {
        self.eval_unit(&scripts::set_targeted(kind, track, targeted))
    }

    fn execute_command(&mut self, name: &str) -> Result<(), BridgeError> {
        self.eval_unit(&scripts::execute_command(name))
    }

    fn clip_count(&mut self, kind: TrackKind, track: usize) -> Result<usize, BridgeError> {
        parse_count(&self.eval(&scripts::clip_count(kind, track))?)
    }

    fn set_clip_selected(
        &mut self,
        kind: TrackKind,
        track: usize,
        clip: usize,
        selected: bool,
    ) -> Result<(), BridgeError> {
        self.eval_unit(&scripts::set_clip_selected(kind, track, clip, selected))
    }

    fn razor(&mut self, kind: TrackKind, track: usize, seconds: f64) -> Result<(), BridgeError> {
        self.eval_unit(&scripts::razor(kind, track, seconds))
    }

    fn play(&mut self) -> Result<(), BridgeError> {
        self.eval_unit(&scripts::play())
    }

    fn stop(&mut self) -> Result<(), BridgeError> {
        self.eval_unit(&scripts::stop())
    }

    fn undo(&mut self) -> Result<(), BridgeError> {
        self.eval_unit(&scripts::undo())
    }
}

// ── Reply parsing ───────────────────────────────────────────────

/// Map the panel's text answer to a value or a classified error.
pub(crate) fn parse_reply(text: &str) -> Result<String, BridgeError> {
    let text = text.trim();
    if text == NO_SEQUENCE_MARKER {
        return Err(BridgeError::NoActiveSequence);
    }
    if let Some(what) = text.strip_prefix(UNSUPPORTED_MARKER) {
        return Err(BridgeError::Unsupported(what.to_string()));
    }
    if let Some(err) = text.strip_prefix(ERR_MARKER) {
        if err.contains("is not a function") || err.contains("undefined is not an object") {
            return Err(BridgeError::Unsupported(err.to_string()));
        }
        return Err(BridgeError::Host(err.to_string()));
    }
    Ok(text.to_string())
}

fn parse_count(text: &str) -> Result<usize, BridgeError> {
    text.trim()
        .parse()
        .map_err(|_| BridgeError::Host(format!("expected a count, got \"{text}\"")))
}

fn parse_bool(text: &str) -> Result<bool, BridgeError> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(BridgeError::Host(format!("expected a boolean, got \"{other}\""))),
    }
}

// ── Script generation ───────────────────────────────────────────

/// Pure ExtendScript generators. Each returns a function body; `wrap` turns it
/// into a self-invoking expression the panel evaluates.
pub(crate) mod scripts {
    use crate::model::TrackKind;

    use super::{ERR_MARKER, NO_SEQUENCE_MARKER, UNSUPPORTED_MARKER};

    const SEQ: &str = "var seq = app.project.activeSequence;";

    pub fn wrap(body: &str) -> String {
        format!(
            "(function(){{try{{{body}}}catch(e){{return '{ERR_MARKER}' + e.toString();}}}})()"
        )
    }

    fn with_sequence(body: &str) -> String {
        format!("{SEQ} if (!seq) {{ return '{NO_SEQUENCE_MARKER}'; }} {body}")
    }

    fn collection(kind: TrackKind) -> &'static str {
        match kind {
            TrackKind::Video => "seq.videoTracks",
            TrackKind::Audio => "seq.audioTracks",
        }
    }

    fn qe_track(kind: TrackKind, track: usize) -> String {
        match kind {
            TrackKind::Video => format!("qe.project.getActiveSequence().getVideoTrackAt({track})"),
            TrackKind::Audio => format!("qe.project.getActiveSequence().getAudioTrackAt({track})"),
        }
    }

    fn flag(b: bool) -> u8 {
        u8::from(b)
    }

    pub fn version() -> String {
        "if (!app.project) { return '!ERR:no open project'; } return app.version;".to_string()
    }

    pub fn sequence_name() -> String {
        with_sequence("return seq.name;")
    }

    pub fn track_count(kind: TrackKind) -> String {
        with_sequence(&format!("return {}.numTracks;", collection(kind)))
    }

    pub fn track_name(kind: TrackKind, track: usize) -> String {
        with_sequence(&format!("return {}[{track}].name;", collection(kind)))
    }

    pub fn set_muted(kind: TrackKind, track: usize, muted: bool) -> String {
        with_sequence(&format!(
            "{}[{track}].setMute({}); return 'ok';",
            collection(kind),
            flag(muted)
        ))
    }

    pub fn is_muted(kind: TrackKind, track: usize) -> String {
        with_sequence(&format!(
            "return {}[{track}].isMuted() ? 'true' : 'false';",
            collection(kind)
        ))
    }

    pub fn set_targeted(kind: TrackKind, track: usize, targeted: bool) -> String {
        with_sequence(&format!(
            "{}[{track}].setTargeted({targeted}, true); return 'ok';",
            collection(kind)
        ))
    }

    pub fn execute_command(name: &str) -> String {
        let quoted = serde_json::Value::String(name.to_string()).to_string();
        format!(
            "if (typeof app.executeCommand !== 'function') {{ return '{UNSUPPORTED_MARKER}app.executeCommand'; }} \
             app.executeCommand({quoted}); return 'ok';"
        )
    }

    pub fn clip_count(kind: TrackKind, track: usize) -> String {
        with_sequence(&format!("return {}[{track}].clips.numItems;", collection(kind)))
    }

    pub fn set_clip_selected(kind: TrackKind, track: usize, clip: usize, selected: bool) -> String {
        with_sequence(&format!(
            "{}[{track}].clips[{clip}].setSelected({}, 1); return 'ok';",
            collection(kind),
            flag(selected)
        ))
    }

    /// Razor through the QE DOM, which takes a timecode in the sequence's own
    /// frame rate and display format.
    pub fn razor(kind: TrackKind, track: usize, seconds: f64) -> String {
        with_sequence(&format!(
            "app.enableQE(); var t = new Time(); t.seconds = {seconds}; \
             var s = seq.getSettings(); \
             {}.razor(t.getFormatted(s.videoFrameRate, s.videoDisplayFormat)); return 'ok';",
            qe_track(kind, track)
        ))
    }

    pub fn play() -> String {
        "app.enableQE(); qe.project.getActiveSequence().player.play(1); return 'ok';".to_string()
    }

    pub fn stop() -> String {
        "app.enableQE(); qe.project.getActiveSequence().player.stop(); return 'ok';".to_string()
    }

    pub fn undo() -> String {
        "app.enableQE(); qe.project.undo(); return 'ok';".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn reply_classification() {
        assert_eq!(parse_reply(" 3 \n").unwrap(), "3");
        assert_eq!(parse_reply("!NOSEQ"), Err(BridgeError::NoActiveSequence));
        assert!(matches!(
            parse_reply("!ERR:TypeError: track.setMute is not a function"),
            Err(BridgeError::Unsupported(_))
        ));
        assert!(matches!(
            parse_reply("!ERR:undefined is not an object"),
            Err(BridgeError::Unsupported(_))
        ));
        assert!(matches!(
            parse_reply("!UNSUPPORTED:app.executeCommand"),
            Err(BridgeError::Unsupported(w)) if w == "app.executeCommand"
        ));
        assert_eq!(
            parse_reply("!ERR:Index out of bounds"),
            Err(BridgeError::Host("Index out of bounds".into()))
        );
    }

    #[test]
    fn bridge_errors_become_edit_errors() {
        assert_eq!(EditError::from(BridgeError::NoActiveSequence), EditError::NoActiveSequence);
        assert_eq!(
            EditError::from(BridgeError::Host("boom".into())).code(),
            "backend"
        );
    }

    #[test]
    fn scripts_are_wrapped_and_guarded() {
        let script = scripts::wrap(&scripts::set_muted(TrackKind::Audio, 1, true));
        assert!(script.starts_with("(function(){try{"));
        assert!(script.contains("seq.audioTracks[1].setMute(1)"));
        assert!(script.contains("return '!NOSEQ'"));
        assert!(script.ends_with("})()"));
    }

    #[test]
    fn razor_targets_qe_track() {
        let script = scripts::razor(TrackKind::Video, 0, 10.0);
        assert!(script.contains("getVideoTrackAt(0).razor("));
        assert!(script.contains("t.seconds = 10;"));
    }

    #[test]
    fn execute_command_quotes_name() {
        let script = scripts::execute_command("Toggle\"Mute");
        assert!(script.contains(r#"app.executeCommand("Toggle\"Mute")"#));
        assert!(script.contains("!UNSUPPORTED:"));
    }

    #[test]
    fn scalar_parsers() {
        assert_eq!(parse_count("4").unwrap(), 4);
        assert!(parse_count("four").is_err());
        assert!(parse_bool("true").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
