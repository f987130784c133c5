use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::dispatcher::{BatchResult, CommandDispatcher, CommandStatus};
use crate::model::BackendMode;
use crate::registry::catalog;
use crate::state::AppState;

// ── Response types ───────────────────────────────────────────────

#[derive(Serialize)]
struct ApiOk<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct ApiErr {
    status: CommandStatus,
    message: String,
}

fn ok_json<T: Serialize>(data: T) -> Response {
    Json(ApiOk { ok: true, data }).into_response()
}

fn err_json(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiErr {
            status: CommandStatus::Error,
            message: message.into(),
        }),
    )
        .into_response()
}

#[derive(Serialize)]
struct StatusInfo {
    mode: BackendMode,
    connected: bool,
}

#[derive(Deserialize)]
struct PromptRequest {
    text: String,
}

#[derive(Serialize)]
struct PromptResponse {
    prompt: String,
    commands: Vec<Value>,
    result: BatchResult,
    timings: PromptTimings,
}

/// Wall-clock milliseconds spent generating commands, executing them, and
/// handling the whole request.
#[derive(Debug, Serialize)]
struct PromptTimings {
    generation_ms: u64,
    execution_ms: u64,
    total_ms: u64,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn status_info(state: &AppState) -> StatusInfo {
    StatusInfo {
        mode: state.mode,
        connected: state.mode.is_connected(),
    }
}

// ── Dispatcher access ────────────────────────────────────────────

/// Run `f` against the dispatcher on the blocking pool; the live bridge uses a
/// blocking HTTP client.
async fn with_dispatcher_blocking<F, R>(state: &Arc<AppState>, f: F) -> Result<R, Response>
where
    F: FnOnce(&mut CommandDispatcher) -> R + Send + 'static,
    R: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || state.with_dispatcher_mut(f))
        .await
        .map_err(|e| {
            tracing::error!("Dispatcher task failed: {e}");
            err_json(StatusCode::INTERNAL_SERVER_ERROR, format!("internal error: {e}"))
        })
}

/// Accept either a bare list or `{"commands": [...]}`.
fn command_list(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(entries) => Some(entries),
        Value::Object(mut obj) => match obj.remove("commands") {
            Some(Value::Array(entries)) => Some(entries),
            _ => None,
        },
        _ => None,
    }
}

// ── Handlers ─────────────────────────────────────────────────────

async fn post_commands(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    let Some(entries) = command_list(body) else {
        return err_json(StatusCode::BAD_REQUEST, "expected a list of commands");
    };
    match with_dispatcher_blocking(&state, move |d| d.execute_batch(&entries, "api")).await {
        Ok(result) => Json(result).into_response(),
        Err(resp) => resp,
    }
}

async fn post_prompt(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<PromptRequest>,
) -> Response {
    let started = Instant::now();
    let commands =
        match crate::upstream::generate_commands(&state.http, &state.settings.upstream, &body.text)
            .await
        {
            Ok(commands) => commands,
            Err(e) => {
                tracing::warn!("Prompt failed: {e}");
                return err_json(StatusCode::BAD_GATEWAY, e);
            }
        };
    let generated = started.elapsed();
    let entries = commands.clone();
    let result =
        match with_dispatcher_blocking(&state, move |d| d.execute_batch(&entries, "prompt")).await {
            Ok(result) => result,
            Err(resp) => return resp,
        };
    let total = started.elapsed();
    tracing::info!(
        "Prompt handled in {} ms ({} ms generating)",
        millis(total),
        millis(generated)
    );
    Json(PromptResponse {
        prompt: body.text,
        commands,
        result,
        timings: PromptTimings {
            generation_ms: millis(generated),
            execution_ms: millis(total.saturating_sub(generated)),
            total_ms: millis(total),
        },
    })
    .into_response()
}

async fn get_tracks(Extension(state): Extension<Arc<AppState>>) -> Response {
    match with_dispatcher_blocking(&state, CommandDispatcher::tracks_info).await {
        Ok(Ok(info)) => ok_json(info),
        Ok(Err(e)) => err_json(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        Err(resp) => resp,
    }
}

async fn get_commands() -> Response {
    ok_json(catalog::to_json_schema())
}

async fn get_status(Extension(state): Extension<Arc<AppState>>) -> Response {
    ok_json(status_info(&state))
}

// ── Server startup ───────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/commands", post(post_commands).get(get_commands))
        .route("/api/prompt", post(post_prompt))
        .route("/api/tracks", get(get_tracks))
        .route("/api/status", get(get_status))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

/// Bind the configured address and serve until the process exits.
pub async fn serve(state: Arc<AppState>) -> Result<(), String> {
    let addr = state.settings.api.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;
    let local = listener
        .local_addr()
        .map_err(|e| format!("Failed to get API server address: {e}"))?;
    tracing::info!("API server listening on http://{local}");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| format!("API server error: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::dispatcher::CommandOutcome;
    use crate::settings::AppSettings;
    use serde_json::json;

    fn emulated_state() -> AppState {
        let settings = AppSettings {
            force_emulation: true,
            audit_log: false,
            ..AppSettings::default()
        };
        let dir = std::env::temp_dir().join("voxedit_test_api");
        AppState::new(crate::state::build_dispatcher(&settings, &dir), settings, dir)
    }

    #[test]
    fn status_is_answered_while_a_batch_holds_the_dispatcher() {
        let state = emulated_state();
        let _busy = state.dispatcher.lock();
        let info = status_info(&state);
        assert_eq!(info.mode, BackendMode::Emulated);
        assert!(!info.connected);
    }

    #[test]
    fn prompt_response_reports_timings() {
        let response = PromptResponse {
            prompt: "mute audio one".into(),
            commands: vec![json!({ "command": "mute_audio" })],
            result: BatchResult {
                status: CommandStatus::Success,
                results: vec![CommandOutcome::success(crate::registry::CommandOutput::new("ok"))],
            },
            timings: PromptTimings {
                generation_ms: millis(Duration::from_millis(1200)),
                execution_ms: millis(Duration::from_micros(40_500)),
                total_ms: 1240,
            },
        };
        let v = serde_json::to_value(&response).unwrap();
        assert_eq!(
            v["timings"],
            json!({ "generation_ms": 1200, "execution_ms": 40, "total_ms": 1240 })
        );
        assert_eq!(v["result"]["results"][0]["status"], "success");
    }

    #[test]
    fn command_list_shapes() {
        assert_eq!(command_list(json!([{ "command": "undo" }])).unwrap().len(), 1);
        assert_eq!(
            command_list(json!({ "commands": [{ "command": "undo" }, 1] })).unwrap().len(),
            2
        );
        assert!(command_list(json!({ "command": "undo" })).is_none());
        assert!(command_list(json!("undo")).is_none());
    }

    #[test]
    fn error_body_matches_outcome_shape() {
        let body = serde_json::to_value(ApiErr {
            status: CommandStatus::Error,
            message: "expected a list of commands".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "status": "error", "message": "expected a list of commands" })
        );
    }
}
