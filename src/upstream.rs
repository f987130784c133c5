//! Client for the upstream command generator: a service that turns a
//! transcript into a JSON list of `{command, parameters}` entries.

use serde::Serialize;
use serde_json::Value;

use crate::settings::UpstreamSettings;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    model: &'a str,
}

/// Ask the generator for the command list matching `prompt`.
///
/// # Errors
/// Returns an error string on transport failure, a non-2xx status, or a reply
/// that does not contain a JSON list.
pub async fn generate_commands(
    client: &reqwest::Client,
    settings: &UpstreamSettings,
    prompt: &str,
) -> Result<Vec<Value>, String> {
    let url = format!("{}/api/generate", settings.url.trim_end_matches('/'));
    tracing::info!("Requesting commands from {url} ({})", settings.model);

    let response = client
        .post(&url)
        .json(&GenerateRequest {
            prompt,
            model: &settings.model,
        })
        .send()
        .await
        .map_err(|e| format!("Generator request failed: {e}"))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(format!("Generator error {status}: {text}"));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse generator reply: {e}"))?;
    let text = body
        .get("response")
        .and_then(Value::as_str)
        .ok_or("Generator reply has no \"response\" text")?;
    let commands = parse_command_list(text)?;
    tracing::info!("Generator produced {} command(s)", commands.len());
    Ok(commands)
}

/// Parse the generator's text into raw batch entries. A ```json fence is
/// stripped; entries are passed through untouched, so malformed ones surface
/// later as per-command errors.
pub fn parse_command_list(text: &str) -> Result<Vec<Value>, String> {
    let json = crate::util::strip_code_fence(text);
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(Value::Object(mut obj)) => match obj.remove("commands") {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err("Generator reply is an object without a \"commands\" list".to_string()),
        },
        Ok(other) => Err(format!("Generator reply is not a list: {other}")),
        Err(e) => Err(format!("Generator reply is not JSON: {e}")),
    }
}
