use schemars::schema_for;
use serde::Serialize;
use serde_json::Value;

use crate::error::EditError;

use super::{CommandCategory, CommandInfo};

/// A registry entry: metadata + JSON schema for the params.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRegistryEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub category: CommandCategory,
    pub requires_live: bool,
    pub param_schema: Value,
}

pub(super) fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

pub(super) fn schema_value<T: schemars::JsonSchema>() -> Value {
    let root = schema_for!(T);
    serde_json::to_value(root).unwrap_or(empty_object_schema())
}

pub(super) fn entry(info: CommandInfo, param_schema: Value) -> CommandRegistryEntry {
    CommandRegistryEntry {
        name: info.name,
        aliases: info.aliases,
        description: info.description,
        category: info.category,
        requires_live: info.requires_live,
        param_schema,
    }
}

/// Deserialize command parameters. A missing (null) parameter object counts as
/// empty; anything other than an object is rejected.
pub(super) fn de<T: serde::de::DeserializeOwned>(input: &Value) -> Result<T, EditError> {
    let object = match input {
        Value::Null => Value::Object(serde_json::Map::new()),
        Value::Object(_) => input.clone(),
        other => {
            return Err(EditError::invalid_parameter(
                "parameters",
                format!("expected an object, got {other}"),
            ))
        }
    };
    serde_json::from_value(object)
        .map_err(|e| EditError::invalid_parameter("parameters", e.to_string()))
}

/// The complete command registry, auto-generated from param struct schemas.
pub fn command_registry() -> Vec<CommandRegistryEntry> {
    super::Command::registry_entries()
}

/// Help text for command discovery.
/// Three tiers: no topic → categories, category → command list, command → full schema.
pub fn help_text(topic: Option<&str>) -> String {
    let registry = command_registry();

    match topic {
        None => {
            let mut lines = vec!["Available command categories:".to_string()];
            for cat in CommandCategory::all() {
                let count = registry.iter().filter(|e| e.category == *cat).count();
                if count > 0 {
                    lines.push(format!("  {} ({count}): {}", cat.slug(), cat.description()));
                }
            }
            lines.push(String::new());
            lines.push("Use `commands selection` to list commands in a category.".to_string());
            lines.push("Use `commands cut` for full parameter details.".to_string());
            lines.join("\n")
        }
        Some(topic) => {
            if let Some(entry) = registry
                .iter()
                .find(|e| e.name == topic || e.aliases.iter().any(|a| *a == topic))
            {
                let schema_str = serde_json::to_string_pretty(&entry.param_schema)
                    .unwrap_or_else(|_| "{}".to_string());
                let aliases = if entry.aliases.is_empty() {
                    String::new()
                } else {
                    format!(" | Aliases: {}", entry.aliases.join(", "))
                };
                return format!(
                    "{}: {}\nCategory: {} | Requires editor: {}{aliases}\n\nParameters:\n{}",
                    entry.name,
                    entry.description,
                    entry.category.slug(),
                    if entry.requires_live { "yes" } else { "no" },
                    schema_str,
                );
            }

            let cat_lower = topic.to_lowercase();
            let matching: Vec<&CommandRegistryEntry> = registry
                .iter()
                .filter(|e| e.category.slug() == cat_lower)
                .collect();

            if matching.is_empty() {
                format!("Unknown topic: \"{topic}\". Use `commands` to see categories.")
            } else {
                let mut lines = vec![format!("{topic} commands:")];
                for entry in &matching {
                    lines.push(format!("  - {}: {}", entry.name, entry.description));
                }
                lines.push(String::new());
                lines.push("Use `commands <command_name>` for parameter details.".to_string());
                lines.join("\n")
            }
        }
    }
}

/// JSON Schema formatted command list (for REST).
pub fn to_json_schema() -> Value {
    Value::Array(
        command_registry()
            .iter()
            .map(|e| {
                serde_json::json!({
                    "name": e.name,
                    "aliases": e.aliases,
                    "description": e.description,
                    "category": e.category,
                    "requires_live": e.requires_live,
                    "inputSchema": e.param_schema,
                })
            })
            .collect(),
    )
}
