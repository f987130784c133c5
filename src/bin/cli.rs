// CLI binary: panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::io::Read;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use voxedit::dispatcher::{BatchResult, CommandDispatcher, CommandOutcome, CommandRequest};
use voxedit::registry::catalog;
use voxedit::settings::{self, AppSettings};
use voxedit::{paths, state, upstream};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "voxedit-cli", about = "voxedit headless CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config directory override
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Run against the emulated timeline without probing the editor
    #[arg(long, global = true)]
    emulate: bool,

    /// Editor bridge URL override
    #[arg(long, global = true)]
    bridge_url: Option<String>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one command by name, e.g. `run cut --params '{"begin_time":"00:00:10"}'`
    Run {
        name: String,
        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Run a JSON file holding a list of commands (`-` reads stdin)
    Batch { file: String },
    /// Turn a sentence into commands through the upstream generator and run them
    Prompt { text: String },
    /// Show the tracks of the active sequence
    Tracks,
    /// List commands (optionally filtered by category or command name)
    Commands { topic: Option<String> },
    /// Write the effective settings, including --emulate/--bridge-url, to the config directory
    Init,
    /// Mute an audio track
    Mute { track: i64 },
    /// Unmute an audio track
    Unmute { track: i64 },
    /// Hide a video track
    Hide { track: i64 },
    /// Show a video track
    Show { track: i64 },
    /// Razor a track at one time, or at two
    Cut {
        /// "video" or "audio"
        #[arg(long, default_value = "video")]
        track_type: String,
        #[arg(long, default_value_t = 1)]
        track: i64,
        /// HH:MM:SS
        begin: String,
        /// HH:MM:SS
        end: Option<String>,
    },
    /// Deselect every clip on every track
    DeselectAll,
    /// Undo the editor's last action
    Undo,
}

fn load_settings(cli: &Cli) -> (AppSettings, PathBuf) {
    let app_config_dir = cli.config_dir.clone().unwrap_or_else(paths::default_config_dir);
    let mut settings = settings::load_or_default(&app_config_dir);
    settings.force_emulation |= cli.emulate;
    if let Some(url) = &cli.bridge_url {
        settings.bridge.url.clone_from(url);
    }
    (settings, app_config_dir)
}

/// Shortcut subcommands expressed as the request the upstream generator would send.
fn shortcut_request(cmd: &Commands) -> Option<CommandRequest> {
    let request = match cmd {
        Commands::Mute { track } => CommandRequest::new("mute_audio", json!({ "track_index": track })),
        Commands::Unmute { track } => {
            CommandRequest::new("unmute_audio", json!({ "track_index": track }))
        }
        Commands::Hide { track } => CommandRequest::new("hide_video", json!({ "track_index": track })),
        Commands::Show { track } => CommandRequest::new("show_video", json!({ "track_index": track })),
        Commands::Cut {
            track_type,
            track,
            begin,
            end,
        } => CommandRequest::new(
            "cut",
            json!({
                "track_type": track_type,
                "track_index": track,
                "begin_time": begin,
                "end_time": end.as_deref().unwrap_or("-1"),
            }),
        ),
        Commands::DeselectAll => CommandRequest::new("deselect_all_tracks", Value::Null),
        Commands::Undo => CommandRequest::new("undo", Value::Null),
        _ => return None,
    };
    Some(request)
}

fn read_batch(file: &str) -> Vec<Value> {
    let text = if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
            eprintln!("Failed to read stdin: {e}");
            process::exit(1);
        });
        buf
    } else {
        std::fs::read_to_string(file).unwrap_or_else(|e| {
            eprintln!("Failed to read {file}: {e}");
            process::exit(1);
        })
    };
    upstream::parse_command_list(&text).unwrap_or_else(|e| {
        eprintln!("Invalid batch file: {e}");
        process::exit(1);
    })
}

// ── Output formatting ────────────────────────────────────────────

fn print_outcome(outcome: &CommandOutcome) {
    let tag = if outcome.is_success() { "ok" } else { "error" };
    println!("[{tag}] {}", outcome.message);
    for warning in &outcome.warnings {
        println!("    warning: {warning}");
    }
}

fn print_batch(result: &BatchResult, raw_json: bool) {
    if raw_json {
        println!("{}", serde_json::to_string_pretty(result).unwrap_or_default());
        return;
    }
    for (i, outcome) in result.results.iter().enumerate() {
        print!("{:>2}. ", i + 1);
        print_outcome(outcome);
    }
    if result.results.is_empty() {
        println!("No commands.");
    }
}

fn exit_for(result: &BatchResult) -> ! {
    process::exit(i32::from(result.failed() > 0));
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Catalog lookups never touch the editor.
    if let Commands::Commands { topic } = &cli.command {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&catalog::to_json_schema()).unwrap());
        } else {
            println!("{}", catalog::help_text(topic.as_deref()));
        }
        return;
    }

    let (settings, app_config_dir) = load_settings(&cli);

    if let Commands::Init = &cli.command {
        if let Err(e) = settings::save_settings(&app_config_dir, &settings) {
            eprintln!("Failed to write settings: {e}");
            process::exit(1);
        }
        println!("Wrote {}", paths::settings_path(&app_config_dir).display());
        return;
    }

    let mut dispatcher: CommandDispatcher = state::build_dispatcher(&settings, &app_config_dir);
    eprintln!("[voxedit] Backend: {:?}", dispatcher.mode());

    if let Some(request) = shortcut_request(&cli.command) {
        let result = dispatcher.execute_requests(&[request], "cli");
        print_batch(&result, cli.json);
        exit_for(&result);
    }

    match &cli.command {
        Commands::Run { name, params } => {
            let parameters: Value = serde_json::from_str(params).unwrap_or_else(|e| {
                eprintln!("--params is not valid JSON: {e}");
                process::exit(1);
            });
            let result = dispatcher.execute_requests(&[CommandRequest::new(name, parameters)], "cli");
            print_batch(&result, cli.json);
            exit_for(&result);
        }
        Commands::Batch { file } => {
            let entries = read_batch(file);
            let result = dispatcher.execute_batch(&entries, "cli");
            print_batch(&result, cli.json);
            exit_for(&result);
        }
        Commands::Prompt { text } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to start async runtime");
            let client = reqwest::Client::new();
            let entries = runtime
                .block_on(upstream::generate_commands(&client, &settings.upstream, text))
                .unwrap_or_else(|e| {
                    eprintln!("{e}");
                    process::exit(1);
                });
            // The live bridge is blocking, so the batch runs outside the runtime.
            drop(runtime);
            if !cli.json {
                println!("Generated {} command(s):", entries.len());
                for entry in &entries {
                    println!("    {entry}");
                }
            }
            let result = dispatcher.execute_batch(&entries, "prompt");
            print_batch(&result, cli.json);
            exit_for(&result);
        }
        Commands::Tracks => match dispatcher.tracks_info() {
            Ok(info) if cli.json => {
                println!("{}", serde_json::to_string_pretty(&info).unwrap_or_default());
            }
            Ok(info) => println!("{}", info.describe()),
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Unhandled subcommand");
            process::exit(2);
        }
    }
}
