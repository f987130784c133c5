use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use voxedit::api;
use voxedit::paths;
use voxedit::settings;
use voxedit::state::{self, AppState};

#[derive(Parser)]
#[command(name = "voxedit", about = "Voice command engine for the video editor timeline", version)]
struct Args {
    /// Config directory override
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Run against the emulated timeline without probing the editor
    #[arg(long)]
    emulate: bool,

    /// Editor bridge URL override
    #[arg(long)]
    bridge_url: Option<String>,

    /// Listen port override
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let app_config_dir = args.config_dir.unwrap_or_else(paths::default_config_dir);
    let mut settings = settings::load_or_default(&app_config_dir);
    settings.force_emulation |= args.emulate;
    if let Some(url) = args.bridge_url {
        settings.bridge.url = url;
    }
    if let Some(port) = args.port {
        settings.api.port = port;
    }

    // The probe uses a blocking client, so it runs before the async runtime exists.
    let dispatcher = state::build_dispatcher(&settings, &app_config_dir);
    tracing::info!("Backend mode: {:?}", dispatcher.mode());
    let state = Arc::new(AppState::new(dispatcher, settings, app_config_dir));

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(api::serve(state)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
