//! bpi - buildpack install planner and executor
//!
//! Plans a batch of buildpack artifacts against the stored buildpacks, then
//! runs one install job per plan.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{CommandResult, InstallSummary, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use bpi_config::Config;
use bpi_events::{AppEvent, EventEmitter, EventReceiver, EventSender, GeneralEvent};
use bpi_install::{
    BatchPlanner, BlobstoreUploader, InstallExecutor, InstallJob, InstallPlanner, InstallRequest,
};
use bpi_stack::{ManifestStackExtractor, StackExtractor};
use bpi_state::StateManager;
use bpi_store::BlobStore;
use bpi_types::{ColorChoice, InstallOptions, OutputFormat};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting bpi v{}", env!("CARGO_PKG_VERSION"));

    // file, then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);

    let json_output = config.general.default_output == OutputFormat::Json;
    let color = config.general.color;
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };

    let (event_sender, event_receiver) = bpi_events::channel();
    let mut event_handler = EventHandler::new(colors_enabled, json_output);

    let result = execute_command_with_events(
        cli.command,
        &config,
        event_sender,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    OutputRenderer::new(json_output, color).render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute a command while draining its events
async fn execute_command_with_events(
    command: Commands,
    config: &Config,
    event_sender: EventSender,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, config, event_sender));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(message) = event_receiver.try_recv() {
                    event_handler.handle_event(&message);
                }
                return result;
            }

            message = event_receiver.recv() => {
                if let Some(message) = message {
                    event_handler.handle_event(&message);
                }
            }
        }
    }
}

async fn execute_command(
    command: Commands,
    config: &Config,
    events: EventSender,
) -> Result<CommandResult, CliError> {
    match command {
        Commands::Install {
            name,
            options,
            files,
        } => {
            let summaries = install(config, &events, &name, options.to_options(), files).await?;
            Ok(CommandResult::Installed(summaries))
        }
        Commands::List { name } => {
            let state = open_state(config, &events).await?;
            let buildpacks = match name {
                Some(name) => state.find_by_name(&name).await?,
                None => state.list().await?,
            };
            Ok(CommandResult::Buildpacks(buildpacks))
        }
        Commands::Stack { file } => {
            let stack = ManifestStackExtractor.extract(&file).await;
            Ok(CommandResult::Stack { file, stack })
        }
    }
}

async fn install(
    config: &Config,
    events: &EventSender,
    name: &str,
    options: InstallOptions,
    files: Vec<PathBuf>,
) -> Result<Vec<InstallSummary>, CliError> {
    events.emit(AppEvent::General(GeneralEvent::OperationStarted {
        operation: format!("install {name}"),
    }));

    let state = open_state(config, events).await?;
    let extractor: Arc<dyn StackExtractor> = Arc::new(ManifestStackExtractor);
    let blobstore = BlobStore::new(config.blobstore_path());
    let uploader = Arc::new(BlobstoreUploader::new(
        state.clone(),
        blobstore,
        extractor.clone(),
    ));
    let planner =
        InstallPlanner::new(state.clone(), extractor.clone()).with_event_sender(events.clone());
    let executor = InstallExecutor::new(state, extractor, uploader).with_event_sender(events.clone());

    let requests: Vec<InstallRequest> = files
        .into_iter()
        .map(|file| InstallRequest::new(name, file).with_options(options.clone()))
        .collect();
    let plans = match BatchPlanner::new(&planner).plan_all(&requests).await {
        Ok(plans) => plans,
        Err(e) => {
            events.emit(AppEvent::General(GeneralEvent::OperationFailed {
                operation: format!("install {name}"),
                error: e.to_string(),
            }));
            return Err(e.into());
        }
    };

    let max_attempts = config.jobs.buildpack_installer.max_attempts;
    let mut summaries = Vec::with_capacity(plans.len());
    for plan in plans {
        let job = InstallJob::new(plan, executor.clone()).with_max_attempts(max_attempts);
        events.emit_debug(format!(
            "running {} for {} (max attempts {})",
            job.job_name(),
            job.plan().filename(),
            job.max_attempts()
        ));
        let outcome = job.perform().await?;
        summaries.push(InstallSummary {
            name: job.plan().name.clone(),
            filename: job.plan().filename(),
            action: job.plan().action,
            outcome,
        });
    }

    events.emit(AppEvent::General(GeneralEvent::OperationCompleted {
        operation: format!("install {name}"),
        success: true,
    }));
    Ok(summaries)
}

async fn open_state(config: &Config, events: &EventSender) -> Result<StateManager, CliError> {
    let db_path = config.db_path();
    ensure_parent_dir(&db_path).await?;
    let state = StateManager::open(&db_path).await?;
    Ok(state.with_event_sender(events.clone()))
}

async fn ensure_parent_dir(path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// CLI flags override everything
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) {
    if global.json {
        config.general.default_output = OutputFormat::Json;
    }
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if let Some(db) = &global.db {
        config.paths.db_path = Some(db.clone());
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let filter = |default: &str| {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
    };

    if json_mode {
        // Keep stdout clean for the JSON result
        if debug_enabled {
            tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(filter("info,bpi=debug"))
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_writer(std::io::sink)
                .with_env_filter("off")
                .init();
        }
    } else if debug_enabled {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter("info,bpi=debug"))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter("warn"))
            .init();
    }
}
