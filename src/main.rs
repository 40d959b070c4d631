//! Pomodoro Engine CLI
//!
//! Runs the Pomodoro technique in the terminal:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break after every 4 focus sessions

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};

use pomodoro_engine::cli::{parse_line, Cli, Commands, Display, LineCommand, SettingsCommand};
use pomodoro_engine::storage::{self, FileStorage, Storage};
use pomodoro_engine::{
    SettingsStore, SystemClock, TerminalBell, TimerEngine, TimerHandle, TimerMode, TimerService,
    TimerState,
};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let data_dir = cli.data_dir;
    let open = || open_storage(data_dir.as_deref());

    match cli.command {
        Some(Commands::Run) => {
            run_interactive(open()?).await?;
        }
        Some(Commands::Status) => {
            let engine = TimerEngine::new(open()?, Arc::new(SystemClock));
            Display::show_status(engine.state());
        }
        Some(Commands::Settings {
            action: SettingsCommand::Show,
        }) => {
            let store = SettingsStore::load(open()?);
            Display::show_settings(store.current());
        }
        Some(Commands::Settings {
            action: SettingsCommand::Set(args),
        }) => {
            let patch = args.to_patch();
            if patch.is_empty() {
                anyhow::bail!("No settings given (see `settings set --help`)");
            }
            // Through the engine so an idle countdown follows the new duration.
            let mut engine = TimerEngine::new(open()?, Arc::new(SystemClock));
            let settings = engine.update_settings(&patch);
            Display::show_settings(&settings);
        }
        Some(Commands::Reset) => {
            storage::clear_all(open()?.as_ref());
            Display::show_reset();
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Opens file storage in `data_dir`, or the default location.
fn open_storage(data_dir: Option<&Path>) -> Result<Arc<dyn Storage>> {
    let storage = match data_dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::open_default().context("Failed to locate a data directory")?,
    };
    tracing::debug!("Using data directory {:?}", storage.root());
    Ok(Arc::new(storage))
}

/// Runs the timer service and reads commands from stdin until `quit`,
/// end of input, or Ctrl-C.
async fn run_interactive(storage: Arc<dyn Storage>) -> Result<()> {
    let mut engine = TimerEngine::new(storage, Arc::new(SystemClock)).with_sound(TerminalBell);
    engine.add_listener(|mode: TimerMode| Display::show_completion(mode));

    let (handle, task) = TimerService::spawn(engine);
    let mut state_rx = handle.subscribe_state();
    let initial = state_rx.borrow_and_update().clone();
    let mut shown = (initial.mode, initial.status);

    Display::show_state_line(&initial);
    Display::show_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(LineCommand::Quit)) => break,
                    Ok(Some(command)) => {
                        if let Some(state) = handle_line(&handle, command).await? {
                            shown = (state.mode, state.status);
                            Display::show_state_line(&state);
                        }
                    }
                    Err(message) => Display::show_error(&message),
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                // Only transitions the user did not trigger, e.g. expiry.
                let state = state_rx.borrow_and_update().clone();
                if (state.mode, state.status) != shown {
                    shown = (state.mode, state.status);
                    Display::show_state_line(&state);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Err(e) = handle.shutdown().await {
        tracing::debug!("Shutdown after service exit: {}", e);
    }
    task.await.context("Timer service task failed")?;
    Ok(())
}

/// Executes one interactive command, returning the new state if it changed
/// the timer.
async fn handle_line(handle: &TimerHandle, command: LineCommand) -> Result<Option<TimerState>> {
    let state = match command {
        LineCommand::Start => Some(handle.start().await?),
        LineCommand::Pause => Some(handle.pause().await?),
        LineCommand::Complete => {
            let (_mode, state) = handle.complete().await?;
            Some(state)
        }
        LineCommand::Reset => {
            let state = handle.reset().await?;
            Display::show_reset();
            Some(state)
        }
        LineCommand::Set(patch) => {
            let settings = handle.update_settings(patch).await?;
            Display::show_settings(&settings);
            None
        }
        LineCommand::Status => {
            Display::show_status(&handle.state());
            None
        }
        LineCommand::Settings => {
            Display::show_settings(&handle.settings());
            None
        }
        LineCommand::Help | LineCommand::Quit => {
            Display::show_help();
            None
        }
    };
    Ok(state)
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
