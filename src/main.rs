use std::{
    io::{self, Write},
    panic,
    str::FromStr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::Show,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    style::ResetColor,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};
use tracing::{info, warn};
use tuirealm::{
    PollStrategy,
    terminal::{CrosstermTerminalAdapter, TerminalBridge},
};

use teamboard::{
    api::GraphqlClient,
    app::App,
    cli::{self, RootCommand, format_error_chain},
    logging::{init_logging, print_log_location},
    realm::{RootId, apply_message, init_application, should_quit, shutdown},
    settings::{Settings, TOKEN_ENV},
    theme::ThemePreset,
    types::ProjectId,
};

#[derive(Parser, Debug)]
#[command(
    name = "teamboard",
    about = "Terminal kanban board for team projects",
    long_about = "A TUI kanban board with drag-and-drop status changes, optimistic updates and a live activity panel.",
    version = env!("TEAMBOARD_BUILD_VERSION"),
    author
)]
struct Cli {
    #[arg(short, long, global = true, value_name = "PROJECT_ID")]
    project: Option<String>,

    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    #[arg(long, global = true, value_name = "TOKEN")]
    token: Option<String>,

    #[arg(long, value_name = "PRESET")]
    theme: Option<String>,

    #[arg(long = "read-only")]
    read_only: bool,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<RootCommand>,
}

enum RunOutcome {
    Continue,
    Exit(i32),
}

static TERMINAL_RESTORED: AtomicBool = AtomicBool::new(false);

#[tokio::main]
async fn main() -> Result<()> {
    let log = match init_logging() {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: failed to initialize logging: {err}");
            None
        }
    };
    let log_path = log.as_ref().map(|handle| handle.path.clone());
    if let Some(path) = log_path.as_ref() {
        install_panic_hook_with_log(path.clone());
    }

    let outcome = run_app().await;
    if let Some(path) = log_path.as_ref() {
        print_log_location(path);
    }
    drop(log);

    match outcome {
        Ok(RunOutcome::Continue) => Ok(()),
        Ok(RunOutcome::Exit(code)) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {}", format_error_chain(&err));
            std::process::exit(1);
        }
    }
}

async fn run_app() -> Result<RunOutcome> {
    let cli = Cli::parse();

    let Some(raw_project) = cli.project.as_deref() else {
        eprintln!("error[PROJECT_REQUIRED]: --project is required");
        return Ok(RunOutcome::Exit(2));
    };
    let Ok(project_id) = ProjectId::from_str(raw_project.trim()) else {
        eprintln!("error[INVALID_PROJECT_ID]: '{raw_project}' is not a project id");
        return Ok(RunOutcome::Exit(2));
    };

    let mut settings = Settings::load();
    match settings.save_if_missing() {
        Ok(true) => info!("wrote default settings file"),
        Ok(false) => {}
        Err(err) => warn!(error = %err, "failed to write default settings file"),
    }
    settings.apply_env(|key| std::env::var(key).ok());
    if let Some(endpoint) = cli.endpoint.as_deref() {
        settings.endpoint = endpoint.trim().to_string();
    }
    if let Some(theme) = cli.theme.as_deref() {
        match ThemePreset::from_str(theme) {
            Ok(preset) => settings.theme = preset.as_str().to_string(),
            Err(()) => eprintln!("warning: unknown theme '{theme}', keeping {}", settings.theme),
        }
    }
    if cli.read_only {
        settings.can_edit = false;
    }

    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var(TOKEN_ENV).ok())
        .filter(|token| !token.trim().is_empty());
    let client = GraphqlClient::new(settings.client_config(token))
        .context("failed to build GraphQL client")?;
    let api = Arc::new(client);
    info!(endpoint = %api.endpoint(), project_id = %project_id, "teamboard starting");

    if let Some(command) = cli.command {
        let code = cli::run(api, project_id, command, cli.json, cli.quiet).await;
        return Ok(RunOutcome::Exit(code));
    }

    run_tui(api, project_id, &settings)?;
    Ok(RunOutcome::Continue)
}

fn run_tui(api: Arc<GraphqlClient>, project_id: ProjectId, settings: &Settings) -> Result<()> {
    let _guard = TerminalGuard;
    let mut terminal = setup_terminal()?;

    let app = Arc::new(Mutex::new(App::new(api, project_id, settings)));
    let mut realm = init_application(Arc::clone(&app))?;

    let mut redraw = true;
    while !should_quit(&app)? {
        if redraw {
            terminal
                .draw(|frame| realm.view(&RootId::Root, frame, frame.area()))
                .context("failed to render frame")?;
            redraw = false;
        }

        let messages = realm
            .tick(PollStrategy::Once)
            .context("failed to process tui-realm tick")?;

        if !messages.is_empty() {
            redraw = true;
        }

        for message in messages {
            apply_message(&app, message)?;
        }
    }

    shutdown(&app)?;

    let _ = execute!(io::stdout(), DisableMouseCapture);
    let _ = terminal.disable_raw_mode();
    let _ = terminal.leave_alternate_screen();
    let _ = terminal.clear_screen();
    TERMINAL_RESTORED.store(true, Ordering::SeqCst);

    Ok(())
}

fn setup_terminal() -> Result<TerminalBridge<CrosstermTerminalAdapter>> {
    TERMINAL_RESTORED.store(false, Ordering::SeqCst);

    let mut terminal =
        TerminalBridge::new_crossterm().context("failed to initialize terminal bridge")?;

    terminal
        .enable_raw_mode()
        .context("failed to enable raw mode")?;
    terminal
        .enter_alternate_screen()
        .context("failed to enter alternate screen")?;
    execute!(io::stdout(), EnableMouseCapture).context("failed to enable mouse capture")?;

    Ok(terminal)
}

fn install_panic_hook_with_log(log_path: std::path::PathBuf) {
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        print_log_location(&log_path);
        previous_hook(panic_info);
    }));
}

fn restore_terminal() -> Result<()> {
    if TERMINAL_RESTORED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let _ = disable_raw_mode();

    let mut stderr = io::stderr();
    let _ = execute!(
        stderr,
        LeaveAlternateScreen,
        DisableMouseCapture,
        Show,
        ResetColor
    );
    let _ = stderr.write_all(
        b"\x1b[?1049l\x1b[?1000l\x1b[?1002l\x1b[?1003l\x1b[?1006l\x1b[?1015l\x1b[?25h\x1b[0m",
    );
    let _ = stderr.flush();

    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}
