mod api;
mod app;
mod config;
mod events;
mod markdown;
mod models;
mod ui;
mod workflow;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use api::{Endpoints, InspectionClient};
use app::App;
use events::AppEvent;
use models::{AppConfig, SelectedFile};
use workflow::{Inspector, Severity};

#[derive(Parser, Debug)]
#[command(name = "khda-inspector")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Document to preselect in the inspector
    file: Option<PathBuf>,

    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Args, Debug, Clone)]
struct ConnectionArgs {
    /// Override the API base URL from the config file
    #[arg(long)]
    api_base: Option<String>,

    /// Path to an alternative config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a document without the terminal interface
    Inspect {
        file: PathBuf,

        /// Print the analysis as HTML instead of markdown
        #[arg(long)]
        html: bool,

        /// Also generate the inspection report and print its download link
        #[arg(long)]
        report: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Inspect {
            file,
            html,
            report,
            connection,
        }) => run_inspect(&connection, &file, html, report).await,
        None => run_interactive(&cli.connection, cli.file.as_deref()),
    }
}

fn load_settings(connection: &ConnectionArgs) -> Result<AppConfig> {
    let path = match &connection.config {
        Some(path) => path.clone(),
        None => config::get_config_path()?,
    };
    let mut config = config::load_config(&path)?;

    if let Some(base) = &connection.api_base {
        config.api_base_url.clone_from(base);
    }

    Ok(config)
}

/// Log to `log_file` when given (the terminal UI owns the screen), else stderr
fn init_logging(config: &AppConfig, log_file: Option<&Path>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => log_filter(&config.log_level)?,
    };

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    Ok(())
}

fn log_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("Invalid log level {level:?}"))
}

/// Everything the inspector needs is validated before the terminal is touched
fn connect(config: &AppConfig) -> Result<(Endpoints, InspectionClient)> {
    let endpoints = Endpoints::new(&config.api_base_url)?;
    let client = InspectionClient::new(endpoints.clone(), config.request_timeout)?;
    tracing::info!(api = %config.api_base_url, "inspection API configured");
    Ok((endpoints, client))
}

fn fail_on_error(inspector: &Inspector) -> Result<()> {
    match inspector.status() {
        Some(status) if status.severity == Severity::Error => {
            anyhow::bail!("{}", status.message)
        }
        _ => Ok(()),
    }
}

async fn run_inspect(connection: &ConnectionArgs, file: &Path, html: bool, report: bool) -> Result<()> {
    let config = load_settings(connection)?;
    init_logging(&config, None)?;
    let (endpoints, client) = connect(&config)?;

    let mut inspector = Inspector::new(endpoints);
    inspector.select_file(Some(SelectedFile::from_path(file)?));

    inspector.analyze(&client).await;
    fail_on_error(&inspector)?;

    if html {
        println!("{}", inspector.analysis_html());
    } else {
        println!("{}", inspector.analysis_text());
    }

    if report {
        inspector.generate_report(&client).await;
        fail_on_error(&inspector)?;

        match inspector.download_url() {
            Some(url) => {
                println!();
                println!("Report: {url}");
            }
            None => tracing::warn!("report generated without a filename"),
        }
    }

    Ok(())
}

fn run_interactive(connection: &ConnectionArgs, file: Option<&Path>) -> Result<()> {
    let config = load_settings(connection)?;
    init_logging(&config, Some(&config::get_log_path()?))?;
    let (endpoints, client) = connect(&config)?;

    let export_dir = match &config.export_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let mut app = App::new(Inspector::new(endpoints), export_dir);
    if let Some(path) = file {
        app.path_input = path.display().to_string();
        app.select_path();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channel for request outcomes
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let res = run_app(&mut terminal, &mut app, &client, &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn start_analysis(
    app: &mut App,
    client: &InspectionClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) -> Option<JoinHandle<()>> {
    // Presses are swallowed while any request is in flight
    if app.inspector.is_busy() {
        return None;
    }
    let file = app.inspector.begin_analysis().ok()?;
    let generation = app.inspector.generation();
    app.notice = None;
    app.scroll_to_top();

    let client_clone = client.clone();
    let tx = event_tx.clone();
    Some(tokio::spawn(async move {
        let outcome = client_clone.analyze(&file).await;
        let _ = tx.send(AppEvent::AnalysisFinished { generation, outcome });
    }))
}

fn start_report(
    app: &mut App,
    client: &InspectionClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) -> Option<JoinHandle<()>> {
    if app.inspector.is_busy() {
        return None;
    }
    let analysis_text = app.inspector.begin_report().ok()?;
    let generation = app.inspector.generation();
    app.notice = None;

    let client_clone = client.clone();
    let tx = event_tx.clone();
    Some(tokio::spawn(async move {
        let outcome = client_clone.generate_report(&analysis_text).await;
        let _ = tx.send(AppEvent::ReportFinished { generation, outcome });
    }))
}

fn handle_help_keys(app: &mut App, key: KeyCode, modifiers: event::KeyModifiers) -> bool {
    if !app.show_help {
        return false;
    }

    match key {
        KeyCode::Char('h') if modifiers.contains(event::KeyModifiers::CONTROL) => {
            app.toggle_help();
        }
        KeyCode::Esc => {
            app.show_help = false;
        }
        _ => {}
    }
    true
}

fn handle_keyboard_input(
    app: &mut App,
    key: KeyCode,
    modifiers: event::KeyModifiers,
    client: &InspectionClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match key {
        KeyCode::Char('c') if modifiers.contains(event::KeyModifiers::CONTROL) => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return;
        }
        KeyCode::Esc => {
            app.exit_pending = false;
            return;
        }
        _ if app.exit_pending => {
            // Any other key cancels pending exit
            app.exit_pending = false;
        }
        _ => {}
    }

    let ctrl = modifiers.contains(event::KeyModifiers::CONTROL);
    match key {
        KeyCode::Char('q') if ctrl => app.quit(),
        KeyCode::Char('h') if ctrl => app.toggle_help(),
        KeyCode::Char('a') if ctrl => {
            // Fire-and-forget; the outcome arrives as an AppEvent
            let _ = start_analysis(app, client, event_tx);
        }
        KeyCode::Char('g') if ctrl => {
            let _ = start_report(app, client, event_tx);
        }
        KeyCode::Char('e') if ctrl => app.export_analysis(),

        // Navigation keys scroll the analysis
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.scroll_to_bottom(),

        // Editing keys affect the path input
        KeyCode::Backspace => {
            app.path_input.pop();
        }
        KeyCode::Enter => app.select_path(),
        KeyCode::Char(c) if !ctrl => app.path_input.push(c),

        _ => {}
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &InspectionClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;
        app.advance_tick();

        // Apply finished requests before reading input
        while let Ok(app_event) = event_rx.try_recv() {
            app.apply_event(app_event);
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && !handle_help_keys(app, key.code, key.modifiers)
                {
                    handle_keyboard_input(app, key.code, key.modifiers, client, event_tx);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
