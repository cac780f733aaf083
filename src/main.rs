mod app;
mod boot;
mod config;
mod db;
mod dispatch;
mod error;
mod event;
mod render;
mod snapshot;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::{Constraint, Direction, Layout}, text::Line, widgets::Paragraph, Frame, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::{App, Focus};
use boot::Bootstrapper;
use config::AppConfig;
use event::{AppEvent, Events};
use ui::{render_error, render_loading, render_notice, render_query_panel, render_results, render_sidebar, QueryButton, QueryPanel, Theme};

/// Terminal SQL explorer for the Guangyun rhyme dictionary.
#[derive(Parser, Debug)]
#[command(name = "qieyun-sql", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the SQLite snapshot from the ytenx text files.
    BuildSnapshot {
        /// Directory holding SieuxYonh.txt, Dzih.txt and the other source files.
        #[arg(long, default_value = "db")]
        source: PathBuf,
        /// Output file. Defaults to the configured snapshot path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);
    info!(?config, "starting");

    match cli.command {
        Some(Command::BuildSnapshot { source, output }) => {
            let output = output.unwrap_or_else(|| PathBuf::from(&config.snapshot_path));
            let summary = snapshot::build(&source, &output)
                .await
                .with_context(|| format!("failed to build {}", output.display()))?;
            println!(
                "Wrote {} ({} small rhymes, {} characters)",
                output.display(),
                summary.small_rhymes,
                summary.characters
            );
            Ok(())
        }
        None => browse(config).await,
    }
}

async fn browse(config: AppConfig) -> Result<()> {
    let (bootstrapper, boot_rx) = Bootstrapper::new(&config.snapshot_path);
    let _boot_task = bootstrapper.spawn();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, Theme::default());
    let mut events = Events::new(boot_rx, Duration::from_millis(250));

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
    }

    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_tracing(config: &AppConfig) {
    let Some(path) = config.log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<'_>,
    events: &mut Events,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        match events.next().await? {
            AppEvent::Input(event) => handle_event(app, event).await,
            AppEvent::Boot(state) => app.on_boot(state).await,
            AppEvent::InputClosed => app.should_quit = true,
            AppEvent::Tick => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn draw(frame: &mut Frame, app: &mut App<'_>) {
    let base = app.theme().clone();
    let theme = if app.unblurred { base.clone() } else { base.blurred() };

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(22), Constraint::Percentage(78)])
        .split(outer[0]);

    app.sidebar_area = Some(chunks[0]);
    render_sidebar(frame, chunks[0], &mut app.tree_state, app.focus == Focus::Sidebar, &theme);

    let error_height = if app.regions.error.is_empty() { 0 } else { 4 };
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(error_height),
            Constraint::Min(5),
        ])
        .split(chunks[1]);

    let button_region = render_query_panel(
        frame,
        right_chunks[0],
        &app.query_input,
        QueryPanel {
            focused: app.focus == Focus::Query || app.focus == Focus::QueryButtons,
            run_enabled: app.can_run(),
            selected_button: app.selected_button,
            hovered_button: app.hovered_button,
            theme: &theme,
        },
    );
    app.button_region = Some(button_region);

    if !app.regions.error.is_empty() {
        render_error(frame, right_chunks[1], &app.regions.error, &theme);
    }

    render_results(
        frame,
        right_chunks[2],
        &app.regions,
        &mut app.results_state,
        app.focus == Focus::Results,
        &theme,
    );

    let help = "F5/Ctrl+R: run  |  Ctrl+E: export  |  Tab: focus  |  Esc: quit";
    let status = match &app.status {
        Some(status) => format!(" {status}  |  {help}"),
        None => format!(" {help}"),
    };
    frame.render_widget(Paragraph::new(Line::from(status)).style(theme.muted_style()), outer[1]);

    if !app.boot.is_settled() {
        render_loading(frame, &app.snapshot_path, &base);
    }
    if let Some((message, detail)) = &app.notice {
        render_notice(frame, message, detail, &base);
    }
}

async fn handle_event(app: &mut App<'_>, event: Event) {
    if app.notice.is_some() {
        if let Event::Key(key) = event {
            match key.code {
                KeyCode::Enter => app.dismiss_notice(),
                KeyCode::Esc => app.should_quit = true,
                _ => {}
            }
        }
        return;
    }

    match event {
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(ref region) = app.button_region {
                    let button = region.hit_test(mouse.column, mouse.row);
                    if button != QueryButton::None {
                        press_button(app, button).await;
                        return;
                    }
                }
                app.handle_sidebar_click(mouse.column, mouse.row);
            }
            MouseEventKind::Moved => {
                if let Some(ref region) = app.button_region {
                    app.hovered_button = region.hit_test(mouse.column, mouse.row);
                }
            }
            MouseEventKind::ScrollUp => match app.focus {
                Focus::Results => {
                    let rows = current_row_count(app);
                    app.results_state.select_prev(rows);
                }
                Focus::Sidebar => app.tree_state.select_prev(),
                _ => {}
            },
            MouseEventKind::ScrollDown => match app.focus {
                Focus::Results => {
                    let rows = current_row_count(app);
                    app.results_state.select_next(rows);
                }
                Focus::Sidebar => app.tree_state.select_next(),
                _ => {}
            },
            _ => {}
        },
        Event::Key(key) => handle_key(app, key).await,
        _ => {}
    }
}

async fn handle_key(app: &mut App<'_>, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            app.cycle_focus();
            return;
        }
        KeyCode::F(5) => {
            app.run_query().await;
            return;
        }
        KeyCode::Char('r') if ctrl => {
            app.run_query().await;
            return;
        }
        KeyCode::Char('e') if ctrl => {
            app.export_with_status().await;
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Sidebar => match key.code {
            KeyCode::Down | KeyCode::Char('j') => app.tree_state.select_next(),
            KeyCode::Up | KeyCode::Char('k') => app.tree_state.select_prev(),
            KeyCode::Enter | KeyCode::Right => {
                if app.tree_state.is_selected_group() {
                    app.tree_state.toggle_selected();
                } else {
                    app.preview_selected_object().await;
                }
            }
            KeyCode::Left | KeyCode::Char(' ') => {
                if app.tree_state.is_selected_group() {
                    app.tree_state.toggle_selected();
                }
            }
            _ => {}
        },
        Focus::Query => {
            app.query_input.input(Event::Key(key));
        }
        Focus::QueryButtons => match key.code {
            KeyCode::Left => app.cycle_button_reverse(),
            KeyCode::Right => app.cycle_button(),
            KeyCode::Enter => {
                let button = app.selected_button;
                press_button(app, button).await;
            }
            _ => {}
        },
        Focus::Results => {
            let rows = current_row_count(app);
            match key.code {
                KeyCode::Down | KeyCode::Char('j') => app.results_state.select_next(rows),
                KeyCode::Up | KeyCode::Char('k') => app.results_state.select_prev(rows),
                KeyCode::Left | KeyCode::Char('h') => app.results_state.scroll_left(),
                KeyCode::Right | KeyCode::Char('l') => {
                    let columns = current_column_count(app);
                    app.results_state.scroll_right(columns);
                }
                KeyCode::Char(']') => {
                    let sets = app.regions.result_sets.len();
                    app.results_state.next_set(sets);
                }
                KeyCode::Char('[') => app.results_state.prev_set(),
                _ => {}
            }
        }
    }
}

async fn press_button(app: &mut App<'_>, button: QueryButton) {
    match button {
        QueryButton::Run => {
            app.run_query().await;
        }
        QueryButton::Clear => app.clear_query(),
        QueryButton::Export => app.export_with_status().await,
        QueryButton::None => {}
    }
}

fn current_row_count(app: &App<'_>) -> usize {
    app.regions
        .result_sets
        .get(app.results_state.set_index)
        .map_or(0, |set| set.rows.len())
}

fn current_column_count(app: &App<'_>) -> usize {
    app.regions
        .result_sets
        .get(app.results_state.set_index)
        .map_or(0, |set| set.columns.len())
}
