use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};
use tui_textarea::TextArea;

use crate::boot::BootState;
use crate::config::AppConfig;
use crate::db::{Database, SchemaObject};
use crate::dispatch::{Dispatcher, OutputRegions, Outcome};
use crate::render::render_page;
use crate::ui::query::ButtonRegion;
use crate::ui::{new_editor, preview_query, EditorConfig, QueryButton, ResultsState, Theme, TreeState};

pub const LOAD_FAILED: &str = "Failed to load database.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Query,
    QueryButtons,
    Results,
}

pub struct App<'a> {
    pub focus: Focus,
    pub selected_button: QueryButton,
    pub hovered_button: QueryButton,
    pub boot: BootState,
    /// Set once bootstrap settles, whichever way it went.
    pub unblurred: bool,
    /// Blocking failure notice, `(message, detail)`.
    pub notice: Option<(String, String)>,
    pub editor_config: EditorConfig,
    pub query_input: TextArea<'a>,
    pub objects: Vec<SchemaObject>,
    pub tree_state: TreeState,
    pub regions: OutputRegions,
    pub results_state: ResultsState,
    pub last_query: String,
    pub status: Option<String>,
    pub should_quit: bool,
    pub button_region: Option<ButtonRegion>,
    pub sidebar_area: Option<Rect>,
    pub snapshot_path: String,
    pub export_path: PathBuf,
    theme: Theme,
}

impl<'a> App<'a> {
    pub fn new(config: &AppConfig, theme: Theme) -> Self {
        let editor_config = EditorConfig {
            initial_text: config.initial_query.clone(),
            line_numbers: config.line_numbers,
        };
        let query_input = new_editor(&editor_config, &theme);

        Self {
            focus: Focus::Query,
            selected_button: QueryButton::None,
            hovered_button: QueryButton::None,
            boot: BootState::Idle,
            unblurred: false,
            notice: None,
            editor_config,
            query_input,
            objects: vec![],
            tree_state: TreeState::default(),
            regions: OutputRegions::default(),
            results_state: ResultsState::new(),
            last_query: String::new(),
            status: None,
            should_quit: false,
            button_region: None,
            sidebar_area: None,
            snapshot_path: config.snapshot_path.clone(),
            export_path: PathBuf::from(&config.export_path),
            theme,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn database(&self) -> Option<Arc<Database>> {
        self.boot.database().cloned()
    }

    pub fn can_run(&self) -> bool {
        self.boot.database().is_some()
    }

    pub async fn on_boot(&mut self, state: BootState) {
        if self.boot.is_settled() {
            return;
        }
        self.boot = state;

        match &self.boot {
            BootState::Ready(db) => {
                let db = db.clone();
                match db.list_objects().await {
                    Ok(objects) => self.set_objects(objects),
                    Err(e) => warn!(error = %e, "failed to list schema objects"),
                }
                self.status = Some(format!("SQLite {} ready", db.engine_version()));
            }
            BootState::Failed(err) => {
                self.notice = Some((LOAD_FAILED.to_string(), err.to_string()));
                self.status = Some(LOAD_FAILED.to_string());
            }
            BootState::Idle | BootState::Loading => {}
        }

        if self.boot.is_settled() {
            self.unblurred = true;
        }
    }

    pub fn set_objects(&mut self, objects: Vec<SchemaObject>) {
        self.tree_state = TreeState::from_objects(&objects);
        self.objects = objects;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Sidebar => Focus::Query,
            Focus::Query => Focus::QueryButtons,
            Focus::QueryButtons => Focus::Results,
            Focus::Results => Focus::Sidebar,
        };
        if self.focus == Focus::QueryButtons {
            self.selected_button = QueryButton::Run;
        } else {
            self.selected_button = QueryButton::None;
        }
    }

    pub fn cycle_button(&mut self) {
        self.selected_button = match self.selected_button {
            QueryButton::None => QueryButton::Run,
            QueryButton::Run => QueryButton::Clear,
            QueryButton::Clear => QueryButton::Export,
            QueryButton::Export => QueryButton::Run,
        };
    }

    pub fn cycle_button_reverse(&mut self) {
        self.selected_button = match self.selected_button {
            QueryButton::None => QueryButton::Export,
            QueryButton::Run => QueryButton::Export,
            QueryButton::Clear => QueryButton::Run,
            QueryButton::Export => QueryButton::Clear,
        };
    }

    pub fn clear_query(&mut self) {
        self.query_input = new_editor(
            &EditorConfig {
                initial_text: String::new(),
                ..self.editor_config.clone()
            },
            &self.theme,
        );
    }

    pub fn set_query_text(&mut self, text: &str) {
        self.query_input = new_editor(
            &EditorConfig {
                initial_text: text.to_string(),
                ..self.editor_config.clone()
            },
            &self.theme,
        );
    }

    pub fn query_text(&self) -> String {
        self.query_input.lines().join("\n")
    }

    /// Runs the editor contents. Ignored until a database is published.
    pub async fn run_query(&mut self) -> Option<Outcome> {
        let Some(db) = self.database() else {
            debug!(state = self.boot.name(), "run ignored before database is ready");
            return None;
        };

        let query = self.query_text();
        let outcome = Dispatcher::new(&db).dispatch(&query, &mut self.regions).await;
        self.results_state.reset();
        self.last_query = query;
        self.status = Some(match outcome {
            Outcome::Rendered { result_sets } => format!("{result_sets} result set(s)"),
            Outcome::Failed => "Query failed".to_string(),
        });
        Some(outcome)
    }

    pub async fn preview_selected_object(&mut self) -> Option<Outcome> {
        let query = preview_query(self.tree_state.selected_object()?);
        self.set_query_text(&query);
        let outcome = self.run_query().await;
        self.focus = Focus::Results;
        outcome
    }

    pub async fn export(&mut self) -> anyhow::Result<PathBuf> {
        let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let page = render_page(
            &self.last_query,
            &self.regions.error,
            &self.regions.results,
            &generated_at,
        );
        tokio::fs::write(&self.export_path, page)
            .await
            .with_context(|| format!("failed to write {}", self.export_path.display()))?;
        info!(path = %self.export_path.display(), "results exported");
        Ok(self.export_path.clone())
    }

    pub async fn export_with_status(&mut self) {
        self.status = Some(match self.export().await {
            Ok(path) => format!("Exported to {}", path.display()),
            Err(e) => {
                warn!(error = %e, "export failed");
                format!("{e:#}")
            }
        });
    }

    pub fn handle_sidebar_click(&mut self, x: u16, y: u16) -> bool {
        if let Some(area) = self.sidebar_area {
            if x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height {
                let relative_y = y.saturating_sub(area.y + 1) as usize;
                let visible_idx = self.tree_state.scroll_offset + relative_y;
                self.tree_state.select_by_click(visible_idx);
                self.focus = Focus::Sidebar;
                return true;
            }
        }
        false
    }
}
