mod notice;
pub mod query;
mod results;
mod sidebar;
mod theme;

pub use notice::*;
pub use query::{new_editor, render_query_panel, EditorConfig, QueryButton, QueryPanel};
pub use results::*;
pub use sidebar::*;
pub use theme::Theme;
