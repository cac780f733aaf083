use std::time::Instant;

use tracing::{info, warn};

use crate::db::{Database, ResultSet};
use crate::render::render_result_sets;

/// The error and results regions. At most one of them is populated.
#[derive(Debug, Default, Clone)]
pub struct OutputRegions {
    pub error: String,
    /// Rendered HTML fragment for the results region.
    pub results: String,
    /// Structured form of the same results, for the terminal table view.
    pub result_sets: Vec<ResultSet>,
}

impl OutputRegions {
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rendered { result_sets: usize },
    Failed,
}

/// Runs queries against a published database handle.
pub struct Dispatcher<'a> {
    db: &'a Database,
}

impl<'a> Dispatcher<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn dispatch(&self, query: &str, regions: &mut OutputRegions) -> Outcome {
        let started = Instant::now();
        match self.db.exec(query).await {
            Ok(sets) => {
                info!(
                    result_sets = sets.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "query executed"
                );
                regions.error.clear();
                regions.results = render_result_sets(&sets);
                regions.result_sets = sets;
                Outcome::Rendered {
                    result_sets: regions.result_sets.len(),
                }
            }
            Err(e) => {
                warn!(error = %e, "query rejected");
                regions.results.clear();
                regions.result_sets.clear();
                regions.error = format!("Error: {e}");
                Outcome::Failed
            }
        }
    }
}
