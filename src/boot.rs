//! One-shot startup: bring up the engine and read the snapshot concurrently,
//! then publish the database handle.
//!
//! `Idle -> Loading -> Ready | Failed`. Nothing leaves `Ready` or `Failed`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::db::{Database, Engine};
use crate::error::BootError;

#[derive(Clone)]
pub enum BootState {
    Idle,
    Loading,
    Ready(Arc<Database>),
    Failed(Arc<BootError>),
}

impl BootState {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_))
    }

    pub fn can_advance_to(&self, next: &BootState) -> bool {
        match (self, next) {
            (Self::Idle, Self::Loading) => true,
            (Self::Loading, Self::Ready(_) | Self::Failed(_)) => true,
            _ => false,
        }
    }

    pub fn database(&self) -> Option<&Arc<Database>> {
        match self {
            Self::Ready(db) => Some(db),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Debug for BootState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(err) => write!(f, "Failed({err})"),
            other => f.write_str(other.name()),
        }
    }
}

pub struct Bootstrapper {
    snapshot: PathBuf,
    state: watch::Sender<BootState>,
}

impl Bootstrapper {
    pub fn new(snapshot: impl Into<PathBuf>) -> (Self, watch::Receiver<BootState>) {
        let (state, rx) = watch::channel(BootState::Idle);
        (
            Self {
                snapshot: snapshot.into(),
                state,
            },
            rx,
        )
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        self.advance(BootState::Loading);
        info!(snapshot = %self.snapshot.display(), "loading database");

        let next = match load(&self.snapshot).await {
            Ok(db) => {
                info!(
                    engine = db.engine_version(),
                    scratch = %db.scratch_path().display(),
                    "database ready"
                );
                BootState::Ready(Arc::new(db))
            }
            Err(e) => {
                error!(error = %e, "failed to load database");
                BootState::Failed(Arc::new(e))
            }
        };
        self.advance(next);
    }

    /// Publishes `next` if the transition is legal. Returns whether it was.
    fn advance(&self, next: BootState) -> bool {
        self.state.send_if_modified(|current| {
            if current.can_advance_to(&next) {
                debug!(from = current.name(), to = next.name(), "boot state");
                *current = next;
                true
            } else {
                false
            }
        })
    }
}

pub async fn fetch_snapshot(path: &Path) -> Result<Vec<u8>, BootError> {
    tokio::fs::read(path).await.map_err(|source| BootError::Fetch {
        path: path.to_path_buf(),
        source,
    })
}

async fn load(snapshot: &Path) -> Result<Database, BootError> {
    let (bytes, engine) = tokio::join!(fetch_snapshot(snapshot), Engine::init());
    let bytes = bytes?;
    let engine = engine?;
    debug!(engine = engine.version(), bytes = bytes.len(), "engine and snapshot loaded");
    engine.open(bytes).await
}
