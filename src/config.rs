use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUERY: &str = "-- SQLite statements go here\nSELECT * FROM sqlite_master;\n";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Snapshot loaded at startup, relative to the working directory.
    pub snapshot_path: String,
    /// Where Ctrl+E writes the rendered results page.
    pub export_path: String,
    /// Text the editor starts with.
    pub initial_query: String,
    pub line_numbers: bool,
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub log_level: String,
    /// Log file. Defaults to `~/.qieyun/qieyun.log`.
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "data.sqlite3".to_string(),
            export_path: "results.html".to_string(),
            initial_query: DEFAULT_QUERY.to_string(),
            line_numbers: true,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Defaults, then `qieyun.toml` if present, then `QIEYUN_*` variables.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(config::File::with_name("qieyun").required(false))
    }

    fn load_from<S>(file: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults_json = serde_json::to_string(&Self::default())
            .with_context(|| "failed to serialize defaults")?;
        let settings = config::Config::builder()
            .add_source(config::File::from_str(&defaults_json, config::FileFormat::Json))
            .add_source(file)
            .add_source(config::Environment::with_prefix("QIEYUN"))
            .build()
            .with_context(|| "failed to load configuration")?;
        let cfg: AppConfig = settings
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        match &self.log_file {
            Some(path) => Some(PathBuf::from(path)),
            None => dirs::home_dir().map(|home| home.join(".qieyun").join("qieyun.log")),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.snapshot_path.trim().is_empty() {
            anyhow::bail!("snapshot_path must not be empty");
        }
        if self.export_path.trim().is_empty() {
            anyhow::bail!("export_path must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn defaults_survive_a_missing_file() -> Result<()> {
        let cfg = AppConfig::load_from(config::File::with_name("does-not-exist").required(false))?;
        assert_eq!(cfg.snapshot_path, "data.sqlite3");
        assert_eq!(cfg.initial_query, DEFAULT_QUERY);
        assert!(cfg.line_numbers);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let file = config::File::from_str(
            "snapshot_path = \"docs/data.sqlite3\"\nline_numbers = false\n",
            config::FileFormat::Toml,
        );
        let cfg = AppConfig::load_from(file)?;
        assert_eq!(cfg.snapshot_path, "docs/data.sqlite3");
        assert!(!cfg.line_numbers);
        assert_eq!(cfg.export_path, "results.html");
        Ok(())
    }

    #[test]
    fn empty_snapshot_path_is_rejected() {
        let file = config::File::from_str("snapshot_path = \"\"", config::FileFormat::Toml);
        assert!(AppConfig::load_from(file).is_err());
    }

    #[test]
    fn explicit_log_file_wins() {
        let cfg = AppConfig {
            log_file: Some("/tmp/q.log".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.log_path(), Some(PathBuf::from("/tmp/q.log")));
    }
}
