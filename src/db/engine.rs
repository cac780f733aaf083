use std::io::Write;
use std::path::{Path, PathBuf};

use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Connection, Either, Row, SqliteConnection, TypeInfo, ValueRef};
use tempfile::TempPath;
use tracing::{debug, info};

use super::{ObjectKind, ResultSet, SchemaObject, Value};
use crate::error::{BootError, QueryError};

const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";

/// The SQLite runtime. Loading a snapshot goes through here.
pub struct Engine {
    version: String,
    scratch_dir: PathBuf,
}

impl Engine {
    pub async fn init() -> Result<Self, BootError> {
        let mut conn = SqliteConnection::connect("sqlite::memory:")
            .await
            .map_err(BootError::Engine)?;
        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&mut conn)
            .await
            .map_err(BootError::Engine)?;
        conn.close().await.map_err(BootError::Engine)?;

        info!(%version, "sqlite runtime initialized");
        Ok(Self {
            version,
            scratch_dir: std::env::temp_dir(),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Loads snapshot bytes into a private scratch copy and opens it.
    /// The source file is never written to.
    pub async fn open(&self, bytes: Vec<u8>) -> Result<Database, BootError> {
        if !bytes.starts_with(SQLITE_HEADER) {
            return Err(BootError::InvalidSnapshot(bytes.len()));
        }

        let size = bytes.len();
        let dir = self.scratch_dir.clone();
        let scratch = tokio::task::spawn_blocking(move || write_scratch(&dir, &bytes))
            .await
            .map_err(|e| BootError::Open(e.to_string()))?
            .map_err(BootError::Scratch)?;

        let options = SqliteConnectOptions::new()
            .filename(&*scratch)
            .create_if_missing(false)
            .journal_mode(SqliteJournalMode::Memory);

        // A single long-lived connection keeps temp tables and pragmas
        // alive between queries.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| BootError::Open(e.to_string()))?;

        debug!(path = %scratch.display(), bytes = size, "snapshot loaded");
        Ok(Database {
            pool,
            scratch,
            engine_version: self.version.clone(),
        })
    }
}

/// Writes the snapshot into a fresh file under `dir`. The file is removed
/// when the returned path drops, including when this fails partway.
fn write_scratch(dir: &Path, bytes: &[u8]) -> std::io::Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("qieyun-")
        .suffix(".sqlite3")
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// Handle to the loaded snapshot. The scratch copy lives as long as the handle.
pub struct Database {
    pool: SqlitePool,
    scratch: TempPath,
    engine_version: String,
}

impl Database {
    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }

    pub fn scratch_path(&self) -> &Path {
        &self.scratch
    }

    /// Runs every statement in `sql`. A statement contributes a result set
    /// only if it produced at least one row.
    pub async fn exec(&self, sql: &str) -> Result<Vec<ResultSet>, QueryError> {
        let mut stream = sqlx::raw_sql(sql).fetch_many(&self.pool);

        let mut sets = Vec::new();
        let mut current: Option<ResultSet> = None;

        while let Some(step) = stream.try_next().await? {
            match step {
                Either::Left(_) => {
                    if let Some(set) = current.take() {
                        sets.push(set);
                    }
                }
                Either::Right(row) => {
                    let set = current.get_or_insert_with(|| {
                        ResultSet::new(
                            row.columns().iter().map(|c| c.name().to_string()).collect(),
                            vec![],
                        )
                    });
                    let width = set.columns.len();
                    set.rows.push((0..width).map(|idx| extract_value(&row, idx)).collect());
                }
            }
        }
        if let Some(set) = current.take() {
            sets.push(set);
        }

        Ok(sets)
    }

    pub async fn list_objects(&self) -> Result<Vec<SchemaObject>, QueryError> {
        let rows = sqlx::query(
            "SELECT name, type FROM sqlite_master
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
             ORDER BY type, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let kind: String = row.get("type");
                SchemaObject {
                    name: row.get("name"),
                    kind: if kind == "view" { ObjectKind::View } else { ObjectKind::Table },
                }
            })
            .collect())
    }
}

fn extract_value(row: &SqliteRow, idx: usize) -> Value {
    if let Ok(vr) = row.try_get_raw(idx) {
        if vr.is_null() {
            return Value::Null;
        }

        let type_info = vr.type_info().clone();
        match type_info.name() {
            "INTEGER" => {
                if let Ok(v) = row.try_get::<i64, _>(idx) {
                    return Value::Integer(v);
                }
            }
            "REAL" => {
                if let Ok(v) = row.try_get::<f64, _>(idx) {
                    return Value::Real(v);
                }
            }
            "TEXT" => {
                if let Ok(v) = row.try_get::<String, _>(idx) {
                    return Value::Text(v);
                }
            }
            "BLOB" => {
                if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
                    return Value::Blob(v);
                }
            }
            _ => {}
        }
    }

    row.try_get::<i64, _>(idx)
        .map(Value::Integer)
        .or_else(|_| row.try_get::<f64, _>(idx).map(Value::Real))
        .or_else(|_| row.try_get::<String, _>(idx).map(Value::Text))
        .or_else(|_| row.try_get::<Vec<u8>, _>(idx).map(Value::Blob))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::db::fixture;

    #[tokio::test]
    async fn open_rejects_bytes_without_sqlite_header() -> Result<()> {
        let engine = Engine::init().await?;
        let err = engine.open(b"not a database".to_vec()).await.err();
        assert!(matches!(err, Some(BootError::InvalidSnapshot(14))));
        Ok(())
    }

    #[tokio::test]
    async fn exec_groups_rows_by_statement() -> Result<()> {
        let (_dir, db) = fixture::open_database().await?;
        let sets = db
            .exec("SELECT 1 AS a; SELECT 'x' AS b, 2.5 AS c;")
            .await?;

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].columns, vec!["a"]);
        assert_eq!(sets[0].rows, vec![vec![Value::Integer(1)]]);
        assert_eq!(sets[1].columns, vec!["b", "c"]);
        assert_eq!(sets[1].rows, vec![vec![Value::from("x"), Value::Real(2.5)]]);
        Ok(())
    }

    #[tokio::test]
    async fn statements_without_rows_produce_no_result_set() -> Result<()> {
        let (_dir, db) = fixture::open_database().await?;
        let sets = db
            .exec("CREATE TEMP TABLE t (x); SELECT x FROM t; INSERT INTO t VALUES (1);")
            .await?;
        assert!(sets.is_empty());

        let sets = db.exec("SELECT x FROM t").await?;
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].rows, vec![vec![Value::Integer(1)]]);
        Ok(())
    }

    #[tokio::test]
    async fn extracts_null_and_blob_values() -> Result<()> {
        let (_dir, db) = fixture::open_database().await?;
        let sets = db.exec("SELECT NULL AS n, X'00ff' AS b").await?;
        assert_eq!(
            sets[0].rows[0],
            vec![Value::Null, Value::Blob(vec![0x00, 0xff])]
        );
        assert_eq!(sets[0].rows[0][1].to_string(), "X'00ff'");
        Ok(())
    }

    #[tokio::test]
    async fn engine_errors_carry_the_sqlite_message() -> Result<()> {
        let (_dir, db) = fixture::open_database().await?;
        let err = db.exec("SELECT * FROM no_such_table").await.err();
        match err {
            Some(QueryError::Engine(msg)) => assert!(msg.contains("no such table")),
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn writes_do_not_reach_the_snapshot_file() -> Result<()> {
        let (dir, db) = fixture::open_database().await?;
        db.exec("DELETE FROM 廣韻小韻").await?;
        let sets = db.exec("SELECT count(*) FROM 廣韻小韻").await?;
        assert_eq!(sets[0].rows[0][0], Value::Integer(0));

        let reopened = Engine::init()
            .await?
            .open(tokio::fs::read(fixture::snapshot_path(&dir)).await?)
            .await?;
        let sets = reopened.exec("SELECT count(*) FROM 廣韻小韻").await?;
        assert_eq!(sets[0].rows[0][0], Value::Integer(3));
        Ok(())
    }

    #[tokio::test]
    async fn scratch_copy_is_removed_with_the_handle() -> Result<()> {
        let (snapshot, _) = fixture::open_database().await?;
        let scratch_dir = tempfile::tempdir()?;
        let mut engine = Engine::init().await?;
        engine.scratch_dir = scratch_dir.path().to_path_buf();

        let db = engine.open(tokio::fs::read(fixture::snapshot_path(&snapshot)).await?).await?;
        let path = db.scratch_path().to_path_buf();
        assert!(path.starts_with(scratch_dir.path()));
        assert!(path.exists());

        drop(db);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(scratch_dir.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn failed_scratch_write_leaves_nothing_behind() -> Result<()> {
        let (snapshot, _) = fixture::open_database().await?;
        let parent = tempfile::tempdir()?;
        let mut engine = Engine::init().await?;
        engine.scratch_dir = parent.path().join("missing");

        let bytes = tokio::fs::read(fixture::snapshot_path(&snapshot)).await?;
        let err = engine.open(bytes).await.err();
        assert!(matches!(err, Some(BootError::Scratch(_))));
        assert_eq!(std::fs::read_dir(parent.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn lists_tables_before_views() -> Result<()> {
        let (_dir, db) = fixture::open_database().await?;
        let objects = db.list_objects().await?;
        let names: Vec<_> = objects.iter().map(|o| (o.kind, o.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (ObjectKind::Table, "廣韻字頭"),
                (ObjectKind::Table, "廣韻小韻"),
                (ObjectKind::View, "廣韻字頭全"),
                (ObjectKind::View, "廣韻小韻全"),
            ]
        );
        Ok(())
    }
}
