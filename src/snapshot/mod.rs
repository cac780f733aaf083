//! Builds the Guangyun snapshot from the ytenx text files.
//!
//! The database is written to a staging file next to `output` and moved into
//! place only once every table and view exists, so a failed build never
//! leaves a half-written snapshot behind.

mod schema;
pub mod source;

use std::path::Path;
use std::time::Instant;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection};
use tracing::info;

use crate::error::BuildError;
use source::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub small_rhymes: i64,
    pub characters: i64,
}

pub async fn build(source_dir: &Path, output: &Path) -> Result<BuildSummary, BuildError> {
    let started = Instant::now();
    let source = Source::new(source_dir);
    let missing = source.missing();
    if !missing.is_empty() {
        return Err(BuildError::MissingSources {
            dir: source.dir().to_path_buf(),
            files: missing.join(", "),
        });
    }

    let small_rhymes = source.small_rhymes().await?;
    let finals = source.finals().await?;
    let readings = source.readings().await?;
    let characters = source.characters().await?;
    let lookups = source.lookups().await?;

    let parent = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let staging = tempfile::Builder::new()
        .prefix(".qieyun-build-")
        .suffix(".sqlite3")
        .tempfile_in(parent)
        .map_err(|source| BuildError::Stage {
            path: parent.to_path_buf(),
            source,
        })?
        .into_temp_path();

    let mut conn = SqliteConnectOptions::new()
        .filename(&*staging)
        .journal_mode(SqliteJournalMode::Memory)
        .connect()
        .await?;

    let mut tx = conn.begin().await?;
    sqlx::raw_sql(schema::STAGING).execute(&mut *tx).await?;
    for row in &small_rhymes {
        sqlx::query(schema::INSERT_STAGED_SMALL_RHYME)
            .bind(row.id)
            .bind(&row.name)
            .bind(&row.initial)
            .bind(&row.final_name)
            .bind(&row.rhyme)
            .bind(&row.fanqie)
            .execute(&mut *tx)
            .await?;
    }
    for row in &finals {
        sqlx::query(schema::INSERT_STAGED_FINAL)
            .bind(&row.name)
            .bind(row.division)
            .bind(&row.rounding)
            .execute(&mut *tx)
            .await?;
    }
    for row in &readings {
        sqlx::query(schema::INSERT_STAGED_READING)
            .bind(row.id)
            .bind(&row.guyun)
            .bind(&row.younu)
            .bind(&row.baxter)
            .bind(&row.zhongzhou)
            .bind(&row.putonghua)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::raw_sql(schema::TABLES).execute(&mut *tx).await?;
    for row in &characters {
        sqlx::query(schema::INSERT_CHARACTER)
            .bind(row.small_rhyme)
            .bind(row.order)
            .bind(&row.name)
            .bind(&row.explanation)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::raw_sql(&schema::views(&lookups)).execute(&mut *tx).await?;

    let summary = BuildSummary {
        small_rhymes: sqlx::query_scalar("SELECT count(*) FROM 廣韻小韻").fetch_one(&mut *tx).await?,
        characters: sqlx::query_scalar("SELECT count(*) FROM 廣韻字頭").fetch_one(&mut *tx).await?,
    };
    tx.commit().await?;

    sqlx::raw_sql("VACUUM").execute(&mut conn).await?;
    conn.close().await?;

    staging.persist(output).map_err(|e| BuildError::Stage {
        path: output.to_path_buf(),
        source: e.error,
    })?;

    info!(
        output = %output.display(),
        small_rhymes = summary.small_rhymes,
        characters = summary.characters,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "snapshot built"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::db::{fixture, Engine, ObjectKind, Value};

    async fn built() -> Result<(tempfile::TempDir, BuildSummary)> {
        let dir = tempfile::tempdir()?;
        let sources = dir.path().join("ytenx");
        tokio::fs::create_dir(&sources).await?;
        fixture::write_sources(&sources).await?;
        let summary = build(&sources, &dir.path().join("data.sqlite3")).await?;
        Ok((dir, summary))
    }

    #[tokio::test]
    async fn builds_tables_and_views() -> Result<()> {
        let (dir, summary) = built().await?;
        assert_eq!(summary, BuildSummary { small_rhymes: 3, characters: 3 });

        let bytes = tokio::fs::read(dir.path().join("data.sqlite3")).await?;
        let db = Engine::init().await?.open(bytes).await?;
        let objects: Vec<_> = db
            .list_objects()
            .await?
            .into_iter()
            .map(|o| (o.kind, o.name))
            .collect();
        assert_eq!(
            objects,
            vec![
                (ObjectKind::Table, "廣韻字頭".to_string()),
                (ObjectKind::Table, "廣韻小韻".to_string()),
                (ObjectKind::View, "廣韻字頭全".to_string()),
                (ObjectKind::View, "廣韻小韻全".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn views_derive_positions_from_lookups() -> Result<()> {
        let (dir, _) = built().await?;
        let bytes = tokio::fs::read(dir.path().join("data.sqlite3")).await?;
        let db = Engine::init().await?.open(bytes).await?;

        let sets = db
            .exec("SELECT 小韻全名, 音韻地位, 攝, 母號, 上字, 下字, 有女羅馬字 FROM 廣韻小韻全 ORDER BY 小韻號")
            .await?;
        let rows = &sets[0].rows;
        assert_eq!(
            rows[0],
            vec![
                Value::from("1東小韻"),
                Value::from("端合一東平"),
                Value::from("通"),
                Value::Integer(4),
                Value::from("德"),
                Value::from("紅"),
                Value::from("tung"),
            ]
        );
        assert_eq!(rows[2][1], Value::from("知合三東平"));
        assert_eq!(rows[2][6], Value::Null);

        let sets = db
            .exec("SELECT 字頭號, 字頭, 音韻地位 FROM 廣韻字頭全 WHERE 字頭 = '凍'")
            .await?;
        assert_eq!(
            sets[0].rows[0],
            vec![Value::Integer(2), Value::from("凍"), Value::from("端合一東平")]
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_sources_are_named_and_nothing_is_written() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("data.sqlite3");
        let err = build(dir.path(), &output).await.err();
        match err {
            Some(BuildError::MissingSources { files, .. }) => {
                assert!(files.contains(source::SMALL_RHYMES));
                assert!(files.contains(source::INITIALS));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!output.exists());
        Ok(())
    }

    #[tokio::test]
    async fn constraint_failure_keeps_previous_snapshot() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fixture::write_sources(dir.path()).await?;
        // A two-character 小韻 violates the table's CHECK.
        tokio::fs::write(
            dir.path().join(source::SMALL_RHYMES),
            "1 東東 端 東一 東 德紅\n",
        )
        .await?;
        let output = dir.path().join("data.sqlite3");
        tokio::fs::write(&output, b"previous").await?;

        assert!(matches!(build(dir.path(), &output).await, Err(BuildError::Sqlx(_))));
        assert_eq!(tokio::fs::read(&output).await?, b"previous");
        let leftovers = std::fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".qieyun-build-"))
            .count();
        assert_eq!(leftovers, 0);
        Ok(())
    }
}
