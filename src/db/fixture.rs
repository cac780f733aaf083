//! Small Guangyun snapshot for tests, built from ytenx-format sources.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use super::{Database, Engine};
use crate::snapshot::{self, source};

const SOURCES: [(&str, &str); 9] = [
    (source::SMALL_RHYMES, "1 東 端 東一 東 德紅\n2 同 定 東一 東 徒紅\n3 中 知 東三 東 陟弓\n"),
    (source::FINALS, "#韻母 韻 等 呼\n東一 東 1 合\n東三 東 3 合\n"),
    (source::READINGS, "#序號 古韻 有女 Baxter\n1 tung tung tuwng\n2 dung dung duwng\n3 tjung  trjuwng\n"),
    (source::DERIVED_READINGS, "推導中州音 推導普通話\ntung dōng\ntung tóng\nchiung zhōng\n"),
    (source::CHARACTERS, "東 1 1 春方也\n凍 1 2 凍凌\n中 3 1 <平也>\n"),
    (source::RHYMES, "#韻目 韻系\n東 東\n"),
    (source::RHYME_CLASSES, "#韻系 攝\n東 通\n"),
    (source::SUBGROUPS, "Rhyme,Subgroup\n東,東\n"),
    (source::INITIALS, "Initial,InitialID\n端,4\n定,6\n知,8\n"),
];

pub async fn write_sources(dir: &Path) -> Result<()> {
    for (name, content) in SOURCES {
        tokio::fs::write(dir.join(name), content).await?;
    }
    Ok(())
}

pub fn snapshot_path(dir: &TempDir) -> PathBuf {
    dir.path().join("data.sqlite3")
}

pub async fn snapshot_dir() -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    let sources = dir.path().join("ytenx");
    tokio::fs::create_dir(&sources).await?;
    write_sources(&sources).await?;
    snapshot::build(&sources, &snapshot_path(&dir)).await?;
    Ok(dir)
}

pub async fn open_database() -> Result<(TempDir, Database)> {
    let dir = snapshot_dir().await?;
    let bytes = tokio::fs::read(snapshot_path(&dir)).await?;
    let db = Engine::init().await?.open(bytes).await?;
    Ok((dir, db))
}
