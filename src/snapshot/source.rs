//! Readers for the ytenx text files.
//!
//! The `.txt` files are single-space separated, so an empty field shows up as
//! two adjacent spaces. The `.csv` lookups are comma separated. Both are read
//! as plain lines; blank lines are skipped.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::BuildError;

pub const SMALL_RHYMES: &str = "SieuxYonh.txt";
pub const FINALS: &str = "YonhMux.txt";
pub const READINGS: &str = "PrengQim.txt";
pub const DERIVED_READINGS: &str = "Dauh.txt";
pub const CHARACTERS: &str = "Dzih.txt";
pub const RHYMES: &str = "YonhMiuk.txt";
pub const RHYME_CLASSES: &str = "YonhGheh.txt";
pub const SUBGROUPS: &str = "subgroup.csv";
pub const INITIALS: &str = "initial.csv";

pub const ALL: [&str; 9] = [
    SMALL_RHYMES,
    FINALS,
    READINGS,
    DERIVED_READINGS,
    CHARACTERS,
    RHYMES,
    RHYME_CLASSES,
    SUBGROUPS,
    INITIALS,
];

#[derive(Debug, Clone, PartialEq)]
pub struct SmallRhyme {
    pub id: i64,
    pub name: Option<String>,
    pub initial: String,
    pub final_name: String,
    pub rhyme: String,
    pub fanqie: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Final {
    pub name: String,
    pub division: i64,
    pub rounding: String,
}

/// Romanizations from `PrengQim.txt` joined by position with the derived
/// readings in `Dauh.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub id: i64,
    pub guyun: String,
    pub younu: Option<String>,
    pub baxter: String,
    pub zhongzhou: String,
    pub putonghua: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub small_rhyme: i64,
    pub order: i64,
    pub name: String,
    pub explanation: String,
}

/// Rhyme and initial lookups that feed the derived views.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    /// 韻 to 韻賅上去.
    pub subgroups: Vec<(String, String)>,
    /// 韻 to 韻賅上去入.
    pub rhyme_groups: Vec<(String, String)>,
    /// 韻賅上去入 to 攝.
    pub classes: Vec<(String, String)>,
    /// 母 to 母號.
    pub initials: Vec<(String, i64)>,
}

struct Record<'a> {
    file: &'static str,
    line: usize,
    fields: Vec<&'a str>,
}

impl<'a> Record<'a> {
    fn get(&self, idx: usize) -> Result<&'a str, BuildError> {
        self.fields.get(idx).copied().ok_or_else(|| BuildError::Malformed {
            file: self.file,
            line: self.line,
            reason: format!("expected at least {} fields, found {}", idx + 1, self.fields.len()),
        })
    }

    fn optional(&self, idx: usize) -> Option<String> {
        self.fields
            .get(idx)
            .filter(|field| !field.is_empty())
            .map(|field| field.to_string())
    }

    fn integer(&self, idx: usize) -> Result<i64, BuildError> {
        let field = self.get(idx)?;
        field.parse().map_err(|_| BuildError::Malformed {
            file: self.file,
            line: self.line,
            reason: format!("{field:?} is not an integer"),
        })
    }
}

struct TextFile {
    name: &'static str,
    delimiter: char,
    content: String,
}

impl TextFile {
    fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.content
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(line, text)| Record {
                file: self.name,
                line,
                fields: text.split(self.delimiter).collect(),
            })
    }

    /// Splits off the header line and resolves `wanted` to field positions.
    fn with_header<const N: usize>(
        &self,
        wanted: [&'static str; N],
    ) -> Result<([usize; N], Vec<Record<'_>>), BuildError> {
        let mut records = self.records();
        let header = records.next().ok_or(BuildError::Empty { file: self.name })?;

        let mut positions = [0; N];
        for (slot, column) in positions.iter_mut().zip(wanted) {
            *slot = header
                .fields
                .iter()
                .position(|field| *field == column)
                .ok_or(BuildError::MissingColumn { file: self.name, column })?;
        }

        let rows: Vec<_> = records.collect();
        if rows.is_empty() {
            return Err(BuildError::Empty { file: self.name });
        }
        Ok((positions, rows))
    }

    fn headless(&self) -> Result<Vec<Record<'_>>, BuildError> {
        let rows: Vec<_> = self.records().collect();
        if rows.is_empty() {
            return Err(BuildError::Empty { file: self.name });
        }
        Ok(rows)
    }

    fn pairs(&self, key: &'static str, value: &'static str) -> Result<Vec<(String, String)>, BuildError> {
        let ([k, v], rows) = self.with_header([key, value])?;
        rows.iter()
            .map(|row| -> Result<_, BuildError> { Ok((row.get(k)?.to_string(), row.get(v)?.to_string())) })
            .collect()
    }
}

/// A directory holding the ytenx files.
pub struct Source {
    dir: PathBuf,
}

impl Source {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the expected files that are not present.
    pub fn missing(&self) -> Vec<&'static str> {
        ALL.into_iter()
            .filter(|name| !self.dir.join(name).is_file())
            .collect()
    }

    async fn open(&self, name: &'static str, delimiter: char) -> Result<TextFile, BuildError> {
        let path = self.dir.join(name);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| BuildError::Read { path, source })?;
        debug!(file = name, bytes = content.len(), "source file read");
        Ok(TextFile {
            name,
            delimiter,
            content,
        })
    }

    pub async fn small_rhymes(&self) -> Result<Vec<SmallRhyme>, BuildError> {
        let file = self.open(SMALL_RHYMES, ' ').await?;
        file.headless()?
            .iter()
            .map(|row| -> Result<_, BuildError> {
                Ok(SmallRhyme {
                    id: row.integer(0)?,
                    name: row.optional(1),
                    initial: row.get(2)?.to_string(),
                    final_name: row.get(3)?.to_string(),
                    rhyme: row.get(4)?.to_string(),
                    fanqie: row.optional(5),
                })
            })
            .collect()
    }

    pub async fn finals(&self) -> Result<Vec<Final>, BuildError> {
        let file = self.open(FINALS, ' ').await?;
        let ([name, division, rounding], rows) = file.with_header(["#韻母", "等", "呼"])?;
        rows.iter()
            .map(|row| -> Result<_, BuildError> {
                Ok(Final {
                    name: row.get(name)?.to_string(),
                    division: row.integer(division)?,
                    rounding: row.get(rounding)?.to_string(),
                })
            })
            .collect()
    }

    pub async fn readings(&self) -> Result<Vec<Reading>, BuildError> {
        let romanized = self.open(READINGS, ' ').await?;
        let derived = self.open(DERIVED_READINGS, ' ').await?;
        let ([id, guyun, younu, baxter], romanized_rows) =
            romanized.with_header(["#序號", "古韻", "有女", "Baxter"])?;
        let ([zhongzhou, putonghua], derived_rows) = derived.with_header(["推導中州音", "推導普通話"])?;

        if romanized_rows.len() != derived_rows.len() {
            warn!(
                romanized = romanized_rows.len(),
                derived = derived_rows.len(),
                "reading files differ in length; extra rows are ignored"
            );
        }

        romanized_rows
            .iter()
            .zip(&derived_rows)
            .map(|(r, d)| -> Result<_, BuildError> {
                Ok(Reading {
                    id: r.integer(id)?,
                    guyun: r.get(guyun)?.to_string(),
                    younu: r.optional(younu),
                    baxter: r.get(baxter)?.to_string(),
                    zhongzhou: d.get(zhongzhou)?.to_string(),
                    putonghua: d.get(putonghua)?.to_string(),
                })
            })
            .collect()
    }

    pub async fn characters(&self) -> Result<Vec<Character>, BuildError> {
        let file = self.open(CHARACTERS, ' ').await?;
        file.headless()?
            .iter()
            .map(|row| -> Result<_, BuildError> {
                row.get(3)?;
                Ok(Character {
                    name: row.get(0)?.to_string(),
                    small_rhyme: row.integer(1)?,
                    order: row.integer(2)?,
                    explanation: row.fields[3..].join(" "),
                })
            })
            .collect()
    }

    pub async fn lookups(&self) -> Result<Lookups, BuildError> {
        let subgroups = self.open(SUBGROUPS, ',').await?.pairs("Rhyme", "Subgroup")?;
        let rhyme_groups = self.open(RHYMES, ' ').await?.pairs("#韻目", "韻系")?;
        let classes = self.open(RHYME_CLASSES, ' ').await?.pairs("#韻系", "攝")?;

        let initials_file = self.open(INITIALS, ',').await?;
        let ([initial, id], rows) = initials_file.with_header(["Initial", "InitialID"])?;
        let initials = rows
            .iter()
            .map(|row| -> Result<_, BuildError> { Ok((row.get(initial)?.to_string(), row.integer(id)?)) })
            .collect::<Result<_, BuildError>>()?;

        Ok(Lookups {
            subgroups,
            rhyme_groups,
            classes,
            initials,
        })
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::db::fixture;

    #[tokio::test]
    async fn reads_fixture_sources() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fixture::write_sources(dir.path()).await?;
        let source = Source::new(dir.path());
        assert!(source.missing().is_empty());

        let small = source.small_rhymes().await?;
        assert_eq!(small.len(), 3);
        assert_eq!(small[0].fanqie.as_deref(), Some("德紅"));

        let finals = source.finals().await?;
        assert_eq!(finals[1], Final { name: "東三".into(), division: 3, rounding: "合".into() });

        let readings = source.readings().await?;
        assert_eq!(readings[2].younu, None);
        assert_eq!(readings[2].putonghua, "zhōng");

        let lookups = source.lookups().await?;
        assert_eq!(lookups.initials[2], ("知".to_string(), 8));
        Ok(())
    }

    #[tokio::test]
    async fn reports_missing_column_and_bad_numbers() -> Result<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(dir.path().join(FINALS), "#韻母 呼\n東一 合\n").await?;
        tokio::fs::write(dir.path().join(CHARACTERS), "東 one 1 春方也\n").await?;
        let source = Source::new(dir.path());

        assert!(matches!(
            source.finals().await,
            Err(BuildError::MissingColumn { file: FINALS, column: "等" })
        ));
        assert!(matches!(
            source.characters().await,
            Err(BuildError::Malformed { file: CHARACTERS, line: 1, .. })
        ));
        assert_eq!(source.missing().len(), ALL.len() - 2);
        Ok(())
    }

    #[tokio::test]
    async fn crlf_lines_and_blank_lines_are_tolerated() -> Result<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(dir.path().join(CHARACTERS), "東 1 1 春方也\r\n\r\n凍 1 2 凍凌\r\n").await?;
        let chars = Source::new(dir.path()).characters().await?;
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[1].explanation, "凍凌");
        Ok(())
    }
}
