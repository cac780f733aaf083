//! DDL for the snapshot. Column names are the ones users query by, so they
//! stay in Chinese.

use super::source::Lookups;

/// Per-file staging tables, joined into `廣韻小韻` and then discarded with
/// the connection.
pub const STAGING: &str = "
CREATE TEMP TABLE 廣韻小韻1
( 小韻號 INTEGER PRIMARY KEY
, 小韻 TEXT
, 母 TEXT NOT NULL
, 韻1 TEXT NOT NULL
, 韻 TEXT NOT NULL
, 反切 TEXT
);
CREATE TEMP TABLE 廣韻小韻2
( id INTEGER PRIMARY KEY
, 韻1 TEXT NOT NULL
, 等 INTEGER NOT NULL
, 開合 TEXT NOT NULL
);
CREATE TEMP TABLE 廣韻小韻3
( 小韻號 INTEGER PRIMARY KEY
, 古韻羅馬字 TEXT NOT NULL
, 有女羅馬字 TEXT
, 白一平轉寫 TEXT NOT NULL
, 推導中州音 TEXT NOT NULL
, 推導普通話 TEXT
);
";

pub const INSERT_STAGED_SMALL_RHYME: &str = "INSERT INTO 廣韻小韻1 VALUES (?, ?, ?, ?, ?, ?)";
pub const INSERT_STAGED_FINAL: &str = "INSERT INTO 廣韻小韻2 (韻1, 等, 開合) VALUES (?, ?, ?)";
pub const INSERT_STAGED_READING: &str = "INSERT INTO 廣韻小韻3 VALUES (?, ?, ?, ?, ?, ?)";

pub const TABLES: &str = "
CREATE TABLE 廣韻小韻
( 小韻號 INTEGER PRIMARY KEY
, 小韻 TEXT NOT NULL
, 韻 TEXT NOT NULL
, 母 TEXT NOT NULL
, 開合 TEXT NOT NULL
, 等 INTEGER NOT NULL
, 上字 TEXT
, 下字 TEXT
, 古韻羅馬字 TEXT NOT NULL
, 有女羅馬字 TEXT
, 白一平轉寫 TEXT NOT NULL
, 推導中州音 TEXT NOT NULL
, 推導普通話 TEXT
, CHECK
  (   LENGTH(小韻) = 1
  AND LENGTH(母) = 1
  AND 開合 IN ('開', '合')
  AND 等 >= 1
  AND 等 <= 4
  AND LENGTH(上字) = 1
  AND LENGTH(下字) = 1
  )
);
INSERT INTO 廣韻小韻
SELECT 小韻號, 小韻, 韻, 母, 開合, 等,
substr(反切, 1, 1) AS 上字, substr(反切, 2) AS 下字,
古韻羅馬字, 有女羅馬字, 白一平轉寫, 推導中州音, 推導普通話
FROM 廣韻小韻1 INNER JOIN 廣韻小韻2 USING (韻1)
INNER JOIN 廣韻小韻3 USING (小韻號);
CREATE TABLE 廣韻字頭
( 小韻號 INTEGER NOT NULL REFERENCES 廣韻小韻
, 小韻內字序 INTEGER NOT NULL
, 字頭 TEXT NOT NULL
, 解釋 TEXT NOT NULL
, PRIMARY KEY (小韻號, 小韻內字序)
);
";

pub const INSERT_CHARACTER: &str = "INSERT INTO 廣韻字頭 VALUES (?, ?, ?, ?)";

/// `CREATE VIEW` statements for `廣韻小韻全` and `廣韻字頭全`. The lookups are
/// inlined as `CASE` expressions so the views need no helper tables.
pub fn views(lookups: &Lookups) -> String {
    format!(
        "
CREATE VIEW 廣韻小韻全 AS
SELECT 小韻號, 小韻,
小韻號 || 小韻 || '小韻' AS 小韻全名,
母 || 開合 || 等漢字 || 韻賅上去入 || 聲 AS 音韻地位,
韻,
{subgroup} AS 韻賅上去,
韻賅上去入,
{class} AS 攝,
{initial} AS 母號,
母, 開合, 等, 等漢字, 聲, 上字, 下字,
古韻羅馬字, 有女羅馬字, 白一平轉寫, 推導中州音, 推導普通話
FROM (SELECT 小韻號, 小韻, 韻,
{rhyme_group} AS 韻賅上去入,
母, 開合, 等,
CASE 等 WHEN 1 THEN '一' WHEN 2 THEN '二' WHEN 3 THEN '三' ELSE '四' END AS 等漢字,
CASE
WHEN 小韻號 <= 1156 THEN '平'
WHEN 小韻號 <= 2091 THEN '上'
WHEN 小韻號 <= 3182 THEN '去'
WHEN 小韻號 <= 3874 THEN '入'
END AS 聲,
上字, 下字,
古韻羅馬字, 有女羅馬字, 白一平轉寫, 推導中州音, 推導普通話
FROM 廣韻小韻);
CREATE VIEW 廣韻字頭全 AS
SELECT 字頭號, 字頭, 解釋, 小韻號, 小韻, 小韻全名, 音韻地位, 小韻內字序, 韻, 韻賅上去,
韻賅上去入, 攝, 母號, 母, 開合, 等, 等漢字, 聲, 上字, 下字,
古韻羅馬字, 有女羅馬字, 白一平轉寫, 推導中州音, 推導普通話
FROM (SELECT row_number() OVER (ORDER BY 小韻號, 小韻內字序) AS 字頭號,
小韻號, 小韻內字序, 字頭, 解釋
FROM 廣韻字頭)
INNER JOIN 廣韻小韻全 USING (小韻號);
",
        subgroup = case_expr("韻", lookups.subgroups.iter().map(|(k, v)| (k, quote(v)))),
        class = case_expr("韻賅上去入", lookups.classes.iter().map(|(k, v)| (k, quote(v)))),
        initial = case_expr("母", lookups.initials.iter().map(|(k, v)| (k, v.to_string()))),
        rhyme_group = case_expr("韻", lookups.rhyme_groups.iter().map(|(k, v)| (k, quote(v)))),
    )
}

/// SQL string literal.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// `CASE subject WHEN 'k' THEN v ... END`. With no arms this is plain NULL,
/// since SQLite rejects a `CASE` without a `WHEN`.
fn case_expr<'a>(subject: &str, arms: impl Iterator<Item = (&'a String, String)>) -> String {
    let arms: Vec<String> = arms
        .map(|(key, then)| format!("WHEN {} THEN {then}", quote(key)))
        .collect();
    if arms.is_empty() {
        return "NULL".to_string();
    }
    format!("CASE {subject} {} END", arms.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_expressions_quote_their_keys() {
        let lookups = Lookups {
            subgroups: vec![("東".into(), "東".into()), ("it's".into(), "x".into())],
            initials: vec![("端".into(), 4)],
            ..Lookups::default()
        };
        let sql = views(&lookups);
        assert!(sql.contains("CASE 韻 WHEN '東' THEN '東' WHEN 'it''s' THEN 'x' END AS 韻賅上去"));
        assert!(sql.contains("CASE 母 WHEN '端' THEN 4 END AS 母號"));
        assert!(sql.contains("NULL AS 攝"));
    }
}
