//! HTML rendering of query results.
//!
//! Every piece of column or cell text passes through [`escape_html`]; nothing
//! coming from the database is ever emitted as markup.

use crate::db::{ResultSet, Value};

pub const NO_RESULT: &str = "<p>The query produces no result.</p>";

/// Escapes text for use as HTML element content or a quoted attribute value.
///
/// Carriage returns become `&#13;` so a parser does not fold them into line
/// feeds. NUL has no HTML representation and is replaced with U+FFFD, which is
/// what a parser would produce for it anyway.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '\r' => out.push_str("&#13;"),
            '\0' => out.push(char::REPLACEMENT_CHARACTER),
            _ => out.push(ch),
        }
    }
    out
}

/// NULL renders as nothing.
pub fn escape_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Text(text) => escape_html(text),
        other => escape_html(&other.to_string()),
    }
}

pub fn render_table(columns: &[String], rows: &[Vec<Value>]) -> String {
    let mut html = String::from(
        r#"<div class="table-wrapper"><table class="pure-table pure-table-bordered">"#,
    );

    html.push_str("<thead><tr>");
    for column in columns {
        html.push_str("<th>");
        html.push_str(&escape_html(column));
        html.push_str("</th>");
    }
    html.push_str("</tr></thead>");

    html.push_str("<tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&escape_value(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody>");

    html.push_str("</table></div>");
    html
}

pub fn render_result_set(set: &ResultSet) -> String {
    render_table(&set.columns, &set.rows)
}

/// An empty slice means the query ran but returned nothing, which is
/// different from a result set with zero rows.
pub fn render_result_sets(sets: &[ResultSet]) -> String {
    if sets.is_empty() {
        return NO_RESULT.to_string();
    }
    sets.iter().map(render_result_set).collect()
}

/// Wraps the output regions in a standalone page for export.
pub fn render_page(query: &str, error: &str, results: &str, generated_at: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Guangyun SQL results</title>
<link rel="stylesheet" href="https://unpkg.com/purecss@2.0.6/build/tables-min.css">
<style>
body{{font-family:sans-serif;margin:1.5em}}
pre.query{{background:#f4f4f4;padding:.75em;white-space:pre-wrap}}
#error-output{{color:#c00;white-space:pre-wrap}}
.table-wrapper{{overflow-x:auto;margin-bottom:1em}}
footer{{color:#888;font-size:small}}
</style>
</head>
<body>
<pre class="query">{query}</pre>
<div id="error-output">{error}</div>
<div id="wrapper-output">{results}</div>
<footer>Generated {generated_at}</footer>
</body>
</html>
"#,
        query = escape_html(query),
        error = escape_html(error),
        generated_at = escape_html(generated_at),
    )
}
