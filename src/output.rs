// output formatting - markdown tables or a plain text grid

use crate::core::QueryResult;
use crate::core::fallback::Applied;
use crate::core::summary::summarize;
use clap::ValueEnum;

/// Rows shown before switching to summary + preview.
pub const PREVIEW_ROWS: usize = 10;

const MAX_CELL: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TableStyle {
    #[default]
    Markdown,
    Plain,
}

/// Lays out the answer for one dataset query.
pub fn answer(sql: &str, applied: &Applied, style: TableStyle) -> String {
    let result = &applied.result;
    let mut out = format!("Executed SQL:\n```sql\n{sql}\n```\n\n");

    let notes = applied.notes();
    if !notes.is_empty() {
        out.push_str("Post-processing:\n");
        for note in notes {
            out.push_str(&format!("- {note}\n"));
        }
        out.push('\n');
    }

    if result.is_empty() {
        out.push_str("Query returned no results.");
        return out;
    }

    if result.row_count > PREVIEW_ROWS {
        let summary = summarize(result);
        out.push_str(&format!("Summary:\n{summary}\n"));
        out.push_str(&format!(
            "First {PREVIEW_ROWS} rows:\n{}",
            table(result, PREVIEW_ROWS, style)
        ));
    } else {
        out.push_str(&format!(
            "Results:\n{}",
            table(result, result.row_count, style)
        ));
    }

    out
}

pub fn table(result: &QueryResult, limit: usize, style: TableStyle) -> String {
    match style {
        TableStyle::Markdown => markdown(result, limit),
        TableStyle::Plain => plain(result, limit),
    }
}

fn markdown(result: &QueryResult, limit: usize) -> String {
    let escape = |s: String| s.replace('|', "\\|");
    let mut out = String::new();

    let header: Vec<String> = result.columns.iter().map(|c| escape(c.clone())).collect();
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    out.push_str(&format!(
        "|{}|\n",
        vec!["---"; result.columns.len()].join("|")
    ));

    for row in result.rows.iter().take(limit) {
        let cells: Vec<String> = row.iter().map(|v| escape(cell(v))).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    out
}

// nice aligned grid for terminals without markdown
fn plain(result: &QueryResult, limit: usize) -> String {
    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .take(limit)
        .map(|row| row.iter().map(cell).collect())
        .collect();

    // figure out column widths
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (i, val) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(val.chars().count());
            }
        }
    }

    let mut out = String::new();

    let header: Vec<String> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&sep.join("-+-"));
    out.push('\n');

    for row in rows {
        let formatted: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:width$}", v, width = widths.get(i).copied().unwrap_or(0)))
            .collect();
        out.push_str(formatted.join(" | ").trim_end());
        out.push('\n');
    }

    out
}

// one display cell, capped at 40 chars so things don't get crazy
fn cell(val: &serde_json::Value) -> String {
    let s = match val {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => val.to_string(),
    };

    if s.chars().count() > MAX_CELL {
        let cut: String = s.chars().take(MAX_CELL - 3).collect();
        format!("{cut}...")
    } else {
        s
    }
}
