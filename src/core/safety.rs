// sql sanitizer - turns raw model output into one bounded select
// these are text heuristics, not a sandbox. the dataset is also opened read-only.

use crate::Error;
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_MAX_ROWS: usize = 200;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```[a-z]*[ \t]*\r?\n?").expect("valid regex"));
static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?[ \t]*```\s*$").expect("valid regex"));
static WRITE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(insert|update|delete|drop|alter|create|attach|detach|pragma|truncate|vacuum|reindex)\b",
    )
    .expect("valid regex")
});
static TABLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:from|join)\s+([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?|"[^"]+"|`[^`]+`|\[[^\]]+\])"#,
    )
    .expect("valid regex")
});
static LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blimit\s+\d+").expect("valid regex"));
static SELECT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*select\b").expect("valid regex"));

// words that can follow a table name without being its alias
const CLAUSE_WORDS: [&str; 20] = [
    "where", "join", "inner", "left", "right", "full", "cross", "natural", "outer", "on",
    "using", "group", "order", "having", "limit", "offset", "union", "intersect", "except",
    "window",
];

/// Sanitizes generated SQL for one dataset table.
pub struct Safety {
    table: String,
    max_rows: usize,
}

impl Safety {
    pub fn new(table: impl Into<String>, max_rows: usize) -> Self {
        Self {
            table: table.into(),
            max_rows,
        }
    }

    /// Strips fences, refuses anything but a single select, points every
    /// FROM/JOIN at our table and bounds the row count.
    pub fn sanitize(&self, raw: &str) -> Result<String, Error> {
        let stripped = strip_code_fences(raw);
        let sql = stripped.trim_end().trim_end_matches(';').trim();

        if sql.is_empty() {
            return Err(Error::UnsafeQuery("model returned no sql".to_string()));
        }

        let masked = mask_literals(sql);

        if !SELECT_START.is_match(&masked) {
            return Err(Error::UnsafeQuery(format!(
                "only SELECT queries are allowed, got `{}`",
                preview(sql)
            )));
        }

        if masked.contains(';') {
            return Err(Error::UnsafeQuery(
                "multiple statements are not allowed".to_string(),
            ));
        }

        if masked.contains("--") || masked.contains("/*") {
            return Err(Error::UnsafeQuery(
                "sql comment, possible injection".to_string(),
            ));
        }

        if let Some(m) = WRITE_KEYWORD.find(&masked) {
            return Err(Error::UnsafeQuery(format!(
                "{} is not allowed in a read-only query",
                m.as_str().to_uppercase()
            )));
        }

        let mut sql = self.repair_table(sql, &masked);

        // only a top-level LIMIT bounds the result, not one in a subquery
        if !LIMIT.is_match(&mask_nested(&mask_literals(&sql))) {
            sql = format!("{sql} LIMIT {}", self.max_rows);
        }

        Ok(sql)
    }

    // rewrite any FROM/JOIN target that isn't ours, keeping aliases.
    // an unaliased target whose name qualifies columns keeps that name as alias.
    fn repair_table(&self, sql: &str, masked: &str) -> String {
        let mut spans = Vec::new();
        for caps in TABLE_REF.captures_iter(masked) {
            let Some(target) = caps.get(1) else { continue };
            let name = unquote(target.as_str());
            let bare = name.rsplit('.').next().unwrap_or(name);
            if bare.eq_ignore_ascii_case(&self.table) {
                continue;
            }

            let (start, end) = (target.start(), target.end());
            let replacement = if !has_alias(&masked[end..])
                && qualifies_columns(masked, (start, end), bare)
            {
                format!("{} AS {}", self.table, quote_ident(bare))
            } else {
                self.table.clone()
            };
            spans.push((start, end, replacement));
        }

        if spans.is_empty() {
            return sql.to_string();
        }

        let mut repaired = sql.to_string();
        for (start, end, replacement) in spans.into_iter().rev() {
            tracing::debug!(
                found = &sql[start..end],
                expected = %self.table,
                "repairing table reference"
            );
            repaired.replace_range(start..end, &replacement);
        }
        repaired
    }
}

/// Removes a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fences(text: &str) -> String {
    let s = text.trim();
    let s = FENCE_OPEN.replace(s, "");
    let s = FENCE_CLOSE.replace(&s, "");
    s.trim().to_string()
}

// blank out single-quoted literals so keyword checks only see sql.
// keeps byte offsets identical to the input.
fn mask_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_literal = false;

    for c in sql.chars() {
        if c == '\'' {
            in_literal = !in_literal;
            out.push(c);
        } else if in_literal {
            out.extend(std::iter::repeat_n(' ', c.len_utf8()));
        } else {
            out.push(c);
        }
    }

    out
}

// blank out everything inside parentheses, keeping byte offsets
fn mask_nested(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut depth = 0usize;

    for c in sql.chars() {
        match c {
            '(' => {
                depth += 1;
                out.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                out.push(c);
            }
            _ if depth > 0 => out.extend(std::iter::repeat_n(' ', c.len_utf8())),
            _ => out.push(c),
        }
    }

    out
}

fn has_alias(after_target: &str) -> bool {
    let rest = after_target.trim_start();
    if rest.starts_with(['"', '`', '[']) {
        return true;
    }

    let word: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    !word.is_empty() && !CLAUSE_WORDS.iter().any(|w| word.eq_ignore_ascii_case(w))
}

// is `name.` used as a column qualifier anywhere outside the table reference
fn qualifies_columns(masked: &str, target: (usize, usize), name: &str) -> bool {
    let pattern = format!(r#"(?i)(?:^|[^A-Za-z0-9_])["`\[]?{}["`\]]?\."#, regex::escape(name));
    let Ok(qualifier) = Regex::new(&pattern) else {
        return false;
    };

    qualifier
        .find_iter(masked)
        .any(|m| m.end() <= target.0 || m.start() >= target.1)
}

fn quote_ident(name: &str) -> String {
    let plain = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn unquote(name: &str) -> &str {
    name.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
}

fn preview(sql: &str) -> String {
    let mut s: String = sql.chars().take(50).collect();
    if sql.chars().count() > 50 {
        s.push_str("...");
    }
    s
}
