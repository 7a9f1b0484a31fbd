// client-side fixes for intent the generated sql forgot.
// everything here is best effort: if a heuristic can't apply, rows pass through untouched.

use crate::core::dataset::is_date_like_name;
use crate::core::db::QueryResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::LazyLock;

static LAST_N: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:last|past)\s+(\d+)\s*(day|week|month|year)s?\b").expect("valid regex")
});
static WHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwhere\b").expect("valid regex"));
static ORDER_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\border\s+by\b").expect("valid regex"));
static SORT_BY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:sort|sorted|sorting|order|ordered)\s+(?:by|on)\s+(?:the\s+)?([a-z_][a-z0-9_]*)(?:\s+([a-z_][a-z0-9_]*))?",
    )
    .expect("valid regex")
});
static SORT_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:sort|sorted|sorting|order\s+by|ordered\s+by)\b").expect("valid regex")
});

static DESCENDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:desc|descending|decreasing|(?:highest|largest|newest) first|oldest last|high to low)\b",
    )
    .expect("valid regex")
});

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

#[derive(Debug, Clone, PartialEq)]
pub struct DateFilter {
    pub column: String,
    pub days: i64,
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortRequest {
    pub column: String,
    pub descending: bool,
}

/// The post-processed result plus what was done to it.
#[derive(Debug, Clone)]
pub struct Applied {
    pub result: QueryResult,
    pub date_filter: Option<DateFilter>,
    pub sorted_by: Option<SortRequest>,
}

impl Applied {
    pub fn notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if let Some(f) = &self.date_filter {
            notes.push(format!(
                "kept rows from the last {} days by `{}` ({} dropped)",
                f.days, f.column, f.dropped
            ));
        }
        if let Some(s) = &self.sorted_by {
            let dir = if s.descending { "descending" } else { "ascending" };
            notes.push(format!("sorted by `{}` {dir}", s.column));
        }
        notes
    }
}

/// Runs the date fallback then the sort fallback against an executed result.
pub fn apply(result: QueryResult, question: &str, sql: &str, now: NaiveDateTime) -> Applied {
    let mut result = result;
    let mut date_filter = None;
    let mut sorted_by = None;

    if let Some(days) = date_window(question) {
        if has_date_predicate(sql) {
            tracing::debug!(days, "sql already filters by date");
        } else if let Some((filtered, applied)) = filter_by_date(&result, days, now) {
            result = filtered;
            date_filter = Some(applied);
        }
    }

    if !has_order_by(sql)
        && let Some(request) = sort_request(question, &result.columns)
    {
        result = sort_rows(result, &request);
        sorted_by = Some(request);
    }

    Applied {
        result,
        date_filter,
        sorted_by,
    }
}

/// "last 90 days" -> 90, "past 2 weeks" -> 14. Months count 30 days, years 365.
pub fn date_window(question: &str) -> Option<i64> {
    let caps = LAST_N.captures(question)?;
    let n: i64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_lowercase();
    let per = match unit.as_str() {
        "day" => 1,
        "week" => 7,
        "month" => 30,
        "year" => 365,
        _ => return None,
    };
    n.checked_mul(per)
}

pub fn has_date_predicate(sql: &str) -> bool {
    let lower = sql.to_lowercase();
    let Some(m) = WHERE.find(&lower) else {
        return false;
    };
    let clause = &lower[m.end()..];
    ["date", "time", "admit", "julianday", "strftime", "now"]
        .iter()
        .any(|w| clause.contains(w))
}

pub fn has_order_by(sql: &str) -> bool {
    ORDER_BY.is_match(sql)
}

/// Keeps rows whose timestamp is within `days` of `now`. Returns `None` when
/// no column holds anything that parses as a timestamp.
pub fn filter_by_date(
    result: &QueryResult,
    days: i64,
    now: NaiveDateTime,
) -> Option<(QueryResult, DateFilter)> {
    let index = date_candidates(result)
        .into_iter()
        .find(|&i| result.column_values(i).any(|v| value_timestamp(v).is_some()))?;

    let cutoff = now.checked_sub_signed(Duration::try_days(days)?)?;
    let rows: Vec<Vec<Value>> = result
        .rows
        .iter()
        .filter(|row| {
            row.get(index)
                .and_then(value_timestamp)
                .is_some_and(|ts| ts >= cutoff)
        })
        .cloned()
        .collect();

    let dropped = result.row_count - rows.len();
    let column = result.columns[index].clone();
    tracing::debug!(%column, days, dropped, "applied date fallback");

    Some((
        QueryResult::new(result.columns.clone(), rows),
        DateFilter {
            column,
            days,
            dropped,
        },
    ))
}

// date-named columns first, then text columns that are entirely timestamps
fn date_candidates(result: &QueryResult) -> Vec<usize> {
    let mut candidates: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| is_date_like_name(c))
        .map(|(i, _)| i)
        .collect();

    for i in 0..result.columns.len() {
        if !candidates.contains(&i) && holds_only_timestamps(result, i) {
            candidates.push(i);
        }
    }

    candidates
}

pub(crate) fn holds_only_timestamps(result: &QueryResult, index: usize) -> bool {
    let mut seen = false;
    for value in result.column_values(index) {
        match value {
            Value::Null => continue,
            Value::String(s) if parse_timestamp(s).is_some() => seen = true,
            _ => return false,
        }
    }
    seen
}

pub fn sort_request(question: &str, columns: &[String]) -> Option<SortRequest> {
    let lower = question.to_lowercase();
    let descending = DESCENDING.is_match(question);
    let find = |name: &str| {
        columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .cloned()
    };

    // "sorted by <column>", the column may be written with a space
    if let Some(caps) = SORT_BY.captures(question) {
        let first = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let joined = caps
            .get(2)
            .map(|second| format!("{first}_{}", second.as_str()));

        let column = joined.as_deref().and_then(find).or_else(|| find(first));
        if let Some(column) = column {
            return Some(SortRequest { column, descending });
        }
    }

    // sort intent without a usable "by": take the first column the question mentions
    if !SORT_INTENT.is_match(question) {
        return None;
    }

    columns
        .iter()
        .filter_map(|c| {
            let spoken = c.to_lowercase().replace('_', " ");
            let pattern = format!(r"\b{}\b", regex::escape(&spoken));
            Regex::new(&pattern)
                .ok()?
                .find(&lower)
                .map(|m| (m.start(), c.clone()))
        })
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, column)| SortRequest { column, descending })
}

/// Stable in-memory sort. Numbers order before text, nulls always go last.
pub fn sort_rows(mut result: QueryResult, request: &SortRequest) -> QueryResult {
    let Some(index) = result.column_index(&request.column) else {
        return result;
    };

    result.rows.sort_by(|a, b| {
        let x = a.get(index).unwrap_or(&Value::Null);
        let y = b.get(index).unwrap_or(&Value::Null);
        match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = compare_values(x, y);
                if request.descending { ord.reverse() } else { ord }
            }
        }
    });

    tracing::debug!(
        column = %request.column,
        descending = request.descending,
        "applied sort fallback"
    );
    result
}

// total order: numbers, then timestamps, then other text, then anything else
fn compare_values(x: &Value, y: &Value) -> Ordering {
    match (x, y) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.total_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        },
        _ => value_rank(x).cmp(&value_rank(y)),
    }
}

fn value_rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) => 0,
        Value::String(_) => 1,
        _ => 2,
    }
}

pub fn value_timestamp(value: &Value) -> Option<NaiveDateTime> {
    value.as_str().and_then(parse_timestamp)
}

/// Parses the timestamp spellings found in the datasets; dates become midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
