// digest of a result set: ranges for numbers, counts for categories, spans for dates

use crate::core::dataset::{ColumnKind, is_date_like_name};
use crate::core::db::QueryResult;
use crate::core::fallback::{holds_only_timestamps, value_timestamp};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

const TOP_VALUES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub row_count: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnSummary {
    Numeric {
        name: String,
        count: usize,
        mean: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
    },
    Categorical {
        name: String,
        count: usize,
        unique: usize,
        top: Vec<(String, usize)>,
    },
    #[serde(rename = "datetime")]
    DateTime {
        name: String,
        count: usize,
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    },
}

impl ColumnSummary {
    pub fn name(&self) -> &str {
        match self {
            ColumnSummary::Numeric { name, .. }
            | ColumnSummary::Categorical { name, .. }
            | ColumnSummary::DateTime { name, .. } => name,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnSummary::Numeric { .. } => ColumnKind::Numeric,
            ColumnSummary::Categorical { .. } => ColumnKind::Categorical,
            ColumnSummary::DateTime { .. } => ColumnKind::DateTime,
        }
    }
}

/// Works out what kind of data a result column holds from its values.
pub fn column_kind(result: &QueryResult, index: usize) -> ColumnKind {
    let named_like_date = result
        .columns
        .get(index)
        .is_some_and(|c| is_date_like_name(c));

    if named_like_date && result.column_values(index).any(|v| value_timestamp(v).is_some()) {
        return ColumnKind::DateTime;
    }
    if holds_only_timestamps(result, index) {
        return ColumnKind::DateTime;
    }

    let mut seen = false;
    for value in result.column_values(index) {
        match value {
            Value::Null => continue,
            Value::Number(_) => seen = true,
            _ => return ColumnKind::Categorical,
        }
    }

    if seen {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

pub fn summarize(result: &QueryResult) -> Summary {
    let columns = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| match column_kind(result, i) {
            ColumnKind::Numeric => numeric(name, result, i),
            ColumnKind::Categorical => categorical(name, result, i),
            ColumnKind::DateTime => datetime(name, result, i),
        })
        .collect();

    Summary {
        row_count: result.row_count,
        columns,
    }
}

fn numeric(name: &str, result: &QueryResult, index: usize) -> ColumnSummary {
    let values: Vec<f64> = result
        .column_values(index)
        .filter_map(Value::as_f64)
        .collect();

    let count = values.len();
    let (mean, min, max) = if values.is_empty() {
        (None, None, None)
    } else {
        let sum: f64 = values.iter().sum();
        (
            Some(sum / count as f64),
            values.iter().copied().reduce(f64::min),
            values.iter().copied().reduce(f64::max),
        )
    };

    ColumnSummary::Numeric {
        name: name.to_string(),
        count,
        mean,
        min,
        max,
    }
}

fn categorical(name: &str, result: &QueryResult, index: usize) -> ColumnSummary {
    // first-seen order so ties stay stable
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut count = 0;

    for value in result.column_values(index) {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        count += 1;
        match counts.iter_mut().find(|(v, _)| *v == text) {
            Some((_, n)) => *n += 1,
            None => counts.push((text, 1)),
        }
    }

    let unique = counts.len();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_VALUES);

    ColumnSummary::Categorical {
        name: name.to_string(),
        count,
        unique,
        top: counts,
    }
}

fn datetime(name: &str, result: &QueryResult, index: usize) -> ColumnSummary {
    let stamps: Vec<NaiveDateTime> = result
        .column_values(index)
        .filter_map(value_timestamp)
        .collect();

    ColumnSummary::DateTime {
        name: name.to_string(),
        count: stamps.len(),
        min: stamps.iter().min().copied(),
        max: stamps.iter().max().copied(),
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rows: {}", self.row_count)?;

        let numeric: Vec<_> = self
            .columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Numeric)
            .collect();
        let categorical: Vec<_> = self
            .columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Categorical)
            .collect();
        let datetime: Vec<_> = self
            .columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::DateTime)
            .collect();

        if numeric.is_empty() && categorical.is_empty() && datetime.is_empty() {
            return write!(f, "No summary available.");
        }

        if !numeric.is_empty() {
            writeln!(f, "\nNumeric summary:")?;
            for column in numeric {
                if let ColumnSummary::Numeric {
                    name,
                    count,
                    mean,
                    min,
                    max,
                } = column
                {
                    match (mean, min, max) {
                        (Some(mean), Some(min), Some(max)) => writeln!(
                            f,
                            "  {name}: count={count}, mean={}, min={}, max={}",
                            number(*mean),
                            number(*min),
                            number(*max)
                        )?,
                        _ => writeln!(f, "  {name}: count=0")?,
                    }
                }
            }
        }

        if !categorical.is_empty() {
            writeln!(f, "\nCategorical summary:")?;
            for column in categorical {
                if let ColumnSummary::Categorical {
                    name,
                    count,
                    unique,
                    top,
                } = column
                {
                    let top = top
                        .iter()
                        .map(|(v, n)| format!("{v} ({n})"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(f, "  {name}: count={count}, unique={unique}, top: {top}")?;
                }
            }
        }

        if !datetime.is_empty() {
            writeln!(f, "\nDatetime columns:")?;
            for column in datetime {
                if let ColumnSummary::DateTime {
                    name,
                    count,
                    min,
                    max,
                } = column
                {
                    match (min, max) {
                        (Some(min), Some(max)) => {
                            writeln!(f, "  {name}: min={min}, max={max}, count={count}")?
                        }
                        _ => writeln!(f, "  {name}: all null")?,
                    }
                }
            }
        }

        Ok(())
    }
}

// trim float noise: 54.0 -> 54, 54.366666 -> 54.37
fn number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}
