// the three medical datasets and what we know about their columns

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    HeartDisease,
    Cancer,
    Diabetes,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::HeartDisease, Dataset::Cancer, Dataset::Diabetes];

    pub fn table(self) -> &'static str {
        match self {
            Dataset::HeartDisease => "heart_disease",
            Dataset::Cancer => "cancer",
            Dataset::Diabetes => "diabetes",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Dataset::HeartDisease => "heart_disease.db",
            Dataset::Cancer => "cancer.db",
            Dataset::Diabetes => "diabetes.db",
        }
    }

    /// Short name used by the router and in `[Routing to: ...]` lines.
    pub fn label(self) -> &'static str {
        match self {
            Dataset::HeartDisease => "heart",
            Dataset::Cancer => "cancer",
            Dataset::Diabetes => "diabetes",
        }
    }

    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    DateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: String,
    pub decl_type: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, decl_type: impl Into<String>) -> Self {
        let name = name.into();
        let decl_type = decl_type.into();
        let kind = infer_kind(&name, &decl_type);
        Self {
            name,
            decl_type,
            kind,
        }
    }
}

/// Column names that usually hold timestamps in these datasets.
pub fn is_date_like_name(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("date")
        || name.contains("time")
        || name.contains("admit")
        || name.ends_with("_at")
}

// declared type wins, the name heuristic only decides for text columns
fn infer_kind(name: &str, decl_type: &str) -> ColumnKind {
    let decl = decl_type.to_uppercase();
    if decl.contains("DATE") || decl.contains("TIME") {
        return ColumnKind::DateTime;
    }

    let numeric = ["INT", "REAL", "NUM", "FLOA", "DOUB", "DEC"];
    if numeric.iter().any(|n| decl.contains(n)) {
        ColumnKind::Numeric
    } else if is_date_like_name(name) {
        ColumnKind::DateTime
    } else {
        ColumnKind::Categorical
    }
}
