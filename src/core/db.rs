// read-only access to one dataset file
// probes the table schema and runs the sanitized select

use crate::Error;
use crate::core::dataset::Column;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as _, Executor, Row};
use std::path::{Path, PathBuf};

pub struct Db {
    pool: SqlitePool,
    path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &serde_json::Value> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Db {
    /// Opens the dataset lazily; nothing touches the file until the first query.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        // never create or write the dataset
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(options);

        Self { pool, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // column names and declared types so the model knows what to query
    pub async fn columns(&self, table: &str) -> Result<Vec<Column>, Error> {
        let query = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
        let cols: Vec<(i32, String, String, i32, Option<String>, i32)> =
            sqlx::query_as(&query).fetch_all(&self.pool).await?;

        Ok(cols
            .into_iter()
            .map(|(_, name, dtype, _, _, _)| Column::new(name, dtype))
            .collect())
    }

    pub async fn schema_text(&self, table: &str) -> Result<String, Error> {
        let columns = self.columns(table).await?;
        Ok(format_schema(table, &columns))
    }

    // run the sql and return results as json
    pub async fn execute(&self, sql: &str) -> Result<QueryResult, Error> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;

        // no rows to read names from, ask the statement instead
        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => (&self.pool)
                .describe(sql)
                .await?
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        };

        let json_rows: Vec<Vec<serde_json::Value>> = rows
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|i| row_value_to_json(row, i))
                    .collect()
            })
            .collect();

        Ok(QueryResult::new(columns, json_rows))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn format_schema(table: &str, columns: &[Column]) -> String {
    let mut result = format!("TABLE {table} (\n");
    for column in columns {
        result.push_str(&format!("  {} {}\n", column.name, column.decl_type));
    }
    result.push(')');
    result
}

// sqlite is dynamically typed so try storage classes in order
fn row_value_to_json(row: &SqliteRow, index: usize) -> serde_json::Value {
    use sqlx::ValueRef;

    if row.try_get_raw(index).map(|v| v.is_null()).unwrap_or(true) {
        return serde_json::Value::Null;
    }

    if let Ok(v) = row.try_get::<i64, _>(index) {
        return serde_json::Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return serde_json::Number::from_f64(v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return serde_json::Value::String(v);
    }

    serde_json::Value::String("<blob>".to_string())
}
