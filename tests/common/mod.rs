// shared test doubles and fixture databases

#![allow(dead_code)]

use async_trait::async_trait;
use medquery::search::{SearchProvider, SearchResults};
use medquery::{Error, Llm};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replies with canned answers in order and remembers what it was asked.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedLlm {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(message.to_string())])),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn complete(&self, system: &str, user: &str) -> Result<String, Error> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(Error::Llm(message)),
            None => Err(Error::Llm("no scripted reply left".to_string())),
        }
    }
}

/// Search provider returning the same results every time.
pub struct StaticSearch {
    results: SearchResults,
    calls: Arc<AtomicUsize>,
}

impl StaticSearch {
    /// The provider plus a handle counting how often it was asked.
    pub fn new(results: SearchResults) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                results,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn search(&self, _query: &str, num_results: usize) -> Result<SearchResults, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut results = self.results.clone();
        results.hits.truncate(num_results);
        Ok(results)
    }
}

/// Runs statements against a fresh sqlite file.
pub async fn create_db(path: &Path, statements: &[&str]) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    for statement in statements {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }

    pool.close().await;
}

/// heart_disease.db with a handful of patients, admit dates relative to 2024-06-30.
pub async fn heart_fixture(dir: &Path) {
    create_db(
        &dir.join("heart_disease.db"),
        &[
            "CREATE TABLE heart_disease (id INTEGER, age INTEGER, sex TEXT, chol REAL, admit_date TEXT, target INTEGER)",
            "INSERT INTO heart_disease VALUES (1, 63, 'M', 233.0, '2024-06-20', 1)",
            "INSERT INTO heart_disease VALUES (2, 37, 'M', 250.0, '2024-01-15', 1)",
            "INSERT INTO heart_disease VALUES (3, 41, 'F', 204.0, '2024-05-02', 0)",
            "INSERT INTO heart_disease VALUES (4, 56, 'M', 236.0, '2023-11-30', 0)",
            "INSERT INTO heart_disease VALUES (5, 57, 'F', 354.0, '2024-04-10', 1)",
        ],
    )
    .await;
}

/// 2024-06-30 12:00, the reference "now" for heart_fixture.
pub fn fixture_now() -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2024, 6, 30)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}
