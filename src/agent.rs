// the assistant: routes a question and hands it to the tool that owns it

use crate::Error;
use crate::config::Config;
use crate::core::dataset::{Column, Dataset};
use crate::core::{Db, Groq, Llm, Safety, fallback, prompt};
use crate::output::{self, TableStyle};
use crate::router::{Route, Router};
use crate::search::WebSearch;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// One dataset table plus the nl -> sql pipeline over it.
pub struct DatasetTool {
    dataset: Dataset,
    db: Db,
    columns: Vec<Column>,
    llm: Arc<dyn Llm>,
    safety: Safety,
    style: TableStyle,
}

impl DatasetTool {
    pub async fn open(
        dataset: Dataset,
        dir: &Path,
        llm: Arc<dyn Llm>,
        max_rows: usize,
        style: TableStyle,
    ) -> Self {
        let db = Db::open(dataset.path_in(dir));

        // a missing schema only weakens the prompt
        let columns = match db.columns(dataset.table()).await {
            Ok(columns) if columns.is_empty() => {
                tracing::warn!(%dataset, path = %db.path().display(), "table has no columns");
                columns
            }
            Ok(columns) => columns,
            Err(e) => {
                tracing::warn!(
                    %dataset,
                    path = %db.path().display(),
                    error = %e,
                    "schema probe failed"
                );
                Vec::new()
            }
        };

        Self {
            dataset,
            db,
            columns,
            llm,
            safety: Safety::new(dataset.table(), max_rows),
            style,
        }
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub async fn nl_to_sql(&self, question: &str) -> Result<String, Error> {
        let system = prompt::sql_system_prompt(self.dataset.table(), &self.columns);
        let raw = self.llm.complete(&system, question).await?;
        tracing::debug!(dataset = %self.dataset, %raw, "model sql");
        self.safety.sanitize(&raw)
    }

    pub async fn run(&self, question: &str) -> String {
        self.run_at(question, chrono::Local::now().naive_local()).await
    }

    /// Full pipeline with an explicit reference time for the date fallback.
    pub async fn run_at(&self, question: &str, now: NaiveDateTime) -> String {
        let sql = match self.nl_to_sql(question).await {
            Ok(sql) => sql,
            Err(e @ Error::UnsafeQuery(_)) => return format!("Refused to run generated SQL: {e}"),
            Err(e) => return format!("Error generating SQL from question: {e}"),
        };

        tracing::info!(dataset = %self.dataset, %sql, "executing");
        let result = match self.db.execute(&sql).await {
            Ok(result) => result,
            Err(e) => return format!("Error executing SQL: {e}"),
        };

        let applied = fallback::apply(result, question, &sql, now);
        output::answer(&sql, &applied, self.style)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub route: Route,
    pub text: String,
}

pub struct Agent {
    router: Router,
    tools: Vec<DatasetTool>,
    web: WebSearch,
    llm: Arc<dyn Llm>,
}

impl Agent {
    pub fn new(router: Router, tools: Vec<DatasetTool>, web: WebSearch, llm: Arc<dyn Llm>) -> Self {
        Self {
            router,
            tools,
            web,
            llm,
        }
    }

    /// Wires the groq client, the three dataset tools and the search provider.
    pub async fn from_config(config: &Config) -> Result<Self, Error> {
        let llm: Arc<dyn Llm> = Arc::new(Groq::new(config.api_key.clone(), config.model.clone())?);
        Ok(Self::with_llm(config, llm).await)
    }

    pub async fn with_llm(config: &Config, llm: Arc<dyn Llm>) -> Self {
        let mut tools = Vec::with_capacity(Dataset::ALL.len());
        for dataset in Dataset::ALL {
            tools.push(
                DatasetTool::open(
                    dataset,
                    &config.db_dir,
                    llm.clone(),
                    config.max_rows,
                    config.style,
                )
                .await,
            );
        }

        let router = Router::new(llm.clone(), config.routing);
        let web = WebSearch::new(config.search_provider());

        Self::new(router, tools, web, llm)
    }

    pub fn tools(&self) -> &[DatasetTool] {
        &self.tools
    }

    pub fn tool(&self, dataset: Dataset) -> Option<&DatasetTool> {
        self.tools.iter().find(|t| t.dataset == dataset)
    }

    pub async fn answer(&self, question: &str) -> Answer {
        let route = self.router.route(question).await;
        let text = self.answer_with(route, question).await;
        Answer { route, text }
    }

    pub async fn answer_with(&self, route: Route, question: &str) -> String {
        match route {
            Route::WebSearch => self.web.run(question).await,
            Route::DirectAnswer => {
                let reply = self
                    .llm
                    .complete(prompt::direct_system_prompt(), question)
                    .await;
                match reply {
                    Ok(text) if text.is_empty() => {
                        "The model returned an empty answer.".to_string()
                    }
                    Ok(text) => text,
                    Err(e) => format!("Error from language model: {e}"),
                }
            }
            Route::HeartQuery | Route::CancerQuery | Route::DiabetesQuery => {
                let tool = route.dataset().and_then(|d| self.tool(d));
                match tool {
                    Some(tool) => tool.run(question).await,
                    None => "No tool found.".to_string(),
                }
            }
        }
    }

    pub async fn close(&self) {
        for tool in &self.tools {
            tool.db.close().await;
        }
    }
}
