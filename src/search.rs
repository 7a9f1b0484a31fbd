// web search for definitions, symptoms and treatments
// serpapi by default, bing as the alternative provider

use crate::Error;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_NUM_RESULTS: usize = 3;

const TIMEOUT: Duration = Duration::from_secs(10);
const SERPAPI_URL: &str = "https://serpapi.com/search";
const BING_URL: &str = "https://api.bing.microsoft.com/v7.0/search";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    /// Answer box text when the provider has one.
    pub answer: Option<String>,
    pub hits: Vec<SearchHit>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.answer.is_none() && self.hits.is_empty()
    }

    pub fn render(&self) -> String {
        if self.is_empty() {
            return "No results found for that query.".to_string();
        }

        let mut parts = Vec::new();
        if let Some(answer) = &self.answer {
            parts.push(format!("Direct answer:\n{answer}"));
        }
        for (i, hit) in self.hits.iter().enumerate() {
            parts.push(format!("{}. {}\n{}\n{}", i + 1, hit.title, hit.snippet, hit.url));
        }

        format!("Web search results:\n\n{}", parts.join("\n\n"))
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str, num_results: usize) -> Result<SearchResults, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SearchProviderKind {
    #[default]
    Serpapi,
    Bing,
}

pub struct SerpApi {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl SerpApi {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApi {
    fn name(&self) -> &'static str {
        "serpapi"
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<SearchResults, Error> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingSearchKey {
            provider: "SerpAPI",
            var: "SERPAPI_API_KEY",
        })?;

        let num = num_results.max(1).to_string();
        let data: Value = self
            .client
            .get(SERPAPI_URL)
            .query(&[
                ("q", query),
                ("engine", "google"),
                ("api_key", api_key),
                ("num", num.as_str()),
            ])
            .timeout(TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // serpapi reports bad keys and quota problems in the body
        if let Some(message) = data.get("error").and_then(Value::as_str) {
            return Err(Error::Search(message.to_string()));
        }

        Ok(parse_serpapi(&data, num_results))
    }
}

/// Pulls the answer box and organic results out of a serpapi response,
/// falling back to related questions or the knowledge graph.
pub fn parse_serpapi(data: &Value, num_results: usize) -> SearchResults {
    let text = |v: &Value, key: &str| -> Option<String> {
        match v.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Array(items) if !items.is_empty() => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        }
    };

    let answer = data.get("answer_box").and_then(|ab| {
        ["answer", "snippet", "snippet_highlighted_words"]
            .iter()
            .find_map(|field| text(ab, *field))
    });

    let mut hits: Vec<SearchHit> = data
        .get("organic_results")
        .and_then(Value::as_array)
        .map(|organic| {
            organic
                .iter()
                .take(num_results)
                .enumerate()
                .filter_map(|(i, r)| {
                    let title = text(r, "title");
                    let snippet = text(r, "snippet").or_else(|| {
                        r.pointer("/rich_snippet/top")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    });
                    let url = text(r, "link").or_else(|| text(r, "displayed_link"));
                    if title.is_none() && snippet.is_none() && url.is_none() {
                        return None;
                    }
                    Some(SearchHit {
                        title: title.unwrap_or_else(|| format!("Result {}", i + 1)),
                        snippet: snippet.unwrap_or_default(),
                        url: url.unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    if answer.is_none() && hits.is_empty() {
        if let Some(related) = data.get("related_questions").and_then(Value::as_array) {
            hits = related
                .iter()
                .take(num_results)
                .map(|q| SearchHit {
                    title: text(q, "question").unwrap_or_default(),
                    snippet: text(q, "snippet")
                        .or_else(|| text(q, "answer"))
                        .unwrap_or_default(),
                    url: text(q, "link").unwrap_or_default(),
                })
                .collect();
        } else if let Some(kg) = data.get("knowledge_graph") {
            hits.push(SearchHit {
                title: text(kg, "title").unwrap_or_else(|| "Knowledge graph".to_string()),
                snippet: text(kg, "description").unwrap_or_default(),
                url: text(kg, "website").unwrap_or_default(),
            });
        }
    }

    SearchResults { answer, hits }
}

pub struct Bing {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl Bing {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl SearchProvider for Bing {
    fn name(&self) -> &'static str {
        "bing"
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<SearchResults, Error> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingSearchKey {
            provider: "Bing",
            var: "BING_SUBSCRIPTION_KEY",
        })?;

        let count = num_results.max(1).to_string();
        let data: Value = self
            .client
            .get(BING_URL)
            .header("Ocp-Apim-Subscription-Key", api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .timeout(TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parse_bing(&data, num_results))
    }
}

pub fn parse_bing(data: &Value, num_results: usize) -> SearchResults {
    let hits = data
        .pointer("/webPages/value")
        .and_then(Value::as_array)
        .map(|pages| {
            pages
                .iter()
                .take(num_results)
                .map(|p| SearchHit {
                    title: field(p, "name"),
                    snippet: field(p, "snippet"),
                    url: field(p, "url"),
                })
                .collect()
        })
        .unwrap_or_default();

    SearchResults { answer: None, hits }
}

fn field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// The web search tool: caching, retries and a readable answer around a provider.
pub struct WebSearch {
    provider: Box<dyn SearchProvider>,
    cache: Option<Mutex<HashMap<String, String>>>,
    max_retries: u32,
    backoff: Duration,
}

impl WebSearch {
    pub fn new(provider: Box<dyn SearchProvider>) -> Self {
        Self {
            provider,
            cache: Some(Mutex::new(HashMap::new())),
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn run(&self, query: &str) -> String {
        self.run_with(query, DEFAULT_NUM_RESULTS).await
    }

    pub async fn run_with(&self, query: &str, num_results: usize) -> String {
        let query = query.trim();
        if query.is_empty() {
            return "No query provided.".to_string();
        }

        if let Some(hit) = self.cached(query) {
            tracing::debug!(query, "search cache hit");
            return hit;
        }

        let answer = self.search_with_retries(query, num_results).await;

        if let Some(cache) = &self.cache
            && let Ok(mut cache) = cache.lock()
        {
            cache.insert(query.to_string(), answer.clone());
        }

        answer
    }

    fn cached(&self, query: &str) -> Option<String> {
        let cache = self.cache.as_ref()?.lock().ok()?;
        cache.get(query).cloned()
    }

    // network errors are retried with a growing pause, anything else is reported as is
    async fn search_with_retries(&self, query: &str, num_results: usize) -> String {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.provider.search(query, num_results).await {
                Ok(results) => return results.render(),
                Err(e @ Error::MissingSearchKey { .. }) => return e.to_string(),
                Err(Error::Http(e)) if attempt <= self.max_retries => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        provider = self.provider.name(),
                        "search failed, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(Error::Http(e)) => {
                    return format!("Network error while contacting search provider: {e}");
                }
                Err(e) => return format!("Error during web search: {e}"),
            }
        }
    }
}
