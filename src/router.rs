// picks who answers a question: a dataset tool, web search, or the model itself

use crate::core::dataset::Dataset;
use crate::core::{Llm, prompt};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

const DATA_KEYWORDS: [&str; 16] = [
    "count",
    "average",
    "mean",
    "median",
    "sum",
    "how many",
    "statistics",
    "distribution",
    "correlation",
    "age",
    "bps",
    "cholesterol",
    "glucose",
    "diagnosis",
    "patients",
    "rate",
];

// general knowledge questions never go to a dataset
const KNOWLEDGE_KEYWORDS: [&str; 8] = [
    "define",
    "definition",
    "symptom",
    "symptoms",
    "treatment",
    "cure",
    "how to treat",
    "side effects",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    HeartQuery,
    CancerQuery,
    DiabetesQuery,
    WebSearch,
    DirectAnswer,
}

impl Route {
    pub fn dataset(self) -> Option<Dataset> {
        match self {
            Route::HeartQuery => Some(Dataset::HeartDisease),
            Route::CancerQuery => Some(Dataset::Cancer),
            Route::DiabetesQuery => Some(Dataset::Diabetes),
            Route::WebSearch | Route::DirectAnswer => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::HeartQuery => "heart",
            Route::CancerQuery => "cancer",
            Route::DiabetesQuery => "diabetes",
            Route::WebSearch => "web",
            Route::DirectAnswer => "direct",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "heart" => Some(Route::HeartQuery),
            "cancer" => Some(Route::CancerQuery),
            "diabetes" => Some(Route::DiabetesQuery),
            "web" => Some(Route::WebSearch),
            "direct" => Some(Route::DirectAnswer),
            _ => None,
        }
    }
}

impl From<Dataset> for Route {
    fn from(dataset: Dataset) -> Self {
        match dataset {
            Dataset::HeartDisease => Route::HeartQuery,
            Dataset::Cancer => Route::CancerQuery,
            Dataset::Diabetes => Route::DiabetesQuery,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RoutingMode {
    /// one classification call to the model
    #[default]
    Llm,
    /// keyword matching only, no model call
    Keywords,
}

pub struct Router {
    llm: Arc<dyn Llm>,
    mode: RoutingMode,
}

impl Router {
    pub fn new(llm: Arc<dyn Llm>, mode: RoutingMode) -> Self {
        Self { llm, mode }
    }

    pub async fn route(&self, question: &str) -> Route {
        if self.mode == RoutingMode::Keywords {
            return classify_keywords(question);
        }

        let reply = match self
            .llm
            .complete(prompt::router_system_prompt(), question)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "routing call failed, using keywords");
                return classify_keywords(question);
            }
        };

        let Some(route) = parse_label(&reply) else {
            tracing::warn!(%reply, "unrecognised routing label, using keywords");
            return classify_keywords(question);
        };

        if route.dataset().is_some() && is_knowledge_question(question) {
            tracing::debug!(%route, "knowledge question, overriding to web search");
            return Route::WebSearch;
        }

        tracing::debug!(%route, "routed");
        route
    }
}

/// First known label in the model's reply.
pub fn parse_label(reply: &str) -> Option<Route> {
    reply
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .find_map(Route::from_label)
}

/// Knowledge questions go to web search on every routing path. A bare
/// "what is X" counts too, unless it also asks for numbers.
pub fn is_knowledge_question(question: &str) -> bool {
    let text = question.to_lowercase();
    KNOWLEDGE_KEYWORDS.iter().any(|w| text.contains(w))
        || (text.contains("what is") && !wants_data(&text))
}

fn wants_data(text: &str) -> bool {
    DATA_KEYWORDS.iter().any(|w| text.contains(w))
        || text.contains("show")
        || text.contains("list")
}

/// Keyword classifier, used offline and whenever the model can't decide.
pub fn classify_keywords(question: &str) -> Route {
    let text = question.to_lowercase();

    if is_knowledge_question(&text) || !wants_data(&text) {
        return Route::WebSearch;
    }

    if text.contains("heart") || text.contains("cardio") {
        Route::HeartQuery
    } else if text.contains("cancer") || text.contains("tumor") || text.contains("tumour") {
        Route::CancerQuery
    } else if text.contains("diabetes")
        || text.contains("blood sugar")
        || text.contains("glucose")
    {
        Route::DiabetesQuery
    } else {
        Route::HeartQuery
    }
}
