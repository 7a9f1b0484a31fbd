// http server mode - run the assistant as an api

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::core::Column;
use crate::{Agent, Error, Route};

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    route: Option<Route>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct DatasetInfo {
    name: &'static str,
    table: &'static str,
    columns: Vec<Column>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub struct Server;

impl Server {
    pub async fn run(agent: Agent, host: &str, port: u16) -> Result<(), Error> {
        let app = Self::router(Arc::new(agent));

        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        tracing::info!("server running at http://{addr}");
        println!("server running at http://{addr}");

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }

    pub fn router(agent: Arc<Agent>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/datasets", get(datasets))
            .route("/ask", post(ask))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(agent)
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn datasets(State(agent): State<Arc<Agent>>) -> Json<Vec<DatasetInfo>> {
    Json(
        agent
            .tools()
            .iter()
            .map(|tool| DatasetInfo {
                name: tool.dataset().label(),
                table: tool.dataset().table(),
                columns: tool.columns().to_vec(),
            })
            .collect(),
    )
}

async fn ask(
    State(agent): State<Arc<Agent>>,
    Json(req): Json<AskRequest>,
) -> (StatusCode, Json<AskResponse>) {
    let question = req.question.trim();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AskResponse {
                route: None,
                answer: None,
                error: Some("question is empty".to_string()),
            }),
        );
    }

    let answer = agent.answer(question).await;
    (
        StatusCode::OK,
        Json(AskResponse {
            route: Some(answer.route),
            answer: Some(answer.text),
            error: None,
        }),
    )
}
