// tests for the http api

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use common::{ScriptedLlm, StaticSearch};
use medquery::router::RoutingMode;
use medquery::search::{SearchResults, WebSearch};
use medquery::{Agent, Router, Server};
use std::sync::Arc;
use tower::ServiceExt;

fn agent(replies: &[&str]) -> Arc<Agent> {
    let llm = Arc::new(ScriptedLlm::new(replies));
    let (search, _) = StaticSearch::new(SearchResults {
        answer: Some("An answer".into()),
        hits: vec![],
    });
    Arc::new(Agent::new(
        Router::new(llm.clone(), RoutingMode::Llm),
        Vec::new(),
        WebSearch::new(Box::new(search)),
        llm,
    ))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = Server::router(agent(&[]));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_ask_routes_and_answers() {
    let app = Server::router(agent(&["web"]));
    let response = app
        .oneshot(
            Request::post("/ask")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"question":"define angina"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["route"], "web_search");
    assert!(json["answer"].as_str().unwrap().contains("An answer"));
}

#[tokio::test]
async fn test_ask_rejects_empty_question() {
    let app = Server::router(agent(&[]));
    let response = app
        .oneshot(
            Request::post("/ask")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"question":"  "}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "question is empty");
}

#[tokio::test]
async fn test_datasets_lists_tools() {
    let app = Server::router(agent(&[]));
    let response = app
        .oneshot(Request::get("/datasets").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}
