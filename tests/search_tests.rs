// tests for search response parsing and the web search tool

mod common;

use common::StaticSearch;
use medquery::search::{
    Bing, SearchHit, SearchResults, SerpApi, WebSearch, parse_bing, parse_serpapi,
};
use serde_json::json;
use std::sync::atomic::Ordering;

#[test]
fn test_serpapi_answer_box_and_organic() {
    let data = json!({
        "answer_box": { "snippet": "Chest pain, shortness of breath." },
        "organic_results": [
            { "title": "Angina", "snippet": "Reduced blood flow.", "link": "https://a.example" },
            { "title": "Heart attack", "snippet": "Blocked artery.", "link": "https://b.example" },
            { "title": "Third", "snippet": "x", "link": "https://c.example" },
            { "title": "Fourth", "snippet": "y", "link": "https://d.example" }
        ]
    });

    let results = parse_serpapi(&data, 3);
    assert_eq!(
        results.answer.as_deref(),
        Some("Chest pain, shortness of breath.")
    );
    assert_eq!(results.hits.len(), 3);
    assert_eq!(
        results.hits[0],
        SearchHit {
            title: "Angina".into(),
            snippet: "Reduced blood flow.".into(),
            url: "https://a.example".into(),
        }
    );
}

#[test]
fn test_serpapi_falls_back_to_related_questions() {
    let data = json!({
        "related_questions": [
            { "question": "Is diabetes curable?", "snippet": "Type 2 can go into remission." }
        ]
    });
    let results = parse_serpapi(&data, 3);
    assert!(results.answer.is_none());
    assert_eq!(results.hits[0].title, "Is diabetes curable?");
    assert_eq!(results.hits[0].snippet, "Type 2 can go into remission.");
}

#[test]
fn test_serpapi_falls_back_to_knowledge_graph() {
    let data = json!({
        "knowledge_graph": { "title": "Melanoma", "description": "A skin cancer." }
    });
    let results = parse_serpapi(&data, 3);
    assert_eq!(results.hits[0].title, "Melanoma");
    assert_eq!(results.hits[0].snippet, "A skin cancer.");
}

#[test]
fn test_serpapi_nothing_found() {
    let results = parse_serpapi(&json!({}), 3);
    assert!(results.is_empty());
    assert_eq!(results.render(), "No results found for that query.");
}

#[test]
fn test_bing_pages() {
    let data = json!({
        "webPages": { "value": [
            { "name": "Insulin", "snippet": "A hormone.", "url": "https://i.example" }
        ]}
    });
    let results = parse_bing(&data, 3);
    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.hits[0].url, "https://i.example");
}

#[test]
fn test_render_numbers_hits() {
    let results = SearchResults {
        answer: None,
        hits: vec![
            SearchHit {
                title: "A".into(),
                snippet: "a".into(),
                url: "u1".into(),
            },
            SearchHit {
                title: "B".into(),
                snippet: "b".into(),
                url: "u2".into(),
            },
        ],
    };
    assert_eq!(
        results.render(),
        "Web search results:\n\n1. A\na\nu1\n\n2. B\nb\nu2"
    );
}

#[tokio::test]
async fn test_empty_query() {
    let (search, calls) = StaticSearch::new(SearchResults::default());
    let web = WebSearch::new(Box::new(search));
    assert_eq!(web.run("   ").await, "No query provided.");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_results_are_cached_per_query() {
    let (search, calls) = StaticSearch::new(SearchResults {
        answer: Some("cached".into()),
        hits: vec![],
    });
    let web = WebSearch::new(Box::new(search));

    let first = web.run("what is angina").await;
    let second = web.run("  what is angina ").await;
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    web.run("what is asthma").await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_can_be_disabled() {
    let (search, calls) = StaticSearch::new(SearchResults::default());
    let web = WebSearch::new(Box::new(search)).without_cache();
    web.run("q").await;
    web.run("q").await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_keys_render_a_hint() {
    let serp = WebSearch::new(Box::new(SerpApi::new(None)));
    assert_eq!(
        serp.run("angina").await,
        "SerpAPI key not configured. Set SERPAPI_API_KEY in your environment or .env."
    );

    let bing = WebSearch::new(Box::new(Bing::new(Some("  ".into()))));
    assert!(bing.run("angina").await.contains("BING_SUBSCRIPTION_KEY"));
    assert_eq!(bing.provider_name(), "bing");
}
