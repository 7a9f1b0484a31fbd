use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    #[diagnostic(code(medquery::database))]
    Database(#[from] sqlx::Error),

    #[error("Unsafe query: {0}")]
    #[diagnostic(
        code(medquery::unsafe_query),
        help("only a single SELECT statement is ever executed")
    )]
    UnsafeQuery(String),

    #[error("LLM API error: {0}")]
    #[diagnostic(code(medquery::llm))]
    Llm(String),

    #[error("Missing API key. Set GROQ_API_KEY or pass --api-key")]
    #[diagnostic(
        code(medquery::missing_api_key),
        help("add a line like GROQ_API_KEY=your_key_here to .env")
    )]
    MissingApiKey,

    #[error("{provider} key not configured. Set {var} in your environment or .env.")]
    #[diagnostic(code(medquery::missing_search_key))]
    MissingSearchKey {
        provider: &'static str,
        var: &'static str,
    },

    #[error("Search error: {0}")]
    #[diagnostic(code(medquery::search))]
    Search(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}
