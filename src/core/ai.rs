// groq integration - the model behind sql generation, routing and direct answers

use crate::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";

const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// A text-completion capability. Everything the assistant asks a model goes
/// through this, so tests can swap in a scripted one.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, Error>;
}

pub struct Groq {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

// what we send to groq (openai-compatible chat completions)
#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

// what groq sends back
#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Groq {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Result<Self, Error> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::MissingApiKey)?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Llm for Groq {
    async fn complete(&self, system: &str, user: &str) -> Result<String, Error> {
        let request = Request {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(GROQ_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Llm(format!("{status}: {body}")));
        }

        let response: Response = serde_json::from_str(&body)?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        tracing::debug!(model = %self.model, chars = text.len(), "completion received");
        Ok(text)
    }
}
