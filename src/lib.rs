// medquery library - ask medical datasets questions in plain english

pub mod agent;
pub mod cli;
pub mod config;
pub mod core;
mod error;
pub mod output;
pub mod router;
pub mod search;
mod server;

pub use agent::{Agent, Answer, DatasetTool};
pub use config::Config;
pub use crate::core::{Dataset, Db, Groq, Llm, QueryResult, Safety};
pub use error::Error;
pub use router::{Route, Router};
pub use server::Server;
