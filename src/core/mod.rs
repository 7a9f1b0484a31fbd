// core logic - datasets, the model, sql safety and post-processing

mod ai;
pub mod dataset;
mod db;
pub mod fallback;
pub mod prompt;
mod safety;
pub mod summary;

pub use ai::{DEFAULT_MODEL, Groq, Llm};
pub use dataset::{Column, ColumnKind, Dataset};
pub use db::{Db, QueryResult};
pub use safety::{DEFAULT_MAX_ROWS, Safety, strip_code_fences};
