// runtime settings, filled from flags and the environment by the cli

use crate::core::DEFAULT_MAX_ROWS;
use crate::output::TableStyle;
use crate::router::RoutingMode;
use crate::search::{Bing, SearchProvider, SearchProviderKind, SerpApi};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `heart_disease.db`, `cancer.db` and `diabetes.db`.
    pub db_dir: PathBuf,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub search: SearchProviderKind,
    pub serpapi_key: Option<String>,
    pub bing_key: Option<String>,
    pub routing: RoutingMode,
    pub max_rows: usize,
    pub style: TableStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_dir: PathBuf::from("db"),
            api_key: None,
            model: None,
            search: SearchProviderKind::default(),
            serpapi_key: None,
            bing_key: None,
            routing: RoutingMode::default(),
            max_rows: DEFAULT_MAX_ROWS,
            style: TableStyle::default(),
        }
    }
}

impl Config {
    pub fn search_provider(&self) -> Box<dyn SearchProvider> {
        match self.search {
            SearchProviderKind::Serpapi => Box::new(SerpApi::new(self.serpapi_key.clone())),
            SearchProviderKind::Bing => Box::new(Bing::new(self.bing_key.clone())),
        }
    }
}
