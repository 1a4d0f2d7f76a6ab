pub mod handlers;
pub mod routes;

use crate::analysis::tshark::TsharkCommand;
use crate::analysis::Analyzer;
use crate::models::config::AppConfig;

/// Read-only state shared by every request
pub struct AppState {
    pub config: AppConfig,
    pub analyzer: Analyzer,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let tshark = TsharkCommand::new(config.tshark_path.clone(), config.tool_timeout);
        Self {
            analyzer: Analyzer::new(tshark),
            config,
        }
    }
}
