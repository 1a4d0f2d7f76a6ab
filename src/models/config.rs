use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub host: String,

    /// Port for the REST API server
    pub port: u16,

    /// Decoder program, looked up on PATH when not absolute
    pub tshark_path: PathBuf,

    /// Upper bound on a single decoder run; `None` waits forever
    pub tool_timeout: Option<Duration>,

    /// Directory uploads are staged in; `None` uses the OS temp dir
    pub upload_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            tshark_path: PathBuf::from("tshark"),
            tool_timeout: None,
            upload_dir: None,
        }
    }
}
