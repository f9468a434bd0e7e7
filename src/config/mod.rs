// Configuration module entry point
// Loads layered configuration: defaults, optional config.toml, environment overrides

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StaticFilesConfig,
    StorageConfig,
};

impl Config {
    /// Load configuration from the default "config.toml" (optional)
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Every key has a default, so the server runs with no config file at all:
    /// port 8000, document at data/controleDados.json, fallback index.html.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("DADOS"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("storage.data_file", "data/controleDados.json")?
            .set_default("static_files.root_dir", ".")?
            .set_default("static_files.fallback_file", "index.html")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let cfg = Config::load_from("does-not-exist").expect("defaults should load");
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.storage.data_file, "data/controleDados.json");
        assert_eq!(cfg.static_files.root_dir, ".");
        assert_eq!(cfg.static_files.fallback_file, "index.html");
        assert_eq!(cfg.http.max_body_size, 10_485_760);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::load_from("does-not-exist").expect("defaults should load");
        let addr = cfg.get_socket_addr().expect("valid address");
        assert_eq!(addr.port(), 8000);
    }
}
