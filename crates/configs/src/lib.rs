use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_tickets_file")]
    pub tickets_file: String,
    /// When false tickets live only in memory for the lifetime of the process.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), tickets_file: default_tickets_file(), persist: default_persist() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self { Self { format: default_log_format() } }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// HS256 secret used to verify caller tokens; falls back to `JWT_SECRET`.
    #[serde(default)]
    pub jwt_secret: String,
    /// Accept a bare `X-Caller-Id` header when no bearer token is sent. Development only.
    #[serde(default)]
    pub allow_caller_header: bool,
}

fn default_data_dir() -> String { "data".into() }
fn default_tickets_file() -> String { "tickets.json".into() }
fn default_persist() -> bool { true }
fn default_log_format() -> String { "compact".into() }

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Config file if present, otherwise defaults overlaid with environment variables.
    pub fn load_or_env() -> Result<Self> {
        Self::load_or_env_from(&config_path())
    }

    /// Only a missing file falls back to the environment; unreadable or
    /// malformed files are errors.
    pub fn load_or_env_from(path: &str) -> Result<Self> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(content) => load_from_str(&content).map_err(|e| anyhow!("{path}: {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::from_env(),
            Err(e) => return Err(anyhow!("cannot read {path}: {e}")),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            cfg.server.worker_threads = Some(w);
        }
        if let Ok(dir) = std::env::var("TICKETS_DATA_DIR") {
            cfg.storage.data_dir = dir;
        }
        if let Ok(v) = std::env::var("ALLOW_CALLER_HEADER") {
            cfg.auth.allow_caller_header = matches!(v.trim(), "1" | "true" | "yes");
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        self.log.normalize();
        self.auth.normalize_from_env();
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.persist && self.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir is empty; set it in config.toml or TICKETS_DATA_DIR"));
        }
        if self.persist && self.tickets_file.trim().is_empty() {
            return Err(anyhow!("storage.tickets_file must not be empty when persist = true"));
        }
        Ok(())
    }

    pub fn tickets_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join(&self.tickets_file)
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            self.jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());
        }
    }
}

impl LogConfig {
    fn normalize(&mut self) {
        let f = self.format.trim().to_ascii_lowercase();
        self.format = if f == "json" { f } else { "compact".into() };
    }
}
