mod weak_labels;

pub use weak_labels::{LabelPolicyFile, WeakLabelParams, WEAK_LABELS_FILE};

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the service and the batch pipeline.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub paths: PathsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let paths = PathsConfig {
            data_dir: env_path("APP_DATA_DIR", "data"),
            models_dir: env_path("APP_MODELS_DIR", "models"),
            docs_dir: env_path("APP_DOCS_DIR", "docs"),
            configs_dir: env_path("APP_CONFIGS_DIR", "configs"),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            paths,
        })
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Filesystem layout shared by the batch stages and the prediction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub configs_dir: PathBuf,
}

impl PathsConfig {
    /// Layout rooted at `root`, using the default directory names.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            data_dir: root.join("data"),
            models_dir: root.join("models"),
            docs_dir: root.join("docs"),
            configs_dir: root.join("configs"),
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn interim_dir(&self) -> PathBuf {
        self.data_dir.join("interim")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.docs_dir.join("media")
    }

    pub fn interviews_csv(&self) -> PathBuf {
        self.data_dir.join("entrevistas.csv")
    }

    pub fn weak_labels_yaml(&self) -> PathBuf {
        self.configs_dir.join(WEAK_LABELS_FILE)
    }

    /// Locate a raw input file, looking in the data directory first and then in `data/raw`.
    pub fn find_raw(&self, name: &str) -> Result<PathBuf, ConfigError> {
        let candidates = [self.data_dir.join(name), self.raw_dir().join(name)];
        candidates
            .iter()
            .find(|path| path.exists())
            .cloned()
            .ok_or_else(|| ConfigError::MissingInput {
                name: name.to_string(),
                searched: candidates.to_vec(),
            })
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            models_dir: PathBuf::from("models"),
            docs_dir: PathBuf::from("docs"),
            configs_dir: PathBuf::from("configs"),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingInput { name: String, searched: Vec<PathBuf> },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingInput { name, searched } => {
                let searched = searched
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "could not find {name} (searched {searched})")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::MissingInput { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
