//! RELEX Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for development. The loaded [`AppConfig`] is passed
//! into the analyzer components as an explicit immutable context; nothing in
//! the core reads ambient global state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Collaborator service endpoints
    pub servers: ServerConfig,

    /// Local resource files (indicator rules, ontology table)
    pub resources: ResourceConfig,

    /// Enabled concept recognition sources, in priority order
    pub sources: Vec<SourceKind>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("RELEX_HOST") {
            config.servers.host = host;
        }
        for (var, port) in [
            ("RELEX_GENE_PORT", &mut config.servers.gene_port),
            ("RELEX_UMLS_PORT", &mut config.servers.umls_port),
            ("RELEX_HIERARCHY_PORT", &mut config.servers.hierarchy_port),
            ("RELEX_LEXICON_PORT", &mut config.servers.lexicon_port),
            ("RELEX_TAGGER_PORT", &mut config.servers.tagger_port),
            ("RELEX_CHUNKER_PORT", &mut config.servers.chunker_port),
        ] {
            if let Ok(value) = std::env::var(var) {
                *port = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: var.to_string(),
                    value,
                })?;
            }
        }

        if let Ok(value) = std::env::var("RELEX_TIMEOUT_SECS") {
            config.servers.timeout_secs =
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "RELEX_TIMEOUT_SECS".to_string(),
                    value,
                })?;
        }

        if let Ok(value) = std::env::var("RELEX_SOURCES") {
            config.sources = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse())
                .collect::<Result<_, _>>()?;
        }

        if let Ok(path) = std::env::var("RELEX_INDICATOR_FILE") {
            config.resources.indicator_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("RELEX_ONTOLOGY_FILE") {
            config.resources.ontology_file = PathBuf::from(path);
        }

        if let Ok(level) = std::env::var("RELEX_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }
}

/// Collaborator service endpoints and client behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host all collaborator services run on
    pub host: String,

    /// Gene recognizer port
    pub gene_port: u16,

    /// UMLS concept recognizer port
    pub umls_port: u16,

    /// Hierarchy oracle port
    pub hierarchy_port: u16,

    /// Lexicon lookup port
    pub lexicon_port: u16,

    /// Tagger port
    pub tagger_port: u16,

    /// Chunker port
    pub chunker_port: u16,

    /// Per-call connect/read timeout in seconds
    pub timeout_secs: u64,

    /// Bounded retry count per call
    pub retries: u32,

    /// Degrade by skipping a failed recognizer source instead of failing
    /// the document. Tagger and oracle failures are always fatal.
    pub skip_failed_sources: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            gene_port: 12345,
            umls_port: 12346,
            hierarchy_port: 12349,
            lexicon_port: 12350,
            tagger_port: 12351,
            chunker_port: 12352,
            timeout_secs: 5,
            retries: 2,
            skip_failed_sources: false,
        }
    }
}

/// Local resource files loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Indicator rule file (XML)
    pub indicator_file: PathBuf,

    /// Ontology triple table (pipe-delimited flat file)
    pub ontology_file: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            indicator_file: PathBuf::from("resources/semrules.xml"),
            ontology_file: PathBuf::from("resources/ontology_db.txt"),
        }
    }
}

/// The closed set of concept recognition sources.
///
/// Sources are resolved to concrete clients at configuration time; nothing
/// downstream dispatches on source names dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Gene/protein tagger
    Gene,
    /// UMLS concept tagger
    Umls,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gene => "gene",
            Self::Umls => "umls",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gene" => Ok(Self::Gene),
            "umls" => Ok(Self::Umls),
            _ => Err(ConfigError::InvalidValue {
                key: "sources".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
