use thiserror::Error;

/// Crate-wide error type. Every recoverable failure the core produces funnels
/// through here; startup/process-boundary handling lives at the CLI layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(String),
    #[error("database pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("database error: {0}")]
    Diesel(#[from] diesel::result::Error),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("exchange error: {0}")]
    Exchange(String),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("domain invariant violated: {0}")]
    Domain(#[from] DomainError),
}

/// Startup-time configuration failures, surfaced to the CLI boundary.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

/// Invariant violations raised by fallible domain constructors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("position must have at least one leg")]
    EmptyLegs,
    #[error("market snapshot has {outcomes} outcomes but {tokens} token ids")]
    OutcomeTokenMismatch { outcomes: usize, tokens: usize },
    #[error("market snapshot must have at least 2 outcomes")]
    TooFewOutcomes,
    #[error("cannot close a position that is not open")]
    NotOpen,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
