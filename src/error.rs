//! Error types for the Trellis classification service.

use thiserror::Error;

/// Main error type for Trellis operations.
#[derive(Error, Debug)]
pub enum TrellisError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Path expansion failed: {0}")]
    PathExpansion(String),
}

/// Taxonomy loading and lookup errors.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Failed to read taxonomy file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse taxonomy: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("Relation {relation} from {from} targets unknown entity {to}")]
    UnknownRelationTarget {
        relation: String,
        from: String,
        to: String,
    },

    #[error("Containment edge {from} -> {to} crosses dimensions")]
    CrossDimension { from: String, to: String },
}

/// Oracle (generative API) errors.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("Missing API key: set oracle.api_key or GEMINI_API_KEY")]
    MissingApiKey,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("File upload failed: {0}")]
    Upload(String),
}

/// Classification orchestration errors.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Oracle answer {answer:?} matches no {dimension} entity")]
    UnmatchedTerm { dimension: String, answer: String },

    #[error("Expected exactly one {0} match, oracle returned none")]
    NoMatch(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
}

/// Result type alias for Trellis operations.
pub type Result<T> = std::result::Result<T, TrellisError>;
