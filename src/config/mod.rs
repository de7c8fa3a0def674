//! Configuration loading and validation.

mod settings;

pub use settings::{
    CacheConfig, Config, LogFormat, LoggingConfig, OracleConfig, ServerConfig, TaxonomyConfig,
};
