//! Trellis: Taxonomy-Guided Classification for Learning Material
//!
//! A Rust service that classifies uploaded learning material against a
//! fixed three-dimensional taxonomy (Area, Ability, Scope) by delegating
//! the judgment calls to a Gemini-style generative oracle.

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod metrics;
pub mod oracle;
pub mod taxonomy;
pub mod utils;

pub use api::{create_router, ApiState};
pub use classify::{
    Classification, ClassificationCache, DimensionRoots, SplitClassifier, DEFAULT_TTL,
};
pub use config::Config;
pub use error::{
    ClassifyError, ConfigError, OracleError, Result, TaxonomyError, TrellisError,
};
pub use metrics::{get_metrics, Metrics};
pub use oracle::{ClassificationOracle, GeminiOracle, OracleFile};
pub use taxonomy::{
    ContextBuilder, Dimension, Entity, EntityId, EntityRecord, HierarchyPath, Relation,
    RelationRecord, ResultSerializer, TaxonomySnapshot,
};
