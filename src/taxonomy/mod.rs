//! Taxonomy module: the fixed three-dimensional concept graph.
//!
//! Provides the immutable snapshot the whole service classifies against,
//! plus everything derived from it: identifier/natural-name mapping, the
//! plain-text contexts the oracle reads, and the JSON tree serialization
//! used by API responses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Taxonomy Layer                        │
//! │  ┌──────────────┐ ┌───────────────┐ ┌────────────────┐   │
//! │  │  Snapshot    │ │Context Builder│ │   Serializer   │   │
//! │  │ (arena+index)│ │ (oracle text) │ │ (JSON trees)   │   │
//! │  └──────────────┘ └───────────────┘ └────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod naming;

mod context;
mod serializer;
mod snapshot;
mod types;

pub use context::{ContextBuilder, HierarchyPath};
pub use serializer::ResultSerializer;
pub use snapshot::{EntityRecord, RelationRecord, TaxonomySnapshot};
pub use types::{Dimension, Entity, EntityId, Relation};
