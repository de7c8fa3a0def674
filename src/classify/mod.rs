//! Classification module: cache plus split-dimension orchestration.
//!
//! The classifier keys a TTL cache on the uploaded content's name,
//! uploads each cache miss to the oracle once, and runs the three
//! dimension rounds concurrently against the prebuilt taxonomy
//! contexts.

mod cache;
mod classifier;

pub use cache::{ClassificationCache, DEFAULT_TTL};
pub use classifier::{Classification, DimensionRoots, SplitClassifier};
