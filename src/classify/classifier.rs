//! Split classification orchestration.
//!
//! One classification is three independent oracle rounds over the same
//! uploaded file: Area wants exactly one best match, Ability and Scope
//! want all matches. The dimension contexts are fixed per snapshot, so
//! they are serialized once at construction. Every oracle answer is
//! mapped back to an identifier and resolved against the snapshot;
//! anything unresolvable fails the whole request rather than degrading
//! to a guess.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex as AsyncMutex;

use crate::classify::ClassificationCache;
use crate::error::{ClassifyError, Result};
use crate::metrics::{get_metrics, Metrics};
use crate::oracle::{prompts, ClassificationOracle, OracleFile};
use crate::taxonomy::{
    naming, ContextBuilder, Dimension, EntityId, Relation, ResultSerializer, TaxonomySnapshot,
};

/// Designated root entity names for each classification dimension.
#[derive(Debug, Clone)]
pub struct DimensionRoots {
    pub areas: Vec<String>,
    pub abilities: Vec<String>,
    pub scopes: Vec<String>,
}

impl Default for DimensionRoots {
    fn default() -> Self {
        Self {
            areas: vec!["Mathematics".to_string()],
            abilities: vec!["AnalyticalCapability".to_string()],
            scopes: vec![
                "RepresentationalScope".to_string(),
                "AbstractionScope".to_string(),
                "MeasurementScope".to_string(),
            ],
        }
    }
}

/// One classification outcome, as snapshot entity ids.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Exactly one matched Area.
    pub areas: Vec<EntityId>,
    /// Zero or more matched Abilities.
    pub abilities: Vec<EntityId>,
    /// Zero or more matched Scopes.
    pub scopes: Vec<EntityId>,
}

impl Classification {
    /// Build the response payload: per-dimension entity records plus the
    /// matched Areas' flattened expansion trees.
    pub fn to_response(&self, snapshot: &TaxonomySnapshot) -> serde_json::Value {
        let serializer = ResultSerializer::new(snapshot);
        let entities = |ids: &[EntityId]| {
            ids.iter()
                .map(|id| serializer.serialize_entity(*id))
                .collect::<Vec<_>>()
        };
        serde_json::json!({
            "classification": {
                "areas": entities(&self.areas),
                "abilities": entities(&self.abilities),
                "scopes": entities(&self.scopes),
            },
            "expansion": {
                "areas": serializer.serialize_tree_with_ancestor_expansion(
                    &self.areas,
                    Relation::ExpandsTo,
                    Relation::PartOf,
                ),
            },
        })
    }
}

/// Orchestrates cache, upload, and the three per-dimension oracle rounds.
pub struct SplitClassifier {
    snapshot: Arc<TaxonomySnapshot>,
    oracle: Arc<dyn ClassificationOracle>,
    cache: ClassificationCache<Classification>,
    area_roots: Vec<EntityId>,
    ability_roots: Vec<EntityId>,
    scope_roots: Vec<EntityId>,
    area_context: String,
    ability_context: String,
    scope_context: String,
    // One async mutex per active cache key so concurrent requests for
    // the same name serialize and late arrivals reuse the cached result.
    in_flight: AsyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SplitClassifier {
    /// Build a classifier over an immutable snapshot. Resolves the
    /// designated roots and serializes the three dimension contexts up
    /// front; unknown root names fail construction.
    pub fn new(
        snapshot: Arc<TaxonomySnapshot>,
        oracle: Arc<dyn ClassificationOracle>,
        roots: &DimensionRoots,
        cache_ttl: Duration,
    ) -> Result<Self> {
        let area_roots = resolve_roots(&snapshot, &roots.areas)?;
        let ability_roots = resolve_roots(&snapshot, &roots.abilities)?;
        let scope_roots = resolve_roots(&snapshot, &roots.scopes)?;

        let builder = ContextBuilder::new(&snapshot);
        let area_context = builder.context(Dimension::Area.context_title(), &area_roots);
        let ability_context = builder.context(Dimension::Ability.context_title(), &ability_roots);
        let scope_context = builder.context(Dimension::Scope.context_title(), &scope_roots);

        Ok(Self {
            snapshot,
            oracle,
            cache: ClassificationCache::new(cache_ttl),
            area_roots,
            ability_roots,
            scope_roots,
            area_context,
            ability_context,
            scope_context,
            in_flight: AsyncMutex::new(HashMap::new()),
        })
    }

    /// The designated root ids for one dimension.
    pub fn roots(&self, dimension: Dimension) -> &[EntityId] {
        match dimension {
            Dimension::Area => &self.area_roots,
            Dimension::Ability => &self.ability_roots,
            Dimension::Scope => &self.scope_roots,
        }
    }

    /// The serialized oracle context for one dimension.
    pub fn context(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Area => &self.area_context,
            Dimension::Ability => &self.ability_context,
            Dimension::Scope => &self.scope_context,
        }
    }

    /// Classify uploaded content. `name` keys the cache; repeated
    /// requests under the same name within the TTL return the cached
    /// outcome without any oracle traffic. Without a name a random one
    /// is generated, which makes the result effectively uncacheable.
    pub async fn classify(
        &self,
        name: Option<&str>,
        mime_type: &str,
        content: Bytes,
    ) -> Result<Classification> {
        let effective_name = match name {
            Some(n) => n.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let key = cache_key(&effective_name);

        let metrics = get_metrics();
        let timer = Metrics::start_timer(&metrics.classification_duration_seconds);

        let key_lock = self.key_lock(&key).await;
        let guard = key_lock.lock().await;
        let result = self
            .classify_locked(&key, &effective_name, mime_type, content)
            .await;
        drop(guard);
        self.release_key_lock(&key).await;

        match &result {
            Ok(classification) => {
                metrics.classifications_total.inc();
                tracing::info!(
                    name = %effective_name,
                    areas = classification.areas.len(),
                    abilities = classification.abilities.len(),
                    scopes = classification.scopes.len(),
                    elapsed_ms = timer.elapsed().as_millis() as u64,
                    "Classified learning material"
                );
            }
            Err(e) => {
                metrics.classification_errors_total.inc();
                tracing::warn!(name = %effective_name, error = %e, "Classification failed");
            }
        }
        result
    }

    // Runs with the per-key lock held.
    async fn classify_locked(
        &self,
        key: &str,
        name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> Result<Classification> {
        if let Some(cached) = self.cache.get(key) {
            tracing::debug!(key = %key, "Classification cache hit");
            return Ok(cached);
        }
        tracing::debug!(key = %key, "Classification cache miss");

        let file = self.oracle.upload(name, mime_type, content).await?;

        let (areas, abilities, scopes) = tokio::try_join!(
            self.classify_area(&file),
            self.classify_ability(&file),
            self.classify_scope(&file),
        )?;

        let classification = Classification {
            areas,
            abilities,
            scopes,
        };
        self.cache.update(key.to_string(), classification.clone());
        Ok(classification)
    }

    async fn classify_area(&self, file: &OracleFile) -> Result<Vec<EntityId>> {
        let answer = self
            .oracle
            .best_match(
                file,
                &self.area_context,
                prompts::priming_instruction(Dimension::Area),
                prompts::matching_instruction(Dimension::Area),
            )
            .await?;
        if answer.trim().is_empty() {
            return Err(
                ClassifyError::NoMatch(Dimension::Area.display_name().to_lowercase()).into(),
            );
        }
        Ok(vec![self.resolve_answer(Dimension::Area, &answer)?])
    }

    async fn classify_ability(&self, file: &OracleFile) -> Result<Vec<EntityId>> {
        let answers = self
            .oracle
            .all_matches(
                file,
                &self.ability_context,
                prompts::priming_instruction(Dimension::Ability),
                prompts::matching_instruction(Dimension::Ability),
            )
            .await?;
        answers
            .iter()
            .map(|answer| self.resolve_answer(Dimension::Ability, answer))
            .collect()
    }

    async fn classify_scope(&self, file: &OracleFile) -> Result<Vec<EntityId>> {
        let answers = self
            .oracle
            .all_matches(
                file,
                &self.scope_context,
                prompts::priming_instruction(Dimension::Scope),
                prompts::matching_instruction(Dimension::Scope),
            )
            .await?;
        answers
            .iter()
            .map(|answer| self.resolve_answer(Dimension::Scope, answer))
            .collect()
    }

    // Oracle answers are natural names from the dimension's outline.
    // Strip the spaces, resolve, and require the dimension to match;
    // never substitute a fallback entity.
    fn resolve_answer(&self, dimension: Dimension, answer: &str) -> Result<EntityId> {
        let identifier = naming::identifier(answer.trim());
        let unmatched = || ClassifyError::UnmatchedTerm {
            dimension: dimension.display_name().to_lowercase(),
            answer: answer.to_string(),
        };

        let id = self.snapshot.entity(&identifier).map_err(|_| unmatched())?;
        if self.snapshot.get(id).dimension != dimension {
            return Err(unmatched().into());
        }
        Ok(id)
    }

    async fn key_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        in_flight.entry(key.to_string()).or_default().clone()
    }

    // Drop the per-key mutex once the last holder is done; waiters that
    // queued behind it hold their own Arc and re-check the cache.
    async fn release_key_lock(&self, key: &str) {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(lock) = in_flight.get(key) {
            if Arc::strong_count(lock) <= 2 {
                in_flight.remove(key);
            }
        }
    }
}

fn resolve_roots(snapshot: &TaxonomySnapshot, names: &[String]) -> Result<Vec<EntityId>> {
    names.iter().map(|name| snapshot.entity(name)).collect()
}

/// Cache key: lowercase hex SHA-256 of the content name.
fn cache_key(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}
