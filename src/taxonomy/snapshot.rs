//! Immutable taxonomy snapshot.
//!
//! The taxonomy is loaded once at startup from a JSON document and never
//! mutated afterwards; handlers share it behind `Arc`. Source data records
//! only forward edges, the inverses are derived here, and every lookup
//! goes through a name map built at load. Unknown names are typed errors,
//! never dynamically created entities.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaxonomyError};
use crate::taxonomy::{Dimension, Entity, EntityId, Relation};

// ============================================================================
// Source records
// ============================================================================

/// One entity as it appears in the taxonomy JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub name: String,
    pub dimension: Dimension,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub relations: RelationRecord,
}

/// Forward edges of one entity record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRecord {
    #[serde(default)]
    pub has_part: Vec<String>,
    #[serde(default)]
    pub expands_to: Vec<String>,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Arena of taxonomy entities plus the name index.
#[derive(Debug)]
pub struct TaxonomySnapshot {
    entities: Vec<Entity>,
    by_name: HashMap<String, EntityId>,
}

impl TaxonomySnapshot {
    /// Load a snapshot from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(TaxonomyError::ReadFile)?;
        Self::from_json(&content)
    }

    /// Load a snapshot from a JSON string holding an array of records.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<EntityRecord> =
            serde_json::from_str(json).map_err(TaxonomyError::Parse)?;
        Self::from_records(records)
    }

    /// Build a snapshot from parsed records, validating names and edges.
    pub fn from_records(records: Vec<EntityRecord>) -> Result<Self> {
        let mut entities = Vec::with_capacity(records.len());
        let mut by_name = HashMap::with_capacity(records.len());

        for record in &records {
            let id = EntityId(entities.len() as u32);
            if by_name.insert(record.name.clone(), id).is_some() {
                return Err(TaxonomyError::DuplicateEntity(record.name.clone()).into());
            }
            entities.push(Entity::new(
                record.name.clone(),
                record.dimension,
                record.definition.clone(),
            ));
        }

        let mut snapshot = Self { entities, by_name };
        for record in &records {
            let from = snapshot.by_name[&record.name];
            for target in &record.relations.has_part {
                let to = snapshot.resolve_target(Relation::HasPart, &record.name, target)?;
                if snapshot.get(from).dimension != snapshot.get(to).dimension {
                    return Err(TaxonomyError::CrossDimension {
                        from: record.name.clone(),
                        to: target.clone(),
                    }
                    .into());
                }
                snapshot.add_edge(from, Relation::HasPart, to);
            }
            for target in &record.relations.expands_to {
                let to = snapshot.resolve_target(Relation::ExpandsTo, &record.name, target)?;
                snapshot.add_edge(from, Relation::ExpandsTo, to);
            }
        }

        Ok(snapshot)
    }

    fn resolve_target(&self, relation: Relation, from: &str, to: &str) -> Result<EntityId> {
        self.by_name.get(to).copied().ok_or_else(|| {
            TaxonomyError::UnknownRelationTarget {
                relation: relation.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            }
            .into()
        })
    }

    // Records the forward edge and its derived inverse.
    fn add_edge(&mut self, from: EntityId, relation: Relation, to: EntityId) {
        self.entities[from.index()]
            .edges
            .entry(relation)
            .or_default()
            .push(to);
        self.entities[to.index()]
            .edges
            .entry(relation.inverse())
            .or_default()
            .push(from);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up an entity by camel-case identifier.
    pub fn entity(&self, name: &str) -> Result<EntityId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| TaxonomyError::UnknownEntity(name.to_string()).into())
    }

    /// Get the entity behind an id.
    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    /// Targets of the outgoing edges of `relation`, in source order.
    pub fn children_of(&self, id: EntityId, relation: Relation) -> &[EntityId] {
        self.get(id).related(relation)
    }

    /// Sources of incoming edges of `relation` (the inverse direction).
    pub fn parents_of(&self, id: EntityId, relation: Relation) -> &[EntityId] {
        self.get(id).related(relation.inverse())
    }

    /// Check whether the entity has no outgoing edges for `relation`.
    pub fn is_leaf(&self, id: EntityId, relation: Relation) -> bool {
        self.children_of(id, relation).is_empty()
    }

    /// Entities of one dimension with no containment parent.
    pub fn roots(&self, dimension: Dimension) -> Vec<EntityId> {
        (0..self.entities.len() as u32)
            .map(EntityId)
            .filter(|id| {
                let e = self.get(*id);
                e.dimension == dimension && e.related(Relation::PartOf).is_empty()
            })
            .collect()
    }

    /// Number of entities in the snapshot.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check whether the snapshot holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
