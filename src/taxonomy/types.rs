//! Core types for the taxonomy.
//!
//! The taxonomy is a fixed, three-dimensional graph of educational
//! concepts. Entities are arena-allocated and addressed by [`EntityId`];
//! edges are typed by [`Relation`] and stored per entity.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::taxonomy::naming;

// ============================================================================
// Dimensions
// ============================================================================

/// The classification dimension an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Subject-matter areas (mathematics and its subfields).
    Area,
    /// Student abilities challenged by the material.
    Ability,
    /// Representational aspects of the material.
    Scope,
}

impl Dimension {
    /// All dimensions, in classification order.
    pub const ALL: [Dimension; 3] = [Dimension::Area, Dimension::Ability, Dimension::Scope];

    /// Get a human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Dimension::Area => "Area",
            Dimension::Ability => "Ability",
            Dimension::Scope => "Scope",
        }
    }

    /// Title used for this dimension's serialized oracle context.
    pub fn context_title(&self) -> &'static str {
        match self {
            Dimension::Area => "Areas",
            Dimension::Ability => "Abilities",
            Dimension::Scope => "Scopes",
        }
    }

    /// Parse a dimension from its lowercase name.
    pub fn parse(s: &str) -> Option<Dimension> {
        match s.to_ascii_lowercase().as_str() {
            "area" | "areas" => Some(Dimension::Area),
            "ability" | "abilities" => Some(Dimension::Ability),
            "scope" | "scopes" => Some(Dimension::Scope),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Relations
// ============================================================================

/// The type of a directed edge between taxonomy entities.
///
/// Source data records only the forward directions (`HasPart`,
/// `ExpandsTo`); the inverse edges are derived when the snapshot is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    /// Containment: entity has a sub-concept.
    HasPart,
    /// Containment inverse: entity is a sub-concept of another.
    PartOf,
    /// Expansion: entity opens onto concepts of another dimension.
    ExpandsTo,
    /// Expansion inverse.
    ExpandedBy,
}

impl Relation {
    /// Get the inverse relation.
    pub fn inverse(&self) -> Relation {
        match self {
            Relation::HasPart => Relation::PartOf,
            Relation::PartOf => Relation::HasPart,
            Relation::ExpandsTo => Relation::ExpandedBy,
            Relation::ExpandedBy => Relation::ExpandsTo,
        }
    }

    /// Check if this relation records containment (the tree structure).
    pub fn is_containment(&self) -> bool {
        matches!(self, Relation::HasPart | Relation::PartOf)
    }

    /// Get a human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Relation::HasPart => "has part",
            Relation::PartOf => "part of",
            Relation::ExpandsTo => "expands to",
            Relation::ExpandedBy => "expanded by",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Arena index of an entity within a snapshot.
///
/// Ids are only meaningful for the snapshot that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    /// The arena slot this id points at.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A taxonomy entity.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Camel-case identifier, unique within the taxonomy.
    pub name: String,
    /// Space-separated natural name, precomputed at load.
    pub natural_name: String,
    /// The dimension this entity belongs to.
    pub dimension: Dimension,
    /// Definition text shown to the oracle; may be empty.
    pub definition: String,
    /// Outgoing edges, one list per relation, in source order.
    pub(crate) edges: HashMap<Relation, Vec<EntityId>>,
}

impl Entity {
    /// Create an entity with no edges. Natural name is derived from the
    /// identifier.
    pub fn new(name: impl Into<String>, dimension: Dimension, definition: impl Into<String>) -> Self {
        let name = name.into();
        let natural_name = naming::natural_name(&name);
        Self {
            name,
            natural_name,
            dimension,
            definition: definition.into(),
            edges: HashMap::new(),
        }
    }

    /// Targets of this entity's edges for one relation. Empty slice when
    /// the relation has no edges.
    pub fn related(&self, relation: Relation) -> &[EntityId] {
        self.edges.get(&relation).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether this entity has a non-empty definition.
    pub fn has_definition(&self) -> bool {
        !self.definition.is_empty()
    }
}
