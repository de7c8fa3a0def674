//! JSON serialization of entities and subtrees for API responses.
//!
//! Response nodes carry the camel-case identifier and the natural name; a
//! `children` key appears only when the node actually has children under
//! the requested relation. Leaves get no `children` key at all, which the
//! consuming charts rely on.

use serde_json::{Map, Value};

use crate::taxonomy::{EntityId, Relation, TaxonomySnapshot};

/// Serializes snapshot entities into response-ready JSON values.
pub struct ResultSerializer<'a> {
    snapshot: &'a TaxonomySnapshot,
}

impl<'a> ResultSerializer<'a> {
    pub fn new(snapshot: &'a TaxonomySnapshot) -> Self {
        Self { snapshot }
    }

    /// `{ "name": identifier, "natural_name": natural name }`.
    pub fn serialize_entity(&self, id: EntityId) -> Value {
        Value::Object(self.entity_object(id))
    }

    /// Map each entity to its object plus, for entities with children
    /// under `relation`, a `children` array of recursively serialized
    /// subtrees.
    pub fn serialize_tree(&self, ids: &[EntityId], relation: Relation) -> Vec<Value> {
        ids.iter().map(|id| self.tree_node(*id, relation)).collect()
    }

    /// Map each entity to its object plus a flattened expansion: the
    /// entity's own children under `expand_relation`, then, walking every
    /// ancestor reachable via `ancestor_relation`, each ancestor's
    /// children under `expand_relation`, serialized as trees over
    /// `expand_relation`. Surfaces the related entities around a
    /// classified Area.
    pub fn serialize_tree_with_ancestor_expansion(
        &self,
        ids: &[EntityId],
        expand_relation: Relation,
        ancestor_relation: Relation,
    ) -> Vec<Value> {
        ids.iter()
            .map(|id| {
                let mut obj = self.entity_object(*id);
                let mut candidates = Vec::new();
                self.collect_expansions(*id, expand_relation, ancestor_relation, &mut candidates);
                if !candidates.is_empty() {
                    obj.insert(
                        "children".to_string(),
                        Value::Array(self.serialize_tree(&candidates, expand_relation)),
                    );
                }
                Value::Object(obj)
            })
            .collect()
    }

    fn entity_object(&self, id: EntityId) -> Map<String, Value> {
        let entity = self.snapshot.get(id);
        let mut obj = Map::new();
        obj.insert("name".to_string(), Value::String(entity.name.clone()));
        obj.insert(
            "natural_name".to_string(),
            Value::String(entity.natural_name.clone()),
        );
        obj
    }

    fn tree_node(&self, id: EntityId, relation: Relation) -> Value {
        let mut obj = self.entity_object(id);
        let children = self.snapshot.children_of(id, relation);
        if !children.is_empty() {
            obj.insert(
                "children".to_string(),
                Value::Array(self.serialize_tree(children, relation)),
            );
        }
        Value::Object(obj)
    }

    // Own expansions first, then ancestors' in walk-up order.
    fn collect_expansions(
        &self,
        id: EntityId,
        expand_relation: Relation,
        ancestor_relation: Relation,
        out: &mut Vec<EntityId>,
    ) {
        out.extend_from_slice(self.snapshot.children_of(id, expand_relation));
        for ancestor in self.snapshot.children_of(id, ancestor_relation) {
            self.collect_expansions(*ancestor, expand_relation, ancestor_relation, out);
        }
    }
}
