//! Serialization of a taxonomy dimension into the oracle's text context.
//!
//! The oracle receives each dimension as a two-part plain-text block: a
//! numbered outline of the containment tree, then numbered definitions for
//! every entity that has one. Outline numbers are hierarchy paths
//! (`1.1.2`), 1-based, dot-joined, assigned in DFS pre-order with sibling
//! order taken from the source data.

use std::fmt;

use crate::taxonomy::{EntityId, Relation, TaxonomySnapshot};

// ============================================================================
// Hierarchy paths
// ============================================================================

/// Position of an entity in the outline, as 1-based sibling indexes from
/// the root. Renders dot-joined with no trailing dot (`1`, `1.1`, `1.1.2`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierarchyPath(Vec<usize>);

impl HierarchyPath {
    /// Path of the `index`-th top-level root (1-based).
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path of this node's `index`-th child (1-based).
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Nesting depth; roots have depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

// ============================================================================
// Context builder
// ============================================================================

/// Builds the text context for one dimension of the taxonomy.
pub struct ContextBuilder<'a> {
    snapshot: &'a TaxonomySnapshot,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(snapshot: &'a TaxonomySnapshot) -> Self {
        Self { snapshot }
    }

    /// Numbered outline, one `"{path} {natural_name}\n"` line per entity.
    /// Multiple roots continue the top-level numbering.
    pub fn outline(&self, roots: &[EntityId]) -> String {
        let mut out = String::new();
        self.walk(roots, |entity_id, path| {
            let entity = self.snapshot.get(entity_id);
            out.push_str(&format!("{path} {}\n", entity.natural_name));
        });
        out
    }

    /// Numbered definitions, `"{path} {natural_name}\n\n{definition}\n\n"`
    /// per entity. Entities without a definition are skipped entirely.
    pub fn definitions(&self, roots: &[EntityId]) -> String {
        let mut out = String::new();
        self.walk(roots, |entity_id, path| {
            let entity = self.snapshot.get(entity_id);
            if entity.has_definition() {
                out.push_str(&format!(
                    "{path} {}\n\n{}\n\n",
                    entity.natural_name, entity.definition
                ));
            }
        });
        out
    }

    /// The full two-part context block the oracle reads.
    pub fn context(&self, title: &str, roots: &[EntityId]) -> String {
        format!(
            "Taxonomy of {title}\n\nA) Outline of {title}\n\n{}\n\nB) Definitions of {title}\n\n{}",
            self.outline(roots),
            self.definitions(roots)
        )
    }

    // DFS pre-order over the containment tree, visiting each entity with
    // its hierarchy path.
    fn walk(&self, roots: &[EntityId], mut visit: impl FnMut(EntityId, &HierarchyPath)) {
        for (i, root) in roots.iter().enumerate() {
            self.walk_node(*root, HierarchyPath::root(i + 1), &mut visit);
        }
    }

    fn walk_node(
        &self,
        entity_id: EntityId,
        path: HierarchyPath,
        visit: &mut impl FnMut(EntityId, &HierarchyPath),
    ) {
        visit(entity_id, &path);
        let children = self.snapshot.children_of(entity_id, Relation::HasPart);
        for (i, child) in children.iter().enumerate() {
            self.walk_node(*child, path.child(i + 1), visit);
        }
    }
}
