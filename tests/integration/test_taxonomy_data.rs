//! Tests over the taxonomy document shipped in `data/`.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use trellis::classify::{DimensionRoots, SplitClassifier};
use trellis::taxonomy::{Dimension, Relation, TaxonomySnapshot};

use crate::support::ScriptedOracle;

fn shipped_snapshot() -> TaxonomySnapshot {
    TaxonomySnapshot::from_file("data/taxonomy.json").unwrap()
}

#[test]
fn test_shipped_taxonomy_loads() {
    let snapshot = shipped_snapshot();
    assert!(snapshot.len() >= 40, "got {} entities", snapshot.len());

    // The default dimension roots must all exist.
    for root in [
        "Mathematics",
        "AnalyticalCapability",
        "RepresentationalScope",
        "AbstractionScope",
        "MeasurementScope",
    ] {
        snapshot.entity(root).unwrap();
    }

    let areas = snapshot.roots(Dimension::Area);
    assert_eq!(areas.len(), 1);
    assert_eq!(snapshot.get(areas[0]).name, "Mathematics");
    assert_eq!(snapshot.roots(Dimension::Ability).len(), 1);
    assert_eq!(snapshot.roots(Dimension::Scope).len(), 3);
}

#[test]
fn test_shipped_expansion_edges_point_at_abilities() {
    let snapshot = shipped_snapshot();
    let id = snapshot.entity("IntegerArithmetic").unwrap();
    let targets = snapshot.children_of(id, Relation::ExpandsTo);
    assert_eq!(targets.len(), 1);
    let target = snapshot.get(targets[0]);
    assert_eq!(target.name, "ProceduralFluency");
    assert_eq!(target.dimension, Dimension::Ability);
}

#[tokio::test]
async fn test_shipped_taxonomy_builds_contexts() {
    let snapshot = Arc::new(shipped_snapshot());
    let classifier = SplitClassifier::new(
        snapshot,
        ScriptedOracle::new("Geometry", &[], &[]),
        &DimensionRoots::default(),
        Duration::from_secs(3600),
    )
    .unwrap();

    let area_context = classifier.context(Dimension::Area);
    assert!(area_context.starts_with("Taxonomy of Areas\n\nA) Outline of Areas\n\n1 Mathematics\n"));

    let (outline, definitions) = area_context.split_once("B) Definitions of Areas").unwrap();
    assert!(outline.contains("1.1 Arithmetic\n"));
    assert!(outline.contains("1.1.1.3 Integer Multiplication\n"));
    assert!(outline.contains("1.3 Geometry\n"));
    assert!(definitions.contains("1.1.1.3 Integer Multiplication\n\nRepeated addition of integers"));
    // Entities without a definition stay out of section B.
    assert!(!definitions.contains("Integer Addition"));

    // Scope roots share one outline with continued top-level numbering.
    let scope_context = classifier.context(Dimension::Scope);
    assert!(scope_context.contains("1 Representational Scope\n"));
    assert!(scope_context.contains("2 Abstraction Scope\n"));
    assert!(scope_context.contains("3 Measurement Scope\n"));
}

#[test]
fn test_snapshot_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taxonomy.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "Mathematics", "dimension": "area", "relations": {"hasPart": ["Arithmetic"]}},
            {"name": "Arithmetic", "dimension": "area", "definition": "Computation with numbers."}
        ]"#,
    )
    .unwrap();

    let snapshot = TaxonomySnapshot::from_file(&path).unwrap();
    assert_eq!(snapshot.len(), 2);
    let root = snapshot.entity("Mathematics").unwrap();
    assert_eq!(snapshot.children_of(root, Relation::HasPart).len(), 1);
}

#[test]
fn test_snapshot_from_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    let err = TaxonomySnapshot::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("read taxonomy file"), "got: {err}");
}
