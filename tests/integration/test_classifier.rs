//! End-to-end classification tests against a scripted oracle.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use trellis::classify::{DimensionRoots, SplitClassifier};
use trellis::config::OracleConfig;
use trellis::oracle::GeminiOracle;
use trellis::taxonomy::TaxonomySnapshot;

use crate::support::{names, sample_snapshot, ScriptedOracle};

const TTL: Duration = Duration::from_secs(3600);

fn content() -> Bytes {
    Bytes::from_static(b"Worksheet: compute 7 x 8, 6 x 9, and 12 x 5.")
}

fn split_classifier(
    snapshot: Arc<TaxonomySnapshot>,
    oracle: Arc<ScriptedOracle>,
    ttl: Duration,
) -> SplitClassifier {
    SplitClassifier::new(snapshot, oracle, &DimensionRoots::default(), ttl).unwrap()
}

#[tokio::test]
async fn test_classify_happy_path() {
    let snapshot = sample_snapshot();
    let oracle = ScriptedOracle::new(
        "Integer Multiplication",
        &["Procedural Fluency", "Logical Reasoning"],
        &["Symbolic Representation"],
    );
    let classifier = split_classifier(snapshot.clone(), oracle.clone(), TTL);

    let result = classifier
        .classify(Some("worksheet-7"), "application/pdf", content())
        .await
        .unwrap();

    assert_eq!(names(&snapshot, &result.areas), vec!["IntegerMultiplication"]);
    assert_eq!(
        names(&snapshot, &result.abilities),
        vec!["ProceduralFluency", "LogicalReasoning"]
    );
    assert_eq!(
        names(&snapshot, &result.scopes),
        vec!["SymbolicRepresentation"]
    );

    // One upload, then one matching round per dimension.
    assert_eq!(oracle.uploads(), 1);
    assert_eq!(oracle.matches(), 3);
}

#[tokio::test]
async fn test_empty_ability_and_scope_answers_are_valid() {
    let snapshot = sample_snapshot();
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let classifier = split_classifier(snapshot.clone(), oracle, TTL);

    let result = classifier
        .classify(Some("shapes"), "application/pdf", content())
        .await
        .unwrap();

    assert_eq!(names(&snapshot, &result.areas), vec!["Geometry"]);
    assert!(result.abilities.is_empty());
    assert!(result.scopes.is_empty());
}

#[tokio::test]
async fn test_cached_classification_skips_oracle() {
    let snapshot = sample_snapshot();
    let oracle = ScriptedOracle::new("Integer Multiplication", &["Procedural Fluency"], &[]);
    let classifier = split_classifier(snapshot.clone(), oracle.clone(), TTL);

    let first = classifier
        .classify(Some("worksheet-7"), "application/pdf", content())
        .await
        .unwrap();
    let second = classifier
        .classify(Some("worksheet-7"), "application/pdf", content())
        .await
        .unwrap();

    assert_eq!(
        names(&snapshot, &first.areas),
        names(&snapshot, &second.areas)
    );
    assert_eq!(oracle.uploads(), 1, "second call must be served from cache");
    assert_eq!(oracle.matches(), 3);
}

#[tokio::test]
async fn test_cache_expiry_requires_fresh_judgment() {
    let snapshot = sample_snapshot();
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let classifier = split_classifier(snapshot, oracle.clone(), Duration::from_millis(50));

    classifier
        .classify(Some("shapes"), "application/pdf", content())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    classifier
        .classify(Some("shapes"), "application/pdf", content())
        .await
        .unwrap();

    assert_eq!(oracle.uploads(), 2, "expired entry must not be served");
    assert_eq!(oracle.matches(), 6);
}

#[tokio::test]
async fn test_distinct_names_classified_separately() {
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let classifier = split_classifier(sample_snapshot(), oracle.clone(), TTL);

    classifier
        .classify(Some("first"), "application/pdf", content())
        .await
        .unwrap();
    classifier
        .classify(Some("second"), "application/pdf", content())
        .await
        .unwrap();

    assert_eq!(oracle.uploads(), 2);
}

#[tokio::test]
async fn test_missing_name_generates_one_per_call() {
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let classifier = split_classifier(sample_snapshot(), oracle.clone(), TTL);

    classifier
        .classify(None, "application/pdf", content())
        .await
        .unwrap();
    classifier
        .classify(None, "application/pdf", content())
        .await
        .unwrap();

    // Anonymous uploads never share a cache entry.
    assert_eq!(oracle.uploads(), 2);
}

#[tokio::test]
async fn test_concurrent_same_name_single_upload() {
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let classifier = split_classifier(sample_snapshot(), oracle.clone(), TTL);

    let (a, b) = tokio::join!(
        classifier.classify(Some("same"), "application/pdf", content()),
        classifier.classify(Some("same"), "application/pdf", content()),
    );
    a.unwrap();
    b.unwrap();

    // The name lock serializes the pair; the loser finds the cache filled.
    assert_eq!(oracle.uploads(), 1);
    assert_eq!(oracle.matches(), 3);
}

#[tokio::test]
async fn test_unmatched_area_answer_is_error() {
    let oracle = ScriptedOracle::new("Alchemy", &[], &[]);
    let classifier = split_classifier(sample_snapshot(), oracle.clone(), TTL);

    let err = classifier
        .classify(Some("weird"), "application/pdf", content())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Alchemy"), "got: {err}");

    // Failures are not cached; a retry asks the oracle again.
    classifier
        .classify(Some("weird"), "application/pdf", content())
        .await
        .unwrap_err();
    assert_eq!(oracle.uploads(), 2);
}

#[tokio::test]
async fn test_empty_area_answer_is_error() {
    let oracle = ScriptedOracle::new("", &[], &[]);
    let classifier = split_classifier(sample_snapshot(), oracle, TTL);

    let err = classifier
        .classify(Some("blank"), "application/pdf", content())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("area"), "got: {err}");
}

#[tokio::test]
async fn test_answer_from_wrong_dimension_is_error() {
    // "Geometry" exists, but it is an Area, not an Ability.
    let oracle = ScriptedOracle::new("Integer Multiplication", &["Geometry"], &[]);
    let classifier = split_classifier(sample_snapshot(), oracle, TTL);

    let err = classifier
        .classify(Some("cross"), "application/pdf", content())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no ability entity"), "got: {err}");
}

#[tokio::test]
async fn test_response_shape() {
    let snapshot = sample_snapshot();
    let oracle = ScriptedOracle::new("Integer Multiplication", &["Procedural Fluency"], &[]);
    let classifier = split_classifier(snapshot.clone(), oracle, TTL);

    let result = classifier
        .classify(Some("worksheet-7"), "application/pdf", content())
        .await
        .unwrap();
    let response = result.to_response(&snapshot);

    let area = &response["classification"]["areas"][0];
    assert_eq!(area["name"], "IntegerMultiplication");
    assert_eq!(area["natural_name"], "Integer Multiplication");
    assert_eq!(
        response["classification"]["scopes"].as_array().unwrap().len(),
        0
    );

    // The matched Area is expanded with its own and its ancestors'
    // expandsTo targets, nearest first.
    let expanded: Vec<&str> = response["expansion"]["areas"][0]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        expanded,
        vec!["ComputationalAccuracy", "AnalyticalCapability"]
    );
}

#[tokio::test]
#[ignore = "requires GEMINI_API_KEY - run with cargo test -- --ignored"]
async fn test_live_gemini_classification() {
    let snapshot = Arc::new(TaxonomySnapshot::from_file("data/taxonomy.json").unwrap());
    let oracle = Arc::new(GeminiOracle::from_config(&OracleConfig::default()).unwrap());
    let classifier = SplitClassifier::new(
        snapshot.clone(),
        oracle,
        &DimensionRoots::default(),
        TTL,
    )
    .unwrap();

    let result = classifier
        .classify(
            Some("integration-live-worksheet"),
            "text/plain",
            Bytes::from_static(b"Worksheet: compute 7 x 8, 6 x 9, and 12 x 5. Show your work."),
        )
        .await
        .unwrap();

    assert_eq!(result.areas.len(), 1, "exactly one area must match");
}
