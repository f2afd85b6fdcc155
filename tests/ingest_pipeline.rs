// tests/ingest_pipeline.rs
//
// Ingestion end-to-end with a canned PlaceSource: evidence file shape,
// zero-review failure, manual imports, and handoff into the scorecard.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tempfile::TempDir;

use spark_dashboard::error::{EngineError, Result};
use spark_dashboard::evidence::EvidenceRules;
use spark_dashboard::ingest::google::{GoogleReview, PlaceDetails, PlaceSource};
use spark_dashboard::ingest::{import_manual, ingest_google};
use spark_dashboard::scorecard::{score_spark, ScorecardRules};
use spark_dashboard::store::{evidence_doc, manual_input_doc, spark_doc, JsonStore};
use spark_dashboard::types::{
    Confidence, EvidenceFile, ReviewEvidenceItem, RiskSignal, Sentiment, Spark,
};

struct MockPlaces {
    resolved: Option<String>,
    details: PlaceDetails,
}

#[async_trait]
impl PlaceSource for MockPlaces {
    async fn resolve_place_id(&self, query: &str) -> Result<String> {
        self.resolved
            .clone()
            .ok_or_else(|| EngineError::Upstream(format!("no place_id found for query: {query}")))
    }

    async fn place_details(&self, _place_id: &str) -> Result<PlaceDetails> {
        Ok(self.details.clone())
    }
}

fn review(text: &str, rating: u8, days_ago: i64) -> GoogleReview {
    let ts = (Utc::now() - Duration::days(days_ago)).timestamp();
    GoogleReview {
        author_name: Some("A. Resident".to_string()),
        rating: Some(rating),
        text: Some(text.to_string()),
        time: Some(ts),
    }
}

fn seeded_store() -> (TempDir, JsonStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path());
    store
        .write(
            &spark_doc("greenwood"),
            &Spark {
                slug: "greenwood".to_string(),
                business_name: "Greenwood Apartments".to_string(),
                review_risk_scan: Default::default(),
                vendor_scorecard: Default::default(),
                extra: serde_json::Map::new(),
            },
        )
        .unwrap();
    (dir, store)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[tokio::test]
async fn google_ingest_writes_scored_evidence() {
    let (_dir, store) = seeded_store();
    let rules = EvidenceRules::default_seed();
    let places = MockPlaces {
        resolved: Some("place-123".to_string()),
        details: PlaceDetails {
            url: Some("https://maps.google.com/x".to_string()),
            reviews: vec![
                review(
                    "They missed pickup again and trash piles up in the hallway",
                    1,
                    5,
                ),
                review("Great service, very professional", 5, 10),
                GoogleReview {
                    author_name: None,
                    rating: Some(4),
                    text: None, // no text → dropped
                    time: Some(Utc::now().timestamp()),
                },
            ],
        },
    };

    let summary = ingest_google(&store, &places, &rules, "greenwood", None, None, today())
        .await
        .unwrap();
    assert_eq!(summary.place_id, "place-123");
    assert_eq!(summary.analyzed, 2);

    let evidence: EvidenceFile = store.read(&evidence_doc("greenwood")).unwrap();
    assert_eq!(evidence.total_analyzed, 2);
    assert_eq!(evidence.sources, vec!["google"]);

    let bad = &evidence.items[0];
    assert_eq!(bad.sentiment, Sentiment::Negative);
    assert!(bad.tags.contains(&"missed_pickup".to_string()));
    assert!(bad.tags.contains(&"overflow".to_string()));
    assert_eq!(bad.source_id.as_deref(), Some("place-123"));
    // missed_pickup + overflow + dumpster_area = 3 tags * 18 + 25 domain = 79
    assert_eq!(bad.relevance_score, 79);

    let good = &evidence.items[1];
    assert_eq!(good.sentiment, Sentiment::Positive);
    assert!(good.tags.is_empty());
    assert_eq!(good.relevance_score, 20);
}

#[tokio::test]
async fn provided_place_id_skips_resolution() {
    let (_dir, store) = seeded_store();
    let rules = EvidenceRules::default_seed();
    let places = MockPlaces {
        resolved: None, // resolution would fail if attempted
        details: PlaceDetails {
            url: None,
            reviews: vec![review("trash everywhere", 2, 3)],
        },
    };

    let summary = ingest_google(
        &store,
        &places,
        &rules,
        "greenwood",
        Some("direct-id".to_string()),
        None,
        today(),
    )
    .await
    .unwrap();
    assert_eq!(summary.place_id, "direct-id");

    let evidence: EvidenceFile = store.read(&evidence_doc("greenwood")).unwrap();
    // No details url → synthesized maps link.
    assert!(evidence.items[0]
        .source_url
        .as_deref()
        .unwrap()
        .contains("direct-id"));
}

#[tokio::test]
async fn zero_reviews_is_an_upstream_error_and_writes_nothing() {
    let (_dir, store) = seeded_store();
    let rules = EvidenceRules::default_seed();
    let places = MockPlaces {
        resolved: Some("place-123".to_string()),
        details: PlaceDetails {
            url: None,
            reviews: vec![],
        },
    };

    let err = ingest_google(&store, &places, &rules, "greenwood", None, None, today())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Upstream(_)));
    assert!(!store.exists(&evidence_doc("greenwood")));
}

#[tokio::test]
async fn all_textless_reviews_is_also_an_error() {
    let (_dir, store) = seeded_store();
    let rules = EvidenceRules::default_seed();
    let places = MockPlaces {
        resolved: Some("place-123".to_string()),
        details: PlaceDetails {
            url: None,
            reviews: vec![GoogleReview {
                author_name: None,
                rating: Some(5),
                text: Some("   ".to_string()),
                time: Some(Utc::now().timestamp()),
            }],
        },
    };

    let err = ingest_google(&store, &places, &rules, "greenwood", None, None, today())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Upstream(_)));
}

#[tokio::test]
async fn unknown_spark_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path());
    let rules = EvidenceRules::default_seed();
    let places = MockPlaces {
        resolved: Some("place-123".to_string()),
        details: PlaceDetails::default(),
    };

    let err = ingest_google(&store, &places, &rules, "ghost", None, None, today())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

fn curated_item(source: &str, relevance: u32, date: &str) -> ReviewEvidenceItem {
    ReviewEvidenceItem {
        source: source.to_string(),
        source_url: None,
        source_id: None,
        platform_rating: None,
        review_date: date.to_string(),
        captured_date: date.to_string(),
        author_handle: None,
        text_raw: "curated".to_string(),
        text_snippet: "curated".to_string(),
        tags: vec!["missed_pickup".to_string()],
        sentiment: Sentiment::Negative,
        relevance_score: relevance,
        severity_score: 70,
        confidence: Confidence::Medium,
    }
}

#[test]
fn manual_import_recomputes_aggregates() {
    let (_dir, store) = seeded_store();

    let mut items = Vec::new();
    for i in 0..12 {
        let source = if i % 2 == 0 { "google" } else { "yelp" };
        items.push(curated_item(source, 90, "2026-08-01"));
    }
    items.push(curated_item("google", 30, "2026-08-02")); // below the relevance cut
    store
        .write(
            &manual_input_doc("greenwood"),
            &serde_json::json!({ "items": items }),
        )
        .unwrap();

    let summary = import_manual(&store, "greenwood", today()).unwrap();
    assert_eq!(summary.imported, 13);
    assert_eq!(summary.confidence, Confidence::High);
    assert_eq!(summary.sources, vec!["google", "yelp"]);

    let evidence: EvidenceFile = store.read(&evidence_doc("greenwood")).unwrap();
    assert_eq!(evidence.relevant_found, 12);
    assert_eq!(evidence.total_analyzed, 13);
}

#[test]
fn manual_import_rejects_empty_items() {
    let (_dir, store) = seeded_store();
    store
        .write(
            &manual_input_doc("greenwood"),
            &serde_json::json!({ "items": [] }),
        )
        .unwrap();
    let err = import_manual(&store, "greenwood", today()).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn manual_import_without_spark_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path());
    let err = import_manual(&store, "ghost", today()).unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn ingest_then_score_updates_the_spark() {
    let (_dir, store) = seeded_store();
    let rules = EvidenceRules::default_seed();
    let places = MockPlaces {
        resolved: Some("place-123".to_string()),
        details: PlaceDetails {
            url: None,
            reviews: vec![
                review("They missed pickup on Monday", 1, 2),
                review("Another missed pickup, second time", 1, 9),
                review("missed pickup yet again", 1, 20),
                review("Of course they missed pickup", 1, 40),
            ],
        },
    };

    ingest_google(&store, &places, &rules, "greenwood", None, None, today())
        .await
        .unwrap();

    let summary =
        score_spark(&store, &ScorecardRules::default_seed(), "greenwood", today()).unwrap();
    // Four missed-pickup mentions: reliability 70 - 20 = 50, others untouched.
    assert_eq!(summary.scorecard.reliability.score, 50);
    assert_eq!(summary.scorecard.overall, 65);
    // All four reviews are within the 90-day window.
    assert_eq!(summary.risk_signal, RiskSignal::High);

    let spark: Spark = store.read(&spark_doc("greenwood")).unwrap();
    assert_eq!(spark.vendor_scorecard.provisional_score, 65);
    assert_eq!(spark.vendor_scorecard.dimensions.reliability, 50);
    assert_eq!(spark.review_risk_scan.risk_signal, RiskSignal::High);
}
