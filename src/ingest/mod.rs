// src/ingest/mod.rs
//! Review ingestion: turn raw platform reviews into a persisted evidence file.
//!
//! Two paths produce the same document shape:
//! - [`ingest_google`] scores live Google reviews through the evidence rules;
//! - [`import_manual`] wraps a hand-curated item list, recomputing only the
//!   aggregate metadata.
//!
//! Either way, re-running ingestion replaces the whole evidence set.

pub mod google;

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::error::{EngineError, Result};
use crate::evidence::{aggregate_confidence, curated_confidence, EvidenceRules};
use crate::store::{evidence_doc, manual_input_doc, spark_doc, validate_slug, JsonStore};
use crate::types::{Confidence, EvidenceFile, ReviewEvidenceItem, Spark};

use google::PlaceSource;

/// Scored items counting toward `relevant_found` on the Google path.
const RELEVANT_AT: u32 = 60;
/// Curated imports use the original, looser cut.
const CURATED_RELEVANT_ABOVE: u32 = 50;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub slug: String,
    pub place_id: String,
    pub analyzed: u32,
    pub relevant: u32,
    pub confidence: Confidence,
}

/// Fetch and score Google reviews for a spark, then persist the evidence file.
/// Zero usable reviews is an upstream error — an empty evidence file would
/// quietly poison every later scorecard run.
pub async fn ingest_google(
    store: &JsonStore,
    source: &dyn PlaceSource,
    rules: &EvidenceRules,
    slug: &str,
    place_id: Option<String>,
    query: Option<String>,
    today: NaiveDate,
) -> Result<IngestSummary> {
    validate_slug(slug)?;

    let spark: Spark = store.read(&spark_doc(slug)).map_err(|e| match e {
        EngineError::NotFound(_) => EngineError::NotFound(format!("spark {slug} not found")),
        other => other,
    })?;

    let query = query.unwrap_or_else(|| spark.business_name.clone());
    let place_id = match place_id {
        Some(id) => id,
        None => source.resolve_place_id(&query).await?,
    };

    let details = source.place_details(&place_id).await?;
    if details.reviews.is_empty() {
        return Err(EngineError::Upstream(
            "no reviews returned from place details".to_string(),
        ));
    }

    let source_url = details
        .url
        .unwrap_or_else(|| format!("https://maps.google.com/?q=place_id:{place_id}"));
    let captured = today.format("%Y-%m-%d").to_string();

    let mut items = Vec::new();
    for review in details.reviews {
        let (Some(text), Some(time)) = (review.text, review.time) else {
            continue;
        };
        let text = text.trim().to_string();
        if text.is_empty() {
            continue;
        }

        let review_date = chrono::DateTime::from_timestamp(time, 0)
            .ok_or_else(|| EngineError::Validation(format!("malformed review timestamp: {time}")))?
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();

        let rating = review.rating.unwrap_or(0);
        let scored = rules.score_review(&text, rating);

        items.push(ReviewEvidenceItem {
            source: "google".to_string(),
            source_url: Some(source_url.clone()),
            source_id: Some(place_id.clone()),
            platform_rating: Some(f64::from(rating)),
            review_date,
            captured_date: captured.clone(),
            author_handle: review.author_name,
            text_snippet: text.clone(),
            text_raw: text,
            tags: scored.tags,
            sentiment: scored.sentiment,
            relevance_score: scored.relevance_score,
            severity_score: scored.severity_score,
            confidence: scored.confidence,
        });
    }

    if items.is_empty() {
        return Err(EngineError::Upstream(
            "no usable reviews (all lacked text or a timestamp)".to_string(),
        ));
    }

    let sources = vec!["google".to_string()];
    let relevant = items
        .iter()
        .filter(|i| i.relevance_score >= RELEVANT_AT)
        .count();
    let confidence = aggregate_confidence(relevant, sources.len());

    let evidence = EvidenceFile {
        slug: slug.to_string(),
        captured_at: captured,
        confidence,
        total_analyzed: items.len() as u32,
        relevant_found: relevant as u32,
        sources,
        items,
    };
    store.write(&evidence_doc(slug), &evidence)?;

    tracing::info!(
        slug,
        place_id,
        analyzed = evidence.total_analyzed,
        relevant = evidence.relevant_found,
        "google reviews ingested"
    );

    Ok(IngestSummary {
        slug: slug.to_string(),
        place_id,
        analyzed: evidence.total_analyzed,
        relevant: evidence.relevant_found,
        confidence,
    })
}

#[derive(Debug, serde::Deserialize)]
pub struct ManualImportInput {
    pub items: Vec<ReviewEvidenceItem>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub slug: String,
    pub imported: u32,
    pub confidence: Confidence,
    pub sources: Vec<String>,
}

/// Wrap a hand-curated `<slug>-input.json` item list into a full evidence
/// file. Per-item scores are taken as given; only the aggregate metadata is
/// recomputed (count-only confidence, since we did not score relevance).
pub fn import_manual(store: &JsonStore, slug: &str, today: NaiveDate) -> Result<ImportSummary> {
    validate_slug(slug)?;

    if !store.exists(&spark_doc(slug)) {
        return Err(EngineError::NotFound(format!("spark {slug} not found")));
    }

    let input: ManualImportInput = store.read(&manual_input_doc(slug))?;
    if input.items.is_empty() {
        return Err(EngineError::Validation(
            "input items array is empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let sources: Vec<String> = input
        .items
        .iter()
        .map(|i| i.source.clone())
        .filter(|s| seen.insert(s.clone()))
        .collect();

    let relevant = input
        .items
        .iter()
        .filter(|i| i.relevance_score > CURATED_RELEVANT_ABOVE)
        .count();

    let evidence = EvidenceFile {
        slug: slug.to_string(),
        captured_at: today.format("%Y-%m-%d").to_string(),
        confidence: curated_confidence(input.items.len()),
        total_analyzed: input.items.len() as u32,
        relevant_found: relevant as u32,
        sources: sources.clone(),
        items: input.items,
    };
    store.write(&evidence_doc(slug), &evidence)?;

    tracing::info!(
        slug,
        imported = evidence.total_analyzed,
        "manual reviews imported"
    );

    Ok(ImportSummary {
        slug: slug.to_string(),
        imported: evidence.total_analyzed,
        confidence: evidence.confidence,
        sources,
    })
}
