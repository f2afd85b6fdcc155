// src/scorecard.rs
//! # Vendor Scorecard
//!
//! Turns an evidence file into four 0–100 dimension scores plus an overall
//! mean, and a Low/Medium/High risk signal from recent-mention density.
//! Deduction weights and caps live in a swappable [`ScorecardRules`] table.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::store::{evidence_doc, spark_doc, validate_slug, JsonStore};
use crate::types::{EvidenceFile, RiskSignal, ScorecardDimensions, Spark};

pub const DEFAULT_SCORECARD_RULES_PATH: &str = "config/scorecard.json";
pub const ENV_SCORECARD_RULES_PATH: &str = "SCORECARD_RULES_PATH";

/// One scorecard dimension: which tags count against it, how hard, and what
/// the deduction is called in the display note.
#[derive(Debug, Clone, Deserialize)]
pub struct DimensionRule {
    pub tags: Vec<String>,
    pub cap: u32,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScorecardRules {
    #[serde(default = "default_base_score")]
    pub base_score: u32,
    #[serde(default = "default_floor_score")]
    pub floor_score: u32,
    #[serde(default = "default_points_per_mention")]
    pub points_per_mention: u32,
    #[serde(default = "default_reliability")]
    pub reliability: DimensionRule,
    #[serde(default = "default_resident_experience")]
    pub resident_experience: DimensionRule,
    #[serde(default = "default_issue_response")]
    pub issue_response: DimensionRule,
    #[serde(default = "default_communication")]
    pub communication: DimensionRule,

    // Risk signal knobs.
    #[serde(default = "default_min_analyzed")]
    pub min_analyzed: u32,
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
    #[serde(default = "default_high_at")]
    pub high_at: usize,
    #[serde(default = "default_medium_at")]
    pub medium_at: usize,
}

fn default_base_score() -> u32 {
    70
}
fn default_floor_score() -> u32 {
    40
}
fn default_points_per_mention() -> u32 {
    5
}
fn default_reliability() -> DimensionRule {
    DimensionRule {
        tags: vec!["missed_pickup".to_string()],
        cap: 30,
        label: "missed pickups".to_string(),
    }
}
fn default_resident_experience() -> DimensionRule {
    DimensionRule {
        tags: vec!["odor".to_string(), "overflow".to_string()],
        cap: 25,
        label: "complaints".to_string(),
    }
}
fn default_issue_response() -> DimensionRule {
    DimensionRule {
        tags: vec!["issue_response".to_string()],
        cap: 25,
        label: "response issues".to_string(),
    }
}
fn default_communication() -> DimensionRule {
    DimensionRule {
        tags: vec!["communication".to_string()],
        cap: 25,
        label: "comm issues".to_string(),
    }
}
// 90-day approximation of "the last three months".
fn default_recent_days() -> i64 {
    90
}
fn default_min_analyzed() -> u32 {
    3
}
fn default_high_at() -> usize {
    4
}
fn default_medium_at() -> usize {
    2
}

impl Default for ScorecardRules {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl ScorecardRules {
    pub fn default_seed() -> Self {
        Self {
            base_score: default_base_score(),
            floor_score: default_floor_score(),
            points_per_mention: default_points_per_mention(),
            reliability: default_reliability(),
            resident_experience: default_resident_experience(),
            issue_response: default_issue_response(),
            communication: default_communication(),
            min_analyzed: default_min_analyzed(),
            recent_days: default_recent_days(),
            high_at: default_high_at(),
            medium_at: default_medium_at(),
        }
    }

    /// Load from a JSON file.
    /// Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|_| Self::default_seed()),
            Err(_) => Self::default_seed(),
        }
    }

    pub fn load_from_env() -> Self {
        let path = std::env::var(ENV_SCORECARD_RULES_PATH)
            .unwrap_or_else(|_| DEFAULT_SCORECARD_RULES_PATH.to_string());
        Self::load_from_file(path)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DimensionScore {
    pub score: u32,
    /// Display-only: which deduction applied, if any.
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardResult {
    pub reliability: DimensionScore,
    pub resident_experience: DimensionScore,
    pub issue_response: DimensionScore,
    pub communication: DimensionScore,
    pub overall: u32,
}

impl ScorecardResult {
    pub fn dimensions(&self) -> ScorecardDimensions {
        ScorecardDimensions {
            reliability: self.reliability.score,
            resident_experience: self.resident_experience.score,
            issue_response: self.issue_response.score,
            communication: self.communication.score,
        }
    }
}

/// Recent negative-review density. Fewer than `min_analyzed` items is always
/// Low — not enough data to call anything.
///
/// Malformed review dates are a hard error; silently treating them as epoch
/// would skew the recency window.
pub fn compute_risk_signal(
    evidence: &EvidenceFile,
    now: NaiveDate,
    rules: &ScorecardRules,
) -> Result<RiskSignal> {
    if evidence.total_analyzed < rules.min_analyzed {
        return Ok(RiskSignal::Low);
    }

    let mut recent = 0usize;
    for item in &evidence.items {
        let date = NaiveDate::parse_from_str(&item.review_date, "%Y-%m-%d").map_err(|_| {
            EngineError::Validation(format!("malformed review date: {:?}", item.review_date))
        })?;
        if (now - date).num_days() <= rules.recent_days {
            recent += 1;
        }
    }

    Ok(if recent >= rules.high_at {
        RiskSignal::High
    } else if recent >= rules.medium_at {
        RiskSignal::Medium
    } else {
        RiskSignal::Low
    })
}

/// Base score per dimension, minus capped per-mention deductions, floored.
/// Total over any evidence shape, including none at all.
pub fn compute_scorecard(evidence: Option<&EvidenceFile>, rules: &ScorecardRules) -> ScorecardResult {
    let Some(evidence) = evidence else {
        let blank = |_: &DimensionRule| DimensionScore {
            score: rules.base_score,
            note: "(no evidence)".to_string(),
        };
        return ScorecardResult {
            reliability: blank(&rules.reliability),
            resident_experience: blank(&rules.resident_experience),
            issue_response: blank(&rules.issue_response),
            communication: blank(&rules.communication),
            overall: rules.base_score,
        };
    };

    // Each item contributes a tag once, regardless of repetition in its own set.
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for item in &evidence.items {
        let distinct: HashSet<&str> = item.tags.iter().map(|t| t.as_str()).collect();
        for tag in distinct {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }

    let score_dim = |rule: &DimensionRule| {
        let mentions: u32 = rule
            .tags
            .iter()
            .map(|t| counts.get(t.as_str()).copied().unwrap_or(0))
            .sum();
        let deduction = (rules.points_per_mention * mentions).min(rule.cap);
        let score = (rules.base_score.saturating_sub(deduction)).max(rules.floor_score);
        let note = if deduction > 0 {
            format!("(-{deduction} from {})", rule.label)
        } else {
            String::new()
        };
        DimensionScore { score, note }
    };

    let reliability = score_dim(&rules.reliability);
    let resident_experience = score_dim(&rules.resident_experience);
    let issue_response = score_dim(&rules.issue_response);
    let communication = score_dim(&rules.communication);

    let sum = reliability.score
        + resident_experience.score
        + issue_response.score
        + communication.score;
    let overall = (f64::from(sum) / 4.0).round() as u32;

    ScorecardResult {
        reliability,
        resident_experience,
        issue_response,
        communication,
        overall,
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SparkScoreSummary {
    pub slug: String,
    pub business_name: String,
    pub risk_signal: RiskSignal,
    pub scorecard: ScorecardResult,
}

/// Recompute the scorecard for a spark and persist it onto the spark record.
/// Absent evidence falls back to the no-evidence defaults; an absent spark is
/// a hard NotFound.
pub fn score_spark(
    store: &JsonStore,
    rules: &ScorecardRules,
    slug: &str,
    now: NaiveDate,
) -> Result<SparkScoreSummary> {
    validate_slug(slug)?;

    let mut spark: Spark = store
        .read(&spark_doc(slug))
        .map_err(|e| match e {
            EngineError::NotFound(_) => EngineError::NotFound(format!("spark {slug} not found")),
            other => other,
        })?;
    let evidence: Option<EvidenceFile> = store.read_optional(&evidence_doc(slug))?;

    let risk_signal = match &evidence {
        Some(e) => compute_risk_signal(e, now, rules)?,
        None => RiskSignal::Low,
    };
    let scorecard = compute_scorecard(evidence.as_ref(), rules);

    spark.review_risk_scan.risk_signal = risk_signal;
    spark.vendor_scorecard.provisional_score = scorecard.overall;
    spark.vendor_scorecard.dimensions = scorecard.dimensions();
    store.write(&spark_doc(slug), &spark)?;

    tracing::info!(
        slug,
        risk = ?risk_signal,
        overall = scorecard.overall,
        "scorecard recomputed"
    );

    Ok(SparkScoreSummary {
        slug: slug.to_string(),
        business_name: spark.business_name,
        risk_signal,
        scorecard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confidence, ReviewEvidenceItem, Sentiment};

    fn item(date: &str, tags: &[&str]) -> ReviewEvidenceItem {
        ReviewEvidenceItem {
            source: "google".to_string(),
            source_url: None,
            source_id: None,
            platform_rating: Some(1.0),
            review_date: date.to_string(),
            captured_date: "2026-08-01".to_string(),
            author_handle: None,
            text_raw: String::new(),
            text_snippet: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            sentiment: Sentiment::Negative,
            relevance_score: 70,
            severity_score: 70,
            confidence: Confidence::Medium,
        }
    }

    fn evidence(items: Vec<ReviewEvidenceItem>) -> EvidenceFile {
        EvidenceFile {
            slug: "x".to_string(),
            captured_at: "2026-08-01".to_string(),
            confidence: Confidence::Medium,
            total_analyzed: items.len() as u32,
            relevant_found: items.len() as u32,
            sources: vec!["google".to_string()],
            items,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn four_missed_pickups_cost_twenty() {
        let rules = ScorecardRules::default_seed();
        let e = evidence(vec![
            item("2026-01-01", &["missed_pickup"]),
            item("2026-01-02", &["missed_pickup"]),
            item("2026-01-03", &["missed_pickup"]),
            item("2026-01-04", &["missed_pickup"]),
        ]);
        let s = compute_scorecard(Some(&e), &rules);
        assert_eq!(s.reliability.score, 50);
        assert_eq!(s.reliability.note, "(-20 from missed pickups)");
        assert_eq!(s.communication.score, 70);
        assert_eq!(s.communication.note, "");
        // (50 + 70 + 70 + 70) / 4 = 65
        assert_eq!(s.overall, 65);
    }

    #[test]
    fn deductions_are_capped_and_floored() {
        let rules = ScorecardRules::default_seed();
        let items: Vec<_> = (0..20)
            .map(|i| item(&format!("2026-01-{:02}", i + 1), &["missed_pickup", "odor", "overflow"]))
            .collect();
        let s = compute_scorecard(Some(&evidence(items)), &rules);
        // 20 mentions * 5 = 100, capped at 30 → 40; never below the floor.
        assert_eq!(s.reliability.score, 40);
        assert_eq!(s.resident_experience.score, 45);
        assert!(s.reliability.score >= rules.floor_score);
    }

    #[test]
    fn floor_holds_even_with_a_loose_cap() {
        let mut rules = ScorecardRules::default_seed();
        rules.reliability.cap = 60;
        let items: Vec<_> = (0..20)
            .map(|i| item(&format!("2026-01-{:02}", i + 1), &["missed_pickup"]))
            .collect();
        let s = compute_scorecard(Some(&evidence(items)), &rules);
        assert_eq!(s.reliability.score, rules.floor_score);
    }

    #[test]
    fn duplicate_tags_within_one_item_count_once() {
        let rules = ScorecardRules::default_seed();
        let e = evidence(vec![item("2026-01-01", &["missed_pickup", "missed_pickup"])]);
        let s = compute_scorecard(Some(&e), &rules);
        assert_eq!(s.reliability.score, 65);
    }

    #[test]
    fn no_evidence_defaults() {
        let rules = ScorecardRules::default_seed();
        let s = compute_scorecard(None, &rules);
        assert_eq!(s.overall, 70);
        assert_eq!(s.reliability.score, 70);
        assert_eq!(s.reliability.note, "(no evidence)");
    }

    #[test]
    fn risk_signal_tiers() {
        let rules = ScorecardRules::default_seed();
        let now = day("2026-08-30");

        // Two items: below min_analyzed, always Low.
        let thin = evidence(vec![item("2026-08-29", &[]), item("2026-08-28", &[])]);
        assert_eq!(compute_risk_signal(&thin, now, &rules).unwrap(), RiskSignal::Low);

        // Three analyzed, two recent → Medium.
        let medium = evidence(vec![
            item("2026-08-29", &[]),
            item("2026-08-01", &[]),
            item("2024-01-01", &[]),
        ]);
        assert_eq!(
            compute_risk_signal(&medium, now, &rules).unwrap(),
            RiskSignal::Medium
        );

        // Four recent → High.
        let high = evidence(vec![
            item("2026-08-29", &[]),
            item("2026-08-20", &[]),
            item("2026-07-15", &[]),
            item("2026-06-10", &[]),
        ]);
        assert_eq!(
            compute_risk_signal(&high, now, &rules).unwrap(),
            RiskSignal::High
        );

        // All stale → Low.
        let stale = evidence(vec![
            item("2024-08-29", &[]),
            item("2024-08-20", &[]),
            item("2024-07-15", &[]),
        ]);
        assert_eq!(compute_risk_signal(&stale, now, &rules).unwrap(), RiskSignal::Low);
    }

    #[test]
    fn malformed_review_date_is_rejected() {
        let rules = ScorecardRules::default_seed();
        let e = evidence(vec![
            item("not-a-date", &[]),
            item("2026-08-01", &[]),
            item("2026-08-02", &[]),
        ]);
        let err = compute_risk_signal(&e, day("2026-08-30"), &rules).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
