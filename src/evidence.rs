// src/evidence.rs
//! # Review Evidence Scoring
//!
//! Heuristic pass over raw review text + star rating, producing tags,
//! sentiment, relevance/severity scores, and a confidence label.
//!
//! - Rule tables (tag patterns, sentiment hints, keyword boosts, severity
//!   bumps) are config data, loaded from JSON with a built-in seed fallback.
//! - Patterns are compiled once on load; scoring itself is pure and total.
//!
//! Score ranges are part of the contract: relevance is clamped to `[20, 98]`
//! and severity to `[25, 98]`.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::types::{Confidence, Sentiment};

pub const DEFAULT_EVIDENCE_RULES_PATH: &str = "config/evidence.json";
pub const ENV_EVIDENCE_RULES_PATH: &str = "EVIDENCE_RULES_PATH";

/* ----------------------------
Config schema (from JSON)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct TagRuleCfg {
    pub tag: String,
    pub patterns: Vec<String>,
}

/// Severity bump: `points` are added once if *any* of `tags` is present.
#[derive(Debug, Clone, Deserialize)]
pub struct SeverityBumpCfg {
    pub tags: Vec<String>,
    pub points: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceRulesCfg {
    #[serde(default = "seed_tag_rules")]
    pub tags: Vec<TagRuleCfg>,
    #[serde(default = "seed_positive_hints")]
    pub positive_hints: String,
    #[serde(default = "seed_negative_hints")]
    pub negative_hints: String,
    /// Trash/valet/dumpster vocabulary; +25 relevance when present.
    #[serde(default = "seed_domain_keywords")]
    pub domain_keywords: String,
    /// Resident/office/manager/complaint vocabulary; +10 relevance.
    #[serde(default = "seed_context_keywords")]
    pub context_keywords: String,
    /// Duration/frequency phrasing; +10 severity.
    #[serde(default = "seed_persistence_keywords")]
    pub persistence_keywords: String,
    #[serde(default = "seed_severity_bumps")]
    pub severity_bumps: Vec<SeverityBumpCfg>,
}

fn seed_tag_rules() -> Vec<TagRuleCfg> {
    let table: &[(&str, &[&str])] = &[
        (
            "missed_pickup",
            &[r"(?i)missed pickup", r"(?i)didn'?t pick up", r"(?i)no pickup"],
        ),
        ("overflow", &[r"(?i)overflow", r"(?i)piles? up", r"(?i)piled up"]),
        ("odor", &[r"(?i)smell", r"(?i)odor", r"(?i)stink"]),
        (
            "communication",
            &[
                r"(?i)no notice",
                r"(?i)never told",
                r"(?i)communication",
                r"(?i)didn'?t respond",
            ],
        ),
        (
            "issue_response",
            &[
                r"(?i)no response",
                r"(?i)slow response",
                r"(?i)days later",
                r"(?i)weeks? later",
            ],
        ),
        (
            "reliability",
            &[r"(?i)inconsistent", r"(?i)unreliable", r"(?i)every week", r"(?i)weekend"],
        ),
        (
            "dumpster_area",
            &[r"(?i)dumpster", r"(?i)breezeway", r"(?i)hallway"],
        ),
        (
            "resident_experience",
            &[r"(?i)resident", r"(?i)frustrating", r"(?i)annoying", r"(?i)convenience"],
        ),
        ("pests", &[r"(?i)pest", r"(?i)roach", r"(?i)rat"]),
    ];
    table
        .iter()
        .map(|(tag, pats)| TagRuleCfg {
            tag: tag.to_string(),
            patterns: pats.iter().map(|p| p.to_string()).collect(),
        })
        .collect()
}

fn seed_positive_hints() -> String {
    r"(?i)(great|excellent|good|clean|reliable|on time|professional)".to_string()
}

fn seed_negative_hints() -> String {
    r"(?i)(missed|never|bad|terrible|awful|overflow|smell|odor|late|unreliable)".to_string()
}

fn seed_domain_keywords() -> String {
    r"(?i)trash|valet|pickup|dumpster|breezeway|hallway".to_string()
}

fn seed_context_keywords() -> String {
    r"(?i)resident|office|manager|complaint".to_string()
}

fn seed_persistence_keywords() -> String {
    r"(?i)every week|for days|for weeks|always|non-existent".to_string()
}

fn seed_severity_bumps() -> Vec<SeverityBumpCfg> {
    vec![
        SeverityBumpCfg {
            tags: vec!["missed_pickup".to_string()],
            points: 20,
        },
        SeverityBumpCfg {
            tags: vec!["overflow".to_string(), "odor".to_string()],
            points: 12,
        },
        SeverityBumpCfg {
            tags: vec!["pests".to_string()],
            points: 18,
        },
    ]
}

impl Default for EvidenceRulesCfg {
    fn default() -> Self {
        Self {
            tags: seed_tag_rules(),
            positive_hints: seed_positive_hints(),
            negative_hints: seed_negative_hints(),
            domain_keywords: seed_domain_keywords(),
            context_keywords: seed_context_keywords(),
            persistence_keywords: seed_persistence_keywords(),
            severity_bumps: seed_severity_bumps(),
        }
    }
}

/* ----------------------------
Compiled engine structures
---------------------------- */

#[derive(Debug)]
struct CompiledTagRule {
    tag: String,
    patterns: Vec<Regex>,
}

#[derive(Debug)]
pub struct EvidenceRules {
    tags: Vec<CompiledTagRule>,
    positive_hints: Regex,
    negative_hints: Regex,
    domain_keywords: Regex,
    context_keywords: Regex,
    persistence_keywords: Regex,
    severity_bumps: Vec<SeverityBumpCfg>,
}

pub const RELEVANCE_MIN: u32 = 20;
pub const RELEVANCE_MAX: u32 = 98;
pub const SEVERITY_BASE: u32 = 35;
pub const SEVERITY_MIN: u32 = 25;
pub const SEVERITY_MAX: u32 = 98;
const RELEVANCE_PER_TAG: u32 = 18;

impl EvidenceRules {
    pub fn compile(cfg: EvidenceRulesCfg) -> Result<Self> {
        let compile_one = |raw: &str| {
            Regex::new(raw)
                .map_err(|e| EngineError::Validation(format!("bad pattern {raw:?}: {e}")))
        };

        let mut tags = Vec::with_capacity(cfg.tags.len());
        for rule in &cfg.tags {
            let mut patterns = Vec::with_capacity(rule.patterns.len());
            for raw in &rule.patterns {
                patterns.push(compile_one(raw)?);
            }
            tags.push(CompiledTagRule {
                tag: normalize_tag(&rule.tag),
                patterns,
            });
        }

        Ok(Self {
            tags,
            positive_hints: compile_one(&cfg.positive_hints)?,
            negative_hints: compile_one(&cfg.negative_hints)?,
            domain_keywords: compile_one(&cfg.domain_keywords)?,
            context_keywords: compile_one(&cfg.context_keywords)?,
            persistence_keywords: compile_one(&cfg.persistence_keywords)?,
            severity_bumps: cfg.severity_bumps,
        })
    }

    pub fn default_seed() -> Self {
        Self::compile(EvidenceRulesCfg::default()).expect("seed evidence rules compile")
    }

    /// Load from a JSON file, falling back to the seed on any error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let cfg = match std::fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
            Err(_) => EvidenceRulesCfg::default(),
        };
        Self::compile(cfg).unwrap_or_else(|_| Self::default_seed())
    }

    pub fn load_from_env() -> Self {
        let path = std::env::var(ENV_EVIDENCE_RULES_PATH)
            .unwrap_or_else(|_| DEFAULT_EVIDENCE_RULES_PATH.to_string());
        Self::load_from_file(path)
    }

    /// Each tag at most once, in rule-table order.
    pub fn extract_tags(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for rule in &self.tags {
            if rule.patterns.iter().any(|p| p.is_match(text)) && seen.insert(rule.tag.as_str()) {
                out.push(rule.tag.clone());
            }
        }
        out
    }

    /// Deterministic precedence: a 1-2 star rating is negative no matter what
    /// the text says; a clean 4+ star with positive phrasing is positive;
    /// negative phrasing drags anything else down.
    pub fn infer_sentiment(&self, text: &str, rating: u8) -> Sentiment {
        if rating <= 2 {
            return Sentiment::Negative;
        }
        if rating >= 4 && self.positive_hints.is_match(text) && !self.negative_hints.is_match(text)
        {
            return Sentiment::Positive;
        }
        if self.negative_hints.is_match(text) {
            return Sentiment::Negative;
        }
        if rating == 3 {
            return Sentiment::Neutral;
        }
        if rating >= 4 {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        }
    }

    fn relevance(&self, tags: &[String], text: &str) -> u32 {
        let mut score = RELEVANCE_PER_TAG * tags.len() as u32;
        if self.domain_keywords.is_match(text) {
            score += 25;
        }
        if self.context_keywords.is_match(text) {
            score += 10;
        }
        score.clamp(RELEVANCE_MIN, RELEVANCE_MAX)
    }

    fn severity(&self, tags: &[String], sentiment: Sentiment, text: &str) -> u32 {
        let mut score = SEVERITY_BASE;
        if sentiment == Sentiment::Negative {
            score += 20;
        }
        for bump in &self.severity_bumps {
            if bump.tags.iter().any(|t| tags.iter().any(|have| have == t)) {
                score += bump.points;
            }
        }
        if self.persistence_keywords.is_match(text) {
            score += 10;
        }
        score.clamp(SEVERITY_MIN, SEVERITY_MAX)
    }

    pub fn score_review(&self, text: &str, rating: u8) -> ScoredReview {
        let tags = self.extract_tags(text);
        let sentiment = self.infer_sentiment(text, rating);
        let relevance_score = self.relevance(&tags, text);
        let severity_score = self.severity(&tags, sentiment, text);
        let confidence = item_confidence(relevance_score, severity_score);
        ScoredReview {
            tags,
            sentiment,
            relevance_score,
            severity_score,
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredReview {
    pub tags: Vec<String>,
    pub sentiment: Sentiment,
    pub relevance_score: u32,
    pub severity_score: u32,
    pub confidence: Confidence,
}

/// Lower-case, trim, spaces → underscores.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

pub fn item_confidence(relevance: u32, severity: u32) -> Confidence {
    if relevance >= 85 && severity >= 75 {
        Confidence::High
    } else if relevance >= 65 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Aggregate label for a scored evidence set: needs both volume and at least
/// two distinct sources to be called high.
pub fn aggregate_confidence(relevant_count: usize, source_count: usize) -> Confidence {
    if relevant_count >= 12 && source_count >= 2 {
        Confidence::High
    } else if relevant_count >= 6 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Count-only variant for manually-curated imports, where per-item relevance
/// was not computed by us.
pub fn curated_confidence(item_count: usize) -> Confidence {
    if item_count >= 12 {
        Confidence::High
    } else if item_count >= 6 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}
