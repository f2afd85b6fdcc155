// src/types.rs
//! Data shapes for the persisted JSON documents: player, tasks, sparks,
//! and review evidence. Field names mirror the on-disk camelCase files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The five character stat categories a task can feed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatCategory {
    Sales,
    Operations,
    Marketing,
    Finance,
    Leadership,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterStats {
    pub sales: u32,
    pub operations: u32,
    pub marketing: u32,
    pub finance: u32,
    pub leadership: u32,
}

impl CharacterStats {
    pub fn get(&self, cat: StatCategory) -> u32 {
        *self.slot(cat)
    }

    pub fn add(&mut self, cat: StatCategory, amount: u32) {
        let slot = self.slot_mut(cat);
        *slot += amount;
    }

    /// Subtract, floored at zero.
    pub fn remove(&mut self, cat: StatCategory, amount: u32) {
        let slot = self.slot_mut(cat);
        *slot = slot.saturating_sub(amount);
    }

    fn slot(&self, cat: StatCategory) -> &u32 {
        match cat {
            StatCategory::Sales => &self.sales,
            StatCategory::Operations => &self.operations,
            StatCategory::Marketing => &self.marketing,
            StatCategory::Finance => &self.finance,
            StatCategory::Leadership => &self.leadership,
        }
    }

    fn slot_mut(&mut self, cat: StatCategory) -> &mut u32 {
        match cat {
            StatCategory::Sales => &mut self.sales,
            StatCategory::Operations => &mut self.operations,
            StatCategory::Marketing => &mut self.marketing,
            StatCategory::Finance => &mut self.finance,
            StatCategory::Leadership => &mut self.leadership,
        }
    }
}

/// Consecutive-day activity streak. `last_active_date` is an ISO calendar day,
/// or empty for a player who has never completed anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
    pub last_active_date: String,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub name: String,
    pub business_name: String,
    pub level: u32,
    pub title: String,
    pub xp: u32,
    pub xp_to_next_level: u32,
    /// Monotonic total-ever-earned; unlike `xp` it is never spent.
    pub total_xp_earned: u32,
    pub streak: Streak,
    /// ISO date → XP earned that day.
    pub daily_xp: BTreeMap<String, u32>,
    pub stats: CharacterStats,
    pub joined_date: String,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            name: String::new(),
            business_name: String::new(),
            level: 1,
            title: String::new(),
            xp: 0,
            xp_to_next_level: 100,
            total_xp_earned: 0,
            streak: Streak::default(),
            daily_xp: BTreeMap::new(),
            stats: CharacterStats::default(),
            joined_date: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub task: String,
    pub priority: Priority,
    pub xp_reward: u32,
    pub due_date: String,
    #[serde(default)]
    pub linked_property: Option<String>,
    pub completed: bool,
    /// Present iff `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<String>,
    #[serde(default)]
    pub category: Option<StatCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksData {
    pub tasks: Vec<Task>,
}

// ----------------------------
// Review evidence
// ----------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One customer review mapped to structured signal. Immutable once computed;
/// re-running ingestion replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvidenceItem {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_rating: Option<f64>,
    pub review_date: String,
    pub captured_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_handle: Option<String>,
    pub text_raw: String,
    pub text_snippet: String,
    pub tags: Vec<String>,
    pub sentiment: Sentiment,
    pub relevance_score: u32,
    pub severity_score: u32,
    pub confidence: Confidence,
}

/// Aggregate over a set of evidence items; derived entirely from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceFile {
    pub slug: String,
    pub captured_at: String,
    pub confidence: Confidence,
    pub total_analyzed: u32,
    pub relevant_found: u32,
    pub sources: Vec<String>,
    pub items: Vec<ReviewEvidenceItem>,
}

// ----------------------------
// Spark (vendor prospect record)
// ----------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskSignal {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewRiskScan {
    pub mentions_count: u32,
    pub most_common_issue: String,
    pub risk_signal: RiskSignal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScorecardDimensions {
    pub reliability: u32,
    pub resident_experience: u32,
    pub issue_response: u32,
    pub communication: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VendorScorecard {
    pub provisional_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    pub dimensions: ScorecardDimensions,
}

/// A prospect business record. Only the scored fields are modeled; the rest of
/// the document (offer copy, NOI assumptions, ...) passes through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spark {
    pub slug: String,
    pub business_name: String,
    #[serde(default)]
    pub review_risk_scan: ReviewRiskScan,
    #[serde(default)]
    pub vendor_scorecard: VendorScorecard,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
