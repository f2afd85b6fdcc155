// src/progression.rs
//! # Player Progression
//!
//! XP, levels, titles, per-category stats, and activity streaks, driven by a
//! swappable rule table ([`ProgressionRules`]).
//!
//! - Loads from JSON config (thresholds, titles, multiplier tiers).
//! - Falls back to a built-in `default_seed()` when no config is found.
//! - The toggle operation is a pure function over the player/task pair plus an
//!   injected calendar day; persistence stays in the caller.
//!
//! Level-ups and de-levels run as loops: a single reward that jumps past
//! several thresholds advances the level until XP sits inside the current
//! band, and an undo walks back the same way.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::store::{JsonStore, PLAYER_DOC, TASKS_DOC};
use crate::types::{Player, Task, TasksData};

pub const DEFAULT_PROGRESSION_RULES_PATH: &str = "config/progression.json";
pub const ENV_PROGRESSION_RULES_PATH: &str = "PROGRESSION_RULES_PATH";

/// Streak tier: at `min_days` consecutive days the multiplier applies.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiplierTier {
    pub min_days: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressionRules {
    /// Cumulative XP needed to *hold* each level, indexed by level.
    /// Index 0 is unused padding so `thresholds[level]` reads naturally.
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<u32>,
    /// Per-level XP increment once past the end of the table.
    #[serde(default = "default_overflow_step")]
    pub overflow_step: u32,
    /// Display title per level, indexed like `thresholds`.
    #[serde(default = "default_titles")]
    pub titles: Vec<String>,
    /// Highest matching tier wins; anything below the lowest tier is 1.0.
    #[serde(default = "default_multiplier_tiers")]
    pub multiplier_tiers: Vec<MultiplierTier>,
    /// Rewards at/above this XP grant a double stat boost.
    #[serde(default = "default_big_reward_xp")]
    pub big_reward_xp: u32,
}

fn default_thresholds() -> Vec<u32> {
    vec![0, 0, 100, 300, 600, 1000, 1500, 2200, 3000, 4000, 5500]
}

fn default_overflow_step() -> u32 {
    2000
}

fn default_titles() -> Vec<String> {
    [
        "", "Associate", "Runner", "Soldier", "Wiseguy", "Made Man", "Capo", "Consigliere",
        "Boss", "Don", "Godfather",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_multiplier_tiers() -> Vec<MultiplierTier> {
    vec![
        MultiplierTier {
            min_days: 15,
            multiplier: 2.0,
        },
        MultiplierTier {
            min_days: 8,
            multiplier: 1.5,
        },
        MultiplierTier {
            min_days: 4,
            multiplier: 1.25,
        },
    ]
}

fn default_big_reward_xp() -> u32 {
    50
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl ProgressionRules {
    pub fn default_seed() -> Self {
        Self {
            thresholds: default_thresholds(),
            overflow_step: default_overflow_step(),
            titles: default_titles(),
            multiplier_tiers: default_multiplier_tiers(),
            big_reward_xp: default_big_reward_xp(),
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
        let path = std::env::var(ENV_PROGRESSION_RULES_PATH)
            .unwrap_or_else(|_| DEFAULT_PROGRESSION_RULES_PATH.to_string());
        Self::load_from_file(path)
    }

    /// Cumulative XP required to hold `level`.
    pub fn threshold_for(&self, level: u32) -> u32 {
        let idx = level as usize;
        if idx < self.thresholds.len() {
            self.thresholds[idx]
        } else {
            let last = self.thresholds.last().copied().unwrap_or(0);
            let beyond = level - (self.thresholds.len() as u32 - 1);
            last + beyond * self.overflow_step
        }
    }

    pub fn title_for(&self, level: u32) -> String {
        let idx = level as usize;
        if idx < self.titles.len() {
            self.titles[idx].clone()
        } else {
            // Past the table, titles continue as "<top title> II", "III", ...
            let top = self.titles.last().cloned().unwrap_or_default();
            let ordinal = level - (self.titles.len() as u32 - 2);
            format!("{top} {}", roman_numeral(ordinal))
        }
    }

    pub fn multiplier_for(&self, streak_days: u32) -> f64 {
        self.multiplier_tiers
            .iter()
            .filter(|t| streak_days >= t.min_days)
            .map(|t| t.multiplier)
            .fold(1.0, f64::max)
    }

    pub fn stat_boost(&self, xp_reward: u32) -> u32 {
        if xp_reward >= self.big_reward_xp {
            2
        } else {
            1
        }
    }
}

fn roman_numeral(n: u32) -> String {
    match n {
        0 | 1 => String::new(),
        2 => "II".to_string(),
        3 => "III".to_string(),
        4 => "IV".to_string(),
        5 => "V".to_string(),
        _ => n.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Completed,
    Undone,
}

/// Flip a task between completed/open and apply the progression rules to the
/// player. `today` is the caller's calendar day (naive, no timezone games).
///
/// Completing then undoing the same task restores XP, totals, stats, and the
/// day's XP entry exactly. The streak is deliberately not reversed on undo —
/// a misclick should not cost a 14-day run.
pub fn toggle_task(
    task: &mut Task,
    player: &mut Player,
    today: NaiveDate,
    rules: &ProgressionRules,
) -> ToggleOutcome {
    let today_s = iso_day(today);

    if task.completed {
        undo_task(task, player, &today_s, rules);
        ToggleOutcome::Undone
    } else {
        complete_task(task, player, today, &today_s, rules);
        ToggleOutcome::Completed
    }
}

fn complete_task(
    task: &mut Task,
    player: &mut Player,
    today: NaiveDate,
    today_s: &str,
    rules: &ProgressionRules,
) {
    task.completed = true;
    task.completed_date = Some(today_s.to_string());

    player.xp += task.xp_reward;
    player.total_xp_earned += task.xp_reward;
    *player.daily_xp.entry(today_s.to_string()).or_insert(0) += task.xp_reward;

    if let Some(cat) = task.category {
        player.stats.add(cat, rules.stat_boost(task.xp_reward));
    }

    // A big reward can clear several thresholds at once.
    while player.xp >= player.xp_to_next_level {
        player.level += 1;
        player.title = rules.title_for(player.level);
        player.xp_to_next_level = rules.threshold_for(player.level + 1);
    }

    update_streak(player, today, today_s, rules);
}

fn undo_task(task: &mut Task, player: &mut Player, today_s: &str, rules: &ProgressionRules) {
    task.completed = false;
    task.completed_date = None;

    player.xp = player.xp.saturating_sub(task.xp_reward);
    player.total_xp_earned = player.total_xp_earned.saturating_sub(task.xp_reward);

    if let Some(day) = player.daily_xp.get_mut(today_s) {
        *day = day.saturating_sub(task.xp_reward);
    }

    if let Some(cat) = task.category {
        player.stats.remove(cat, rules.stat_boost(task.xp_reward));
    }

    // Walk back down until XP again covers the held level.
    while player.level > 1 && player.xp < rules.threshold_for(player.level) {
        player.level -= 1;
    }
    player.title = rules.title_for(player.level);
    player.xp_to_next_level = rules.threshold_for(player.level + 1);
}

fn update_streak(player: &mut Player, today: NaiveDate, today_s: &str, rules: &ProgressionRules) {
    // Second completion on the same day changes nothing.
    if player.streak.last_active_date == today_s {
        return;
    }

    let yesterday = today.pred_opt().map(iso_day).unwrap_or_default();
    if player.streak.last_active_date == yesterday {
        player.streak.current += 1;
    } else if player.streak.last_active_date.as_str() < yesterday.as_str() {
        // Gap of two or more days, or a brand-new player.
        player.streak.current = 1;
    }

    player.streak.last_active_date = today_s.to_string();
    player.streak.longest = player.streak.longest.max(player.streak.current);
    player.streak.multiplier = rules.multiplier_for(player.streak.current);
}

fn iso_day(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub success: bool,
    pub task: Task,
    pub player: Player,
}

/// Look up a task by id, toggle it, and persist player + tasks together.
/// Unknown ids leave both documents untouched.
pub fn toggle_by_id(
    store: &JsonStore,
    rules: &ProgressionRules,
    task_id: &str,
    today: NaiveDate,
) -> Result<ToggleResponse> {
    if task_id.trim().is_empty() {
        return Err(EngineError::Validation("task id required".to_string()));
    }

    let mut tasks: TasksData = store.read(TASKS_DOC)?;
    let mut player: Player = store.read(PLAYER_DOC)?;

    let task = tasks
        .tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| EngineError::NotFound(format!("task {task_id} not found")))?;

    let outcome = toggle_task(task, &mut player, today, rules);
    let task = task.clone();

    store.write_pair((TASKS_DOC, &tasks), (PLAYER_DOC, &player))?;

    tracing::info!(
        task_id,
        outcome = ?outcome,
        xp = player.xp,
        level = player.level,
        "task toggled"
    );

    Ok(ToggleResponse {
        success: true,
        task,
        player,
    })
}
