//! Ecosystem health scoring.
//!
//! Health is a pure function of the trophic structure: each level is scored by
//! how far its population ratio to the next level up drifts from the designed
//! ratio, and the level scores are averaged. A fully collapsed level zeroes the
//! whole ecosystem.

use serde::Serialize;

use crate::{species::TrophicRank, trophic::TrophicLevel};

/// Relative deviation tolerated before any penalty applies.
pub const BALANCE_TOLERANCE: f64 = 0.2;
/// Lowest score imbalance alone can produce; only extinction reaches zero.
pub const MIN_BALANCE_SCORE: f64 = 0.1;

/// `|actual / ideal - 1|` for the ratios `actual_num / actual_den` and
/// `ideal_num / ideal_den`.
pub fn ratio_deviation(actual_num: f64, actual_den: f64, ideal_num: f64, ideal_den: f64) -> f64 {
    let actual = actual_num / actual_den;
    let ideal = ideal_num / ideal_den;
    (actual / ideal - 1.0).abs()
}

pub fn deviation_to_score(deviation: f64) -> f64 {
    if deviation < BALANCE_TOLERANCE {
        1.0
    } else {
        (1.0 - deviation).max(MIN_BALANCE_SCORE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelHealth {
    pub rank: TrophicRank,
    pub name: String,
    pub total_population: f64,
    pub total_score: f64,
    pub balance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub levels: Vec<LevelHealth>,
    pub extinction: bool,
    pub health: f64,
}

/// Scores every level and the ecosystem as a whole.
///
/// Levels are considered in ecological order regardless of slice order.
pub fn assess(levels: &[TrophicLevel]) -> HealthReport {
    let mut ordered: Vec<&TrophicLevel> = levels.iter().collect();
    ordered.sort_by_key(|level| level.priority());

    let mut report = HealthReport {
        levels: ordered
            .iter()
            .map(|level| LevelHealth {
                rank: level.rank(),
                name: level.name().to_string(),
                total_population: level.total_population(),
                total_score: level.total_score(),
                balance_score: 0.0,
            })
            .collect(),
        extinction: false,
        health: 0.0,
    };

    if ordered.is_empty() {
        return report;
    }

    if ordered.iter().any(|level| level.is_collapsed()) {
        report.extinction = true;
        return report;
    }

    for index in 0..ordered.len() {
        let score = match ordered.get(index + 1) {
            Some(next) => {
                let current = ordered[index];
                deviation_to_score(ratio_deviation(
                    report.levels[index].total_population,
                    report.levels[index + 1].total_population,
                    current.ideal_ratio(),
                    next.ideal_ratio(),
                ))
            }
            None => 1.0,
        };
        report.levels[index].balance_score = score;
    }

    let sum: f64 = report.levels.iter().map(|level| level.balance_score).sum();
    report.health = (sum / report.levels.len() as f64).clamp(0.0, 1.0);
    report
}

/// Normalised [0, 1] ecosystem health.
pub fn ecosystem_health(levels: &[TrophicLevel]) -> f64 {
    assess(levels).health
}
