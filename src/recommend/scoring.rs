//! Scoring and ranking of destinations against planner weights.

use crate::collab::PlanWeights;
use crate::gazetteer::Place;

/// How many destinations a recommendation run returns.
pub const TOP_N: usize = 5;

/// Added after normalization when the place matches the requested climate.
const CLIMATE_BONUS: f64 = 0.5;

/// Weighted rating normalized by total weight magnitude, so scores stay
/// comparable no matter how many interests the plan carries. Weight keys
/// that name no rating field are ignored. Rounded to two decimals.
pub fn score_place(place: &Place, plan: &PlanWeights) -> f64 {
    let mut sum = 0.0;
    let mut magnitude = 0.0;
    for (field, weight) in &plan.weights {
        if let Some(value) = place.score_field(field) {
            sum += weight * value;
            magnitude += weight.abs();
        }
    }
    let mut score = if magnitude > 0.0 { sum / magnitude } else { 0.0 };
    if let Some(climate) = &plan.climate {
        if place.climate.eq_ignore_ascii_case(climate) {
            score += CLIMATE_BONUS;
        }
    }
    (score * 100.0).round() / 100.0
}

/// Scores the whole roster and keeps the best `TOP_N`, ties broken by name.
pub fn rank<'a>(places: &'a [Place], plan: &PlanWeights) -> Vec<(&'a Place, f64)> {
    let mut scored: Vec<(&Place, f64)> = places
        .iter()
        .map(|place| (place, score_place(place, plan)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.name.cmp(&b.0.name)));
    scored.truncate(TOP_N);
    scored
}
