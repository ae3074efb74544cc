//! Offline trip planner.
//!
//! Keyword heuristics stand in for the language model when the process runs
//! without a connection or an API key. Deterministic on purpose.

use crate::collab::{PlanWeights, RemoteError, TripPlanner};
use crate::gazetteer::Place;
use std::collections::BTreeMap;

/// Words that flip the next matched interest to a negative weight.
const NEGATORS: &[&str] = &["no", "not", "avoid", "without", "skip", "hate"];

// interest word -> rating field
const INTEREST_KEYWORDS: &[(&str, &str)] = &[
    ("beach", "beach_score"),
    ("beaches", "beach_score"),
    ("island", "beach_score"),
    ("islands", "beach_score"),
    ("coast", "beach_score"),
    ("coastal", "beach_score"),
    ("seaside", "beach_score"),
    ("snorkeling", "beach_score"),
    ("surfing", "beach_score"),
    ("swimming", "beach_score"),
    ("nightlife", "nightlife_score"),
    ("party", "nightlife_score"),
    ("partying", "nightlife_score"),
    ("clubs", "nightlife_score"),
    ("clubbing", "nightlife_score"),
    ("bars", "nightlife_score"),
    ("budget", "cost_of_living"),
    ("cheap", "cost_of_living"),
    ("affordable", "cost_of_living"),
    ("inexpensive", "cost_of_living"),
    ("backpacking", "cost_of_living"),
    ("safe", "safety_index"),
    ("safety", "safety_index"),
    ("secure", "safety_index"),
    ("culture", "cultural_score"),
    ("cultural", "cultural_score"),
    ("history", "cultural_score"),
    ("historic", "cultural_score"),
    ("historical", "cultural_score"),
    ("museum", "cultural_score"),
    ("museums", "cultural_score"),
    ("temple", "cultural_score"),
    ("temples", "cultural_score"),
    ("heritage", "cultural_score"),
    ("art", "cultural_score"),
    ("sightseeing", "sightseeing_score"),
    ("sights", "sightseeing_score"),
    ("landmark", "sightseeing_score"),
    ("landmarks", "sightseeing_score"),
    ("architecture", "sightseeing_score"),
    ("scenery", "sightseeing_score"),
    ("scenic", "sightseeing_score"),
    ("views", "sightseeing_score"),
    ("adventure", "adventure_score"),
    ("adventurous", "adventure_score"),
    ("hiking", "adventure_score"),
    ("hike", "adventure_score"),
    ("trekking", "adventure_score"),
    ("trek", "adventure_score"),
    ("outdoors", "adventure_score"),
    ("outdoor", "adventure_score"),
    ("skiing", "adventure_score"),
    ("ski", "adventure_score"),
    ("diving", "adventure_score"),
    ("climbing", "adventure_score"),
    ("safari", "adventure_score"),
    ("food", "food_score"),
    ("foodie", "food_score"),
    ("cuisine", "food_score"),
    ("culinary", "food_score"),
    ("restaurants", "food_score"),
    ("gastronomy", "food_score"),
    ("eating", "food_score"),
    ("luxury", "infrastructure_score"),
    ("comfort", "infrastructure_score"),
    ("comfortable", "infrastructure_score"),
    ("convenient", "infrastructure_score"),
    ("convenience", "infrastructure_score"),
    ("infrastructure", "infrastructure_score"),
    ("modern", "infrastructure_score"),
];

// climate word -> climate class, matching the gazetteer's vocabulary
const CLIMATE_KEYWORDS: &[(&str, &str)] = &[
    ("tropical", "tropical"),
    ("warm", "tropical"),
    ("hot", "tropical"),
    ("sunny", "tropical"),
    ("humid", "tropical"),
    ("cold", "continental"),
    ("snow", "continental"),
    ("snowy", "continental"),
    ("winter", "continental"),
    ("arctic", "continental"),
    ("temperate", "temperate"),
    ("mild", "temperate"),
    ("desert", "arid"),
    ("arid", "arid"),
    ("dry", "arid"),
];

// When nothing matches, assume a classic sightseeing trip.
const DEFAULT_PROFILE: &[(&str, f64)] = &[
    ("sightseeing_score", 1.0),
    ("cultural_score", 1.0),
    ("food_score", 0.5),
];

pub struct HeuristicPlanner;

impl TripPlanner for HeuristicPlanner {
    fn plan(&self, preferences: &str) -> Result<PlanWeights, RemoteError> {
        let lowered = preferences.to_lowercase();
        let mut weights = BTreeMap::new();
        let mut matched: Vec<&str> = Vec::new();
        let mut climate = None;
        let mut negate = false;

        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            if NEGATORS.contains(&word) {
                // sticky until the next interest consumes it
                negate = true;
                continue;
            }
            if let Some((keyword, field)) = INTEREST_KEYWORDS.iter().copied().find(|(k, _)| *k == word) {
                weights.insert(field.to_string(), if negate { -1.0 } else { 1.0 });
                if !negate && !matched.contains(&keyword) {
                    matched.push(keyword);
                }
                negate = false;
            }
            if climate.is_none() {
                if let Some((_, class)) = CLIMATE_KEYWORDS.iter().copied().find(|(k, _)| *k == word) {
                    climate = Some(class.to_string());
                }
            }
        }

        let rationale = if weights.is_empty() {
            for (field, weight) in DEFAULT_PROFILE {
                weights.insert((*field).to_string(), *weight);
            }
            Some("No specific interests recognized; assuming a sightseeing trip".to_string())
        } else if matched.is_empty() {
            Some("Ranking by what to avoid".to_string())
        } else {
            Some(format!("Matched interests: {}", matched.join(", ")))
        };

        Ok(PlanWeights { weights, climate, rationale })
    }

    fn insight(&self, _preferences: &str, _place: &Place) -> Result<Option<String>, RemoteError> {
        Ok(None)
    }

    fn summarize(
        &self,
        _preferences: &str,
        ranked: &[(String, f64)],
    ) -> Result<Option<String>, RemoteError> {
        Ok(ranked
            .first()
            .map(|(name, score)| format!("Top pick: {} with a score of {:.2}.", name, score)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_map_to_weights() {
        let plan = HeuristicPlanner.plan("beaches and nightlife on a budget").unwrap();
        assert_eq!(plan.weights.get("beach_score"), Some(&1.0));
        assert_eq!(plan.weights.get("nightlife_score"), Some(&1.0));
        assert_eq!(plan.weights.get("cost_of_living"), Some(&1.0));
        assert_eq!(plan.weights.len(), 3);
        assert_eq!(plan.climate, None);
    }

    #[test]
    fn test_negation_flips_weight() {
        let plan = HeuristicPlanner.plan("great food but no nightlife").unwrap();
        assert_eq!(plan.weights.get("food_score"), Some(&1.0));
        assert_eq!(plan.weights.get("nightlife_score"), Some(&-1.0));
    }

    #[test]
    fn test_negation_survives_stopwords() {
        let plan = HeuristicPlanner.plan("avoid the party scene").unwrap();
        assert_eq!(plan.weights.get("nightlife_score"), Some(&-1.0));
    }

    #[test]
    fn test_climate_detection() {
        let plan = HeuristicPlanner.plan("somewhere warm with beaches").unwrap();
        assert_eq!(plan.climate.as_deref(), Some("tropical"));
        assert_eq!(plan.weights.get("beach_score"), Some(&1.0));

        let plan = HeuristicPlanner.plan("snow and skiing").unwrap();
        assert_eq!(plan.climate.as_deref(), Some("continental"));
        assert_eq!(plan.weights.get("adventure_score"), Some(&1.0));
    }

    #[test]
    fn test_default_profile() {
        let plan = HeuristicPlanner.plan("surprise me").unwrap();
        assert_eq!(plan.weights.get("sightseeing_score"), Some(&1.0));
        assert_eq!(plan.weights.get("cultural_score"), Some(&1.0));
        assert!(plan.rationale.is_some());
    }

    #[test]
    fn test_summarize_is_deterministic() {
        let ranked = vec![("Japan".to_string(), 9.12), ("Italy".to_string(), 8.9)];
        assert_eq!(
            HeuristicPlanner.summarize("anything", &ranked).unwrap().as_deref(),
            Some("Top pick: Japan with a score of 9.12.")
        );
        assert_eq!(HeuristicPlanner.summarize("anything", &[]).unwrap(), None);
    }
}
