//! Destination recommendations.
//!
//! Flow: preferences -> planner weights -> score the roster -> top five,
//! each pick optionally carrying a one-line insight, plus a closing summary.

mod planner;
mod scoring;

pub use planner::HeuristicPlanner;
pub use scoring::{rank, score_place, TOP_N};

use crate::collab::{PlanWeights, RemoteError, TripPlanner};
use crate::gazetteer::{Gazetteer, Place};
use serde::Serialize;

/// One recommended destination.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub place: Place,
    pub score: f64,
    pub insight: Option<String>,
}

/// A complete recommendation run.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub picks: Vec<Recommendation>,
    pub summary: Option<String>,
    pub weights: PlanWeights,
}

pub struct RecommendationEngine {
    planner: Box<dyn TripPlanner>,
}

impl RecommendationEngine {
    pub fn new(planner: Box<dyn TripPlanner>) -> Self {
        Self { planner }
    }

    /// Plans, scores, and ranks. A planning failure aborts the run; insight
    /// and summary failures degrade to `None`.
    pub fn recommend(
        &self,
        preferences: &str,
        gazetteer: &Gazetteer,
    ) -> Result<Recommendations, RemoteError> {
        let plan = self.planner.plan(preferences)?;
        let ranked = scoring::rank(gazetteer.all(), &plan);

        let mut picks = Vec::with_capacity(ranked.len());
        for (place, score) in &ranked {
            let insight = self.planner.insight(preferences, place).ok().flatten();
            picks.push(Recommendation {
                place: (*place).clone(),
                score: *score,
                insight,
            });
        }

        let pairs: Vec<(String, f64)> = ranked
            .iter()
            .map(|(place, score)| (place.name.clone(), *score))
            .collect();
        let summary = self.planner.summarize(preferences, &pairs).ok().flatten();

        Ok(Recommendations { picks, summary, weights: plan })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct FailingPlanner;

    impl TripPlanner for FailingPlanner {
        fn plan(&self, _: &str) -> Result<PlanWeights, RemoteError> {
            Err(RemoteError::Network("planner unreachable".into()))
        }

        fn insight(&self, _: &str, _: &Place) -> Result<Option<String>, RemoteError> {
            Ok(None)
        }

        fn summarize(&self, _: &str, _: &[(String, f64)]) -> Result<Option<String>, RemoteError> {
            Ok(None)
        }
    }

    /// Plans fine, then every follow-up call fails.
    struct MoodyPlanner;

    impl TripPlanner for MoodyPlanner {
        fn plan(&self, _: &str) -> Result<PlanWeights, RemoteError> {
            let mut weights = BTreeMap::new();
            weights.insert("beach_score".to_string(), 1.0);
            Ok(PlanWeights { weights, climate: None, rationale: None })
        }

        fn insight(&self, _: &str, _: &Place) -> Result<Option<String>, RemoteError> {
            Err(RemoteError::Network("insight unreachable".into()))
        }

        fn summarize(&self, _: &str, _: &[(String, f64)]) -> Result<Option<String>, RemoteError> {
            Err(RemoteError::Network("summary unreachable".into()))
        }
    }

    #[test]
    fn test_recommend_end_to_end() {
        let engine = RecommendationEngine::new(Box::new(HeuristicPlanner));
        let recs = engine
            .recommend("beaches and nightlife on a budget", &Gazetteer::builtin())
            .unwrap();
        assert_eq!(recs.picks.len(), TOP_N);
        for pair in recs.picks.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(recs.summary.is_some());
        assert!(!recs.weights.weights.is_empty());
    }

    #[test]
    fn test_planning_failure_aborts() {
        let engine = RecommendationEngine::new(Box::new(FailingPlanner));
        assert!(engine.recommend("anything", &Gazetteer::builtin()).is_err());
    }

    #[test]
    fn test_commentary_failures_degrade_quietly() {
        let engine = RecommendationEngine::new(Box::new(MoodyPlanner));
        let recs = engine.recommend("beaches", &Gazetteer::builtin()).unwrap();
        assert_eq!(recs.picks.len(), TOP_N);
        assert!(recs.picks.iter().all(|p| p.insight.is_none()));
        assert_eq!(recs.summary, None);
    }
}
