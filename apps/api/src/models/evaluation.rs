//! Human baseline and model results compared during evaluation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ScreeningError;

pub type CandidateName = String;

/// Bijection from rank position (1..=K) to candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranking(BTreeMap<u32, CandidateName>);

impl Ranking {
    /// Best candidate first.
    pub fn from_order<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CandidateName>,
    {
        Self(
            order
                .into_iter()
                .enumerate()
                .map(|(i, name)| (i as u32 + 1, name.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn at(&self, place: u32) -> Option<&str> {
        self.0.get(&place).map(String::as_str)
    }

    pub fn places(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.0.iter().map(|(&place, name)| (place, name.as_str()))
    }

    /// Candidates in rank order.
    pub fn ordered(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.values().map(String::as_str)
    }

    pub fn candidates(&self) -> BTreeSet<CandidateName> {
        self.0.values().cloned().collect()
    }

    /// Candidate → place lookup.
    pub fn positions(&self) -> BTreeMap<&str, u32> {
        self.0.iter().map(|(&place, name)| (name.as_str(), place)).collect()
    }

    /// Candidates occupying places `1..=n`.
    pub fn top(&self, n: usize) -> BTreeSet<CandidateName> {
        self.0.values().take(n).cloned().collect()
    }

    /// Places must be exactly `1..=K` and every candidate must appear once.
    pub fn validate(&self) -> Result<(), ScreeningError> {
        for (expected, &place) in (1u32..).zip(self.0.keys()) {
            if place != expected {
                return Err(ScreeningError::ConsistencyViolation(format!(
                    "ranking places must run 1..={} without gaps, found place {place}",
                    self.0.len()
                )));
            }
        }
        let distinct = self.candidates().len();
        if distinct != self.0.len() {
            return Err(ScreeningError::ConsistencyViolation(format!(
                "ranking lists {} places but only {distinct} distinct candidates",
                self.0.len()
            )));
        }
        Ok(())
    }
}

/// One human screener's submission for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanMatchingResult {
    pub submitter_id: u32,
    pub job_id: String,
    pub timestamp: DateTime<Utc>,
    pub minutes_taken: u32,
    pub shortlisted: BTreeSet<CandidateName>,
    pub ranking: Ranking,
}

impl HumanMatchingResult {
    /// Checks the ranking is a bijection over `panel_size` candidates and the
    /// shortlist is exactly the top-`|shortlist|` prefix of the ranking.
    pub fn validate(&self, panel_size: usize) -> Result<(), ScreeningError> {
        let context = |msg: String| {
            ScreeningError::ConsistencyViolation(format!(
                "submission {} for job '{}': {msg}",
                self.submitter_id, self.job_id
            ))
        };

        self.ranking.validate().map_err(|e| context(e.to_string()))?;

        if self.ranking.len() != panel_size {
            return Err(context(format!(
                "ranking covers {} candidates, expected {panel_size}",
                self.ranking.len()
            )));
        }

        let prefix = self.ranking.top(self.shortlisted.len());
        if prefix != self.shortlisted {
            return Err(context(format!(
                "shortlist {:?} is not the top-{} prefix {:?} of the ranking",
                self.shortlisted,
                self.shortlisted.len(),
                prefix
            )));
        }
        Ok(())
    }
}

/// Reconciled human baseline for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusHumanResult {
    pub job_id: String,
    pub submitters: usize,
    /// Mean over contributing submissions.
    pub minutes_taken: f64,
    pub shortlisted: BTreeSet<CandidateName>,
    pub ranking: Ranking,
}

impl ConsensusHumanResult {
    pub fn seconds_taken(&self) -> f64 {
        self.minutes_taken * 60.0
    }
}

/// The engine's outcome for one job, in the same shape as a human submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMatchingResult {
    pub job_id: String,
    pub seconds_taken: f64,
    pub shortlisted: BTreeSet<CandidateName>,
    pub ranking: Ranking,
}

/// Scored candidate as seen by the evaluation: name, total score, verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub name: CandidateName,
    pub total_score: f64,
    pub promising: bool,
}

impl ModelMatchingResult {
    /// Ranking by `total_score` descending (ties by name); shortlist from the
    /// promising verdicts.
    pub fn from_scored(job_id: &str, seconds_taken: f64, mut scored: Vec<ScoredCandidate>) -> Self {
        scored.sort_by(|a, b| {
            b.total_score
                .total_cmp(&a.total_score)
                .then_with(|| a.name.cmp(&b.name))
        });
        let shortlisted = scored
            .iter()
            .filter(|c| c.promising)
            .map(|c| c.name.clone())
            .collect();
        Self {
            job_id: job_id.to_string(),
            seconds_taken,
            shortlisted,
            ranking: Ranking::from_order(scored.into_iter().map(|c| c.name)),
        }
    }

    /// Checks the ranking is a bijection over `panel_size` candidates and
    /// every shortlisted candidate is ranked. The shortlist comes from the
    /// promising verdicts, so it need not be a ranking prefix.
    pub fn validate(&self, panel_size: usize) -> Result<(), ScreeningError> {
        let context = |msg: String| {
            ScreeningError::ConsistencyViolation(format!(
                "model result for job '{}': {msg}",
                self.job_id
            ))
        };

        self.ranking.validate().map_err(|e| context(e.to_string()))?;

        if self.ranking.len() != panel_size {
            return Err(context(format!(
                "ranking covers {} candidates, expected {panel_size}",
                self.ranking.len()
            )));
        }

        let ranked = self.ranking.candidates();
        let unranked: Vec<&CandidateName> = self.shortlisted.difference(&ranked).collect();
        if !unranked.is_empty() {
            return Err(context(format!("shortlisted but not ranked: {unranked:?}")));
        }
        Ok(())
    }
}

/// Distance of one party's result from the consensus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub hamming_distance: usize,
    pub rank_correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanErrorResult {
    pub submitter_id: u32,
    #[serde(flatten)]
    pub error: ErrorResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(shortlist: &[&str], order: &[&str]) -> HumanMatchingResult {
        HumanMatchingResult {
            submitter_id: 7,
            job_id: "job-1".to_string(),
            timestamp: Utc::now(),
            minutes_taken: 20,
            shortlisted: shortlist.iter().map(|s| s.to_string()).collect(),
            ranking: Ranking::from_order(order.iter().copied()),
        }
    }

    #[test]
    fn test_from_order_assigns_places_from_one() {
        let ranking = Ranking::from_order(["A", "B", "C"]);
        assert_eq!(ranking.at(1), Some("A"));
        assert_eq!(ranking.at(3), Some("C"));
        assert_eq!(ranking.positions()["B"], 2);
    }

    #[test]
    fn test_ranking_with_gap_is_rejected() {
        let ranking: Ranking = serde_json::from_str(r#"{"1": "A", "3": "B"}"#).unwrap();
        assert!(ranking.validate().is_err());
    }

    #[test]
    fn test_ranking_with_duplicate_candidate_is_rejected() {
        let ranking = Ranking::from_order(["A", "B", "A"]);
        assert!(matches!(
            ranking.validate(),
            Err(ScreeningError::ConsistencyViolation(_))
        ));
    }

    #[test]
    fn test_ranking_json_uses_place_keys() {
        let ranking = Ranking::from_order(["A", "B"]);
        let json = serde_json::to_value(&ranking).unwrap();
        assert_eq!(json, serde_json::json!({"1": "A", "2": "B"}));
        let back: Ranking = serde_json::from_value(json).unwrap();
        assert_eq!(back, ranking);
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(submission(&["A", "B"], &["A", "B", "C"]).validate(3).is_ok());
    }

    #[test]
    fn test_empty_shortlist_is_a_valid_prefix() {
        assert!(submission(&[], &["A", "B", "C"]).validate(3).is_ok());
    }

    #[test]
    fn test_shortlist_not_prefix_is_rejected() {
        let err = submission(&["B", "C"], &["A", "B", "C"]).validate(3).unwrap_err();
        assert!(matches!(err, ScreeningError::ConsistencyViolation(_)));
    }

    #[test]
    fn test_wrong_panel_size_is_rejected() {
        assert!(submission(&["A"], &["A", "B", "C"]).validate(8).is_err());
    }

    #[test]
    fn test_model_result_sorted_by_score_descending() {
        let scored = vec![
            ScoredCandidate { name: "low".into(), total_score: 20.0, promising: false },
            ScoredCandidate { name: "high".into(), total_score: 90.0, promising: true },
            ScoredCandidate { name: "mid".into(), total_score: 55.0, promising: true },
        ];
        let result = ModelMatchingResult::from_scored("job", 12.0, scored);
        assert_eq!(result.ranking.ordered().collect::<Vec<_>>(), ["high", "mid", "low"]);
        assert_eq!(result.shortlisted, BTreeSet::from(["high".to_string(), "mid".to_string()]));
    }

    #[test]
    fn test_model_result_ties_broken_by_name() {
        let scored = vec![
            ScoredCandidate { name: "b".into(), total_score: 50.0, promising: false },
            ScoredCandidate { name: "a".into(), total_score: 50.0, promising: false },
        ];
        let result = ModelMatchingResult::from_scored("job", 1.0, scored);
        assert_eq!(result.ranking.at(1), Some("a"));
    }

    fn model_result(shortlist: &[&str], ranking: &str) -> ModelMatchingResult {
        ModelMatchingResult {
            job_id: "job-1".to_string(),
            seconds_taken: 30.0,
            shortlisted: shortlist.iter().map(|s| s.to_string()).collect(),
            ranking: serde_json::from_str(ranking).unwrap(),
        }
    }

    #[test]
    fn test_model_result_shortlist_need_not_be_prefix() {
        let result = model_result(&["C"], r#"{"1": "A", "2": "B", "3": "C"}"#);
        assert!(result.validate(3).is_ok());
    }

    #[test]
    fn test_model_ranking_with_gap_and_repeat_is_rejected() {
        let result = model_result(&["D"], r#"{"1": "D", "2": "C", "3": "B", "4": "A", "9": "A"}"#);
        assert!(matches!(
            result.validate(4),
            Err(ScreeningError::ConsistencyViolation(_))
        ));
    }

    #[test]
    fn test_model_ranking_of_wrong_size_is_rejected() {
        let result = model_result(&[], r#"{"1": "A", "2": "B"}"#);
        assert!(result.validate(3).is_err());
    }

    #[test]
    fn test_model_shortlist_outside_ranking_is_rejected() {
        let result = model_result(&["Z"], r#"{"1": "A", "2": "B"}"#);
        assert!(matches!(
            result.validate(2),
            Err(ScreeningError::ConsistencyViolation(_))
        ));
    }

    #[test]
    fn test_model_result_with_repeated_name_fails_validation() {
        let scored = vec![
            ScoredCandidate { name: "cv".into(), total_score: 80.0, promising: true },
            ScoredCandidate { name: "cv".into(), total_score: 40.0, promising: false },
        ];
        let result = ModelMatchingResult::from_scored("job-1", 5.0, scored);
        assert!(result.validate(2).is_err());
    }

    #[test]
    fn test_human_error_result_flattens() {
        let err = HumanErrorResult {
            submitter_id: 3,
            error: ErrorResult { hamming_distance: 2, rank_correlation: 0.5 },
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["hamming_distance"], 2);
        assert_eq!(json["submitter_id"], 3);
    }
}
