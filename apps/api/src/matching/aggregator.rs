//! Score Aggregator: combines per-requirement scores into one composite score.
//!
//! Algorithm:
//! 1. W_total   = Σ weight(c) over every configured category
//! 2. W_present = Σ weight(c) over categories with at least one match
//!    (falls back to W_total when nothing is present, leaving the score at the floor)
//! 3. total = min + Σ_present mean(score − min) × weight(c) / W_present
//!
//! Weight of missing categories is redistributed proportionally over the ones
//! that are present, so a job with requirements in few categories is not
//! penalised against one with requirements in all of them.

use crate::catalog::{CategoryWeighting, ScoreBounds};
use crate::models::screening::RequirementMatches;

pub fn compute_total_score(
    requirement_matches: &RequirementMatches,
    weighting: &CategoryWeighting,
    bounds: &ScoreBounds,
) -> f64 {
    let present = || {
        requirement_matches
            .iter()
            .filter(|(_, matches)| !matches.is_empty())
            .filter_map(|(&category, matches)| {
                weighting.weight(category).map(|weight| (matches, weight))
            })
    };

    let mut present_weight: f64 = present().map(|(_, weight)| weight).sum();
    if present_weight == 0.0 {
        present_weight = weighting.total();
    }

    let mut total = bounds.min;
    for (matches, weight) in present() {
        let mean_above_floor = matches
            .iter()
            .map(|m| m.score.value - bounds.min)
            .sum::<f64>()
            / matches.len() as f64;
        total += mean_above_floor * weight / present_weight;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RequirementCategory::{self, *};
    use crate::models::screening::{Requirement, RequirementKind, RequirementMatch, Score};

    fn weighting() -> CategoryWeighting {
        CategoryWeighting::parse("work_experience=2,education=1,hard_skills=1").unwrap()
    }

    fn scored(values: &[f64], bounds: &ScoreBounds) -> Vec<RequirementMatch> {
        values
            .iter()
            .map(|&v| RequirementMatch {
                score: Score::clamped(v, "x", bounds),
                requirement: Requirement::new(RequirementKind::Mandatory, "req").unwrap(),
            })
            .collect()
    }

    fn matches(entries: &[(RequirementCategory, &[f64])], bounds: &ScoreBounds) -> RequirementMatches {
        let mut all: RequirementMatches = [WorkExperience, Education, HardSkills]
            .into_iter()
            .map(|c| (c, Vec::new()))
            .collect();
        for (category, values) in entries {
            all.insert(*category, scored(values, bounds));
        }
        all
    }

    #[test]
    fn test_missing_category_excluded_from_present_weight() {
        let bounds = ScoreBounds::default();
        let m = matches(&[(WorkExperience, &[60.0, 40.0]), (Education, &[70.0])], &bounds);
        let total = compute_total_score(&m, &weighting(), &bounds);
        // 50 * 2/3 + 70 * 1/3
        assert!((total - 56.666_666).abs() < 1e-3, "got {total}");
    }

    #[test]
    fn test_all_present_uses_total_weight() {
        let bounds = ScoreBounds::default();
        let m = matches(
            &[(WorkExperience, &[80.0]), (Education, &[40.0]), (HardSkills, &[60.0])],
            &bounds,
        );
        let total = compute_total_score(&m, &weighting(), &bounds);
        let expected = 80.0 * 2.0 / 4.0 + 40.0 / 4.0 + 60.0 / 4.0;
        assert!((total - expected).abs() < 1e-9);
    }

    #[test]
    fn test_single_category_score_is_its_mean() {
        let bounds = ScoreBounds::new(10.0, 110.0).unwrap();
        let m = matches(&[(HardSkills, &[30.0, 50.0])], &bounds);
        let total = compute_total_score(&m, &weighting(), &bounds);
        assert!((total - 40.0).abs() < 1e-9, "got {total}");
    }

    #[test]
    fn test_nothing_present_stays_at_floor() {
        let bounds = ScoreBounds::new(1.0, 5.0).unwrap();
        let m = matches(&[], &bounds);
        assert_eq!(compute_total_score(&m, &weighting(), &bounds), 1.0);
    }

    #[test]
    fn test_empty_mapping_stays_at_floor() {
        let bounds = ScoreBounds::default();
        assert_eq!(
            compute_total_score(&RequirementMatches::new(), &weighting(), &bounds),
            0.0
        );
    }

    #[test]
    fn test_sparse_job_not_penalised() {
        let bounds = ScoreBounds::default();
        let sparse = matches(&[(HardSkills, &[90.0])], &bounds);
        let full = matches(
            &[(WorkExperience, &[90.0]), (Education, &[90.0]), (HardSkills, &[90.0])],
            &bounds,
        );
        let sparse_total = compute_total_score(&sparse, &weighting(), &bounds);
        let full_total = compute_total_score(&full, &weighting(), &bounds);
        assert!((sparse_total - full_total).abs() < 1e-9);
        assert!((sparse_total - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_stays_within_bounds() {
        let bounds = ScoreBounds::default();
        let m = matches(&[(WorkExperience, &[100.0, 100.0]), (Education, &[100.0])], &bounds);
        let total = compute_total_score(&m, &weighting(), &bounds);
        assert!(total <= bounds.max + 1e-9 && total >= bounds.min);
    }

    #[test]
    fn test_unconfigured_category_ignored() {
        let bounds = ScoreBounds::default();
        let mut m = matches(&[(Education, &[50.0])], &bounds);
        m.insert(Travel, scored(&[0.0], &bounds));
        let total = compute_total_score(&m, &weighting(), &bounds);
        assert!((total - 50.0).abs() < 1e-9);
    }
}
