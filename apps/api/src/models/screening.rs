//! Value objects produced by a scoring run. Immutable once built; serialized
//! into the result store as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{RequirementCategory, ScoreBounds};
use crate::errors::ScreeningError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Mandatory,
    Optional,
}

/// A single requirement extracted from a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRequirement")]
pub struct Requirement {
    #[serde(rename = "type")]
    pub kind: RequirementKind,
    pub specification: String,
}

#[derive(Deserialize)]
struct RawRequirement {
    #[serde(rename = "type")]
    kind: RequirementKind,
    specification: String,
}

impl TryFrom<RawRequirement> for Requirement {
    type Error = ScreeningError;

    fn try_from(raw: RawRequirement) -> Result<Self, Self::Error> {
        Requirement::new(raw.kind, &raw.specification)
    }
}

impl Requirement {
    pub fn new(kind: RequirementKind, specification: &str) -> Result<Self, ScreeningError> {
        let specification = specification.trim();
        if specification.is_empty() {
            return Err(ScreeningError::SchemaViolation(
                "requirement specification must not be empty".to_string(),
            ));
        }
        Ok(Self {
            kind,
            specification: specification.to_string(),
        })
    }
}

pub type RequirementsByCategory = BTreeMap<RequirementCategory, Vec<Requirement>>;

/// A bounded judgment of how well a CV satisfies one requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub value: f64,
    pub explanation: String,
}

impl Score {
    /// Builds a score with `value` pulled into `bounds`.
    pub fn clamped(value: f64, explanation: &str, bounds: &ScoreBounds) -> Self {
        Self {
            value: bounds.clamp(value),
            explanation: explanation.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementMatch {
    pub score: Score,
    pub requirement: Requirement,
}

pub type RequirementMatches = BTreeMap<RequirementCategory, Vec<RequirementMatch>>;

/// Holistic promising / not-promising verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPromisingResult")]
pub struct PromisingResult {
    pub promising: bool,
    pub explanation: String,
}

#[derive(Deserialize)]
struct RawPromisingResult {
    promising: bool,
    explanation: String,
}

impl TryFrom<RawPromisingResult> for PromisingResult {
    type Error = ScreeningError;

    fn try_from(raw: RawPromisingResult) -> Result<Self, Self::Error> {
        let explanation = raw.explanation.trim();
        if explanation.is_empty() {
            return Err(ScreeningError::SchemaViolation(
                "promising explanation must not be empty".to_string(),
            ));
        }
        Ok(Self {
            promising: raw.promising,
            explanation: explanation.to_string(),
        })
    }
}

/// Everything the engine concluded about one candidate for one job.
///
/// `requirement_matches` carries a key for every configured category, with an
/// empty list where the job had no requirement of that category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantMatch {
    pub total_score: f64,
    pub promising_result: PromisingResult,
    pub requirement_matches: RequirementMatches,
}

impl ApplicantMatch {
    /// Mean score per category, skipping categories without matches.
    pub fn category_scores(&self) -> BTreeMap<RequirementCategory, f64> {
        self.requirement_matches
            .iter()
            .filter(|(_, matches)| !matches.is_empty())
            .map(|(&category, matches)| {
                let sum: f64 = matches.iter().map(|m| m.score.value).sum();
                (category, sum / matches.len() as f64)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_specification_is_trimmed() {
        let req = Requirement::new(RequirementKind::Mandatory, "  5+ years Rust \n").unwrap();
        assert_eq!(req.specification, "5+ years Rust");
    }

    #[test]
    fn test_requirement_rejects_blank_specification() {
        assert!(Requirement::new(RequirementKind::Optional, "   ").is_err());
    }

    #[test]
    fn test_requirement_deserializes_with_type_key() {
        let req: Requirement =
            serde_json::from_str(r#"{"type": "optional", "specification": " Kafka "}"#).unwrap();
        assert_eq!(req.kind, RequirementKind::Optional);
        assert_eq!(req.specification, "Kafka");
    }

    #[test]
    fn test_requirement_deserialization_rejects_unknown_kind() {
        let result: Result<Requirement, _> =
            serde_json::from_str(r#"{"type": "nice_to_have", "specification": "Kafka"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_requirement_serializes_kind_as_type() {
        let req = Requirement::new(RequirementKind::Mandatory, "SQL").unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "mandatory");
    }

    #[test]
    fn test_score_clamped_into_bounds() {
        let bounds = ScoreBounds::default();
        assert_eq!(Score::clamped(140.0, "great", &bounds).value, 100.0);
        assert_eq!(Score::clamped(-3.0, "none", &bounds).value, 0.0);
        assert_eq!(Score::clamped(42.0, " fine ", &bounds).explanation, "fine");
    }

    #[test]
    fn test_promising_requires_explanation() {
        let result: Result<PromisingResult, _> =
            serde_json::from_str(r#"{"promising": true, "explanation": "  "}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_promising_rejects_non_boolean() {
        let result: Result<PromisingResult, _> =
            serde_json::from_str(r#"{"promising": "yes", "explanation": "fits"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_category_scores_skip_empty_categories() {
        let bounds = ScoreBounds::default();
        let req = Requirement::new(RequirementKind::Mandatory, "Rust").unwrap();
        let mut matches = RequirementMatches::new();
        matches.insert(
            RequirementCategory::HardSkills,
            vec![
                RequirementMatch {
                    score: Score::clamped(80.0, "a", &bounds),
                    requirement: req.clone(),
                },
                RequirementMatch {
                    score: Score::clamped(60.0, "b", &bounds),
                    requirement: req,
                },
            ],
        );
        matches.insert(RequirementCategory::Travel, vec![]);
        let applicant = ApplicantMatch {
            total_score: 70.0,
            promising_result: PromisingResult {
                promising: true,
                explanation: "ok".into(),
            },
            requirement_matches: matches,
        };
        let scores = applicant.category_scores();
        assert_eq!(scores.len(), 1);
        assert!((scores[&RequirementCategory::HardSkills] - 70.0).abs() < 1e-9);
    }
}
