//! Requirement Catalog: the fixed set of requirement categories, their weights,
//! and the global score bounds every judgment is clamped into.
//!
//! `RunContext` bundles these read-only values and is passed explicitly into the
//! orchestrator. It is shared across all concurrent workers without locking.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the fixed requirement dimensions a job description is broken into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    WorkExperience,
    Education,
    OtherQualifications,
    HardSkills,
    SoftSkills,
    SpecificKnowledge,
    PersonalTraits,
    Languages,
    Travel,
    Location,
    WorkingHours,
    PhysicalAbility,
}

impl RequirementCategory {
    pub const ALL: [RequirementCategory; 12] = [
        RequirementCategory::WorkExperience,
        RequirementCategory::Education,
        RequirementCategory::OtherQualifications,
        RequirementCategory::HardSkills,
        RequirementCategory::SoftSkills,
        RequirementCategory::SpecificKnowledge,
        RequirementCategory::PersonalTraits,
        RequirementCategory::Languages,
        RequirementCategory::Travel,
        RequirementCategory::Location,
        RequirementCategory::WorkingHours,
        RequirementCategory::PhysicalAbility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementCategory::WorkExperience => "work_experience",
            RequirementCategory::Education => "education",
            RequirementCategory::OtherQualifications => "other_qualifications",
            RequirementCategory::HardSkills => "hard_skills",
            RequirementCategory::SoftSkills => "soft_skills",
            RequirementCategory::SpecificKnowledge => "specific_knowledge",
            RequirementCategory::PersonalTraits => "personal_traits",
            RequirementCategory::Languages => "languages",
            RequirementCategory::Travel => "travel",
            RequirementCategory::Location => "location",
            RequirementCategory::WorkingHours => "working_hours",
            RequirementCategory::PhysicalAbility => "physical_ability",
        }
    }

    /// Short definition embedded in extraction and matching prompts.
    pub fn definition(&self) -> &'static str {
        match self {
            RequirementCategory::WorkExperience => {
                "Professional experience: roles held, years in a field, industries worked in."
            }
            RequirementCategory::Education => {
                "Formal education: degrees, fields of study, schools, vocational training."
            }
            RequirementCategory::OtherQualifications => {
                "Certificates, licences and other formal qualifications outside a degree."
            }
            RequirementCategory::HardSkills => {
                "Teachable technical abilities: tools, programming languages, methods."
            }
            RequirementCategory::SoftSkills => {
                "Interpersonal abilities: communication, teamwork, leadership."
            }
            RequirementCategory::SpecificKnowledge => {
                "Domain knowledge: regulations, markets, products, scientific fields."
            }
            RequirementCategory::PersonalTraits => {
                "Character traits: reliability, curiosity, resilience."
            }
            RequirementCategory::Languages => "Spoken or written natural languages and their level.",
            RequirementCategory::Travel => "Willingness or ability to travel for the job.",
            RequirementCategory::Location => "Place of work, relocation or residence requirements.",
            RequirementCategory::WorkingHours => {
                "Working time: full-time, part-time, shifts, weekend work."
            }
            RequirementCategory::PhysicalAbility => {
                "Physical demands: lifting, standing, driving licence, fitness."
            }
        }
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementCategory {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        RequirementCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| CatalogError::UnknownCategory(needle.to_string()))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("unknown requirement category '{0}'")]
    UnknownCategory(String),

    #[error("weight for '{category}' must be a positive number, got {weight}")]
    InvalidWeight {
        category: RequirementCategory,
        weight: f64,
    },

    #[error("category weighting must contain at least one category")]
    EmptyWeighting,

    #[error("malformed weighting entry '{0}' (expected category=weight)")]
    MalformedEntry(String),

    #[error("score bounds must be finite with min < max, got [{min}, {max}]")]
    InvalidBounds { min: f64, max: f64 },
}

// ────────────────────────────────────────────────────────────────────────────
// Weighting
// ────────────────────────────────────────────────────────────────────────────

/// Positive weight per configured category. The configured categories are the
/// catalog for a run: extraction only produces keys for them.
///
/// Weights need not sum to anything; aggregation renormalizes over the
/// categories that are actually present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryWeighting(BTreeMap<RequirementCategory, f64>);

impl CategoryWeighting {
    pub fn new(weights: BTreeMap<RequirementCategory, f64>) -> Result<Self, CatalogError> {
        if weights.is_empty() {
            return Err(CatalogError::EmptyWeighting);
        }
        for (&category, &weight) in &weights {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(CatalogError::InvalidWeight { category, weight });
            }
        }
        Ok(Self(weights))
    }

    /// Parses `work_experience=3,education=2`. Listed categories replace the
    /// whole catalog.
    pub fn parse(spec: &str) -> Result<Self, CatalogError> {
        let mut weights = BTreeMap::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| CatalogError::MalformedEntry(entry.to_string()))?;
            let category: RequirementCategory = name.parse()?;
            let weight: f64 = value
                .trim()
                .parse()
                .map_err(|_| CatalogError::MalformedEntry(entry.to_string()))?;
            weights.insert(category, weight);
        }
        Self::new(weights)
    }

    pub fn weight(&self, category: RequirementCategory) -> Option<f64> {
        self.0.get(&category).copied()
    }

    pub fn categories(&self) -> impl Iterator<Item = RequirementCategory> + '_ {
        self.0.keys().copied()
    }

    pub fn contains(&self, category: RequirementCategory) -> bool {
        self.0.contains_key(&category)
    }

    /// Σ weight over every configured category.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

impl Default for CategoryWeighting {
    fn default() -> Self {
        use RequirementCategory::*;
        let weights = [
            (WorkExperience, 3.0),
            (Education, 2.0),
            (OtherQualifications, 1.0),
            (HardSkills, 3.0),
            (SoftSkills, 1.0),
            (SpecificKnowledge, 2.0),
            (PersonalTraits, 1.0),
            (Languages, 2.0),
            (Travel, 1.0),
            (Location, 1.0),
            (WorkingHours, 1.0),
            (PhysicalAbility, 1.0),
        ];
        Self(weights.into_iter().collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Score bounds
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBounds {
    pub min: f64,
    pub max: f64,
}

impl ScoreBounds {
    pub fn new(min: f64, max: f64) -> Result<Self, CatalogError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(CatalogError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Out-of-range judgments are pulled to the nearest bound, never rejected.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Run context
// ────────────────────────────────────────────────────────────────────────────

/// Read-only configuration threaded through every scoring call.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub weighting: CategoryWeighting,
    pub bounds: ScoreBounds,
    /// Maximum number of answer-engine requests in flight at once.
    pub concurrency_limit: usize,
}

impl RunContext {
    pub fn new(weighting: CategoryWeighting, bounds: ScoreBounds, concurrency_limit: usize) -> Self {
        Self {
            weighting,
            bounds,
            concurrency_limit: concurrency_limit.max(1),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(CategoryWeighting::default(), ScoreBounds::default(), 16)
    }
}
