//! Entity-by-entity comparison tables for one job: every human submitter and
//! the model, each compared with every other on shortlist and ranking.

use std::collections::BTreeSet;
use std::iter::once;

use serde::{Deserialize, Serialize};

use crate::errors::ScreeningError;
use crate::evaluation::metrics::{hamming_distance, kendall_tau, mean};
use crate::models::evaluation::{
    CandidateName, HumanMatchingResult, ModelMatchingResult, Ranking,
};

pub const MODEL_ENTITY: &str = "model";

pub fn human_entity(submitter_id: u32) -> String {
    format!("human_{submitter_id}")
}

/// Square table of a symmetric pairwise metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMatrix {
    /// `values[i][j]` compares entity `i` with entity `j`.
    pub values: Vec<Vec<f64>>,
    /// Mean of each row, self-comparison included.
    pub entity_means: Vec<f64>,
    pub overall_mean: f64,
}

impl ComparisonMatrix {
    fn from_values(values: Vec<Vec<f64>>) -> Self {
        let entity_means: Vec<f64> = values.iter().map(|row| mean(row.iter().copied())).collect();
        let overall_mean = mean(entity_means.iter().copied());
        Self {
            values,
            entity_means,
            overall_mean,
        }
    }

    fn build<T: ?Sized>(
        items: &[&T],
        metric: impl Fn(&T, &T) -> Result<f64, ScreeningError>,
    ) -> Result<Self, ScreeningError> {
        let values = items
            .iter()
            .map(|a| {
                items
                    .iter()
                    .map(|b| metric(*a, *b))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_values(values))
    }

    fn cellwise_mean(size: usize, matrices: &[&ComparisonMatrix]) -> Self {
        let values = (0..size)
            .map(|i| {
                (0..size)
                    .map(|j| mean(matrices.iter().map(|m| m.values[i][j])))
                    .collect()
            })
            .collect();
        Self::from_values(values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityComparison {
    /// `human_<submitter_id>` by ascending id, then `model`.
    pub entities: Vec<String>,
    pub minutes_taken: Vec<f64>,
    pub hamming_distance: ComparisonMatrix,
    pub rank_correlation: ComparisonMatrix,
}

/// Builds the pairwise tables. Every ranking must cover the same candidates.
pub fn compare_entities(
    human_results: &[HumanMatchingResult],
    model_result: &ModelMatchingResult,
) -> Result<EntityComparison, ScreeningError> {
    let mut humans: Vec<&HumanMatchingResult> = human_results.iter().collect();
    humans.sort_by_key(|h| h.submitter_id);

    let entities: Vec<String> = humans
        .iter()
        .map(|h| human_entity(h.submitter_id))
        .chain(once(MODEL_ENTITY.to_string()))
        .collect();
    let minutes_taken: Vec<f64> = humans
        .iter()
        .map(|h| f64::from(h.minutes_taken))
        .chain(once(model_result.seconds_taken / 60.0))
        .collect();

    let shortlists: Vec<&BTreeSet<CandidateName>> = humans
        .iter()
        .map(|h| &h.shortlisted)
        .chain(once(&model_result.shortlisted))
        .collect();
    let rankings: Vec<&Ranking> = humans
        .iter()
        .map(|h| &h.ranking)
        .chain(once(&model_result.ranking))
        .collect();

    Ok(EntityComparison {
        hamming_distance: ComparisonMatrix::build(&shortlists, |a, b| {
            Ok(hamming_distance(a, b) as f64)
        })?,
        rank_correlation: ComparisonMatrix::build(&rankings, kendall_tau)?,
        entities,
        minutes_taken,
    })
}

/// Cell-wise mean over jobs. `None` when there are no jobs or the jobs were
/// not screened by the same entities.
pub fn mean_comparison(comparisons: &[&EntityComparison]) -> Option<EntityComparison> {
    let (first, rest) = comparisons.split_first()?;
    if rest.iter().any(|c| c.entities != first.entities) {
        return None;
    }

    let size = first.entities.len();
    let hamming: Vec<&ComparisonMatrix> = comparisons.iter().map(|c| &c.hamming_distance).collect();
    let correlation: Vec<&ComparisonMatrix> =
        comparisons.iter().map(|c| &c.rank_correlation).collect();

    Some(EntityComparison {
        entities: first.entities.clone(),
        minutes_taken: (0..size)
            .map(|i| mean(comparisons.iter().map(|c| c.minutes_taken[i])))
            .collect(),
        hamming_distance: ComparisonMatrix::cellwise_mean(size, &hamming),
        rank_correlation: ComparisonMatrix::cellwise_mean(size, &correlation),
    })
}
