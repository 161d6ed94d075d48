//! Set and rank comparisons between an evaluated party and the consensus.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::ScreeningError;
use crate::models::evaluation::{CandidateName, ErrorResult, Ranking};

/// Which direction of a metric counts as better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// Size of the symmetric difference of two shortlists.
pub fn hamming_distance(a: &BTreeSet<CandidateName>, b: &BTreeSet<CandidateName>) -> usize {
    a.symmetric_difference(b).count()
}

/// Exact Kendall tau-a between two rankings of the same candidates.
///
/// Both rankings are bijections, so ties cannot occur. Rankings with fewer
/// than two candidates are perfectly correlated.
pub fn kendall_tau(a: &Ranking, b: &Ranking) -> Result<f64, ScreeningError> {
    if a.candidates() != b.candidates() {
        return Err(ScreeningError::ConsistencyViolation(format!(
            "cannot correlate rankings over different candidates: {:?} vs {:?}",
            a.candidates(),
            b.candidates()
        )));
    }

    let n = a.len();
    if n < 2 {
        return Ok(1.0);
    }

    let order: Vec<&str> = a.ordered().collect();
    let b_positions = b.positions();
    let mut balance: i64 = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            // `order[i]` precedes `order[j]` in `a`; concordant iff it does in `b` too.
            if b_positions[order[i]] < b_positions[order[j]] {
                balance += 1;
            } else {
                balance -= 1;
            }
        }
    }

    let pairs = (n * (n - 1) / 2) as f64;
    Ok(balance as f64 / pairs)
}

/// Distance of a shortlist/ranking pair from the consensus.
pub fn error_result(
    consensus_shortlist: &BTreeSet<CandidateName>,
    consensus_ranking: &Ranking,
    shortlisted: &BTreeSet<CandidateName>,
    ranking: &Ranking,
) -> Result<ErrorResult, ScreeningError> {
    Ok(ErrorResult {
        hamming_distance: hamming_distance(consensus_shortlist, shortlisted),
        rank_correlation: kendall_tau(consensus_ranking, ranking)?,
    })
}

/// Fraction of human values the model value beats or ties under `polarity`.
/// `0.0` when there are no human values.
pub fn better_or_equal_percentage(model_value: f64, human_values: &[f64], polarity: Polarity) -> f64 {
    if human_values.is_empty() {
        return 0.0;
    }
    let wins = human_values
        .iter()
        .filter(|&&human| match polarity {
            Polarity::HigherIsBetter => model_value >= human,
            Polarity::LowerIsBetter => model_value <= human,
        })
        .count();
    wins as f64 / human_values.len() as f64
}

/// `(human − model) / human`; `0.0` when no human time was recorded.
pub fn time_savings_ratio(human_seconds: f64, model_seconds: f64) -> f64 {
    if human_seconds <= 0.0 {
        return 0.0;
    }
    (human_seconds - model_seconds) / human_seconds
}

/// Candidates the party did not shortlist.
pub fn candidates_filtered(
    all_candidates: &BTreeSet<CandidateName>,
    shortlisted: &BTreeSet<CandidateName>,
) -> usize {
    all_candidates.difference(shortlisted).count()
}

/// Of the candidates the party filtered out, the fraction that the consensus
/// also left out. `0.0` when nothing was filtered.
pub fn filter_accuracy(
    all_candidates: &BTreeSet<CandidateName>,
    shortlisted: &BTreeSet<CandidateName>,
    consensus_shortlist: &BTreeSet<CandidateName>,
) -> f64 {
    let filtered: BTreeSet<&CandidateName> = all_candidates.difference(shortlisted).collect();
    if filtered.is_empty() {
        return 0.0;
    }
    let wrongly_filtered = filtered
        .iter()
        .filter(|c| consensus_shortlist.contains(c.as_str()))
        .count();
    (filtered.len() - wrongly_filtered) as f64 / filtered.len() as f64
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
