//! Human Baseline Reconciler: merges every human submission for one job into
//! a consensus shortlist (strict majority) and a consensus ranking.
//!
//! Ranking order: ascending by (mean, mode, min, max) of the ranks each
//! candidate received, then by candidate name so the result is total.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::ScreeningError;
use crate::evaluation::metrics::mean;
use crate::models::evaluation::{
    CandidateName, ConsensusHumanResult, HumanMatchingResult, Ranking,
};

/// Rank statistics of one candidate across submissions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankStats {
    pub mean: f64,
    /// Smallest of the most frequent ranks.
    pub mode: u32,
    pub min: u32,
    pub max: u32,
}

impl RankStats {
    fn from_ranks(ranks: &[u32]) -> Self {
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for &rank in ranks {
            *counts.entry(rank).or_default() += 1;
        }
        let top = counts.values().copied().max().unwrap_or(0);
        let mode = counts
            .iter()
            .find(|&(_, &count)| count == top)
            .map(|(&rank, _)| rank)
            .unwrap_or(0);

        Self {
            mean: mean(ranks.iter().map(|&r| f64::from(r))),
            mode,
            min: ranks.iter().copied().min().unwrap_or(0),
            max: ranks.iter().copied().max().unwrap_or(0),
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.mean
            .total_cmp(&other.mean)
            .then(self.mode.cmp(&other.mode))
            .then(self.min.cmp(&other.min))
            .then(self.max.cmp(&other.max))
    }
}

/// Computes the consensus for one job.
///
/// Every submission must be internally consistent (bijection over
/// `panel_size` candidates, shortlist = ranking prefix), belong to `job_id`,
/// and rank the same candidates. Any violation aborts this job only.
pub fn reconcile_humans(
    job_id: &str,
    submissions: &[HumanMatchingResult],
    panel_size: usize,
) -> Result<ConsensusHumanResult, ScreeningError> {
    let first = submissions.first().ok_or_else(|| {
        ScreeningError::ConsistencyViolation(format!("no human submissions for job '{job_id}'"))
    })?;

    let candidates = first.ranking.candidates();
    for submission in submissions {
        if submission.job_id != job_id {
            return Err(ScreeningError::ConsistencyViolation(format!(
                "submission {} belongs to job '{}', not '{job_id}'",
                submission.submitter_id, submission.job_id
            )));
        }
        submission.validate(panel_size)?;
        if submission.ranking.candidates() != candidates {
            return Err(ScreeningError::ConsistencyViolation(format!(
                "submission {} for job '{job_id}' ranks a different candidate set",
                submission.submitter_id
            )));
        }
    }

    let shortlisted = majority_shortlist(submissions);
    let ranking = consensus_ranking(&candidates, submissions);
    let minutes_taken = mean(submissions.iter().map(|s| f64::from(s.minutes_taken)));

    Ok(ConsensusHumanResult {
        job_id: job_id.to_string(),
        submitters: submissions.len(),
        minutes_taken,
        shortlisted,
        ranking,
    })
}

/// Candidates shortlisted by strictly more than half of the submitters.
fn majority_shortlist(submissions: &[HumanMatchingResult]) -> BTreeSet<CandidateName> {
    let mut votes: BTreeMap<&str, usize> = BTreeMap::new();
    for submission in submissions {
        for candidate in &submission.shortlisted {
            *votes.entry(candidate.as_str()).or_default() += 1;
        }
    }
    votes
        .into_iter()
        .filter(|&(_, count)| count * 2 > submissions.len())
        .map(|(candidate, _)| candidate.to_string())
        .collect()
}

fn consensus_ranking(
    candidates: &BTreeSet<CandidateName>,
    submissions: &[HumanMatchingResult],
) -> Ranking {
    let mut ranks: BTreeMap<&str, Vec<u32>> = candidates
        .iter()
        .map(|c| (c.as_str(), Vec::with_capacity(submissions.len())))
        .collect();
    for submission in submissions {
        for (place, candidate) in submission.ranking.places() {
            if let Some(list) = ranks.get_mut(candidate) {
                list.push(place);
            }
        }
    }

    let mut stats: Vec<(&str, RankStats)> = ranks
        .into_iter()
        .map(|(candidate, list)| (candidate, RankStats::from_ranks(&list)))
        .collect();
    stats.sort_by(|(a_name, a), (b_name, b)| a.cmp_key(b).then_with(|| a_name.cmp(b_name)));

    Ranking::from_order(stats.into_iter().map(|(candidate, _)| candidate))
}
