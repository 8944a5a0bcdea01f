mod config;
use log::{debug, info};

use std::collections::{HashMap, HashSet};

use chrono::{FixedOffset, Timelike};

pub use crate::config::*;

pub mod builder;
pub mod locations;
pub mod manual;
pub mod quality;

// **** Private structures ****

// Per-candidate counts, keyed by the candidate reference of the votes.
struct Tally<'a> {
    counts: HashMap<&'a str, u64>,
    total: u64,
}

impl<'a> Tally<'a> {
    fn from_votes(votes: &'a [Vote]) -> Tally<'a> {
        let mut counts: HashMap<&'a str, u64> = HashMap::new();
        for v in votes.iter() {
            if let Some(cid) = v.candidate_ref() {
                *counts.entry(cid).or_insert(0) += 1;
            }
        }
        Tally {
            counts,
            total: votes.len() as u64,
        }
    }

    fn count(&self, candidate_id: &str) -> u64 {
        self.counts.get(candidate_id).cloned().unwrap_or(0)
    }
}

/// Rounds to the given number of decimals.
pub(crate) fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}

pub(crate) fn percentage(part: u64, total: u64, decimals: i32) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_to((part as f64 / total as f64) * 100.0, decimals)
    }
}

/// Counts the votes of each candidate.
///
/// Arguments:
/// * `votes` the snapshot of votes
/// * `candidates` the registered candidates, in display order
///
/// Every candidate appears exactly once in the output, in the input order,
/// even without any vote. Votes that do not point to any candidate are
/// left out of the counts but still make up the denominator of the
/// percentages.
///
/// ```
/// use vote_tally::*;
/// use chrono::{TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2025, 4, 13, 9, 0, 0).unwrap();
/// let candidates = vec![Candidate::new("a", "Ana", "P1"), Candidate::new("b", "Beto", "P2")];
/// let votes = vec![Vote::new("1", Some("a"), t), Vote::new("2", Some("x"), t)];
///
/// let res = compute_results(&votes, &candidates);
/// assert_eq!(res[0].count, 1);
/// assert_eq!(res[0].percentage, 50.0);
/// assert_eq!(res[1].count, 0);
/// ```
pub fn compute_results(votes: &[Vote], candidates: &[Candidate]) -> Vec<CandidateResult> {
    info!(
        "compute_results: Processing {:?} votes for {:?} candidates",
        votes.len(),
        candidates.len()
    );
    let tally = Tally::from_votes(votes);
    let res: Vec<CandidateResult> = candidates
        .iter()
        .map(|c| {
            let count = tally.count(&c.id);
            CandidateResult {
                candidate_id: c.id.clone(),
                name: c.name.clone(),
                party: c.party.clone(),
                count,
                percentage: percentage(count, tally.total, 2),
            }
        })
        .collect();
    if log::log_enabled!(log::Level::Debug) {
        let assigned: u64 = res.iter().map(|r| r.count).sum();
        debug!(
            "compute_results: {} assigned votes, {} unassigned",
            assigned,
            tally.total - assigned
        );
    }
    res
}

/// Number of votes per hour of the day, in UTC.
///
/// Only the hours that received votes are returned, in increasing order.
/// See [densify_hourly] to get all the hours of the day.
pub fn compute_hourly_histogram(votes: &[Vote]) -> Vec<HourBucket> {
    hourly_histogram(votes, |v| v.voted_at.hour())
}

/// Same as [compute_hourly_histogram], with the hours read in the given
/// offset from UTC instead. This is for display: the votes stay in UTC.
pub fn compute_hourly_histogram_in(votes: &[Vote], offset: &FixedOffset) -> Vec<HourBucket> {
    hourly_histogram(votes, |v| v.voted_at.with_timezone(offset).hour())
}

fn hourly_histogram<F>(votes: &[Vote], hour_of: F) -> Vec<HourBucket>
where
    F: Fn(&Vote) -> u32,
{
    let mut counts = [0u64; 24];
    for v in votes.iter() {
        counts[hour_of(v) as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(hour, c)| HourBucket {
            hour: hour as u32,
            count: *c,
        })
        .collect()
}

/// Expands a sparse hourly histogram into the 24 hours of the day.
pub fn densify_hourly(buckets: &[HourBucket]) -> [u64; 24] {
    let mut res = [0u64; 24];
    for b in buckets.iter() {
        if let Some(slot) = res.get_mut(b.hour as usize) {
            *slot += b.count;
        }
    }
    res
}

/// Number of votes per reported location.
///
/// Sorted by decreasing count. Locations with the same count keep the order
/// in which they first appear in the votes. Votes without a location are
/// not counted at all.
pub fn compute_location_histogram(votes: &[Vote]) -> Vec<LocationBucket> {
    let mut buckets: Vec<LocationBucket> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for v in votes.iter() {
        let loc = match v.location() {
            Some(loc) => loc,
            None => continue,
        };
        if let Some(idx) = positions.get(&loc) {
            buckets[*idx].count += 1;
        } else {
            positions.insert(loc.clone(), buckets.len());
            buckets.push(LocationBucket {
                location: loc,
                count: 1,
            });
        }
    }
    // The sort is stable: ties stay in first-seen order.
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    debug!(
        "compute_location_histogram: {} locations for {} votes",
        buckets.len(),
        votes.len()
    );
    buckets
}

/// Headline numbers for the dashboard. The peak hour is in UTC.
pub fn compute_summary(votes: &[Vote], candidates: &[Candidate]) -> TallySummary {
    summary(votes, candidates, compute_hourly_histogram(votes))
}

/// Same as [compute_summary], with the peak hour read in the given offset.
pub fn compute_summary_in(
    votes: &[Vote],
    candidates: &[Candidate],
    offset: &FixedOffset,
) -> TallySummary {
    summary(votes, candidates, compute_hourly_histogram_in(votes, offset))
}

fn summary(votes: &[Vote], candidates: &[Candidate], hourly: Vec<HourBucket>) -> TallySummary {
    let results = compute_results(votes, candidates);
    let assigned: u64 = results.iter().map(|r| r.count).sum();

    let max_count = results.iter().map(|r| r.count).max().unwrap_or(0);
    let leaders: Vec<&CandidateResult> = results.iter().filter(|r| r.count == max_count).collect();
    let leader = match leaders.as_slice() {
        [single] if max_count > 0 => Some(single.candidate_id.clone()),
        _ => None,
    };

    let locations: HashSet<String> = votes.iter().filter_map(|v| v.location()).collect();

    // max_by_key returns the last maximum, so look for the first one by hand.
    let mut peak_hour: Option<HourBucket> = None;
    for b in hourly {
        match peak_hour {
            Some(p) if p.count >= b.count => {}
            _ => peak_hour = Some(b),
        }
    }

    TallySummary {
        total_votes: votes.len() as u64,
        candidate_count: candidates.len() as u64,
        unassigned_votes: (votes.len() as u64).saturating_sub(assigned),
        leader,
        location_count: locations.len() as u64,
        peak_hour: peak_hour.map(|b| b.hour),
    }
}

/// Orders the candidates by registration time.
///
/// Candidates without a registration time go last. The sort is stable.
pub fn sort_candidates_by_creation(candidates: &mut [Candidate]) {
    candidates.sort_by_key(|c| (c.created_at.is_none(), c.created_at));
}
