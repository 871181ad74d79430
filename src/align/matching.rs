//! Brute-force Hamming matching with cross-check
use rayon::prelude::*;

use super::features::Descriptor;

/// A query/train descriptor pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorMatch {
    /// Index into the query set
    pub query: usize,
    /// Index into the train set
    pub train: usize,
    /// Hamming distance
    pub distance: u32,
}

/// Index and distance of the nearest descriptor; earlier index wins ties
fn nearest(descriptor: &Descriptor, candidates: &[Descriptor]) -> Option<(usize, u32)> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, descriptor.hamming(c)))
        .min_by_key(|&(i, d)| (d, i))
}

/// Pairs that are each other's nearest neighbour, best first
///
/// Ordering is by distance, then by query index, so the result is
/// deterministic regardless of thread scheduling.
pub fn cross_check_matches(query: &[Descriptor], train: &[Descriptor]) -> Vec<DescriptorMatch> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let backward: Vec<Option<usize>> = train
        .par_iter()
        .map(|t| nearest(t, query).map(|(i, _)| i))
        .collect();

    let mut matches: Vec<DescriptorMatch> = query
        .par_iter()
        .enumerate()
        .filter_map(|(qi, q)| {
            let (ti, distance) = nearest(q, train)?;
            (backward[ti] == Some(qi)).then_some(DescriptorMatch {
                query: qi,
                train: ti,
                distance,
            })
        })
        .collect();

    matches.sort_by_key(|m| (m.distance, m.query));
    matches
}

/// Keep the best `fraction` of sorted matches, but never fewer than `min_keep`
pub fn retain_best(matches: &mut Vec<DescriptorMatch>, fraction: f32, min_keep: usize) {
    let n = matches.len();
    let by_fraction = (n as f32 * fraction.clamp(0.0, 1.0)).ceil() as usize;
    matches.truncate(by_fraction.max(min_keep).min(n));
}
