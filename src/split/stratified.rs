//! Stratified shuffle split.
//!
//! A single (non cross-validated) split that keeps each price stratum's share
//! of the test set close to its share of the whole dataset.
//!
//! Allocation rules:
//! - strata with fewer than 2 records cannot be split and go entirely to train
//! - the test size is `ceil(test_fraction * n)` over the remaining records
//! - per-stratum test counts use largest-remainder rounding, tie-broken by
//!   stratum order, so the result is deterministic
//! - every splittable stratum keeps at least one record in train, and gets at
//!   least one record in test whenever the test size allows it
//!
//! Records are shuffled inside their stratum with a `StdRng` seeded from the
//! config, so identical inputs and seed give identical membership.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::{PriceStratum, SplitConfig};
use crate::error::IngestError;

/// Row indices of a split, each list sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split `records` into `(train, test)` according to the parallel `strata`.
pub fn stratified_split<T: Clone>(
    records: &[T],
    strata: &[PriceStratum],
    config: &SplitConfig,
) -> Result<(Vec<T>, Vec<T>), IngestError> {
    if records.len() != strata.len() {
        return Err(IngestError::Split(format!(
            "{} records but {} strata",
            records.len(),
            strata.len()
        )));
    }

    let indices = split_indices(strata, config)?;
    let train = indices.train.iter().map(|&i| records[i].clone()).collect();
    let test = indices.test.iter().map(|&i| records[i].clone()).collect();
    Ok((train, test))
}

/// Compute the train/test partition of `0..strata.len()`.
pub fn split_indices(strata: &[PriceStratum], config: &SplitConfig) -> Result<SplitIndices, IngestError> {
    let fraction = config.test_fraction;
    if !(fraction.is_finite() && fraction > 0.0 && fraction < 1.0) {
        return Err(IngestError::Split(format!(
            "test fraction must be in (0, 1), got {fraction}"
        )));
    }
    if strata.is_empty() {
        return Err(IngestError::Split("no records to split".to_string()));
    }

    let mut groups: [Vec<usize>; 5] = Default::default();
    for (idx, stratum) in strata.iter().enumerate() {
        groups[stratum.index()].push(idx);
    }

    let mut train = Vec::with_capacity(strata.len());
    let mut splittable: Vec<(PriceStratum, Vec<usize>)> = Vec::new();
    for stratum in PriceStratum::ALL {
        let members = std::mem::take(&mut groups[stratum.index()]);
        match members.len() {
            0 => {}
            1 => {
                tracing::debug!(stratum = stratum.label(), "singleton stratum assigned to train");
                train.extend(members);
            }
            _ => splittable.push((stratum, members)),
        }
    }

    if splittable.is_empty() {
        return Err(IngestError::Split(
            "no price stratum has at least 2 records".to_string(),
        ));
    }

    let counts: Vec<usize> = splittable.iter().map(|(_, m)| m.len()).collect();
    let n_splittable: usize = counts.iter().sum();
    // Guard against `0.2 * 10 = 2.0000000000000004`-style ceilings.
    let n_test = (fraction * n_splittable as f64 - 1e-9).ceil().max(0.0) as usize;
    let allocation = allocate_test_counts(&counts, n_test);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut test = Vec::with_capacity(n_test);
    for ((stratum, mut members), n) in splittable.into_iter().zip(allocation) {
        members.shuffle(&mut rng);
        tracing::debug!(
            stratum = stratum.label(),
            total = members.len(),
            test = n,
            "stratum allocation"
        );
        test.extend_from_slice(&members[..n]);
        train.extend_from_slice(&members[n..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

/// Distribute `n_test` test slots over strata with `counts[i] >= 2` members.
fn allocate_test_counts(counts: &[usize], n_test: usize) -> Vec<usize> {
    let k = counts.len();
    let total: usize = counts.iter().sum();
    let lower = if n_test >= k { 1 } else { 0 };
    let n_test = n_test.clamp(lower * k, total - k);

    let ideal: Vec<f64> = counts
        .iter()
        .map(|&c| n_test as f64 * c as f64 / total as f64)
        .collect();
    let mut alloc: Vec<usize> = ideal
        .iter()
        .zip(counts)
        .map(|(x, &c)| (x.floor() as usize).clamp(lower, c - 1))
        .collect();

    let mut assigned: usize = alloc.iter().sum();
    while assigned < n_test {
        let candidates = (0..k)
            .filter(|&i| alloc[i] < counts[i] - 1)
            .map(|i| (i, ideal[i] - alloc[i] as f64));
        let Some(i) = argmax(candidates) else { break };
        alloc[i] += 1;
        assigned += 1;
    }
    while assigned > n_test {
        let candidates = (0..k)
            .filter(|&i| alloc[i] > lower)
            .map(|i| (i, alloc[i] as f64 - ideal[i]));
        let Some(i) = argmax(candidates) else { break };
        alloc[i] -= 1;
        assigned -= 1;
    }

    alloc
}

/// Index of the largest key; the first one wins ties.
fn argmax(keys: impl Iterator<Item = (usize, f64)>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, key) in keys {
        if best.is_none_or(|(_, b)| key > b) {
            best = Some((i, key));
        }
    }
    best.map(|(i, _)| i)
}
