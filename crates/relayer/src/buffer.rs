use median_relay_types::Observation;
use num_bigint::{BigInt, Sign};
use std::collections::HashSet;

use crate::error::RelayError;

/// Per-pair collection of accepted observations, ordered by `age` ascending.
///
/// Ties on `age` are broken by insertion sequence, so the "newest" end of the
/// buffer is deterministic even when feeders report identical timestamps.
#[derive(Debug, Default)]
pub struct ObservationBuffer {
    entries: Vec<Entry>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    observation: Observation,
}

impl ObservationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept an observation and re-sort. Rejects non-positive values.
    pub fn add(&mut self, observation: Observation) -> Result<(), RelayError> {
        if observation.value.sign() != Sign::Plus {
            return Err(RelayError::InvalidObservation {
                asset_pair: observation.asset_pair.clone(),
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { seq, observation });
        self.entries
            .sort_by_key(|e| (e.observation.age, e.seq));
        Ok(())
    }

    /// Remove every observation with `age < threshold`. Order of the
    /// remaining observations is unchanged.
    pub fn clear_older_than(&mut self, threshold: u64) {
        self.entries.retain(|e| e.observation.age >= threshold);
    }

    /// Keep only the newest observation per feeder. Ages tie-break by
    /// insertion sequence, matching the buffer order.
    pub fn retain_newest_per_feeder(&mut self) {
        let mut seen = HashSet::new();
        let mut keep = vec![false; self.entries.len()];
        for (i, entry) in self.entries.iter().enumerate().rev() {
            if seen.insert(entry.observation.feeder.clone()) {
                keep[i] = true;
            }
        }

        let mut idx = 0;
        self.entries.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });
    }

    /// Retain the `n` observations with the greatest `age`. No-op when the
    /// buffer is already at most `n` long; clears when `n` is zero.
    pub fn truncate(&mut self, n: usize) {
        if self.entries.len() > n {
            self.entries.drain(..self.entries.len() - n);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Integer median over the buffered values. For an even count this is
    /// the mean of the two middle values, rounded toward zero. `None` when
    /// the buffer is empty.
    pub fn median(&self) -> Option<BigInt> {
        if self.entries.is_empty() {
            return None;
        }

        let mut values: Vec<&BigInt> = self.entries.iter().map(|e| &e.observation.value).collect();
        values.sort();

        let mid = values.len() / 2;
        if values.len() % 2 == 1 {
            Some(values[mid].clone())
        } else {
            Some((values[mid - 1] + values[mid]) / BigInt::from(2))
        }
    }

    /// Copy of the buffered observations, newest first, for submission.
    pub fn snapshot(&self) -> Vec<Observation> {
        self.entries
            .iter()
            .rev()
            .map(|e| e.observation.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
