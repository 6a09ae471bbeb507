use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::buffer::ObservationBuffer;
use crate::contract::MedianContract;

/// Immutable per-pair relaying parameters.
#[derive(Clone)]
pub struct PairPolicy {
    /// Asset pair this policy applies to, e.g. "ETHUSD".
    pub asset_pair: String,

    /// Minimum signed spread, in percent, between the candidate median and
    /// the on-chain price below which an update is sent.
    pub spread_threshold: f64,

    /// Maximum age of a buffered observation relative to wall-clock now.
    pub observation_ttl: Duration,

    /// Window after the last on-chain update within which the published
    /// price counts as fresh.
    pub oracle_freshness_ttl: Duration,

    /// Proxy for the median oracle contract of this pair.
    pub contract: Arc<dyn MedianContract>,
}

impl fmt::Debug for PairPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairPolicy")
            .field("asset_pair", &self.asset_pair)
            .field("spread_threshold", &self.spread_threshold)
            .field("observation_ttl", &self.observation_ttl)
            .field("oracle_freshness_ttl", &self.oracle_freshness_ttl)
            .finish_non_exhaustive()
    }
}

/// A registered pair: its policy plus the buffer of pending observations.
pub(crate) struct PairState {
    pub(crate) policy: PairPolicy,
    pub(crate) buffer: ObservationBuffer,
}

impl PairState {
    pub(crate) fn new(policy: PairPolicy) -> Self {
        Self {
            policy,
            buffer: ObservationBuffer::new(),
        }
    }
}
