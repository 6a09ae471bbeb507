use thiserror::Error;

use crate::contract::ContractError;

/// Errors raised by the aggregation engine.
///
/// None of these are fatal to the relayer loops; they are delivered on the
/// error channel when one is registered and dropped otherwise.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid observation for {asset_pair}: value must be positive")]
    InvalidObservation { asset_pair: String },

    #[error("unknown asset pair: {0}")]
    InvalidPair(String),

    #[error("insufficient quorum for {asset_pair}: have {have}, need {need}")]
    InsufficientQuorum {
        asset_pair: String,
        have: usize,
        need: usize,
    },

    #[error("contract read failed for {asset_pair}: {source}")]
    ContractRead {
        asset_pair: String,
        #[source]
        source: ContractError,
    },

    #[error("contract submit failed for {asset_pair}: {source}")]
    ContractSubmit {
        asset_pair: String,
        #[source]
        source: ContractError,
    },
}
