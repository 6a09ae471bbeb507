use num_bigint::BigInt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("invalid feeder address: {0}")]
    InvalidFeeder(String),
}

/// Stable identity of the signer that produced an observation.
///
/// Opaque bytes; on the wire it is rendered as a 0x-prefixed hex address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FeederId(Vec<u8>);

impl FeederId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a hex address, with or without the 0x prefix.
    pub fn from_hex(s: &str) -> Result<Self, ObservationError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| ObservationError::InvalidFeeder(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for FeederId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A single signed price observation published by a feeder.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// Asset pair the price refers to, e.g. "ETHUSD". Case-sensitive.
    pub asset_pair: String,

    /// Price in the oracle's fixed-point scale. Unbounded width.
    pub value: BigInt,

    /// Timestamp at which the feeder observed the price, unix seconds.
    pub age: u64,

    /// Identity of the signer.
    pub feeder: FeederId,

    /// Opaque signature payload forwarded verbatim to the contract.
    pub signature: Vec<u8>,
}

impl Observation {
    pub fn new(
        asset_pair: impl Into<String>,
        value: BigInt,
        age: u64,
        feeder: FeederId,
        signature: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            asset_pair: asset_pair.into(),
            value,
            age,
            feeder,
            signature: signature.into(),
        }
    }
}
