use base64::{engine::general_purpose, Engine as _};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::observation::{FeederId, Observation};

/// Topic under which price events travel on the message bus.
pub const PRICE_TOPIC: &str = "price";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid price value: {0}")]
    InvalidValue(String),

    #[error("invalid feeder address: {0}")]
    InvalidFeeder(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),
}

/// A price observation as delivered by the transport.
///
/// The trace payload is carried opaquely for diagnostics and is always
/// normalized to null before marshaling to keep messages small.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceEvent {
    pub observation: Observation,
    pub trace: Option<serde_json::Value>,
}

impl PriceEvent {
    pub fn new(observation: Observation) -> Self {
        Self {
            observation,
            trace: None,
        }
    }

    pub fn topic(&self) -> &'static str {
        PRICE_TOPIC
    }

    // TODO: switch to a binary encoding to reduce payload size
    pub fn marshal(&self) -> Result<Vec<u8>, EventError> {
        let wire = PriceEventWire {
            price: PriceWire {
                asset_pair: self.observation.asset_pair.clone(),
                val: self.observation.value.to_string(),
                age: self.observation.age,
                sig: general_purpose::STANDARD.encode(&self.observation.signature),
                feeder: self.observation.feeder.to_hex(),
            },
            trace: serde_json::Value::Null,
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    pub fn unmarshal(bytes: &[u8]) -> Result<Self, EventError> {
        let wire: PriceEventWire = serde_json::from_slice(bytes)?;

        let value = BigInt::from_str(&wire.price.val)
            .map_err(|e| EventError::InvalidValue(e.to_string()))?;
        let feeder = FeederId::from_hex(&wire.price.feeder)
            .map_err(|e| EventError::InvalidFeeder(e.to_string()))?;
        let signature = general_purpose::STANDARD
            .decode(&wire.price.sig)
            .map_err(|e| EventError::InvalidSignature(e.to_string()))?;

        let trace = match wire.trace {
            serde_json::Value::Null => None,
            other => Some(other),
        };

        Ok(Self {
            observation: Observation {
                asset_pair: wire.price.asset_pair,
                value,
                age: wire.price.age,
                feeder,
                signature,
            },
            trace,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PriceEventWire {
    price: PriceWire,
    #[serde(default)]
    trace: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct PriceWire {
    #[serde(rename = "assetPair")]
    asset_pair: String,
    val: String,
    age: u64,
    sig: String,
    feeder: String,
}
