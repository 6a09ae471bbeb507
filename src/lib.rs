//! median-relay: an oracle price relayer.
//!
//! Collects signed price observations from authorized feeders over a
//! peer-to-peer message bus, aggregates them per asset pair, and pokes an
//! on-chain median oracle contract when freshness or deviation conditions
//! are met.

pub use median_relay_config as config;
pub use median_relay_relayer as relayer;
pub use median_relay_types as types;

pub mod telemetry;
