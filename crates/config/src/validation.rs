//! Pre-flight checks on a loaded configuration

use crate::{AppConfig, ConfigError, PairConfig, Result};
use std::collections::HashSet;

/// Check the whole configuration before any component is built.
///
/// Problems do not short-circuit: every finding is collected, then joined
/// into a single [`ConfigError::ValidationError`] so an operator sees the
/// complete list in one run.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut findings = Vec::new();

    if !is_hex_address(&config.ethereum.from) {
        findings.push("ethereum.from: must be a 20-byte hex address".to_string());
    }

    if config.ethereum.keystore.is_empty() {
        findings.push("ethereum.keystore: keystore path is required".to_string());
    }

    if config.relayer.interval_secs == 0 {
        findings.push("relayer.interval_secs: must be greater than 0".to_string());
    }

    if config.feeds.is_empty() {
        findings.push("feeds: at least one feeder must be allowed".to_string());
    }

    for (i, feed) in config.feeds.iter().enumerate() {
        if !is_hex_address(feed) {
            findings.push(format!("feeds[{i}]: must be a 20-byte hex address"));
        }
    }

    if config.pairs.is_empty() {
        findings.push("pairs: at least one pair must be configured".to_string());
    }

    // Asset pairs are the primary key of the pair table
    let mut seen = HashSet::new();
    for pair in &config.pairs {
        if !seen.insert(&pair.asset_pair) {
            findings.push(format!("pairs: duplicate asset pairs found ({})", pair.asset_pair));
        }
    }

    for pair in &config.pairs {
        if let Err(reason) = validate_pair(pair) {
            findings.push(format!("pairs.{}: {}", pair.asset_pair, reason));
        }
    }

    if findings.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(findings.join("; ")))
    }
}

/// Check a single pair entry. On failure, returns the reason the pair
/// cannot be relayed.
pub fn validate_pair(pair: &PairConfig) -> std::result::Result<(), String> {
    if pair.asset_pair.is_empty() {
        return Err("asset_pair must not be empty".to_string());
    }

    if pair.oracle_spread <= 0.0 || !pair.oracle_spread.is_finite() {
        return Err("oracle_spread must be a positive percentage".to_string());
    }

    if pair.price_expiration_secs == 0 {
        return Err("price_expiration_secs must be greater than 0".to_string());
    }

    if pair.oracle_expiration_secs == 0 {
        return Err("oracle_expiration_secs must be greater than 0".to_string());
    }

    if !is_hex_address(&pair.median_address) {
        return Err("median_address must be a 20-byte hex address".to_string());
    }

    Ok(())
}

fn is_hex_address(s: &str) -> bool {
    let stripped = match s.strip_prefix("0x") {
        Some(rest) => rest,
        None => return false,
    };
    stripped.len() == 40 && hex::decode(stripped).is_ok()
}
