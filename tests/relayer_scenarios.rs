use median_relay::config::{validate_config, ConfigFormat, ConfigLoader};
use median_relay::relayer::{
    MockMedianContract, MockTransport, PairPolicy, RelayError, Relayer,
};
use median_relay::types::{FeederId, Observation, PriceEvent};
use num_bigint::BigInt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

// ═══════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn observation(pair: &str, value: i64, age: u64, feeder: &str) -> Observation {
    Observation::new(
        pair,
        BigInt::from(value),
        age,
        FeederId::new(feeder.as_bytes().to_vec()),
        vec![0xaa],
    )
}

fn eth_policy(contract: Arc<MockMedianContract>) -> PairPolicy {
    PairPolicy {
        asset_pair: "ETHUSD".to_string(),
        spread_threshold: 1.0,
        observation_ttl: Duration::from_secs(300),
        oracle_freshness_ttl: Duration::from_secs(3600),
        contract,
    }
}

const SAMPLE_CONFIG: &str = r#"
feeds = [
    "0x3cb645a8f10fb7b0721995a8de3961d2d077e0e3",
    "0x8eb3daaf5cb4d25c97fd65391deb9a52d0a85eeb",
]

[ethereum]
from = "0x2d800d93b065ce011af83f316cef9f0d005b0aa4"
keystore = "/var/keystore"
password = "/var/keystore/password"

[p2p]
listen_addrs = ["/ip4/0.0.0.0/tcp/30100"]

[relayer]
interval_secs = 60

[[pairs]]
asset_pair = "ETHUSD"
oracle_spread = 1.0
oracle_expiration_secs = 3600
price_expiration_secs = 300
median_address = "0x64de91f5a373cd4c28de3600cb34c7c6ce410c85"
"#;

// ═══════════════════════════════════════════════════════════════════════════
// END-TO-END SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════

/// Wire-format events flow through ingestion and end up poked on-chain once
/// a quorum of fresh observations undercuts the published price.
#[tokio::test]
async fn wire_events_reach_the_contract() {
    let transport = Arc::new(MockTransport::new());
    let now = unix_now();
    // The published price predates the freshness window only slightly, so
    // submission is driven by the spread rule.
    let contract = Arc::new(MockMedianContract::new(3, now - 30, BigInt::from(1000)));
    let (success_tx, mut success_rx) = mpsc::unbounded_channel();

    let mut relayer = Relayer::new(transport.clone(), Duration::from_millis(20));
    relayer.add_pair(eth_policy(contract.clone()));
    let handle = relayer.start(Some(success_tx), None);

    for (value, feeder) in [(1005_i64, "a"), (1003, "b"), (1002, "c"), (1001, "d")] {
        let event = PriceEvent::new(observation("ETHUSD", value, now - 5, feeder));
        // Round-trip through the bus encoding, as a live transport would.
        let decoded = PriceEvent::unmarshal(&event.marshal().unwrap()).unwrap();
        transport.publish(decoded);
    }

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(success_rx.recv().await, Some("ETHUSD".to_string()));
    let batches = contract.poked_batches().await;
    assert_eq!(batches.len(), 1);
    // Quorum-sized batch of the newest observations, newest first.
    assert_eq!(batches[0].len(), 3);
    assert_eq!(handle.pending_observations("ETHUSD").await, Some(0));

    handle.stop().await;
}

/// An on-chain price past its freshness window is refreshed even when the
/// candidate median would not move it down.
#[tokio::test]
async fn outlived_oracle_price_is_refreshed() {
    let transport = Arc::new(MockTransport::new());
    let now = unix_now();
    let contract = Arc::new(MockMedianContract::new(1, now - 4000, BigInt::from(1000)));

    let mut relayer = Relayer::new(transport.clone(), Duration::from_millis(20));
    relayer.add_pair(eth_policy(contract.clone()));
    let handle = relayer.start(None, None);

    transport.publish(PriceEvent::new(observation("ETHUSD", 1500, now - 5, "a")));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let batches = contract.poked_batches().await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].value, BigInt::from(1500));

    handle.stop().await;
}

/// Events for unconfigured pairs and non-positive values surface on the
/// error channel without disturbing registered pairs.
#[tokio::test]
async fn bad_events_are_reported_not_fatal() {
    let transport = Arc::new(MockTransport::new());
    let now = unix_now();
    let contract = Arc::new(MockMedianContract::new(3, now - 30, BigInt::from(1000)));
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();

    let mut relayer = Relayer::new(transport.clone(), Duration::from_secs(3600));
    relayer.add_pair(eth_policy(contract));
    let handle = relayer.start(None, Some(err_tx));

    transport.publish(PriceEvent::new(observation("XYZUSD", 1000, now, "a")));
    transport.publish(PriceEvent::new(observation("ETHUSD", 0, now, "b")));
    transport.publish(PriceEvent::new(observation("ETHUSD", 1000, now, "c")));

    tokio::time::sleep(Duration::from_millis(100)).await;

    match err_rx.recv().await {
        Some(RelayError::InvalidPair(pair)) => assert_eq!(pair, "XYZUSD"),
        other => panic!("expected InvalidPair, got {other:?}"),
    }
    assert!(matches!(
        err_rx.recv().await,
        Some(RelayError::InvalidObservation { .. })
    ));

    // The healthy event made it into the buffer regardless.
    assert_eq!(handle.pending_observations("ETHUSD").await, Some(1));

    handle.stop().await;
}

/// A failing contract read skips the pair for the tick and keeps the
/// observations for the next attempt.
#[tokio::test]
async fn read_failure_retries_with_same_buffer() {
    let transport = Arc::new(MockTransport::new());
    let now = unix_now();
    let contract = Arc::new(MockMedianContract::new(1, now - 4000, BigInt::from(1000)));
    contract.set_fail_reads(true).await;
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();

    let mut relayer = Relayer::new(transport.clone(), Duration::from_millis(20));
    relayer.add_pair(eth_policy(contract.clone()));
    let handle = relayer.start(None, Some(err_tx));

    transport.publish(PriceEvent::new(observation("ETHUSD", 1500, now - 5, "a")));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(matches!(
        err_rx.recv().await,
        Some(RelayError::ContractRead { .. })
    ));
    assert_eq!(handle.pending_observations("ETHUSD").await, Some(1));

    // Once reads recover, the retained observation is submitted.
    contract.set_fail_reads(false).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(contract.poked_batches().await.len(), 1);
    assert_eq!(handle.pending_observations("ETHUSD").await, Some(0));

    handle.stop().await;
}

/// Pairs fail independently: one pair's contract outage does not block the
/// other pair's submission in the same tick.
#[tokio::test]
async fn per_pair_failures_are_isolated() {
    let transport = Arc::new(MockTransport::new());
    let now = unix_now();
    let eth_contract = Arc::new(MockMedianContract::new(1, now - 4000, BigInt::from(1000)));
    let btc_contract = Arc::new(MockMedianContract::new(1, now - 4000, BigInt::from(40000)));
    eth_contract.set_fail_poke(true).await;
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();

    let mut relayer = Relayer::new(transport.clone(), Duration::from_millis(20));
    relayer.add_pair(eth_policy(eth_contract.clone()));
    relayer.add_pair(PairPolicy {
        asset_pair: "BTCUSD".to_string(),
        spread_threshold: 1.0,
        observation_ttl: Duration::from_secs(300),
        oracle_freshness_ttl: Duration::from_secs(3600),
        contract: btc_contract.clone(),
    });
    let handle = relayer.start(None, Some(err_tx));

    transport.publish(PriceEvent::new(observation("ETHUSD", 1500, now - 5, "a")));
    transport.publish(PriceEvent::new(observation("BTCUSD", 39000, now - 5, "b")));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(matches!(
        err_rx.recv().await,
        Some(RelayError::ContractSubmit { .. })
    ));
    assert_eq!(btc_contract.poked_batches().await.len(), 1);
    // The failed submission still consumed its batch.
    assert_eq!(handle.pending_observations("ETHUSD").await, Some(0));

    handle.stop().await;
}

/// Configuration maps directly onto pair policies.
#[tokio::test]
async fn config_drives_pair_policies() {
    let config = ConfigLoader::parse(SAMPLE_CONFIG, ConfigFormat::Toml).unwrap();
    validate_config(&config).unwrap();

    let transport = Arc::new(MockTransport::new());
    let now = unix_now();
    let contract = Arc::new(MockMedianContract::new(1, now - 30, BigInt::from(1000)));

    let mut relayer = Relayer::new(transport.clone(), config.relayer.interval());
    for pair in &config.pairs {
        relayer.add_pair(PairPolicy {
            asset_pair: pair.asset_pair.clone(),
            spread_threshold: pair.oracle_spread,
            observation_ttl: pair.observation_ttl(),
            oracle_freshness_ttl: pair.oracle_freshness_ttl(),
            contract: contract.clone(),
        });
    }

    let handle = relayer.start(None, None);
    transport.publish(PriceEvent::new(observation("ETHUSD", 990, now - 5, "a")));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(handle.pending_observations("ETHUSD").await, Some(1));
    assert_eq!(handle.pending_observations("BTCUSD").await, None);

    handle.stop().await;
}
