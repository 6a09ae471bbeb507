use median_relay_types::PriceEvent;
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::pair::{PairPolicy, PairState};
use crate::transport::Transport;

/// Revision of the oracle freshness predicate.
///
/// Revision 2 treats the on-chain price as expired once its freshness window
/// has fully elapsed. Revision 1 fired the poke while the window was still
/// open, so fresh oracles were re-poked on every tick.
pub const FRESHNESS_CHECK_REVISION: u32 = 2;

/// Oracle price relayer.
///
/// Buffers signed price observations arriving over the message bus and
/// pokes each pair's median oracle contract when a quorum of fresh
/// observations justifies an update.
///
/// Pairs are registered up front; [`start`] consumes the relayer, so the
/// pair set cannot change while the loops are running.
///
/// [`start`]: Relayer::start
pub struct Relayer {
    transport: Arc<dyn Transport>,
    interval: Duration,
    pairs: HashMap<String, PairState>,
}

struct Shared {
    // Guards the pair map and every buffer in it. Ingestion takes it per
    // event; the relay loop holds it for a whole tick, contract calls
    // included, so eviction and submission never interleave with adds.
    pairs: Mutex<HashMap<String, PairState>>,
}

/// Handle to a running relayer. Dropping it without calling [`stop`] also
/// shuts both loops down, but does not wait for them to finish.
///
/// [`stop`]: RelayerHandle::stop
pub struct RelayerHandle {
    shared: Arc<Shared>,
    shutdown: watch::Sender<bool>,
    ingest: JoinHandle<()>,
    relay: JoinHandle<()>,
}

impl Relayer {
    pub fn new(transport: Arc<dyn Transport>, interval: Duration) -> Self {
        Self {
            transport,
            interval,
            pairs: HashMap::new(),
        }
    }

    /// Register a pair. Registering the same asset pair twice replaces the
    /// earlier policy.
    pub fn add_pair(&mut self, policy: PairPolicy) {
        self.pairs
            .insert(policy.asset_pair.clone(), PairState::new(policy));
    }

    /// Spawn the ingestion and relay loops and return a handle to them.
    ///
    /// Successful submissions report the asset pair on `success_tx`;
    /// non-fatal errors report on `err_tx`. Either channel may be omitted,
    /// in which case the corresponding reports are dropped.
    pub fn start(
        self,
        success_tx: Option<mpsc::UnboundedSender<String>>,
        err_tx: Option<mpsc::UnboundedSender<RelayError>>,
    ) -> RelayerHandle {
        info!(
            pairs = self.pairs.len(),
            interval_ms = self.interval.as_millis() as u64,
            "starting relayer"
        );

        let shared = Arc::new(Shared {
            pairs: Mutex::new(self.pairs),
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let ingest = tokio::spawn(ingest_loop(
            self.transport,
            shared.clone(),
            err_tx.clone(),
            shutdown_rx.clone(),
        ));
        let relay = tokio::spawn(relay_loop(
            shared.clone(),
            self.interval,
            success_tx,
            err_tx,
            shutdown_rx,
        ));

        RelayerHandle {
            shared,
            shutdown: shutdown_tx,
            ingest,
            relay,
        }
    }
}

impl RelayerHandle {
    /// Signal both loops to terminate and wait for them to finish.
    /// Buffered observations are discarded.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.ingest.await;
        let _ = self.relay.await;
        info!("relayer stopped");
    }

    /// Number of observations currently buffered for a pair, or `None` for
    /// an unknown pair.
    pub async fn pending_observations(&self, asset_pair: &str) -> Option<usize> {
        self.shared
            .pairs
            .lock()
            .await
            .get(asset_pair)
            .map(|state| state.buffer.len())
    }
}

async fn ingest_loop(
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    err_tx: Option<mpsc::UnboundedSender<RelayError>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            event = transport.next_price() => {
                let Some(event) = event else {
                    debug!("transport closed");
                    break;
                };
                if let Err(e) = collect(&shared, event).await {
                    warn!(error = %e, "rejected price event");
                    if let Some(tx) = &err_tx {
                        let _ = tx.send(e);
                    }
                }
            }
        }
    }
    debug!("ingestion loop stopped");
}

async fn collect(shared: &Shared, event: PriceEvent) -> Result<(), RelayError> {
    let observation = event.observation;
    let mut pairs = shared.pairs.lock().await;
    let state = pairs
        .get_mut(&observation.asset_pair)
        .ok_or_else(|| RelayError::InvalidPair(observation.asset_pair.clone()))?;

    debug!(
        asset_pair = %observation.asset_pair,
        feeder = %observation.feeder,
        age = observation.age,
        "buffering observation"
    );
    state.buffer.add(observation)
}

async fn relay_loop(
    shared: Arc<Shared>,
    interval: Duration,
    success_tx: Option<mpsc::UnboundedSender<String>>,
    err_tx: Option<mpsc::UnboundedSender<RelayError>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let mut pairs = shared.pairs.lock().await;
                for (asset_pair, state) in pairs.iter_mut() {
                    if state.buffer.is_empty() {
                        continue;
                    }

                    match relay_pair(state, unix_now()).await {
                        Ok(true) => {
                            if let Some(tx) = &success_tx {
                                let _ = tx.send(asset_pair.clone());
                            }
                        }
                        Ok(false) => {}
                        Err(e) => {
                            warn!(asset_pair = %asset_pair, error = %e, "relay attempt failed");
                            if let Some(tx) = &err_tx {
                                let _ = tx.send(e);
                            }
                        }
                    }
                }
            }
        }
    }
    debug!("relay loop stopped");
}

/// Run one relay attempt for a single pair. Returns `Ok(true)` when a batch
/// was successfully submitted, `Ok(false)` when no update was needed.
async fn relay_pair(state: &mut PairState, now: u64) -> Result<bool, RelayError> {
    let asset_pair = state.policy.asset_pair.clone();
    let contract = state.policy.contract.clone();

    let read_err = |source| RelayError::ContractRead {
        asset_pair: asset_pair.clone(),
        source,
    };
    let quorum = contract.bar().await.map_err(read_err)? as usize;
    let oracle_age = contract.age().await.map_err(read_err)?;
    let oracle_price = contract.price().await.map_err(read_err)?;

    // Drop observations past their TTL, then anything predating the last
    // on-chain update; keep one observation per feeder before trimming down
    // to the freshest quorum.
    state
        .buffer
        .clear_older_than(now.saturating_sub(state.policy.observation_ttl.as_secs()));
    state.buffer.clear_older_than(oracle_age);
    state.buffer.retain_newest_per_feeder();
    state.buffer.truncate(quorum);

    let have = state.buffer.len();
    if have < quorum {
        return Err(RelayError::InsufficientQuorum {
            asset_pair,
            have,
            need: quorum,
        });
    }

    let Some(candidate) = state.buffer.median() else {
        return Ok(false);
    };

    let spread = calc_spread(&oracle_price, &candidate);
    let is_expired =
        oracle_age.saturating_add(state.policy.oracle_freshness_ttl.as_secs()) < now;
    let is_stale = spread < state.policy.spread_threshold;

    if !is_expired && !is_stale {
        debug!(
            asset_pair = %asset_pair,
            median = %candidate,
            spread,
            "on-chain price still current"
        );
        return Ok(false);
    }

    let batch = state.buffer.snapshot();
    info!(
        asset_pair = %asset_pair,
        median = %candidate,
        spread,
        expired = is_expired,
        observations = batch.len(),
        "submitting price update"
    );

    // The buffer is cleared whether or not the poke lands; resubmitting an
    // identical failing batch next tick helps nobody. Fresh observations
    // drive the retry.
    let result = contract.poke(&batch).await;
    state.buffer.clear();
    result.map_err(|source| RelayError::ContractSubmit { asset_pair, source })?;
    Ok(true)
}

/// Signed percentage deviation of the candidate median from the on-chain
/// price. The subtraction happens at full precision; only the final ratio
/// drops to f64.
fn calc_spread(oracle_price: &BigInt, candidate: &BigInt) -> f64 {
    if oracle_price.sign() == Sign::NoSign {
        return f64::INFINITY;
    }

    let diff = candidate - oracle_price;
    let num = diff.to_f64().unwrap_or_else(|| match diff.sign() {
        Sign::Minus => f64::NEG_INFINITY,
        _ => f64::INFINITY,
    });
    let den = oracle_price.to_f64().unwrap_or(f64::INFINITY);

    num / den * 100.0
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
