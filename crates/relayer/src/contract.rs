use async_trait::async_trait;
use median_relay_types::Observation;
use num_bigint::BigInt;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("rpc call failed: {0}")]
    Rpc(String),

    #[error("call timed out")]
    Timeout,
}

/// Capability surface of the on-chain median oracle proxy.
///
/// Implementations own their RPC plumbing, per-call timeouts included; the
/// relayer cancels an in-flight call by dropping its future.
#[async_trait]
pub trait MedianContract: Send + Sync {
    /// Number of observations the contract requires in a batch. Always >= 1.
    async fn bar(&self) -> Result<u64, ContractError>;

    /// Timestamp of the last accepted on-chain update, unix seconds.
    async fn age(&self) -> Result<u64, ContractError>;

    /// Currently published price in the oracle's fixed-point scale.
    async fn price(&self) -> Result<BigInt, ContractError>;

    /// Submit a batch of observations, newest first.
    async fn poke(&self, observations: &[Observation]) -> Result<(), ContractError>;
}

/// In-memory median contract for testing.
///
/// Holds a static bar/age/price triple and records every poked batch.
pub struct MockMedianContract {
    bar: RwLock<u64>,
    age: RwLock<u64>,
    price: RwLock<BigInt>,
    pokes: RwLock<Vec<Vec<Observation>>>,
    fail_reads: RwLock<bool>,
    fail_poke: RwLock<bool>,
}

impl MockMedianContract {
    pub fn new(bar: u64, age: u64, price: BigInt) -> Self {
        Self {
            bar: RwLock::new(bar),
            age: RwLock::new(age),
            price: RwLock::new(price),
            pokes: RwLock::new(Vec::new()),
            fail_reads: RwLock::new(false),
            fail_poke: RwLock::new(false),
        }
    }

    pub async fn set_bar(&self, bar: u64) {
        *self.bar.write().await = bar;
    }

    pub async fn set_age(&self, age: u64) {
        *self.age.write().await = age;
    }

    pub async fn set_price(&self, price: BigInt) {
        *self.price.write().await = price;
    }

    pub async fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.write().await = fail;
    }

    pub async fn set_fail_poke(&self, fail: bool) {
        *self.fail_poke.write().await = fail;
    }

    /// Every batch poked so far, oldest call first.
    pub async fn poked_batches(&self) -> Vec<Vec<Observation>> {
        self.pokes.read().await.clone()
    }
}

#[async_trait]
impl MedianContract for MockMedianContract {
    async fn bar(&self) -> Result<u64, ContractError> {
        if *self.fail_reads.read().await {
            return Err(ContractError::Rpc("simulated read failure".to_string()));
        }
        Ok(*self.bar.read().await)
    }

    async fn age(&self) -> Result<u64, ContractError> {
        if *self.fail_reads.read().await {
            return Err(ContractError::Rpc("simulated read failure".to_string()));
        }
        Ok(*self.age.read().await)
    }

    async fn price(&self) -> Result<BigInt, ContractError> {
        if *self.fail_reads.read().await {
            return Err(ContractError::Rpc("simulated read failure".to_string()));
        }
        Ok(self.price.read().await.clone())
    }

    async fn poke(&self, observations: &[Observation]) -> Result<(), ContractError> {
        if *self.fail_poke.read().await {
            return Err(ContractError::Rpc("simulated poke failure".to_string()));
        }
        self.pokes.write().await.push(observations.to_vec());
        Ok(())
    }
}
