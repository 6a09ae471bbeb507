pub mod buffer;
pub mod contract;
pub mod error;
pub mod pair;
pub mod relayer;
pub mod transport;

pub use buffer::ObservationBuffer;
pub use contract::{ContractError, MedianContract, MockMedianContract};
pub use error::RelayError;
pub use pair::PairPolicy;
pub use relayer::{Relayer, RelayerHandle, FRESHNESS_CHECK_REVISION};
pub use transport::{MockTransport, Transport};
