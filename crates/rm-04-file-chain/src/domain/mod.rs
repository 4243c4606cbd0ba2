//! Domain layer: ownership transactions, the block tree and the miner's
//! nonce search. Pure logic, no I/O.

mod blockchain;
mod builder;
mod chain_block;
mod errors;
mod pow;
mod subscriptions;
mod transaction;

pub use blockchain::*;
pub use builder::*;
pub use chain_block::*;
pub use errors::*;
pub use pow::*;
pub use subscriptions::*;
pub use transaction::*;
