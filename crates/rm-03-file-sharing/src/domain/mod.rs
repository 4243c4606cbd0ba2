//! Domain Layer - Content addressing, file states and search bookkeeping
//!
//! Nothing in here touches the disk or the network; the service feeds
//! bytes in and sends whatever comes out.

mod chunking;
mod data_waiters;
mod errors;
mod file_index;
mod search;
mod shared_file;

pub use chunking::*;
pub use data_waiters::*;
pub use errors::*;
pub use file_index::*;
pub use search::*;
pub use shared_file::*;
