//! Domain Layer - Message log and status bookkeeping with no I/O

mod errors;
mod name_index;
mod status_waiters;

pub use errors::*;
pub use name_index::*;
pub use status_waiters::*;
