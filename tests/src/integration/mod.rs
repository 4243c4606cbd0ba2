//! Multi-node scenarios. Every node runs its full runtime; only the sockets
//! are replaced by the in-memory hub.

mod chain;
mod files;
mod rumors;
