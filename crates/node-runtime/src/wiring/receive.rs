use std::sync::Arc;

use rm_01_peer_routing::{DatagramSource, NetworkError};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::handlers::DatagramHandler;

/// Feed every datagram from `source` to `handler` until shutdown or until the
/// source closes. Transient receive errors are logged and skipped.
pub async fn receive_loop<S, H>(mut source: S, handler: Arc<H>, mut shutdown: watch::Receiver<bool>)
where
    S: DatagramSource,
    H: DatagramHandler + ?Sized,
{
    loop {
        let received = tokio::select! {
            received = source.recv_datagram() => received,
            _ = shutdown.changed() => break,
        };
        match received {
            Ok((bytes, from)) => handler.handle_datagram(&bytes, from),
            Err(NetworkError::Closed) => {
                debug!("datagram source closed");
                break;
            }
            Err(e) => warn!("receive failed: {}", e),
        }
    }
}
