//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Receive loop on the gossip socket
//! 2. Anti-entropy and route rumor tickers (not in simple mode)
//! 3. Miner, when enabled
//! 4. Ask the neighbors for their chain head
//!
//! The client socket is started separately with [`NodeRuntime::start_client`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rm_01_peer_routing::DatagramSource;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::receive_loop;
use crate::container::SubsystemContainer;
use crate::handlers::{ClientHandler, GossipDispatcher};

/// Grace period for background tasks at shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Owns the background tasks of one node.
pub struct NodeRuntime {
    container: Arc<SubsystemContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    pub fn new(container: Arc<SubsystemContainer>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container,
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start serving peers on `gossip` and every periodic task.
    pub fn start<S>(&self, gossip: S)
    where
        S: DatagramSource + 'static,
    {
        let c = &self.container;
        let dispatcher = Arc::new(GossipDispatcher::new(Arc::clone(c)));
        self.spawn(receive_loop(gossip, dispatcher, self.shutdown_rx.clone()));

        if c.is_simple() {
            info!(name = %c.config.gossip.name, "node started in simple mode");
            return;
        }

        self.spawn(Arc::clone(&c.rumors).run_anti_entropy(self.shutdown_rx.clone()));
        if c.config.gossip.route_rumor_period.is_some() {
            self.spawn(Arc::clone(&c.rumors).run_route_rumors(self.shutdown_rx.clone()));
        }
        if c.config.chain.mining {
            self.spawn(Arc::clone(&c.chain).run_miner(self.shutdown_rx.clone()));
        }
        c.chain.request_head();

        info!(
            name = %c.config.gossip.name,
            mining = c.config.chain.mining,
            "node started"
        );
    }

    /// Start serving the local client on `client`.
    pub fn start_client<S>(&self, client: S)
    where
        S: DatagramSource + 'static,
    {
        let handler = Arc::new(ClientHandler::new(Arc::clone(&self.container)));
        self.spawn(receive_loop(client, handler, self.shutdown_rx.clone()));
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.tasks.lock().push(tokio::spawn(task));
    }

    /// Number of background tasks still running.
    pub fn running_tasks(&self) -> usize {
        self.tasks.lock().iter().filter(|t| !t.is_finished()).count()
    }

    /// Stop every background task, waiting up to a grace period.
    pub async fn shutdown(&self) {
        info!("shutting down");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("failed to send shutdown signal: {}", e);
        }
        let tasks: Vec<_> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("task ended abnormally: {}", e),
                Err(_) => warn!("task did not stop within {:?}", SHUTDOWN_GRACE),
            }
        }
        info!("shutdown complete");
    }

    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }
}
