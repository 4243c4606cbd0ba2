//! # Mesh Harness
//!
//! Full nodes wired to one [`MemoryHub`]. Each node gets the production
//! runtime (dispatcher, tickers, miner), an in-memory file store, a
//! recording frontend and a fixture signing key.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use node_runtime::handlers::ClientHandler;
use node_runtime::{NodeConfig, NodeRuntime, SubsystemContainer};
use rm_01_peer_routing::adapters::MemoryHub;
use rm_03_file_sharing::adapters::MemoryFileStore;
use shared_bus::InMemoryFrontendBus;
use shared_crypto::testing::fixture_keypair;
use shared_crypto::RsaKeyPair;

/// Base port of node 0.
const BASE_PORT: u16 = 6000;

pub fn node_addr(index: usize) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], BASE_PORT + index as u16))
}

/// Timers short enough for tests that run in real time.
pub fn fast_config(name: &str, index: usize, peers: &[usize]) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.gossip.name = name.to_owned();
    config.gossip.anti_entropy_period = Duration::from_millis(200);
    config.gossip.mongering_timeout = Duration::from_millis(300);
    config.gossip.route_rumor_period = Some(Duration::from_millis(500));
    config.network.gossip_addr = Some(node_addr(index));
    config.network.peers = peers.iter().map(|p| node_addr(*p)).collect();
    config.files.data_request_timeout = Duration::from_millis(500);
    config.files.search_period = Duration::from_millis(600);
    config.chain.leading_zero_bytes = 1;
    config.chain.first_block_delay = Duration::from_millis(100);
    config
}

pub struct TestNode {
    pub name: String,
    pub addr: SocketAddr,
    pub runtime: NodeRuntime,
    pub container: Arc<SubsystemContainer>,
    pub store: Arc<MemoryFileStore>,
    pub frontend: Arc<InMemoryFrontendBus>,
    pub keypair: RsaKeyPair,
    client: ClientHandler,
}

impl TestNode {
    /// The handler behind the node's client socket.
    pub fn client(&self) -> &ClientHandler {
        &self.client
    }

    pub fn chain_length(&self) -> u64 {
        self.container.chain.length()
    }
}

/// Nodes sharing one hub.
pub struct Mesh {
    hub: Arc<MemoryHub>,
    nodes: Vec<TestNode>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            hub: MemoryHub::new(),
            nodes: Vec::new(),
        }
    }

    /// `names` connected in a line, each node knowing its two neighbors.
    pub fn line(names: &[&str]) -> Self {
        Self::line_with(names, |_, _| {})
    }

    pub fn line_with(names: &[&str], mut configure: impl FnMut(usize, &mut NodeConfig)) -> Self {
        let mut mesh = Self::new();
        for (i, name) in names.iter().enumerate() {
            let mut peers = Vec::new();
            if i > 0 {
                peers.push(i - 1);
            }
            if i + 1 < names.len() {
                peers.push(i + 1);
            }
            mesh.add_node(name, &peers, |config| configure(i, config));
        }
        mesh
    }

    /// Start a node connected to the nodes at `peers`. Returns its index.
    pub fn add_node(
        &mut self,
        name: &str,
        peers: &[usize],
        configure: impl FnOnce(&mut NodeConfig),
    ) -> usize {
        let index = self.nodes.len();
        let mut config = fast_config(name, index, peers);
        configure(&mut config);

        let addr = node_addr(index);
        let (transport, source) = self.hub.endpoint(addr);
        let store = Arc::new(MemoryFileStore::new());
        let frontend = Arc::new(InMemoryFrontendBus::new());
        let keypair = fixture_keypair(index);
        let container = Arc::new(SubsystemContainer::new(
            config,
            Arc::new(transport),
            store.clone(),
            frontend.clone(),
            keypair.clone(),
        ));
        let runtime = NodeRuntime::new(Arc::clone(&container));
        runtime.start(source);

        self.nodes.push(TestNode {
            name: name.to_owned(),
            addr,
            client: ClientHandler::new(Arc::clone(&container)),
            runtime,
            container,
            store,
            frontend,
            keypair,
        });
        index
    }

    pub fn node(&self, index: usize) -> &TestNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[TestNode] {
        &self.nodes
    }

    /// Drop traffic between two nodes.
    pub fn cut(&self, a: usize, b: usize) {
        self.hub.cut(node_addr(a), node_addr(b));
    }

    pub fn heal(&self) {
        self.hub.heal();
    }

    pub async fn shutdown(self) {
        for node in &self.nodes {
            node.runtime.shutdown().await;
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll `condition` every 50ms until it holds or `timeout` passes.
pub async fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Await `task` for at most `timeout`.
pub async fn within<F: Future>(timeout: Duration, task: F) -> Option<F::Output> {
    tokio::time::timeout(timeout, task).await.ok()
}
