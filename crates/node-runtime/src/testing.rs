//! Containers over a recording transport for handler tests.

use std::net::SocketAddr;
use std::sync::Arc;

use rm_01_peer_routing::adapters::RecordingTransport;
use rm_03_file_sharing::adapters::MemoryFileStore;
use shared_bus::NullFrontendSink;
use shared_crypto::testing::fixture_keypair;

use crate::container::{NodeConfig, SubsystemContainer};

pub(crate) fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Node `name` at port 5000 with neighbors 5001 and 5002.
pub(crate) fn container(name: &str) -> (Arc<SubsystemContainer>, Arc<RecordingTransport>) {
    container_with(name, |_| {})
}

pub(crate) fn container_with(
    name: &str,
    configure: impl FnOnce(&mut NodeConfig),
) -> (Arc<SubsystemContainer>, Arc<RecordingTransport>) {
    build(name, configure, Arc::new(MemoryFileStore::new()))
}

/// Like [`container`], with `files` in the shared directory.
pub(crate) fn container_with_files(
    name: &str,
    files: &[(&str, &[u8])],
) -> (Arc<SubsystemContainer>, Arc<RecordingTransport>) {
    let store = MemoryFileStore::new();
    for (file, content) in files {
        store.put_shared(*file, content.to_vec());
    }
    build(name, |_| {}, Arc::new(store))
}

fn build(
    name: &str,
    configure: impl FnOnce(&mut NodeConfig),
    store: Arc<MemoryFileStore>,
) -> (Arc<SubsystemContainer>, Arc<RecordingTransport>) {
    let mut config = NodeConfig::default();
    config.gossip.name = name.to_owned();
    config.network.gossip_addr = Some(addr(5000));
    config.network.peers = vec![addr(5001), addr(5002)];
    config.chain.leading_zero_bytes = 1;
    configure(&mut config);

    let transport = Arc::new(RecordingTransport::new(addr(5000)));
    let container = SubsystemContainer::new(
        config,
        transport.clone(),
        store,
        Arc::new(NullFrontendSink),
        fixture_keypair(0),
    );
    (Arc::new(container), transport)
}
