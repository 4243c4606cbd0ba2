//! # In-Memory Transports
//!
//! [`MemoryHub`] delivers datagrams between in-process nodes through tokio
//! channels, with links that can be cut and healed. [`RecordingTransport`]
//! keeps every datagram for inspection.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{decode_packet, GossipPacket};
use tokio::sync::mpsc;

use crate::ports::{DatagramSource, GossipTransport, NetworkError};

type Datagram = (Vec<u8>, SocketAddr);

/// Switchboard for in-process nodes.
#[derive(Default)]
pub struct MemoryHub {
    endpoints: Mutex<HashMap<SocketAddr, mpsc::UnboundedSender<Datagram>>>,
    cut: Mutex<HashSet<(SocketAddr, SocketAddr)>>,
}

impl MemoryHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attach an endpoint at `addr`, replacing any previous one.
    pub fn endpoint(self: &Arc<Self>, addr: SocketAddr) -> (MemoryTransport, MemoryDatagramSource) {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.endpoints.lock().insert(addr, sender);
        (
            MemoryTransport {
                hub: Arc::clone(self),
                addr,
            },
            MemoryDatagramSource { receiver },
        )
    }

    /// Drop datagrams between `a` and `b` in both directions.
    pub fn cut(&self, a: SocketAddr, b: SocketAddr) {
        let mut cut = self.cut.lock();
        cut.insert((a, b));
        cut.insert((b, a));
    }

    /// Restore every link.
    pub fn heal(&self) {
        self.cut.lock().clear();
    }

    fn deliver(&self, bytes: &[u8], from: SocketAddr, to: SocketAddr) -> Result<(), NetworkError> {
        if self.cut.lock().contains(&(from, to)) {
            return Ok(());
        }
        let endpoints = self.endpoints.lock();
        let sender = endpoints.get(&to).ok_or(NetworkError::Unreachable(to))?;
        sender
            .send((bytes.to_vec(), from))
            .map_err(|_| NetworkError::Unreachable(to))
    }
}

/// Send half of a hub endpoint.
#[derive(Clone)]
pub struct MemoryTransport {
    hub: Arc<MemoryHub>,
    addr: SocketAddr,
}

impl GossipTransport for MemoryTransport {
    fn send_datagram(&self, bytes: &[u8], target: SocketAddr) -> Result<(), NetworkError> {
        self.hub.deliver(bytes, self.addr, target)
    }

    fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Receive half of a hub endpoint.
pub struct MemoryDatagramSource {
    receiver: mpsc::UnboundedReceiver<Datagram>,
}

#[async_trait]
impl DatagramSource for MemoryDatagramSource {
    async fn recv_datagram(&mut self) -> Result<(Vec<u8>, SocketAddr), NetworkError> {
        self.receiver.recv().await.ok_or(NetworkError::Closed)
    }
}

/// Transport that only records.
pub struct RecordingTransport {
    addr: SocketAddr,
    sent: Mutex<Vec<Datagram>>,
}

impl RecordingTransport {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Decoded packets with their targets, in send order.
    pub fn sent_packets(&self) -> Vec<(GossipPacket, SocketAddr)> {
        self.sent
            .lock()
            .iter()
            .filter_map(|(bytes, to)| decode_packet(bytes).ok().map(|packet| (packet, *to)))
            .collect()
    }

    /// Like [`Self::sent_packets`], clearing the record.
    pub fn take_packets(&self) -> Vec<(GossipPacket, SocketAddr)> {
        let packets = self.sent_packets();
        self.sent.lock().clear();
        packets
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl GossipTransport for RecordingTransport {
    fn send_datagram(&self, bytes: &[u8], target: SocketAddr) -> Result<(), NetworkError> {
        self.sent.lock().push((bytes.to_vec(), target));
        Ok(())
    }

    fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}
