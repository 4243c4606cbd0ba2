use std::net::SocketAddr;

use rm_01_peer_routing::PeerRoutingApi;
use shared_types::{GossipPacket, SimpleMessage};
use tracing::{debug, info};

use super::RumorService;
use crate::domain::{Result, RumorError};

impl RumorService {
    /// Broadcast a client message to every neighbor in simple mode.
    pub fn on_client_simple(&self, contents: impl Into<String>) -> SimpleMessage {
        let message = SimpleMessage {
            original_name: self.network.name().to_string(),
            relay_peer_addr: self.network.local_addr().to_string(),
            contents: contents.into(),
        };
        info!("CLIENT MESSAGE {}", message.contents);
        self.network
            .broadcast(&GossipPacket::Simple(message.clone()), None);
        message
    }

    /// Relay a simple message to everyone but the peer it came through.
    pub fn on_simple(&self, mut message: SimpleMessage, from: SocketAddr) -> Result<usize> {
        let relay: SocketAddr = message.relay_peer_addr.parse().map_err(|_| {
            debug!(relay = %message.relay_peer_addr, "unparsable relay address");
            RumorError::InvalidRelay(message.relay_peer_addr.clone())
        })?;
        self.network.add_peer(relay);
        self.network.add_peer(from);
        info!(
            "SIMPLE MESSAGE origin {} from {} contents {}",
            message.original_name, relay, message.contents
        );
        message.relay_peer_addr = self.network.local_addr().to_string();
        Ok(self
            .network
            .broadcast(&GossipPacket::Simple(message), Some(relay)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rm_01_peer_routing::adapters::RecordingTransport;
    use rm_01_peer_routing::{GossipNetwork, NetworkSettings};
    use shared_bus::NullFrontendSink;

    use super::*;
    use crate::service::RumorSettings;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn service(peers: &[u16]) -> (Arc<RumorService>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new(addr(5000)));
        let network = Arc::new(GossipNetwork::new(
            NetworkSettings::new("B").with_peers(peers.iter().map(|p| addr(*p))),
            transport.clone(),
            Arc::new(NullFrontendSink),
        ));
        (RumorService::new(network, RumorSettings::default()), transport)
    }

    #[test]
    fn test_client_simple_goes_to_everyone() {
        let (service, transport) = service(&[5001, 5002]);
        let message = service.on_client_simple("hello");
        assert_eq!(message.relay_peer_addr, "127.0.0.1:5000");
        assert_eq!(transport.sent_count(), 2);
    }

    #[test]
    fn test_simple_relay_learns_peers_and_skips_relay() {
        let (service, transport) = service(&[5001]);
        let message = SimpleMessage {
            original_name: "A".into(),
            relay_peer_addr: "127.0.0.1:5009".into(),
            contents: "hello".into(),
        };
        assert_eq!(service.on_simple(message, addr(5009)).unwrap(), 1);
        assert_eq!(service.network().peers(), vec![addr(5001), addr(5009)]);
        match &transport.sent_packets()[..] {
            [(GossipPacket::Simple(relayed), to)] => {
                assert_eq!(*to, addr(5001));
                assert_eq!(relayed.relay_peer_addr, "127.0.0.1:5000");
                assert_eq!(relayed.original_name, "A");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_simple_with_bad_relay_is_dropped() {
        let (service, transport) = service(&[5001]);
        let message = SimpleMessage {
            original_name: "A".into(),
            relay_peer_addr: String::new(),
            contents: "hello".into(),
        };
        assert!(matches!(
            service.on_simple(message, addr(5009)),
            Err(RumorError::InvalidRelay(_))
        ));
        assert_eq!(transport.sent_count(), 0);
    }
}
