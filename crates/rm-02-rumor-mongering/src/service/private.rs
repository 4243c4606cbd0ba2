use std::net::SocketAddr;

use rm_01_peer_routing::{PeerRoutingApi, RoutedSend};
use shared_types::{PrivateMessage, PRIVATE_HOP_LIMIT};
use tracing::info;

use super::RumorService;
use crate::domain::{Result, RumorError};

impl RumorService {
    /// Send a private message typed by the local user. A zero `hop_limit`
    /// means the default.
    pub fn on_client_private(
        &self,
        text: impl Into<String>,
        destination: impl Into<String>,
        hop_limit: u32,
    ) -> Result<PrivateMessage> {
        let destination = destination.into();
        if destination.is_empty() {
            return Err(RumorError::MissingDestination);
        }
        let message = PrivateMessage {
            origin: self.network.name().to_string(),
            id: 0,
            text: text.into(),
            destination,
            hop_limit: if hop_limit == 0 {
                PRIVATE_HOP_LIMIT
            } else {
                hop_limit
            },
        };
        info!("CLIENT MESSAGE {} dest {}", message.text, message.destination);
        self.names.write().add_private(message.clone());
        self.network.frontend().push_private(&message);
        self.network.send_routed(message.clone())?;
        Ok(message)
    }

    /// A private message from `from`. Returns `true` when it was for us.
    pub fn on_private(&self, message: PrivateMessage, from: SocketAddr) -> bool {
        let name = self.network.name();
        if message.origin != name {
            self.network.learn_route(&message.origin, from);
        }
        if message.destination == name {
            info!(
                "PRIVATE origin {} hop-limit {} contents {}",
                message.origin, message.hop_limit, message.text
            );
            self.network.frontend().push_private(&message);
            self.names.write().add_private(message);
            return true;
        }
        // relay failures are logged by the network
        let _ = self.network.send_routed(message);
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rm_01_peer_routing::adapters::RecordingTransport;
    use rm_01_peer_routing::{GossipNetwork, NetworkSettings, RoutingError};
    use shared_bus::{FrontendUpdate, InMemoryFrontendBus};
    use shared_types::GossipPacket;

    use super::*;
    use crate::service::RumorSettings;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn service(name: &str) -> (Arc<RumorService>, Arc<RecordingTransport>, Arc<InMemoryFrontendBus>) {
        let transport = Arc::new(RecordingTransport::new(addr(5000)));
        let bus = Arc::new(InMemoryFrontendBus::new());
        let network = Arc::new(GossipNetwork::new(
            NetworkSettings::new(name).with_peers([addr(5001), addr(5002)]),
            transport.clone(),
            bus.clone(),
        ));
        (
            RumorService::new(network, RumorSettings::default()),
            transport,
            bus,
        )
    }

    fn private(origin: &str, destination: &str, hop_limit: u32) -> PrivateMessage {
        PrivateMessage {
            origin: origin.into(),
            id: 0,
            text: "psst".into(),
            destination: destination.into(),
            hop_limit,
        }
    }

    #[test]
    fn test_client_private_uses_route_and_default_hop_limit() {
        let (service, transport, _) = service("C");
        service.network().update_route_from_rumor("A", 1, addr(5002));

        let sent = service.on_client_private("psst", "A", 0).unwrap();
        assert_eq!(sent.hop_limit, PRIVATE_HOP_LIMIT);
        match &transport.sent_packets()[..] {
            [(GossipPacket::Private(message), to)] => {
                assert_eq!(*to, addr(5002));
                assert_eq!(message.hop_limit, PRIVATE_HOP_LIMIT - 1);
                assert_eq!(message.origin, "C");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(service.private_messages_from("C").len(), 1);
    }

    #[test]
    fn test_client_private_without_route() {
        let (service, _, _) = service("C");
        assert_eq!(
            service.on_client_private("psst", "A", 10),
            Err(RumorError::Routing(RoutingError::NoRoute("A".into())))
        );
        assert_eq!(
            service.on_client_private("psst", "", 10),
            Err(RumorError::MissingDestination)
        );
    }

    #[test]
    fn test_private_for_us_is_delivered() {
        let (service, transport, bus) = service("A");
        assert!(service.on_private(private("C", "A", 8), addr(5001)));
        assert_eq!(transport.sent_count(), 0);
        assert_eq!(service.private_messages_from("C")[0].hop_limit, 8);
        assert!(bus.drain().contains(&FrontendUpdate::private(&private("C", "A", 8))));
        // the reply path is learned
        assert_eq!(service.network().target("C"), Some(addr(5001)));
    }

    #[test]
    fn test_private_is_relayed_with_one_hop_less() {
        let (service, transport, _) = service("B");
        service.network().update_route_from_rumor("A", 1, addr(5002));
        assert!(!service.on_private(private("C", "A", 9), addr(5001)));
        assert_eq!(
            transport.sent_packets(),
            vec![(GossipPacket::Private(private("C", "A", 8)), addr(5002))]
        );
    }

    #[test]
    fn test_private_dropped_on_last_hop() {
        let (service, transport, _) = service("B");
        service.network().update_route_from_rumor("A", 1, addr(5002));
        assert!(!service.on_private(private("C", "A", 1), addr(5001)));
        assert_eq!(transport.sent_count(), 0);
    }
}
