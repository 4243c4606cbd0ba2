use std::net::SocketAddr;
use std::sync::Arc;

use mesh_telemetry::{log_peer_event, metric_inc, RUMORS_ACCEPTED, STATUSES_RECEIVED};
use rm_01_peer_routing::PeerRoutingApi;
use shared_types::{GossipPacket, RumorMessage, StatusPacket};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::RumorService;

impl RumorService {
    /// Store and spread a rumor typed by the local user.
    pub fn on_client_rumor(self: &Arc<Self>, text: impl Into<String>) -> RumorMessage {
        let rumor = self
            .names
            .write()
            .fill_and_store_local(text, self.network.name());
        metric_inc!(RUMORS_ACCEPTED);
        if !rumor.is_route_rumor() {
            info!("CLIENT MESSAGE {}", rumor.text);
            self.network.frontend().push_rumor(&rumor);
        }
        if let Some(target) = self.network.random_neighbor(None) {
            self.spawn_monger(rumor.clone(), target);
        }
        rumor
    }

    /// A rumor from peer `from`. Always answers with our status; spreads the
    /// rumor further only the first time it is accepted. Returns whether the
    /// rumor was new.
    pub fn on_rumor(self: &Arc<Self>, rumor: RumorMessage, from: SocketAddr) -> bool {
        self.network.add_peer(from);
        let accepted = {
            let mut names = self.names.write();
            let accepted = names.accept_if_next(&rumor);
            if accepted {
                self.network
                    .update_route_from_rumor(&rumor.origin, rumor.id, from);
            }
            accepted
        };

        if accepted {
            metric_inc!(RUMORS_ACCEPTED);
            if !rumor.is_route_rumor() {
                info!(
                    "RUMOR origin {} from {} ID {} contents {}",
                    rumor.origin, from, rumor.id, rumor.text
                );
                self.network.frontend().push_rumor(&rumor);
            }
        } else {
            debug!(origin = %rumor.origin, id = rumor.id, peer = %from, "rumor not in sequence");
        }

        self.send_status(from);

        if accepted {
            if let Some(target) = self.network.random_neighbor(Some(from)) {
                self.spawn_monger(rumor, target);
            }
        }
        accepted
    }

    /// A status from peer `from`: first offered to a waiting monger, handled
    /// directly otherwise.
    pub fn on_status(self: &Arc<Self>, status: StatusPacket, from: SocketAddr) {
        metric_inc!(STATUSES_RECEIVED);
        log_peer_event!(debug, "rumor", from, entries = status.want.len(), "status received");
        if !self.waiters.search_and_forward(from, &status) {
            self.handle_status(status, from);
        }
    }

    pub(crate) fn handle_status(self: &Arc<Self>, status: StatusPacket, from: SocketAddr) {
        self.network.add_peer(from);
        let (missing, covered) = {
            let names = self.names.read();
            (names.pick_rumor_they_need(&status), names.local_covers(&status))
        };
        match missing {
            Some(rumor) => {
                self.spawn_monger(rumor, from);
            }
            None if !covered => self.send_status(from),
            None => info!("IN SYNC WITH {}", from),
        }
    }

    /// Send our vector clock to `to`.
    pub fn send_status(&self, to: SocketAddr) {
        let status = GossipPacket::Status(self.vector_clock());
        // failures are logged by the network
        let _ = self.network.send(&status, to);
    }

    /// Run a mongering attempt in the background.
    pub fn spawn_monger(self: &Arc<Self>, rumor: RumorMessage, target: SocketAddr) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).monger(rumor, target))
    }

    /// Send `rumor` to `target` and wait for its status. Without a reply in
    /// time, a coin flip decides whether to try another neighbor.
    pub async fn monger(self: Arc<Self>, rumor: RumorMessage, target: SocketAddr) {
        let attempt = self.waiters.next_attempt_id();
        let packet = GossipPacket::Rumor(rumor);
        let mut target = target;

        loop {
            let mut reply = self.waiters.register(attempt, target);
            info!("MONGERING with {}", target);
            if self.network.send(&packet, target).is_err() {
                self.waiters.unregister(attempt);
                return;
            }

            let status = tokio::time::timeout(self.settings.mongering_timeout, &mut reply)
                .await
                .ok()
                .and_then(Result::ok);
            self.waiters.unregister(attempt);
            // a status may have landed between the timeout and unregister
            if let Some(status) = status.or_else(|| reply.try_recv().ok()) {
                self.handle_status(status, target);
                return;
            }

            if !self.flip_coin() {
                log_peer_event!(debug, "rumor", target, "mongering stopped");
                return;
            }
            let Some(next) = self.network.random_neighbor(Some(target)) else {
                return;
            };
            info!("FLIPPED COIN sending rumor to {}", next);
            target = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rm_01_peer_routing::adapters::RecordingTransport;
    use rm_01_peer_routing::{GossipNetwork, NetworkSettings};
    use shared_bus::{FrontendUpdate, InMemoryFrontendBus};
    use shared_types::PeerStatus;
    use tracing_test::traced_test;

    use super::*;
    use crate::service::RumorSettings;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    struct Harness {
        service: Arc<RumorService>,
        transport: Arc<RecordingTransport>,
        bus: Arc<InMemoryFrontendBus>,
    }

    fn harness(peers: &[u16]) -> Harness {
        let transport = Arc::new(RecordingTransport::new(addr(5000)));
        let bus = Arc::new(InMemoryFrontendBus::new());
        let network = Arc::new(GossipNetwork::new(
            NetworkSettings::new("B").with_peers(peers.iter().map(|p| addr(*p))),
            transport.clone(),
            bus.clone(),
        ));
        Harness {
            service: RumorService::new(network, RumorSettings::default()),
            transport,
            bus,
        }
    }

    fn status(pairs: &[(&str, u32)]) -> StatusPacket {
        StatusPacket {
            want: pairs
                .iter()
                .map(|(origin, next_id)| PeerStatus {
                    identifier: origin.to_string(),
                    next_id: *next_id,
                })
                .collect(),
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_rumor_is_acknowledged_and_spread() {
        let h = harness(&[5001, 5002]);
        let rumor = RumorMessage::new("A", 1, "hi");
        assert!(h.service.on_rumor(rumor.clone(), addr(5001)));
        settle().await;

        let sent = h.transport.sent_packets();
        assert!(matches!(&sent[0], (GossipPacket::Status(s), to)
            if *to == addr(5001) && s.next_id_for("A") == Some(2)));
        assert_eq!(sent[1], (GossipPacket::Rumor(rumor.clone()), addr(5002)));
        assert_eq!(h.service.network().target("A"), Some(addr(5001)));
        assert_eq!(h.bus.drain().last(), Some(&FrontendUpdate::rumor(&rumor)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_rumor_only_gets_a_status() {
        let h = harness(&[5001, 5002]);
        let rumor = RumorMessage::new("A", 1, "hi");
        h.service.on_rumor(rumor.clone(), addr(5001));
        settle().await;
        h.transport.take_packets();

        assert!(!h.service.on_rumor(rumor, addr(5002)));
        settle().await;
        let sent = h.transport.sent_packets();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], (GossipPacket::Status(_), to) if to == addr(5002)));
        // the route stays with the first sender
        assert_eq!(h.service.network().target("A"), Some(addr(5001)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_route_rumor_is_not_shown() {
        let h = harness(&[5001]);
        assert!(h.service.on_rumor(RumorMessage::new("A", 1, ""), addr(5001)));
        assert!(!h
            .bus
            .drain()
            .iter()
            .any(|update| matches!(update, FrontendUpdate::Rumor { .. })));
        assert_eq!(h.service.network().target("A"), Some(addr(5001)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_monger_gives_up_without_other_neighbors() {
        let h = harness(&[5001]);
        h.service.on_client_rumor("hello");
        settle().await;
        assert_eq!(h.service.pending_mongers(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(h.service.pending_mongers(), 0);
        assert_eq!(h.transport.sent_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_status_reply_ends_mongering_in_sync() {
        let h = harness(&[5001]);
        h.service.on_client_rumor("hello");
        settle().await;
        assert!(logs_contain("MONGERING with 127.0.0.1:5001"));

        h.service.on_status(status(&[("B", 2)]), addr(5001));
        settle().await;
        assert_eq!(h.service.pending_mongers(), 0);
        assert!(logs_contain("IN SYNC WITH 127.0.0.1:5001"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_missing_our_rumor_triggers_monger() {
        let h = harness(&[]);
        let rumor = h.service.on_client_rumor("hello");
        h.service.on_status(status(&[]), addr(5003));
        settle().await;

        assert_eq!(
            h.transport.sent_packets(),
            vec![(GossipPacket::Rumor(rumor), addr(5003))]
        );
        assert_eq!(h.service.network().peers(), vec![addr(5003)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_ahead_of_us_gets_our_status() {
        let h = harness(&[5001]);
        h.service.on_status(status(&[("A", 4)]), addr(5001));
        let sent = h.transport.sent_packets();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], (GossipPacket::Status(s), _) if s.next_id_for("B") == Some(1)));
    }
}
