use std::sync::Arc;

use mesh_telemetry::log_peer_event;
use rm_01_peer_routing::PeerRoutingApi;
use shared_types::RumorMessage;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

use super::RumorService;

impl RumorService {
    /// Send our status to one random neighbor.
    pub fn anti_entropy_tick(&self) {
        if let Some(target) = self.network.random_neighbor(None) {
            log_peer_event!(debug, "rumor", target, "anti-entropy");
            self.send_status(target);
        }
    }

    /// Emit a route rumor to one random neighbor. Nothing is stored when
    /// there is nobody to tell.
    pub fn send_route_rumor(self: &Arc<Self>) -> Option<RumorMessage> {
        let target = self.network.random_neighbor(None)?;
        let rumor = self
            .names
            .write()
            .fill_and_store_local("", self.network.name());
        self.spawn_monger(rumor.clone(), target);
        Some(rumor)
    }

    /// Anti-entropy loop, first status one period after start.
    pub async fn run_anti_entropy(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = self.settings.anti_entropy_period;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.anti_entropy_tick(),
                _ = shutdown.changed() => {
                    info!("anti-entropy stopped");
                    return;
                }
            }
        }
    }

    /// Route rumor loop: one at start, then one per period. Returns at once
    /// when route rumors are disabled.
    pub async fn run_route_rumors(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let Some(period) = self.settings.route_rumor_period else {
            return;
        };
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.send_route_rumor();
                }
                _ = shutdown.changed() => {
                    info!("route rumors stopped");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use rm_01_peer_routing::adapters::RecordingTransport;
    use rm_01_peer_routing::{GossipNetwork, NetworkSettings};
    use shared_bus::NullFrontendSink;
    use shared_types::GossipPacket;

    use super::*;
    use crate::service::RumorSettings;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn service(peers: &[u16], settings: RumorSettings) -> (Arc<RumorService>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new(addr(5000)));
        let network = Arc::new(GossipNetwork::new(
            NetworkSettings::new("B").with_peers(peers.iter().map(|p| addr(*p))),
            transport.clone(),
            Arc::new(NullFrontendSink),
        ));
        (RumorService::new(network, settings), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_anti_entropy_sends_status_each_period() {
        let (service, transport) = service(&[5001], RumorSettings::default());
        let (stop, shutdown) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(&service).run_anti_entropy(shutdown));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let statuses = transport
            .sent_packets()
            .into_iter()
            .filter(|(packet, _)| matches!(packet, GossipPacket::Status(_)))
            .count();
        assert_eq!(statuses, 2);

        stop.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_route_rumors_start_immediately() {
        let settings = RumorSettings {
            route_rumor_period: Some(Duration::from_secs(10)),
            ..RumorSettings::default()
        };
        let (service, transport) = service(&[5001], settings);
        let (stop, shutdown) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(&service).run_route_rumors(shutdown));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            transport.sent_packets(),
            vec![(GossipPacket::Rumor(RumorMessage::new("B", 1, "")), addr(5001))]
        );

        stop.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_route_rumors_disabled() {
        let (service, _) = service(&[5001], RumorSettings::default());
        let (_stop, shutdown) = watch::channel(false);
        // returns without waiting for shutdown
        Arc::clone(&service).run_route_rumors(shutdown).await;
        assert!(service.rumors_from("B").is_empty());
    }

    #[test]
    fn test_route_rumor_needs_a_neighbor() {
        let (service, _) = service(&[], RumorSettings::default());
        assert!(service.send_route_rumor().is_none());
        assert!(service.rumors_from("B").is_empty());
    }
}
