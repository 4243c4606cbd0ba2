use std::net::SocketAddr;
use std::sync::Arc;

use mesh_telemetry::{metric_inc, PACKETS_DROPPED, PACKETS_RECEIVED};
use rm_01_peer_routing::PeerRoutingApi;
use shared_types::{decode_packet, GossipPacket};
use tracing::debug;

use super::DatagramHandler;
use crate::container::SubsystemContainer;

/// Routes each peer packet to the subsystem owning its variant.
pub struct GossipDispatcher {
    container: Arc<SubsystemContainer>,
}

impl GossipDispatcher {
    pub fn new(container: Arc<SubsystemContainer>) -> Self {
        Self { container }
    }

    pub fn dispatch(&self, packet: GossipPacket, from: SocketAddr) {
        metric_inc!(PACKETS_RECEIVED, &[packet.kind()]);
        let c = &self.container;

        if c.is_simple() {
            match packet {
                GossipPacket::Simple(message) => {
                    if let Err(e) = c.rumors.on_simple(message, from) {
                        debug!("simple message from {} dropped: {}", from, e);
                        metric_inc!(PACKETS_DROPPED, &["bad_relay"]);
                    }
                }
                other => {
                    debug!("{} from {} ignored in simple mode", other.kind(), from);
                    metric_inc!(PACKETS_DROPPED, &["simple_mode"]);
                }
            }
            return;
        }

        c.network.add_peer(from);
        match packet {
            GossipPacket::Simple(_) => {
                debug!("simple message from {} ignored", from);
                metric_inc!(PACKETS_DROPPED, &["not_simple_mode"]);
            }
            GossipPacket::Rumor(rumor) => {
                c.rumors.on_rumor(rumor, from);
            }
            GossipPacket::Status(status) => c.rumors.on_status(status, from),
            GossipPacket::Private(message) => {
                c.rumors.on_private(message, from);
            }
            GossipPacket::DataRequest(request) => {
                c.files.on_data_request(request, from);
            }
            GossipPacket::DataReply(reply) => {
                c.files.on_data_reply(reply, from);
            }
            GossipPacket::SearchRequest(request) => {
                c.files.on_search_request(request, from);
            }
            GossipPacket::SearchReply(reply) => {
                c.files.on_search_reply(reply, from);
            }
            GossipPacket::TxPublish(publish) => {
                c.chain.on_tx_publish(publish, from);
            }
            GossipPacket::BlockPublish(publish) => {
                c.chain.on_block_publish(publish, from);
            }
            GossipPacket::BlockRequest(request) => {
                c.chain.on_block_request(request, from);
            }
            GossipPacket::BlockReply(reply) => {
                c.chain.on_block_reply(reply, from);
            }
        }
    }
}

impl DatagramHandler for GossipDispatcher {
    fn handle_datagram(&self, bytes: &[u8], from: SocketAddr) {
        match decode_packet(bytes) {
            Ok(packet) => self.dispatch(packet, from),
            Err(e) => {
                debug!("undecodable datagram from {}: {}", from, e);
                metric_inc!(PACKETS_DROPPED, &["decode"]);
            }
        }
    }
}
