//! Packets from the local client.
//!
//! | Packet | Action |
//! |--------|--------|
//! | `Simple` | broadcast in simple mode, otherwise a new rumor |
//! | `Rumor` | new rumor |
//! | `Private` | private message to `destination` |
//! | `DataRequest`, no destination, zero hash | index `_SharedFiles/<origin>` and publish a claim |
//! | `DataRequest`, no destination | download the search match `hash_value` as `origin` |
//! | `DataRequest`, destination | download `hash_value` from `destination` as `origin` |
//! | `SearchRequest` | search `keywords`; budget 0 expands |

use std::net::SocketAddr;
use std::sync::Arc;

use mesh_telemetry::{metric_inc, PACKETS_DROPPED, PACKETS_RECEIVED};
use rm_02_rumor_mongering::RumorError;
use rm_03_file_sharing::FileError;
use rm_04_file_chain::ChainError;
use shared_types::{decode_packet, DataRequest, GossipPacket, ZERO_HASH};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::DatagramHandler;
use crate::container::SubsystemContainer;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Rumor(#[from] RumorError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("{0} packets are not accepted from the client")]
    Unsupported(&'static str),
}

pub struct ClientHandler {
    container: Arc<SubsystemContainer>,
}

impl ClientHandler {
    pub fn new(container: Arc<SubsystemContainer>) -> Self {
        Self { container }
    }

    pub fn dispatch(&self, packet: GossipPacket) -> Result<(), ClientError> {
        let c = &self.container;
        if c.is_simple() {
            return match packet {
                GossipPacket::Simple(message) => {
                    c.rumors.on_client_simple(message.contents);
                    Ok(())
                }
                GossipPacket::Rumor(rumor) => {
                    c.rumors.on_client_simple(rumor.text);
                    Ok(())
                }
                other => Err(ClientError::Unsupported(other.kind())),
            };
        }

        match packet {
            GossipPacket::Simple(message) => {
                c.rumors.on_client_rumor(message.contents);
            }
            GossipPacket::Rumor(rumor) => {
                c.rumors.on_client_rumor(rumor.text);
            }
            GossipPacket::Private(message) => {
                c.rumors
                    .on_client_private(message.text, message.destination, message.hop_limit)?;
            }
            GossipPacket::DataRequest(request) => self.on_file_request(request)?,
            GossipPacket::SearchRequest(request) => {
                info!("CLIENT SEARCH {} budget {}", request.keywords.join(","), request.budget);
                c.files.search(request.keywords, request.budget);
            }
            other => return Err(ClientError::Unsupported(other.kind())),
        }
        Ok(())
    }

    fn on_file_request(&self, request: DataRequest) -> Result<(), ClientError> {
        let c = &self.container;
        let name = request.origin;
        if request.destination.is_empty() && request.hash_value == ZERO_HASH {
            let record = c.files.index_local_file(&name)?;
            match c.chain.publish_file(record) {
                Ok(_) => {}
                Err(ChainError::TransactionRejected { file, reason }) => {
                    warn!("claim on {} not published: {}", file, reason)
                }
                Err(e) => return Err(e.into()),
            }
        } else if request.destination.is_empty() {
            c.files.download_match(request.hash_value, &name)?;
        } else {
            c.files.download(&name, request.hash_value, &request.destination)?;
        }
        Ok(())
    }
}

impl DatagramHandler for ClientHandler {
    fn handle_datagram(&self, bytes: &[u8], from: SocketAddr) {
        let packet = match decode_packet(bytes) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("undecodable client datagram from {}: {}", from, e);
                metric_inc!(PACKETS_DROPPED, &["decode"]);
                return;
            }
        };
        metric_inc!(PACKETS_RECEIVED, &["client"]);
        if let Err(e) = self.dispatch(packet) {
            warn!("client request failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use rm_01_peer_routing::PeerRoutingApi;
    use rm_03_file_sharing::FileState;
    use shared_types::{
        hash_from_hex, PrivateMessage, RumorMessage, SearchRequest, SimpleMessage, TxPublish,
    };
    use tracing_test::traced_test;

    use super::*;
    use crate::testing::{addr, container, container_with, container_with_files};

    fn index_request(name: &str) -> GossipPacket {
        GossipPacket::DataRequest(DataRequest {
            origin: name.into(),
            destination: String::new(),
            hop_limit: 0,
            hash_value: ZERO_HASH,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_rumor_is_numbered_locally() {
        let (c, _) = container("A");
        let handler = ClientHandler::new(c.clone());
        handler
            .dispatch(GossipPacket::Rumor(RumorMessage::new("ignored", 42, "hello")))
            .unwrap();
        handler
            .dispatch(GossipPacket::Simple(SimpleMessage {
                original_name: String::new(),
                relay_peer_addr: String::new(),
                contents: "again".into(),
            }))
            .unwrap();
        let rumors = c.rumors.rumors_from("A");
        assert_eq!(rumors.len(), 2);
        assert_eq!(rumors[0].id, 1);
        assert_eq!(rumors[1].text, "again");
    }

    #[tokio::test]
    async fn test_client_private_defaults_hop_limit() {
        let (c, transport) = container("A");
        c.network.learn_route("C", addr(5002));
        let handler = ClientHandler::new(c.clone());
        handler
            .dispatch(GossipPacket::Private(PrivateMessage {
                origin: String::new(),
                id: 0,
                text: "psst".into(),
                destination: "C".into(),
                hop_limit: 0,
            }))
            .unwrap();
        let sent = transport.take_packets();
        assert!(matches!(&sent[..], [(GossipPacket::Private(m), to)]
            if *to == addr(5002) && m.hop_limit == shared_types::PRIVATE_HOP_LIMIT - 1));
    }

    #[tokio::test]
    async fn test_index_publishes_claim() {
        let (c, transport) = container_with_files("A", &[("song.mp3", &[7u8; 10_000])]);
        let handler = ClientHandler::new(c.clone());

        handler.dispatch(index_request("song.mp3")).unwrap();
        let claims: Vec<TxPublish> = transport
            .take_packets()
            .into_iter()
            .filter_map(|(packet, _)| match packet {
                GossipPacket::TxPublish(publish) => Some(publish),
                _ => None,
            })
            .collect();
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].transaction.file.name, "song.mp3");
        assert_eq!(claims[0].transaction.file.size, 10_000);
        assert_eq!(c.chain.chain().builder().transactions().len(), 1);

        assert!(matches!(
            handler.dispatch(index_request("song.mp3")),
            Err(ClientError::File(FileError::AlreadyIndexed(_)))
        ));
    }

    #[tokio::test]
    async fn test_index_missing_file_fails() {
        let (c, _) = container_with_files("A", &[]);
        let handler = ClientHandler::new(c);
        assert!(matches!(
            handler.dispatch(index_request("nope.txt")),
            Err(ClientError::File(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_from_named_peer() {
        let (c, transport) = container("A");
        c.network.learn_route("B", addr(5001));
        let handler = ClientHandler::new(c.clone());
        let metahash = hash_from_hex(&"ab".repeat(32)).unwrap();
        handler
            .dispatch(GossipPacket::DataRequest(DataRequest {
                origin: "copy.bin".into(),
                destination: "B".into(),
                hop_limit: 0,
                hash_value: metahash,
            }))
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(c.files.file_state(&metahash), Some(FileState::NoMetafileMonoSource));
        assert!(transport.sent_packets().iter().any(|(packet, to)| *to == addr(5001)
            && matches!(packet, GossipPacket::DataRequest(r) if r.hash_value == metahash)));
    }

    #[tokio::test]
    async fn test_unknown_match_download_fails() {
        let (c, _) = container("A");
        let handler = ClientHandler::new(c);
        let request = GossipPacket::DataRequest(DataRequest {
            origin: "x".into(),
            destination: String::new(),
            hop_limit: 0,
            hash_value: [3; 32],
        });
        assert!(matches!(
            handler.dispatch(request),
            Err(ClientError::File(FileError::UnknownFile(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_search_floods() {
        let (c, transport) = container("A");
        let handler = ClientHandler::new(c);
        handler
            .dispatch(GossipPacket::SearchRequest(SearchRequest {
                origin: String::new(),
                budget: 4,
                keywords: vec!["song".into()],
            }))
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let budgets: u64 = transport
            .sent_packets()
            .iter()
            .filter_map(|(packet, _)| match packet {
                GossipPacket::SearchRequest(r) => Some(r.budget),
                _ => None,
            })
            .sum();
        assert_eq!(budgets, 4);
    }

    #[tokio::test]
    async fn test_tx_publish_refused() {
        let (c, _) = container("A");
        let handler = ClientHandler::new(c);
        let tx = rm_04_file_chain::sign_ownership(
            shared_types::FileRecord::new("a", 1, [1; 32]),
            &shared_crypto::testing::fixture_keypair(0),
        )
        .unwrap();
        assert!(matches!(
            handler.dispatch(GossipPacket::TxPublish(TxPublish {
                transaction: tx,
                hop_limit: 10,
            })),
            Err(ClientError::Unsupported("tx_publish"))
        ));
    }

    #[tokio::test]
    async fn test_simple_mode_client_broadcasts() {
        let (c, transport) = container_with("A", |config| config.gossip.simple = true);
        let handler = ClientHandler::new(c);
        handler
            .dispatch(GossipPacket::Simple(SimpleMessage {
                original_name: String::new(),
                relay_peer_addr: String::new(),
                contents: "hi".into(),
            }))
            .unwrap();
        let sent = transport.take_packets();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(packet, _)| matches!(packet,
            GossipPacket::Simple(m) if m.original_name == "A" && m.relay_peer_addr == addr(5000).to_string())));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_failed_request_is_logged() {
        let (c, _) = container("A");
        let handler = ClientHandler::new(c);
        handler.handle_datagram(&[0xff, 0x01, 0x02], addr(9000));
        assert!(logs_contain("undecodable client datagram"));

        let bytes = shared_types::encode_packet(&GossipPacket::Private(PrivateMessage {
            origin: String::new(),
            id: 0,
            text: "lost".into(),
            destination: String::new(),
            hop_limit: 0,
        }))
        .unwrap();
        handler.handle_datagram(&bytes, addr(9000));
        assert!(logs_contain("client request failed"));
    }
}
