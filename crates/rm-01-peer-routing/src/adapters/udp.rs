//! # UDP Adapter
//!
//! One socket per role: the gossip socket faces peers, the client socket
//! faces the local UI. Both share this type.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::ports::{DatagramSource, GossipTransport, NetworkError};

/// Bound UDP socket used for sending.
#[derive(Debug, Clone)]
pub struct UdpGossipSocket {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    max_packet_size: usize,
}

impl UdpGossipSocket {
    /// Bind `addr`. Datagrams above `max_packet_size` are neither sent nor
    /// fully received.
    pub async fn bind(addr: SocketAddr, max_packet_size: usize) -> Result<Self, NetworkError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| NetworkError::Bind {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            max_packet_size,
        })
    }

    /// A receive handle on the same socket.
    pub fn receiver(&self) -> UdpDatagramSource {
        UdpDatagramSource {
            socket: Arc::clone(&self.socket),
            buffer: vec![0u8; self.max_packet_size],
        }
    }
}

impl GossipTransport for UdpGossipSocket {
    fn send_datagram(&self, bytes: &[u8], target: SocketAddr) -> Result<(), NetworkError> {
        if bytes.len() > self.max_packet_size {
            return Err(NetworkError::MessageTooLarge {
                size: bytes.len(),
                limit: self.max_packet_size,
            });
        }
        self.socket.try_send_to(bytes, target)?;
        Ok(())
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Receive half of a [`UdpGossipSocket`].
#[derive(Debug)]
pub struct UdpDatagramSource {
    socket: Arc<UdpSocket>,
    buffer: Vec<u8>,
}

#[async_trait]
impl DatagramSource for UdpDatagramSource {
    async fn recv_datagram(&mut self) -> Result<(Vec<u8>, SocketAddr), NetworkError> {
        let (len, from) = self.socket.recv_from(&mut self.buffer).await?;
        Ok((self.buffer[..len].to_vec(), from))
    }
}
