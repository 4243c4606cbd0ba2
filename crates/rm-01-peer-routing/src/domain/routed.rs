//! # Routed Messages
//!
//! Point-to-point payloads travel hop by hop along the routing table. Every
//! sender, the originator included, spends one hop before transmitting.

use shared_types::{BlockReply, DataReply, DataRequest, GossipPacket, PrivateMessage, SearchReply};

/// A payload addressed to a named destination with a hop budget.
pub trait Routed: Sized {
    fn origin(&self) -> &str;
    fn destination(&self) -> &str;
    fn hop_limit(&self) -> u32;
    fn set_hop_limit(&mut self, hop_limit: u32);
    fn into_packet(self) -> GossipPacket;

    /// Spend one hop. Returns `false` when nothing is left to send with.
    fn spend_hop(&mut self) -> bool {
        match self.hop_limit().checked_sub(1) {
            Some(remaining) if remaining > 0 => {
                self.set_hop_limit(remaining);
                true
            }
            _ => {
                self.set_hop_limit(0);
                false
            }
        }
    }
}

macro_rules! impl_routed {
    ($ty:ty, $variant:ident) => {
        impl Routed for $ty {
            fn origin(&self) -> &str {
                &self.origin
            }
            fn destination(&self) -> &str {
                &self.destination
            }
            fn hop_limit(&self) -> u32 {
                self.hop_limit
            }
            fn set_hop_limit(&mut self, hop_limit: u32) {
                self.hop_limit = hop_limit;
            }
            fn into_packet(self) -> GossipPacket {
                GossipPacket::$variant(self)
            }
        }
    };
}

impl_routed!(PrivateMessage, Private);
impl_routed!(DataRequest, DataRequest);
impl_routed!(DataReply, DataReply);
impl_routed!(SearchReply, SearchReply);
impl_routed!(BlockReply, BlockReply);
