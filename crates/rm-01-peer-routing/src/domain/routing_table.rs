//! # Routing Table
//!
//! Origin name → next-hop endpoint, learned DSDV-style from rumors. A route
//! only moves to the sender of a rumor with a higher id than the one that
//! last set it; other traffic may only fill in unknown destinations.

use std::collections::HashMap;
use std::net::SocketAddr;

/// Next hop plus the rumor id that last set it (0 when set by other traffic).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub next_hop: SocketAddr,
    pub last_rumor_id: u32,
}

/// Outcome of a routing update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteUpdate {
    /// First route to this origin.
    Added,
    /// The next hop changed.
    Changed,
    /// Same next hop, fresher id.
    Refreshed,
    /// Ignored: own name, or stale id.
    Ignored,
}

impl RouteUpdate {
    /// The next hop is new or different.
    pub fn moved(self) -> bool {
        matches!(self, RouteUpdate::Added | RouteUpdate::Changed)
    }
}

/// Routing table owned by one node.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    self_name: String,
    routes: HashMap<String, RouteEntry>,
}

impl RoutingTable {
    pub fn new(self_name: impl Into<String>) -> Self {
        Self {
            self_name: self_name.into(),
            routes: HashMap::new(),
        }
    }

    /// Overwrite the route to `origin`.
    pub fn update(&mut self, origin: &str, next_hop: SocketAddr) -> RouteUpdate {
        if origin == self.self_name || origin.is_empty() {
            return RouteUpdate::Ignored;
        }
        let last_rumor_id = self.routes.get(origin).map_or(0, |entry| entry.last_rumor_id);
        self.set(origin, next_hop, last_rumor_id)
    }

    /// Update from an accepted rumor; only ids above the last one count.
    pub fn update_from_rumor(&mut self, origin: &str, id: u32, next_hop: SocketAddr) -> RouteUpdate {
        if origin == self.self_name || origin.is_empty() {
            return RouteUpdate::Ignored;
        }
        if let Some(entry) = self.routes.get(origin) {
            if id <= entry.last_rumor_id {
                return RouteUpdate::Ignored;
            }
        }
        self.set(origin, next_hop, id)
    }

    /// Learn a route from non-rumor traffic without displacing a known one.
    pub fn add_if_absent(&mut self, origin: &str, next_hop: SocketAddr) -> RouteUpdate {
        if origin == self.self_name || origin.is_empty() || self.routes.contains_key(origin) {
            return RouteUpdate::Ignored;
        }
        self.set(origin, next_hop, 0)
    }

    fn set(&mut self, origin: &str, next_hop: SocketAddr, last_rumor_id: u32) -> RouteUpdate {
        let entry = RouteEntry {
            next_hop,
            last_rumor_id,
        };
        match self.routes.insert(origin.to_string(), entry) {
            None => RouteUpdate::Added,
            Some(previous) if previous.next_hop != next_hop => RouteUpdate::Changed,
            Some(_) => RouteUpdate::Refreshed,
        }
    }

    /// Current next hop for `origin`.
    pub fn target(&self, origin: &str) -> Option<SocketAddr> {
        self.routes.get(origin).map(|entry| entry.next_hop)
    }

    pub fn entry(&self, origin: &str) -> Option<RouteEntry> {
        self.routes.get(origin).copied()
    }

    /// Known destinations, sorted.
    pub fn destinations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
