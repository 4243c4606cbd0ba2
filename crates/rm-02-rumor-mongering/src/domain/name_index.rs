//! # Name Index
//!
//! Per-origin message log. Rumor ids for an origin always form the
//! contiguous prefix `1..=n`; anything out of order is dropped, never
//! buffered. Private messages are kept per origin in arrival order.

use std::collections::BTreeMap;

use shared_types::{PeerStatus, PrivateMessage, RumorMessage, StatusPacket};

#[derive(Debug, Default, Clone)]
struct OriginLog {
    rumors: Vec<String>,
    private: Vec<PrivateMessage>,
}

impl OriginLog {
    fn next_id(&self) -> u32 {
        self.rumors.len() as u32 + 1
    }
}

/// Every message this node knows, by origin.
#[derive(Debug, Clone)]
pub struct NameIndex {
    logs: BTreeMap<String, OriginLog>,
}

impl NameIndex {
    /// An index that already lists `self_name`, so our vector clock
    /// advertises ourselves before we say anything.
    pub fn new(self_name: &str) -> Self {
        let mut logs = BTreeMap::new();
        logs.insert(self_name.to_string(), OriginLog::default());
        Self { logs }
    }

    /// Number of rumors stored for `origin`.
    pub fn stored_len(&self, origin: &str) -> u32 {
        self.logs.get(origin).map_or(0, |log| log.rumors.len() as u32)
    }

    /// Text of rumor `id` from `origin`.
    pub fn text_at(&self, origin: &str, id: u32) -> Option<&str> {
        let index = id.checked_sub(1)? as usize;
        self.logs
            .get(origin)?
            .rumors
            .get(index)
            .map(String::as_str)
    }

    /// Append `rumor` if it is the next one expected from its origin.
    pub fn accept_if_next(&mut self, rumor: &RumorMessage) -> bool {
        if rumor.origin.is_empty() {
            return false;
        }
        match self.logs.get_mut(&rumor.origin) {
            Some(log) if rumor.id == log.next_id() => {
                log.rumors.push(rumor.text.clone());
                true
            }
            Some(_) => false,
            None if rumor.id == 1 => {
                self.logs.insert(
                    rumor.origin.clone(),
                    OriginLog {
                        rumors: vec![rumor.text.clone()],
                        private: Vec::new(),
                    },
                );
                true
            }
            None => false,
        }
    }

    /// Store a locally written rumor under `self_name` with the next id.
    pub fn fill_and_store_local(&mut self, text: impl Into<String>, self_name: &str) -> RumorMessage {
        let log = self.logs.entry(self_name.to_string()).or_default();
        let rumor = RumorMessage::new(self_name, log.next_id(), text);
        log.rumors.push(rumor.text.clone());
        rumor
    }

    /// Our status: `next_id` for every known origin.
    pub fn vector_clock(&self) -> StatusPacket {
        StatusPacket {
            want: self
                .logs
                .iter()
                .map(|(origin, log)| PeerStatus {
                    identifier: origin.clone(),
                    next_id: log.next_id(),
                })
                .collect(),
        }
    }

    /// The earliest rumor the peer behind `theirs` is missing, scanning
    /// origins in name order.
    pub fn pick_rumor_they_need(&self, theirs: &StatusPacket) -> Option<RumorMessage> {
        self.logs.iter().find_map(|(origin, log)| {
            let wanted = theirs.next_id_for(origin).unwrap_or(1).max(1);
            let text = log.rumors.get(wanted as usize - 1)?;
            Some(RumorMessage::new(origin.clone(), wanted, text.clone()))
        })
    }

    /// `true` when we hold everything the peer behind `theirs` holds.
    pub fn local_covers(&self, theirs: &StatusPacket) -> bool {
        theirs
            .want
            .iter()
            .all(|status| self.stored_len(&status.identifier) + 1 >= status.next_id)
    }

    /// Keep a private message sent to or by us.
    pub fn add_private(&mut self, message: PrivateMessage) {
        self.logs
            .entry(message.origin.clone())
            .or_default()
            .private
            .push(message);
    }

    /// Private messages exchanged with `origin`, oldest first.
    pub fn private_messages(&self, origin: &str) -> &[PrivateMessage] {
        self.logs
            .get(origin)
            .map(|log| log.private.as_slice())
            .unwrap_or(&[])
    }

    /// Every stored rumor from `origin`, route rumors included.
    pub fn rumors(&self, origin: &str) -> Vec<RumorMessage> {
        self.logs.get(origin).map_or_else(Vec::new, |log| {
            log.rumors
                .iter()
                .enumerate()
                .map(|(index, text)| RumorMessage::new(origin, index as u32 + 1, text.clone()))
                .collect()
        })
    }

    /// Every origin we have heard of, in name order.
    pub fn origins(&self) -> Vec<String> {
        self.logs.keys().cloned().collect()
    }
}
