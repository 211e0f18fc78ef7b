// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-memory per-peer message history.

use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::peers::{ConnectionStatus, PeerId, PeerRegistry};

/// Delivery status shown under sent messages.
pub const STATUS_SENT: &str = "sent";

/// Direction of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub direction: Direction,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
    /// Advisory only; nothing tracks delivery.
    pub delivery_status: Option<String>,
}

impl ConversationEntry {
    /// A message we sent, stamped now.
    pub fn sent(text: impl Into<String>) -> Self {
        Self {
            direction: Direction::Sent,
            text: text.into(),
            timestamp_millis: Utc::now().timestamp_millis(),
            delivery_status: Some(STATUS_SENT.to_string()),
        }
    }

    /// A message from the peer.
    pub fn received(text: impl Into<String>, timestamp_millis: i64) -> Self {
        Self {
            direction: Direction::Received,
            text: text.into(),
            timestamp_millis,
            delivery_status: None,
        }
    }
}

/// Append-only message logs keyed by peer.
#[derive(Debug, Default)]
pub struct ConversationStore {
    entries: HashMap<PeerId, Vec<ConversationEntry>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry for a connected peer.
    ///
    /// Timestamps earlier than the last stored entry are raised to it so the
    /// log stays in non-decreasing order.
    pub fn append_entry(
        &mut self,
        registry: &PeerRegistry,
        peer: &PeerId,
        mut entry: ConversationEntry,
    ) -> Result<()> {
        let status = registry
            .status(peer)
            .ok_or_else(|| ChatError::UnknownPeer(peer.clone()))?;
        if status != ConnectionStatus::Connected {
            return Err(ChatError::InvalidStateTransition {
                peer: peer.clone(),
                from: status,
                action: "message",
            });
        }

        let log = self.entries.entry(peer.clone()).or_default();
        if let Some(last) = log.last() {
            entry.timestamp_millis = entry.timestamp_millis.max(last.timestamp_millis);
        }
        debug!("{} entry for {} ({} chars)", entry.direction.as_str(), peer, entry.text.len());
        log.push(entry);
        Ok(())
    }

    /// Entries for a peer, oldest first.
    pub fn entries(&self, peer: &PeerId) -> &[ConversationEntry] {
        self.entries.get(peer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop a peer's history.
    pub fn clear(&mut self, peer: &PeerId) {
        if let Some(log) = self.entries.remove(peer) {
            debug!("Cleared {} entries for {}", log.len(), peer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peers::PeerDescriptor;

    fn connected_registry() -> (PeerRegistry, PeerId) {
        let id = PeerId::from("p1");
        let mut registry = PeerRegistry::new(PeerId::from("me"));
        registry.add_or_update_peer(PeerDescriptor {
            id: id.clone(),
            display_name: "Alice".to_string(),
            photo: None,
            distance_label: "Nearby".to_string(),
        });
        registry.request_connection(&id).unwrap();
        registry.accept_connection(&id).unwrap();
        (registry, id)
    }

    #[test]
    fn test_append_requires_connected() {
        let (mut registry, id) = connected_registry();
        let mut store = ConversationStore::new();
        registry.disconnect(&id).unwrap();

        let err = store
            .append_entry(&registry, &id, ConversationEntry::sent("hi"))
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidStateTransition { .. }));

        let err = store
            .append_entry(&registry, &"ghost".into(), ConversationEntry::sent("hi"))
            .unwrap_err();
        assert!(matches!(err, ChatError::UnknownPeer(_)));
        assert!(store.entries(&id).is_empty());
    }

    #[test]
    fn test_entries_keep_order() {
        let (registry, id) = connected_registry();
        let mut store = ConversationStore::new();

        store
            .append_entry(&registry, &id, ConversationEntry::received("one", 2_000))
            .unwrap();
        store
            .append_entry(&registry, &id, ConversationEntry::received("two", 1_000))
            .unwrap();
        store
            .append_entry(&registry, &id, ConversationEntry::received("three", 3_000))
            .unwrap();

        let entries = store.entries(&id);
        let texts: Vec<_> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert!(entries
            .windows(2)
            .all(|w| w[0].timestamp_millis <= w[1].timestamp_millis));
        assert_eq!(entries[1].timestamp_millis, 2_000);
    }

    #[test]
    fn test_clear() {
        let (registry, id) = connected_registry();
        let mut store = ConversationStore::new();
        store
            .append_entry(&registry, &id, ConversationEntry::sent("hi"))
            .unwrap();
        store.clear(&id);
        assert!(store.entries(&id).is_empty());
    }

    #[test]
    fn test_sent_entry_status() {
        let entry = ConversationEntry::sent("hi");
        assert_eq!(entry.direction, Direction::Sent);
        assert_eq!(entry.delivery_status.as_deref(), Some(STATUS_SENT));
        assert_eq!(ConversationEntry::received("yo", 5).delivery_status, None);
    }
}
