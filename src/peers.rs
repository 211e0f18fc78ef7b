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

//! Registry of discovered peers and their connection status.

use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ChatError, Result};
use crate::profile::Photo;

/// Opaque peer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random id for the local session.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Connection status of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Available,
    Pending,
    Connected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Available => "available",
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side started a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrigin {
    /// We asked the peer.
    Outgoing,
    /// The peer asked us.
    Incoming,
}

/// What discovery reports about a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDescriptor {
    pub id: PeerId,
    pub display_name: String,
    pub photo: Option<Photo>,
    pub distance_label: String,
}

/// A peer known to this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: PeerId,
    pub display_name: String,
    pub photo: Option<Photo>,
    pub status: ConnectionStatus,
    pub distance_label: String,
    /// Set while `status` is pending.
    pub request: Option<RequestOrigin>,
}

impl Peer {
    fn from_descriptor(descriptor: PeerDescriptor) -> Self {
        Self {
            id: descriptor.id,
            display_name: descriptor.display_name,
            photo: descriptor.photo,
            status: ConnectionStatus::Available,
            distance_label: descriptor.distance_label,
            request: None,
        }
    }
}

/// Outcome of [`PeerRegistry::add_or_update_peer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Added,
    Updated,
    Unchanged,
    /// The descriptor was our own session.
    IgnoredSelf,
}

/// Discovered peers, in discovery order.
#[derive(Debug)]
pub struct PeerRegistry {
    local_id: PeerId,
    peers: Vec<Peer>,
}

impl PeerRegistry {
    pub fn new(local_id: PeerId) -> Self {
        Self {
            local_id,
            peers: Vec::new(),
        }
    }

    /// Insert a new peer or refresh the details of a known one.
    ///
    /// Connection status is never touched here.
    pub fn add_or_update_peer(&mut self, descriptor: PeerDescriptor) -> Upsert {
        if descriptor.id == self.local_id {
            debug!("Ignoring own advertisement");
            return Upsert::IgnoredSelf;
        }

        match self.peers.iter_mut().find(|p| p.id == descriptor.id) {
            Some(peer) => {
                if peer.display_name == descriptor.display_name
                    && peer.photo == descriptor.photo
                    && peer.distance_label == descriptor.distance_label
                {
                    return Upsert::Unchanged;
                }
                peer.display_name = descriptor.display_name;
                peer.photo = descriptor.photo;
                peer.distance_label = descriptor.distance_label;
                debug!("Peer {} refreshed", peer.id);
                Upsert::Updated
            }
            None => {
                info!("Peer discovered: {} ({})", descriptor.display_name, descriptor.id);
                self.peers.push(Peer::from_descriptor(descriptor));
                Upsert::Added
            }
        }
    }

    /// available -> pending, started by us.
    pub fn request_connection(&mut self, id: &PeerId) -> Result<()> {
        self.transition(
            id,
            "request",
            ConnectionStatus::Available,
            ConnectionStatus::Pending,
            Some(RequestOrigin::Outgoing),
        )
    }

    /// available -> pending, started by the peer.
    pub fn receive_request(&mut self, id: &PeerId) -> Result<()> {
        self.transition(
            id,
            "receive a request from",
            ConnectionStatus::Available,
            ConnectionStatus::Pending,
            Some(RequestOrigin::Incoming),
        )
    }

    /// pending -> connected.
    pub fn accept_connection(&mut self, id: &PeerId) -> Result<()> {
        self.transition(
            id,
            "accept",
            ConnectionStatus::Pending,
            ConnectionStatus::Connected,
            None,
        )
    }

    /// pending -> available.
    pub fn decline(&mut self, id: &PeerId) -> Result<()> {
        self.transition(
            id,
            "decline",
            ConnectionStatus::Pending,
            ConnectionStatus::Available,
            None,
        )
    }

    /// connected -> available. The caller clears the conversation.
    pub fn disconnect(&mut self, id: &PeerId) -> Result<()> {
        self.transition(
            id,
            "disconnect",
            ConnectionStatus::Connected,
            ConnectionStatus::Available,
            None,
        )
    }

    fn transition(
        &mut self,
        id: &PeerId,
        action: &'static str,
        from: ConnectionStatus,
        to: ConnectionStatus,
        request: Option<RequestOrigin>,
    ) -> Result<()> {
        let peer = self
            .peers
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ChatError::UnknownPeer(id.clone()))?;

        if peer.status != from {
            return Err(ChatError::InvalidStateTransition {
                peer: id.clone(),
                from: peer.status,
                action,
            });
        }

        debug!("Peer {}: {} -> {}", id, peer.status, to);
        peer.status = to;
        peer.request = request;
        Ok(())
    }

    pub fn get(&self, id: &PeerId) -> Option<&Peer> {
        self.peers.iter().find(|p| &p.id == id)
    }

    pub fn status(&self, id: &PeerId) -> Option<ConnectionStatus> {
        self.get(id).map(|p| p.status)
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, name: &str) -> PeerDescriptor {
        PeerDescriptor {
            id: PeerId::from(id),
            display_name: name.to_string(),
            photo: None,
            distance_label: "Nearby".to_string(),
        }
    }

    fn registry_with(id: &str) -> PeerRegistry {
        let mut registry = PeerRegistry::new(PeerId::from("me"));
        registry.add_or_update_peer(descriptor(id, "Alice"));
        registry
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut registry = PeerRegistry::new(PeerId::from("me"));
        assert_eq!(registry.add_or_update_peer(descriptor("p1", "Alice")), Upsert::Added);
        assert_eq!(registry.add_or_update_peer(descriptor("p1", "Alice")), Upsert::Unchanged);
        assert_eq!(registry.add_or_update_peer(descriptor("p1", "Alicia")), Upsert::Updated);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&"p1".into()).unwrap().display_name, "Alicia");
    }

    #[test]
    fn test_upsert_keeps_status() {
        let mut registry = registry_with("p1");
        let id = PeerId::from("p1");
        registry.request_connection(&id).unwrap();
        registry.add_or_update_peer(descriptor("p1", "Alicia"));
        assert_eq!(registry.status(&id), Some(ConnectionStatus::Pending));
    }

    #[test]
    fn test_self_is_excluded() {
        let mut registry = PeerRegistry::new(PeerId::from("me"));
        assert_eq!(registry.add_or_update_peer(descriptor("me", "Me")), Upsert::IgnoredSelf);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_request_only_from_available() {
        let mut registry = registry_with("p1");
        let id = PeerId::from("p1");

        registry.request_connection(&id).unwrap();
        assert_eq!(registry.get(&id).unwrap().request, Some(RequestOrigin::Outgoing));
        assert!(matches!(
            registry.request_connection(&id),
            Err(ChatError::InvalidStateTransition { from: ConnectionStatus::Pending, .. })
        ));

        registry.accept_connection(&id).unwrap();
        assert!(matches!(
            registry.request_connection(&id),
            Err(ChatError::InvalidStateTransition { from: ConnectionStatus::Connected, .. })
        ));
    }

    #[test]
    fn test_accept_only_from_pending() {
        let mut registry = registry_with("p1");
        let id = PeerId::from("p1");

        assert!(matches!(
            registry.accept_connection(&id),
            Err(ChatError::InvalidStateTransition { from: ConnectionStatus::Available, .. })
        ));

        registry.request_connection(&id).unwrap();
        registry.accept_connection(&id).unwrap();
        assert_eq!(registry.status(&id), Some(ConnectionStatus::Connected));
        assert_eq!(registry.get(&id).unwrap().request, None);

        assert!(registry.accept_connection(&id).is_err());
    }

    #[test]
    fn test_disconnect_only_from_connected() {
        let mut registry = registry_with("p1");
        let id = PeerId::from("p1");

        assert!(registry.disconnect(&id).is_err());
        registry.request_connection(&id).unwrap();
        assert!(registry.disconnect(&id).is_err());
        registry.accept_connection(&id).unwrap();
        registry.disconnect(&id).unwrap();
        assert_eq!(registry.status(&id), Some(ConnectionStatus::Available));
    }

    #[test]
    fn test_incoming_request_can_be_declined() {
        let mut registry = registry_with("p1");
        let id = PeerId::from("p1");

        registry.receive_request(&id).unwrap();
        assert_eq!(registry.get(&id).unwrap().request, Some(RequestOrigin::Incoming));
        registry.decline(&id).unwrap();
        assert_eq!(registry.status(&id), Some(ConnectionStatus::Available));
        assert!(registry.decline(&id).is_err());
    }

    #[test]
    fn test_unknown_peer() {
        let mut registry = PeerRegistry::new(PeerId::from("me"));
        assert!(matches!(
            registry.request_connection(&"ghost".into()),
            Err(ChatError::UnknownPeer(_))
        ));
    }
}
