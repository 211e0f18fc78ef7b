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

//! Simulated transport for demos and machines without Bluetooth.
//!
//! The remote side is played by timers: a connection request is accepted
//! after `accept_delay` and every message gets a canned reply after
//! `reply_delay`. Both arrive as ordinary [`PeerEvent`]s.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::ble_constants::DEFAULT_DISTANCE_LABEL;
use super::protocol::{MessagePayload, ProfilePayload};
use super::transport::{PeerEvent, PeerTransport};
use crate::error::{ChatError, Result};
use crate::peers::{PeerDescriptor, PeerId};
use crate::profile::{Photo, UserProfile};

/// A scripted peer.
#[derive(Debug, Clone)]
pub struct SimulatedPeer {
    pub name: String,
    pub photo: Option<Photo>,
}

/// Behaviour of the simulated remote side.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub accept_delay: Duration,
    pub reply_delay: Duration,
    pub reply_text: String,
    pub peers: Vec<SimulatedPeer>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            accept_delay: Duration::from_millis(3000),
            reply_delay: Duration::from_millis(2000),
            reply_text: "Thanks for your message!".to_string(),
            peers: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    next_peer: usize,
    connected: HashSet<PeerId>,
    sent: Vec<(PeerId, MessagePayload)>,
    /// Profile characteristic value from the last publish.
    published: Option<Vec<u8>>,
}

/// Transport whose peers are scripted.
pub struct SimulatedTransport {
    settings: SimulationSettings,
    event_tx: mpsc::Sender<PeerEvent>,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedTransport {
    pub fn new(settings: SimulationSettings, event_tx: mpsc::Sender<PeerEvent>) -> Self {
        info!(
            "Simulated transport with {} scripted peer(s)",
            settings.peers.len()
        );
        Self {
            settings,
            event_tx,
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    fn peer_id(index: usize) -> PeerId {
        PeerId::new(format!("sim-{}", index + 1))
    }

    /// Messages written so far, oldest first.
    pub fn sent_messages(&self) -> Vec<(PeerId, MessagePayload)> {
        self.state.lock().sent.clone()
    }

    /// The profile as a peer reading our characteristic would see it.
    pub fn published_profile(&self) -> Option<ProfilePayload> {
        let state = self.state.lock();
        let bytes = state.published.as_deref()?;
        ProfilePayload::from_bytes(bytes).ok()
    }

    /// Name from the last published profile.
    pub fn published_name(&self) -> Option<String> {
        self.published_profile().map(|payload| payload.name)
    }

    fn schedule(&self, delay: Duration, event: PeerEvent) {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Simulated event: {:?}", event);
            let _ = tx.send(event).await;
        });
    }

    /// Like `schedule`, but only delivers while the peer is still linked.
    fn schedule_from_peer(&self, delay: Duration, peer: PeerId, event: PeerEvent) {
        let tx = self.event_tx.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !state.lock().connected.contains(&peer) {
                debug!("Dropping simulated event for unlinked peer {}", peer);
                return;
            }
            debug!("Simulated event: {:?}", event);
            let _ = tx.send(event).await;
        });
    }

    fn ensure_known(&self, peer: &PeerId) -> Result<()> {
        let known = (0..self.settings.peers.len()).any(|i| &Self::peer_id(i) == peer);
        if known {
            Ok(())
        } else {
            Err(ChatError::NotFound(format!("peer {} is out of range", peer)))
        }
    }
}

#[async_trait]
impl PeerTransport for SimulatedTransport {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn publish_profile(&self, profile: &UserProfile) -> Result<()> {
        let payload = ProfilePayload::from_profile(profile).to_bytes()?;
        self.state.lock().published = Some(payload);
        info!("You're discoverable as '{}'", profile.display_name);
        Ok(())
    }

    async fn discover(&self) -> Result<PeerDescriptor> {
        if self.settings.peers.is_empty() {
            return Err(ChatError::NotFound(
                "No Proximity Chat users found nearby. Make sure they have the app open."
                    .to_string(),
            ));
        }

        let index = {
            let mut state = self.state.lock();
            let index = state.next_peer % self.settings.peers.len();
            state.next_peer += 1;
            index
        };
        let peer = &self.settings.peers[index];
        Ok(PeerDescriptor {
            id: Self::peer_id(index),
            display_name: peer.name.clone(),
            photo: peer.photo.clone(),
            distance_label: DEFAULT_DISTANCE_LABEL.to_string(),
        })
    }

    async fn request_connection(&self, peer: &PeerId) -> Result<()> {
        self.ensure_known(peer)?;
        self.state.lock().connected.insert(peer.clone());
        self.schedule(
            self.settings.accept_delay,
            PeerEvent::ConnectionAccepted { peer: peer.clone() },
        );
        Ok(())
    }

    async fn accept_connection(&self, peer: &PeerId) -> Result<()> {
        self.ensure_known(peer)?;
        self.state.lock().connected.insert(peer.clone());
        Ok(())
    }

    async fn decline_connection(&self, peer: &PeerId) -> Result<()> {
        self.ensure_known(peer)?;
        self.state.lock().connected.remove(peer);
        Ok(())
    }

    async fn write_message(&self, peer: &PeerId, message: &MessagePayload) -> Result<()> {
        {
            let mut state = self.state.lock();
            if !state.connected.contains(peer) {
                return Err(ChatError::TransportFailure(format!(
                    "no link to peer {}",
                    peer
                )));
            }
            state.sent.push((peer.clone(), message.clone()));
        }

        self.schedule_from_peer(
            self.settings.reply_delay,
            peer.clone(),
            PeerEvent::MessageReceived {
                peer: peer.clone(),
                text: self.settings.reply_text.clone(),
                timestamp_millis: Utc::now().timestamp_millis()
                    + self.settings.reply_delay.as_millis() as i64,
            },
        );
        Ok(())
    }

    async fn disconnect(&self, peer: &PeerId) -> Result<()> {
        self.state.lock().connected.remove(peer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(peers: &[&str]) -> SimulationSettings {
        SimulationSettings {
            accept_delay: Duration::from_millis(5),
            reply_delay: Duration::from_millis(5),
            reply_text: "pong".to_string(),
            peers: peers
                .iter()
                .map(|name| SimulatedPeer {
                    name: name.to_string(),
                    photo: None,
                })
                .collect(),
        }
    }

    async fn next_event(rx: &mut mpsc::Receiver<PeerEvent>) -> PeerEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn test_discover_cycles_peers() {
        let (tx, _rx) = mpsc::channel(8);
        let transport = SimulatedTransport::new(settings(&["Alice", "Bob"]), tx);

        assert_eq!(transport.discover().await.unwrap().display_name, "Alice");
        assert_eq!(transport.discover().await.unwrap().display_name, "Bob");
        let again = transport.discover().await.unwrap();
        assert_eq!(again.display_name, "Alice");
        assert_eq!(again.id, PeerId::from("sim-1"));
    }

    #[tokio::test]
    async fn test_discover_without_peers() {
        let (tx, _rx) = mpsc::channel(8);
        let transport = SimulatedTransport::new(settings(&[]), tx);
        assert!(matches!(
            transport.discover().await,
            Err(ChatError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_request_is_accepted_later() {
        let (tx, mut rx) = mpsc::channel(8);
        let transport = SimulatedTransport::new(settings(&["Alice"]), tx);
        let peer = transport.discover().await.unwrap().id;

        transport.request_connection(&peer).await.unwrap();
        assert_eq!(
            next_event(&mut rx).await,
            PeerEvent::ConnectionAccepted { peer }
        );
    }

    #[tokio::test]
    async fn test_write_gets_reply() {
        let (tx, mut rx) = mpsc::channel(8);
        let transport = SimulatedTransport::new(settings(&["Alice"]), tx);
        let peer = transport.discover().await.unwrap().id;

        let msg = MessagePayload::new("Me", "ping");
        assert!(matches!(
            transport.write_message(&peer, &msg).await,
            Err(ChatError::TransportFailure(_))
        ));

        transport.accept_connection(&peer).await.unwrap();
        transport.write_message(&peer, &msg).await.unwrap();
        assert_eq!(transport.sent_messages(), vec![(peer.clone(), msg)]);

        match next_event(&mut rx).await {
            PeerEvent::MessageReceived { peer: from, text, .. } => {
                assert_eq!(from, peer);
                assert_eq!(text, "pong");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_peer_rejected() {
        let (tx, _rx) = mpsc::channel(8);
        let transport = SimulatedTransport::new(settings(&["Alice"]), tx);
        assert!(transport.request_connection(&"ghost".into()).await.is_err());
    }

    #[tokio::test]
    async fn test_no_reply_after_disconnect() {
        let (tx, mut rx) = mpsc::channel(8);
        let transport = SimulatedTransport::new(settings(&["Alice"]), tx);
        let peer = transport.discover().await.unwrap().id;

        transport.accept_connection(&peer).await.unwrap();
        transport
            .write_message(&peer, &MessagePayload::new("Me", "bye"))
            .await
            .unwrap();
        transport.disconnect(&peer).await.unwrap();

        let late = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(late.is_err());
    }

    #[tokio::test]
    async fn test_publish_profile_encodes_payload() {
        let (tx, _rx) = mpsc::channel(8);
        let transport = SimulatedTransport::new(settings(&["Alice"]), tx);
        assert_eq!(transport.published_profile(), None);

        let photo = Photo::new("image/png", vec![1, 2, 3]);
        let profile = UserProfile {
            id: PeerId::from("me"),
            display_name: "Me".to_string(),
            photo: photo.clone(),
        };
        transport.publish_profile(&profile).await.unwrap();

        let payload = transport.published_profile().unwrap();
        assert_eq!(payload.name, "Me");
        assert_eq!(payload.photo, photo.to_data_url());
        assert_eq!(transport.published_name().as_deref(), Some("Me"));
    }
}
