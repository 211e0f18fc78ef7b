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

//! Event processing and message dispatch.

use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::bluetooth::{MessagePayload, PeerEvent, PeerTransport};
use crate::camera::PhotoSource;
use crate::controller::Controller;
use crate::error::{ChatError, Result};
use crate::peers::{ConnectionStatus, PeerId, RequestOrigin};
use crate::state::{AppState, Screen};

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetName(String),
    /// Take the profile photo, optionally from a picked file.
    CapturePhoto(Option<PathBuf>),
    RetakePhoto,
    /// Leave profile setup.
    Continue,
    Scan,
    Connect(PeerId),
    Accept(PeerId),
    Decline(PeerId),
    OpenChat(PeerId),
    Send(String),
    Back,
    Disconnect,
}

/// Applies user actions and peer events to the controller, calling the
/// transport where the action reaches a peer.
pub struct EventProcessor<T, P> {
    controller: Controller,
    transport: T,
    photos: P,
}

impl<T: PeerTransport, P: PhotoSource> EventProcessor<T, P> {
    /// Create a new event processor.
    pub fn new(controller: Controller, transport: T, photos: P) -> Self {
        info!("Event processor using {} transport", transport.name());
        Self {
            controller,
            transport,
            photos,
        }
    }

    pub fn state(&self) -> &AppState {
        self.controller.state()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Process a user action. Errors are shown to the user and returned.
    pub async fn handle_action(&mut self, action: Action) -> Result<()> {
        debug!("Action: {:?}", action);
        let result = self.apply_action(action).await;
        if let Err(e) = &result {
            self.controller.report(e);
        }
        result
    }

    /// Process an event from the transport. Errors are shown to the user
    /// and returned.
    pub async fn handle_peer_event(&mut self, event: PeerEvent) -> Result<()> {
        debug!("Peer event: {:?}", event);
        let result = self.apply_peer_event(event);
        if let Err(e) = &result {
            self.controller.report(e);
        }
        result
    }

    async fn apply_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::SetName(name) => {
                self.controller.set_name(&name);
            }
            Action::CapturePhoto(path) => {
                let photo = self.photos.capture(path.as_deref()).await?;
                self.controller.set_photo(photo);
            }
            Action::RetakePhoto => {
                self.controller.clear_photo();
            }
            Action::Continue => self.handle_continue().await?,
            Action::Scan => self.handle_scan().await?,
            Action::Connect(peer) => self.handle_connect(&peer).await?,
            Action::Accept(peer) => {
                self.require_incoming(&peer, "accept")?;
                self.transport.accept_connection(&peer).await?;
                self.controller.accept_connection(&peer)?;
                let name = self.controller.peer_name(&peer);
                self.controller.info(format!("Connected to {}", name));
            }
            Action::Decline(peer) => {
                self.require_incoming(&peer, "decline")?;
                self.transport.decline_connection(&peer).await?;
                self.controller.decline(&peer)?;
            }
            Action::OpenChat(peer) => {
                self.controller.open_chat(&peer)?;
            }
            Action::Send(text) => self.handle_send(&text).await?,
            Action::Back => {
                self.controller.back();
            }
            Action::Disconnect => self.handle_disconnect().await?,
        }
        Ok(())
    }

    async fn handle_continue(&mut self) -> Result<()> {
        let profile = self.controller.proceed()?;
        self.transport.publish_profile(&profile).await?;
        self.controller.info("Scan to discover nearby Proximity Chat users");
        Ok(())
    }

    async fn handle_scan(&mut self) -> Result<()> {
        if self.state().screen() == &Screen::ProfileSetup {
            return Err(ChatError::ProfileIncomplete);
        }
        info!("Scanning for Proximity Chat users...");
        let descriptor = self.transport.discover().await?;
        let name = descriptor.display_name.clone();
        self.controller.add_or_update_peer(descriptor);
        self.controller.info(format!("Found {}!", name));
        Ok(())
    }

    async fn handle_connect(&mut self, peer: &PeerId) -> Result<()> {
        self.controller.request_connection(peer)?;
        if let Err(e) = self.transport.request_connection(peer).await {
            // Nothing reached the peer, so fall back to available.
            self.controller.decline(peer)?;
            return Err(e);
        }
        let name = self.controller.peer_name(peer);
        self.controller.info(format!("Connection request sent to {}", name));
        Ok(())
    }

    async fn handle_send(&mut self, text: &str) -> Result<()> {
        let Some((peer, entry)) = self.controller.send_message(text)? else {
            return Ok(());
        };

        let from = self
            .state()
            .profile()
            .name()
            .unwrap_or_default()
            .to_string();
        let payload = MessagePayload {
            from,
            content: entry.text,
            timestamp: entry.timestamp_millis,
        };

        // The message stays in the log as sent either way.
        if let Err(e) = self.transport.write_message(&peer, &payload).await {
            warn!("Message to {} not delivered: {}", peer, e);
        }
        Ok(())
    }

    async fn handle_disconnect(&mut self) -> Result<()> {
        let peer = match self.state().screen() {
            Screen::Chat { peer } => peer.clone(),
            _ => return Err(ChatError::NoActiveChat),
        };
        self.controller.disconnect(&peer)?;
        if let Err(e) = self.transport.disconnect(&peer).await {
            warn!("Transport disconnect from {} failed: {}", peer, e);
        }
        self.controller.info("Disconnected from chat");
        Ok(())
    }

    fn require_incoming(&self, peer: &PeerId, action: &'static str) -> Result<()> {
        let entry = self
            .state()
            .peers()
            .get(peer)
            .ok_or_else(|| ChatError::UnknownPeer(peer.clone()))?;
        if entry.request == Some(RequestOrigin::Incoming) {
            Ok(())
        } else {
            Err(ChatError::InvalidStateTransition {
                peer: peer.clone(),
                from: entry.status,
                action,
            })
        }
    }

    fn apply_peer_event(&mut self, event: PeerEvent) -> Result<()> {
        match event {
            PeerEvent::Discovered(descriptor) => {
                self.controller.add_or_update_peer(descriptor);
            }
            PeerEvent::ConnectionRequested { peer } => {
                self.controller.receive_request(&peer)?;
                let name = self.controller.peer_name(&peer);
                self.controller.info(format!("{} wants to chat", name));
            }
            PeerEvent::ConnectionAccepted { peer } => {
                self.controller.accept_connection(&peer)?;
                let name = self.controller.peer_name(&peer);
                self.controller.info(format!("{} accepted your request!", name));
            }
            PeerEvent::ConnectionDeclined { peer } => {
                self.controller.decline(&peer)?;
                let name = self.controller.peer_name(&peer);
                self.controller.info(format!("{} declined your request", name));
            }
            PeerEvent::MessageReceived {
                peer,
                text,
                timestamp_millis,
            } => {
                match self.state().peers().status(&peer) {
                    Some(ConnectionStatus::Connected) => {
                        self.controller.receive_message(&peer, &text, timestamp_millis)?
                    }
                    // Late reply to a chat the user already closed.
                    Some(_) => debug!("Dropping message from {}: not connected", peer),
                    None => return Err(ChatError::UnknownPeer(peer)),
                }
            }
            PeerEvent::Disconnected { peer } => {
                match self.state().peers().status(&peer) {
                    Some(ConnectionStatus::Connected) => self.controller.disconnect(&peer)?,
                    Some(ConnectionStatus::Pending) => self.controller.decline(&peer)?,
                    Some(ConnectionStatus::Available) => return Ok(()),
                    None => return Err(ChatError::UnknownPeer(peer)),
                }
                let name = self.controller.peer_name(&peer);
                self.controller.info(format!("{} disconnected", name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::{SimulatedPeer, SimulatedTransport, SimulationSettings};
    use crate::camera::FilePhotoSource;
    use crate::state::NoticeLevel;
    use chrono::Utc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    struct Harness {
        processor: EventProcessor<SimulatedTransport, FilePhotoSource>,
        events: mpsc::Receiver<PeerEvent>,
        _dir: TempDir,
    }

    fn harness(peers: &[&str]) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("me.png");
        std::fs::write(&photo, [0x89, 0x50, 0x4e, 0x47]).unwrap();

        let (tx, rx) = mpsc::channel(16);
        let settings = SimulationSettings {
            accept_delay: Duration::from_millis(5),
            reply_delay: Duration::from_millis(5),
            reply_text: "Thanks for your message!".to_string(),
            peers: peers
                .iter()
                .map(|name| SimulatedPeer {
                    name: name.to_string(),
                    photo: None,
                })
                .collect(),
        };
        let processor = EventProcessor::new(
            Controller::default(),
            SimulatedTransport::new(settings, tx),
            FilePhotoSource::new(Some(photo)),
        );
        Harness {
            processor,
            events: rx,
            _dir: dir,
        }
    }

    impl Harness {
        async fn setup_profile(&mut self) {
            let p = &mut self.processor;
            p.handle_action(Action::SetName("Me".to_string())).await.unwrap();
            p.handle_action(Action::CapturePhoto(None)).await.unwrap();
            p.handle_action(Action::Continue).await.unwrap();
        }

        async fn pump(&mut self) {
            let event = tokio::time::timeout(Duration::from_secs(2), self.events.recv())
                .await
                .expect("event in time")
                .expect("channel open");
            self.processor.handle_peer_event(event).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_full_demo_flow() {
        let mut h = harness(&["Alice"]);
        h.setup_profile().await;
        assert_eq!(h.processor.state().screen(), &Screen::Discovery);
        assert_eq!(h.processor.transport().published_name().as_deref(), Some("Me"));

        h.processor.handle_action(Action::Scan).await.unwrap();
        let peer = h.processor.state().peers().peers()[0].id.clone();

        h.processor
            .handle_action(Action::Connect(peer.clone()))
            .await
            .unwrap();
        assert_eq!(
            h.processor.state().peers().status(&peer),
            Some(ConnectionStatus::Pending)
        );

        h.pump().await;
        assert_eq!(
            h.processor.state().peers().status(&peer),
            Some(ConnectionStatus::Connected)
        );

        h.processor
            .handle_action(Action::OpenChat(peer.clone()))
            .await
            .unwrap();
        h.processor
            .handle_action(Action::Send("hello".to_string()))
            .await
            .unwrap();
        h.pump().await;

        let entries = h.processor.state().conversations().entries(&peer);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "hello");
        assert_eq!(entries[1].text, "Thanks for your message!");

        let sent = h.processor.transport().sent_messages();
        assert_eq!(sent[0].1.from, "Me");
        assert_eq!(sent[0].1.content, "hello");

        h.processor.handle_action(Action::Disconnect).await.unwrap();
        assert!(h.processor.state().conversations().entries(&peer).is_empty());
        assert_eq!(h.processor.state().screen(), &Screen::Discovery);
    }

    #[tokio::test]
    async fn test_scan_before_setup_is_rejected() {
        let mut h = harness(&["Alice"]);
        let err = h.processor.handle_action(Action::Scan).await.unwrap_err();
        assert!(matches!(err, ChatError::ProfileIncomplete));
        assert!(h.processor.state().peers().is_empty());
    }

    #[tokio::test]
    async fn test_scan_with_nobody_around_notifies() {
        let mut h = harness(&[]);
        h.setup_profile().await;
        let err = h.processor.handle_action(Action::Scan).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));

        let notice = h.processor.state().notification(Utc::now()).unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("No Proximity Chat users found"));
    }

    #[tokio::test]
    async fn test_connect_twice_is_invalid() {
        let mut h = harness(&["Alice"]);
        h.setup_profile().await;
        h.processor.handle_action(Action::Scan).await.unwrap();
        let peer = PeerId::from("sim-1");

        h.processor
            .handle_action(Action::Connect(peer.clone()))
            .await
            .unwrap();
        let err = h
            .processor
            .handle_action(Action::Connect(peer))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn test_incoming_request_accept_and_decline() {
        let mut h = harness(&["Alice"]);
        h.setup_profile().await;
        h.processor.handle_action(Action::Scan).await.unwrap();
        let peer = PeerId::from("sim-1");

        h.processor
            .handle_peer_event(PeerEvent::ConnectionRequested { peer: peer.clone() })
            .await
            .unwrap();
        h.processor
            .handle_action(Action::Decline(peer.clone()))
            .await
            .unwrap();
        assert_eq!(
            h.processor.state().peers().status(&peer),
            Some(ConnectionStatus::Available)
        );

        h.processor
            .handle_peer_event(PeerEvent::ConnectionRequested { peer: peer.clone() })
            .await
            .unwrap();
        h.processor
            .handle_action(Action::Accept(peer.clone()))
            .await
            .unwrap();
        assert_eq!(
            h.processor.state().peers().status(&peer),
            Some(ConnectionStatus::Connected)
        );
    }

    #[tokio::test]
    async fn test_cannot_accept_own_request() {
        let mut h = harness(&["Alice"]);
        h.setup_profile().await;
        h.processor.handle_action(Action::Scan).await.unwrap();
        let peer = PeerId::from("sim-1");

        h.processor
            .handle_action(Action::Connect(peer.clone()))
            .await
            .unwrap();
        assert!(h.processor.handle_action(Action::Accept(peer)).await.is_err());
    }

    #[tokio::test]
    async fn test_remote_disconnect_closes_chat() {
        let mut h = harness(&["Alice"]);
        h.setup_profile().await;
        h.processor.handle_action(Action::Scan).await.unwrap();
        let peer = PeerId::from("sim-1");
        h.processor
            .handle_action(Action::Connect(peer.clone()))
            .await
            .unwrap();
        h.pump().await;
        h.processor
            .handle_action(Action::OpenChat(peer.clone()))
            .await
            .unwrap();

        h.processor
            .handle_peer_event(PeerEvent::Disconnected { peer: peer.clone() })
            .await
            .unwrap();
        assert_eq!(h.processor.state().screen(), &Screen::Discovery);
        assert_eq!(
            h.processor.state().peers().status(&peer),
            Some(ConnectionStatus::Available)
        );
    }

    #[tokio::test]
    async fn test_reply_after_disconnect_is_dropped() {
        let mut h = harness(&["Alice"]);
        h.setup_profile().await;
        h.processor.handle_action(Action::Scan).await.unwrap();
        let peer = PeerId::from("sim-1");
        h.processor
            .handle_action(Action::Connect(peer.clone()))
            .await
            .unwrap();
        h.pump().await;
        h.processor
            .handle_action(Action::OpenChat(peer.clone()))
            .await
            .unwrap();
        h.processor
            .handle_action(Action::Send("hello".to_string()))
            .await
            .unwrap();
        h.processor.handle_action(Action::Disconnect).await.unwrap();

        // The transport holds back the canned reply once the link is gone.
        let late = tokio::time::timeout(Duration::from_millis(50), h.events.recv()).await;
        assert!(late.is_err());

        // A reply that slipped through anyway is ignored quietly.
        h.processor
            .handle_peer_event(PeerEvent::MessageReceived {
                peer: peer.clone(),
                text: "Thanks for your message!".to_string(),
                timestamp_millis: 0,
            })
            .await
            .unwrap();
        assert!(h.processor.state().conversations().entries(&peer).is_empty());
        let notice = h.processor.state().notification(Utc::now()).unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(notice.message, "Disconnected from chat");
    }

    #[tokio::test]
    async fn test_message_from_unknown_peer() {
        let mut h = harness(&["Alice"]);
        h.setup_profile().await;
        let err = h
            .processor
            .handle_peer_event(PeerEvent::MessageReceived {
                peer: PeerId::from("ghost"),
                text: "boo".to_string(),
                timestamp_millis: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::UnknownPeer(_)));
    }
}
