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

//! Screen and connection state controller.
//!
//! Every mutation of [`AppState`] goes through here. Successful mutations are
//! reported to the registered observers; failed ones leave the state as it
//! was and return the error.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::conversation::ConversationEntry;
use crate::error::{ChatError, Result};
use crate::peers::{ConnectionStatus, PeerDescriptor, PeerId, Upsert};
use crate::profile::{Photo, UserProfile};
use crate::state::{
    AppState, NoticeLevel, NoticeTimes, Notification, Screen, StateChange, StateObserver,
};

/// Owns the session state and drives its transitions.
pub struct Controller {
    state: AppState,
    notice_times: NoticeTimes,
    observers: Vec<Box<dyn StateObserver>>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Controller {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            notice_times: NoticeTimes::default(),
            observers: Vec::new(),
        }
    }

    pub fn with_notice_times(mut self, times: NoticeTimes) -> Self {
        self.notice_times = times;
        self
    }

    /// Register an observer for state changes.
    pub fn subscribe(&mut self, observer: impl StateObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn emit(&mut self, change: StateChange) {
        for observer in &mut self.observers {
            observer.on_change(&change);
        }
    }

    fn set_screen(&mut self, screen: Screen) {
        if self.state.screen != screen {
            debug!("Screen: {} -> {}", self.state.screen.as_str(), screen.as_str());
            self.state.screen = screen.clone();
            self.emit(StateChange::ScreenChanged(screen));
        }
    }

    // --- profile setup ---

    pub fn set_name(&mut self, name: &str) -> bool {
        let changed = self.state.profile.set_name(name);
        if changed {
            self.emit(StateChange::ProfileChanged);
        }
        changed
    }

    pub fn set_photo(&mut self, photo: Photo) -> bool {
        let changed = self.state.profile.set_photo(photo);
        if changed {
            self.emit(StateChange::ProfileChanged);
        }
        changed
    }

    pub fn clear_photo(&mut self) -> bool {
        let changed = self.state.profile.clear_photo();
        if changed {
            self.emit(StateChange::ProfileChanged);
        }
        changed
    }

    /// ProfileSetup -> Discovery, once the profile is complete.
    pub fn proceed(&mut self) -> Result<UserProfile> {
        if self.state.profile.is_locked() {
            return self.state.profile.profile().ok_or(ChatError::ProfileIncomplete);
        }
        let profile = self.state.profile.lock()?;
        info!("Profile complete for {}", profile.display_name);
        self.set_screen(Screen::Discovery);
        Ok(profile)
    }

    // --- peers ---

    pub fn add_or_update_peer(&mut self, descriptor: PeerDescriptor) -> Upsert {
        let id = descriptor.id.clone();
        let outcome = self.state.peers.add_or_update_peer(descriptor);
        if matches!(outcome, Upsert::Added | Upsert::Updated) {
            self.emit(StateChange::PeerUpdated(id));
        }
        outcome
    }

    fn status_changed(&mut self, peer: &PeerId, status: ConnectionStatus) {
        self.emit(StateChange::PeerStatusChanged {
            peer: peer.clone(),
            status,
        });
    }

    /// Ask a peer to connect: available -> pending.
    pub fn request_connection(&mut self, peer: &PeerId) -> Result<()> {
        self.state.peers.request_connection(peer)?;
        self.status_changed(peer, ConnectionStatus::Pending);
        Ok(())
    }

    /// A peer asked us to connect: available -> pending.
    pub fn receive_request(&mut self, peer: &PeerId) -> Result<()> {
        self.state.peers.receive_request(peer)?;
        self.status_changed(peer, ConnectionStatus::Pending);
        Ok(())
    }

    /// pending -> connected.
    pub fn accept_connection(&mut self, peer: &PeerId) -> Result<()> {
        self.state.peers.accept_connection(peer)?;
        self.status_changed(peer, ConnectionStatus::Connected);
        Ok(())
    }

    /// pending -> available.
    pub fn decline(&mut self, peer: &PeerId) -> Result<()> {
        self.state.peers.decline(peer)?;
        self.status_changed(peer, ConnectionStatus::Available);
        Ok(())
    }

    /// connected -> available. Drops the conversation and closes its chat.
    pub fn disconnect(&mut self, peer: &PeerId) -> Result<()> {
        self.state.peers.disconnect(peer)?;
        self.status_changed(peer, ConnectionStatus::Available);

        self.state.conversations.clear(peer);
        self.emit(StateChange::ConversationCleared(peer.clone()));

        if matches!(&self.state.screen, Screen::Chat { peer: active } if active == peer) {
            self.set_screen(Screen::Discovery);
        }
        Ok(())
    }

    // --- navigation ---

    /// Discovery -> Chat with a connected peer.
    pub fn open_chat(&mut self, peer: &PeerId) -> Result<()> {
        if self.state.screen == Screen::ProfileSetup {
            return Err(ChatError::ProfileIncomplete);
        }
        let status = self
            .state
            .peers
            .status(peer)
            .ok_or_else(|| ChatError::UnknownPeer(peer.clone()))?;
        if status != ConnectionStatus::Connected {
            return Err(ChatError::InvalidStateTransition {
                peer: peer.clone(),
                from: status,
                action: "open a chat with",
            });
        }
        self.set_screen(Screen::Chat { peer: peer.clone() });
        Ok(())
    }

    /// Chat -> Discovery.
    pub fn back(&mut self) {
        if matches!(self.state.screen, Screen::Chat { .. }) {
            self.set_screen(Screen::Discovery);
        }
    }

    // --- messages ---

    /// Store a message to the open chat.
    ///
    /// Returns the stored entry and its peer so the caller can hand it to
    /// the transport, or `None` when the text is blank.
    pub fn send_message(&mut self, text: &str) -> Result<Option<(PeerId, ConversationEntry)>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let peer = match &self.state.screen {
            Screen::Chat { peer } => peer.clone(),
            _ => return Err(ChatError::NoActiveChat),
        };

        let entry = self.append(&peer, ConversationEntry::sent(text))?;
        Ok(Some((peer, entry)))
    }

    /// Store a message from a peer.
    pub fn receive_message(
        &mut self,
        peer: &PeerId,
        text: &str,
        timestamp_millis: i64,
    ) -> Result<()> {
        self.append(peer, ConversationEntry::received(text, timestamp_millis))?;
        Ok(())
    }

    fn append(&mut self, peer: &PeerId, entry: ConversationEntry) -> Result<ConversationEntry> {
        self.state
            .conversations
            .append_entry(&self.state.peers, peer, entry)?;
        let stored = self
            .state
            .conversations
            .entries(peer)
            .last()
            .cloned()
            .ok_or_else(|| ChatError::UnknownPeer(peer.clone()))?;
        self.emit(StateChange::EntryAppended {
            peer: peer.clone(),
            entry: stored.clone(),
        });
        Ok(stored)
    }

    // --- notifications ---

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let ttl = match level {
            NoticeLevel::Info => self.notice_times.info,
            NoticeLevel::Error => self.notice_times.error,
        };
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let notification = Notification {
            level,
            message: message.into(),
            expires_at,
        };
        self.state.notification = Some(notification.clone());
        self.emit(StateChange::Notified(notification));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(NoticeLevel::Info, message);
    }

    /// Surface an error to the user.
    pub fn report(&mut self, err: &ChatError) {
        warn!("{}", err);
        self.notify(NoticeLevel::Error, err.to_string());
    }

    /// Display name for a peer, falling back to its id.
    pub fn peer_name(&self, peer: &PeerId) -> String {
        self.state
            .peers
            .get(peer)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| peer.to_string())
    }
}
