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

//! Application state management.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;

use crate::conversation::{ConversationEntry, ConversationStore};
use crate::peers::{ConnectionStatus, Peer, PeerId, PeerRegistry};
use crate::profile::ProfileStore;

/// Which screen is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    ProfileSetup,
    Discovery,
    /// Chat with exactly one peer.
    Chat { peer: PeerId },
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::ProfileSetup => "profile-setup",
            Screen::Discovery => "discovery",
            Screen::Chat { .. } => "chat",
        }
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// How long notifications stay up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeTimes {
    pub info: Duration,
    pub error: Duration,
}

impl Default for NoticeTimes {
    fn default() -> Self {
        Self {
            info: Duration::milliseconds(3000),
            error: Duration::milliseconds(5000),
        }
    }
}

/// A change observers get told about after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    ProfileChanged,
    ScreenChanged(Screen),
    PeerUpdated(PeerId),
    PeerStatusChanged {
        peer: PeerId,
        status: ConnectionStatus,
    },
    EntryAppended {
        peer: PeerId,
        entry: ConversationEntry,
    },
    ConversationCleared(PeerId),
    Notified(Notification),
}

/// Something that re-renders when state changes.
pub trait StateObserver: Send {
    fn on_change(&mut self, change: &StateChange);
}

impl StateObserver for mpsc::UnboundedSender<StateChange> {
    fn on_change(&mut self, change: &StateChange) {
        // A closed receiver just means nobody is rendering any more.
        let _ = self.send(change.clone());
    }
}

/// Session state.
///
/// Owned by the controller; read by the view layer.
#[derive(Debug)]
pub struct AppState {
    pub(crate) screen: Screen,
    pub(crate) profile: ProfileStore,
    pub(crate) peers: PeerRegistry,
    pub(crate) conversations: ConversationStore,
    pub(crate) notification: Option<Notification>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ProfileStore::new())
    }
}

impl AppState {
    pub fn new(profile: ProfileStore) -> Self {
        let peers = PeerRegistry::new(profile.id().clone());
        Self {
            screen: Screen::ProfileSetup,
            profile,
            peers,
            conversations: ConversationStore::new(),
            notification: None,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// The peer whose chat is open.
    pub fn active_peer(&self) -> Option<&Peer> {
        match &self.screen {
            Screen::Chat { peer } => self.peers.get(peer),
            _ => None,
        }
    }

    /// The current notification, unless it has expired.
    pub fn notification(&self, now: DateTime<Utc>) -> Option<&Notification> {
        self.notification.as_ref().filter(|n| !n.is_expired(now))
    }
}
