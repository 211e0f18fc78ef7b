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

//! View models built from application state.
//!
//! [`render`] is a pure function of the state and the current time; front
//! ends redraw from its output instead of patching what they showed before.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::conversation::{ConversationEntry, Direction, STATUS_SENT};
use crate::peers::{ConnectionStatus, Peer, PeerId, RequestOrigin};
use crate::state::{AppState, NoticeLevel, Screen};

/// Everything a front end needs to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub view: View,
    pub notice: Option<NoticeView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    ProfileSetup(ProfileSetupView),
    Discovery(DiscoveryView),
    Chat(ChatView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSetupView {
    pub name: Option<String>,
    pub has_photo: bool,
    pub can_continue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryView {
    pub user_name: String,
    pub peers: Vec<PeerCard>,
}

impl DiscoveryView {
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// What selecting a peer card does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Connect,
    Respond,
    OpenChat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCard {
    /// 1-based position in the list.
    pub index: usize,
    pub id: PeerId,
    pub name: String,
    pub distance: String,
    pub status: ConnectionStatus,
    /// `None` while waiting on the other side.
    pub action: Option<CardAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub peer_name: String,
    pub status_label: &'static str,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub direction: Direction,
    pub text: String,
    /// Local `HH:MM`.
    pub time: String,
    /// Only shown for sent messages.
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    pub level: NoticeLevel,
    pub message: String,
}

/// Build the view for the current state.
pub fn render(state: &AppState, now: DateTime<Utc>) -> Rendered {
    let view = match state.screen() {
        Screen::ProfileSetup => View::ProfileSetup(ProfileSetupView {
            name: state.profile().name().map(str::to_string),
            has_photo: state.profile().photo().is_some(),
            can_continue: state.profile().is_complete(),
        }),
        Screen::Discovery => View::Discovery(DiscoveryView {
            user_name: state.profile().name().unwrap_or_default().to_string(),
            peers: state
                .peers()
                .peers()
                .iter()
                .enumerate()
                .map(|(i, peer)| peer_card(i + 1, peer))
                .collect(),
        }),
        Screen::Chat { peer } => View::Chat(ChatView {
            peer_name: state
                .peers()
                .get(peer)
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| peer.to_string()),
            status_label: "Connected",
            messages: state
                .conversations()
                .entries(peer)
                .iter()
                .map(message_view)
                .collect(),
        }),
    };

    let notice = state.notification(now).map(|n| NoticeView {
        level: n.level,
        message: n.message.clone(),
    });

    Rendered { view, notice }
}

fn peer_card(index: usize, peer: &Peer) -> PeerCard {
    let action = match (peer.status, peer.request) {
        (ConnectionStatus::Available, _) => Some(CardAction::Connect),
        (ConnectionStatus::Pending, Some(RequestOrigin::Incoming)) => Some(CardAction::Respond),
        (ConnectionStatus::Pending, _) => None,
        (ConnectionStatus::Connected, _) => Some(CardAction::OpenChat),
    };
    PeerCard {
        index,
        id: peer.id.clone(),
        name: peer.display_name.clone(),
        distance: peer.distance_label.clone(),
        status: peer.status,
        action,
    }
}

fn message_view(entry: &ConversationEntry) -> MessageView {
    let time = Utc
        .timestamp_millis_opt(entry.timestamp_millis)
        .single()
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default();
    let status = match entry.direction {
        Direction::Sent => Some(
            entry
                .delivery_status
                .clone()
                .unwrap_or_else(|| STATUS_SENT.to_string()),
        ),
        Direction::Received => None,
    };
    MessageView {
        direction: entry.direction,
        text: entry.text.clone(),
        time,
        status,
    }
}
