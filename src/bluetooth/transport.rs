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

//! Peer transport seam.

use async_trait::async_trait;

use super::protocol::MessagePayload;
use crate::error::Result;
use crate::peers::{PeerDescriptor, PeerId};
use crate::profile::UserProfile;

/// Events a transport reports about remote peers.
///
/// The simulated and BlueZ backends only raise `ConnectionAccepted` and
/// `MessageReceived`. The other variants are for a backend that can
/// signal on its own, such as one running its own GATT server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A peer was found outside of an explicit scan.
    Discovered(PeerDescriptor),
    /// The peer asked to connect with us.
    ConnectionRequested { peer: PeerId },
    /// The peer accepted our request.
    ConnectionAccepted { peer: PeerId },
    /// The peer declined our request.
    ConnectionDeclined { peer: PeerId },
    /// The peer sent a chat message.
    MessageReceived {
        peer: PeerId,
        text: String,
        timestamp_millis: i64,
    },
    /// The link to the peer went away.
    Disconnected { peer: PeerId },
}

/// Finds peers and carries messages to them.
///
/// Implementations report remote activity through the `PeerEvent` channel
/// they were built with.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Make the local profile available to peers that read it.
    async fn publish_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Find one peer running the application and read its profile.
    async fn discover(&self) -> Result<PeerDescriptor>;

    /// Ask a peer to connect. Acceptance arrives as a `PeerEvent`.
    async fn request_connection(&self, peer: &PeerId) -> Result<()>;

    /// Tell a peer we accepted its request.
    async fn accept_connection(&self, peer: &PeerId) -> Result<()>;

    /// Tell a peer we declined its request.
    async fn decline_connection(&self, peer: &PeerId) -> Result<()>;

    /// Write a chat message to a connected peer.
    async fn write_message(&self, peer: &PeerId, message: &MessagePayload) -> Result<()>;

    /// Drop the link to a peer.
    async fn disconnect(&self, peer: &PeerId) -> Result<()>;
}
