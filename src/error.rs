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

//! Error types for the chat core and its platform collaborators.

use thiserror::Error;

use crate::peers::{ConnectionStatus, PeerId};

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Everything that can go wrong while chatting.
///
/// None of these are fatal: the event processor turns each one into a
/// transient error notification and leaves the state machine where it was.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Camera or Bluetooth access was refused.
    #[error("{0} access denied. Please enable the permission and try again.")]
    PermissionDenied(String),

    /// No matching peer (or resource) was found.
    #[error("{0}")]
    NotFound(String),

    /// A connection action was requested on a peer in the wrong status.
    #[error("cannot {action} peer {peer} while it is {from}")]
    InvalidStateTransition {
        peer: PeerId,
        from: ConnectionStatus,
        action: &'static str,
    },

    /// Sending or reading over the peer transport failed.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// The peer id is not in the registry.
    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),

    /// Proceeding past setup without both name and photo.
    #[error("profile needs a name and a photo before continuing")]
    ProfileIncomplete,

    /// A chat action was requested with no chat open.
    #[error("no chat is open")]
    NoActiveChat,

    /// A payload received from a peer could not be decoded.
    #[error("malformed payload: {0}")]
    Protocol(String),
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Protocol(err.to_string())
    }
}
