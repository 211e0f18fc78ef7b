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

//! JSON payloads carried by the GATT characteristics.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::peers::{PeerDescriptor, PeerId};
use crate::profile::{Photo, UserProfile};

/// Contents of the profile characteristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub name: String,
    /// Photo as a `data:` URL.
    pub photo: String,
}

impl ProfilePayload {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.display_name.clone(),
            photo: profile.photo.to_data_url(),
        }
    }

    /// Turn a remote profile into a registry descriptor.
    ///
    /// A photo that fails to decode is dropped rather than rejecting the peer.
    pub fn into_descriptor(self, id: PeerId, distance_label: &str) -> PeerDescriptor {
        let photo = Photo::from_data_url(&self.photo).ok();
        PeerDescriptor {
            id,
            display_name: self.name,
            photo,
            distance_label: distance_label.to_string(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Contents written to the message characteristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub from: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl MessagePayload {
    /// Create a payload stamped now.
    pub fn new(from: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
