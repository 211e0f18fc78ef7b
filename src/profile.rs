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

//! Local user profile.
//!
//! The profile only lives for the session. It is filled in during setup and
//! locked once the user moves on to discovery.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::peers::PeerId;

/// An image with its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photo")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Photo {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encode as a `data:` URL, the form peers exchange.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Decode a base64 `data:` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ChatError::Protocol("photo is not a data URL".to_string()))?;
        let (mime, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| ChatError::Protocol("photo data URL is not base64".to_string()))?;
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| ChatError::Protocol(format!("photo data URL: {}", e)))?;
        Ok(Self::new(mime, bytes))
    }
}

/// A completed user profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: PeerId,
    pub display_name: String,
    pub photo: Photo,
}

/// Holds the profile while it is being set up.
#[derive(Debug)]
pub struct ProfileStore {
    id: PeerId,
    name: Option<String>,
    photo: Option<Photo>,
    locked: bool,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore {
    /// Create an empty store with a fresh session id.
    pub fn new() -> Self {
        Self::with_id(PeerId::random())
    }

    pub fn with_id(id: PeerId) -> Self {
        Self {
            id,
            name: None,
            photo: None,
            locked: false,
        }
    }

    /// Session id of the local user.
    pub fn id(&self) -> &PeerId {
        &self.id
    }

    /// Set the display name. Blank names are ignored.
    pub fn set_name(&mut self, name: &str) -> bool {
        let name = name.trim();
        if self.locked || name.is_empty() {
            return false;
        }
        if self.name.as_deref() == Some(name) {
            return false;
        }
        debug!("Profile name set");
        self.name = Some(name.to_string());
        true
    }

    /// Set the photo. Empty images are ignored.
    pub fn set_photo(&mut self, photo: Photo) -> bool {
        if self.locked || photo.is_empty() {
            return false;
        }
        debug!("Profile photo set ({} bytes)", photo.bytes.len());
        self.photo = Some(photo);
        true
    }

    /// Drop the photo so a new one can be taken.
    pub fn clear_photo(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.photo.take().is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.photo.is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Freeze the profile. Returns the completed profile.
    pub fn lock(&mut self) -> Result<UserProfile> {
        let profile = self.profile().ok_or(ChatError::ProfileIncomplete)?;
        self.locked = true;
        Ok(profile)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    /// The profile, if both fields are set.
    pub fn profile(&self) -> Option<UserProfile> {
        match (&self.name, &self.photo) {
            (Some(name), Some(photo)) => Some(UserProfile {
                id: self.id.clone(),
                display_name: name.clone(),
                photo: photo.clone(),
            }),
            _ => None,
        }
    }
}
