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

//! Profile photo capture.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ChatError, Result};
use crate::profile::Photo;

/// Produces a still image for the profile.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Capture a photo. `selection` is an optional user-picked location that
    /// sources without one may ignore.
    async fn capture(&self, selection: Option<&Path>) -> Result<Photo>;
}

/// Reads the photo from an image file.
#[derive(Debug, Clone, Default)]
pub struct FilePhotoSource {
    default_path: Option<PathBuf>,
}

impl FilePhotoSource {
    pub fn new(default_path: Option<PathBuf>) -> Self {
        Self { default_path }
    }
}

/// MIME type for an image file extension.
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[async_trait]
impl PhotoSource for FilePhotoSource {
    async fn capture(&self, selection: Option<&Path>) -> Result<Photo> {
        let path = selection
            .or(self.default_path.as_deref())
            .ok_or_else(|| ChatError::NotFound("no photo selected".to_string()))?;

        let mime = mime_for(path).ok_or_else(|| {
            ChatError::Protocol(format!("unsupported image type: {}", path.display()))
        })?;

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => ChatError::PermissionDenied("Camera".to_string()),
            ErrorKind::NotFound => ChatError::NotFound(format!("{} not found", path.display())),
            _ => ChatError::TransportFailure(e.to_string()),
        })?;

        if bytes.is_empty() {
            return Err(ChatError::Protocol(format!("{} is empty", path.display())));
        }

        info!("Captured photo from {:?} ({} bytes)", path, bytes.len());
        Ok(Photo::new(mime, bytes))
    }
}
