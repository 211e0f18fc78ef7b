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

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::bluetooth::{SimulatedPeer, SimulationSettings};
use crate::camera::mime_for;
use crate::profile::Photo;
use crate::state::NoticeTimes;

const APP_DIR: &str = "proximity-chat";
const MAX_NOTICE_TTL_MS: u64 = 60 * 60 * 1000;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Profile presets.
    pub profile: ProfileConfig,

    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,

    /// Simulated peers, used by the `simulated` backend.
    pub demo: DemoConfig,

    /// Notification settings.
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Name filled in at startup.
    pub display_name: Option<String>,

    /// Photo used when `photo` is given without a path.
    pub photo_path: Option<PathBuf>,
}

/// Which peer transport to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Simulated,
    Bluez,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    pub backend: Backend,

    /// How long a scan waits for a peer, in seconds.
    pub scan_timeout_secs: u64,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Simulated,
            scan_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Delay before a simulated peer accepts, in milliseconds.
    pub accept_delay_ms: u64,

    /// Delay before a simulated peer replies, in milliseconds.
    pub reply_delay_ms: u64,

    pub reply_text: String,

    pub peers: Vec<DemoPeerConfig>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let defaults = SimulationSettings::default();
        Self {
            accept_delay_ms: defaults.accept_delay.as_millis() as u64,
            reply_delay_ms: defaults.reply_delay.as_millis() as u64,
            reply_text: defaults.reply_text,
            peers: vec![
                DemoPeerConfig {
                    name: "Alice".to_string(),
                    photo_path: None,
                },
                DemoPeerConfig {
                    name: "Bob".to_string(),
                    photo_path: None,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoPeerConfig {
    pub name: String,
    pub photo_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub info_ttl_ms: u64,
    pub error_ttl_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            info_ttl_ms: 3000,
            error_ttl_ms: 5000,
        }
    }
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Load configuration from the default file or create it.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from `path`, writing defaults there if missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.bluetooth.scan_timeout_secs)
    }

    /// Notice durations. Values above an hour fall back to the defaults.
    pub fn notice_times(&self) -> NoticeTimes {
        let defaults = NoticeTimes::default();
        NoticeTimes {
            info: notice_ttl("info_ttl_ms", self.notifications.info_ttl_ms, defaults.info),
            error: notice_ttl("error_ttl_ms", self.notifications.error_ttl_ms, defaults.error),
        }
    }

    /// Settings for the simulated transport. Unreadable demo photos are
    /// skipped with a warning.
    pub fn simulation_settings(&self) -> SimulationSettings {
        let peers = self
            .demo
            .peers
            .iter()
            .map(|peer| SimulatedPeer {
                name: peer.name.clone(),
                photo: peer.photo_path.as_deref().and_then(load_photo),
            })
            .collect();

        SimulationSettings {
            accept_delay: Duration::from_millis(self.demo.accept_delay_ms),
            reply_delay: Duration::from_millis(self.demo.reply_delay_ms),
            reply_text: self.demo.reply_text.clone(),
            peers,
        }
    }
}

fn notice_ttl(key: &str, millis: u64, fallback: chrono::Duration) -> chrono::Duration {
    if millis > MAX_NOTICE_TTL_MS {
        warn!(
            "notifications.{} = {} is out of range, using {} ms",
            key,
            millis,
            fallback.num_milliseconds()
        );
        return fallback;
    }
    chrono::Duration::milliseconds(millis as i64)
}

fn load_photo(path: &Path) -> Option<Photo> {
    let Some(mime) = mime_for(path) else {
        warn!("Unsupported demo photo type: {:?}", path);
        return None;
    };
    match std::fs::read(path) {
        Ok(bytes) => Some(Photo::new(mime, bytes)),
        Err(e) => {
            warn!("Failed to read demo photo {:?}: {}", path, e);
            None
        }
    }
}
