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

//! BLE GATT client transport backed by BlueZ.
//!
//! Discovery scans for devices exposing [`SERVICE_UUID`], connects and reads
//! the profile characteristic. Messages are written to the message
//! characteristic. There is no acceptance handshake on top of GATT, so a
//! request is accepted as soon as the link is up.

use async_trait::async_trait;
use bluer::gatt::remote::Characteristic;
use bluer::{Adapter, AdapterEvent, Device, ErrorKind};
use futures::{pin_mut, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::ble_constants::*;
use super::protocol::{MessagePayload, ProfilePayload};
use super::transport::{PeerEvent, PeerTransport};
use crate::error::{ChatError, Result};
use crate::peers::{PeerDescriptor, PeerId};
use crate::profile::UserProfile;

impl From<bluer::Error> for ChatError {
    fn from(err: bluer::Error) -> Self {
        match err.kind {
            ErrorKind::NotAuthorized | ErrorKind::NotPermitted => {
                ChatError::PermissionDenied("Bluetooth".to_string())
            }
            ErrorKind::NotFound | ErrorKind::DoesNotExist => ChatError::NotFound(err.message),
            _ => ChatError::TransportFailure(err.to_string()),
        }
    }
}

/// GATT client over the default BlueZ adapter.
pub struct BluezTransport {
    adapter: Adapter,
    scan_timeout: Duration,
    event_tx: mpsc::Sender<PeerEvent>,
    devices: Mutex<HashMap<PeerId, Device>>,
}

impl BluezTransport {
    /// Open a BlueZ session and power on the default adapter.
    pub async fn new(scan_timeout: Duration, event_tx: mpsc::Sender<PeerEvent>) -> Result<Self> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        adapter.set_powered(true).await?;
        info!("Using Bluetooth adapter {}", adapter.name());

        Ok(Self {
            adapter,
            scan_timeout,
            event_tx,
            devices: Mutex::new(HashMap::new()),
        })
    }

    fn device(&self, peer: &PeerId) -> Result<Device> {
        self.devices
            .lock()
            .get(peer)
            .cloned()
            .ok_or_else(|| ChatError::UnknownPeer(peer.clone()))
    }

    /// Wait for the first device that advertises our service.
    async fn find_device(&self) -> Result<Device> {
        let events = self.adapter.discover_devices().await?;
        pin_mut!(events);

        while let Some(event) = events.next().await {
            if let AdapterEvent::DeviceAdded(addr) = event {
                let device = self.adapter.device(addr)?;
                let uuids = device.uuids().await?.unwrap_or_default();
                if uuids.contains(&SERVICE_UUID) {
                    debug!("Device {} exposes the chat service", addr);
                    return Ok(device);
                }
            }
        }

        Err(ChatError::NotFound("Bluetooth discovery ended".to_string()))
    }

    async fn characteristic(device: &Device, uuid: uuid::Uuid) -> Result<Characteristic> {
        if !device.is_connected().await? {
            device.connect().await?;
        }
        for service in device.services().await? {
            if service.uuid().await? != SERVICE_UUID {
                continue;
            }
            for characteristic in service.characteristics().await? {
                if characteristic.uuid().await? == uuid {
                    return Ok(characteristic);
                }
            }
        }
        Err(ChatError::NotFound(format!(
            "characteristic {} not found on {}",
            uuid,
            device.address()
        )))
    }
}

#[async_trait]
impl PeerTransport for BluezTransport {
    fn name(&self) -> &'static str {
        "bluez"
    }

    async fn publish_profile(&self, profile: &UserProfile) -> Result<()> {
        // Peers only find us while they scan; we have no GATT server of our own.
        info!("Discoverable via scanning as '{}'", profile.display_name);
        Ok(())
    }

    async fn discover(&self) -> Result<PeerDescriptor> {
        info!("Scanning for Proximity Chat users...");
        let device = tokio::time::timeout(self.scan_timeout, self.find_device())
            .await
            .map_err(|_| {
                ChatError::NotFound(
                    "No Proximity Chat users found nearby. Make sure they have the app open."
                        .to_string(),
                )
            })??;

        let profile_char = Self::characteristic(&device, PROFILE_CHARACTERISTIC_UUID).await?;
        let payload = ProfilePayload::from_bytes(&profile_char.read().await?)?;
        let rssi = device.rssi().await.unwrap_or(None);

        let id = PeerId::new(device.address().to_string());
        info!("Proximity Chat user found: {} ({})", payload.name, id);
        self.devices.lock().insert(id.clone(), device);

        Ok(payload.into_descriptor(id, distance_label(rssi)))
    }

    async fn request_connection(&self, peer: &PeerId) -> Result<()> {
        let device = self.device(peer)?;
        if !device.is_connected().await? {
            device.connect().await?;
        }
        let _ = self
            .event_tx
            .send(PeerEvent::ConnectionAccepted { peer: peer.clone() })
            .await;
        Ok(())
    }

    async fn accept_connection(&self, peer: &PeerId) -> Result<()> {
        let device = self.device(peer)?;
        if !device.is_connected().await? {
            device.connect().await?;
        }
        Ok(())
    }

    async fn decline_connection(&self, peer: &PeerId) -> Result<()> {
        self.disconnect(peer).await
    }

    async fn write_message(&self, peer: &PeerId, message: &MessagePayload) -> Result<()> {
        let device = self.device(peer)?;
        let message_char = Self::characteristic(&device, MESSAGE_CHARACTERISTIC_UUID).await?;
        message_char.write(&message.to_bytes()?).await?;
        debug!("Message sent via Bluetooth to {}", peer);
        Ok(())
    }

    async fn disconnect(&self, peer: &PeerId) -> Result<()> {
        let device = self.device(peer)?;
        if let Err(e) = device.disconnect().await {
            warn!("Disconnect from {} failed: {}", peer, e);
        }
        Ok(())
    }
}
