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

//! Bluetooth peer discovery and transport.
//!
//! The simulated transport is always available; the BlueZ GATT client is
//! behind the `bluez` feature.

pub mod ble_constants;
#[cfg(feature = "bluez")]
mod bluez;
pub mod protocol;
mod simulated;
mod transport;

#[cfg(feature = "bluez")]
pub use bluez::BluezTransport;
pub use protocol::{MessagePayload, ProfilePayload};
pub use simulated::{SimulatedPeer, SimulatedTransport, SimulationSettings};
pub use transport::{PeerEvent, PeerTransport};
