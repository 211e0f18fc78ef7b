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

//! BLE service and characteristic UUIDs for Proximity Chat.

use uuid::Uuid;

/// Proximity Chat GATT service UUID. Only devices exposing it are discovered.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x12345678_1234_1234_1234_123456789abc);

/// Profile characteristic UUID (JSON `{name, photo}`).
/// Properties: Read
pub const PROFILE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x12345678_1234_1234_1234_123456789abd);

/// Message characteristic UUID (JSON `{from, content, timestamp}`).
/// Properties: Write
pub const MESSAGE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x12345678_1234_1234_1234_123456789abe);

/// Label used when signal strength is unknown.
pub const DEFAULT_DISTANCE_LABEL: &str = "Nearby";

/// Rough distance label from a received signal strength.
pub fn distance_label(rssi: Option<i16>) -> &'static str {
    match rssi {
        Some(rssi) if rssi >= -55 => "Very close",
        Some(rssi) if rssi >= -75 => DEFAULT_DISTANCE_LABEL,
        Some(_) => "Far away",
        None => DEFAULT_DISTANCE_LABEL,
    }
}
