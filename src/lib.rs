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

//! Proximity Chat
//!
//! Set up a profile, discover nearby users over Bluetooth LE and chat with
//! one of them. A simulated transport plays the remote side when no real
//! peer is reachable.

pub mod bluetooth;
pub mod camera;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod events;
pub mod peers;
pub mod profile;
pub mod state;
pub mod ui;

pub use controller::Controller;
pub use error::{ChatError, Result};
pub use events::{Action, EventProcessor};
pub use state::{AppState, Screen, StateChange, StateObserver};
