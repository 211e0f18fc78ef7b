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

//! UI module: view models and the terminal front end.

mod terminal;
mod view;

pub use terminal::{format_view, parse_command, Command, HELP};
pub use view::{
    render, CardAction, ChatView, DiscoveryView, MessageView, NoticeView, PeerCard,
    ProfileSetupView, Rendered, View,
};
