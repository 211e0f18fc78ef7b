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

//! Line-oriented terminal front end.

use std::fmt::Write;
use std::path::PathBuf;

use super::view::{CardAction, Rendered, View};
use crate::conversation::Direction;
use crate::events::Action;
use crate::peers::PeerId;
use crate::state::{AppState, NoticeLevel, Screen};

pub const HELP: &str = "\
Commands:
  name <text>        set your display name
  photo [path]       take your profile photo
  retake             discard the photo
  continue           start discovering
  scan               look for nearby users
  connect <n|id>     send a connection request
  accept <n|id>      accept a request
  decline <n|id>     decline a request
  open <n|id>        open the chat with a connected user
  send <text>        send a message (plain text works in a chat)
  back               leave the chat
  disconnect         end the current chat
  help               show this help
  quit               exit";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(Action),
    Help,
    Quit,
}

/// Parse an input line against the current state.
///
/// Peers can be named by their list number or their id.
pub fn parse_command(line: &str, state: &AppState) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Err(String::new());
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let peer = |rest: &str| resolve_peer(rest, state);

    let action = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "name" => Action::SetName(rest.to_string()),
        "photo" => Action::CapturePhoto((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "retake" => Action::RetakePhoto,
        "continue" => Action::Continue,
        "scan" | "refresh" => Action::Scan,
        "connect" => Action::Connect(peer(rest)?),
        "accept" => Action::Accept(peer(rest)?),
        "decline" | "reject" => Action::Decline(peer(rest)?),
        "open" => Action::OpenChat(peer(rest)?),
        "send" => Action::Send(rest.to_string()),
        "back" => Action::Back,
        "disconnect" => Action::Disconnect,
        _ if matches!(state.screen(), Screen::Chat { .. }) => Action::Send(line.to_string()),
        _ => return Err(format!("Unknown command '{}'. Type 'help'.", word)),
    };
    Ok(Command::Action(action))
}

fn resolve_peer(arg: &str, state: &AppState) -> Result<PeerId, String> {
    if arg.is_empty() {
        return Err("Which user? Give a list number or id.".to_string());
    }
    let peers = state.peers().peers();
    if let Ok(n) = arg.parse::<usize>() {
        if let Some(peer) = n.checked_sub(1).and_then(|i| peers.get(i)) {
            return Ok(peer.id.clone());
        }
    }
    Ok(PeerId::new(arg))
}

/// Format a rendered view as text.
pub fn format_view(rendered: &Rendered) -> String {
    let mut out = String::new();

    match &rendered.view {
        View::ProfileSetup(view) => {
            let _ = writeln!(out, "== Profile setup ==");
            let _ = writeln!(out, "Name:  {}", view.name.as_deref().unwrap_or("(not set)"));
            let _ = writeln!(out, "Photo: {}", if view.has_photo { "captured" } else { "(none)" });
            if view.can_continue {
                let _ = writeln!(out, "Type 'continue' to find nearby users.");
            }
        }
        View::Discovery(view) => {
            let _ = writeln!(out, "== Nearby users ({}) ==", view.user_name);
            if view.is_empty() {
                let _ = writeln!(out, "No one yet. Type 'scan' to look around.");
            }
            for card in &view.peers {
                let hint = match card.action {
                    Some(CardAction::Connect) => "connect",
                    Some(CardAction::Respond) => "accept / decline",
                    Some(CardAction::OpenChat) => "open",
                    None => "waiting",
                };
                let _ = writeln!(
                    out,
                    "{:>2}. {:<20} {:<10} [{}]  {}",
                    card.index, card.name, card.distance, card.status, hint
                );
            }
        }
        View::Chat(view) => {
            let _ = writeln!(out, "== {} ({}) ==", view.peer_name, view.status_label);
            for msg in &view.messages {
                match msg.direction {
                    Direction::Sent => {
                        let _ = writeln!(
                            out,
                            "  {:>50}  {} {}",
                            msg.text,
                            msg.time,
                            msg.status.as_deref().unwrap_or_default()
                        );
                    }
                    Direction::Received => {
                        let _ = writeln!(out, "  {}  {}", msg.text, msg.time);
                    }
                }
            }
        }
    }

    if let Some(notice) = &rendered.notice {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        let _ = writeln!(out, "[{}] {}", tag, notice.message);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use crate::peers::PeerDescriptor;
    use crate::profile::Photo;
    use crate::ui::render;
    use chrono::Utc;

    fn discovery() -> Controller {
        let mut controller = Controller::default();
        controller.set_name("Me");
        controller.set_photo(Photo::new("image/png", vec![1]));
        controller.proceed().unwrap();
        controller.add_or_update_peer(PeerDescriptor {
            id: PeerId::from("dev-9"),
            display_name: "Alice".to_string(),
            photo: None,
            distance_label: "Nearby".to_string(),
        });
        controller
    }

    #[test]
    fn test_parse_basic_commands() {
        let controller = Controller::default();
        let state = controller.state();
        assert_eq!(parse_command("quit", state), Ok(Command::Quit));
        assert_eq!(
            parse_command("name  Jo Doe ", state),
            Ok(Command::Action(Action::SetName("Jo Doe".to_string())))
        );
        assert_eq!(
            parse_command("photo", state),
            Ok(Command::Action(Action::CapturePhoto(None)))
        );
        assert_eq!(
            parse_command("photo /tmp/me.png", state),
            Ok(Command::Action(Action::CapturePhoto(Some(PathBuf::from("/tmp/me.png")))))
        );
        assert!(parse_command("dance", state).is_err());
    }

    #[test]
    fn test_parse_peer_by_index_or_id() {
        let controller = discovery();
        let state = controller.state();
        assert_eq!(
            parse_command("connect 1", state),
            Ok(Command::Action(Action::Connect(PeerId::from("dev-9"))))
        );
        assert_eq!(
            parse_command("open dev-9", state),
            Ok(Command::Action(Action::OpenChat(PeerId::from("dev-9"))))
        );
        assert!(parse_command("connect", state).is_err());
    }

    #[test]
    fn test_plain_text_sends_in_chat() {
        let mut controller = discovery();
        let id = PeerId::from("dev-9");
        controller.request_connection(&id).unwrap();
        controller.accept_connection(&id).unwrap();
        controller.open_chat(&id).unwrap();

        assert_eq!(
            parse_command("hello there", controller.state()),
            Ok(Command::Action(Action::Send("hello there".to_string())))
        );
    }

    #[test]
    fn test_format_discovery() {
        let mut controller = discovery();
        controller.info("Found Alice!");
        let text = format_view(&render(controller.state(), Utc::now()));
        assert!(text.contains("Nearby users (Me)"));
        assert!(text.contains("Alice"));
        assert!(text.contains("[available]"));
        assert!(text.contains("[info] Found Alice!"));
    }
}
