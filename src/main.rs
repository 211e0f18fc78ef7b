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

//! Proximity Chat terminal application

use anyhow::Result;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proximity_chat::bluetooth::{PeerEvent, PeerTransport, SimulatedTransport};
use proximity_chat::camera::{FilePhotoSource, PhotoSource};
use proximity_chat::config::{Backend, Config};
use proximity_chat::ui::{self, Command};
use proximity_chat::{AppState, Controller, EventProcessor, StateChange};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("proximity_chat=info".parse()?),
        )
        .init();

    info!("Starting Proximity Chat v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded from {:?}", Config::default_path());

    // Create application state
    let (change_tx, change_rx) = mpsc::unbounded_channel::<StateChange>();
    let mut controller =
        Controller::new(AppState::default()).with_notice_times(config.notice_times());
    controller.subscribe(change_tx);
    if let Some(name) = &config.profile.display_name {
        controller.set_name(name);
    }

    let photos = FilePhotoSource::new(config.profile.photo_path.clone());
    let (peer_tx, peer_rx) = mpsc::channel::<PeerEvent>(32);

    match config.bluetooth.backend {
        Backend::Simulated => {
            let transport = SimulatedTransport::new(config.simulation_settings(), peer_tx);
            run(EventProcessor::new(controller, transport, photos), peer_rx, change_rx).await?;
        }
        #[cfg(feature = "bluez")]
        Backend::Bluez => {
            let transport =
                proximity_chat::bluetooth::BluezTransport::new(config.scan_timeout(), peer_tx)
                    .await?;
            run(EventProcessor::new(controller, transport, photos), peer_rx, change_rx).await?;
        }
        #[cfg(not(feature = "bluez"))]
        Backend::Bluez => {
            anyhow::bail!("backend 'bluez' needs a build with the `bluez` feature");
        }
    }

    info!("Proximity Chat stopped");
    Ok(())
}

async fn run<T: PeerTransport, P: PhotoSource>(
    mut processor: EventProcessor<T, P>,
    mut peer_rx: mpsc::Receiver<PeerEvent>,
    mut change_rx: mpsc::UnboundedReceiver<StateChange>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", ui::HELP);
    redraw(processor.state());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match ui::parse_command(&line, processor.state()) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => println!("{}", ui::HELP),
                    Ok(Command::Action(action)) => {
                        if let Err(e) = processor.handle_action(action).await {
                            debug!("Action failed: {}", e);
                        }
                    }
                    Err(msg) if msg.is_empty() => {}
                    Err(msg) => println!("{}", msg),
                }
            }
            Some(event) = peer_rx.recv() => {
                if let Err(e) = processor.handle_peer_event(event).await {
                    debug!("Peer event failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }

        let mut changed = false;
        while change_rx.try_recv().is_ok() {
            changed = true;
        }
        if changed {
            redraw(processor.state());
        }
    }

    Ok(())
}

fn redraw(state: &AppState) {
    print!("\n{}", ui::format_view(&ui::render(state, Utc::now())));
}
