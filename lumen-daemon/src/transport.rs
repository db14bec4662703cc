//! Newline-delimited JSON over stdin/stdout
//!
//! Each stdin line is either a client command
//! (`{"command":"mode-set","mode":"manual"}`) or a sensor shortcut that
//! simulates the fixture driver (`{"command":"door","open":true}`,
//! `{"command":"connect"}`, `{"command":"disconnect"}`). Every line gets one
//! JSON reply on stdout; broadcast events are interleaved as they happen.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use lumen_controller::prelude::*;

use crate::fixture::ConsoleFixture;

/// Driver-side events injected from the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum SensorCommand {
    Door { open: bool },
    Connect,
    Disconnect,
}

/// One decoded stdin line
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Client(ClientCommand),
    Sensor(SensorCommand),
}

/// Read commands until stdin closes or Ctrl-C arrives
pub async fn serve_stdin(
    handle: &ControllerHandle,
    fixture: &ConsoleFixture,
    session: &ClientSession,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("Reading JSON commands from stdin");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => {
                        let reply = handle_line(handle, fixture, session, &line).await;
                        println!("{}", reply);
                    }
                    None => {
                        info!("stdin closed");
                        break;
                    }
                }
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Received Ctrl-C");
                break;
            }
        }
    }

    Ok(())
}

/// Decode and run one line, returning the JSON reply
pub async fn handle_line(
    handle: &ControllerHandle,
    fixture: &ConsoleFixture,
    session: &ClientSession,
    line: &str,
) -> Value {
    let inbound: Inbound = match serde_json::from_str(line) {
        Ok(inbound) => inbound,
        Err(e) => {
            debug!("Rejected input line {:?}: {}", line, e);
            return json!({ "error": format!("Unrecognized command: {}", e) });
        }
    };

    let result = match inbound {
        Inbound::Client(command) => handle
            .execute(session, command)
            .await
            .map(|reply| serde_json::to_value(reply).unwrap_or(Value::Null)),
        Inbound::Sensor(sensor) => apply_sensor(handle, fixture, sensor).map(|()| json!({ "ok": true })),
    };

    result.unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

fn apply_sensor(
    handle: &ControllerHandle,
    fixture: &ConsoleFixture,
    sensor: SensorCommand,
) -> lumen_controller::Result<()> {
    let event = match sensor {
        SensorCommand::Door { open } => DeviceEvent::Door { open },
        SensorCommand::Connect => {
            fixture.set_connected(true);
            DeviceEvent::Connected
        }
        SensorCommand::Disconnect => {
            fixture.set_connected(false);
            DeviceEvent::Disconnected
        }
    };
    handle.device_event(event)
}

/// Print every broadcast event as a JSON line
pub async fn print_events(mut events: broadcast::Receiver<ControllerEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to encode event {:?}: {}", event, e),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event printer fell behind; skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
