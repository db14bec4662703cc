//! Client-facing command surface
//!
//! The transport that carries these commands (and authenticates the clients
//! sending them) lives outside this crate. What it hands us is a
//! [`ClientSession`] describing the sender plus a decoded [`ClientCommand`].

use serde::{Deserialize, Serialize};

use crate::model::{Color, ControllerMode};

/// How much the sender is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientRole {
    /// A regular remote; color writes switch the fixture to manual
    #[default]
    Ordinary,
    /// An internal producer (e.g. a local audio bridge); color writes switch to raw audio
    Privileged,
}

impl ClientRole {
    /// Mode an `rgb-set` from this role forces
    pub const fn rgb_mode(&self) -> ControllerMode {
        match self {
            ClientRole::Ordinary => ControllerMode::Manual,
            ClientRole::Privileged => ControllerMode::AudioRaw,
        }
    }
}

/// The sender of a command, as established by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    pub id: String,
    pub role: ClientRole,
    pub authenticated: bool,
}

impl ClientSession {
    pub fn new(id: impl Into<String>, role: ClientRole, authenticated: bool) -> Self {
        Self {
            id: id.into(),
            role,
            authenticated,
        }
    }

    /// An authenticated ordinary client
    pub fn ordinary(id: impl Into<String>) -> Self {
        Self::new(id, ClientRole::Ordinary, true)
    }

    /// An authenticated privileged client
    pub fn privileged(id: impl Into<String>) -> Self {
        Self::new(id, ClientRole::Privileged, true)
    }
}

/// Inbound requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum ClientCommand {
    /// Set the target color; channels are clamped to `0..=255`
    RgbSet { r: i64, g: i64, b: i64 },
    /// Request a mode transition by wire name
    ModeSet { mode: String },
    /// Read the active mode
    ModeGet,
    /// Read the target color
    RgbStatus,
}

/// Successful responses to a [`ClientCommand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "kebab-case")]
pub enum CommandReply {
    Mode { mode: ControllerMode },
    Rgb { color: Color },
}
