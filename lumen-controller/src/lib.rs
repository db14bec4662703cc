//! Lumen Light Controller
//!
//! The control core of a network-attached RGB light fixture: it arbitrates
//! between operating modes, paces color output at a fixed frame rate, and
//! overrides everything with full white while the door is open.
//!
//! # Features
//!
//! - **Single-owner actor**: all state lives on one tokio task; callers talk to it through a [`ControllerHandle`]
//! - **Change detection**: static modes write to the device only when the target color changes
//! - **Door override**: white on open, debounced fade-back to the exact pre-door color and mode on close
//! - **Broadcasts**: every mode change and accepted color write is fanned out to subscribers
//! - **Persistence**: the last selected mode survives restarts via a pluggable [`ModeStore`]
//!
//! # Architecture
//!
//! ```text
//! clients / driver ──▶ ControllerHandle ──▶ LightController task ──▶ LightDevice
//!                            ▲                       │
//!                            └──── ControllerEvent ◀─┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lumen_controller::prelude::*;
//!
//! # async fn example() -> lumen_controller::Result<()> {
//! let device = SimulatedDevice::connected();
//! let (handle, task) = LightController::builder()
//!     .device(device.clone())
//!     .pattern(SolidColor(Color::new(0, 0, 64)))
//!     .build()?
//!     .spawn();
//!
//! let mut events = handle.subscribe();
//! handle.set_rgb(10, 20, 30, ClientRole::Ordinary).await?;
//! assert_eq!(handle.get_mode().await?, ControllerMode::Manual);
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//!
//! handle.shutdown().await?;
//! # let _ = task.await;
//! # Ok(())
//! # }
//! ```

// Core types
pub mod config;
pub mod error;
pub mod model;

// Collaborator ports
pub mod device;
pub mod persistence;
pub mod sources;

// Client surface
pub mod client;
pub mod events;

// Controller task and its handle
pub mod controller;
pub mod handle;

// Internal state machines
mod color_state;
mod door;
mod evaluator;
mod scheduler;
mod timer;

// Logging infrastructure
pub mod logging;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ClientCommand, ClientRole, ClientSession, CommandReply};
pub use config::ControllerConfig;
pub use controller::{ControllerBuilder, ControllerStatus, LightController};
pub use device::{DeviceEvent, DeviceWrite, LightDevice, SimulatedDevice};
pub use error::{ControllerError, Result};
pub use events::ControllerEvent;
pub use handle::ControllerHandle;
pub use model::{Color, ControllerMode, ModeRecord, Transition};
pub use persistence::{FileModeStore, MemoryModeStore, ModeStore, PersistedSettings};
pub use sources::{AudioSource, PatternSource, SolidColor};

// ============================================================================
// Re-exports - Logging
// ============================================================================

pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::client::{ClientCommand, ClientRole, ClientSession, CommandReply};
    pub use crate::config::ControllerConfig;
    pub use crate::controller::LightController;
    pub use crate::device::{DeviceEvent, LightDevice, SimulatedDevice};
    pub use crate::events::ControllerEvent;
    pub use crate::handle::ControllerHandle;
    pub use crate::model::{Color, ControllerMode};
    pub use crate::persistence::{FileModeStore, MemoryModeStore, ModeStore};
    pub use crate::sources::{AudioSource, PatternSource, SolidColor};
}
