//! Light device port
//!
//! The controller never talks to hardware directly. It writes through a
//! [`LightDevice`] and learns about the fixture through [`DeviceEvent`]s that
//! the driver forwards via `ControllerHandle::device_event`.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::model::Color;

/// Edges reported by the fixture driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The fixture became reachable
    Connected,
    /// The fixture went away; no writes until the next `Connected`
    Disconnected,
    /// The door sensor changed level
    Door { open: bool },
}

/// Output side of a fixture driver
pub trait LightDevice: Send {
    /// Whether the fixture is reachable right now
    fn is_connected(&self) -> bool;

    /// Push a color; the driver guarantees delivery
    fn set_rgb(&mut self, color: Color);

    /// Push a color if the driver's own admission check allows it
    ///
    /// Returns `false` when the write was refused (e.g. rate limiting).
    fn set_if_possible(&mut self, color: Color) -> bool;
}

/// One accepted device write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceWrite {
    pub color: Color,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct SimulatedState {
    connected: bool,
    refuse_conditional: bool,
    refused: usize,
    writes: Vec<DeviceWrite>,
}

/// In-memory fixture that records every accepted write
///
/// Clones share the same state, so a test (or the daemon) can keep one clone
/// for inspection while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedDevice {
    /// Create a disconnected device
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device that reports itself connected
    pub fn connected() -> Self {
        let device = Self::new();
        device.set_connected(true);
        device
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    /// Make `set_if_possible` refuse (or accept again)
    pub fn refuse_conditional_writes(&self, refuse: bool) {
        self.state.lock().refuse_conditional = refuse;
    }

    /// Every accepted write so far
    pub fn writes(&self) -> Vec<DeviceWrite> {
        self.state.lock().writes.clone()
    }

    /// Colors of every accepted write so far
    pub fn colors(&self) -> Vec<Color> {
        self.state.lock().writes.iter().map(|w| w.color).collect()
    }

    pub fn last_color(&self) -> Option<Color> {
        self.state.lock().writes.last().map(|w| w.color)
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// Number of `set_if_possible` calls that were refused
    pub fn refused_count(&self) -> usize {
        self.state.lock().refused
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    fn record(state: &mut SimulatedState, color: Color) {
        state.writes.push(DeviceWrite {
            color,
            at: Instant::now(),
        });
    }
}

impl LightDevice for SimulatedDevice {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn set_rgb(&mut self, color: Color) {
        let mut state = self.state.lock();
        Self::record(&mut state, color);
    }

    fn set_if_possible(&mut self, color: Color) -> bool {
        let mut state = self.state.lock();
        if state.refuse_conditional {
            state.refused += 1;
            return false;
        }
        Self::record(&mut state, color);
        true
    }
}
