//! Console-backed fixture
//!
//! Stands in for the serial/USB light driver. Writes are traced rather than
//! sent anywhere, and conditional writes are rate limited the way a real
//! driver throttles a busy link.

use std::sync::Arc;
use std::time::Duration;

use lumen_controller::{Color, LightDevice};
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct FixtureState {
    connected: bool,
    min_interval: Duration,
    last_write: Option<Instant>,
    last_color: Color,
    writes: u64,
    refused: u64,
}

/// Cloneable handle to the console fixture; clones share state
#[derive(Debug, Clone)]
pub struct ConsoleFixture {
    state: Arc<Mutex<FixtureState>>,
}

impl ConsoleFixture {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(FixtureState {
                connected: false,
                min_interval,
                last_write: None,
                last_color: Color::BLACK,
                writes: 0,
                refused: 0,
            })),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    pub fn last_color(&self) -> Color {
        self.state.lock().last_color
    }

    /// Accepted and refused write counts
    pub fn counters(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.writes, state.refused)
    }

    fn record(state: &mut FixtureState, color: Color, now: Instant) {
        if state.last_color != color {
            tracing::trace!("Fixture output {}", color);
        }
        state.last_write = Some(now);
        state.last_color = color;
        state.writes += 1;
    }
}

impl LightDevice for ConsoleFixture {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn set_rgb(&mut self, color: Color) {
        let mut state = self.state.lock();
        Self::record(&mut state, color, Instant::now());
    }

    fn set_if_possible(&mut self, color: Color) -> bool {
        let mut state = self.state.lock();
        let now = Instant::now();
        let busy = state
            .last_write
            .is_some_and(|last| now.duration_since(last) < state.min_interval);

        if !state.connected || busy {
            state.refused += 1;
            return false;
        }

        Self::record(&mut state, color, now);
        true
    }
}
