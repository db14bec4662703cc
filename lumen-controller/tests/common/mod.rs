//! Shared harness for controller integration tests
//!
//! Tests run on a paused clock (`start_paused = true`), so every sleep
//! advances virtual time deterministically.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lumen_controller::prelude::*;
use lumen_controller::ControllerStatus;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const FRAME: Duration = Duration::from_millis(50);
pub const DEBOUNCE: Duration = Duration::from_secs(10);
pub const FADE_STEP: Duration = Duration::from_millis(100);

pub const IMMEDIATE: Duration = Duration::from_millis(1);

/// Default timings, no intro flash, and room for long fades on the event channel
///
/// Audio frames reschedule after 1 ms so the paused clock keeps advancing.
pub fn test_config() -> ControllerConfig {
    let mut config = ControllerConfig::default().with_immediate_delay(IMMEDIATE);
    config.intro_sequence = Vec::new();
    config.event_buffer_size = 4096;
    config
}

pub struct Harness {
    pub handle: ControllerHandle,
    pub task: JoinHandle<()>,
    pub device: SimulatedDevice,
    pub store: Arc<MemoryModeStore>,
    pub events: broadcast::Receiver<ControllerEvent>,
}

pub struct HarnessBuilder {
    config: ControllerConfig,
    device: SimulatedDevice,
    store: Arc<MemoryModeStore>,
    pattern: Option<Box<dyn FnMut() -> Color + Send>>,
    audio: Color,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            device: SimulatedDevice::connected(),
            store: Arc::new(MemoryModeStore::new()),
            pattern: None,
            audio: Color::BLUE,
        }
    }

    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn device(mut self, device: SimulatedDevice) -> Self {
        self.device = device;
        self
    }

    pub fn store(mut self, store: Arc<MemoryModeStore>) -> Self {
        self.store = store;
        self
    }

    pub fn pattern(mut self, pattern: impl FnMut() -> Color + Send + 'static) -> Self {
        self.pattern = Some(Box::new(pattern));
        self
    }

    pub fn audio(mut self, color: Color) -> Self {
        self.audio = color;
        self
    }

    pub fn start(self) -> Harness {
        let mut builder = LightController::builder()
            .config(self.config)
            .device(self.device.clone())
            .audio(SolidColor(self.audio))
            .store(self.store.clone());
        builder = match self.pattern {
            Some(pattern) => builder.pattern(pattern),
            None => builder.pattern(SolidColor(Color::BLACK)),
        };

        let controller = builder.build().expect("valid test configuration");
        let events = controller.subscribe();
        let (handle, task) = controller.spawn();

        Harness {
            handle,
            task,
            device: self.device,
            store: self.store,
            events,
        }
    }
}

impl Harness {
    pub fn start() -> Self {
        HarnessBuilder::new().start()
    }

    /// Status after every previously sent request has been applied
    pub async fn status(&self) -> ControllerStatus {
        self.handle.status().await.expect("controller running")
    }

    pub async fn device_event(&self, event: DeviceEvent) {
        self.handle.device_event(event).expect("controller running");
        self.status().await;
    }

    pub async fn open_door(&self) {
        self.device_event(DeviceEvent::Door { open: true }).await;
    }

    pub async fn close_door(&self) {
        self.device_event(DeviceEvent::Door { open: false }).await;
    }

    /// Everything broadcast since the last drain
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn mode_updates(&mut self) -> Vec<ControllerMode> {
        self.drain_events()
            .into_iter()
            .filter_map(|event| match event {
                ControllerEvent::ModeUpdate { mode } => Some(mode),
                _ => None,
            })
            .collect()
    }

    /// Stop the controller and wait for pending saves
    pub async fn shutdown(self) -> Arc<MemoryModeStore> {
        self.handle.shutdown().await.expect("controller running");
        self.task.await.expect("controller task");
        self.store
    }
}

pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}
