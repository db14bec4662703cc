//! The controller task
//!
//! A single tokio task owns every piece of mutable controller state. Client
//! requests and device edges arrive over a channel; timers are plain
//! deadlines held in [`TimerSlot`](crate::timer::TimerSlot)s and the loop
//! sleeps until the earliest one. Nothing here is shared, so there are no
//! locks and every transition is applied atomically with respect to the
//! others.
//!
//! ```text
//! ControllerHandle ──Request──▶ ┌──────────────────┐ ──set_rgb──▶ LightDevice
//!                                │  LightController │
//! frame / intro / door timers ─▶ └──────────────────┘ ──events──▶ broadcast
//!                                          │
//!                                          └──mode──▶ mode writer ──▶ ModeStore
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use crate::client::ClientRole;
use crate::color_state::ColorState;
use crate::config::ControllerConfig;
use crate::device::{DeviceEvent, LightDevice};
use crate::door::DoorController;
use crate::error::{ControllerError, Result};
use crate::evaluator::{self, Evaluation, FrameContext};
use crate::events::ControllerEvent;
use crate::handle::{ControllerHandle, Request};
use crate::model::{Color, ControllerMode, ModeRecord, Transition};
use crate::persistence::{spawn_mode_writer, ModeStore};
use crate::scheduler::{FrameScheduler, IntroSequence, IntroStep};
use crate::sources::{AudioSource, PatternSource, SolidColor};

/// Point-in-time view of the controller, for diagnostics and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    pub modes: ModeRecord,
    pub target: Color,
    pub last_pushed: Color,
    pub device_connected: bool,
    pub clients: usize,
    pub frame_loop_running: bool,
    pub lagging: bool,
    pub intro_playing: bool,
    pub door_debouncing: bool,
    pub door_fading: bool,
}

/// Builder for a [`LightController`]
///
/// Only the device is required. Pattern and audio sources default to black,
/// and without a store nothing is persisted.
#[derive(Default)]
pub struct ControllerBuilder {
    config: ControllerConfig,
    device: Option<Box<dyn LightDevice>>,
    pattern: Option<Box<dyn PatternSource>>,
    audio: Option<Box<dyn AudioSource>>,
    store: Option<Arc<dyn ModeStore>>,
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn device(mut self, device: impl LightDevice + 'static) -> Self {
        self.device = Some(Box::new(device));
        self
    }

    /// Color generator followed in autopilot
    pub fn pattern(mut self, pattern: impl PatternSource + 'static) -> Self {
        self.pattern = Some(Box::new(pattern));
        self
    }

    /// Analyzer output followed in audio mode
    pub fn audio(mut self, audio: impl AudioSource + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    pub fn store(mut self, store: Arc<dyn ModeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate the configuration and restore the persisted mode
    pub fn build(self) -> Result<LightController> {
        self.config.validate()?;

        let device = self
            .device
            .ok_or_else(|| ControllerError::Configuration("no light device configured".into()))?;

        let initial = startup_mode(self.store.as_deref(), self.config.initial_mode);
        let (events, _) = broadcast::channel(self.config.event_buffer_size);

        Ok(LightController {
            modes: ModeRecord::new(initial),
            colors: ColorState::new(Color::BLACK),
            door: DoorController::new(),
            frames: FrameScheduler::new(self.config.frame_interval, self.config.immediate_delay),
            intro: IntroSequence::new(self.config.intro_sequence.clone(), self.config.intro_step),
            device,
            pattern: self
                .pattern
                .unwrap_or_else(|| Box::new(SolidColor(Color::BLACK))),
            audio: self
                .audio
                .unwrap_or_else(|| Box::new(SolidColor(Color::BLACK))),
            store: self.store,
            persist: None,
            events,
            connected: false,
            clients: 0,
            config: self.config,
        })
    }
}

fn startup_mode(store: Option<&dyn ModeStore>, fallback: ControllerMode) -> ControllerMode {
    let Some(store) = store else {
        return fallback;
    };

    match store.load() {
        Ok(Some(mode)) if mode.is_externally_selectable() => {
            info!("Restored persisted mode {}", mode);
            mode
        }
        Ok(Some(mode)) => {
            warn!("Ignoring persisted mode {}; starting in {}", mode, fallback);
            fallback
        }
        Ok(None) => {
            debug!("No persisted mode; starting in {}", fallback);
            fallback
        }
        Err(e) => {
            warn!("Failed to load persisted mode, starting in {}: {}", fallback, e);
            fallback
        }
    }
}

/// Mode arbitration, door override and frame scheduling for one fixture
pub struct LightController {
    config: ControllerConfig,
    modes: ModeRecord,
    colors: ColorState,
    door: DoorController,
    frames: FrameScheduler,
    intro: IntroSequence,
    device: Box<dyn LightDevice>,
    pattern: Box<dyn PatternSource>,
    audio: Box<dyn AudioSource>,
    store: Option<Arc<dyn ModeStore>>,
    persist: Option<mpsc::UnboundedSender<ControllerMode>>,
    events: broadcast::Sender<ControllerEvent>,
    connected: bool,
    clients: usize,
}

impl LightController {
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }

    /// Subscribe before spawning to observe the very first announcements
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Move the controller onto its own task
    ///
    /// Must be called from within a tokio runtime. The returned task finishes
    /// after [`ControllerHandle::shutdown`] or once every handle is dropped.
    pub fn spawn(self) -> (ControllerHandle, JoinHandle<()>) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let handle = ControllerHandle::new(request_tx, self.events.clone());
        let task = tokio::spawn(self.run(request_rx));
        (handle, task)
    }

    async fn run(mut self, mut requests: mpsc::UnboundedReceiver<Request>) {
        let writer = self.store.take().map(|store| {
            let (tx, handle) = spawn_mode_writer(store);
            self.persist = Some(tx);
            handle
        });

        info!("Light controller started in {} mode", self.modes.current);

        if self.device.is_connected() {
            self.on_connected(Instant::now());
        }

        let mut shutdown_reply = None;

        loop {
            let deadline = self.next_deadline();

            tokio::select! {
                biased;

                request = requests.recv() => match request {
                    Some(Request::Shutdown(reply)) => {
                        shutdown_reply = Some(reply);
                        break;
                    }
                    Some(request) => self.handle_request(request),
                    None => {
                        debug!("All controller handles dropped");
                        break;
                    }
                },

                () = sleep_until_deadline(deadline) => {
                    self.fire_due_timers(Instant::now());
                }
            }
        }

        self.teardown();

        // Flush outstanding saves before reporting the shutdown complete
        self.persist = None;
        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                warn!("Mode writer task failed: {}", e);
            }
        }

        info!("Light controller stopped");

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::SetMode { mode, reply } => {
                let transition = self.set_mode(mode);
                let _ = reply.send(transition);
            }
            Request::SetRgb { color, role, reply } => {
                self.set_rgb(color, role);
                let _ = reply.send(color);
            }
            Request::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Request::Device(event) => self.on_device_event(event, Instant::now()),
            Request::ClientConnected => {
                self.clients += 1;
                debug!("Client connected ({} total)", self.clients);
            }
            Request::ClientDisconnected => self.on_client_disconnected(),
            // Consumed by the run loop
            Request::Shutdown(_) => {}
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.intro.deadline(),
            self.door.next_deadline(),
            self.frames.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn fire_due_timers(&mut self, now: Instant) {
        if self.intro.step_due(now) {
            self.advance_intro(now);
        }
        if self.door.debounce_due(now) {
            self.start_fade(now);
        }
        if self.door.fade_due(now) {
            self.fade_step(now);
        }
        if self.frames.frame_due(now) {
            self.run_frame();
        }
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    /// Explicit mode request from a client or an internal rule
    ///
    /// Always ends any door episode, even when the mode does not change.
    fn set_mode(&mut self, requested: ControllerMode) -> Transition {
        let episode = self.door.end_episode();
        if episode.is_some() {
            debug!("Mode request ended the door override");
        }

        let transition = self.modes.transition(requested);
        match transition {
            Transition::Changed { from, to } => {
                // Door was an override, not a choice; remember what it covered
                if from == ControllerMode::Door {
                    if let Some(episode) = episode {
                        self.modes.previous = episode.mode;
                    }
                }
                info!("Mode changed: {} -> {}", from, to);
                self.persist(to);
                self.announce_mode();
            }
            Transition::Unchanged(mode) => {
                debug!("Mode already {}", mode);
            }
        }
        transition
    }

    fn set_rgb(&mut self, color: Color, role: ClientRole) {
        self.set_mode(role.rgb_mode());
        self.colors.set_target(color);
        debug!("Target color set to {}", color);
    }

    fn on_client_disconnected(&mut self) {
        if self.clients == 0 {
            debug!("Client disconnect with no clients connected; ignoring");
            return;
        }
        self.clients -= 1;
        debug!("Client disconnected ({} remaining)", self.clients);

        if self.clients == 0 && self.modes.current.resets_when_unattended() {
            info!(
                "Last client left while in {} mode; returning to autopilot",
                self.modes.current
            );
            self.set_mode(ControllerMode::AutoPilot);
        }
    }

    // ------------------------------------------------------------------
    // Device
    // ------------------------------------------------------------------

    fn on_device_event(&mut self, event: DeviceEvent, now: Instant) {
        match event {
            DeviceEvent::Connected => self.on_connected(now),
            DeviceEvent::Disconnected => self.on_disconnected(),
            DeviceEvent::Door { open } if !self.connected => {
                debug!("Ignoring door edge (open={}) while disconnected", open);
            }
            DeviceEvent::Door { open: true } => self.on_door_open(now),
            DeviceEvent::Door { open: false } => self.on_door_close(now),
        }
    }

    fn on_connected(&mut self, now: Instant) {
        if self.connected {
            info!("Device reconnected; replaying intro");
        } else {
            info!("Device connected");
        }
        self.connected = true;
        self.frames.stop();
        self.intro.start(now);
    }

    fn on_disconnected(&mut self) {
        if !self.connected {
            debug!("Device already disconnected");
            return;
        }

        self.connected = false;
        self.frames.stop();
        self.intro.stop();

        if let Some(episode) = self.door.end_episode() {
            self.colors.set_target(episode.color);
            if self.modes.current == ControllerMode::Door {
                self.modes.replace_current(episode.mode);
                info!("Door override dropped on disconnect; back to {}", episode.mode);
                self.announce_mode();
            }
        }

        info!("Device disconnected; frame loop stopped");
    }

    fn advance_intro(&mut self, now: Instant) {
        match self.intro.advance(now) {
            IntroStep::Show(color) => {
                trace!("Intro step {}", color);
                self.device.set_rgb(color);
            }
            IntroStep::Restore => {
                self.push_color(self.colors.target());
                self.frames.start(now);
                info!(
                    "Intro finished; frame loop running every {:?}",
                    self.config.frame_interval
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Door
    // ------------------------------------------------------------------

    fn on_door_open(&mut self, now: Instant) {
        let current = self.modes.current;
        if current == ControllerMode::ManualLocked {
            debug!("Door opened while manual-locked; ignoring");
            return;
        }

        // White must stay on the fixture; the rest of the flash is skipped
        if self.intro.stop() {
            debug!("Door opened during the intro; starting frame loop");
            self.frames.start(now);
        }

        if self.door.cancel_pending() {
            debug!("Door re-opened; pending fade-back cancelled");
        }

        if current != ControllerMode::Door {
            self.door.begin_episode(current, self.colors.target());
            self.modes.replace_current(ControllerMode::Door);
            info!("Door opened; overriding {} mode", current);
        }

        self.announce_mode();
        self.colors.set_target(Color::WHITE);
        self.push_color(Color::WHITE);
    }

    fn on_door_close(&mut self, now: Instant) {
        if self.modes.current != ControllerMode::Door {
            debug!("Door closed outside door mode; nothing to restore");
            return;
        }

        if self.door.cancel_pending() {
            debug!("Door close restarted the pending fade-back");
        }
        self.door.arm_debounce(now, self.config.door_debounce);
        debug!(
            "Door closed; fading back in {:?} unless it re-opens",
            self.config.door_debounce
        );
    }

    fn start_fade(&mut self, now: Instant) {
        info!("Door stayed closed; fading back");
        self.door
            .begin_fade(now, self.colors.target(), self.config.fade_step);
    }

    fn fade_step(&mut self, now: Instant) {
        let Some(step) = self.door.advance_fade(now, self.config.fade_step) else {
            return;
        };

        self.colors.set_target(step.color);
        self.push_color(step.color);

        if let Some(mode) = step.finished {
            self.modes.replace_current(mode);
            info!("Fade-back complete; restored {} mode", mode);
            self.announce_mode();
        }
    }

    // ------------------------------------------------------------------
    // Frames and output
    // ------------------------------------------------------------------

    fn run_frame(&mut self) {
        let start = Instant::now();

        let evaluation = evaluator::evaluate(
            self.modes.current,
            FrameContext {
                colors: &mut self.colors,
                device: self.device.as_mut(),
                pattern: self.pattern.as_mut(),
                audio: self.audio.as_mut(),
            },
        );
        if let Evaluation::Pushed(color) = evaluation {
            trace!("Frame pushed {}", color);
            self.broadcast(ControllerEvent::RgbUpdate { color });
        }

        let delay = self.frames.next_delay(self.modes.current, start.elapsed());
        self.frames.schedule_next(Instant::now(), delay);
    }

    /// Write a color now and tell listeners; no-op while disconnected
    fn push_color(&mut self, color: Color) {
        if !self.connected {
            trace!("Device disconnected; not pushing {}", color);
            return;
        }
        self.device.set_rgb(color);
        self.colors.mark_pushed(color);
        self.broadcast(ControllerEvent::RgbUpdate { color });
    }

    fn announce_mode(&self) {
        self.broadcast(ControllerEvent::ModeUpdate {
            mode: self.modes.current,
        });
    }

    fn broadcast(&self, event: ControllerEvent) {
        // No receivers is not an error
        let _ = self.events.send(event);
    }

    fn persist(&self, mode: ControllerMode) {
        if mode == ControllerMode::Door {
            return;
        }
        if let Some(tx) = &self.persist {
            if tx.send(mode).is_err() {
                warn!("Mode writer stopped; {} not persisted", mode);
            }
        }
    }

    fn status(&self) -> ControllerStatus {
        ControllerStatus {
            modes: self.modes,
            target: self.colors.target(),
            last_pushed: self.colors.last_pushed(),
            device_connected: self.connected,
            clients: self.clients,
            frame_loop_running: self.frames.is_running(),
            lagging: self.frames.is_lagging(),
            intro_playing: self.intro.is_playing(),
            door_debouncing: self.door.is_debouncing(),
            door_fading: self.door.is_fading(),
        }
    }

    fn teardown(&mut self) {
        self.frames.stop();
        self.intro.stop();
        self.door.cancel_pending();
        debug!("Controller timers cancelled");
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
