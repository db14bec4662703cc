//! Cloneable handle to a running controller

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::client::{ClientCommand, ClientRole, ClientSession, CommandReply};
use crate::controller::ControllerStatus;
use crate::device::DeviceEvent;
use crate::error::{ControllerError, Result};
use crate::events::ControllerEvent;
use crate::model::{Color, ControllerMode, ModeRecord, Transition};

/// Messages processed by the controller task, in arrival order
#[derive(Debug)]
pub(crate) enum Request {
    SetMode {
        mode: ControllerMode,
        reply: oneshot::Sender<Transition>,
    },
    SetRgb {
        color: Color,
        role: ClientRole,
        reply: oneshot::Sender<Color>,
    },
    Status(oneshot::Sender<ControllerStatus>),
    Device(DeviceEvent),
    ClientConnected,
    ClientDisconnected,
    Shutdown(oneshot::Sender<()>),
}

/// Entry point for clients, fixture drivers and tests
///
/// Every method is a message to the controller task; state is never touched
/// from the caller's task. Once the controller has stopped, every call fails
/// with [`ControllerError::ControllerClosed`].
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    requests: mpsc::UnboundedSender<Request>,
    events: broadcast::Sender<ControllerEvent>,
}

impl ControllerHandle {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<Request>,
        events: broadcast::Sender<ControllerEvent>,
    ) -> Self {
        Self { requests, events }
    }

    /// Request a mode transition
    ///
    /// `Door` cannot be requested; it is entered only through the door sensor.
    pub async fn set_mode(&self, mode: ControllerMode) -> Result<Transition> {
        if !mode.is_externally_selectable() {
            return Err(ControllerError::ModeNotSelectable(mode));
        }
        let (reply, rx) = oneshot::channel();
        self.send(Request::SetMode { mode, reply })?;
        rx.await.map_err(|_| ControllerError::ControllerClosed)
    }

    /// Request a mode transition by wire name
    ///
    /// Unknown names fail with [`ControllerError::InvalidMode`] and leave the
    /// controller untouched.
    pub async fn set_mode_named(&self, name: &str) -> Result<Transition> {
        let mode: ControllerMode = name.parse()?;
        self.set_mode(mode).await
    }

    pub async fn get_mode(&self) -> Result<ControllerMode> {
        Ok(self.status().await?.modes.current)
    }

    pub async fn mode_record(&self) -> Result<ModeRecord> {
        Ok(self.status().await?.modes)
    }

    /// Set the target color on behalf of a client with `role`
    ///
    /// Channels are clamped to `0..=255`. The mode is forced to the role's
    /// color mode first. Returns the clamped color.
    pub async fn set_rgb(&self, r: i64, g: i64, b: i64, role: ClientRole) -> Result<Color> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::SetRgb {
            color: Color::clamped(r, g, b),
            role,
            reply,
        })?;
        rx.await.map_err(|_| ControllerError::ControllerClosed)
    }

    /// The current target color
    pub async fn rgb_status(&self) -> Result<Color> {
        Ok(self.status().await?.target)
    }

    pub async fn status(&self) -> Result<ControllerStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Status(reply))?;
        rx.await.map_err(|_| ControllerError::ControllerClosed)
    }

    /// Forward an edge reported by the fixture driver
    pub fn device_event(&self, event: DeviceEvent) -> Result<()> {
        self.send(Request::Device(event))
    }

    pub fn client_connected(&self) -> Result<()> {
        self.send(Request::ClientConnected)
    }

    pub fn client_disconnected(&self) -> Result<()> {
        self.send(Request::ClientDisconnected)
    }

    /// Receive every mode and color announcement from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Run one client command
    ///
    /// Unauthenticated sessions are rejected before the command is looked at.
    pub async fn execute(
        &self,
        session: &ClientSession,
        command: ClientCommand,
    ) -> Result<CommandReply> {
        if !session.authenticated {
            tracing::debug!("Rejecting command from unauthenticated client {}", session.id);
            return Err(ControllerError::Unauthenticated);
        }

        match command {
            ClientCommand::RgbSet { r, g, b } => {
                let color = self.set_rgb(r, g, b, session.role).await?;
                Ok(CommandReply::Rgb { color })
            }
            ClientCommand::ModeSet { mode } => {
                let transition = self.set_mode_named(&mode).await?;
                Ok(CommandReply::Mode {
                    mode: transition.current(),
                })
            }
            ClientCommand::ModeGet => Ok(CommandReply::Mode {
                mode: self.get_mode().await?,
            }),
            ClientCommand::RgbStatus => Ok(CommandReply::Rgb {
                color: self.rgb_status().await?,
            }),
        }
    }

    /// Stop the controller and wait until pending saves are flushed
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Shutdown(reply))?;
        rx.await.map_err(|_| ControllerError::ControllerClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }

    fn send(&self, request: Request) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| ControllerError::ControllerClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached_handle() -> ControllerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let (events, _) = broadcast::channel(4);
        ControllerHandle::new(tx, events)
    }

    #[tokio::test]
    async fn test_closed_controller() {
        let handle = detached_handle();

        assert!(handle.is_closed());
        assert!(matches!(
            handle.get_mode().await,
            Err(ControllerError::ControllerClosed)
        ));
        assert!(matches!(
            handle.device_event(DeviceEvent::Connected),
            Err(ControllerError::ControllerClosed)
        ));
    }

    #[test]
    fn test_rejections_happen_before_sending() {
        tokio_test::block_on(async {
            let handle = detached_handle();

            assert!(matches!(
                handle.set_mode(ControllerMode::Door).await,
                Err(ControllerError::ModeNotSelectable(ControllerMode::Door))
            ));
            assert!(matches!(
                handle.set_mode_named("disco").await,
                Err(ControllerError::InvalidMode(name)) if name == "disco"
            ));

            let session = ClientSession::new("anon", ClientRole::Ordinary, false);
            assert!(matches!(
                handle.execute(&session, ClientCommand::ModeGet).await,
                Err(ControllerError::Unauthenticated)
            ));
        });
    }
}
