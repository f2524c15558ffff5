//! Session lifecycle: bring-up, reader thread, teardown and outbound commands.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::commands::Command;
use crate::config::HciConfig;
use crate::error::{HciError, Result};
use crate::firmware::{FirmwareImage, FirmwareLoader, LoadReport};
use crate::frame::encode;
use crate::reader::spawn_reader;
use crate::router::{DispatchStats, Router};
use crate::transport::ByteTransport;

/// Lifecycle state of a [`WicedHci`] session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport closed, no reader thread.
    Down,
    /// Bring-up in progress.
    Initializing,
    /// Reader thread running, events are dispatched.
    Up,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            SessionState::Down => "down",
            SessionState::Initializing => "initializing",
            SessionState::Up => "up",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State shared between the session handle and its reader thread.
pub(crate) struct Shared<T> {
    pub(crate) transport: T,
    pub(crate) router: Router,
}

/// A started reader thread and the flag that keeps it looping.
///
/// Each `up` gets a fresh flag, so a reader still finishing a callback after
/// `down` never resumes when the session comes back up.
struct ReaderHandle {
    thread: JoinHandle<()>,
    running: Arc<AtomicBool>,
}

/// A WICED HCI session over one byte transport.
///
/// All methods take `&self`; wrap the session in an `Arc` to send commands
/// from callbacks or other threads.
pub struct WicedHci<T: ByteTransport> {
    shared: Arc<Shared<T>>,
    config: HciConfig,
    state: RwLock<SessionState>,
    /// Reader of an up session. Taken by the first `down`; never held
    /// while joining.
    reader: Mutex<Option<ReaderHandle>>,
}

impl<T: ByteTransport> WicedHci<T> {
    /// Create a session with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::build(transport, HciConfig::default())
    }

    /// Create a session with a custom configuration.
    pub fn with_config(transport: T, config: HciConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(transport, config))
    }

    fn build(transport: T, config: HciConfig) -> Self {
        WicedHci {
            shared: Arc::new(Shared {
                transport,
                router: Router::new(),
            }),
            config,
            state: RwLock::new(SessionState::Down),
            reader: Mutex::new(None),
        }
    }

    /// Bring the link up.
    ///
    /// Opens the transport, downloads `firmware` (pass `None` when the
    /// controller already runs its application), waits for the settle delay
    /// and starts the reader thread. On failure the transport is closed and
    /// the session is back in [`SessionState::Down`].
    pub fn up(&self, firmware: Option<&FirmwareImage>) -> Result<Option<LoadReport>> {
        let mut reader = self.reader.lock();
        {
            let mut state = self.state.write();
            if *state != SessionState::Down {
                return Err(HciError::InvalidState {
                    expected: SessionState::Down.name(),
                    actual: state.name(),
                });
            }
            *state = SessionState::Initializing;
        }

        match self.bring_up(firmware) {
            Ok((handle, report)) => {
                *reader = Some(handle);
                *self.state.write() = SessionState::Up;
                info!("WICED HCI link up");
                Ok(report)
            }
            Err(e) => {
                if let Err(close_err) = self.shared.transport.close() {
                    warn!(error = %close_err, "failed to close transport after bring-up error");
                }
                *self.state.write() = SessionState::Down;
                warn!(error = %e, "bring-up failed");
                Err(e)
            }
        }
    }

    fn bring_up(
        &self,
        firmware: Option<&FirmwareImage>,
    ) -> Result<(ReaderHandle, Option<LoadReport>)> {
        self.shared.transport.open()?;

        let report = match firmware {
            Some(image) => {
                let loader = FirmwareLoader::new(&self.shared.transport, self.config.timeouts);
                Some(loader.load(image)?)
            }
            None => {
                info!("firmware download skipped");
                None
            }
        };

        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            debug!(?settle, "waiting for controller to settle");
            thread::sleep(settle);
        }

        let running = Arc::new(AtomicBool::new(true));
        let thread = spawn_reader(self.shared.clone(), running.clone(), &self.config)?;
        Ok((ReaderHandle { thread, running }, report))
    }

    /// Take the link down.
    ///
    /// Stops the reader thread, closes the transport and clears every
    /// callback. The session is [`SessionState::Down`] afterwards even when
    /// an error is returned. Calling `down` on a down session does nothing.
    ///
    /// Only the first of several concurrent calls does the teardown; the
    /// others return at once. The session stays [`SessionState::Up`] until
    /// the reader has stopped, so `up` cannot race the teardown.
    pub fn down(&self) -> Result<()> {
        let Some(reader) = self.reader.lock().take() else {
            return Ok(());
        };

        reader.running.store(false, Ordering::Release);
        let closed = self.shared.transport.close();

        // Called from a callback: the reader exits once the callback returns.
        let joined = if reader.thread.thread().id() == thread::current().id() {
            Ok(())
        } else {
            reader.thread.join().map_err(|_| HciError::ReaderPanicked)
        };

        self.shared.router.clear_all();
        *self.state.write() = SessionState::Down;
        info!("WICED HCI link down");

        closed?;
        joined
    }

    /// Register `callback` for every inbound frame of `group_code`.
    ///
    /// Replaces any callback already registered for the group. The callback
    /// runs on the reader thread.
    pub fn set_event_callback<F>(&self, group_code: u8, callback: F) -> Result<()>
    where
        F: Fn(u16, &[u8]) + Send + Sync + 'static,
    {
        self.shared.router.set_event_callback(group_code, callback)
    }

    /// Remove the callback for `group_code`.
    pub fn clear_event_callback(&self, group_code: u8) -> Result<()> {
        self.shared.router.clear_event_callback(group_code)
    }

    /// Frame `payload` under `command` and write it in one transport write.
    ///
    /// No response is awaited; replies arrive as events.
    pub fn send(&self, command: u16, payload: &[u8]) -> Result<()> {
        let frame = encode(command, payload, self.config.max_payload)?;
        self.shared.transport.write(&frame)?;
        debug!(
            command = format_args!("0x{:04X}", command),
            len = payload.len(),
            "command sent"
        );
        Ok(())
    }

    /// Encode and send a typed command.
    pub fn send_command(&self, command: &Command) -> Result<()> {
        let (code, payload) = command.encode()?;
        self.send(code, &payload)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Dispatch counters since the session was created.
    pub fn stats(&self) -> DispatchStats {
        self.shared.router.stats()
    }

    /// The session configuration.
    pub fn config(&self) -> &HciConfig {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }
}

impl<T: ByteTransport> Drop for WicedHci<T> {
    fn drop(&mut self) {
        if let Err(e) = self.down() {
            warn!(error = %e, "error taking link down on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::transport::ChannelTransport;
    use std::time::Duration;

    fn quick_config() -> HciConfig {
        HciConfig {
            settle_delay_ms: 0,
            ..HciConfig::default()
        }
    }

    #[test]
    fn test_up_without_firmware_and_down() {
        let (transport, _controller) = ChannelTransport::pair();
        let hci = WicedHci::with_config(transport, quick_config()).unwrap();
        assert_eq!(hci.state(), SessionState::Down);

        assert!(hci.up(None).unwrap().is_none());
        assert_eq!(hci.state(), SessionState::Up);

        hci.down().unwrap();
        assert_eq!(hci.state(), SessionState::Down);
    }

    #[test]
    fn test_up_twice_is_invalid() {
        let (transport, _controller) = ChannelTransport::pair();
        let hci = WicedHci::with_config(transport, quick_config()).unwrap();
        hci.up(None).unwrap();

        assert!(matches!(
            hci.up(None),
            Err(HciError::InvalidState {
                expected: "down",
                actual: "up"
            })
        ));
        hci.down().unwrap();
    }

    #[test]
    fn test_down_clears_callbacks() {
        let (transport, _controller) = ChannelTransport::pair();
        let hci = WicedHci::with_config(transport, quick_config()).unwrap();
        hci.set_event_callback(GROUP_MESH, |_, _| {}).unwrap();
        hci.up(None).unwrap();
        hci.down().unwrap();

        assert!(!hci.shared.router.is_registered(crate::Group::Mesh));
    }

    #[test]
    fn test_send_writes_one_frame() {
        let (transport, controller) = ChannelTransport::pair();
        let hci = WicedHci::with_config(transport, quick_config()).unwrap();
        hci.up(None).unwrap();

        hci.send(CMD_MESH_SEND_CONN_STATUS, &[3, 0, 0]).unwrap();
        let written = controller.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(written, vec![0x19, 0xF1, 0x16, 0x03, 0x00, 3, 0, 0]);

        hci.down().unwrap();
    }

    #[test]
    fn test_send_rejects_oversized_payload() {
        let (transport, _controller) = ChannelTransport::pair();
        let config = HciConfig {
            max_payload: 8,
            ..quick_config()
        };
        let hci = WicedHci::with_config(transport, config).unwrap();
        hci.up(None).unwrap();

        assert!(matches!(
            hci.send(CMD_MESH_SEND_PROXY_DATA, &[0; 9]),
            Err(HciError::PayloadTooLarge { max: 8, actual: 9 })
        ));
        hci.down().unwrap();
    }

    #[test]
    fn test_with_config_validates() {
        let (transport, _controller) = ChannelTransport::pair();
        let config = HciConfig {
            max_payload: 0,
            ..HciConfig::default()
        };
        assert!(matches!(
            WicedHci::with_config(transport, config),
            Err(HciError::Config(_))
        ));
    }
}
