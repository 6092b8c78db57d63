#![cfg(target_os = "linux")]

//! Wayland client connection management and event loop.

use std::io::ErrorKind;
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use wayland_client::backend::WaylandError;
use wayland_client::globals::{registry_queue_init, GlobalError};
use wayland_client::{Connection, DispatchError, EventQueue, QueueHandle};

use super::globals::advertise_initial;
use super::protocol::WaylandProtocol;
use super::shell::WaylandClientState;
use crate::bridge::registry::InterfaceKind;
use crate::bridge::shell::ShellState;
use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::events::{BridgeEvent, EventSink};
use crate::handle::Handle;
use crate::handoff::HandoffSender;

pub(crate) fn map_wayland_error(context: &str, err: WaylandError) -> BridgeError {
    match err {
        WaylandError::Io(err) => BridgeError::ConnectionLost(format!("{context}: {err}")),
        WaylandError::Protocol(err) => BridgeError::ProtocolViolation(format!("{context}: {err}")),
    }
}

pub(crate) fn map_dispatch_error(context: &str, err: DispatchError) -> BridgeError {
    match err {
        DispatchError::Backend(err) => map_wayland_error(context, err),
        bad_message => BridgeError::ProtocolViolation(format!("{context}: {bad_message}")),
    }
}

/// A connection to the compositor driving one [`Bridge`].
pub struct WaylandClient {
    connection: Connection,
    event_queue: EventQueue<WaylandClientState>,
    state: WaylandClientState,
}

impl WaylandClient {
    /// Connect to the compositor named by the environment with the
    /// configuration from [`BridgeConfig::load`].
    pub fn connect() -> Result<Self, BridgeError> {
        Self::connect_with(BridgeConfig::load()?)
    }

    /// Connect and bind the initial globals.
    ///
    /// Fails with [`BridgeError::MissingGlobal`] when the compositor lacks
    /// `wl_compositor` or `xdg_wm_base`.
    pub fn connect_with(config: BridgeConfig) -> Result<Self, BridgeError> {
        log::debug!("Initializing Wayland client...");
        let connection = Connection::connect_to_env()
            .map_err(|e| BridgeError::ConnectionLost(format!("Wayland connect error: {e}")))?;
        log::debug!("Connected to Wayland display");

        let (globals, mut event_queue) =
            registry_queue_init::<WaylandClientState>(&connection).map_err(|e| match e {
                GlobalError::Backend(err) => map_wayland_error("Failed to init Wayland registry", err),
                other => BridgeError::ProtocolViolation(format!("Failed to init Wayland registry: {other}")),
            })?;
        let protocol = WaylandProtocol::new(globals.registry().clone(), event_queue.handle());
        let mut state = WaylandClientState::new(Bridge::new(protocol, config)?);
        advertise_initial(&mut state, &globals)?;

        // Second roundtrip: seat capabilities and output descriptions.
        event_queue
            .roundtrip(&mut state)
            .map_err(|e| map_dispatch_error("Initial Wayland roundtrip failed", e))?;
        state.take_error()?;

        if state.bridge.global(InterfaceKind::Compositor).is_none() {
            return Err(BridgeError::MissingGlobal("wl_compositor"));
        }
        if state.bridge.global(InterfaceKind::ShellBase).is_none() {
            return Err(BridgeError::MissingGlobal("xdg_wm_base"));
        }

        Ok(Self {
            connection,
            event_queue,
            state,
        })
    }

    pub fn connection(&self) -> Connection {
        self.connection.clone()
    }

    pub fn queue_handle(&self) -> QueueHandle<WaylandClientState> {
        self.event_queue.handle()
    }

    pub fn bridge(&self) -> &Bridge<WaylandProtocol> {
        &self.state.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge<WaylandProtocol> {
        &mut self.state.bridge
    }

    pub fn handoff_sender(&self) -> HandoffSender {
        self.state.bridge.handoff_sender()
    }

    pub fn drain_events(&mut self) -> Vec<BridgeEvent> {
        self.state.bridge.drain_events()
    }

    pub fn forward_events(&mut self, sink: &mut dyn EventSink) {
        self.state.bridge.forward_events(sink);
    }

    /// Create a toplevel window and wait for its first configure.
    ///
    /// The configure still has to be acknowledged with
    /// [`Bridge::ack_configure`] before the first commit.
    pub fn create_window(&mut self) -> Result<Handle, BridgeError> {
        let surface = self.state.bridge.create_window()?;
        self.flush()?;
        self.wait_for_initial_configure(surface)?;
        Ok(surface)
    }

    fn wait_for_initial_configure(&mut self, surface: Handle) -> Result<(), BridgeError> {
        let timeout = Duration::from_millis(self.state.bridge.config().initial_configure_timeout_ms);
        let start = Instant::now();
        loop {
            let bridge = &self.state.bridge;
            match bridge.window_state(surface) {
                ShellState::Destroyed => {
                    return Err(BridgeError::UnknownObject(surface));
                },
                ShellState::Unconfigured if !bridge.needs_ack(surface) => {},
                _ => return Ok(()),
            }

            self.event_queue
                .roundtrip(&mut self.state)
                .map_err(|e| map_dispatch_error("Wayland roundtrip failed while waiting for configure", e))?;
            self.state.take_error()?;

            if start.elapsed() >= timeout {
                log::error!("Timed out waiting for initial configure on {:?}", surface);
                return Err(BridgeError::ProtocolViolation(format!(
                    "timed out waiting for initial configure on surface {:?}",
                    surface
                )));
            }
        }
    }

    /// Dispatch already queued events without touching the socket.
    pub fn dispatch_pending(&mut self) -> Result<(), BridgeError> {
        self.event_queue
            .dispatch_pending(&mut self.state)
            .map_err(|e| map_dispatch_error("Failed to dispatch Wayland events", e))?;
        self.state.take_error()
    }

    pub fn flush(&self) -> Result<(), BridgeError> {
        match self.event_queue.flush() {
            Ok(()) => Ok(()),
            // The rest goes out with the next flush.
            Err(WaylandError::Io(ref err)) if err.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(map_wayland_error("Failed to flush Wayland queue", err)),
        }
    }

    /// Run one cycle of the event loop.
    ///
    /// Waits at most `timeout` (forever with `None`) for compositor events,
    /// posted handoff work or the next key repeat, then dispatches
    /// everything that arrived.
    pub fn dispatch(&mut self, timeout: Option<Duration>) -> Result<(), BridgeError> {
        self.dispatch_pending()?;
        self.flush()?;

        let wait = match (timeout, self.state.bridge.next_timeout(Instant::now())) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        if let Some(guard) = self.event_queue.prepare_read() {
            let display_fd = guard.connection_fd().as_raw_fd();
            let wake_fd = self.state.bridge.handoff().wake_fd();
            let mut fds = [
                libc::pollfd {
                    fd: display_fd,
                    events: libc::POLLIN,
                    revents: 0,
                },
                libc::pollfd {
                    fd: wake_fd,
                    events: libc::POLLIN,
                    revents: 0,
                },
            ];
            let timeout_ms = wait
                .map(|wait| wait.as_millis().min(i32::MAX as u128) as i32)
                .unwrap_or(-1);
            // SAFETY: `fds` outlives the call and its length is passed along.
            let ready = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
            if ready < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() != ErrorKind::Interrupted {
                    return Err(BridgeError::ConnectionLost(format!("poll failed: {err}")));
                }
            }
            if ready > 0 && fds[0].revents & (libc::POLLIN | libc::POLLERR | libc::POLLHUP) != 0 {
                match guard.read() {
                    Ok(_) => {},
                    Err(WaylandError::Io(ref err)) if err.kind() == ErrorKind::WouldBlock => {},
                    Err(err) => return Err(map_wayland_error("Failed to read Wayland events", err)),
                }
            }
        }

        self.dispatch_pending()?;
        let bridge = &mut self.state.bridge;
        bridge.dispatch_timers(Instant::now());
        bridge.after_dispatch();
        self.flush()
    }
}

impl Drop for WaylandClient {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
