#![cfg(target_os = "linux")]

//! XDG shell protocol handling.

use wayland_client::{Connection, Dispatch, QueueHandle};
use wayland_protocols::xdg::decoration::zv1::client::{zxdg_decoration_manager_v1, zxdg_toplevel_decoration_v1};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

use super::protocol::WaylandProtocol;
use crate::bridge::Bridge;
use crate::error::BridgeError;
use crate::handle::Handle;

/// Wayland client state for dispatch implementations.
pub struct WaylandClientState {
    pub(crate) bridge: Bridge<WaylandProtocol>,
    // First fatal error raised inside a dispatch callback.
    error: Option<BridgeError>,
}

impl WaylandClientState {
    pub fn new(bridge: Bridge<WaylandProtocol>) -> Self {
        Self { bridge, error: None }
    }

    pub(crate) fn record(&mut self, result: Result<(), BridgeError>) {
        if let Err(err) = result {
            if self.error.is_none() {
                log::error!("Bridge failed during dispatch: {err}");
                self.error = Some(err);
            }
        }
    }

    /// Return the error recorded during the last dispatch, if any.
    pub(crate) fn take_error(&mut self) -> Result<(), BridgeError> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Dispatch<xdg_wm_base::XdgWmBase, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _wm_base: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            state.bridge.on_ping(*handle, serial);
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _xdg_surface: &xdg_surface::XdgSurface,
        event: xdg_surface::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            log::trace!("Wayland xdg_surface configure serial={} ({:?})", serial, handle);
            state.bridge.on_shell_surface_configure(*handle, serial);
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _toplevel: &xdg_toplevel::XdgToplevel,
        event: xdg_toplevel::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, states } => {
                // The state array is a packed list of native-endian u32.
                let states: Vec<u32> = states
                    .chunks_exact(4)
                    .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .collect();
                state.bridge.on_toplevel_configure(*handle, width, height, &states);
            },
            xdg_toplevel::Event::Close => {
                log::debug!("Wayland XdgToplevel({:?}) close", handle);
                state.bridge.on_toplevel_close(*handle);
            },
            _ => {},
        }
    }
}

impl Dispatch<zxdg_decoration_manager_v1::ZxdgDecorationManagerV1, Handle> for WaylandClientState {
    fn event(
        _state: &mut Self,
        _manager: &zxdg_decoration_manager_v1::ZxdgDecorationManagerV1,
        _event: zxdg_decoration_manager_v1::Event,
        _handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        // No events for manager
    }
}

impl Dispatch<zxdg_toplevel_decoration_v1::ZxdgToplevelDecorationV1, Handle> for WaylandClientState {
    fn event(
        _state: &mut Self,
        _decoration: &zxdg_toplevel_decoration_v1::ZxdgToplevelDecorationV1,
        event: zxdg_toplevel_decoration_v1::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let zxdg_toplevel_decoration_v1::Event::Configure { mode } = event {
            log::debug!("Decoration mode for {:?}: {:?}", handle, mode);
        }
    }
}
