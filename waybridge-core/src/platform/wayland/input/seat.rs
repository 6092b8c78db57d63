#![cfg(target_os = "linux")]

//! Seat management.

use wayland_client::protocol::wl_seat;
use wayland_client::{Connection, Dispatch, QueueHandle, WEnum};

use super::super::shell::WaylandClientState;
use crate::handle::Handle;

impl Dispatch<wl_seat::WlSeat, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _seat: &wl_seat::WlSeat,
        event: wl_seat::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_seat::Event::Capabilities { capabilities } => {
                let bits = match capabilities {
                    WEnum::Value(capabilities) => capabilities.bits(),
                    WEnum::Unknown(raw) => raw,
                };
                let result = state.bridge.on_seat_capabilities(*handle, bits);
                state.record(result);
            },
            wl_seat::Event::Name { name } => state.bridge.on_seat_name(*handle, name),
            _ => {},
        }
    }
}
