#![cfg(target_os = "linux")]

//! Compositor, surface, region, callback and shm dispatch.

use wayland_client::protocol::{wl_callback, wl_compositor, wl_region, wl_shm, wl_surface};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle};

use super::shell::WaylandClientState;
use crate::handle::Handle;

impl Dispatch<wl_compositor::WlCompositor, Handle> for WaylandClientState {
    fn event(
        _state: &mut Self,
        _compositor: &wl_compositor::WlCompositor,
        _event: wl_compositor::Event,
        _handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        // No events
    }
}

impl Dispatch<wl_region::WlRegion, ()> for WaylandClientState {
    fn event(
        _state: &mut Self,
        _region: &wl_region::WlRegion,
        _event: wl_region::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        // No events
    }
}

impl Dispatch<wl_shm::WlShm, Handle> for WaylandClientState {
    fn event(
        _state: &mut Self,
        _shm: &wl_shm::WlShm,
        event: wl_shm::Event,
        _handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_shm::Event::Format { format } = event {
            log::trace!("wl_shm format {:?}", format);
        }
    }
}

impl Dispatch<wl_surface::WlSurface, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _surface: &wl_surface::WlSurface,
        event: wl_surface::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_surface::Event::Enter { output } => {
                if let Some(output) = output.data::<Handle>() {
                    state.bridge.on_surface_enter(*handle, *output);
                }
            },
            wl_surface::Event::Leave { output } => {
                if let Some(output) = output.data::<Handle>() {
                    state.bridge.on_surface_leave(*handle, *output);
                }
            },
            _ => {},
        }
    }
}

impl Dispatch<wl_callback::WlCallback, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _callback: &wl_callback::WlCallback,
        event: wl_callback::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { callback_data } = event {
            log::trace!("Wayland: Frame done for {:?}", handle);
            state.bridge.on_frame_done(*handle, callback_data);
        }
    }
}
