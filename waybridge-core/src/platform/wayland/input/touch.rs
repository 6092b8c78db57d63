#![cfg(target_os = "linux")]

//! Touch input handling.

use wayland_client::protocol::wl_touch;
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle};

use super::super::shell::WaylandClientState;
use crate::bridge::touch::RawTouchEvent;
use crate::handle::Handle;

impl Dispatch<wl_touch::WlTouch, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _touch: &wl_touch::WlTouch,
        event: wl_touch::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let event = match event {
            wl_touch::Event::Down {
                time, surface, id, x, y, ..
            } => match surface.data::<Handle>() {
                Some(surface) => RawTouchEvent::Down {
                    id,
                    surface: *surface,
                    time,
                    x,
                    y,
                },
                None => return,
            },
            wl_touch::Event::Up { time, id, .. } => RawTouchEvent::Up { id, time },
            wl_touch::Event::Motion { time, id, x, y } => RawTouchEvent::Motion { id, time, x, y },
            wl_touch::Event::Frame => RawTouchEvent::Frame,
            wl_touch::Event::Cancel => RawTouchEvent::Cancel,
            _ => return,
        };
        state.bridge.on_touch_event(*handle, event);
    }
}
