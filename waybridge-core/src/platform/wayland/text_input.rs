#![cfg(target_os = "linux")]

//! Text input support via zwp_text_input_manager_v3.

use wayland_client::{Connection, Dispatch, Proxy, QueueHandle};
use wayland_protocols::wp::text_input::zv3::client::{zwp_text_input_manager_v3, zwp_text_input_v3};

use super::shell::WaylandClientState;
use crate::bridge::text_input::RawTextInputEvent;
use crate::handle::Handle;

impl Dispatch<zwp_text_input_manager_v3::ZwpTextInputManagerV3, Handle> for WaylandClientState {
    fn event(
        _state: &mut Self,
        _manager: &zwp_text_input_manager_v3::ZwpTextInputManagerV3,
        _event: zwp_text_input_manager_v3::Event,
        _handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        // No events for manager
    }
}

impl Dispatch<zwp_text_input_v3::ZwpTextInputV3, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _text_input: &zwp_text_input_v3::ZwpTextInputV3,
        event: zwp_text_input_v3::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let event = match event {
            zwp_text_input_v3::Event::Enter { surface } => match surface.data::<Handle>() {
                Some(surface) => RawTextInputEvent::Enter { surface: *surface },
                None => return,
            },
            zwp_text_input_v3::Event::Leave { surface } => match surface.data::<Handle>() {
                Some(surface) => RawTextInputEvent::Leave { surface: *surface },
                None => return,
            },
            zwp_text_input_v3::Event::PreeditString {
                text,
                cursor_begin,
                cursor_end,
            } => RawTextInputEvent::PreeditString {
                text,
                cursor_begin,
                cursor_end,
            },
            zwp_text_input_v3::Event::CommitString { text } => RawTextInputEvent::CommitString { text },
            zwp_text_input_v3::Event::DeleteSurroundingText {
                before_length,
                after_length,
            } => RawTextInputEvent::DeleteSurroundingText {
                before: before_length,
                after: after_length,
            },
            zwp_text_input_v3::Event::Done { serial } => RawTextInputEvent::Done { serial },
            _ => return,
        };
        state.bridge.on_text_input_event(*handle, event);
    }
}
