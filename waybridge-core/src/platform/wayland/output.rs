#![cfg(target_os = "linux")]

//! Output (monitor) events.

use wayland_client::protocol::wl_output;
use wayland_client::{Connection, Dispatch, QueueHandle, WEnum};

use super::shell::WaylandClientState;
use crate::bridge::output::OutputEvent;
use crate::handle::Handle;

impl Dispatch<wl_output::WlOutput, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _output: &wl_output::WlOutput,
        event: wl_output::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let event = match event {
            wl_output::Event::Geometry {
                x,
                y,
                physical_width,
                physical_height,
                make,
                model,
                transform,
                ..
            } => OutputEvent::Geometry {
                x,
                y,
                physical_width,
                physical_height,
                make,
                model,
                transform: match transform {
                    WEnum::Value(transform) => u32::from(transform) as i32,
                    WEnum::Unknown(raw) => raw as i32,
                },
            },
            wl_output::Event::Mode {
                flags,
                width,
                height,
                refresh,
            } => OutputEvent::Mode {
                current: matches!(flags, WEnum::Value(flags) if flags.contains(wl_output::Mode::Current)),
                width,
                height,
                refresh,
            },
            wl_output::Event::Scale { factor } => OutputEvent::Scale(factor),
            wl_output::Event::Name { name } => OutputEvent::Name(name),
            wl_output::Event::Description { description } => OutputEvent::Description(description),
            wl_output::Event::Done => OutputEvent::Done,
            _ => return,
        };
        state.bridge.on_output_event(*handle, event);
    }
}
