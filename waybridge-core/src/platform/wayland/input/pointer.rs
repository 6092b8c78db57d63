#![cfg(target_os = "linux")]

//! Pointer input handling.

use wayland_client::protocol::wl_pointer;
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum};

use super::super::shell::WaylandClientState;
use crate::bridge::pointer::RawPointerEvent;
use crate::events::{Axis, AxisSource};
use crate::handle::Handle;

fn axis(axis: WEnum<wl_pointer::Axis>) -> Option<Axis> {
    match axis {
        WEnum::Value(wl_pointer::Axis::VerticalScroll) => Some(Axis::Vertical),
        WEnum::Value(wl_pointer::Axis::HorizontalScroll) => Some(Axis::Horizontal),
        _ => None,
    }
}

fn axis_source(source: WEnum<wl_pointer::AxisSource>) -> Option<AxisSource> {
    match source {
        WEnum::Value(wl_pointer::AxisSource::Wheel) => Some(AxisSource::Wheel),
        WEnum::Value(wl_pointer::AxisSource::Finger) => Some(AxisSource::Finger),
        WEnum::Value(wl_pointer::AxisSource::Continuous) => Some(AxisSource::Continuous),
        WEnum::Value(wl_pointer::AxisSource::WheelTilt) => Some(AxisSource::WheelTilt),
        _ => None,
    }
}

impl Dispatch<wl_pointer::WlPointer, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _pointer: &wl_pointer::WlPointer,
        event: wl_pointer::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let event = match event {
            wl_pointer::Event::Enter {
                surface,
                surface_x,
                surface_y,
                ..
            } => match surface.data::<Handle>() {
                Some(surface) => RawPointerEvent::Enter {
                    surface: *surface,
                    x: surface_x,
                    y: surface_y,
                },
                None => return,
            },
            wl_pointer::Event::Leave { surface, .. } => match surface.data::<Handle>() {
                Some(surface) => RawPointerEvent::Leave { surface: *surface },
                None => return,
            },
            wl_pointer::Event::Motion {
                time,
                surface_x,
                surface_y,
            } => RawPointerEvent::Motion {
                time,
                x: surface_x,
                y: surface_y,
            },
            wl_pointer::Event::Button {
                time,
                button,
                state: button_state,
                ..
            } => RawPointerEvent::Button {
                time,
                button,
                pressed: matches!(button_state, WEnum::Value(wl_pointer::ButtonState::Pressed)),
            },
            wl_pointer::Event::Axis {
                time,
                axis: raw_axis,
                value,
            } => match axis(raw_axis) {
                Some(axis) => RawPointerEvent::Axis { time, axis, value },
                None => return,
            },
            wl_pointer::Event::AxisSource { axis_source: source } => match axis_source(source) {
                Some(source) => RawPointerEvent::AxisSource(source),
                None => return,
            },
            wl_pointer::Event::AxisStop { time, axis: raw_axis } => match axis(raw_axis) {
                Some(axis) => RawPointerEvent::AxisStop { time, axis },
                None => return,
            },
            wl_pointer::Event::AxisDiscrete {
                axis: raw_axis,
                discrete,
            } => match axis(raw_axis) {
                Some(axis) => RawPointerEvent::AxisDiscrete { axis, discrete },
                None => return,
            },
            wl_pointer::Event::Frame => RawPointerEvent::Frame,
            _ => return,
        };
        state.bridge.on_pointer_event(*handle, event);
    }
}
