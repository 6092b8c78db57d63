//! Pointer frame accumulation.

use std::time::Duration;

use super::{Bridge, ObjectKind, Protocol};
use crate::events::{Axis, AxisSource, BridgeEvent, ButtonState, PointerSubEvent, ScrollAmount};
use crate::handle::Handle;

/// Raw `wl_pointer` events as delivered by the glue layer.
///
/// Times are the protocol's 32-bit millisecond stamps.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPointerEvent {
    Enter { surface: Handle, x: f64, y: f64 },
    Leave { surface: Handle },
    Motion { time: u32, x: f64, y: f64 },
    Button { time: u32, button: u32, pressed: bool },
    Axis { time: u32, axis: Axis, value: f64 },
    AxisSource(AxisSource),
    AxisStop { time: u32, axis: Axis },
    AxisDiscrete { axis: Axis, discrete: i32 },
    Frame,
}

#[derive(Debug)]
pub(crate) struct PointerDevice {
    pub(crate) handle: Handle,
    focus: Option<Handle>,
    pending: Vec<PointerSubEvent>,
    // Surface named by an enter/leave in the open frame.
    frame_surface: Option<Handle>,
    source: Option<AxisSource>,
    // Index into `pending` of each axis' scroll entry.
    scroll_slots: [Option<usize>; 2],
}

fn slot(axis: Axis) -> usize {
    match axis {
        Axis::Vertical => 0,
        Axis::Horizontal => 1,
    }
}

impl PointerDevice {
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            focus: None,
            pending: Vec::new(),
            frame_surface: None,
            source: None,
            scroll_slots: [None; 2],
        }
    }

    pub(crate) fn has_open_frame(&self) -> bool {
        !self.pending.is_empty() || self.source.is_some()
    }

    pub(crate) fn focus(&self) -> Option<Handle> {
        self.focus
    }

    pub(crate) fn forget_surface(&mut self, surface: Handle) {
        if self.focus == Some(surface) {
            self.focus = None;
        }
        if self.frame_surface == Some(surface) {
            self.reset_frame();
        }
    }

    fn reset_frame(&mut self) {
        self.pending.clear();
        self.frame_surface = None;
        self.source = None;
        self.scroll_slots = [None; 2];
    }

    fn scroll(&mut self, time: Option<Duration>, axis: Axis, amount: ScrollAmount) {
        let index = slot(axis);
        if let Some(PointerSubEvent::Scroll {
            time: entry_time,
            amount: entry_amount,
            ..
        }) = self.scroll_slots[index].and_then(|i| self.pending.get_mut(i))
        {
            if let Some(time) = time {
                *entry_time = time;
            }
            let discrete_seen = matches!(entry_amount, ScrollAmount::Discrete(_));
            match amount {
                ScrollAmount::Discrete(_) => *entry_amount = amount,
                ScrollAmount::Continuous(value) if !discrete_seen => {
                    *entry_amount = ScrollAmount::Continuous(value);
                },
                ScrollAmount::Continuous(_) => {},
            }
            return;
        }
        self.scroll_slots[index] = Some(self.pending.len());
        self.pending.push(PointerSubEvent::Scroll {
            time: time.unwrap_or_default(),
            axis,
            amount,
            source: None,
        });
    }

    fn finish_frame(&mut self) -> Option<(Option<Handle>, Vec<PointerSubEvent>)> {
        let source = self.source;
        let surface = self.frame_surface.or(self.focus);
        let mut events = std::mem::take(&mut self.pending);
        self.reset_frame();
        if events.is_empty() {
            return None;
        }
        for event in events.iter_mut() {
            if let PointerSubEvent::Scroll { source: entry, .. } = event {
                *entry = source;
            }
        }
        Some((surface, events))
    }
}

impl<P: Protocol> Bridge<P> {
    /// Feed one `wl_pointer` event; a `Frame` emits the accumulated batch.
    pub fn on_pointer_event(&mut self, pointer: Handle, event: RawPointerEvent) {
        if !self.resolve(pointer, ObjectKind::Pointer) {
            return;
        }
        if let RawPointerEvent::Enter { surface, .. } | RawPointerEvent::Leave { surface } = event {
            if !self.resolve(surface, ObjectKind::Surface) {
                return;
            }
        }
        let clock = &mut self.clock;
        let Some(device) = self
            .seat
            .as_mut()
            .and_then(|seat| seat.pointer.as_mut())
            .filter(|device| device.handle == pointer)
        else {
            return;
        };

        let frame = match event {
            RawPointerEvent::Enter { surface, x, y } => {
                device.focus = Some(surface);
                device.frame_surface = Some(surface);
                device.pending.push(PointerSubEvent::Enter { x, y });
                None
            },
            RawPointerEvent::Leave { surface } => {
                device.focus = None;
                device.frame_surface = Some(surface);
                device.pending.push(PointerSubEvent::Leave);
                None
            },
            RawPointerEvent::Motion { time, x, y } => {
                let time = clock.extend(time);
                device.pending.push(PointerSubEvent::Motion { time, x, y });
                None
            },
            RawPointerEvent::Button { time, button, pressed } => {
                let time = clock.extend(time);
                let state = if pressed {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                device.pending.push(PointerSubEvent::Button { time, button, state });
                None
            },
            RawPointerEvent::Axis { time, axis, value } => {
                let time = clock.extend(time);
                device.scroll(Some(time), axis, ScrollAmount::Continuous(value));
                None
            },
            RawPointerEvent::AxisDiscrete { axis, discrete } => {
                device.scroll(None, axis, ScrollAmount::Discrete(discrete));
                None
            },
            RawPointerEvent::AxisSource(source) => {
                device.source = Some(source);
                None
            },
            RawPointerEvent::AxisStop { time, axis } => {
                let time = clock.extend(time);
                device.pending.push(PointerSubEvent::ScrollStop { time, axis });
                None
            },
            RawPointerEvent::Frame => device.finish_frame(),
        };

        if let Some((surface, events)) = frame {
            self.emit(BridgeEvent::PointerFrame { surface, events });
        }
    }

    /// Surface the pointer is currently over.
    pub fn pointer_focus(&self) -> Option<Handle> {
        self.seat.as_ref()?.pointer.as_ref()?.focus()
    }
}
