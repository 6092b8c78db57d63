//! Unified event types emitted by the bridge.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

use crate::bridge::output::OutputInfo;
use crate::bridge::seat::Capabilities;
use crate::bridge::shell::ToplevelStates;
use crate::handle::Handle;

/// Events delivered to the toolkit's run loop, in protocol order.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    GlobalAdded {
        name: u32,
        interface: String,
        version: u32,
    },
    GlobalRemoved {
        name: u32,
    },
    SurfaceConfigured {
        surface: Handle,
        width: u32,
        height: u32,
        states: ToplevelStates,
    },
    ToplevelCloseRequested {
        surface: Handle,
    },
    SurfaceScaleChanged {
        surface: Handle,
        scale: i32,
    },
    SurfaceDestroyed {
        surface: Handle,
    },
    SeatCapabilitiesChanged {
        capabilities: Capabilities,
    },
    PointerFrame {
        surface: Option<Handle>,
        events: Vec<PointerSubEvent>,
    },
    TouchFrame {
        events: Vec<TouchSubEvent>,
    },
    KeyboardFocus {
        surface: Handle,
        focused: bool,
    },
    KeyEvent {
        code: u32,
        state: KeyState,
        timestamp: Duration,
    },
    Modifiers {
        depressed: u32,
        latched: u32,
        locked: u32,
        group: u32,
    },
    RepeatInfo {
        rate: i32,
        delay: i32,
    },
    KeymapChanged {
        keymap: String,
    },
    TextInputFocus {
        surface: Handle,
        focused: bool,
    },
    TextInputDeleteSurrounding {
        before: u32,
        after: u32,
    },
    TextInputCommitted {
        text: String,
    },
    TextInputPreedit {
        text: String,
        cursor: Option<(i32, i32)>,
    },
    FrameDone {
        surface: Handle,
        timestamp: Duration,
    },
    OutputChanged {
        output: Handle,
        info: OutputInfo,
    },
    OutputRemoved {
        output: Handle,
    },
}

/// Scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Physical source of a scroll sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSource {
    Wheel,
    Finger,
    Continuous,
    WheelTilt,
}

/// Scroll distance on one axis for one frame.
///
/// Wheel notches win over the continuous distance when both arrive in the
/// same frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAmount {
    Discrete(i32),
    Continuous(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
    /// Synthesized by the bridge's key repeat.
    Repeated,
}

/// One entry of a [`BridgeEvent::PointerFrame`].
#[derive(Debug, Clone, PartialEq)]
pub enum PointerSubEvent {
    Enter {
        x: f64,
        y: f64,
    },
    Leave,
    Motion {
        time: Duration,
        x: f64,
        y: f64,
    },
    /// `button` is the raw evdev code.
    Button {
        time: Duration,
        button: u32,
        state: ButtonState,
    },
    Scroll {
        time: Duration,
        axis: Axis,
        amount: ScrollAmount,
        source: Option<AxisSource>,
    },
    ScrollStop {
        time: Duration,
        axis: Axis,
    },
}

/// One entry of a [`BridgeEvent::TouchFrame`].
#[derive(Debug, Clone, PartialEq)]
pub enum TouchSubEvent {
    Down {
        id: i32,
        surface: Handle,
        time: Duration,
        x: f64,
        y: f64,
    },
    Motion {
        id: i32,
        surface: Handle,
        time: Duration,
        x: f64,
        y: f64,
    },
    Up {
        id: i32,
        surface: Handle,
        time: Duration,
        x: f64,
        y: f64,
    },
    Cancel,
}

/// Receiver of bridge events.
///
/// Host-specific adapters (see [`crate::host`]) implement this so the core
/// never depends on a particular binding.
pub trait EventSink {
    fn emit(&mut self, event: BridgeEvent);
}

impl EventSink for VecDeque<BridgeEvent> {
    fn emit(&mut self, event: BridgeEvent) {
        self.push_back(event);
    }
}

impl EventSink for Vec<BridgeEvent> {
    fn emit(&mut self, event: BridgeEvent) {
        self.push(event);
    }
}

impl EventSink for mpsc::Sender<BridgeEvent> {
    fn emit(&mut self, event: BridgeEvent) {
        if self.send(event).is_err() {
            log::debug!("Bridge event receiver dropped, discarding event");
        }
    }
}
