//! Capabilities the bridge needs from host bindings.
//!
//! The core never links a particular host. A binding that forwards events
//! into a managed runtime implements [`ForeignInvoker`]; one that owns native
//! views implements [`BackingStoreHost`]. The sinks in this module adapt
//! [`BridgeEvent`]s to those capabilities.

use std::collections::HashMap;

use thiserror::Error;

use crate::events::{BridgeEvent, ButtonState, EventSink, KeyState, PointerSubEvent, ScrollAmount, TouchSubEvent};
use crate::handle::Handle;

/// Failures reported by a host binding.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Foreign method {method}{signature} not found")]
    MethodNotFound { method: String, signature: String },

    #[error("Foreign call {0} raised: {1}")]
    CallFailed(String, String),

    #[error("Backing store for {0:?} could not be attached: {1}")]
    AttachFailed(Handle, String),
}

/// Argument or return value of a foreign call.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignValue {
    Void,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
}

/// "Invoke a named method on a foreign object given its type signature."
///
/// Signatures use the JVM descriptor syntax, e.g. `(JII)V`.
pub trait ForeignInvoker {
    fn invoke(&mut self, method: &str, signature: &str, args: &[ForeignValue]) -> Result<ForeignValue, HostError>;
}

/// "Attach or detach a drawable backing store to a native view."
pub trait BackingStoreHost {
    /// Attach or resize the backing store of `surface` (pixel size).
    fn attach(&mut self, surface: Handle, width: u32, height: u32, scale: i32) -> Result<(), HostError>;

    fn detach(&mut self, surface: Handle);
}

fn long(handle: Handle) -> ForeignValue {
    ForeignValue::Long(handle.to_bits() as i64)
}

fn millis(duration: std::time::Duration) -> ForeignValue {
    ForeignValue::Long(duration.as_millis() as i64)
}

/// Forwards events as method calls on a foreign object.
pub struct ForeignEventSink<I: ForeignInvoker> {
    invoker: I,
    failures: u64,
}

impl<I: ForeignInvoker> ForeignEventSink<I> {
    pub fn new(invoker: I) -> Self {
        Self { invoker, failures: 0 }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Calls the host rejected so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn call(&mut self, method: &str, signature: &str, args: Vec<ForeignValue>) {
        if let Err(err) = self.invoker.invoke(method, signature, &args) {
            self.failures += 1;
            log::warn!("Host rejected {}: {err}", method);
        }
    }

    fn pointer(&mut self, surface: Option<Handle>, event: PointerSubEvent) {
        let surface = surface.map(long).unwrap_or(ForeignValue::Long(-1));
        match event {
            PointerSubEvent::Enter { x, y } => {
                self.call("onPointerEnter", "(JDD)V", vec![surface, ForeignValue::Double(x), ForeignValue::Double(y)]);
            },
            PointerSubEvent::Leave => self.call("onPointerLeave", "(J)V", vec![surface]),
            PointerSubEvent::Motion { time, x, y } => self.call(
                "onPointerMotion",
                "(JJDD)V",
                vec![surface, millis(time), ForeignValue::Double(x), ForeignValue::Double(y)],
            ),
            PointerSubEvent::Button { time, button, state } => self.call(
                "onPointerButton",
                "(JJIZ)V",
                vec![
                    surface,
                    millis(time),
                    ForeignValue::Int(button as i32),
                    ForeignValue::Bool(state == ButtonState::Pressed),
                ],
            ),
            PointerSubEvent::Scroll { time, axis, amount, .. } => {
                let (discrete, value) = match amount {
                    ScrollAmount::Discrete(notches) => (true, notches as f64),
                    ScrollAmount::Continuous(value) => (false, value),
                };
                self.call(
                    "onPointerScroll",
                    "(JJIZD)V",
                    vec![
                        surface,
                        millis(time),
                        ForeignValue::Int(axis as i32),
                        ForeignValue::Bool(discrete),
                        ForeignValue::Double(value),
                    ],
                );
            },
            PointerSubEvent::ScrollStop { .. } => {},
        }
    }

    fn touch(&mut self, event: TouchSubEvent) {
        let (action, id, surface, time, x, y) = match event {
            TouchSubEvent::Down { id, surface, time, x, y } => (0, id, surface, time, x, y),
            TouchSubEvent::Up { id, surface, time, x, y } => (1, id, surface, time, x, y),
            TouchSubEvent::Motion { id, surface, time, x, y } => (2, id, surface, time, x, y),
            TouchSubEvent::Cancel => {
                self.call("onTouchCancel", "()V", Vec::new());
                return;
            },
        };
        self.call(
            "onTouch",
            "(IIJJDD)V",
            vec![
                ForeignValue::Int(action),
                ForeignValue::Int(id),
                long(surface),
                millis(time),
                ForeignValue::Double(x),
                ForeignValue::Double(y),
            ],
        );
    }
}

impl<I: ForeignInvoker> EventSink for ForeignEventSink<I> {
    fn emit(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::SurfaceConfigured {
                surface,
                width,
                height,
                states,
            } => self.call(
                "onConfigure",
                "(JIII)V",
                vec![
                    long(surface),
                    ForeignValue::Int(width as i32),
                    ForeignValue::Int(height as i32),
                    ForeignValue::Int(states.bits() as i32),
                ],
            ),
            BridgeEvent::ToplevelCloseRequested { surface } => {
                self.call("onCloseRequested", "(J)V", vec![long(surface)]);
            },
            BridgeEvent::SurfaceDestroyed { surface } => {
                self.call("onSurfaceDestroyed", "(J)V", vec![long(surface)]);
            },
            BridgeEvent::SurfaceScaleChanged { surface, scale } => {
                self.call("onScaleChanged", "(JI)V", vec![long(surface), ForeignValue::Int(scale)]);
            },
            BridgeEvent::PointerFrame { surface, events } => {
                for event in events {
                    self.pointer(surface, event);
                }
                self.call("onPointerFrame", "()V", Vec::new());
            },
            BridgeEvent::TouchFrame { events } => {
                for event in events {
                    self.touch(event);
                }
                self.call("onTouchFrame", "()V", Vec::new());
            },
            BridgeEvent::KeyboardFocus { surface, focused } => {
                self.call("onFocus", "(JZ)V", vec![long(surface), ForeignValue::Bool(focused)]);
            },
            BridgeEvent::KeyEvent { code, state, timestamp } => {
                let state = match state {
                    KeyState::Released => 0,
                    KeyState::Pressed => 1,
                    KeyState::Repeated => 2,
                };
                self.call(
                    "onKey",
                    "(IIJ)V",
                    vec![ForeignValue::Int(code as i32), ForeignValue::Int(state), millis(timestamp)],
                );
            },
            BridgeEvent::TextInputCommitted { text } => {
                self.call("onTextCommit", "(Ljava/lang/String;)V", vec![ForeignValue::String(text)]);
            },
            BridgeEvent::TextInputPreedit { text, cursor } => {
                let (begin, end) = cursor.unwrap_or((-1, -1));
                self.call(
                    "onTextPreedit",
                    "(Ljava/lang/String;II)V",
                    vec![ForeignValue::String(text), ForeignValue::Int(begin), ForeignValue::Int(end)],
                );
            },
            BridgeEvent::TextInputDeleteSurrounding { before, after } => self.call(
                "onTextDeleteSurrounding",
                "(II)V",
                vec![ForeignValue::Int(before as i32), ForeignValue::Int(after as i32)],
            ),
            BridgeEvent::FrameDone { surface, timestamp } => {
                self.call("onFrame", "(JJ)V", vec![long(surface), millis(timestamp)]);
            },
            other => log::trace!("No foreign counterpart for {:?}", other),
        }
    }
}

/// Keeps host backing stores sized to their surfaces and passes every event
/// on to `next`.
pub struct BackingStoreSink<H: BackingStoreHost, S: EventSink> {
    host: H,
    next: S,
    // surface -> (logical size, scale)
    attached: HashMap<Handle, ((u32, u32), i32)>,
}

impl<H: BackingStoreHost, S: EventSink> BackingStoreSink<H, S> {
    pub fn new(host: H, next: S) -> Self {
        Self {
            host,
            next,
            attached: HashMap::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn next(&self) -> &S {
        &self.next
    }

    fn attach(&mut self, surface: Handle, size: (u32, u32), scale: i32) {
        let factor = scale.max(1) as u32;
        let (width, height) = (size.0.saturating_mul(factor), size.1.saturating_mul(factor));
        match self.host.attach(surface, width, height, scale) {
            Ok(()) => {
                self.attached.insert(surface, (size, scale));
            },
            Err(err) => log::warn!("{err}"),
        }
    }
}

impl<H: BackingStoreHost, S: EventSink> EventSink for BackingStoreSink<H, S> {
    fn emit(&mut self, event: BridgeEvent) {
        match &event {
            BridgeEvent::SurfaceConfigured {
                surface, width, height, ..
            } => {
                let scale = self.attached.get(surface).map(|(_, scale)| *scale).unwrap_or(1);
                if self.attached.get(surface) != Some(&((*width, *height), scale)) {
                    self.attach(*surface, (*width, *height), scale);
                }
            },
            BridgeEvent::SurfaceScaleChanged { surface, scale } => {
                if let Some((size, _)) = self.attached.get(surface).copied() {
                    self.attach(*surface, size, *scale);
                }
            },
            BridgeEvent::SurfaceDestroyed { surface } => {
                if self.attached.remove(surface).is_some() {
                    self.host.detach(*surface);
                }
            },
            _ => {},
        }
        self.next.emit(event);
    }
}
