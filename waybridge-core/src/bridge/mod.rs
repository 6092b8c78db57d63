//! Protocol-agnostic bridge state.
//!
//! [`Bridge`] owns every bound protocol object (in a generation-checked
//! arena) together with the per-component state built on top of them. The
//! platform glue feeds raw protocol events into the `on_*` methods and the
//! bridge answers through the [`Protocol`] seam, which is the only writer to
//! the connection. Each component lives in its own submodule as an
//! `impl Bridge` block plus its private state.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::events::{BridgeEvent, EventSink};
use crate::handle::{Handle, HandleArena};
use crate::handoff::{Deferred, Handoff, HandoffSender};
use crate::time::Clock;

pub mod frame;
pub mod keyboard;
pub mod output;
pub mod pointer;
pub mod registry;
pub mod seat;
pub mod shell;
pub mod text_input;
pub mod touch;

#[cfg(test)]
pub(crate) mod mock;

use frame::FrameScheduler;
use output::OutputState;
use registry::{GlobalObject, InterfaceKind, Registry};
use seat::{Capabilities, Seat};
use shell::{ToplevelOptions, Window};
use text_input::{TextInputRequest, TextInputSession};

/// What a bound object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Global(InterfaceKind),
    Surface,
    Toplevel,
    Pointer,
    Keyboard,
    Touch,
    TextInput,
    FrameCallback,
}

/// A protocol object owned by the bridge.
#[derive(Debug)]
pub struct BoundObject<O> {
    pub kind: ObjectKind,
    pub object: O,
    /// Registry name for objects bound from a global.
    pub global: Option<u32>,
}

/// Outgoing side of the display connection.
///
/// Every constructor receives the [`Handle`] the new object will be stored
/// under so the implementation can attach it as the proxy's listener data.
pub trait Protocol {
    /// Concrete protocol proxy.
    type Object: Clone;

    /// Bind an advertised global.
    fn bind(
        &mut self,
        handle: Handle,
        global: &GlobalObject,
        kind: InterfaceKind,
        version: u32,
    ) -> Result<Self::Object, BridgeError>;

    /// Create the input device for a single capability bit of a seat.
    fn get_device(
        &mut self,
        handle: Handle,
        seat: &Self::Object,
        capability: Capabilities,
    ) -> Result<Self::Object, BridgeError>;

    fn create_surface(
        &mut self,
        handle: Handle,
        compositor: &Self::Object,
    ) -> Result<Self::Object, BridgeError>;

    /// Give `surface` the toplevel role and perform the initial bare commit.
    fn create_toplevel(
        &mut self,
        handle: Handle,
        shell: &Self::Object,
        surface: &Self::Object,
        decorations: Option<&Self::Object>,
        options: &ToplevelOptions,
    ) -> Result<Self::Object, BridgeError>;

    fn get_text_input(
        &mut self,
        handle: Handle,
        manager: &Self::Object,
        seat: &Self::Object,
    ) -> Result<Self::Object, BridgeError>;

    /// Request a one-shot frame callback on `surface`.
    fn frame(&mut self, handle: Handle, surface: &Self::Object) -> Result<Self::Object, BridgeError>;

    /// Acknowledge a configure and apply the acknowledged geometry.
    fn ack_configure(&mut self, toplevel: &Self::Object, serial: u32, size: (u32, u32));

    fn set_buffer_scale(&mut self, surface: &Self::Object, scale: i32);

    fn commit(&mut self, surface: &Self::Object);

    fn pong(&mut self, shell: &Self::Object, serial: u32);

    fn text_input(&mut self, text_input: &Self::Object, request: &TextInputRequest);

    /// Release the object on the server side.
    fn destroy(&mut self, object: Self::Object);
}

/// Conditions the bridge recovered from without surfacing an error.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Events dropped because their object was already destroyed.
    pub stale_events: u64,
    /// Globals skipped because their version is below the supported minimum.
    pub unsupported_globals: Vec<GlobalObject>,
}

/// Client-side bridge between protocol events and [`BridgeEvent`]s.
pub struct Bridge<P: Protocol> {
    pub(crate) protocol: P,
    pub(crate) config: BridgeConfig,
    pub(crate) objects: HandleArena<BoundObject<P::Object>>,
    pub(crate) registry: Registry,
    pub(crate) windows: HashMap<Handle, Window>,
    // toplevel handle -> surface handle
    pub(crate) roles: HashMap<Handle, Handle>,
    pub(crate) seat: Option<Seat>,
    pub(crate) text_input: Option<TextInputSession>,
    pub(crate) frames: FrameScheduler,
    pub(crate) outputs: HashMap<Handle, OutputState>,
    pub(crate) clock: Clock,
    pub(crate) events: VecDeque<BridgeEvent>,
    pub(crate) diagnostics: Diagnostics,
    handoff: Handoff,
}

impl<P: Protocol> Bridge<P> {
    /// Create a bridge writing through `protocol`.
    pub fn new(protocol: P, config: BridgeConfig) -> Result<Self, BridgeError> {
        let handoff = Handoff::new()
            .map_err(|e| BridgeError::ConnectionLost(format!("Failed to create wakeup socket: {e}")))?;
        Ok(Self {
            protocol,
            config,
            objects: HandleArena::new(),
            registry: Registry::default(),
            windows: HashMap::new(),
            roles: HashMap::new(),
            seat: None,
            text_input: None,
            frames: FrameScheduler::default(),
            outputs: HashMap::new(),
            clock: Clock::new(),
            events: VecDeque::new(),
            diagnostics: Diagnostics::default(),
            handoff,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut P {
        &mut self.protocol
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Whether `handle` refers to a live bound object.
    pub fn is_live(&self, handle: Handle) -> bool {
        self.objects.contains(handle)
    }

    /// Number of live bound objects of `kind`.
    pub fn live_objects(&self, kind: ObjectKind) -> usize {
        self.objects.iter().filter(|(_, bound)| bound.kind == kind).count()
    }

    /// The protocol object behind a live handle.
    pub fn object(&self, handle: Handle) -> Option<&P::Object> {
        self.objects.get(handle).map(|bound| &bound.object)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Take all queued events in order.
    pub fn drain_events(&mut self) -> Vec<BridgeEvent> {
        self.events.drain(..).collect()
    }

    /// Hand all queued events to `sink` in order.
    pub fn forward_events(&mut self, sink: &mut dyn EventSink) {
        while let Some(event) = self.events.pop_front() {
            sink.emit(event);
        }
    }

    /// Sender other threads use to post work into the dispatch thread.
    pub fn handoff_sender(&self) -> HandoffSender {
        self.handoff.sender()
    }

    pub(crate) fn handoff(&self) -> &Handoff {
        &self.handoff
    }

    /// Run work posted through the handoff queue.
    pub fn process_deferred(&mut self) {
        for deferred in self.handoff.drain() {
            match deferred {
                Deferred::RequestFrame(surface) => {
                    if let Err(err) = self.request_frame_callback(surface) {
                        log::warn!("Deferred frame request for {:?} rejected: {err}", surface);
                    }
                },
                Deferred::Wakeup => {},
            }
        }
    }

    /// Housekeeping after a dispatch cycle: run posted work and send batched
    /// text-input state.
    pub fn after_dispatch(&mut self) {
        self.process_deferred();
        self.flush_text_input();
    }

    /// Time until the next timer the poll loop must wake up for.
    pub fn next_timeout(&self, now: Instant) -> Option<Duration> {
        self.next_repeat_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Fire timers that are due at `now`.
    pub fn dispatch_timers(&mut self, now: Instant) {
        self.fire_key_repeat(now);
    }

    pub(crate) fn emit(&mut self, event: BridgeEvent) {
        log::trace!("Bridge emit {:?}", event);
        self.events.push_back(event);
    }

    /// Check that an incoming event targets a live object of the expected
    /// kind. Misses are counted and the event is dropped by the caller.
    pub(crate) fn resolve(&mut self, handle: Handle, kind: ObjectKind) -> bool {
        match self.objects.get(handle) {
            Some(bound) if bound.kind == kind => true,
            _ => {
                self.diagnostics.stale_events += 1;
                log::trace!("Dropping stale event for {:?} (expected {:?})", handle, kind);
                false
            },
        }
    }

    /// Clone the protocol object behind a live handle of the given kind.
    pub(crate) fn object_of(&self, handle: Handle, kind: ObjectKind) -> Option<P::Object> {
        self.objects
            .get(handle)
            .filter(|bound| bound.kind == kind)
            .map(|bound| bound.object.clone())
    }

    pub(crate) fn global_object(&self, kind: InterfaceKind) -> Option<(Handle, P::Object)> {
        let handle = self.registry.singleton(kind)?;
        let object = self.object_of(handle, ObjectKind::Global(kind))?;
        Some((handle, object))
    }

    /// Store a new object built by the protocol under a fresh handle.
    pub(crate) fn insert_object(
        &mut self,
        kind: ObjectKind,
        global: Option<u32>,
        build: impl FnOnce(&mut P, Handle) -> Result<P::Object, BridgeError>,
    ) -> Result<Handle, BridgeError> {
        let protocol = &mut self.protocol;
        self.objects.try_insert_with(|handle| {
            build(protocol, handle).map(|object| BoundObject {
                kind,
                object,
                global,
            })
        })
    }

    /// Invalidate `handle` and release its protocol object.
    pub(crate) fn release(&mut self, handle: Handle) {
        if let Some(bound) = self.objects.remove(handle) {
            log::trace!("Releasing {:?} ({:?})", handle, bound.kind);
            self.protocol.destroy(bound.object);
        }
    }
}
