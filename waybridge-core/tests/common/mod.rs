//! Recording protocol shared by the integration tests.

#![allow(dead_code)]

use waybridge_core::bridge::registry::{GlobalObject, InterfaceKind};
use waybridge_core::bridge::seat::Capabilities;
use waybridge_core::bridge::shell::ToplevelOptions;
use waybridge_core::bridge::text_input::TextInputRequest;
use waybridge_core::bridge::{Bridge, Protocol};
use waybridge_core::{BridgeConfig, BridgeError, Handle};

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Bind(InterfaceKind),
    GetDevice(Capabilities),
    CreateSurface(Handle),
    CreateToplevel(Handle),
    GetTextInput(Handle),
    Frame { surface: Handle, callback: Handle },
    AckConfigure { serial: u32, size: (u32, u32) },
    SetBufferScale(i32),
    Commit(Handle),
    Pong(u32),
    TextInput(TextInputRequest),
    Destroy(Handle),
}

/// Protocol whose objects are the bridge handles themselves.
#[derive(Debug, Default)]
pub struct Recorder {
    pub requests: Vec<Request>,
}

impl Recorder {
    pub fn destroyed(&self, handle: Handle) -> bool {
        self.requests.contains(&Request::Destroy(handle))
    }

    pub fn commits(&self) -> usize {
        self.requests
            .iter()
            .filter(|request| matches!(request, Request::TextInput(TextInputRequest::Commit)))
            .count()
    }

    pub fn last_frame_callback(&self) -> Option<Handle> {
        self.requests.iter().rev().find_map(|request| match request {
            Request::Frame { callback, .. } => Some(*callback),
            _ => None,
        })
    }
}

impl Protocol for Recorder {
    type Object = Handle;

    fn bind(
        &mut self,
        handle: Handle,
        _global: &GlobalObject,
        kind: InterfaceKind,
        _version: u32,
    ) -> Result<Handle, BridgeError> {
        self.requests.push(Request::Bind(kind));
        Ok(handle)
    }

    fn get_device(&mut self, handle: Handle, _seat: &Handle, capability: Capabilities) -> Result<Handle, BridgeError> {
        self.requests.push(Request::GetDevice(capability));
        Ok(handle)
    }

    fn create_surface(&mut self, handle: Handle, _compositor: &Handle) -> Result<Handle, BridgeError> {
        self.requests.push(Request::CreateSurface(handle));
        Ok(handle)
    }

    fn create_toplevel(
        &mut self,
        handle: Handle,
        _shell: &Handle,
        surface: &Handle,
        _decorations: Option<&Handle>,
        _options: &ToplevelOptions,
    ) -> Result<Handle, BridgeError> {
        self.requests.push(Request::CreateToplevel(*surface));
        Ok(handle)
    }

    fn get_text_input(&mut self, handle: Handle, _manager: &Handle, _seat: &Handle) -> Result<Handle, BridgeError> {
        self.requests.push(Request::GetTextInput(handle));
        Ok(handle)
    }

    fn frame(&mut self, handle: Handle, surface: &Handle) -> Result<Handle, BridgeError> {
        self.requests.push(Request::Frame {
            surface: *surface,
            callback: handle,
        });
        Ok(handle)
    }

    fn ack_configure(&mut self, _toplevel: &Handle, serial: u32, size: (u32, u32)) {
        self.requests.push(Request::AckConfigure { serial, size });
    }

    fn set_buffer_scale(&mut self, _surface: &Handle, scale: i32) {
        self.requests.push(Request::SetBufferScale(scale));
    }

    fn commit(&mut self, surface: &Handle) {
        self.requests.push(Request::Commit(*surface));
    }

    fn pong(&mut self, _shell: &Handle, serial: u32) {
        self.requests.push(Request::Pong(serial));
    }

    fn text_input(&mut self, _text_input: &Handle, request: &TextInputRequest) {
        self.requests.push(Request::TextInput(request.clone()));
    }

    fn destroy(&mut self, object: Handle) {
        self.requests.push(Request::Destroy(object));
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn new_bridge() -> Bridge<Recorder> {
    init_logger();
    Bridge::new(Recorder::default(), BridgeConfig::default()).unwrap()
}

/// Advertise compositor, seat and shell in that order and return the seat.
pub fn advertise_basics(bridge: &mut Bridge<Recorder>) -> Handle {
    bridge.on_global_advertised(1, "wl_compositor", 4).unwrap();
    let seat = bridge.on_global_advertised(2, "wl_seat", 7).unwrap().unwrap();
    bridge.on_global_advertised(3, "xdg_wm_base", 6).unwrap();
    seat
}

/// Create a window and run it through configure and ack.
pub fn configured_window(bridge: &mut Bridge<Recorder>) -> Handle {
    let surface = bridge.create_window().unwrap();
    let toplevel = bridge.toplevel_of(surface).unwrap();
    bridge.on_toplevel_configure(toplevel, 800, 600, &[]);
    bridge.on_shell_surface_configure(toplevel, 10);
    assert!(bridge.ack_configure(surface).unwrap());
    bridge.drain_events();
    surface
}
