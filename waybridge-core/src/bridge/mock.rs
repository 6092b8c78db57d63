//! Recording protocol double for unit tests.

use super::registry::{GlobalObject, InterfaceKind};
use super::seat::Capabilities;
use super::shell::ToplevelOptions;
use super::text_input::TextInputRequest;
use super::{Bridge, Protocol};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::handle::Handle;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MockObject {
    pub handle: Handle,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Bind {
        name: u32,
        kind: InterfaceKind,
        version: u32,
    },
    GetDevice(Capabilities),
    CreateSurface,
    CreateToplevel {
        title: String,
        decorated: bool,
    },
    GetTextInput,
    Frame(Handle),
    AckConfigure {
        serial: u32,
        size: (u32, u32),
    },
    SetBufferScale(i32),
    Commit(Handle),
    Pong(u32),
    TextInput(TextInputRequest),
    Destroy(MockObject),
}

#[derive(Debug, Default)]
pub(crate) struct MockProtocol {
    pub calls: Vec<Call>,
    pub reject_binds: bool,
}

impl MockProtocol {
    pub fn text_input_commits(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::TextInput(TextInputRequest::Commit)))
            .count()
    }
}

impl Protocol for MockProtocol {
    type Object = MockObject;

    fn bind(
        &mut self,
        handle: Handle,
        global: &GlobalObject,
        kind: InterfaceKind,
        version: u32,
    ) -> Result<MockObject, BridgeError> {
        if self.reject_binds {
            return Err(BridgeError::ProtocolViolation(format!(
                "bind of {} rejected",
                global.interface
            )));
        }
        self.calls.push(Call::Bind {
            name: global.name,
            kind,
            version,
        });
        Ok(MockObject {
            handle,
            label: kind.interface(),
        })
    }

    fn get_device(
        &mut self,
        handle: Handle,
        _seat: &MockObject,
        capability: Capabilities,
    ) -> Result<MockObject, BridgeError> {
        self.calls.push(Call::GetDevice(capability));
        Ok(MockObject {
            handle,
            label: "device",
        })
    }

    fn create_surface(&mut self, handle: Handle, _compositor: &MockObject) -> Result<MockObject, BridgeError> {
        self.calls.push(Call::CreateSurface);
        Ok(MockObject {
            handle,
            label: "wl_surface",
        })
    }

    fn create_toplevel(
        &mut self,
        handle: Handle,
        _shell: &MockObject,
        _surface: &MockObject,
        decorations: Option<&MockObject>,
        options: &ToplevelOptions,
    ) -> Result<MockObject, BridgeError> {
        self.calls.push(Call::CreateToplevel {
            title: options.title.clone(),
            decorated: decorations.is_some(),
        });
        Ok(MockObject {
            handle,
            label: "xdg_toplevel",
        })
    }

    fn get_text_input(
        &mut self,
        handle: Handle,
        _manager: &MockObject,
        _seat: &MockObject,
    ) -> Result<MockObject, BridgeError> {
        self.calls.push(Call::GetTextInput);
        Ok(MockObject {
            handle,
            label: "zwp_text_input_v3",
        })
    }

    fn frame(&mut self, handle: Handle, surface: &MockObject) -> Result<MockObject, BridgeError> {
        self.calls.push(Call::Frame(surface.handle));
        Ok(MockObject {
            handle,
            label: "wl_callback",
        })
    }

    fn ack_configure(&mut self, _toplevel: &MockObject, serial: u32, size: (u32, u32)) {
        self.calls.push(Call::AckConfigure { serial, size });
    }

    fn set_buffer_scale(&mut self, _surface: &MockObject, scale: i32) {
        self.calls.push(Call::SetBufferScale(scale));
    }

    fn commit(&mut self, surface: &MockObject) {
        self.calls.push(Call::Commit(surface.handle));
    }

    fn pong(&mut self, _shell: &MockObject, serial: u32) {
        self.calls.push(Call::Pong(serial));
    }

    fn text_input(&mut self, _text_input: &MockObject, request: &TextInputRequest) {
        self.calls.push(Call::TextInput(request.clone()));
    }

    fn destroy(&mut self, object: MockObject) {
        self.calls.push(Call::Destroy(object));
    }
}

pub(crate) fn bridge() -> Bridge<MockProtocol> {
    bridge_with(BridgeConfig::default())
}

pub(crate) fn bridge_with(config: BridgeConfig) -> Bridge<MockProtocol> {
    Bridge::new(MockProtocol::default(), config).unwrap()
}

/// Bridge with compositor, shell and a pointer+keyboard seat bound.
pub(crate) fn bound_bridge() -> Bridge<MockProtocol> {
    let mut bridge = bridge();
    bridge.on_global_advertised(1, "wl_compositor", 4).unwrap();
    bridge.on_global_advertised(2, "xdg_wm_base", 6).unwrap();
    bridge.on_global_advertised(3, "wl_seat", 7).unwrap();
    bridge
}

/// Bridge with a configured and acknowledged window.
pub(crate) fn bridge_with_window() -> (Bridge<MockProtocol>, Handle) {
    let mut bridge = bound_bridge();
    let surface = bridge.create_window().unwrap();
    let toplevel = bridge.toplevel_of(surface).unwrap();
    bridge.on_toplevel_configure(toplevel, 0, 0, &[]);
    bridge.on_shell_surface_configure(toplevel, 1);
    bridge.ack_configure(surface).unwrap();
    bridge.drain_events();
    bridge.protocol_mut().calls.clear();
    (bridge, surface)
}
