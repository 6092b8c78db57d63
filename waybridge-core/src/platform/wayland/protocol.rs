#![cfg(target_os = "linux")]

//! [`Protocol`] implementation over `wayland_client` proxies.

use wayland_client::protocol::{
    wl_callback, wl_compositor, wl_keyboard, wl_output, wl_pointer, wl_registry, wl_seat, wl_shm, wl_surface,
    wl_touch,
};
use wayland_client::{Proxy, QueueHandle};
use wayland_protocols::wp::text_input::zv3::client::{zwp_text_input_manager_v3, zwp_text_input_v3};
use wayland_protocols::xdg::decoration::zv1::client::{zxdg_decoration_manager_v1, zxdg_toplevel_decoration_v1};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

use super::shell::WaylandClientState;
use crate::bridge::registry::{GlobalObject, InterfaceKind};
use crate::bridge::seat::Capabilities;
use crate::bridge::shell::ToplevelOptions;
use crate::bridge::text_input::TextInputRequest;
use crate::bridge::Protocol;
use crate::error::BridgeError;
use crate::handle::Handle;

/// Protocol object stored in the bridge's arena.
#[derive(Debug, Clone)]
pub enum WlObject {
    Compositor(wl_compositor::WlCompositor),
    Seat(wl_seat::WlSeat),
    Output(wl_output::WlOutput),
    WmBase(xdg_wm_base::XdgWmBase),
    TextInputManager(zwp_text_input_manager_v3::ZwpTextInputManagerV3),
    Shm(wl_shm::WlShm),
    DecorationManager(zxdg_decoration_manager_v1::ZxdgDecorationManagerV1),
    Surface(wl_surface::WlSurface),
    Toplevel {
        surface: wl_surface::WlSurface,
        xdg_surface: xdg_surface::XdgSurface,
        toplevel: xdg_toplevel::XdgToplevel,
        decoration: Option<zxdg_toplevel_decoration_v1::ZxdgToplevelDecorationV1>,
    },
    Pointer(wl_pointer::WlPointer),
    Keyboard(wl_keyboard::WlKeyboard),
    Touch(wl_touch::WlTouch),
    TextInput(zwp_text_input_v3::ZwpTextInputV3),
    Callback(wl_callback::WlCallback),
}

fn mismatch(expected: &str, got: &WlObject) -> BridgeError {
    BridgeError::ProtocolViolation(format!("expected {expected}, got {got:?}"))
}

/// Writes requests through one event queue.
pub struct WaylandProtocol {
    registry: wl_registry::WlRegistry,
    qh: QueueHandle<WaylandClientState>,
    compositor: Option<wl_compositor::WlCompositor>,
}

impl WaylandProtocol {
    pub fn new(registry: wl_registry::WlRegistry, qh: QueueHandle<WaylandClientState>) -> Self {
        Self {
            registry,
            qh,
            compositor: None,
        }
    }
}

impl Protocol for WaylandProtocol {
    type Object = WlObject;

    fn bind(
        &mut self,
        handle: Handle,
        global: &GlobalObject,
        kind: InterfaceKind,
        version: u32,
    ) -> Result<WlObject, BridgeError> {
        let (name, registry, qh) = (global.name, &self.registry, &self.qh);
        let object = match kind {
            InterfaceKind::Compositor => {
                let compositor: wl_compositor::WlCompositor = registry.bind(name, version, qh, handle);
                self.compositor = Some(compositor.clone());
                WlObject::Compositor(compositor)
            },
            InterfaceKind::Seat => WlObject::Seat(registry.bind(name, version, qh, handle)),
            InterfaceKind::Output => WlObject::Output(registry.bind(name, version, qh, handle)),
            InterfaceKind::ShellBase => WlObject::WmBase(registry.bind(name, version, qh, handle)),
            InterfaceKind::TextInputManager => WlObject::TextInputManager(registry.bind(name, version, qh, handle)),
            InterfaceKind::Shm => WlObject::Shm(registry.bind(name, version, qh, handle)),
            InterfaceKind::DecorationManager => {
                WlObject::DecorationManager(registry.bind(name, version, qh, handle))
            },
        };
        Ok(object)
    }

    fn get_device(
        &mut self,
        handle: Handle,
        seat: &WlObject,
        capability: Capabilities,
    ) -> Result<WlObject, BridgeError> {
        let WlObject::Seat(seat) = seat else {
            return Err(mismatch("wl_seat", seat));
        };
        let device = if capability == Capabilities::POINTER {
            WlObject::Pointer(seat.get_pointer(&self.qh, handle))
        } else if capability == Capabilities::KEYBOARD {
            WlObject::Keyboard(seat.get_keyboard(&self.qh, handle))
        } else {
            WlObject::Touch(seat.get_touch(&self.qh, handle))
        };
        Ok(device)
    }

    fn create_surface(&mut self, handle: Handle, compositor: &WlObject) -> Result<WlObject, BridgeError> {
        let WlObject::Compositor(compositor) = compositor else {
            return Err(mismatch("wl_compositor", compositor));
        };
        Ok(WlObject::Surface(compositor.create_surface(&self.qh, handle)))
    }

    fn create_toplevel(
        &mut self,
        handle: Handle,
        shell: &WlObject,
        surface: &WlObject,
        decorations: Option<&WlObject>,
        options: &ToplevelOptions,
    ) -> Result<WlObject, BridgeError> {
        let WlObject::WmBase(wm_base) = shell else {
            return Err(mismatch("xdg_wm_base", shell));
        };
        let WlObject::Surface(surface) = surface else {
            return Err(mismatch("wl_surface", surface));
        };
        let xdg_surface = wm_base.get_xdg_surface(surface, &self.qh, handle);
        let toplevel = xdg_surface.get_toplevel(&self.qh, handle);
        toplevel.set_title(options.title.clone());
        toplevel.set_app_id(options.app_id.clone());

        let decoration = match decorations {
            Some(WlObject::DecorationManager(manager)) => {
                let decoration = manager.get_toplevel_decoration(&toplevel, &self.qh, handle);
                decoration.set_mode(zxdg_toplevel_decoration_v1::Mode::ServerSide);
                Some(decoration)
            },
            _ => None,
        };

        // A bare commit asks the compositor for the first configure.
        surface.commit();
        Ok(WlObject::Toplevel {
            surface: surface.clone(),
            xdg_surface,
            toplevel,
            decoration,
        })
    }

    fn get_text_input(
        &mut self,
        handle: Handle,
        manager: &WlObject,
        seat: &WlObject,
    ) -> Result<WlObject, BridgeError> {
        let WlObject::TextInputManager(manager) = manager else {
            return Err(mismatch("zwp_text_input_manager_v3", manager));
        };
        let WlObject::Seat(seat) = seat else {
            return Err(mismatch("wl_seat", seat));
        };
        Ok(WlObject::TextInput(manager.get_text_input(seat, &self.qh, handle)))
    }

    fn frame(&mut self, handle: Handle, surface: &WlObject) -> Result<WlObject, BridgeError> {
        let WlObject::Surface(surface) = surface else {
            return Err(mismatch("wl_surface", surface));
        };
        Ok(WlObject::Callback(surface.frame(&self.qh, handle)))
    }

    fn ack_configure(&mut self, toplevel: &WlObject, serial: u32, size: (u32, u32)) {
        let WlObject::Toplevel {
            surface, xdg_surface, ..
        } = toplevel
        else {
            log::warn!("ack_configure on {:?}", toplevel);
            return;
        };
        let (width, height) = (size.0 as i32, size.1 as i32);
        xdg_surface.ack_configure(serial);
        xdg_surface.set_window_geometry(0, 0, width, height);
        if let Some(compositor) = self.compositor.as_ref() {
            let region = compositor.create_region(&self.qh, ());
            region.add(0, 0, width, height);
            surface.set_opaque_region(Some(&region));
            region.destroy();
        }
    }

    fn set_buffer_scale(&mut self, surface: &WlObject, scale: i32) {
        if let WlObject::Surface(surface) = surface {
            if surface.version() >= 3 {
                surface.set_buffer_scale(scale);
            }
        }
    }

    fn commit(&mut self, surface: &WlObject) {
        if let WlObject::Surface(surface) = surface {
            surface.commit();
        }
    }

    fn pong(&mut self, shell: &WlObject, serial: u32) {
        if let WlObject::WmBase(wm_base) = shell {
            wm_base.pong(serial);
        }
    }

    fn text_input(&mut self, text_input: &WlObject, request: &TextInputRequest) {
        let WlObject::TextInput(text_input) = text_input else {
            return;
        };
        match request {
            TextInputRequest::Enable => text_input.enable(),
            TextInputRequest::Disable => text_input.disable(),
            TextInputRequest::SetSurroundingText { text, cursor, anchor } => {
                text_input.set_surrounding_text(text.clone(), *cursor, *anchor);
            },
            TextInputRequest::SetContentType { hint, purpose } => {
                let hint = zwp_text_input_v3::ContentHint::from_bits_truncate(*hint);
                let purpose =
                    zwp_text_input_v3::ContentPurpose::try_from(*purpose).unwrap_or(zwp_text_input_v3::ContentPurpose::Normal);
                text_input.set_content_type(hint, purpose);
            },
            TextInputRequest::SetCursorRectangle { x, y, width, height } => {
                text_input.set_cursor_rectangle(*x, *y, *width, *height);
            },
            TextInputRequest::Commit => text_input.commit(),
        }
    }

    fn destroy(&mut self, object: WlObject) {
        match object {
            WlObject::Compositor(_) | WlObject::Shm(_) | WlObject::Callback(_) => {},
            WlObject::Seat(seat) => seat.release(),
            WlObject::Output(output) => {
                if output.version() >= 3 {
                    output.release();
                }
            },
            WlObject::WmBase(wm_base) => wm_base.destroy(),
            WlObject::TextInputManager(manager) => manager.destroy(),
            WlObject::DecorationManager(manager) => manager.destroy(),
            WlObject::Surface(surface) => surface.destroy(),
            WlObject::Toplevel {
                xdg_surface,
                toplevel,
                decoration,
                ..
            } => {
                if let Some(decoration) = decoration {
                    decoration.destroy();
                }
                toplevel.destroy();
                xdg_surface.destroy();
            },
            WlObject::Pointer(pointer) => pointer.release(),
            WlObject::Keyboard(keyboard) => keyboard.release(),
            WlObject::Touch(touch) => touch.release(),
            WlObject::TextInput(text_input) => text_input.destroy(),
        }
    }
}
