//! Surface and xdg toplevel lifecycle.
//!
//! A window moves `Unconfigured → Configured → Closing → Destroyed`. The
//! shell's configure sequence (toplevel size/states, then the surface serial)
//! only proposes geometry; it becomes current when the toolkit acknowledges
//! it, and no buffer may be committed before the first acknowledgement.

use bitflags::bitflags;

use super::registry::InterfaceKind;
use super::{Bridge, ObjectKind, Protocol};
use crate::error::BridgeError;
use crate::events::BridgeEvent;
use crate::handle::Handle;

bitflags! {
    /// Toplevel states from the last configure.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ToplevelStates: u32 {
        const MAXIMIZED = 1 << 0;
        const FULLSCREEN = 1 << 1;
        const RESIZING = 1 << 2;
        const ACTIVATED = 1 << 3;
        const TILED_LEFT = 1 << 4;
        const TILED_RIGHT = 1 << 5;
        const TILED_TOP = 1 << 6;
        const TILED_BOTTOM = 1 << 7;
        const SUSPENDED = 1 << 8;
    }
}

impl ToplevelStates {
    /// Convert the protocol's state array (xdg_toplevel.state values).
    /// Unknown values are skipped.
    pub fn from_raw(states: &[u32]) -> Self {
        states.iter().fold(Self::empty(), |acc, state| {
            let flag = match state {
                1 => Self::MAXIMIZED,
                2 => Self::FULLSCREEN,
                3 => Self::RESIZING,
                4 => Self::ACTIVATED,
                5 => Self::TILED_LEFT,
                6 => Self::TILED_RIGHT,
                7 => Self::TILED_TOP,
                8 => Self::TILED_BOTTOM,
                9 => Self::SUSPENDED,
                _ => Self::empty(),
            };
            acc | flag
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Unconfigured,
    Configured,
    Closing,
    Destroyed,
}

/// Requests applied when a toplevel is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToplevelOptions {
    pub title: String,
    pub app_id: String,
}

#[derive(Debug)]
pub(crate) struct Window {
    pub(crate) toplevel: Option<Handle>,
    pub(crate) state: ShellState,
    pub(crate) size: (u32, u32),
    // From xdg_toplevel.configure, waiting for xdg_surface.configure.
    proposed: Option<((u32, u32), ToplevelStates)>,
    // Serial and geometry waiting for ack.
    pending: Option<(u32, (u32, u32))>,
    // Set by the first ack; a close before it does not unlock commits.
    acked: bool,
    pub(crate) states: ToplevelStates,
    pub(crate) outputs: Vec<Handle>,
    pub(crate) scale: i32,
    pub(crate) scale_dirty: bool,
}

impl Window {
    fn new(size: (u32, u32)) -> Self {
        Self {
            toplevel: None,
            state: ShellState::Unconfigured,
            size,
            proposed: None,
            pending: None,
            acked: false,
            states: ToplevelStates::empty(),
            outputs: Vec::new(),
            scale: 1,
            scale_dirty: false,
        }
    }
}

impl<P: Protocol> Bridge<P> {
    /// Create a bare surface from the compositor global.
    pub fn create_surface(&mut self) -> Result<Handle, BridgeError> {
        let (_, compositor) = self
            .global_object(InterfaceKind::Compositor)
            .ok_or(BridgeError::MissingGlobal("wl_compositor"))?;
        let surface = self.insert_object(ObjectKind::Surface, None, |protocol, handle| {
            protocol.create_surface(handle, &compositor)
        })?;
        log::debug!("Created surface {:?}", surface);
        self.windows.insert(surface, Window::new(self.config.initial_size()));
        Ok(surface)
    }

    /// Give `surface` the xdg toplevel role.
    pub fn wrap_as_toplevel(&mut self, surface: Handle) -> Result<Handle, BridgeError> {
        let window = self.windows.get(&surface).ok_or(BridgeError::UnknownObject(surface))?;
        if window.toplevel.is_some() {
            return Err(BridgeError::ProtocolViolation(format!(
                "surface {:?} already has a toplevel role",
                surface
            )));
        }
        let surface_object = self
            .object_of(surface, ObjectKind::Surface)
            .ok_or(BridgeError::UnknownObject(surface))?;
        let (_, shell) = self
            .global_object(InterfaceKind::ShellBase)
            .ok_or(BridgeError::MissingGlobal("xdg_wm_base"))?;
        let decorations = if self.config.server_side_decorations {
            self.global_object(InterfaceKind::DecorationManager).map(|(_, object)| object)
        } else {
            None
        };
        let options = ToplevelOptions {
            title: self.config.title.clone(),
            app_id: self.config.app_id.clone(),
        };
        let toplevel = self.insert_object(ObjectKind::Toplevel, None, |protocol, handle| {
            protocol.create_toplevel(handle, &shell, &surface_object, decorations.as_ref(), &options)
        })?;
        log::debug!("Surface {:?} wrapped as toplevel {:?}", surface, toplevel);
        if let Some(window) = self.windows.get_mut(&surface) {
            window.toplevel = Some(toplevel);
        }
        self.roles.insert(toplevel, surface);
        Ok(toplevel)
    }

    /// Create a surface and wrap it as a toplevel. Returns the surface.
    pub fn create_window(&mut self) -> Result<Handle, BridgeError> {
        let surface = self.create_surface()?;
        if let Err(err) = self.wrap_as_toplevel(surface) {
            self.destroy_window(surface);
            return Err(err);
        }
        Ok(surface)
    }

    /// Toplevel handle of a window surface.
    pub fn toplevel_of(&self, surface: Handle) -> Option<Handle> {
        self.windows.get(&surface)?.toplevel
    }

    /// Lifecycle state of a surface; unknown surfaces are `Destroyed`.
    pub fn window_state(&self, surface: Handle) -> ShellState {
        self.windows
            .get(&surface)
            .map(|window| window.state)
            .unwrap_or(ShellState::Destroyed)
    }

    /// Acknowledged size of a window.
    pub fn window_size(&self, surface: Handle) -> Option<(u32, u32)> {
        self.windows.get(&surface).map(|window| window.size)
    }

    /// States from the last acknowledged configure.
    pub fn window_states(&self, surface: Handle) -> Option<ToplevelStates> {
        self.windows.get(&surface).map(|window| window.states)
    }

    /// Whether a configure is waiting for [`Bridge::ack_configure`].
    pub fn needs_ack(&self, surface: Handle) -> bool {
        self.windows
            .get(&surface)
            .is_some_and(|window| window.pending.is_some())
    }

    fn surface_for_toplevel(&mut self, toplevel: Handle) -> Option<Handle> {
        if !self.resolve(toplevel, ObjectKind::Toplevel) {
            return None;
        }
        self.roles.get(&toplevel).copied()
    }

    /// `xdg_toplevel.configure`: a size of 0 leaves that dimension unchanged.
    pub fn on_toplevel_configure(&mut self, toplevel: Handle, width: i32, height: i32, states: &[u32]) {
        let Some(surface) = self.surface_for_toplevel(toplevel) else {
            return;
        };
        let Some(window) = self.windows.get_mut(&surface) else {
            return;
        };
        let (current_width, current_height) = window
            .pending
            .map(|(_, size)| size)
            .unwrap_or(window.size);
        let width = if width > 0 { width as u32 } else { current_width };
        let height = if height > 0 { height as u32 } else { current_height };
        log::debug!("Toplevel {:?} proposes {}x{}", toplevel, width, height);
        window.proposed = Some(((width, height), ToplevelStates::from_raw(states)));
    }

    /// `xdg_surface.configure`: ends a configure sequence.
    pub fn on_shell_surface_configure(&mut self, toplevel: Handle, serial: u32) {
        let Some(surface) = self.surface_for_toplevel(toplevel) else {
            return;
        };
        let Some(window) = self.windows.get_mut(&surface) else {
            return;
        };
        let (size, states) = window
            .proposed
            .take()
            .unwrap_or((window.pending.map(|(_, size)| size).unwrap_or(window.size), window.states));
        window.pending = Some((serial, size));
        window.states = states;
        self.emit(BridgeEvent::SurfaceConfigured {
            surface,
            width: size.0,
            height: size.1,
            states,
        });
    }

    /// Acknowledge the latest configure of `surface`.
    ///
    /// Returns whether an acknowledgement was sent.
    pub fn ack_configure(&mut self, surface: Handle) -> Result<bool, BridgeError> {
        let window = self.windows.get_mut(&surface).ok_or(BridgeError::UnknownObject(surface))?;
        let Some((serial, size)) = window.pending.take() else {
            return Ok(false);
        };
        let toplevel = window.toplevel.ok_or(BridgeError::UnknownObject(surface))?;
        window.size = size;
        window.acked = true;
        if window.state == ShellState::Unconfigured {
            window.state = ShellState::Configured;
        }
        let toplevel_object = self
            .object_of(toplevel, ObjectKind::Toplevel)
            .ok_or(BridgeError::UnknownObject(toplevel))?;
        log::debug!("Ack configure serial={} size={}x{} on {:?}", serial, size.0, size.1, surface);
        self.protocol.ack_configure(&toplevel_object, serial, size);
        Ok(true)
    }

    /// Commit the surface's pending state.
    ///
    /// Fails with [`BridgeError::ProtocolViolation`] before the first configure
    /// has been acknowledged.
    pub fn commit(&mut self, surface: Handle) -> Result<(), BridgeError> {
        let window = self.windows.get_mut(&surface).ok_or(BridgeError::UnknownObject(surface))?;
        if !window.acked {
            log::error!("Commit on {:?} before its first configure was acknowledged", surface);
            return Err(BridgeError::ProtocolViolation(format!(
                "commit on surface {:?} before the first configure acknowledgement",
                surface
            )));
        }
        let scale = window.scale_dirty.then_some(window.scale);
        window.scale_dirty = false;
        let object = self
            .object_of(surface, ObjectKind::Surface)
            .ok_or(BridgeError::UnknownObject(surface))?;
        if let Some(scale) = scale {
            self.protocol.set_buffer_scale(&object, scale);
        }
        self.protocol.commit(&object);
        Ok(())
    }

    /// `xdg_toplevel.close`: the compositor asks the window to go away.
    pub fn on_toplevel_close(&mut self, toplevel: Handle) {
        let Some(surface) = self.surface_for_toplevel(toplevel) else {
            return;
        };
        if let Some(window) = self.windows.get_mut(&surface) {
            window.state = ShellState::Closing;
        }
        self.emit(BridgeEvent::ToplevelCloseRequested { surface });
    }

    /// `xdg_wm_base.ping`.
    pub fn on_ping(&mut self, shell: Handle, serial: u32) {
        if !self.resolve(shell, ObjectKind::Global(InterfaceKind::ShellBase)) {
            return;
        }
        if let Some(object) = self.object_of(shell, ObjectKind::Global(InterfaceKind::ShellBase)) {
            self.protocol.pong(&object, serial);
        }
    }

    /// Destroy a window and everything registered against it.
    pub fn destroy_window(&mut self, surface: Handle) {
        let Some(window) = self.windows.remove(&surface) else {
            return;
        };
        log::debug!("Destroying window {:?}", surface);
        self.cancel_frame_callback(surface);
        self.forget_surface_focus(surface);
        if let Some(toplevel) = window.toplevel {
            self.roles.remove(&toplevel);
            self.release(toplevel);
        }
        self.release(surface);
        self.emit(BridgeEvent::SurfaceDestroyed { surface });
    }

    /// `wl_surface.enter`.
    pub fn on_surface_enter(&mut self, surface: Handle, output: Handle) {
        if !self.resolve(surface, ObjectKind::Surface)
            || !self.resolve(output, ObjectKind::Global(InterfaceKind::Output))
        {
            return;
        }
        if let Some(window) = self.windows.get_mut(&surface) {
            if !window.outputs.contains(&output) {
                window.outputs.push(output);
            }
        }
        self.update_surface_scale(surface);
    }

    /// `wl_surface.leave`.
    pub fn on_surface_leave(&mut self, surface: Handle, output: Handle) {
        if !self.resolve(surface, ObjectKind::Surface) {
            return;
        }
        if let Some(window) = self.windows.get_mut(&surface) {
            window.outputs.retain(|entered| *entered != output);
        }
        self.update_surface_scale(surface);
    }

    /// Current integer scale of a surface.
    pub fn surface_scale(&self, surface: Handle) -> Option<i32> {
        self.windows.get(&surface).map(|window| window.scale)
    }

    /// Recompute a surface's scale as the maximum over its outputs.
    pub(crate) fn update_surface_scale(&mut self, surface: Handle) {
        let Some(window) = self.windows.get(&surface) else {
            return;
        };
        let scale = window
            .outputs
            .iter()
            .filter_map(|output| self.outputs.get(output))
            .filter_map(|output| output.current().map(|info| info.scale))
            .max()
            .unwrap_or(1)
            .max(1);
        let Some(window) = self.windows.get_mut(&surface) else {
            return;
        };
        if window.scale != scale {
            log::debug!("Surface {:?} scale {} -> {}", surface, window.scale, scale);
            window.scale = scale;
            window.scale_dirty = true;
            self.emit(BridgeEvent::SurfaceScaleChanged { surface, scale });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mock::{bound_bridge, bridge, bridge_with_window, Call};

    #[test]
    fn test_states_from_raw_skips_unknown() {
        let states = ToplevelStates::from_raw(&[4, 1, 42]);
        assert_eq!(states, ToplevelStates::ACTIVATED | ToplevelStates::MAXIMIZED);
    }

    #[test]
    fn test_window_needs_compositor() {
        let mut bridge = bridge();
        assert!(matches!(
            bridge.create_window(),
            Err(BridgeError::MissingGlobal("wl_compositor"))
        ));
    }

    #[test]
    fn test_failed_wrap_cleans_up_surface() {
        let mut bridge = bridge();
        bridge.on_global_advertised(1, "wl_compositor", 4).unwrap();
        assert!(matches!(
            bridge.create_window(),
            Err(BridgeError::MissingGlobal("xdg_wm_base"))
        ));
        assert_eq!(bridge.live_objects(ObjectKind::Surface), 0);
    }

    #[test]
    fn test_second_toplevel_role_is_rejected() {
        let mut bridge = bound_bridge();
        let surface = bridge.create_window().unwrap();
        assert!(matches!(
            bridge.wrap_as_toplevel(surface),
            Err(BridgeError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_zero_size_keeps_current() {
        let mut bridge = bound_bridge();
        let surface = bridge.create_window().unwrap();
        let toplevel = bridge.toplevel_of(surface).unwrap();
        bridge.drain_events();
        bridge.on_toplevel_configure(toplevel, 0, 0, &[4]);
        bridge.on_shell_surface_configure(toplevel, 3);
        assert_eq!(
            bridge.drain_events(),
            vec![BridgeEvent::SurfaceConfigured {
                surface,
                width: 800,
                height: 600,
                states: ToplevelStates::ACTIVATED,
            }]
        );
    }

    #[test]
    fn test_geometry_applies_on_ack() {
        let (mut bridge, surface) = bridge_with_window();
        let toplevel = bridge.toplevel_of(surface).unwrap();
        bridge.on_toplevel_configure(toplevel, 1024, 0, &[]);
        bridge.on_shell_surface_configure(toplevel, 9);
        assert_eq!(bridge.window_size(surface), Some((800, 600)));
        assert!(bridge.needs_ack(surface));
        assert!(bridge.ack_configure(surface).unwrap());
        assert_eq!(bridge.window_size(surface), Some((1024, 600)));
        assert_eq!(
            bridge.protocol().calls,
            vec![Call::AckConfigure {
                serial: 9,
                size: (1024, 600)
            }]
        );
        assert!(!bridge.ack_configure(surface).unwrap());
    }

    #[test]
    fn test_close_is_an_intent_not_teardown() {
        let (mut bridge, surface) = bridge_with_window();
        let toplevel = bridge.toplevel_of(surface).unwrap();
        bridge.on_toplevel_close(toplevel);
        assert_eq!(bridge.window_state(surface), ShellState::Closing);
        assert!(bridge.is_live(surface));
        assert!(bridge.commit(surface).is_ok());
        bridge.destroy_window(surface);
        assert_eq!(bridge.window_state(surface), ShellState::Destroyed);
        assert!(!bridge.is_live(toplevel));
        // A close for the destroyed toplevel is dropped.
        bridge.drain_events();
        bridge.on_toplevel_close(toplevel);
        assert!(bridge.drain_events().is_empty());
        assert_eq!(bridge.diagnostics().stale_events, 1);
    }

    #[test]
    fn test_close_before_first_ack_keeps_commit_locked() {
        let mut bridge = bound_bridge();
        let surface = bridge.create_window().unwrap();
        let toplevel = bridge.toplevel_of(surface).unwrap();
        bridge.on_toplevel_close(toplevel);
        assert_eq!(bridge.window_state(surface), ShellState::Closing);
        bridge.protocol_mut().calls.clear();

        assert!(matches!(bridge.commit(surface), Err(BridgeError::ProtocolViolation(_))));
        assert!(!bridge.protocol().calls.contains(&Call::Commit(surface)));

        bridge.on_toplevel_configure(toplevel, 0, 0, &[]);
        bridge.on_shell_surface_configure(toplevel, 2);
        bridge.ack_configure(surface).unwrap();
        // Acknowledging does not reopen a closing window.
        assert_eq!(bridge.window_state(surface), ShellState::Closing);
        bridge.commit(surface).unwrap();
        assert_eq!(bridge.protocol().calls.last(), Some(&Call::Commit(surface)));
    }

    #[test]
    fn test_ping_is_answered() {
        let mut bridge = bound_bridge();
        let shell = bridge.global(InterfaceKind::ShellBase).unwrap();
        bridge.on_ping(shell, 77);
        assert_eq!(bridge.protocol().calls.last(), Some(&Call::Pong(77)));
    }
}
