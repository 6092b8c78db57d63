//! Registry binder: decides which advertised globals to bind.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use super::{Bridge, ObjectKind, Protocol};
use crate::error::BridgeError;
use crate::events::BridgeEvent;
use crate::handle::Handle;

const COMPOSITOR_VERSION: RangeInclusive<u32> = 1..=4;
const XDG_WM_BASE_VERSION: RangeInclusive<u32> = 1..=6;
// Pointer frames and discrete axis events need wl_seat v5; v8 replaces
// axis_discrete with axis_value120.
const WL_SEAT_VERSION: RangeInclusive<u32> = 5..=7;
// wl_output.done appears in v2.
const WL_OUTPUT_VERSION: RangeInclusive<u32> = 2..=4;
const WL_SHM_VERSION: RangeInclusive<u32> = 1..=1;
const ZXDG_DECORATION_VERSION: RangeInclusive<u32> = 1..=1;
const ZWP_TEXT_INPUT_MANAGER_V3_VERSION: RangeInclusive<u32> = 1..=1;

/// Global interfaces the bridge knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    Compositor,
    Seat,
    Output,
    ShellBase,
    TextInputManager,
    Shm,
    DecorationManager,
}

impl InterfaceKind {
    pub fn from_interface(interface: &str) -> Option<Self> {
        match interface {
            "wl_compositor" => Some(Self::Compositor),
            "wl_seat" => Some(Self::Seat),
            "wl_output" => Some(Self::Output),
            "xdg_wm_base" => Some(Self::ShellBase),
            "zwp_text_input_manager_v3" => Some(Self::TextInputManager),
            "wl_shm" => Some(Self::Shm),
            "zxdg_decoration_manager_v1" => Some(Self::DecorationManager),
            _ => None,
        }
    }

    pub fn interface(self) -> &'static str {
        match self {
            Self::Compositor => "wl_compositor",
            Self::Seat => "wl_seat",
            Self::Output => "wl_output",
            Self::ShellBase => "xdg_wm_base",
            Self::TextInputManager => "zwp_text_input_manager_v3",
            Self::Shm => "wl_shm",
            Self::DecorationManager => "zxdg_decoration_manager_v1",
        }
    }

    /// Versions the bridge can speak.
    pub fn supported_versions(self) -> RangeInclusive<u32> {
        match self {
            Self::Compositor => COMPOSITOR_VERSION,
            Self::Seat => WL_SEAT_VERSION,
            Self::Output => WL_OUTPUT_VERSION,
            Self::ShellBase => XDG_WM_BASE_VERSION,
            Self::TextInputManager => ZWP_TEXT_INPUT_MANAGER_V3_VERSION,
            Self::Shm => WL_SHM_VERSION,
            Self::DecorationManager => ZXDG_DECORATION_VERSION,
        }
    }

    /// Whether more than one instance may be bound at a time.
    pub fn allows_multiple(self) -> bool {
        matches!(self, Self::Output)
    }
}

/// A global as advertised by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalObject {
    pub name: u32,
    pub interface: String,
    pub version: u32,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    by_name: HashMap<u32, (InterfaceKind, Handle)>,
    singletons: HashMap<InterfaceKind, Handle>,
}

impl Registry {
    pub(crate) fn singleton(&self, kind: InterfaceKind) -> Option<Handle> {
        self.singletons.get(&kind).copied()
    }
}

impl<P: Protocol> Bridge<P> {
    /// Handle a `global` advertisement.
    ///
    /// Returns the handle of the new binding, or `None` when the global was
    /// ignored (unknown interface, version too old, or a second instance of
    /// a single-instance interface).
    pub fn on_global_advertised(
        &mut self,
        name: u32,
        interface: &str,
        version: u32,
    ) -> Result<Option<Handle>, BridgeError> {
        let Some(kind) = InterfaceKind::from_interface(interface) else {
            log::trace!("Ignoring global {} ({} v{})", name, interface, version);
            return Ok(None);
        };
        let global = GlobalObject {
            name,
            interface: interface.to_owned(),
            version,
        };
        let supported = kind.supported_versions();
        if version < *supported.start() {
            log::warn!(
                "Global {} v{} is older than the required v{}, treating it as absent",
                interface,
                version,
                supported.start()
            );
            self.diagnostics.unsupported_globals.push(global);
            return Ok(None);
        }
        if self.registry.by_name.contains_key(&name) {
            log::debug!("Global {} ({}) advertised twice, ignoring", name, interface);
            return Ok(None);
        }
        if !kind.allows_multiple() && self.registry.singletons.contains_key(&kind) {
            log::debug!("Ignoring additional {} global {}", interface, name);
            return Ok(None);
        }

        let bind_version = version.min(*supported.end());
        let handle = self.insert_object(ObjectKind::Global(kind), Some(name), |protocol, handle| {
            protocol.bind(handle, &global, kind, bind_version)
        })?;
        log::debug!("Bound {} v{} (name {}) as {:?}", interface, bind_version, name, handle);
        self.registry.by_name.insert(name, (kind, handle));
        if !kind.allows_multiple() {
            self.registry.singletons.insert(kind, handle);
        }
        self.emit(BridgeEvent::GlobalAdded {
            name,
            interface: interface.to_owned(),
            version: bind_version,
        });

        match kind {
            InterfaceKind::Output => self.add_output(handle),
            InterfaceKind::Seat => {
                self.add_seat(handle);
                self.ensure_text_input()?;
            },
            InterfaceKind::TextInputManager => self.ensure_text_input()?,
            _ => {},
        }
        Ok(Some(handle))
    }

    /// Handle a `global_remove` event.
    pub fn on_global_removed(&mut self, name: u32) {
        let Some((kind, handle)) = self.registry.by_name.remove(&name) else {
            log::trace!("Removal of unbound global {}", name);
            return;
        };
        log::debug!("Global {} ({}) removed", name, kind.interface());
        match kind {
            InterfaceKind::Seat => self.remove_seat(),
            InterfaceKind::TextInputManager => self.remove_text_input(),
            InterfaceKind::Output => self.remove_output(handle),
            InterfaceKind::Compositor | InterfaceKind::ShellBase => {
                log::warn!("{} went away, existing windows can no longer be reconfigured", kind.interface());
            },
            InterfaceKind::Shm | InterfaceKind::DecorationManager => {},
        }
        if self.registry.singletons.get(&kind) == Some(&handle) {
            self.registry.singletons.remove(&kind);
        }
        self.release(handle);
        self.emit(BridgeEvent::GlobalRemoved { name });
    }

    /// Handle of the bound singleton of `kind`, if any.
    pub fn global(&self, kind: InterfaceKind) -> Option<Handle> {
        self.registry.singleton(kind)
    }

    /// Handles of all bound outputs.
    pub fn bound_outputs(&self) -> Vec<Handle> {
        self.registry
            .by_name
            .values()
            .filter(|(kind, _)| *kind == InterfaceKind::Output)
            .map(|(_, handle)| *handle)
            .collect()
    }
}
