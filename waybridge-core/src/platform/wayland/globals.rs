#![cfg(target_os = "linux")]

//! Registry handling.
//!
//! Globals present at connection time come from the initial [`GlobalList`];
//! later additions and removals arrive as registry events. Both go through
//! the bridge's registry binder.

use wayland_client::globals::{GlobalList, GlobalListContents};
use wayland_client::protocol::wl_registry;
use wayland_client::{Connection, Dispatch, QueueHandle};

use super::shell::WaylandClientState;
use crate::error::BridgeError;

/// Feed every global of the initial advertisement to the bridge.
pub(crate) fn advertise_initial(state: &mut WaylandClientState, globals: &GlobalList) -> Result<(), BridgeError> {
    for global in globals.contents().clone_list() {
        state
            .bridge
            .on_global_advertised(global.name, &global.interface, global.version)?;
    }
    Ok(())
}

impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for WaylandClientState {
    fn event(
        state: &mut Self,
        _registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                let result = state
                    .bridge
                    .on_global_advertised(name, &interface, version)
                    .map(|_| ());
                state.record(result);
            },
            wl_registry::Event::GlobalRemove { name } => state.bridge.on_global_removed(name),
            _ => {},
        }
    }
}
