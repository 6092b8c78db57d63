//! Core library for waybridge => See `waybridge` crate.
//!
//! Contains the protocol-agnostic bridge and the Wayland glue that drives it.

/// Contains the [Bridge](bridge::Bridge) state machine and its components.
pub mod bridge;

/// Contains the [BridgeConfig](config::BridgeConfig) struct.
pub mod config;

/// Contains the bridge error type.
pub mod error;

/// Contains the events emitted towards the toolkit.
pub mod events;

/// Contains generation-checked object handles.
pub mod handle;

/// Contains the cross-thread work queue.
pub mod handoff;

/// Contains the capabilities host bindings provide.
pub mod host;

/// Contains wraparound-tolerant timestamp handling.
pub mod time;

/// Contains platform glue.
///
/// Only Wayland is implemented; it is compiled on Linux with the `wayland`
/// feature.
pub mod platform;

pub use bridge::{Bridge, Diagnostics, Protocol};
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use events::{BridgeEvent, EventSink};
pub use handle::Handle;
