#![warn(missing_docs)]

//! Bridge Wayland compositors into a portable toolkit event stream.

pub use waybridge_core as core;

use waybridge_core::config::BridgeConfig;

/// Install an `env_logger` logger.
///
/// `RUST_LOG` takes precedence; otherwise the config's `log_filter` is used,
/// falling back to `warn`. Calling this more than once is harmless.
pub fn init_logging(config: &BridgeConfig) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| config.log_filter.clone())
        .unwrap_or_else(|| "warn".to_string());
    if env_logger::Builder::new().parse_filters(&filter).try_init().is_err() {
        log::debug!("Logger already installed, keeping it");
    }
}

/// A "prelude" for users of waybridge.
///
/// ```rust
/// use waybridge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::bridge::output::OutputInfo;
    pub use crate::core::bridge::seat::Capabilities;
    pub use crate::core::bridge::shell::{ShellState, ToplevelStates};
    pub use crate::core::bridge::text_input::TextInputState;
    pub use crate::core::bridge::{Bridge, Diagnostics, Protocol};
    pub use crate::core::config::BridgeConfig;
    pub use crate::core::error::BridgeError;
    pub use crate::core::events::{
        Axis, AxisSource, BridgeEvent, ButtonState, EventSink, KeyState, PointerSubEvent, ScrollAmount,
        TouchSubEvent,
    };
    pub use crate::core::handle::Handle;
    pub use crate::core::handoff::{Deferred, HandoffSender};
    pub use crate::core::host::{BackingStoreHost, BackingStoreSink, ForeignEventSink, ForeignInvoker, ForeignValue};

    #[cfg(all(target_os = "linux", feature = "wayland"))]
    pub use crate::core::platform::wayland::WaylandClient;
}
