//! Platform glue.

#[cfg(all(target_os = "linux", feature = "wayland"))]
pub mod wayland;

#[cfg(all(target_os = "linux", feature = "wayland"))]
pub use wayland::{WaylandClient, WaylandProtocol};
