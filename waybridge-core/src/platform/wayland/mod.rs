#![cfg(target_os = "linux")]

//! Wayland glue for the bridge.
//!
//! One `Dispatch` implementation per protocol interface feeds raw events
//! into [`Bridge`](crate::bridge::Bridge); [`WaylandProtocol`] writes its
//! requests back. Every proxy carries its arena [`Handle`](crate::handle::Handle)
//! as user data.

pub mod client;
pub mod globals;
pub mod input;
pub mod output;
pub mod protocol;
pub mod shell;
pub mod surface;
pub mod text_input;

// Re-export commonly used types
pub use client::WaylandClient;
pub use protocol::{WaylandProtocol, WlObject};
pub use shell::WaylandClientState;
