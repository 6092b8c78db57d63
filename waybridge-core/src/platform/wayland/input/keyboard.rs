#![cfg(target_os = "linux")]

//! Keyboard input handling.

use std::os::fd::{AsRawFd, OwnedFd};
use std::ptr;

use wayland_client::protocol::wl_keyboard;
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum};

use super::super::shell::WaylandClientState;
use crate::bridge::keyboard::RawKeyboardEvent;
use crate::handle::Handle;

/// Copy the keymap text out of the compositor's shared memory.
fn read_keymap(fd: &OwnedFd, size: u32) -> Option<String> {
    let size = size as usize;
    if size == 0 {
        return None;
    }
    // SAFETY: the compositor hands us a readable fd of `size` bytes; the
    // mapping is private, read-only and unmapped before returning.
    unsafe {
        let mapped = libc::mmap(
            ptr::null_mut(),
            size,
            libc::PROT_READ,
            libc::MAP_PRIVATE,
            fd.as_raw_fd(),
            0,
        );
        if mapped == libc::MAP_FAILED {
            log::warn!("Failed to mmap keymap fd: {}", std::io::Error::last_os_error());
            return None;
        }
        let bytes = std::slice::from_raw_parts(mapped as *const u8, size).to_vec();
        libc::munmap(mapped, size);
        // The keymap is NUL terminated.
        let text = bytes.split(|byte| *byte == 0).next().unwrap_or_default();
        match String::from_utf8(text.to_vec()) {
            Ok(keymap) => Some(keymap),
            Err(e) => {
                log::warn!("Failed to convert keymap to UTF-8: {}", e);
                None
            },
        }
    }
}

impl Dispatch<wl_keyboard::WlKeyboard, Handle> for WaylandClientState {
    fn event(
        state: &mut Self,
        _keyboard: &wl_keyboard::WlKeyboard,
        event: wl_keyboard::Event,
        handle: &Handle,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let event = match event {
            wl_keyboard::Event::Keymap { format, fd, size } => {
                if !matches!(format, WEnum::Value(wl_keyboard::KeymapFormat::XkbV1)) {
                    log::debug!("Ignoring keymap in format {:?}", format);
                    return;
                }
                match read_keymap(&fd, size) {
                    Some(keymap) => RawKeyboardEvent::Keymap(keymap),
                    None => return,
                }
            },
            wl_keyboard::Event::Enter { surface, .. } => match surface.data::<Handle>() {
                Some(surface) => RawKeyboardEvent::Enter { surface: *surface },
                None => return,
            },
            wl_keyboard::Event::Leave { surface, .. } => match surface.data::<Handle>() {
                Some(surface) => RawKeyboardEvent::Leave { surface: *surface },
                None => return,
            },
            wl_keyboard::Event::Key {
                time,
                key,
                state: key_state,
                ..
            } => RawKeyboardEvent::Key {
                time,
                code: key,
                pressed: matches!(key_state, WEnum::Value(wl_keyboard::KeyState::Pressed)),
            },
            wl_keyboard::Event::Modifiers {
                mods_depressed,
                mods_latched,
                mods_locked,
                group,
                ..
            } => RawKeyboardEvent::Modifiers {
                depressed: mods_depressed,
                latched: mods_latched,
                locked: mods_locked,
                group,
            },
            wl_keyboard::Event::RepeatInfo { rate, delay } => RawKeyboardEvent::RepeatInfo { rate, delay },
            _ => return,
        };
        state.bridge.on_keyboard_event(*handle, event);
    }
}
