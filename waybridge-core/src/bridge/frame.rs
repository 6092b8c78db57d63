//! One-shot frame callbacks.

use std::collections::HashMap;

use super::{Bridge, ObjectKind, Protocol};
use crate::error::BridgeError;
use crate::events::BridgeEvent;
use crate::handle::Handle;

#[derive(Debug, Default)]
pub(crate) struct FrameScheduler {
    // surface -> outstanding callback
    by_surface: HashMap<Handle, Handle>,
    // callback -> surface
    by_callback: HashMap<Handle, Handle>,
}

impl<P: Protocol> Bridge<P> {
    /// Ask to be told when the compositor is ready for a new frame of
    /// `surface`. Only one request per surface may be outstanding.
    pub fn request_frame_callback(&mut self, surface: Handle) -> Result<(), BridgeError> {
        if self.frames.by_surface.contains_key(&surface) {
            return Err(BridgeError::FrameCallbackPending(surface));
        }
        let surface_object = self
            .object_of(surface, ObjectKind::Surface)
            .ok_or(BridgeError::UnknownObject(surface))?;
        let callback = self.insert_object(ObjectKind::FrameCallback, None, |protocol, handle| {
            protocol.frame(handle, &surface_object)
        })?;
        log::trace!("Frame callback {:?} requested for {:?}", callback, surface);
        self.frames.by_surface.insert(surface, callback);
        self.frames.by_callback.insert(callback, surface);
        Ok(())
    }

    /// `wl_callback.done` for a frame callback.
    pub fn on_frame_done(&mut self, callback: Handle, time: u32) {
        if !self.resolve(callback, ObjectKind::FrameCallback) {
            return;
        }
        let Some(surface) = self.frames.by_callback.remove(&callback) else {
            return;
        };
        self.frames.by_surface.remove(&surface);
        // The server destroys the callback after done.
        self.objects.remove(callback);
        let timestamp = self.clock.extend(time);
        self.emit(BridgeEvent::FrameDone { surface, timestamp });
    }

    pub fn has_pending_frame(&self, surface: Handle) -> bool {
        self.frames.by_surface.contains_key(&surface)
    }

    /// Forget the outstanding callback of `surface`; a late `done` is dropped.
    pub(crate) fn cancel_frame_callback(&mut self, surface: Handle) {
        if let Some(callback) = self.frames.by_surface.remove(&surface) {
            self.frames.by_callback.remove(&callback);
            self.release(callback);
        }
    }
}
