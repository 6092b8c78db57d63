//! Seat capability router.
//!
//! Keeps exactly one device object per set capability bit.

use bitflags::bitflags;

use super::keyboard::KeyboardDevice;
use super::pointer::PointerDevice;
use super::registry::InterfaceKind;
use super::touch::TouchDevice;
use super::{Bridge, ObjectKind, Protocol};
use crate::error::BridgeError;
use crate::events::BridgeEvent;
use crate::handle::Handle;

bitflags! {
    /// `wl_seat.capability` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        const POINTER = 1;
        const KEYBOARD = 2;
        const TOUCH = 4;
    }
}

impl Capabilities {
    fn object_kind(self) -> ObjectKind {
        if self == Self::POINTER {
            ObjectKind::Pointer
        } else if self == Self::KEYBOARD {
            ObjectKind::Keyboard
        } else {
            ObjectKind::Touch
        }
    }
}

#[derive(Debug)]
pub(crate) struct Seat {
    pub(crate) handle: Handle,
    pub(crate) name: Option<String>,
    pub(crate) capabilities: Capabilities,
    pub(crate) pointer: Option<PointerDevice>,
    pub(crate) keyboard: Option<KeyboardDevice>,
    pub(crate) touch: Option<TouchDevice>,
}

impl Seat {
    fn new(handle: Handle) -> Self {
        Self {
            handle,
            name: None,
            capabilities: Capabilities::empty(),
            pointer: None,
            keyboard: None,
            touch: None,
        }
    }
}

impl<P: Protocol> Bridge<P> {
    pub(crate) fn add_seat(&mut self, seat: Handle) {
        if self.seat.is_some() {
            log::debug!("Ignoring additional seat {:?}", seat);
            return;
        }
        self.seat = Some(Seat::new(seat));
    }

    pub(crate) fn remove_seat(&mut self) {
        self.remove_text_input();
        let Some(seat) = self.seat.take() else {
            return;
        };
        let devices = [
            seat.pointer.map(|device| device.handle),
            seat.keyboard.map(|device| device.handle),
            seat.touch.map(|device| device.handle),
        ];
        for handle in devices.into_iter().flatten() {
            self.release(handle);
        }
        if !seat.capabilities.is_empty() {
            self.emit(BridgeEvent::SeatCapabilitiesChanged {
                capabilities: Capabilities::empty(),
            });
        }
    }

    /// `wl_seat.capabilities`: bind and destroy devices to match `bits`.
    pub fn on_seat_capabilities(&mut self, seat: Handle, bits: u32) -> Result<(), BridgeError> {
        if !self.resolve(seat, ObjectKind::Global(InterfaceKind::Seat)) {
            return Ok(());
        }
        let Some(seat_object) = self.object_of(seat, ObjectKind::Global(InterfaceKind::Seat)) else {
            return Ok(());
        };
        let Some(previous) = self.seat.as_ref().map(|state| state.capabilities) else {
            return Ok(());
        };
        let capabilities = Capabilities::from_bits_truncate(bits);
        if capabilities == previous {
            return Ok(());
        }
        log::debug!("Seat capabilities {:?} -> {:?}", previous, capabilities);

        for removed in (previous - capabilities).iter() {
            self.drop_device(removed);
        }
        for added in (capabilities - previous).iter() {
            let handle = self.insert_object(added.object_kind(), None, |protocol, handle| {
                protocol.get_device(handle, &seat_object, added)
            })?;
            if let Some(state) = self.seat.as_mut() {
                if added == Capabilities::POINTER {
                    state.pointer = Some(PointerDevice::new(handle));
                } else if added == Capabilities::KEYBOARD {
                    state.keyboard = Some(KeyboardDevice::new(handle));
                } else {
                    state.touch = Some(TouchDevice::new(handle));
                }
            }
        }
        if let Some(state) = self.seat.as_mut() {
            state.capabilities = capabilities;
        }
        self.emit(BridgeEvent::SeatCapabilitiesChanged { capabilities });
        Ok(())
    }

    fn drop_device(&mut self, capability: Capabilities) {
        let Some(state) = self.seat.as_mut() else {
            return;
        };
        let handle = if capability == Capabilities::POINTER {
            state.pointer.take().map(|device| {
                if device.has_open_frame() {
                    log::debug!("Discarding open pointer frame of {:?}", device.handle);
                }
                device.handle
            })
        } else if capability == Capabilities::KEYBOARD {
            state.keyboard.take().map(|device| device.handle)
        } else {
            state.touch.take().map(|device| device.handle)
        };
        if let Some(handle) = handle {
            self.release(handle);
        }
    }

    /// `wl_seat.name`.
    pub fn on_seat_name(&mut self, seat: Handle, name: String) {
        if !self.resolve(seat, ObjectKind::Global(InterfaceKind::Seat)) {
            return;
        }
        if let Some(state) = self.seat.as_mut().filter(|state| state.handle == seat) {
            log::debug!("Seat name: {}", name);
            state.name = Some(name);
        }
    }

    pub fn seat_capabilities(&self) -> Capabilities {
        self.seat
            .as_ref()
            .map(|seat| seat.capabilities)
            .unwrap_or_default()
    }

    pub fn seat_name(&self) -> Option<&str> {
        self.seat.as_ref()?.name.as_deref()
    }

    /// Handle of the device bound for a single capability bit.
    pub fn device(&self, capability: Capabilities) -> Option<Handle> {
        let seat = self.seat.as_ref()?;
        if capability == Capabilities::POINTER {
            seat.pointer.as_ref().map(|device| device.handle)
        } else if capability == Capabilities::KEYBOARD {
            seat.keyboard.as_ref().map(|device| device.handle)
        } else if capability == Capabilities::TOUCH {
            seat.touch.as_ref().map(|device| device.handle)
        } else {
            None
        }
    }

    /// Handle of the text input object, once both a seat and the manager
    /// are bound.
    pub fn text_input_object(&self) -> Option<Handle> {
        self.text_input.as_ref().map(|session| session.handle())
    }

    /// Capabilities for which a device object is currently live.
    pub fn live_devices(&self) -> Capabilities {
        let Some(seat) = self.seat.as_ref() else {
            return Capabilities::empty();
        };
        let mut live = Capabilities::empty();
        if seat.pointer.as_ref().is_some_and(|device| self.is_live(device.handle)) {
            live |= Capabilities::POINTER;
        }
        if seat.keyboard.as_ref().is_some_and(|device| self.is_live(device.handle)) {
            live |= Capabilities::KEYBOARD;
        }
        if seat.touch.as_ref().is_some_and(|device| self.is_live(device.handle)) {
            live |= Capabilities::TOUCH;
        }
        live
    }

    /// Drop every reference input devices hold to a destroyed surface.
    pub(crate) fn forget_surface_focus(&mut self, surface: Handle) {
        if let Some(seat) = self.seat.as_mut() {
            if let Some(pointer) = seat.pointer.as_mut() {
                pointer.forget_surface(surface);
            }
            if let Some(keyboard) = seat.keyboard.as_mut() {
                keyboard.forget_surface(surface);
            }
            if let Some(touch) = seat.touch.as_mut() {
                touch.forget_surface(surface);
            }
        }
        if let Some(session) = self.text_input.as_mut() {
            session.forget_surface(surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mock::{bound_bridge, Call};
    use proptest::prelude::*;

    fn seat_of(bridge: &Bridge<crate::bridge::mock::MockProtocol>) -> Handle {
        bridge.global(InterfaceKind::Seat).unwrap()
    }

    #[test]
    fn test_capabilities_bind_devices() {
        let mut bridge = bound_bridge();
        let seat = seat_of(&bridge);
        bridge.drain_events();
        bridge.protocol_mut().calls.clear();

        bridge.on_seat_capabilities(seat, 3).unwrap();
        assert_eq!(
            bridge.protocol().calls,
            vec![
                Call::GetDevice(Capabilities::POINTER),
                Call::GetDevice(Capabilities::KEYBOARD)
            ]
        );
        assert_eq!(bridge.live_devices(), Capabilities::POINTER | Capabilities::KEYBOARD);
        assert_eq!(
            bridge.drain_events(),
            vec![BridgeEvent::SeatCapabilitiesChanged {
                capabilities: Capabilities::POINTER | Capabilities::KEYBOARD
            }]
        );

        // Repeating the same bits changes nothing.
        bridge.on_seat_capabilities(seat, 3).unwrap();
        assert!(bridge.drain_events().is_empty());
        assert_eq!(bridge.live_objects(ObjectKind::Pointer), 1);
    }

    #[test]
    fn test_unknown_bits_are_ignored() {
        let mut bridge = bound_bridge();
        let seat = seat_of(&bridge);
        bridge.on_seat_capabilities(seat, 4 | 64).unwrap();
        assert_eq!(bridge.seat_capabilities(), Capabilities::TOUCH);
    }

    #[test]
    fn test_seat_name_is_stored() {
        let mut bridge = bound_bridge();
        let seat = seat_of(&bridge);
        bridge.on_seat_name(seat, "seat0".to_string());
        assert_eq!(bridge.seat_name(), Some("seat0"));
    }

    #[test]
    fn test_seat_removal_destroys_devices() {
        let mut bridge = bound_bridge();
        let seat = seat_of(&bridge);
        bridge.on_seat_capabilities(seat, 7).unwrap();
        bridge.drain_events();
        bridge.on_global_removed(3);
        assert_eq!(bridge.live_devices(), Capabilities::empty());
        assert_eq!(bridge.live_objects(ObjectKind::Pointer), 0);
        assert_eq!(bridge.live_objects(ObjectKind::Keyboard), 0);
        assert_eq!(bridge.live_objects(ObjectKind::Touch), 0);
        assert_eq!(
            bridge.drain_events(),
            vec![
                BridgeEvent::SeatCapabilitiesChanged {
                    capabilities: Capabilities::empty()
                },
                BridgeEvent::GlobalRemoved { name: 3 },
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_live_devices_match_capabilities(transitions in proptest::collection::vec(0u32..8, 1..24)) {
            let mut bridge = bound_bridge();
            let seat = seat_of(&bridge);
            for bits in transitions {
                bridge.on_seat_capabilities(seat, bits).unwrap();
                let expected = Capabilities::from_bits_truncate(bits);
                prop_assert_eq!(bridge.live_devices(), expected);
                prop_assert_eq!(bridge.live_objects(ObjectKind::Pointer), expected.contains(Capabilities::POINTER) as usize);
                prop_assert_eq!(bridge.live_objects(ObjectKind::Keyboard), expected.contains(Capabilities::KEYBOARD) as usize);
                prop_assert_eq!(bridge.live_objects(ObjectKind::Touch), expected.contains(Capabilities::TOUCH) as usize);
            }
        }
    }
}
