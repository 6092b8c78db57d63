//! Keyboard events and client-side key repeat.

use std::time::{Duration, Instant};

use super::{Bridge, ObjectKind, Protocol};
use crate::events::{BridgeEvent, KeyState};
use crate::handle::Handle;

// Used until the compositor sends repeat_info.
const DEFAULT_REPEAT_RATE: i32 = 25;
const DEFAULT_REPEAT_DELAY: i32 = 600;
// Missed repeats emitted by one late timer dispatch.
const MAX_CATCH_UP_REPEATS: usize = 8;

/// Raw `wl_keyboard` events. The keymap is already read from its fd.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKeyboardEvent {
    Keymap(String),
    Enter { surface: Handle },
    Leave { surface: Handle },
    Key { time: u32, code: u32, pressed: bool },
    Modifiers {
        depressed: u32,
        latched: u32,
        locked: u32,
        group: u32,
    },
    RepeatInfo { rate: i32, delay: i32 },
}

#[derive(Debug, Clone, Copy)]
struct Repeat {
    code: u32,
    pressed_at: Instant,
    timestamp: Duration,
    deadline: Instant,
}

#[derive(Debug)]
pub(crate) struct KeyboardDevice {
    pub(crate) handle: Handle,
    focus: Option<Handle>,
    rate: i32,
    delay: i32,
    repeat: Option<Repeat>,
}

impl KeyboardDevice {
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            focus: None,
            rate: DEFAULT_REPEAT_RATE,
            delay: DEFAULT_REPEAT_DELAY,
            repeat: None,
        }
    }

    pub(crate) fn forget_surface(&mut self, surface: Handle) {
        if self.focus == Some(surface) {
            self.focus = None;
            self.repeat = None;
        }
    }

    fn interval(&self) -> Option<Duration> {
        (self.rate > 0).then(|| Duration::from_nanos(1_000_000_000 / self.rate as u64))
    }
}

impl<P: Protocol> Bridge<P> {
    fn keyboard_mut(&mut self, keyboard: Handle) -> Option<&mut KeyboardDevice> {
        self.seat
            .as_mut()?
            .keyboard
            .as_mut()
            .filter(|device| device.handle == keyboard)
    }

    /// Feed one `wl_keyboard` event.
    pub fn on_keyboard_event(&mut self, keyboard: Handle, event: RawKeyboardEvent) {
        self.on_keyboard_event_at(keyboard, event, Instant::now());
    }

    pub(crate) fn on_keyboard_event_at(&mut self, keyboard: Handle, event: RawKeyboardEvent, now: Instant) {
        if !self.resolve(keyboard, ObjectKind::Keyboard) {
            return;
        }
        if let RawKeyboardEvent::Enter { surface } | RawKeyboardEvent::Leave { surface } = event {
            if !self.resolve(surface, ObjectKind::Surface) {
                return;
            }
        }
        let key_repeat = self.config.key_repeat;
        let timestamp = match event {
            RawKeyboardEvent::Key { time, .. } => Some(self.clock.extend(time)),
            _ => None,
        };
        let Some(device) = self.keyboard_mut(keyboard) else {
            return;
        };

        let event = match event {
            RawKeyboardEvent::Keymap(keymap) => BridgeEvent::KeymapChanged { keymap },
            RawKeyboardEvent::Enter { surface } => {
                device.focus = Some(surface);
                BridgeEvent::KeyboardFocus { surface, focused: true }
            },
            RawKeyboardEvent::Leave { surface } => {
                device.focus = None;
                device.repeat = None;
                BridgeEvent::KeyboardFocus { surface, focused: false }
            },
            RawKeyboardEvent::Key { code, pressed, .. } => {
                let timestamp = timestamp.unwrap_or_default();
                device.repeat = None;
                let state = if pressed {
                    if key_repeat && device.rate > 0 {
                        device.repeat = Some(Repeat {
                            code,
                            pressed_at: now,
                            timestamp,
                            deadline: now + Duration::from_millis(device.delay.max(0) as u64),
                        });
                    }
                    KeyState::Pressed
                } else {
                    KeyState::Released
                };
                BridgeEvent::KeyEvent { code, state, timestamp }
            },
            RawKeyboardEvent::Modifiers {
                depressed,
                latched,
                locked,
                group,
            } => {
                device.repeat = None;
                BridgeEvent::Modifiers {
                    depressed,
                    latched,
                    locked,
                    group,
                }
            },
            RawKeyboardEvent::RepeatInfo { rate, delay } => {
                log::debug!("Key repeat rate={} delay={}", rate, delay);
                device.rate = rate;
                device.delay = delay;
                if rate <= 0 {
                    device.repeat = None;
                }
                BridgeEvent::RepeatInfo { rate, delay }
            },
        };
        self.emit(event);
    }

    /// Surface holding keyboard focus.
    pub fn keyboard_focus(&self) -> Option<Handle> {
        self.seat.as_ref()?.keyboard.as_ref()?.focus
    }

    pub(crate) fn next_repeat_deadline(&self) -> Option<Instant> {
        Some(self.seat.as_ref()?.keyboard.as_ref()?.repeat?.deadline)
    }

    /// Emit every repeat whose deadline has passed, then schedule the next.
    ///
    /// A late dispatch catches up on at most [`MAX_CATCH_UP_REPEATS`] missed
    /// repeats; each carries the time it was due.
    pub(crate) fn fire_key_repeat(&mut self, now: Instant) {
        let Some(device) = self.seat.as_mut().and_then(|seat| seat.keyboard.as_mut()) else {
            return;
        };
        let Some(interval) = device.interval() else {
            return;
        };
        let Some(repeat) = device.repeat.as_mut() else {
            return;
        };
        let mut due = Vec::new();
        while repeat.deadline <= now && due.len() < MAX_CATCH_UP_REPEATS {
            due.push(repeat.timestamp + repeat.deadline.saturating_duration_since(repeat.pressed_at));
            repeat.deadline += interval;
        }
        if repeat.deadline <= now {
            log::debug!("Dropping key repeats more than {} behind", MAX_CATCH_UP_REPEATS);
            repeat.deadline = now + interval;
        }
        let code = repeat.code;
        for timestamp in due {
            self.emit(BridgeEvent::KeyEvent {
                code,
                state: KeyState::Repeated,
                timestamp,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mock::{bridge_with_window, MockProtocol};
    use crate::bridge::registry::InterfaceKind;

    fn with_keyboard() -> (Bridge<MockProtocol>, Handle, Handle) {
        let (mut bridge, surface) = bridge_with_window();
        let seat = bridge.global(InterfaceKind::Seat).unwrap();
        bridge.on_seat_capabilities(seat, 2).unwrap();
        bridge.drain_events();
        let keyboard = bridge.seat.as_ref().unwrap().keyboard.as_ref().unwrap().handle;
        (bridge, surface, keyboard)
    }

    fn key(pressed: bool) -> RawKeyboardEvent {
        RawKeyboardEvent::Key {
            time: 100,
            code: 30,
            pressed,
        }
    }

    #[test]
    fn test_focus_and_keys() {
        let (mut bridge, surface, keyboard) = with_keyboard();
        bridge.on_keyboard_event(keyboard, RawKeyboardEvent::Enter { surface });
        bridge.on_keyboard_event(keyboard, key(true));
        assert_eq!(bridge.keyboard_focus(), Some(surface));
        assert_eq!(
            bridge.drain_events(),
            vec![
                BridgeEvent::KeyboardFocus { surface, focused: true },
                BridgeEvent::KeyEvent {
                    code: 30,
                    state: KeyState::Pressed,
                    timestamp: Duration::from_millis(100)
                },
            ]
        );
    }

    #[test]
    fn test_repeat_after_delay() {
        let (mut bridge, surface, keyboard) = with_keyboard();
        let start = Instant::now();
        bridge.on_keyboard_event_at(keyboard, RawKeyboardEvent::Enter { surface }, start);
        bridge.on_keyboard_event_at(keyboard, RawKeyboardEvent::RepeatInfo { rate: 10, delay: 200 }, start);
        bridge.on_keyboard_event_at(keyboard, key(true), start);
        bridge.drain_events();

        assert_eq!(bridge.next_timeout(start), Some(Duration::from_millis(200)));
        bridge.dispatch_timers(start + Duration::from_millis(100));
        assert!(bridge.drain_events().is_empty());

        bridge.dispatch_timers(start + Duration::from_millis(200));
        assert_eq!(
            bridge.drain_events(),
            vec![BridgeEvent::KeyEvent {
                code: 30,
                state: KeyState::Repeated,
                timestamp: Duration::from_millis(300)
            }]
        );
        assert_eq!(
            bridge.next_timeout(start + Duration::from_millis(200)),
            Some(Duration::from_millis(100))
        );

        bridge.on_keyboard_event_at(keyboard, key(false), start + Duration::from_millis(250));
        assert_eq!(bridge.next_timeout(start), None);
    }

    #[test]
    fn test_late_dispatch_catches_up_missed_repeats() {
        let (mut bridge, surface, keyboard) = with_keyboard();
        let start = Instant::now();
        bridge.on_keyboard_event_at(keyboard, RawKeyboardEvent::Enter { surface }, start);
        bridge.on_keyboard_event_at(keyboard, RawKeyboardEvent::RepeatInfo { rate: 10, delay: 200 }, start);
        bridge.on_keyboard_event_at(keyboard, key(true), start);
        bridge.drain_events();

        let late = start + Duration::from_millis(450);
        bridge.dispatch_timers(late);
        let repeated = |ms| BridgeEvent::KeyEvent {
            code: 30,
            state: KeyState::Repeated,
            timestamp: Duration::from_millis(ms),
        };
        assert_eq!(bridge.drain_events(), vec![repeated(300), repeated(400), repeated(500)]);
        // Still on the original cadence.
        assert_eq!(bridge.next_timeout(late), Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_catch_up_is_capped() {
        let (mut bridge, surface, keyboard) = with_keyboard();
        let start = Instant::now();
        bridge.on_keyboard_event_at(keyboard, RawKeyboardEvent::Enter { surface }, start);
        bridge.on_keyboard_event_at(keyboard, RawKeyboardEvent::RepeatInfo { rate: 10, delay: 200 }, start);
        bridge.on_keyboard_event_at(keyboard, key(true), start);
        bridge.drain_events();

        let stalled = start + Duration::from_secs(60);
        bridge.dispatch_timers(stalled);
        assert_eq!(bridge.drain_events().len(), MAX_CATCH_UP_REPEATS);
        assert_eq!(bridge.next_timeout(stalled), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_repeat_stops_on_leave_and_modifiers() {
        let (mut bridge, surface, keyboard) = with_keyboard();
        let start = Instant::now();
        bridge.on_keyboard_event_at(keyboard, RawKeyboardEvent::Enter { surface }, start);
        bridge.on_keyboard_event_at(keyboard, key(true), start);
        bridge.on_keyboard_event_at(
            keyboard,
            RawKeyboardEvent::Modifiers {
                depressed: 1,
                latched: 0,
                locked: 0,
                group: 0,
            },
            start,
        );
        assert_eq!(bridge.next_timeout(start), None);

        bridge.on_keyboard_event_at(keyboard, key(true), start);
        bridge.on_keyboard_event_at(keyboard, RawKeyboardEvent::Leave { surface }, start);
        assert_eq!(bridge.next_timeout(start), None);
        assert_eq!(bridge.keyboard_focus(), None);
    }

    #[test]
    fn test_repeat_disabled_by_config_or_rate() {
        let (mut bridge, _, keyboard) = with_keyboard();
        bridge.on_keyboard_event(keyboard, RawKeyboardEvent::RepeatInfo { rate: 0, delay: 200 });
        bridge.on_keyboard_event(keyboard, key(true));
        assert_eq!(bridge.next_timeout(Instant::now()), None);

        let (mut bridge, _, keyboard) = with_keyboard();
        bridge.config.key_repeat = false;
        bridge.on_keyboard_event(keyboard, key(true));
        assert_eq!(bridge.next_timeout(Instant::now()), None);
    }

    #[test]
    fn test_keymap_is_forwarded() {
        let (mut bridge, _, keyboard) = with_keyboard();
        bridge.on_keyboard_event(keyboard, RawKeyboardEvent::Keymap("xkb_keymap {};".to_string()));
        assert_eq!(
            bridge.drain_events(),
            vec![BridgeEvent::KeymapChanged {
                keymap: "xkb_keymap {};".to_string()
            }]
        );
    }
}
