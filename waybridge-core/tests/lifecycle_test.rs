//! Object lifetime: destruction, global removal and cross-thread handoff.

mod common;

use std::time::Duration;

use common::{advertise_basics, configured_window, new_bridge, Request};
use waybridge_core::bridge::keyboard::RawKeyboardEvent;
use waybridge_core::bridge::output::OutputEvent;
use waybridge_core::bridge::seat::Capabilities;
use waybridge_core::bridge::ObjectKind;
use waybridge_core::handoff::Deferred;
use waybridge_core::{BridgeError, BridgeEvent};

#[test]
fn test_destroyed_window_drops_late_frame_done() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let surface = configured_window(&mut bridge);
    bridge.request_frame_callback(surface).unwrap();
    let callback = bridge.protocol().last_frame_callback().unwrap();

    bridge.destroy_window(surface);
    assert!(bridge.protocol().destroyed(callback));
    assert!(!bridge.has_pending_frame(surface));
    bridge.drain_events();

    let stale = bridge.diagnostics().stale_events;
    bridge.on_frame_done(callback, 16);
    assert!(bridge.drain_events().is_empty());
    assert_eq!(bridge.diagnostics().stale_events, stale + 1);
}

#[test]
fn test_frame_callback_is_one_shot() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let surface = configured_window(&mut bridge);

    bridge.request_frame_callback(surface).unwrap();
    assert!(matches!(
        bridge.request_frame_callback(surface),
        Err(BridgeError::FrameCallbackPending(pending)) if pending == surface
    ));

    let callback = bridge.protocol().last_frame_callback().unwrap();
    bridge.on_frame_done(callback, 33);
    assert_eq!(
        bridge.drain_events(),
        vec![BridgeEvent::FrameDone {
            surface,
            timestamp: Duration::from_millis(33),
        }]
    );
    assert_eq!(bridge.live_objects(ObjectKind::FrameCallback), 0);
    // The server already destroyed it.
    assert!(!bridge.protocol().destroyed(callback));

    // A duplicate done is dropped and a new request is allowed.
    bridge.on_frame_done(callback, 34);
    assert!(bridge.drain_events().is_empty());
    bridge.request_frame_callback(surface).unwrap();
}

#[test]
fn test_seat_removal_invalidates_devices() {
    let mut bridge = new_bridge();
    let seat = advertise_basics(&mut bridge);
    let surface = configured_window(&mut bridge);
    bridge.on_seat_capabilities(seat, 2).unwrap();
    let keyboard = bridge.device(Capabilities::KEYBOARD).unwrap();
    bridge.drain_events();

    bridge.on_global_removed(2);
    assert!(bridge.protocol().destroyed(keyboard));
    assert!(bridge.protocol().destroyed(seat));
    assert_eq!(bridge.seat_capabilities(), Capabilities::empty());
    bridge.drain_events();

    bridge.on_keyboard_event(keyboard, RawKeyboardEvent::Enter { surface });
    bridge.on_seat_capabilities(seat, 7).unwrap();
    assert!(bridge.drain_events().is_empty());
    assert_eq!(bridge.diagnostics().stale_events, 2);
    assert_eq!(bridge.live_devices(), Capabilities::empty());
}

#[test]
fn test_reused_slot_does_not_revive_old_handle() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let first = configured_window(&mut bridge);
    bridge.destroy_window(first);

    let second = configured_window(&mut bridge);
    assert_ne!(first, second);
    assert!(!bridge.is_live(first));
    assert!(matches!(bridge.commit(first), Err(BridgeError::UnknownObject(_))));
    bridge.commit(second).unwrap();
}

#[test]
fn test_output_scale_reaches_surface() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let output = bridge.on_global_advertised(8, "wl_output", 4).unwrap().unwrap();
    let surface = configured_window(&mut bridge);

    bridge.on_output_event(output, OutputEvent::Scale(2));
    bridge.on_output_event(
        output,
        OutputEvent::Mode {
            current: true,
            width: 2560,
            height: 1440,
            refresh: 60000,
        },
    );
    assert!(bridge.output_info(output).is_none());
    bridge.on_output_event(output, OutputEvent::Done);
    assert_eq!(bridge.output_info(output).map(|info| info.scale), Some(2));

    bridge.on_surface_enter(surface, output);
    assert_eq!(bridge.surface_scale(surface), Some(2));
    assert!(bridge
        .drain_events()
        .contains(&BridgeEvent::SurfaceScaleChanged { surface, scale: 2 }));

    bridge.protocol_mut().requests.clear();
    bridge.commit(surface).unwrap();
    assert_eq!(
        bridge.protocol().requests,
        vec![Request::SetBufferScale(2), Request::Commit(surface)]
    );

    bridge.on_global_removed(8);
    assert_eq!(bridge.surface_scale(surface), Some(1));
    let events = bridge.drain_events();
    assert!(events.contains(&BridgeEvent::OutputRemoved { output }));
    assert!(events.contains(&BridgeEvent::GlobalRemoved { name: 8 }));

    bridge.on_output_event(output, OutputEvent::Done);
    assert!(bridge.drain_events().is_empty());
}

#[test]
fn test_handoff_requests_frame_from_other_thread() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let surface = configured_window(&mut bridge);
    let sender = bridge.handoff_sender();

    std::thread::spawn(move || {
        assert!(sender.post(Deferred::RequestFrame(surface)));
    })
    .join()
    .unwrap();

    assert!(!bridge.has_pending_frame(surface));
    bridge.after_dispatch();
    assert!(bridge.has_pending_frame(surface));
}
