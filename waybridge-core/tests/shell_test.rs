mod common;

use common::{advertise_basics, new_bridge, Request};
use waybridge_core::bridge::shell::{ShellState, ToplevelStates};
use waybridge_core::{BridgeError, BridgeEvent};

#[test]
fn test_commit_before_ack_is_rejected() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let surface = bridge.create_window().unwrap();
    let toplevel = bridge.toplevel_of(surface).unwrap();

    bridge.on_toplevel_configure(toplevel, 800, 600, &[]);
    bridge.on_shell_surface_configure(toplevel, 42);
    assert_eq!(bridge.window_state(surface), ShellState::Unconfigured);
    assert!(bridge.needs_ack(surface));

    let err = bridge.commit(surface).unwrap_err();
    assert!(matches!(err, BridgeError::ProtocolViolation(_)));
    assert!(!bridge.protocol().requests.contains(&Request::Commit(surface)));

    assert!(bridge.ack_configure(surface).unwrap());
    assert_eq!(bridge.window_state(surface), ShellState::Configured);
    assert_eq!(bridge.window_size(surface), Some((800, 600)));
    bridge.commit(surface).unwrap();

    let requests = &bridge.protocol().requests;
    let ack = requests
        .iter()
        .position(|request| *request == Request::AckConfigure { serial: 42, size: (800, 600) })
        .unwrap();
    let commit = requests
        .iter()
        .position(|request| *request == Request::Commit(surface))
        .unwrap();
    assert!(ack < commit);
}

#[test]
fn test_configure_event_carries_size_and_states() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let surface = bridge.create_window().unwrap();
    let toplevel = bridge.toplevel_of(surface).unwrap();
    bridge.drain_events();

    // activated (4) and maximized (1)
    bridge.on_toplevel_configure(toplevel, 1024, 768, &[4, 1]);
    bridge.on_shell_surface_configure(toplevel, 7);

    assert_eq!(
        bridge.drain_events(),
        vec![BridgeEvent::SurfaceConfigured {
            surface,
            width: 1024,
            height: 768,
            states: ToplevelStates::ACTIVATED | ToplevelStates::MAXIMIZED,
        }]
    );
}

#[test]
fn test_zero_size_keeps_configured_size() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let surface = common::configured_window(&mut bridge);
    let toplevel = bridge.toplevel_of(surface).unwrap();

    bridge.on_toplevel_configure(toplevel, 0, 0, &[]);
    bridge.on_shell_surface_configure(toplevel, 11);
    bridge.ack_configure(surface).unwrap();
    assert_eq!(bridge.window_size(surface), Some((800, 600)));
}

#[test]
fn test_window_without_shell_fails() {
    let mut bridge = new_bridge();
    bridge.on_global_advertised(1, "wl_compositor", 4).unwrap();
    let err = bridge.create_window().unwrap_err();
    assert!(matches!(err, BridgeError::MissingGlobal("xdg_wm_base")));
    // The half-built surface is released again.
    let created = bridge
        .protocol()
        .requests
        .iter()
        .find_map(|request| match request {
            Request::CreateSurface(handle) => Some(*handle),
            _ => None,
        })
        .unwrap();
    assert!(bridge.protocol().destroyed(created));
    assert!(!bridge.is_live(created));
}

#[test]
fn test_close_then_destroy() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let surface = common::configured_window(&mut bridge);
    let toplevel = bridge.toplevel_of(surface).unwrap();

    bridge.on_toplevel_close(toplevel);
    assert_eq!(bridge.window_state(surface), ShellState::Closing);
    assert_eq!(
        bridge.drain_events(),
        vec![BridgeEvent::ToplevelCloseRequested { surface }]
    );

    bridge.destroy_window(surface);
    assert_eq!(bridge.window_state(surface), ShellState::Destroyed);
    assert!(bridge.protocol().destroyed(toplevel));
    assert!(bridge.protocol().destroyed(surface));
    assert_eq!(bridge.drain_events(), vec![BridgeEvent::SurfaceDestroyed { surface }]);

    // A configure racing the destruction is dropped.
    let stale = bridge.diagnostics().stale_events;
    bridge.on_shell_surface_configure(toplevel, 99);
    assert!(bridge.drain_events().is_empty());
    assert_eq!(bridge.diagnostics().stale_events, stale + 1);
}

#[test]
fn test_ping_is_answered() {
    let mut bridge = new_bridge();
    advertise_basics(&mut bridge);
    let shell = bridge
        .global(waybridge_core::bridge::registry::InterfaceKind::ShellBase)
        .unwrap();
    bridge.on_ping(shell, 1234);
    assert_eq!(bridge.protocol().requests.last(), Some(&Request::Pong(1234)));
}
