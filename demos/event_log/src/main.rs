use std::time::Duration;

use waybridge::prelude::*;

fn main() -> Result<(), BridgeError> {
    let config = BridgeConfig::load()?;
    waybridge::init_logging(&config);

    let mut client = WaylandClient::connect_with(config)?;
    let surface = client.create_window()?;

    loop {
        client.dispatch(Some(Duration::from_millis(500)))?;
        for event in client.drain_events() {
            log::info!("{:?}", event);
            match event {
                BridgeEvent::SurfaceConfigured { .. } => {
                    let bridge = client.bridge_mut();
                    bridge.ack_configure(surface)?;
                    bridge.commit(surface)?;
                },
                BridgeEvent::ToplevelCloseRequested { .. } => {
                    client.bridge_mut().destroy_window(surface);
                    return Ok(());
                },
                _ => {},
            }
        }
    }
}
