mod events;
#[macro_use]
mod macros;
mod resources;
mod systems;
mod transport;

use std::sync::atomic::{AtomicU64, Ordering};

use bevy::prelude::*;
use tictactoe::{ClosePayload, InitPayload, PiecePayload, TurnPayload, WinnerPayload};

pub use events::*;
pub use resources::*;
pub use systems::*;

net_events! {
    Init => InitPayload,
    Piece => PiecePayload,
    Turn => TurnPayload,
    Winner => WinnerPayload,
    Close => ClosePayload,
}

/// Registers the network events and opens the first connection.
pub fn connect(app: &mut App) {
    let settings = NetworkSettings::from_env();
    let router = ServerEventRouter::register(app);
    let connection = open(&settings, &router);

    app.insert_resource(connection);
    app.insert_resource(NetworkRouter(router));
    app.insert_resource(settings);
}

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Starts a socket thread feeding `router`.
pub fn open(settings: &NetworkSettings, router: &ServerEventRouter) -> NetworkConnection {
    let session = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = crossbeam_channel::unbounded();
    if let Err(err) = transport::spawn(session, settings.url.clone(), router.clone(), rx) {
        error!("Could not start the socket thread: {err}");
        router.disconnected(session, Some(err.to_string()));
    }
    NetworkConnection::new(session, tx)
}

/// Listens on the EventQueue and writes Bevy events
fn process_network_queue<T: 'static + Send + Sync>(
    maybe_queue: Option<Res<EventQueue<T>>>,
    mut writer: EventWriter<Net<T>>,
) {
    if let Some(queue) = maybe_queue {
        if !queue.is_empty() {
            writer.write_batch(queue.try_iter().map(Net));
        }
    }
}
