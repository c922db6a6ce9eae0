use bevy::prelude::{Deref, DerefMut, Resource};
use crossbeam_channel::{Receiver, Sender};
use tictactoe::ClientEvent;

use super::ServerEventRouter;

/// Where to find the game server.
#[derive(Resource, Clone)]
pub struct NetworkSettings {
    pub url: String,
}

impl NetworkSettings {
    pub const DEFAULT_URL: &str = "ws://127.0.0.1:3000/ws";

    /// `TICTACTOE_SERVER` at runtime, then at build time, then localhost.
    pub fn from_env() -> Self {
        let url = std::env::var("TICTACTOE_SERVER")
            .ok()
            .or_else(|| option_env!("TICTACTOE_SERVER").map(str::to_owned))
            .unwrap_or_else(|| Self::DEFAULT_URL.to_owned());
        Self { url }
    }
}

/// Outgoing half of the live connection. Dropping it closes the socket.
#[derive(Resource)]
pub struct NetworkConnection {
    session: u64,
    outgoing: Sender<ClientEvent>,
}

impl NetworkConnection {
    pub fn new(session: u64, outgoing: Sender<ClientEvent>) -> Self {
        Self { session, outgoing }
    }

    /// Tags lifecycle events so a replaced socket cannot end the current one.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Queues an intent for the socket thread. Returns `false` if the thread has exited.
    pub fn send(&self, event: ClientEvent) -> bool {
        self.outgoing.send(event).is_ok()
    }
}

/// Senders shared by every socket thread this app opens.
#[derive(Resource, Clone, Deref)]
pub struct NetworkRouter(pub ServerEventRouter);

/// Receiving end of one network event type.
#[derive(Resource, Deref, DerefMut)]
pub struct EventQueue<T: Send + Sync>(pub Receiver<T>);
