use bevy::prelude::{Deref, DerefMut, Event};

/// Wrapper to help us filter network events
#[derive(Event, Deref, DerefMut)]
pub struct Net<E>(pub E);

/// The socket handshake finished.
pub struct OnConnect {
    pub session: u64,
    pub url: String,
}

/// The socket is gone. `error` is `None` for a clean close.
pub struct OnDisconnect {
    pub session: u64,
    pub error: Option<String>,
}

impl OnDisconnect {
    pub fn new(session: u64, error: Option<String>) -> Self {
        Self { session, error }
    }
}
