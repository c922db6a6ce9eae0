use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};
use tictactoe::{ConnectionId, Dispatch, Game, ServerEvent};
use tokio::sync::mpsc;

/// Per-connection queue of frames waiting to be written to the socket.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug)]
pub enum Command {
    Connect { id: ConnectionId, outbox: Outbox },
    Place { id: ConnectionId, index: usize },
    Disconnect { id: ConnectionId },
}

/// Cheap to clone; every socket task holds one.
#[derive(Clone)]
pub struct AuthorityHandle {
    commands: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
}

impl AuthorityHandle {
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Queues a command. Returns `false` once the authority task has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }
}

/// Sole owner of the game. Commands are handled one at a time, each to completion.
#[derive(Default)]
pub struct Authority {
    game: Game,
    connections: BTreeMap<ConnectionId, Outbox>,
}

impl Authority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn spawn(self) -> AuthorityHandle {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(self.run(rx));
        AuthorityHandle {
            commands,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
        debug!("authority stopped");
    }

    pub fn handle(&mut self, command: Command) {
        let dispatches = match command {
            Command::Connect { id, outbox } => {
                self.connections.insert(id, outbox);
                self.game.on_connect(id)
            }
            Command::Place { id, index } => self.game.on_place(id, index),
            Command::Disconnect { id } => {
                self.connections.remove(&id);
                self.game.on_disconnect(id)
            }
        };
        for dispatch in dispatches {
            self.deliver(dispatch);
        }
    }

    fn deliver(&mut self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Send(id, event) => {
                if let Some(outbox) = self.connections.get(&id) {
                    let _ = outbox.send(event);
                }
            }
            Dispatch::Broadcast(event) => {
                for outbox in self.connections.values() {
                    let _ = outbox.send(event.clone());
                }
            }
            Dispatch::EndRound { reason } => {
                info!("round over, closing {} connections: {reason}", self.connections.len());
                let close = ServerEvent::close(reason);
                // Dropping each outbox after `close` ends that socket.
                for (_, outbox) in std::mem::take(&mut self.connections) {
                    let _ = outbox.send(close.clone());
                }
                self.game.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe::{Color, InitPayload, PiecePayload, Role, TurnPayload, WinnerPayload};
    use tokio::sync::mpsc::error::TryRecvError;

    fn connect(authority: &mut Authority, id: u64) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (outbox, rx) = mpsc::unbounded_channel();
        authority.handle(Command::Connect {
            id: ConnectionId(id),
            outbox,
        });
        rx
    }

    fn place(authority: &mut Authority, id: u64, index: usize) {
        authority.handle(Command::Place {
            id: ConnectionId(id),
            index,
        });
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn expect_init(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> InitPayload {
        let mut events = drain(rx);
        assert_eq!(events.len(), 1, "expected a single init, got {events:?}");
        match events.remove(0) {
            ServerEvent::Init(init) => init,
            other => panic!("expected init, got {other:?}"),
        }
    }

    #[test]
    fn init_goes_only_to_the_newcomer() {
        let mut authority = Authority::new();
        let mut red = connect(&mut authority, 1);
        let mut blue = connect(&mut authority, 2);
        let mut watcher = connect(&mut authority, 3);

        let init = expect_init(&mut red);
        assert_eq!((init.role, init.index), (Role::Player, 0));
        let init = expect_init(&mut blue);
        assert_eq!((init.role, init.index), (Role::Player, 1));
        let init = expect_init(&mut watcher);
        assert_eq!((init.role, init.index), (Role::Observer, -1));
    }

    #[test]
    fn rejected_move_broadcasts_nothing() {
        let mut authority = Authority::new();
        let mut red = connect(&mut authority, 1);
        let mut blue = connect(&mut authority, 2);
        drain(&mut red);
        drain(&mut blue);

        place(&mut authority, 1, 4);
        let expected = vec![
            ServerEvent::Piece(PiecePayload {
                index: 4,
                color: Color::Red,
            }),
            ServerEvent::Turn(TurnPayload { turn: 1 }),
        ];
        assert_eq!(drain(&mut red), expected);
        assert_eq!(drain(&mut blue), expected);

        place(&mut authority, 2, 4);
        assert!(drain(&mut red).is_empty());
        assert!(drain(&mut blue).is_empty());
        assert_eq!(authority.game().turn(), 1);
    }

    #[test]
    fn win_closes_everyone_then_resets() {
        let mut authority = Authority::new();
        let mut red = connect(&mut authority, 1);
        let _blue = connect(&mut authority, 2);
        let mut watcher = connect(&mut authority, 3);
        for (id, index) in [(1, 0), (2, 3), (1, 1), (2, 4)] {
            place(&mut authority, id, index);
        }
        drain(&mut red);
        drain(&mut watcher);

        place(&mut authority, 1, 2);
        let events = drain(&mut watcher);
        assert_eq!(
            events[1],
            ServerEvent::Winner(WinnerPayload {
                color: Some(Color::Red),
                grids: [0, 1, 2],
            })
        );
        assert!(matches!(&events[2], ServerEvent::Close(close) if close.reason.contains("Red")));
        assert_eq!(drain(&mut red).len(), 3);

        // Outboxes were dropped with the round.
        assert_eq!(red.try_recv(), Err(TryRecvError::Disconnected));
        assert_eq!(authority.connection_count(), 0);
        assert_eq!(authority.game().turn(), 0);
        assert_eq!(authority.game().seats().occupied(), 0);

        // Late disconnects from the closed sockets are harmless.
        authority.handle(Command::Disconnect { id: ConnectionId(1) });
        let mut next = connect(&mut authority, 4);
        let init = expect_init(&mut next);
        assert_eq!((init.role, init.index, init.turn), (Role::Player, 0, 0));
    }

    #[test]
    fn disconnect_frees_the_seat() {
        let mut authority = Authority::new();
        let _red = connect(&mut authority, 1);
        let _blue = connect(&mut authority, 2);
        authority.handle(Command::Disconnect { id: ConnectionId(1) });
        assert_eq!(authority.connection_count(), 1);
        assert_eq!(authority.game().seats().holder(0), None);
        assert_eq!(authority.game().seats().holder(1), Some(ConnectionId(2)));
    }
}
