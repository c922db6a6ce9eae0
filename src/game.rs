use std::collections::HashSet;
use std::fmt;

use log::{debug, info};

use crate::board::{Board, WinningLine};
use crate::error::MoveError;
use crate::piece::Color;
use crate::protocol::{InitPayload, PiecePayload, Role, ServerEvent, TurnPayload, WinnerPayload};

/// Identity the server hands out to every socket.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the game asks its owner to deliver, in order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Dispatch {
    Send(ConnectionId, ServerEvent),
    Broadcast(ServerEvent),
    /// Tell every connection `reason`, disconnect them all, then reset the game.
    EndRound { reason: String },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlaceOutcome {
    Next { piece: PiecePayload, turn: u32 },
    Won { piece: PiecePayload, color: Color, line: WinningLine },
    Drawn { piece: PiecePayload },
}

/// Seat 0 plays Red, seat 1 plays Blue.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Seats([Option<ConnectionId>; 2]);

impl Seats {
    /// Gives `id` the lowest free seat.
    pub fn claim(&mut self, id: ConnectionId) -> Option<usize> {
        let seat = self.0.iter().position(Option::is_none)?;
        self.0[seat] = Some(id);
        Some(seat)
    }

    pub fn seat_of(&self, id: ConnectionId) -> Option<usize> {
        self.0.iter().position(|holder| *holder == Some(id))
    }

    pub fn vacate(&mut self, id: ConnectionId) -> Option<usize> {
        let seat = self.seat_of(id)?;
        self.0[seat] = None;
        Some(seat)
    }

    pub fn holder(&self, seat: usize) -> Option<ConnectionId> {
        self.0.get(seat).copied().flatten()
    }

    pub fn occupied(&self) -> usize {
        self.0.iter().filter(|holder| holder.is_some()).count()
    }
}

/// The single authoritative game instance.
#[derive(Debug, Default)]
pub struct Game {
    board: Board,
    turn: u32,
    seats: Seats,
    observers: HashSet<ConnectionId>,
    result: Option<WinnerPayload>,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn seats(&self) -> &Seats {
        &self.seats
    }

    pub fn observers(&self) -> &HashSet<ConnectionId> {
        &self.observers
    }

    pub fn turn_owner(&self) -> Color {
        Color::from_turn(self.turn)
    }

    /// Seats `id` if a seat is free, otherwise adds it to the observers.
    pub fn connect(&mut self, id: ConnectionId) -> InitPayload {
        let (role, index) = match self.seats.claim(id) {
            Some(seat) => {
                info!("{id} takes seat {seat}");
                (Role::Player, seat as i8)
            }
            None => {
                info!("{id} joins as observer");
                self.observers.insert(id);
                (Role::Observer, -1)
            }
        };
        InitPayload {
            role,
            turn: self.turn,
            index,
            board: self.board.pieces(),
        }
    }

    /// Frees the seat `id` held, or drops it from the observers.
    pub fn disconnect(&mut self, id: ConnectionId) -> Option<Role> {
        if let Some(seat) = self.seats.vacate(id) {
            info!("{id} leaves seat {seat}");
            return Some(Role::Player);
        }
        if self.observers.remove(&id) {
            info!("{id} stops observing");
            return Some(Role::Observer);
        }
        None
    }

    pub fn place(&mut self, id: ConnectionId, index: usize) -> Result<PlaceOutcome, MoveError> {
        if self.result.is_some() {
            return Err(MoveError::RoundOver);
        }
        Board::cell_mask(index)?;
        let seat = self.seats.seat_of(id).ok_or(MoveError::NotSeated)?;
        let color = self.turn_owner();
        if color.seat() != seat {
            return Err(MoveError::NotYourTurn);
        }
        self.board.place(index, color)?;

        let piece = PiecePayload { index, color };
        if let Some(line) = self.board.winning_line() {
            self.result = Some(WinnerPayload::won(color, line));
            return Ok(PlaceOutcome::Won { piece, color, line });
        }
        if self.board.is_full() {
            self.result = Some(WinnerPayload::draw());
            return Ok(PlaceOutcome::Drawn { piece });
        }
        self.turn += 1;
        Ok(PlaceOutcome::Next {
            piece,
            turn: self.turn,
        })
    }

    /// Clears seats, observers, board and turn together.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn on_connect(&mut self, id: ConnectionId) -> Vec<Dispatch> {
        let init = self.connect(id);
        vec![Dispatch::Send(id, ServerEvent::Init(init))]
    }

    pub fn on_disconnect(&mut self, id: ConnectionId) -> Vec<Dispatch> {
        self.disconnect(id);
        Vec::new()
    }

    /// Applies a placement request. Illegal requests produce nothing.
    pub fn on_place(&mut self, id: ConnectionId, index: usize) -> Vec<Dispatch> {
        let outcome = match self.place(id, index) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!("{id} place({index}) dropped: {err}");
                return Vec::new();
            }
        };

        match outcome {
            PlaceOutcome::Next { piece, turn } => vec![
                Dispatch::Broadcast(ServerEvent::Piece(piece)),
                Dispatch::Broadcast(ServerEvent::Turn(TurnPayload { turn })),
            ],
            PlaceOutcome::Won { piece, color, line } => {
                info!("{color} wins on {line:?}\n{}", self.board);
                vec![
                    Dispatch::Broadcast(ServerEvent::Piece(piece)),
                    Dispatch::Broadcast(ServerEvent::Winner(WinnerPayload::won(color, line))),
                    Dispatch::EndRound {
                        reason: format!("{color} wins! Reconnect to play again."),
                    },
                ]
            }
            PlaceOutcome::Drawn { piece } => {
                info!("round drawn\n{}", self.board);
                vec![
                    Dispatch::Broadcast(ServerEvent::Piece(piece)),
                    Dispatch::Broadcast(ServerEvent::Winner(WinnerPayload::draw())),
                    Dispatch::EndRound {
                        reason: "It's a draw! Reconnect to play again.".to_string(),
                    },
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Piece;

    const RED: ConnectionId = ConnectionId(1);
    const BLUE: ConnectionId = ConnectionId(2);
    const WATCHER: ConnectionId = ConnectionId(3);

    fn seated_game() -> Game {
        let mut game = Game::new();
        game.connect(RED);
        game.connect(BLUE);
        game
    }

    #[test]
    fn first_two_connections_take_seats() {
        let mut game = Game::new();
        let red = game.connect(RED);
        let blue = game.connect(BLUE);
        assert_eq!((red.role, red.index), (Role::Player, 0));
        assert_eq!((blue.role, blue.index), (Role::Player, 1));
        assert_eq!(game.seats().occupied(), 2);
    }

    #[test]
    fn third_connection_observes() {
        let mut game = seated_game();
        let init = game.connect(WATCHER);
        assert_eq!(init.role, Role::Observer);
        assert_eq!(init.index, -1);
        assert!(game.observers().contains(&WATCHER));
    }

    #[test]
    fn vacated_seat_is_reused() {
        let mut game = seated_game();
        game.connect(WATCHER);
        assert_eq!(game.disconnect(RED), Some(Role::Player));
        let init = game.connect(ConnectionId(4));
        assert_eq!((init.role, init.index), (Role::Player, 0));
        assert_eq!(game.disconnect(WATCHER), Some(Role::Observer));
        assert_eq!(game.disconnect(WATCHER), None);
    }

    #[test]
    fn init_carries_turn_and_board() {
        let mut game = seated_game();
        game.place(RED, 4).unwrap();
        let init = game.connect(WATCHER);
        assert_eq!(init.turn, 1);
        assert_eq!(init.board[4], Piece::Red);
    }

    #[test]
    fn occupied_cell_keeps_turn() {
        let mut game = seated_game();
        let dispatches = game.on_place(RED, 4);
        assert_eq!(dispatches.len(), 2);
        assert_eq!(game.turn(), 1);

        assert!(game.on_place(BLUE, 4).is_empty());
        assert_eq!(game.turn(), 1);
        assert_eq!(game.board().get(4), Piece::Red);
        assert_eq!(game.place(BLUE, 4), Err(MoveError::Occupied(4)));
    }

    #[test]
    fn out_of_turn_and_observer_moves_are_ignored() {
        let mut game = seated_game();
        game.connect(WATCHER);
        assert_eq!(game.place(BLUE, 0), Err(MoveError::NotYourTurn));
        assert_eq!(game.place(WATCHER, 0), Err(MoveError::NotSeated));
        assert_eq!(game.place(RED, 12), Err(MoveError::CellOutOfRange(12)));
        assert!(game.on_place(WATCHER, 0).is_empty());
        assert_eq!(game.turn(), 0);
        assert_eq!(game.board().occupied(), 0);
    }

    #[test]
    fn red_completes_top_row() {
        let mut game = seated_game();
        for (id, index) in [(RED, 0), (BLUE, 3), (RED, 1), (BLUE, 4)] {
            assert_eq!(game.on_place(id, index).len(), 2);
        }
        let dispatches = game.on_place(RED, 2);
        assert_eq!(
            dispatches[..2],
            [
                Dispatch::Broadcast(ServerEvent::Piece(PiecePayload {
                    index: 2,
                    color: Color::Red
                })),
                Dispatch::Broadcast(ServerEvent::Winner(WinnerPayload {
                    color: Some(Color::Red),
                    grids: [0, 1, 2],
                })),
            ]
        );
        assert!(matches!(dispatches[2], Dispatch::EndRound { .. }));
        assert_eq!(game.turn(), 4);
        assert_eq!(game.place(BLUE, 8), Err(MoveError::RoundOver));
    }

    #[test]
    fn full_board_is_a_draw() {
        let mut game = seated_game();
        // R B R
        // R B B
        // B R R
        for (id, index) in [
            (RED, 0),
            (BLUE, 1),
            (RED, 2),
            (BLUE, 4),
            (RED, 3),
            (BLUE, 5),
            (RED, 7),
            (BLUE, 6),
        ] {
            assert_eq!(game.on_place(id, index).len(), 2, "move {index}");
        }
        let dispatches = game.on_place(RED, 8);
        assert_eq!(
            dispatches[1],
            Dispatch::Broadcast(ServerEvent::Winner(WinnerPayload::draw()))
        );
        assert!(matches!(dispatches[2], Dispatch::EndRound { .. }));
    }

    #[test]
    fn reset_clears_everything() {
        let mut game = seated_game();
        game.connect(WATCHER);
        game.place(RED, 0).unwrap();
        game.reset();
        assert_eq!(game.turn(), 0);
        assert_eq!(game.seats().occupied(), 0);
        assert!(game.observers().is_empty());
        assert_eq!(game.board().occupied(), 0);

        game.connect(RED);
        game.connect(BLUE);
        assert!(game.place(RED, 0).is_ok());
    }
}
