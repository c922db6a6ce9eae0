//! Shared core for the two-player tic-tac-toe server and its clients.

pub mod board;
pub mod error;
pub mod game;
pub mod mirror;
pub mod piece;
pub mod protocol;

pub use board::{Board, WinningLine};
pub use error::{MirrorError, MoveError, ProtocolError};
pub use game::{ConnectionId, Dispatch, Game, PlaceOutcome, Seats};
pub use mirror::{BoardMirror, ClientMirror, Phase, Renderable, View};
pub use piece::{Color, Piece};
pub use protocol::{
    ClientEvent, ClosePayload, InitPayload, PiecePayload, PlacePayload, Role, ServerEvent,
    TurnPayload, WinnerPayload,
};
