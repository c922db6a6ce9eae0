//! Client-side copy of the board.
//!
//! The mirror never judges whether a move is legal. It only records what the
//! server pushed and decides, from the turn parity and its own seat, whether a
//! click is worth forwarding.

use crate::board::{Board, WinningLine};
use crate::error::MirrorError;
use crate::piece::{Color, Piece};
use crate::protocol::{ClientEvent, InitPayload, Role, ServerEvent, WinnerPayload};

/// Sink for view updates. The mirror calls it after changing its own state.
pub trait Renderable {
    fn render_init(&mut self, view: &View);
    fn render_piece(&mut self, index: usize, piece: Piece);
    fn render_turn(&mut self, turn: u32, own_turn: bool, label: &str);
    fn render_winner(&mut self, line: Option<WinningLine>, outcome: &str);
    fn render_close(&mut self, reason: &str);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Phase {
    #[default]
    Initializing,
    Active,
    Terminal,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct BoardMirror {
    board: Board,
    turn: u32,
    result: Option<WinnerPayload>,
}

impl BoardMirror {
    pub fn new(turn: u32, pieces: &[Piece; Board::CELLS]) -> Self {
        Self {
            board: Board::from_pieces(pieces),
            turn,
            result: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn result(&self) -> Option<WinnerPayload> {
        self.result
    }

    pub fn turn_owner(&self) -> Color {
        Color::from_turn(self.turn)
    }
}

/// A connection's view, tagged by the role the server granted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum View {
    Player { seat: Color, board: BoardMirror },
    Observer { board: BoardMirror },
}

impl View {
    pub fn from_init(init: &InitPayload) -> Result<Self, MirrorError> {
        let board = BoardMirror::new(init.turn, &init.board);
        match init.role {
            Role::Player => {
                let seat = usize::try_from(init.index)
                    .ok()
                    .and_then(Color::from_seat)
                    .ok_or(MirrorError::InvalidSeat(init.index))?;
                Ok(View::Player { seat, board })
            }
            Role::Observer => Ok(View::Observer { board }),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            View::Player { .. } => Role::Player,
            View::Observer { .. } => Role::Observer,
        }
    }

    pub fn seat(&self) -> Option<Color> {
        match self {
            View::Player { seat, .. } => Some(*seat),
            View::Observer { .. } => None,
        }
    }

    pub fn board(&self) -> &BoardMirror {
        match self {
            View::Player { board, .. } | View::Observer { board } => board,
        }
    }

    fn board_mut(&mut self) -> &mut BoardMirror {
        match self {
            View::Player { board, .. } | View::Observer { board } => board,
        }
    }

    pub fn is_own_turn(&self) -> bool {
        self.seat() == Some(self.board().turn_owner())
    }

    /// Placement intent for a clicked cell, if this view may act now.
    pub fn click(&self, index: usize) -> Option<ClientEvent> {
        match self {
            View::Player { .. } if self.is_own_turn() && index < Board::CELLS => {
                Some(ClientEvent::place(index))
            }
            _ => None,
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            View::Player { .. } => "You are a player!",
            View::Observer { .. } => {
                "Sorry, there can only be 2 players in a game, but you can still observe."
            }
        }
    }

    pub fn turn_label(&self) -> String {
        if self.is_own_turn() {
            return "Your Turn!".to_string();
        }
        format!("{}'s Turn.", self.board().turn_owner())
    }

    /// Human readable result, worded for this view.
    pub fn outcome(&self, result: &WinnerPayload) -> String {
        match (result.color, self.seat()) {
            (None, _) => "It's a DRAW!".to_string(),
            (Some(winner), Some(seat)) if winner == seat => "You Won!".to_string(),
            (Some(_), Some(_)) => "You Lost.".to_string(),
            (Some(winner), None) => format!("Winner: {winner}"),
        }
    }
}

/// Initializing -> Active -> Terminal.
#[derive(Clone, Debug, Default)]
pub struct ClientMirror {
    phase: Phase,
    view: Option<View>,
    close_reason: Option<String>,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn close_reason(&self) -> Option<&str> {
        self.close_reason.as_deref()
    }

    /// Applies one server event and forwards the change to `sink`.
    pub fn apply(
        &mut self,
        event: &ServerEvent,
        sink: &mut impl Renderable,
    ) -> Result<(), MirrorError> {
        match event {
            ServerEvent::Init(init) => {
                let view = View::from_init(init)?;
                sink.render_init(&view);
                self.view = Some(view);
                self.phase = Phase::Active;
                self.close_reason = None;
            }
            ServerEvent::Piece(piece) => {
                if piece.index >= Board::CELLS {
                    return Err(MirrorError::UnknownCell(piece.index));
                }
                let view = self.view_mut(event)?;
                view.board_mut().board.set(piece.index, piece.color.into());
                sink.render_piece(piece.index, piece.color.into());
            }
            ServerEvent::Turn(turn) => {
                let view = self.view_mut(event)?;
                view.board_mut().turn = turn.turn;
                sink.render_turn(turn.turn, view.is_own_turn(), &view.turn_label());
            }
            ServerEvent::Winner(result) => {
                let view = self.view_mut(event)?;
                view.board_mut().result = Some(*result);
                let outcome = view.outcome(result);
                sink.render_winner(result.line(), &outcome);
                self.phase = Phase::Terminal;
            }
            ServerEvent::Close(close) => {
                sink.render_close(&close.reason);
                self.close_reason = Some(close.reason.clone());
                self.phase = Phase::Terminal;
            }
        }
        Ok(())
    }

    /// Placement intent for a clicked cell. Only an active player view on its own turn sends one.
    pub fn click(&self, index: usize) -> Option<ClientEvent> {
        if self.phase != Phase::Active {
            return None;
        }
        self.view.as_ref()?.click(index)
    }

    fn view_mut(&mut self, event: &ServerEvent) -> Result<&mut View, MirrorError> {
        self.view
            .as_mut()
            .ok_or(MirrorError::NotInitialized(event.name()))
    }
}
