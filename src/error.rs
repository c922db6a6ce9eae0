use thiserror::Error;

/// Reasons a placement is refused. The server drops these without telling anyone.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("cell index {0} is outside the board")]
    CellOutOfRange(usize),

    #[error("connection does not hold a seat")]
    NotSeated,

    #[error("it is not this seat's turn")]
    NotYourTurn,

    #[error("cell {0} is already taken")]
    Occupied(usize),

    #[error("the round is already decided")]
    RoundOver,
}

/// Fatal conditions for a client mirror.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("received `{0}` before `init`")]
    NotInitialized(&'static str),

    #[error("player init carried seat index {0}")]
    InvalidSeat(i8),

    #[error("cell index {0} is outside the board")]
    UnknownCell(usize),
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}
