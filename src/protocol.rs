//! Wire format shared by the server and its clients.
//!
//! Every frame is a JSON text message shaped `{"event": "<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};

use crate::board::{Board, WinningLine};
use crate::error::ProtocolError;
use crate::piece::{Color, Piece};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Observer,
}

/// First frame a connection receives.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct InitPayload {
    pub role: Role,
    pub turn: u32,
    /// Seat index, `-1` for observers.
    pub index: i8,
    pub board: [Piece; Board::CELLS],
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PiecePayload {
    pub index: usize,
    pub color: Color,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TurnPayload {
    pub turn: u32,
}

/// End of a round. A draw carries no color and the `[-1, -1, -1]` sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct WinnerPayload {
    pub color: Option<Color>,
    pub grids: [i8; 3],
}

impl WinnerPayload {
    pub const DRAW_GRIDS: [i8; 3] = [-1; 3];

    pub fn won(color: Color, line: WinningLine) -> Self {
        Self {
            color: Some(color),
            grids: line.map(|index| index as i8),
        }
    }

    pub fn draw() -> Self {
        Self {
            color: None,
            grids: Self::DRAW_GRIDS,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.grids[0] == -1
    }

    pub fn line(&self) -> Option<WinningLine> {
        if self.is_draw() {
            return None;
        }
        let mut line = [0; 3];
        for (slot, &grid) in line.iter_mut().zip(self.grids.iter()) {
            *slot = usize::try_from(grid).ok().filter(|&i| i < Board::CELLS)?;
        }
        Some(line)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ClosePayload {
    pub reason: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PlacePayload {
    pub index: usize,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerEvent {
    Init(InitPayload),
    Piece(PiecePayload),
    Turn(TurnPayload),
    Winner(WinnerPayload),
    Close(ClosePayload),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Init(_) => "init",
            ServerEvent::Piece(_) => "piece",
            ServerEvent::Turn(_) => "turn",
            ServerEvent::Winner(_) => "winner",
            ServerEvent::Close(_) => "close",
        }
    }

    pub fn close(reason: impl Into<String>) -> Self {
        ServerEvent::Close(ClosePayload {
            reason: reason.into(),
        })
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientEvent {
    Place(PlacePayload),
}

impl ClientEvent {
    pub fn place(index: usize) -> Self {
        ClientEvent::Place(PlacePayload { index })
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_frame_shape() {
        let event = ServerEvent::Init(InitPayload {
            role: Role::Observer,
            turn: 3,
            index: -1,
            board: [Piece::Empty; Board::CELLS],
        });
        let json: serde_json::Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(json["event"], "init");
        assert_eq!(json["data"]["role"], "observer");
        assert_eq!(json["data"]["index"], -1);
        assert_eq!(json["data"]["board"].as_array().map(Vec::len), Some(9));
    }

    #[test]
    fn draw_winner_uses_sentinel() {
        let event = ServerEvent::Winner(WinnerPayload::draw());
        assert_eq!(
            event.encode().unwrap(),
            r#"{"event":"winner","data":{"color":null,"grids":[-1,-1,-1]}}"#
        );
        assert_eq!(WinnerPayload::draw().line(), None);
        assert_eq!(WinnerPayload::won(Color::Red, [0, 1, 2]).line(), Some([0, 1, 2]));
    }

    #[test]
    fn place_frame_decodes() {
        let event = ClientEvent::decode(r#"{"event":"place","data":{"index":4}}"#).unwrap();
        assert_eq!(event, ClientEvent::place(4));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let frame = r#"{"event":"init","data":{"role":"referee","turn":0,"index":0,
            "board":["empty","empty","empty","empty","empty","empty","empty","empty","empty"]}}"#;
        assert!(ServerEvent::decode(frame).is_err());
    }

    #[test]
    fn negative_place_index_is_rejected() {
        assert!(ClientEvent::decode(r#"{"event":"place","data":{"index":-3}}"#).is_err());
    }
}
