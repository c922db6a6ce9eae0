use bevy::prelude::*;
use tictactoe::{
    ClientEvent, ClientMirror, MirrorError, Phase, Piece, ServerEvent, View, WinningLine,
};

/// The client's copy of the round, fed by server events.
#[derive(Resource, Default)]
pub struct BoardData {
    mirror: ClientMirror,
    failure: Option<String>,
}

impl BoardData {
    pub fn apply(
        &mut self,
        event: &ServerEvent,
        queue: &mut RenderQueue,
    ) -> Result<(), MirrorError> {
        self.mirror.apply(event, queue)
    }

    pub fn view(&self) -> Option<&View> {
        self.mirror.view()
    }

    /// Placement intent for a clicked cell, if this client may move now.
    pub fn click(&self, index: usize) -> Option<ClientEvent> {
        self.mirror.click(index)
    }

    pub fn piece(&self, index: usize) -> Piece {
        self.view()
            .map(|view| view.board().board().get(index))
            .unwrap_or_default()
    }

    /// The server announced a result or closed the round.
    pub fn is_finished(&self) -> bool {
        self.mirror.phase() == Phase::Terminal
    }

    pub fn set_failure(&mut self, reason: String) {
        self.failure = Some(reason);
    }

    pub fn role_label(&self) -> String {
        self.view().map(role_label).unwrap_or_default()
    }

    pub fn turn_label(&self) -> String {
        self.view().map(View::turn_label).unwrap_or_default()
    }

    /// Headline for the game over screen.
    pub fn result(&self) -> String {
        let outcome = self.view().and_then(|view| {
            let result = view.board().result()?;
            Some(view.outcome(&result))
        });
        match (outcome, &self.failure) {
            (Some(outcome), _) => outcome,
            (None, Some(_)) => "Disconnected".to_string(),
            (None, None) => "Match Over".to_string(),
        }
    }

    /// Why the connection ended, if known.
    pub fn reason(&self) -> Option<&str> {
        self.failure.as_deref().or(self.mirror.close_reason())
    }
}

fn role_label(view: &View) -> String {
    match view.seat() {
        Some(seat) => format!("You are {seat}"),
        None => "Observing".to_string(),
    }
}

/// A single change the UI still has to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Init { role: String, turn: String },
    Piece { index: usize, piece: Piece },
    Turn { label: String, own_turn: bool },
    Winner { line: Option<WinningLine>, outcome: String },
    Close { reason: String },
}

/// Changes recorded by the mirror, drained by the UI every frame.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct RenderQueue(pub Vec<RenderCommand>);

impl tictactoe::Renderable for RenderQueue {
    fn render_init(&mut self, view: &View) {
        info!("{}", view.greeting());
        self.push(RenderCommand::Init {
            role: role_label(view),
            turn: view.turn_label(),
        });
    }

    fn render_piece(&mut self, index: usize, piece: Piece) {
        self.push(RenderCommand::Piece { index, piece });
    }

    fn render_turn(&mut self, _turn: u32, own_turn: bool, label: &str) {
        self.push(RenderCommand::Turn {
            label: label.to_string(),
            own_turn,
        });
    }

    fn render_winner(&mut self, line: Option<WinningLine>, outcome: &str) {
        self.push(RenderCommand::Winner {
            line,
            outcome: outcome.to_string(),
        });
    }

    fn render_close(&mut self, reason: &str) {
        self.push(RenderCommand::Close {
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe::{
        ClosePayload, Color as Seat, InitPayload, PiecePayload, Role, TurnPayload, WinnerPayload,
    };

    fn init(role: Role, index: i8) -> ServerEvent {
        ServerEvent::Init(InitPayload {
            role,
            turn: 0,
            index,
            board: [Piece::Empty; 9],
        })
    }

    #[test]
    fn player_round_is_queued_in_order() {
        let mut board = BoardData::default();
        let mut queue = RenderQueue::default();

        board.apply(&init(Role::Player, 1), &mut queue).unwrap();
        assert_eq!(board.role_label(), "You are Blue");
        assert_eq!(board.click(4), None);

        let red = PiecePayload {
            index: 4,
            color: Seat::Red,
        };
        board.apply(&ServerEvent::Piece(red), &mut queue).unwrap();
        board
            .apply(&ServerEvent::Turn(TurnPayload { turn: 1 }), &mut queue)
            .unwrap();
        assert_eq!(board.piece(4), Piece::Red);
        assert_eq!(board.click(0), Some(ClientEvent::place(0)));

        assert_eq!(
            queue.0,
            vec![
                RenderCommand::Init {
                    role: "You are Blue".into(),
                    turn: "Red's Turn.".into(),
                },
                RenderCommand::Piece {
                    index: 4,
                    piece: Piece::Red,
                },
                RenderCommand::Turn {
                    label: "Your Turn!".into(),
                    own_turn: true,
                },
            ]
        );
    }

    #[test]
    fn observer_sees_the_winner_then_the_reason() {
        let mut board = BoardData::default();
        let mut queue = RenderQueue::default();
        board.apply(&init(Role::Observer, -1), &mut queue).unwrap();
        queue.clear();

        let result = WinnerPayload::won(Seat::Blue, [2, 4, 6]);
        board.apply(&ServerEvent::Winner(result), &mut queue).unwrap();
        board
            .apply(&ServerEvent::close("Blue wins! Reconnect to play again."), &mut queue)
            .unwrap();

        assert!(board.is_finished());
        assert_eq!(board.result(), "Winner: Blue");
        assert_eq!(board.reason(), Some("Blue wins! Reconnect to play again."));
        assert_eq!(
            queue[0],
            RenderCommand::Winner {
                line: Some([2, 4, 6]),
                outcome: "Winner: Blue".into(),
            }
        );
        assert!(matches!(&queue[1], RenderCommand::Close { reason } if reason.contains("Blue")));
    }

    #[test]
    fn draw_has_no_line() {
        let mut board = BoardData::default();
        let mut queue = RenderQueue::default();
        board.apply(&init(Role::Player, 0), &mut queue).unwrap();
        queue.clear();

        board
            .apply(&ServerEvent::Winner(WinnerPayload::draw()), &mut queue)
            .unwrap();
        assert_eq!(board.result(), "It's a DRAW!");
        assert_eq!(
            queue.0,
            vec![RenderCommand::Winner {
                line: None,
                outcome: "It's a DRAW!".into(),
            }]
        );
    }

    #[test]
    fn bad_seat_is_reported() {
        let mut board = BoardData::default();
        let mut queue = RenderQueue::default();
        let err = board.apply(&init(Role::Player, 5), &mut queue).unwrap_err();
        assert_eq!(err, MirrorError::InvalidSeat(5));
        assert!(queue.is_empty());

        board.set_failure(err.to_string());
        assert_eq!(board.result(), "Disconnected");
        assert!(board.reason().is_some());
    }

    #[test]
    fn close_before_init_is_not_an_error() {
        let mut board = BoardData::default();
        let mut queue = RenderQueue::default();
        board
            .apply(
                &ServerEvent::Close(ClosePayload {
                    reason: "Server shutting down".into(),
                }),
                &mut queue,
            )
            .unwrap();
        assert!(board.is_finished());
        assert_eq!(board.reason(), Some("Server shutting down"));
    }
}
