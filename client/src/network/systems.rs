use bevy::prelude::*;
use tictactoe::{
    ClosePayload, InitPayload, MirrorError, PiecePayload, ServerEvent, TurnPayload, WinnerPayload,
};

use crate::AppState;
use crate::resources::{BoardData, RenderQueue};

use super::{Net, NetworkConnection, OnConnect, OnDisconnect};

pub fn setup_systems(app: &mut App) {
    super::connect(app);

    // Server events arrive split by type; the chain keeps a frame's worth in protocol order.
    app.add_systems(
        Update,
        (
            on_network_connected.run_if(on_event::<Net<OnConnect>>),
            on_init.run_if(on_event::<Net<InitPayload>>),
            on_piece.run_if(on_event::<Net<PiecePayload>>),
            on_turn.run_if(on_event::<Net<TurnPayload>>),
            on_winner.run_if(on_event::<Net<WinnerPayload>>),
            on_close.run_if(on_event::<Net<ClosePayload>>),
            on_network_disconnected.run_if(on_event::<Net<OnDisconnect>>),
        )
            .chain()
            .in_set(NetworkSet),
    );
}

/// Systems that fold server events into `BoardData`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkSet;

pub fn on_network_connected(mut on_connected_ev: EventReader<Net<OnConnect>>) {
    for Net(OnConnect { session, url }) in on_connected_ev.read() {
        info!("Connection {session} established with {url}");
    }
}

pub fn on_init(
    mut cmds: Commands,
    mut init_ev: EventReader<Net<InitPayload>>,
    mut board: ResMut<BoardData>,
    mut render_queue: ResMut<RenderQueue>,
    mut game_state: ResMut<NextState<AppState>>,
) {
    for Net(init) in init_ev.read() {
        let event = ServerEvent::Init(init.clone());
        if let Err(err) = board.apply(&event, &mut render_queue) {
            fail(&mut cmds, &mut board, &mut game_state, err);
            continue;
        }
        if let Some(view) = board.view() {
            info!("Joined as {:?} on turn {}", view.role(), init.turn);
        }
        game_state.set(AppState::GameSetup);
    }
}

pub fn on_piece(
    mut cmds: Commands,
    mut piece_ev: EventReader<Net<PiecePayload>>,
    mut board: ResMut<BoardData>,
    mut render_queue: ResMut<RenderQueue>,
    mut game_state: ResMut<NextState<AppState>>,
) {
    for Net(piece) in piece_ev.read() {
        if let Err(err) = board.apply(&ServerEvent::Piece(*piece), &mut render_queue) {
            fail(&mut cmds, &mut board, &mut game_state, err);
        }
    }
}

pub fn on_turn(
    mut cmds: Commands,
    mut turn_ev: EventReader<Net<TurnPayload>>,
    mut board: ResMut<BoardData>,
    mut render_queue: ResMut<RenderQueue>,
    mut game_state: ResMut<NextState<AppState>>,
) {
    for Net(turn) in turn_ev.read() {
        if let Err(err) = board.apply(&ServerEvent::Turn(*turn), &mut render_queue) {
            fail(&mut cmds, &mut board, &mut game_state, err);
        }
    }
}

/// The grid switches to the game over screen once it has drawn the result.
pub fn on_winner(
    mut cmds: Commands,
    mut winner_ev: EventReader<Net<WinnerPayload>>,
    mut board: ResMut<BoardData>,
    mut render_queue: ResMut<RenderQueue>,
    mut game_state: ResMut<NextState<AppState>>,
) {
    for Net(result) in winner_ev.read() {
        if let Err(err) = board.apply(&ServerEvent::Winner(*result), &mut render_queue) {
            fail(&mut cmds, &mut board, &mut game_state, err);
        }
    }
}

pub fn on_close(
    mut cmds: Commands,
    mut close_ev: EventReader<Net<ClosePayload>>,
    mut board: ResMut<BoardData>,
    mut render_queue: ResMut<RenderQueue>,
    app_state: Res<State<AppState>>,
    mut game_state: ResMut<NextState<AppState>>,
) {
    for Net(close) in close_ev.read() {
        info!("Server closed the round: {}", close.reason);
        if let Err(err) = board.apply(&ServerEvent::Close(close.clone()), &mut render_queue) {
            fail(&mut cmds, &mut board, &mut game_state, err);
        }
        // Without a grid there is nothing left to draw first.
        if *app_state.get() == AppState::Initialization {
            game_state.set(AppState::GameOverScreen);
        }
    }
}

pub fn on_network_disconnected(
    mut disconnected_ev: EventReader<Net<OnDisconnect>>,
    mut board: ResMut<BoardData>,
    connection: Option<Res<NetworkConnection>>,
    app_state: Res<State<AppState>>,
    mut game_state: ResMut<NextState<AppState>>,
) {
    let current = connection.map(|connection| connection.session());
    for Net(OnDisconnect { session, error }) in disconnected_ev.read() {
        match error {
            Some(err) => warn!("Connection {session} lost: {err}"),
            None => info!("Connection {session} closed"),
        }
        // Sockets the app already let go of, and rounds the server ended on purpose.
        if current != Some(*session) || board.is_finished() {
            continue;
        }
        let reason = match error {
            Some(err) => err.clone(),
            None => "Lost connection to the server.".to_string(),
        };
        board.set_failure(reason);
        if *app_state.get() != AppState::GameOverScreen {
            game_state.set(AppState::GameOverScreen);
        }
    }
}

/// Ends the session: the socket is closed along with its `NetworkConnection`.
fn fail(
    cmds: &mut Commands,
    board: &mut BoardData,
    game_state: &mut NextState<AppState>,
    err: MirrorError,
) {
    error!("Unusable server event: {err}");
    cmds.remove_resource::<NetworkConnection>();
    board.set_failure(err.to_string());
    game_state.set(AppState::GameOverScreen);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;
    use tictactoe::{Piece, Role};

    use crate::network::ServerEventRouter;

    fn app_with_session(session: u64) -> (App, ServerEventRouter) {
        let mut app = App::new();
        app.add_plugins(StatesPlugin);
        app.init_state::<AppState>();
        app.init_resource::<BoardData>();
        app.init_resource::<RenderQueue>();
        let router = ServerEventRouter::register(&mut app);
        let (tx, _) = crossbeam_channel::unbounded();
        app.insert_resource(NetworkConnection::new(session, tx));
        app.add_systems(Update, (on_init, on_network_disconnected).chain());
        (app, router)
    }

    #[test]
    fn replaced_socket_cannot_end_the_session() {
        let (mut app, router) = app_with_session(2);

        router.disconnected(1, Some("stale".into()));
        app.update();
        assert_eq!(app.world().resource::<BoardData>().reason(), None);

        router.disconnected(2, Some("refused".into()));
        app.update();
        assert_eq!(app.world().resource::<BoardData>().reason(), Some("refused"));
    }

    #[test]
    fn unusable_init_drops_the_connection() {
        let (mut app, router) = app_with_session(1);

        router.route(ServerEvent::Init(InitPayload {
            role: Role::Player,
            turn: 0,
            index: 5,
            board: [Piece::Empty; 9],
        }));
        app.update();

        assert!(app.world().get_resource::<NetworkConnection>().is_none());
        let board = app.world().resource::<BoardData>();
        assert!(board.view().is_none());
        assert!(board.reason().is_some_and(|reason| reason.contains('5')));

        // The socket thread reports its exit afterwards; the failure stands.
        router.disconnected(1, None);
        app.update();
        let board = app.world().resource::<BoardData>();
        assert!(board.reason().is_some_and(|reason| reason.contains('5')));
    }
}
