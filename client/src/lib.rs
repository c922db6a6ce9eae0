//! Bevy front end for the tic-tac-toe server.
//!
//! Server events are folded into a `tictactoe::ClientMirror`, which queues
//! render commands for the UI systems to draw.

mod network;
mod resources;
mod ui;

use bevy::prelude::*;

use resources::{BoardData, BoardSystems, RenderQueue};

/// Connecting, then playing one round, then showing how it ended.
#[derive(States, Default, Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppState {
    /// Waiting for the server's `init` snapshot.
    #[default]
    Initialization,
    GameSetup,
    GameInProgress,
    /// Result or close reason is shown; no more clicks are forwarded.
    GameOverScreen,
}

pub struct TicTacToe;

impl Plugin for TicTacToe {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>();
        app.enable_state_scoped_entities::<AppState>();
        app.init_resource::<BoardData>();
        app.init_resource::<RenderQueue>();
        app.init_resource::<BoardSystems>();

        app.add_systems(Startup, spawn_camera);

        network::setup_systems(app);
        ui::setup_systems(app);
    }
}

fn spawn_camera(mut cmds: Commands) {
    cmds.spawn((
        Camera2d,
        Transform {
            translation: Vec3 {
                x: 90.,
                y: 120.,
                z: 1.,
            },
            ..default()
        },
    ));
}
