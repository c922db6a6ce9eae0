use bevy::prelude::*;
use tictactoe::Piece;

use crate::AppState;
use crate::network::{NetworkConnection, NetworkRouter, NetworkSet, NetworkSettings};
use crate::resources::{BoardData, BoardSystems, RenderCommand, RenderQueue};

use super::{
    CELL_SIZE, CellMarked, CloseReasonLabel, ConnectingScreen, GameOverScreen, Grid, GridCell,
    ReconnectButton, RoleLabel, TopBar, TurnOwnerLabel, UiButtonStyle, colors,
};

pub fn setup_systems(app: &mut App) {
    // Waiting for the server's snapshot
    app.add_systems(OnEnter(AppState::Initialization), connecting_screen);

    // Game initialization step
    app.add_systems(OnEnter(AppState::GameSetup), initialize_grid_board);

    // Game in Progress
    app.add_systems(
        Update,
        grid_cell_interaction.run_if(in_state(AppState::GameInProgress)),
    );
    app.add_systems(
        Update,
        apply_render_queue.after(NetworkSet).run_if(
            in_state(AppState::GameInProgress).or(in_state(AppState::GameOverScreen)),
        ),
    );

    // Wrap up the match
    app.add_systems(OnEnter(AppState::GameOverScreen), game_over_screen);
    app.add_systems(
        Update,
        game_over_screen_interaction.run_if(in_state(AppState::GameOverScreen)),
    );
}

pub fn connecting_screen(mut cmds: Commands, settings: Res<NetworkSettings>) {
    info!("Connecting to {}", settings.url);
    cmds.spawn((
        StateScoped(AppState::Initialization),
        ConnectingScreen,
        Node {
            width: Val::Percent(100.),
            height: Val::Percent(100.),
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            flex_direction: FlexDirection::Column,
            ..default()
        },
    ))
    .with_child((
        Label,
        Text::new("Connecting..."),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(colors::GOLD.into()),
    ));
}

pub fn initialize_grid_board(
    mut cmds: Commands,
    mut game_state: ResMut<NextState<AppState>>,
    mut render_queue: ResMut<RenderQueue>,
    board: Res<BoardData>,
) {
    // The grid below is built from the current snapshot.
    render_queue.retain(|command| !matches!(command, RenderCommand::Piece { .. }));

    cmds.spawn((
        StateScoped(AppState::GameInProgress),
        TopBar,
        Node {
            width: Val::Percent(100.),
            height: Val::Px(CELL_SIZE),
            align_items: AlignItems::Center,
            justify_content: JustifyContent::SpaceEvenly,
            flex_direction: FlexDirection::Column,
            ..default()
        },
        BoxShadow::new(
            colors::DODGER_BLUE.with_alpha(0.5).into(),
            Val::Px(0.),
            Val::Px(-2.),
            Val::Px(2.),
            Val::Px(10.0),
        ),
    ))
    .with_children(|top_bar| {
        top_bar.spawn((
            RoleLabel,
            Label,
            Text::new(board.role_label()),
            TextFont {
                font_size: 14.0,
                ..default()
            },
            TextColor(Color::WHITE),
        ));
        top_bar.spawn((
            TurnOwnerLabel,
            Label,
            Text::new(board.turn_label()),
            TextFont {
                font_size: 16.0,
                ..default()
            },
            TextColor(colors::GOLD.into()),
        ));
    });

    cmds.spawn((
        Grid,
        Node {
            width: Val::Px(CELL_SIZE * 3.),
            height: Val::Px(CELL_SIZE * 3.),
            top: Val::Px(244. - CELL_SIZE * 3.),
            left: Val::Px(4.),
            align_items: AlignItems::Center,
            justify_items: JustifyItems::Center,
            row_gap: Val::Px(1.),
            column_gap: Val::Px(1.),
            display: Display::Grid,
            position_type: PositionType::Absolute,
            grid_template_rows: vec![RepeatedGridTrack::px(3, CELL_SIZE)],
            grid_template_columns: vec![RepeatedGridTrack::px(3, CELL_SIZE)],
            ..default()
        },
        ZIndex(0),
        BoxShadow::new(
            colors::GREEN_YELLOW.with_alpha(0.5).into(),
            Val::Px(0.),
            Val::Px(-2.),
            Val::Px(2.),
            Val::Px(10.0),
        ),
    ))
    .with_children(|grid| {
        for index in 0..tictactoe::Board::CELLS {
            let mut cell = grid.spawn((
                GridCell(index),
                Button,
                Node {
                    width: Val::Px(CELL_SIZE),
                    height: Val::Px(CELL_SIZE),
                    border: UiRect::all(Val::Px(2.)),
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    ..default()
                },
                BorderColor(colors::GREEN_YELLOW.into()),
                BackgroundColor(colors::DODGER_BLUE.into()),
                BorderRadius::all(Val::Px(5.)),
            ));
            if let Some(style) = PieceStyle::of(board.piece(index)) {
                cell.insert((CellMarked, BackgroundColor(style.color)))
                    .with_child(style.letter());
            }
        }
    });

    game_state.set(AppState::GameInProgress);
}

#[allow(clippy::type_complexity)]
pub fn grid_cell_interaction(
    mut interaction_query: Query<
        (
            &GridCell,
            &Interaction,
            &mut BackgroundColor,
            &mut BorderColor,
        ),
        (Changed<Interaction>, With<Button>, Without<CellMarked>),
    >,
    board: Res<BoardData>,
    maybe_conn: Option<Res<NetworkConnection>>,
) {
    for (cell, interaction, mut color, mut border_color) in &mut interaction_query {
        match *interaction {
            Interaction::Pressed => {
                let Some(intent) = board.click(**cell) else {
                    continue;
                };
                debug!("Placing on cell {}", **cell);
                let sent = maybe_conn.as_ref().is_some_and(|conn| conn.send(intent));
                if !sent {
                    warn!("Socket thread is gone, dropped click on cell {}", **cell);
                }
            }
            Interaction::Hovered => {
                *color = colors::GREEN_YELLOW.into();
                *border_color = colors::DODGER_BLUE.into();
            }
            Interaction::None => {
                *color = colors::DODGER_BLUE.into();
                *border_color = colors::GREEN_YELLOW.into();
            }
        }
    }
}

/// Draws what the mirror recorded since the last frame.
#[allow(clippy::type_complexity)]
pub fn apply_render_queue(
    mut cmds: Commands,
    mut render_queue: ResMut<RenderQueue>,
    mut cell_q: Query<(
        Entity,
        &GridCell,
        &mut BackgroundColor,
        &mut BorderColor,
        Has<CellMarked>,
    )>,
    mut turn_owner_label_q: Query<
        (&mut Text, &mut TextColor),
        (With<TurnOwnerLabel>, Without<RoleLabel>, Without<CloseReasonLabel>),
    >,
    mut role_label_q: Query<
        &mut Text,
        (With<RoleLabel>, Without<TurnOwnerLabel>, Without<CloseReasonLabel>),
    >,
    mut reason_label_q: Query<
        &mut Text,
        (With<CloseReasonLabel>, Without<TurnOwnerLabel>, Without<RoleLabel>),
    >,
    app_state: Res<State<AppState>>,
    mut game_state: ResMut<NextState<AppState>>,
) -> Result {
    let game_over = *app_state.get() == AppState::GameOverScreen;

    for command in render_queue.drain(..) {
        match command {
            RenderCommand::Init { role, turn } => {
                if let Ok(mut role_label) = role_label_q.single_mut() {
                    role_label.0 = role;
                }
                if let Ok((mut turn_owner_label, mut text_color)) = turn_owner_label_q.single_mut()
                {
                    turn_owner_label.0 = turn;
                    *text_color = colors::GOLD.into();
                }
            }
            RenderCommand::Piece { index, piece } => {
                let (entity, _, mut color, _, marked) = cell_q
                    .iter_mut()
                    .find(|(_, cell, ..)| cell.0 == index)
                    .ok_or(BevyError::from("Grid cell was not found"))?;
                let Some(style) = PieceStyle::of(piece) else {
                    continue;
                };
                if !marked {
                    *color = style.color.into();
                    cmds.entity(entity)
                        .insert(CellMarked)
                        .with_child(style.letter());
                }
            }
            RenderCommand::Turn { label, own_turn } => {
                let Ok((mut turn_owner_label, mut text_color)) = turn_owner_label_q.single_mut()
                else {
                    continue;
                };
                turn_owner_label.0 = label;
                *text_color = if own_turn {
                    Color::WHITE.into()
                } else {
                    colors::GOLD.into()
                };
            }
            RenderCommand::Winner { line, outcome } => {
                info!("{outcome}");
                for index in line.into_iter().flatten() {
                    if let Some((entity, _, _, mut border_color, _)) =
                        cell_q.iter_mut().find(|(_, cell, ..)| cell.0 == index)
                    {
                        *border_color = colors::GOLD.into();
                        cmds.entity(entity).insert(BoxShadow::new(
                            colors::GOLD.into(),
                            Val::Px(0.),
                            Val::Px(0.),
                            Val::Px(2.),
                            Val::Px(8.0),
                        ));
                    }
                }
                if !game_over {
                    game_state.set(AppState::GameOverScreen);
                }
            }
            RenderCommand::Close { reason } => {
                if let Ok(mut reason_label) = reason_label_q.single_mut() {
                    reason_label.0 = reason;
                }
                if !game_over {
                    game_state.set(AppState::GameOverScreen);
                }
            }
        }
    }
    Ok(())
}

/// Fill and letter of a marked cell.
struct PieceStyle {
    color: Color,
    text_color: Color,
    letter: &'static str,
}

impl PieceStyle {
    fn of(piece: Piece) -> Option<Self> {
        match piece {
            Piece::Red => Some(Self {
                color: colors::CRIMSON.into(),
                text_color: colors::GOLD.into(),
                letter: "R",
            }),
            Piece::Blue => Some(Self {
                color: colors::ROYAL_BLUE.into(),
                text_color: colors::GREEN_YELLOW.into(),
                letter: "B",
            }),
            Piece::Empty => None,
        }
    }

    fn letter(&self) -> (Text, TextFont, TextColor) {
        (
            Text::new(self.letter),
            TextFont {
                font_size: 40.0,
                ..default()
            },
            TextColor(self.text_color),
        )
    }
}

pub fn clear_board(mut cmds: Commands, grid_q: Query<Entity, With<Grid>>) {
    if let Ok(grid) = grid_q.single() {
        cmds.entity(grid).despawn();
    }

    cmds.insert_resource(BoardData::default());
    cmds.insert_resource(RenderQueue::default());
}

pub fn game_over_screen(mut cmds: Commands, board: Res<BoardData>) {
    cmds.spawn((
        StateScoped(AppState::GameOverScreen),
        GameOverScreen,
        Node {
            width: Val::Percent(100.),
            height: Val::Px(CELL_SIZE),
            align_items: AlignItems::Center,
            justify_content: JustifyContent::SpaceEvenly,
            ..default()
        },
        BackgroundColor(Color::BLACK.with_alpha(0.975)),
        ZIndex(2),
    ))
    .with_children(|parent| {
        parent
            .spawn(Node {
                width: Val::Percent(62.),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                ..default()
            })
            .with_children(|left_side| {
                left_side.spawn((
                    Label,
                    Text::new(board.result()),
                    TextFont {
                        font_size: 18.0,
                        ..default()
                    },
                    TextColor(colors::GREEN_YELLOW.into()),
                    BoxShadow::new(
                        colors::DARK_VIOLET.into(),
                        Val::Px(0.),
                        Val::Px(0.),
                        Val::Percent(60.),
                        Val::Px(30.0),
                    ),
                ));
                left_side.spawn((
                    CloseReasonLabel,
                    Label,
                    Text::new(board.reason().unwrap_or_default()),
                    TextFont {
                        font_size: 10.0,
                        ..default()
                    },
                    TextLayout::new_with_justify(JustifyText::Center),
                    TextColor(colors::GOLD.into()),
                ));
            });

        let reconnect_button_style = UiButtonStyle {
            color: colors::GOLD.into(),
            border_color: colors::DEEP_PINK.into(),
            text_color: colors::DARK_VIOLET.into(),
        };

        parent
            .spawn((
                ReconnectButton,
                Button,
                reconnect_button_style,
                Node {
                    width: Val::Percent(32.0),
                    height: Val::Px(28.0),
                    border: UiRect::all(Val::Px(1.0)),
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    ..default()
                },
                BorderRadius::all(Val::Px(10.0)),
                BorderColor(reconnect_button_style.border_color),
                BackgroundColor(reconnect_button_style.color),
            ))
            .with_child((
                Text::new("Again"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(reconnect_button_style.text_color),
            ));
    });
}

#[allow(clippy::type_complexity)]
pub fn game_over_screen_interaction(
    mut cmds: Commands,
    mut interaction_query: Query<
        (
            &UiButtonStyle,
            &Interaction,
            &mut BackgroundColor,
            &mut BorderColor,
            &Children,
        ),
        (Changed<Interaction>, With<ReconnectButton>),
    >,
    mut text_query: Query<&mut TextColor>,
    mut game_state: ResMut<NextState<AppState>>,
    board_systems: Res<BoardSystems>,
    settings: Res<NetworkSettings>,
    router: Res<NetworkRouter>,
) {
    for (reconnect_button, interaction, mut color, mut border_color, children) in
        &mut interaction_query
    {
        let Ok(mut text_color) = text_query.get_mut(children[0]) else {
            continue;
        };
        match *interaction {
            Interaction::Pressed => {
                *color = Color::WHITE.into();
                *border_color = reconnect_button.text_color.into();
                cmds.run_system(board_systems.clear_board);
                // Replacing the connection closes the previous socket.
                cmds.insert_resource(crate::network::open(&settings, &router));
                game_state.set(AppState::Initialization);
            }
            Interaction::Hovered => {
                *color = reconnect_button.text_color.into();
                *text_color = reconnect_button.color.into();
                *border_color = Color::WHITE.into();
            }
            Interaction::None => {
                *color = reconnect_button.color.into();
                *text_color = reconnect_button.text_color.into();
                *border_color = reconnect_button.border_color.into();
            }
        }
    }
}
