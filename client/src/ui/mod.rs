pub mod colors;
mod systems;

use bevy::prelude::*;

pub use systems::*;

#[derive(Component)]
pub struct ConnectingScreen;

#[derive(Component, Clone, Copy)]
pub struct UiButtonStyle {
    pub color: Color,
    pub border_color: Color,
    pub text_color: Color,
}

#[derive(Component)]
struct TopBar;

#[derive(Component)]
pub struct TurnOwnerLabel;

#[derive(Component)]
pub struct RoleLabel;

#[derive(Component)]
pub struct CloseReasonLabel;

#[derive(Component)]
pub struct ReconnectButton;

const CELL_SIZE: f32 = 60.;

#[derive(Component)]
pub struct CellMarked;

#[derive(Component, Deref)]
pub struct GridCell(pub usize);

#[derive(Component)]
pub struct Grid;

#[derive(Component)]
pub struct GameOverScreen;
