mod board_data;

pub use board_data::*;

use bevy::ecs::system::SystemId;
use bevy::prelude::{FromWorld, Resource, World};

use crate::ui;

/// One-shot systems run from button handlers.
#[derive(Resource)]
pub struct BoardSystems {
    pub clear_board: SystemId,
}

impl FromWorld for BoardSystems {
    fn from_world(world: &mut World) -> Self {
        Self {
            clear_board: world.register_system(ui::clear_board),
        }
    }
}
