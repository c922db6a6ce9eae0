pub use bevy::color::palettes::css::{
    CRIMSON, DARK_VIOLET, DEEP_PINK, DODGER_BLUE, GOLD, GREEN_YELLOW, ROYAL_BLUE,
};
