pub mod player;
pub mod rodio_player;

pub use player::{AlarmPlayer, PlaybackHandle};
pub use rodio_player::RodioPlayer;
