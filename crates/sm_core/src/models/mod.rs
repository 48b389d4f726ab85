pub mod player;
pub mod team;

pub use player::{Contract, Player, PlayerId, Position};
pub use team::Team;
