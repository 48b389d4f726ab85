//! Tactical formations and lineup assignment.
//!
//! The formation catalog is static configuration: a fixed set of named
//! layouts, each an ordered list of (position, row, col) spots with the
//! goalkeeper always first.

pub mod assigner;
pub mod service;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::models::{Player, Position};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FormationSpot {
    pub position: Position,
    pub row: u8,
    pub col: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formation {
    pub key: &'static str,
    pub spots: Vec<FormationSpot>,
}

impl Formation {
    fn new(key: &'static str, layout: &[(Position, u8, u8)]) -> Self {
        let spots = layout
            .iter()
            .map(|&(position, row, col)| FormationSpot { position, row, col })
            .collect();
        Formation { key, spots }
    }
}

/// The full formation catalog, in shortlist iteration order.
pub static CATALOG: Lazy<Vec<Formation>> = Lazy::new(|| {
    use Position::*;
    vec![
        Formation::new(
            "4-4-2",
            &[
                (GK, 0, 2),
                (LB, 1, 0),
                (CB, 1, 1),
                (CB, 1, 3),
                (RB, 1, 4),
                (LM, 3, 0),
                (CM, 3, 1),
                (CM, 3, 3),
                (RM, 3, 4),
                (ST, 5, 1),
                (ST, 5, 3),
            ],
        ),
        Formation::new(
            "4-3-3",
            &[
                (GK, 0, 2),
                (LB, 1, 0),
                (CB, 1, 1),
                (CB, 1, 3),
                (RB, 1, 4),
                (CDM, 2, 2),
                (CM, 3, 1),
                (CM, 3, 3),
                (LW, 5, 0),
                (ST, 5, 2),
                (RW, 5, 4),
            ],
        ),
        Formation::new(
            "4-2-3-1",
            &[
                (GK, 0, 2),
                (LB, 1, 0),
                (CB, 1, 1),
                (CB, 1, 3),
                (RB, 1, 4),
                (CDM, 2, 1),
                (CDM, 2, 3),
                (LM, 4, 0),
                (CAM, 4, 2),
                (RM, 4, 4),
                (ST, 5, 2),
            ],
        ),
        Formation::new(
            "3-5-2",
            &[
                (GK, 0, 2),
                (CB, 1, 1),
                (CB, 1, 2),
                (CB, 1, 3),
                (LWB, 3, 0),
                (CDM, 2, 2),
                (CM, 3, 1),
                (CM, 3, 3),
                (RWB, 3, 4),
                (ST, 5, 1),
                (ST, 5, 3),
            ],
        ),
        Formation::new(
            "4-5-1",
            &[
                (GK, 0, 2),
                (LB, 1, 0),
                (CB, 1, 1),
                (CB, 1, 3),
                (RB, 1, 4),
                (LM, 3, 0),
                (CM, 3, 1),
                (CDM, 2, 2),
                (CM, 3, 3),
                (RM, 3, 4),
                (ST, 5, 2),
            ],
        ),
        Formation::new(
            "5-3-2",
            &[
                (GK, 0, 2),
                (LWB, 1, 0),
                (CB, 1, 1),
                (CB, 1, 2),
                (CB, 1, 3),
                (RWB, 1, 4),
                (CM, 3, 1),
                (CDM, 2, 2),
                (CM, 3, 3),
                (ST, 5, 1),
                (ST, 5, 3),
            ],
        ),
        Formation::new(
            "3-4-3",
            &[
                (GK, 0, 2),
                (CB, 1, 1),
                (CB, 1, 2),
                (CB, 1, 3),
                (LM, 3, 0),
                (CM, 3, 1),
                (CM, 3, 3),
                (RM, 3, 4),
                (LW, 5, 0),
                (ST, 5, 2),
                (RW, 5, 4),
            ],
        ),
    ]
});

/// Look up a formation by its catalog key (e.g. "4-3-3").
pub fn formation(key: &str) -> Option<&'static Formation> {
    CATALOG.iter().find(|f| f.key == key)
}

/// How well a player fits a spot position, as a multiplier on their score.
///
/// An exact match is worth full value; outfield players in goal (and the
/// keeper outfield) are nearly worthless; otherwise fit falls off with the
/// distance between pitch lines.
pub fn position_affinity(natural: Position, spot: Position) -> f32 {
    if natural == spot {
        return 1.0;
    }
    if natural.is_goalkeeper() || spot.is_goalkeeper() {
        return 0.2;
    }
    match natural.line().distance(spot.line()) {
        0 => 0.8,
        1 => 0.55,
        _ => 0.35,
    }
}

/// A player's effective value when fielded at `spot`.
pub fn spot_score(player: &Player, spot: Position) -> f32 {
    player.score * position_affinity(player.position, spot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_formation_has_eleven_spots_keeper_first() {
        for f in CATALOG.iter() {
            assert_eq!(f.spots.len(), crate::rules::LINEUP_SIZE, "{}", f.key);
            assert!(f.spots[0].position.is_goalkeeper(), "{}", f.key);
            assert_eq!(
                f.spots.iter().filter(|s| s.position.is_goalkeeper()).count(),
                1,
                "{}",
                f.key
            );
        }
    }

    #[test]
    fn catalog_keys_are_unique_and_resolvable() {
        for f in CATALOG.iter() {
            assert_eq!(formation(f.key).unwrap().key, f.key);
        }
        assert!(formation("9-9-9").is_none());
    }

    #[test]
    fn affinity_prefers_natural_then_near_lines() {
        assert_eq!(position_affinity(Position::CB, Position::CB), 1.0);
        assert!(position_affinity(Position::CB, Position::LB) > position_affinity(Position::CB, Position::CM));
        assert!(position_affinity(Position::CB, Position::CM) > position_affinity(Position::CB, Position::ST));
        assert_eq!(position_affinity(Position::ST, Position::GK), 0.2);
        assert_eq!(position_affinity(Position::GK, Position::ST), 0.2);
    }
}
