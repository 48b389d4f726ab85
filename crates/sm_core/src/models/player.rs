use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rules::Money;

pub type PlayerId = u32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,

    /// Overall skill, 0.0..=100.0. Drifts once per season.
    pub score: f32,

    pub age: u8,
    pub contract: Contract,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    pub salary: Money,
    pub seasons_left: u8,
}

impl Player {
    /// Seasonal skill drift: young players trend upward, veterans decline.
    pub fn drift_skill(&mut self, rng: &mut impl Rng) {
        let trend = match self.age {
            0..=23 => 1.5,
            24..=29 => 0.0,
            _ => -2.0,
        };
        let noise: f32 = rng.gen_range(-2.5..=2.5);
        self.score = (self.score + trend + noise).clamp(1.0, 100.0);
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    GK,
    LB,
    CB,
    RB,
    LWB,
    RWB,
    CDM,
    CM,
    CAM,
    LM,
    RM,
    LW,
    RW,
    CF,
    ST,
}

/// Broad pitch line a position belongs to. Used for out-of-position scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Goal,
    Defence,
    Midfield,
    Attack,
}

impl Position {
    pub fn is_goalkeeper(&self) -> bool {
        matches!(self, Position::GK)
    }

    pub fn is_defender(&self) -> bool {
        matches!(
            self,
            Position::LB | Position::CB | Position::RB | Position::LWB | Position::RWB
        )
    }

    pub fn is_midfielder(&self) -> bool {
        matches!(
            self,
            Position::CDM | Position::CM | Position::CAM | Position::LM | Position::RM
        )
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Position::LW | Position::RW | Position::CF | Position::ST)
    }

    pub fn line(&self) -> Line {
        if self.is_goalkeeper() {
            Line::Goal
        } else if self.is_defender() {
            Line::Defence
        } else if self.is_midfielder() {
            Line::Midfield
        } else {
            Line::Attack
        }
    }

    /// Canonical short code (e.g. "CB").
    pub fn code(&self) -> &'static str {
        match self {
            Position::GK => "GK",
            Position::LB => "LB",
            Position::CB => "CB",
            Position::RB => "RB",
            Position::LWB => "LWB",
            Position::RWB => "RWB",
            Position::CDM => "CDM",
            Position::CM => "CM",
            Position::CAM => "CAM",
            Position::LM => "LM",
            Position::RM => "RM",
            Position::LW => "LW",
            Position::RW => "RW",
            Position::CF => "CF",
            Position::ST => "ST",
        }
    }

    pub fn all() -> &'static [Position] {
        &[
            Position::GK,
            Position::LB,
            Position::CB,
            Position::RB,
            Position::LWB,
            Position::RWB,
            Position::CDM,
            Position::CM,
            Position::CAM,
            Position::LM,
            Position::RM,
            Position::LW,
            Position::RW,
            Position::CF,
            Position::ST,
        ]
    }
}

impl Line {
    /// Distance between pitch lines, 0..=3.
    pub fn distance(&self, other: Line) -> u8 {
        let rank = |l: Line| match l {
            Line::Goal => 0u8,
            Line::Defence => 1,
            Line::Midfield => 2,
            Line::Attack => 3,
        };
        rank(*self).abs_diff(rank(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn player(position: Position, score: f32, age: u8) -> Player {
        Player {
            id: 1,
            name: "Test Player".to_string(),
            position,
            score,
            age,
            contract: Contract { salary: 100_000, seasons_left: 2 },
        }
    }

    #[test]
    fn position_lines_partition_the_enum() {
        for p in Position::all() {
            let flags = [p.is_goalkeeper(), p.is_defender(), p.is_midfielder(), p.is_forward()];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{:?}", p);
        }
    }

    #[test]
    fn position_serde_uses_uppercase_codes() {
        let json = serde_json::to_string(&Position::CDM).unwrap();
        assert_eq!(json, "\"CDM\"");
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Position::CDM);
    }

    #[test]
    fn skill_drift_stays_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut veteran = player(Position::CB, 99.5, 36);
        let mut rookie = player(Position::ST, 1.2, 18);
        for _ in 0..50 {
            veteran.drift_skill(&mut rng);
            rookie.drift_skill(&mut rng);
            assert!((1.0..=100.0).contains(&veteran.score));
            assert!((1.0..=100.0).contains(&rookie.score));
        }
    }

    #[test]
    fn line_distance_is_symmetric() {
        assert_eq!(Line::Goal.distance(Line::Attack), 3);
        assert_eq!(Line::Attack.distance(Line::Goal), 3);
        assert_eq!(Line::Defence.distance(Line::Midfield), 1);
        assert_eq!(Line::Midfield.distance(Line::Midfield), 0);
    }
}
