use serde::{Deserialize, Serialize};

use super::{Player, PlayerId};
use crate::rules::{Money, MAX_TEAM_SIZE, MIN_TEAM_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub players: Vec<Player>,

    /// Key into the formation catalog, set once a lineup has been assigned.
    pub formation_key: Option<String>,

    pub cash: i64,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Team { name: name.into(), players: Vec::new(), formation_key: None, cash: 0 }
    }

    pub fn payroll(&self) -> Money {
        self.players.iter().map(|p| p.contract.salary).sum()
    }

    /// A team below the roster floor must pursue free agents.
    pub fn is_short_handed(&self) -> bool {
        self.players.len() < MIN_TEAM_SIZE
    }

    pub fn has_roster_space(&self) -> bool {
        self.players.len() < MAX_TEAM_SIZE
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Remove a player from the roster, returning them for reassignment.
    pub fn release(&mut self, id: PlayerId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(idx))
    }

    pub fn sign(&mut self, player: Player) {
        self.players.push(player);
    }

    /// Mean roster skill; 0.0 for an empty roster.
    pub fn average_score(&self) -> f32 {
        if self.players.is_empty() {
            return 0.0;
        }
        self.players.iter().map(|p| p.score).sum::<f32>() / self.players.len() as f32
    }
}
