//! The owned simulation aggregate.
//!
//! All core state lives in one `World` passed explicitly into every function;
//! there is no ambient global. Hosts that want speculative simulations clone
//! the whole aggregate and run the copies independently.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::models::{Player, PlayerId, Team};
use crate::schedule::Round;
use crate::sim::EventQueue;

/// Key under which the active season's schedule and transactions are kept.
pub const ACTIVE_SEASON_KEY: &str = "now";

/// Archive key for a completed season, e.g. "2024-2025".
pub fn archive_key(start_year: i32, end_year: i32) -> String {
    format!("{start_year}-{end_year}")
}

pub fn at_midnight(date: NaiveDate) -> NaiveDateTime {
    NaiveDateTime::new(date, NaiveTime::MIN)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Trade,
    Signing,
    Draft,
    Retirement,
    ContractExpiry,
}

/// One roster movement, kept per season for the records screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub team: String,
    pub players: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// The virtual calendar position.
    pub now: NaiveDateTime,

    pub season_start: NaiveDate,
    pub season_end: NaiveDate,

    /// Set once the next season-start event has been enqueued; drives the
    /// signings cadence in the run-up to a season.
    pub next_season_start: Option<NaiveDate>,

    pub teams: Vec<Team>,
    pub free_agents: Vec<Player>,

    pub events: EventQueue,

    pub trade_window_open: bool,
    pub signing_window_open: bool,

    /// Active schedule under [`ACTIVE_SEASON_KEY`], archived seasons under
    /// their `{startYear}-{endYear}` key. The core populates this keying
    /// scheme but owns no storage mechanics.
    pub schedules: HashMap<String, Vec<Round>>,
    pub transactions: HashMap<String, Vec<Transaction>>,

    next_player_id: PlayerId,

    #[serde(skip, default = "default_rng")]
    pub rng: ChaCha8Rng,
}

fn default_rng() -> ChaCha8Rng {
    ChaCha8Rng::from_entropy()
}

impl World {
    /// A fresh world with the opening season-start event already enqueued.
    pub fn new(teams: Vec<Team>, season_start: NaiveDate, seed: u64) -> Self {
        let mut events = EventQueue::new();
        events.push(crate::sim::GameEvent::new(
            at_midnight(season_start),
            crate::sim::EventKind::SeasonStart,
        ));
        World {
            now: at_midnight(season_start),
            season_start,
            season_end: season_start,
            next_season_start: None,
            teams,
            free_agents: Vec::new(),
            events,
            trade_window_open: false,
            signing_window_open: false,
            schedules: HashMap::new(),
            transactions: HashMap::new(),
            next_player_id: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn alloc_player_id(&mut self) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        id
    }

    /// Reserve the id space below `floor` for externally created players.
    pub fn bump_player_id(&mut self, floor: PlayerId) {
        if self.next_player_id < floor {
            self.next_player_id = floor;
        }
    }

    pub fn team_names(&self) -> Vec<String> {
        self.teams.iter().map(|t| t.name.clone()).collect()
    }

    pub fn active_schedule(&self) -> Option<&Vec<Round>> {
        self.schedules.get(ACTIVE_SEASON_KEY)
    }

    pub fn active_schedule_mut(&mut self) -> Option<&mut Vec<Round>> {
        self.schedules.get_mut(ACTIVE_SEASON_KEY)
    }

    pub fn install_schedule(&mut self, rounds: Vec<Round>) {
        self.schedules.insert(ACTIVE_SEASON_KEY.to_string(), rounds);
        self.transactions.entry(ACTIVE_SEASON_KEY.to_string()).or_default();
    }

    pub fn log_transaction(&mut self, transaction: Transaction) {
        self.transactions
            .entry(ACTIVE_SEASON_KEY.to_string())
            .or_default()
            .push(transaction);
    }

    /// Move the active schedule and transaction log to the season's archive
    /// key. A season with nothing active archives nothing.
    pub fn archive_season(&mut self) {
        let key = archive_key(self.season_start.year(), self.season_end.year());
        if let Some(rounds) = self.schedules.remove(ACTIVE_SEASON_KEY) {
            self.schedules.insert(key.clone(), rounds);
        }
        if let Some(log) = self.transactions.remove(ACTIVE_SEASON_KEY) {
            self.transactions.insert(key, log);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contract, Position};

    fn world() -> World {
        let teams = vec![Team::new("A"), Team::new("B")];
        World::new(teams, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(), 1)
    }

    #[test]
    fn new_world_enqueues_the_opening_season_start() {
        let world = world();
        assert_eq!(world.events.len(), 1);
        assert_eq!(world.events.peek().unwrap().kind, crate::sim::EventKind::SeasonStart);
    }

    #[test]
    fn archive_moves_active_entries_to_the_year_key() {
        let mut world = world();
        world.install_schedule(Vec::new());
        world.log_transaction(Transaction {
            date: world.season_start,
            kind: TransactionKind::Signing,
            team: "A".to_string(),
            players: vec!["Someone".to_string()],
        });
        world.season_end = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        world.archive_season();

        assert!(world.active_schedule().is_none());
        assert!(world.schedules.contains_key("2024-2025"));
        assert_eq!(world.transactions["2024-2025"].len(), 1);
    }

    #[test]
    fn player_ids_are_unique_and_monotonic() {
        let mut world = world();
        let a = world.alloc_player_id();
        let b = world.alloc_player_id();
        assert!(b > a);
        world.bump_player_id(1000);
        assert_eq!(world.alloc_player_id(), 1000);
    }

    #[test]
    fn snapshot_round_trips_without_the_rng() {
        let mut world = world();
        world.teams[0].sign(Player {
            id: 7,
            name: "Keeper".to_string(),
            position: Position::GK,
            score: 61.0,
            age: 27,
            contract: Contract { salary: 400_000, seasons_left: 3 },
        });
        let json = serde_json::to_string(&world).unwrap();
        let back: World = serde_json::from_str(&json).unwrap();
        assert_eq!(back.teams[0].players[0].name, "Keeper");
        assert_eq!(back.now, world.now);
        assert_eq!(back.events, world.events);
    }
}
