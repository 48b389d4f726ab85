//! # sm_core - Season-Management Simulation Core
//!
//! The rules engine of a season-based sports-management game: a discrete-event
//! simulation clock plus satellite engines for season fixture generation,
//! lineup/formation assignment, and trade negotiation. The presentation layer
//! renders state and forwards user intents; everything here operates on one
//! explicitly owned `World` aggregate.
//!
//! ## Layout
//! - `sim` - event queue, clock, handlers, budgeted driver
//! - `schedule` - double round-robin fixture generation
//! - `lineup` - formation catalog, assignment heuristic, async boundary
//! - `trade` - appeal scoring and bounded offer search
//! - `state` - the `World` aggregate and season archives

pub mod demo;
pub mod error;
pub mod lineup;
pub mod models;
pub mod rules;
pub mod schedule;
pub mod sim;
pub mod state;
pub mod trade;

pub use error::{CoreError, Result};

pub use models::{Contract, Player, PlayerId, Position, Team};

pub use schedule::{generate_schedule, Match, Round, Score};

pub use lineup::assigner::{best_formation, fill_formation, Lineup};
pub use lineup::service::{
    resolve_batch, LineupRequest, LineupRequestKind, LineupResponse, LineupService,
};
pub use lineup::{formation, Formation, FormationSpot};

pub use trade::{acceptable, appeal, commit_trade, negotiate, TradeOffer, TradeSide};

pub use sim::driver::{Driver, RunHandle, SliceOutcome, StopCondition};
pub use sim::scheduler::process;
pub use sim::{EventDetail, EventKind, EventQueue, GameEvent};

pub use state::{archive_key, Transaction, TransactionKind, World, ACTIVE_SEASON_KEY};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
