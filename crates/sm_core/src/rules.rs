//! League Rule Constants
//!
//! Centralized balance values for roster limits, finances and the seasonal
//! calendar. Adjust these values to tune league behavior.

use chrono::Duration;

pub type Money = u32;

/// Fewest players a team may roster. A team below this limit must sign.
pub const MIN_TEAM_SIZE: usize = 16;

/// Most players a team may roster.
pub const MAX_TEAM_SIZE: usize = 24;

/// Hard payroll ceiling per team. A trade that reduces an already-over-cap
/// payroll is allowed even when the result is still over the cap.
pub const SALARY_CAP: Money = 90_000_000;

/// Players fielded in a lineup (one per formation spot).
pub const LINEUP_SIZE: usize = 11;

/// Divisor of the exponential appeal curve: every `APPEAL_STEP` points of
/// skill above the population mean doubles a player's trade appeal.
pub const APPEAL_STEP: f32 = 6.0;

/// Appeal tolerance for an exchange: the received side must rate within 10%
/// of the target the giving side wants back.
pub const APPEAL_TOLERANCE: f32 = 0.10;

/// Extra weight the single best player of an offered set carries on top of
/// the plain appeal sum.
pub const STAR_PLAYER_WEIGHT: f32 = 0.5;

/// Largest candidate pool the trade search will explore per roster.
pub const TRADE_POOL_CAP: usize = 20;

/// Most players moved in one direction by a single trade.
pub const TRADE_MAX_PLAYERS: usize = 3;

/// Age at which retirement becomes possible at season end.
pub const RETIREMENT_AGE: u8 = 33;

/// Rookies generated per team for the annual draft.
pub const DRAFT_ROOKIES_PER_TEAM: usize = 2;

/// Simulated time added per clock tick.
pub fn clock_tick() -> Duration {
    Duration::hours(12)
}

/// Most simulated time one `process` invocation may advance the clock.
pub fn clock_ceiling() -> Duration {
    Duration::hours(24)
}

/// Offsets of the seasonal chain, in days relative to the season-end date.
/// An offset event whose computed date is already past is silently skipped.
pub mod offsets {
    pub const CLOSE_SIGNING_WINDOW: i64 = -90;
    pub const RETIRING: i64 = 1;
    pub const CONTRACT_UPDATE: i64 = 2;
    pub const DRAFT: i64 = 7;
    pub const OPEN_TRADE_WINDOW: i64 = 14;
    pub const OPEN_SIGNING_WINDOW: i64 = 21;

    /// Days the trade window stays open once opened.
    pub const TRADE_WINDOW_LENGTH: i64 = 30;
}
