//! The discrete-event simulation clock: typed game events, the sorted event
//! queue, the per-tick processor and the budgeted driver.

pub mod driver;
pub mod scheduler;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Closed enumeration of everything that can happen on the calendar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SeasonStart,
    SeasonEnd,
    SimulateRound,
    SkillUpdate,
    ContractUpdate,
    Signings,
    Draft,
    Trade,
    OpenTradeWindow,
    CloseTradeWindow,
    OpenSigningWindow,
    CloseSigningWindow,
    Retiring,
    FinanceUpdate,
}

/// Type-specific payload. Only round simulation carries one today, but the
/// wire shape keeps the slot open per kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventDetail {
    Round { index: usize },
}

/// Immutable once enqueued; consumed exactly once by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameEvent {
    pub date: NaiveDateTime,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<EventDetail>,
}

impl GameEvent {
    pub fn new(date: NaiveDateTime, kind: EventKind) -> Self {
        GameEvent { date, kind, detail: None }
    }

    pub fn round(date: NaiveDateTime, index: usize) -> Self {
        GameEvent {
            date,
            kind: EventKind::SimulateRound,
            detail: Some(EventDetail::Round { index }),
        }
    }

    pub fn round_index(&self) -> Option<usize> {
        match self.detail {
            Some(EventDetail::Round { index }) => Some(index),
            None => None,
        }
    }
}

/// The ordered backlog of future events. Always sorted ascending by date;
/// insertion goes before the first strictly later event, so same-date events
/// dispatch in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        let at = self
            .events
            .iter()
            .position(|e| e.date > event.date)
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
    }

    /// Earliest event if it is due at `now`.
    pub fn pop_due(&mut self, now: NaiveDateTime) -> Option<GameEvent> {
        if self.events.first()?.date <= now {
            Some(self.events.remove(0))
        } else {
            None
        }
    }

    pub fn peek(&self) -> Option<&GameEvent> {
        self.events.first()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn contains_kind(&self, kind: EventKind) -> bool {
        self.events.iter().any(|e| e.kind == kind)
    }
}
