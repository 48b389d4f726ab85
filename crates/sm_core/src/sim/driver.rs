//! Budgeted simulation driver.
//!
//! The clock itself is synchronous, but a multi-season run must never freeze
//! the hosting application: each `run_slice` works until a wall-clock budget
//! expires, then hands control back so the host can resume on its next
//! scheduling opportunity (a timer, a task queue, or a plain loop in a test
//! harness). Cancellation is cooperative and generation-guarded: starting a
//! new run invalidates every handle from earlier runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration as WallDuration, Instant};

use chrono::{Duration, NaiveDateTime};

use super::scheduler;
use super::EventKind;
use crate::error::Result;
use crate::state::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Stop once the next pending event is of this kind (before dispatching
    /// it).
    NextEvent(EventKind),
    /// Stop once the virtual clock has advanced this far since the run
    /// began.
    Elapsed(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// The scheduler asked to pause: empty queue or an attention event.
    Paused,
    /// The wall-clock budget ran out; call `run_slice` again to resume.
    BudgetExhausted,
    /// The stop condition was met.
    ConditionMet,
    /// The run's handle requested a stop.
    Stopped,
}

pub struct Driver {
    active_run: Arc<AtomicU64>,
    run_id: u64,
    stop_flag: Arc<AtomicBool>,
    run_started: Option<NaiveDateTime>,
}

/// Cancellation handle for one run. Stale handles (from runs superseded by a
/// newer `begin_run`) are inert.
pub struct RunHandle {
    active_run: Arc<AtomicU64>,
    run_id: u64,
    stop_flag: Arc<AtomicBool>,
}

impl RunHandle {
    pub fn stop(&self) {
        if self.active_run.load(Ordering::SeqCst) == self.run_id {
            self.stop_flag.store(true, Ordering::SeqCst);
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Self {
        Driver {
            active_run: Arc::new(AtomicU64::new(0)),
            run_id: 0,
            stop_flag: Arc::new(AtomicBool::new(false)),
            run_started: None,
        }
    }

    /// Start a fresh run and hand out its cancellation handle. Any handle
    /// from a previous run loses its effect here.
    pub fn begin_run(&mut self) -> RunHandle {
        self.run_id += 1;
        self.active_run.store(self.run_id, Ordering::SeqCst);
        self.stop_flag = Arc::new(AtomicBool::new(false));
        self.run_started = None;
        RunHandle {
            active_run: self.active_run.clone(),
            run_id: self.run_id,
            stop_flag: self.stop_flag.clone(),
        }
    }

    /// Process events until the scheduler pauses, the stop condition or a
    /// stop request fires, or the wall-clock budget runs out. `on_tick` sees
    /// the world after every processed loop; the caller's "end" handling
    /// keys off the returned outcome.
    ///
    /// With an `Elapsed` bound the virtual clock never overshoots by more
    /// than one `process` ceiling.
    pub fn run_slice(
        &mut self,
        world: &mut World,
        budget: WallDuration,
        condition: Option<StopCondition>,
        mut on_tick: impl FnMut(&World),
    ) -> Result<SliceOutcome> {
        let slice_started = Instant::now();
        let run_started = *self.run_started.get_or_insert(world.now);

        loop {
            if self.stop_flag.load(Ordering::SeqCst) {
                return Ok(SliceOutcome::Stopped);
            }
            match condition {
                Some(StopCondition::NextEvent(kind)) => {
                    if world.events.peek().map(|e| e.kind) == Some(kind) {
                        return Ok(SliceOutcome::ConditionMet);
                    }
                }
                Some(StopCondition::Elapsed(duration)) => {
                    if world.now - run_started >= duration {
                        return Ok(SliceOutcome::ConditionMet);
                    }
                }
                None => {}
            }

            let pause = scheduler::process(world)?;
            on_tick(world);
            if pause {
                return Ok(SliceOutcome::Paused);
            }
            if slice_started.elapsed() >= budget {
                return Ok(SliceOutcome::BudgetExhausted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_world;
    use crate::rules::clock_ceiling;
    use chrono::NaiveDate;

    fn world() -> World {
        demo_world(4, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(), 9)
    }

    fn drive(
        driver: &mut Driver,
        world: &mut World,
        condition: Option<StopCondition>,
    ) -> SliceOutcome {
        loop {
            let outcome = driver
                .run_slice(world, WallDuration::from_millis(5), condition, |_| {})
                .unwrap();
            match outcome {
                SliceOutcome::BudgetExhausted | SliceOutcome::Paused => continue,
                other => return other,
            }
        }
    }

    #[test]
    fn elapsed_bound_never_overshoots_past_the_ceiling() {
        let mut world = world();
        let mut driver = Driver::new();
        let _handle = driver.begin_run();
        let begun = world.now;
        let bound = Duration::days(30);

        let outcome = drive(&mut driver, &mut world, Some(StopCondition::Elapsed(bound)));
        assert_eq!(outcome, SliceOutcome::ConditionMet);
        assert!(world.now - begun >= bound);
        assert!(world.now - begun <= bound + clock_ceiling());
    }

    #[test]
    fn next_event_condition_stops_before_dispatch() {
        let mut world = world();
        let mut driver = Driver::new();
        let _handle = driver.begin_run();

        let outcome = drive(
            &mut driver,
            &mut world,
            Some(StopCondition::NextEvent(EventKind::SeasonEnd)),
        );
        assert_eq!(outcome, SliceOutcome::ConditionMet);
        assert_eq!(world.events.peek().unwrap().kind, EventKind::SeasonEnd);
    }

    #[test]
    fn tick_callback_observes_every_loop() {
        let mut world = world();
        let mut driver = Driver::new();
        let _handle = driver.begin_run();
        let mut ticks = 0usize;
        let outcome = driver
            .run_slice(
                &mut world,
                WallDuration::from_secs(5),
                Some(StopCondition::Elapsed(Duration::days(3))),
                |_| ticks += 1,
            )
            .unwrap();
        assert_eq!(outcome, SliceOutcome::ConditionMet);
        assert!(ticks >= 3);
    }

    #[test]
    fn stop_request_ends_the_run() {
        let mut world = world();
        let mut driver = Driver::new();
        let handle = driver.begin_run();
        handle.stop();
        let outcome = driver
            .run_slice(&mut world, WallDuration::from_secs(1), None, |_| {})
            .unwrap();
        assert_eq!(outcome, SliceOutcome::Stopped);
    }

    #[test]
    fn stale_handle_cannot_cancel_a_newer_run() {
        let mut world = world();
        let mut driver = Driver::new();
        let stale = driver.begin_run();
        let _fresh = driver.begin_run();
        stale.stop();

        let outcome = driver
            .run_slice(
                &mut world,
                WallDuration::from_secs(5),
                Some(StopCondition::Elapsed(Duration::days(2))),
                |_| {},
            )
            .unwrap();
        assert_eq!(outcome, SliceOutcome::ConditionMet);
    }

    #[test]
    fn multi_season_run_keeps_archiving() {
        let mut world = world();
        let mut driver = Driver::new();
        let _handle = driver.begin_run();
        let outcome = drive(
            &mut driver,
            &mut world,
            Some(StopCondition::Elapsed(Duration::days(800))),
        );
        assert_eq!(outcome, SliceOutcome::ConditionMet);
        // Two season ends fit in 800 days; both seasons were archived.
        assert!(world.schedules.keys().filter(|k| k.contains('-')).count() >= 2);
    }
}
