//! The simulation clock and its event handlers.
//!
//! `process` advances the virtual calendar in 12-hour increments, up to a
//! 24-hour ceiling per invocation, and dispatches at most one due event.
//! Each event kind maps to exactly one handler; handlers mutate the passed
//! world, enqueue follow-up events, and report whether the host should pause
//! for user attention. All retry policy lives here as re-enqueued events,
//! never inside the satellite engines.

use chrono::{Duration, Months, NaiveDate};
use log::{debug, info};
use rand::Rng;

use super::{EventKind, GameEvent};
use crate::error::{CoreError, Result};
use crate::models::{Contract, Player, PlayerId, Position};
use crate::rules::{
    clock_ceiling, clock_tick, offsets, DRAFT_ROOKIES_PER_TEAM, RETIREMENT_AGE, SALARY_CAP,
};
use crate::schedule::{self, Score};
use crate::state::{at_midnight, Transaction, TransactionKind, World, ACTIVE_SEASON_KEY};
use crate::trade;

/// Days past the nominal start date after which schedule generation is
/// refused. Hitting this is a caller bug, not a runtime condition.
const SCHEDULE_CUTOFF_DAYS: i64 = 7;

/// Advance the clock and dispatch at most one due event. Returns true when
/// the simulation should pause: the queue is empty, or the dispatched event
/// demands user attention.
pub fn process(world: &mut World) -> Result<bool> {
    let mut advanced = Duration::zero();
    loop {
        if world.events.is_empty() {
            return Ok(true);
        }
        if let Some(event) = world.events.pop_due(world.now) {
            debug!("dispatching {:?} on {}", event.kind, event.date.date());
            return dispatch(world, event);
        }
        if advanced >= clock_ceiling() {
            return Ok(false);
        }
        world.now += clock_tick();
        advanced = advanced + clock_tick();
    }
}

fn dispatch(world: &mut World, event: GameEvent) -> Result<bool> {
    match event.kind {
        EventKind::SeasonStart => handle_season_start(world, &event),
        EventKind::SeasonEnd => handle_season_end(world),
        EventKind::SimulateRound => handle_simulate_round(world, &event),
        EventKind::SkillUpdate => handle_skill_update(world),
        EventKind::ContractUpdate => handle_contract_update(world),
        EventKind::Signings => handle_signings(world),
        EventKind::Draft => handle_draft(world),
        EventKind::Trade => handle_trade(world),
        EventKind::OpenTradeWindow => handle_open_trade_window(world),
        EventKind::CloseTradeWindow => {
            world.trade_window_open = false;
            Ok(false)
        }
        EventKind::OpenSigningWindow => handle_open_signing_window(world),
        EventKind::CloseSigningWindow => {
            world.signing_window_open = false;
            Ok(false)
        }
        EventKind::Retiring => handle_retiring(world),
        EventKind::FinanceUpdate => handle_finance_update(world),
    }
}

/// Install a fresh season: generate fixtures, reset the trade window, and lay
/// out the whole seasonal chain of follow-up events.
fn handle_season_start(world: &mut World, event: &GameEvent) -> Result<bool> {
    let start = event.date.date();
    if world.now.date() > start + Duration::days(SCHEDULE_CUTOFF_DAYS) {
        return Err(CoreError::InvalidParameter(format!(
            "season schedule requested on {} but the cutoff was {}",
            world.now.date(),
            start + Duration::days(SCHEDULE_CUTOFF_DAYS)
        )));
    }

    world.season_start = start;
    world.trade_window_open = false;
    world.next_season_start = None;

    let names = world.team_names();
    let first_round_date = start + Duration::weeks(1);
    let rounds = schedule::generate_schedule(&names, first_round_date, &mut world.rng)?;
    let season_end = rounds.last().map(|r| r.date).unwrap_or(start) + Duration::weeks(1);
    world.season_end = season_end;

    if let Some(first) = rounds.first() {
        world.events.push(GameEvent::round(at_midnight(first.date), 0));
    }
    world.install_schedule(rounds);
    world.events.push(GameEvent::new(at_midnight(season_end), EventKind::SeasonEnd));
    world
        .events
        .push(GameEvent::new(at_midnight(first_round_date), EventKind::FinanceUpdate));

    let chain = [
        (EventKind::CloseSigningWindow, offsets::CLOSE_SIGNING_WINDOW),
        (EventKind::Retiring, offsets::RETIRING),
        (EventKind::ContractUpdate, offsets::CONTRACT_UPDATE),
        (EventKind::Draft, offsets::DRAFT),
        (EventKind::OpenTradeWindow, offsets::OPEN_TRADE_WINDOW),
        (EventKind::OpenSigningWindow, offsets::OPEN_SIGNING_WINDOW),
    ];
    for (kind, offset) in chain {
        let date = at_midnight(season_end + Duration::days(offset));
        if date > world.now {
            world.events.push(GameEvent::new(date, kind));
        } else {
            debug!("skipping {:?}: its date {} is already past", kind, date.date());
        }
    }

    info!(
        "season {} started: {} rounds, ends {}",
        start.format("%Y"),
        world.active_schedule().map(|r| r.len()).unwrap_or(0),
        season_end
    );
    Ok(false)
}

fn handle_season_end(world: &mut World) -> Result<bool> {
    world.archive_season();
    world.events.push(GameEvent::new(world.now + Duration::days(1), EventKind::SkillUpdate));

    // The model never halts itself: season end always re-enqueues the next
    // season start.
    let next_start = world.season_start + Months::new(12);
    world.events.push(GameEvent::new(at_midnight(next_start), EventKind::SeasonStart));
    world.next_season_start = Some(next_start);
    info!("season ended; next season starts {next_start}");
    Ok(false)
}

/// Placeholder result simulation: uniform random scores. A match that
/// already has a result keeps it; later seasons create new match entities.
fn handle_simulate_round(world: &mut World, event: &GameEvent) -> Result<bool> {
    let index = match event.round_index() {
        Some(index) => index,
        None => return Ok(false),
    };
    let rng = &mut world.rng;
    let mut next_round: Option<(NaiveDate, usize)> = None;
    match world.schedules.get_mut(ACTIVE_SEASON_KEY) {
        Some(rounds) => {
            let round = match rounds.get_mut(index) {
                Some(round) => round,
                None => return Ok(false),
            };
            for m in &mut round.matches {
                if m.result.is_none() {
                    m.result = Some(Score {
                        home: rng.gen_range(0..=4),
                        away: rng.gen_range(0..=4),
                    });
                }
            }
            if let Some(round) = rounds.get(index + 1) {
                next_round = Some((round.date, index + 1));
            }
        }
        None => return Ok(false),
    }
    if let Some((date, i)) = next_round {
        world.events.push(GameEvent::round(at_midnight(date), i));
    }
    info!("round {index} simulated");
    Ok(true)
}

fn handle_skill_update(world: &mut World) -> Result<bool> {
    let rng = &mut world.rng;
    for team in &mut world.teams {
        for player in &mut team.players {
            player.drift_skill(rng);
        }
    }
    for player in &mut world.free_agents {
        player.drift_skill(rng);
    }
    Ok(false)
}

/// Tick every contract down one season. Above-average players renew; the
/// rest hit free agency.
fn handle_contract_update(world: &mut World) -> Result<bool> {
    let today = world.now.date();
    let mut released: Vec<(String, Player)> = Vec::new();
    for team in &mut world.teams {
        let avg = team.average_score();
        for player in &mut team.players {
            player.contract.seasons_left = player.contract.seasons_left.saturating_sub(1);
        }
        let expiring: Vec<PlayerId> = team
            .players
            .iter()
            .filter(|p| p.contract.seasons_left == 0)
            .map(|p| p.id)
            .collect();
        for id in expiring {
            let renew = team.player(id).map_or(false, |p| p.score >= avg);
            if renew {
                if let Some(player) = team.players.iter_mut().find(|p| p.id == id) {
                    player.contract.seasons_left = 2;
                }
            } else if let Some(player) = team.release(id) {
                released.push((team.name.clone(), player));
            }
        }
    }
    for (team, player) in released {
        world.log_transaction(Transaction {
            date: today,
            kind: TransactionKind::ContractExpiry,
            team,
            players: vec![player.name.clone()],
        });
        world.free_agents.push(player);
    }
    Ok(false)
}

/// While the signing window is open, each short-handed team attempts one
/// free-agent signing, then the event re-enqueues itself: daily in the
/// run-up to a season, weekly otherwise. A closed window ends the cycle.
fn handle_signings(world: &mut World) -> Result<bool> {
    if !world.signing_window_open {
        return Ok(false);
    }
    let today = world.now.date();
    let mut signings: Vec<(String, String)> = Vec::new();
    for i in 0..world.teams.len() {
        if !world.teams[i].is_short_handed() || world.free_agents.is_empty() {
            continue;
        }
        let payroll = world.teams[i].payroll() as i64;
        let mut best: Option<(usize, f32)> = None;
        for (j, agent) in world.free_agents.iter().enumerate() {
            if payroll + agent.contract.salary as i64 > SALARY_CAP as i64 {
                continue;
            }
            if best.map_or(true, |(_, s)| agent.score > s) {
                best = Some((j, agent.score));
            }
        }
        if let Some((j, _)) = best {
            let mut player = world.free_agents.remove(j);
            player.contract.seasons_left = 2;
            let player_name = player.name.clone();
            let team_name = world.teams[i].name.clone();
            world.teams[i].sign(player);
            signings.push((team_name, player_name));
        }
    }
    for (team, player) in signings {
        info!("{team} signed {player}");
        world.log_transaction(Transaction {
            date: today,
            kind: TransactionKind::Signing,
            team,
            players: vec![player],
        });
    }

    let season_soon = world
        .next_season_start
        .map_or(false, |d| at_midnight(d) - world.now <= Duration::weeks(1));
    let delay = if season_soon { Duration::days(1) } else { Duration::weeks(1) };
    world.events.push(GameEvent::new(world.now + delay, EventKind::Signings));
    Ok(false)
}

/// Annual rookie draft: the weakest teams pick first, round by round, until
/// the rookie pool or the roster space runs out. Leftovers hit free agency.
fn handle_draft(world: &mut World) -> Result<bool> {
    let today = world.now.date();
    let rookie_count = world.teams.len() * DRAFT_ROOKIES_PER_TEAM;
    let mut pool: Vec<Player> = Vec::with_capacity(rookie_count);
    for _ in 0..rookie_count {
        let id = world.alloc_player_id();
        let positions = Position::all();
        let position = positions[world.rng.gen_range(0..positions.len())];
        let score = world.rng.gen_range(30.0..65.0);
        let age = world.rng.gen_range(18..=21);
        pool.push(Player {
            id,
            name: format!("Prospect {id}"),
            position,
            score,
            age,
            contract: Contract { salary: 250_000, seasons_left: 3 },
        });
    }
    pool.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut order: Vec<usize> = (0..world.teams.len()).collect();
    order.sort_by(|&a, &b| {
        world.teams[a].average_score().total_cmp(&world.teams[b].average_score())
    });

    let mut picks: Vec<(String, String)> = Vec::new();
    loop {
        let mut picked_any = false;
        for &i in &order {
            if pool.is_empty() {
                break;
            }
            if !world.teams[i].has_roster_space() {
                continue;
            }
            let player = pool.remove(0);
            picks.push((world.teams[i].name.clone(), player.name.clone()));
            world.teams[i].sign(player);
            picked_any = true;
        }
        if pool.is_empty() || !picked_any {
            break;
        }
    }
    world.free_agents.extend(pool);

    for (team, player) in picks {
        world.log_transaction(Transaction {
            date: today,
            kind: TransactionKind::Draft,
            team,
            players: vec![player],
        });
    }
    Ok(true)
}

/// While the trade window is open, every ordered pair of teams gets one
/// negotiation, then the event re-enqueues itself for tomorrow.
fn handle_trade(world: &mut World) -> Result<bool> {
    if !world.trade_window_open {
        return Ok(false);
    }
    let today = world.now.date();
    let team_count = world.teams.len();
    for a in 0..team_count {
        for b in 0..team_count {
            if a == b {
                continue;
            }
            let committed = trade::negotiate(&mut world.teams, a, b, &mut world.rng)?;
            if let Some(offer) = committed {
                // After the commit, each side's outgoing players sit on the
                // partner's roster.
                let sides = [(&offer.give, &offer.get.team), (&offer.get, &offer.give.team)];
                for (side, new_home) in sides {
                    let names: Vec<String> = world
                        .teams
                        .iter()
                        .find(|t| &t.name == new_home)
                        .map(|t| {
                            side.players
                                .iter()
                                .filter_map(|id| t.player(*id).map(|p| p.name.clone()))
                                .collect()
                        })
                        .unwrap_or_default();
                    world.log_transaction(Transaction {
                        date: today,
                        kind: TransactionKind::Trade,
                        team: side.team.clone(),
                        players: names,
                    });
                }
            }
        }
    }
    world.events.push(GameEvent::new(world.now + Duration::days(1), EventKind::Trade));
    Ok(false)
}

fn handle_open_trade_window(world: &mut World) -> Result<bool> {
    world.trade_window_open = true;
    world.events.push(GameEvent::new(
        world.now + Duration::days(offsets::TRADE_WINDOW_LENGTH),
        EventKind::CloseTradeWindow,
    ));
    world.events.push(GameEvent::new(world.now + Duration::days(1), EventKind::Trade));
    Ok(false)
}

fn handle_open_signing_window(world: &mut World) -> Result<bool> {
    world.signing_window_open = true;
    world.events.push(GameEvent::new(world.now + Duration::days(1), EventKind::Signings));
    Ok(false)
}

/// Everyone ages a year; veterans roll for retirement.
fn handle_retiring(world: &mut World) -> Result<bool> {
    let today = world.now.date();
    let mut retired: Vec<(String, String)> = Vec::new();
    {
        let rng = &mut world.rng;
        for team in &mut world.teams {
            for player in &mut team.players {
                player.age += 1;
            }
            let mut leaving: Vec<PlayerId> = Vec::new();
            for player in &team.players {
                if player.age >= RETIREMENT_AGE {
                    let chance =
                        (((player.age - RETIREMENT_AGE) as f64 + 1.0) * 0.25).min(1.0);
                    if rng.gen_bool(chance) {
                        leaving.push(player.id);
                    }
                }
            }
            for id in leaving {
                if let Some(player) = team.release(id) {
                    retired.push((team.name.clone(), player.name));
                }
            }
        }
        for player in &mut world.free_agents {
            player.age += 1;
        }
        // Unsigned veterans quietly leave the pool.
        world.free_agents.retain(|p| p.age < RETIREMENT_AGE + 3);
    }
    for (team, player) in retired {
        info!("{player} ({team}) retired");
        world.log_transaction(Transaction {
            date: today,
            kind: TransactionKind::Retirement,
            team,
            players: vec![player],
        });
    }
    Ok(false)
}

/// Weekly cash flow during the season: flat gate revenue scaled by squad
/// quality, minus the weekly slice of the payroll.
fn handle_finance_update(world: &mut World) -> Result<bool> {
    for team in &mut world.teams {
        let wages = (team.payroll() / 52) as i64;
        let revenue = 500_000 + (team.average_score() * 20_000.0) as i64;
        team.cash += revenue - wages;
    }
    if world.now.date() < world.season_end {
        world
            .events
            .push(GameEvent::new(world.now + Duration::weeks(1), EventKind::FinanceUpdate));
    }
    Ok(false)
}
