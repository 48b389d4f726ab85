//! Trade negotiation between computer-controlled teams.
//!
//! A bounded combinatorial search: the searching team picks a wish set from
//! the partner's roster, then hunts for a give set of at most three players
//! whose appeal lands within tolerance of the wish set's. The search is
//! deliberately non-deterministic; identical inputs may produce different
//! offers or none at all, and exhaustion is a silent `None`, retried (if at
//! all) by a re-enqueued event, never in here.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::{Player, PlayerId, Team};
use crate::rules::{
    APPEAL_STEP, APPEAL_TOLERANCE, MAX_TEAM_SIZE, MIN_TEAM_SIZE, SALARY_CAP, STAR_PLAYER_WEIGHT,
    TRADE_MAX_PLAYERS, TRADE_POOL_CAP,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeSide {
    pub team: String,
    pub players: Vec<PlayerId>,
}

/// An ephemeral exchange proposal, named from the searcher's perspective:
/// `give` leaves the searching team, `get` leaves the partner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeOffer {
    pub give: TradeSide,
    pub get: TradeSide,
}

impl TradeOffer {
    /// The players `team` would send away under this offer, if it is party
    /// to it at all.
    fn outgoing_for(&self, team: &str) -> Option<(&TradeSide, &TradeSide)> {
        if self.give.team == team {
            Some((&self.give, &self.get))
        } else if self.get.team == team {
            Some((&self.get, &self.give))
        } else {
            None
        }
    }
}

/// Population mean skill across every rostered player in the league.
pub fn league_mean_score(teams: &[Team]) -> f32 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for team in teams {
        for player in &team.players {
            sum += player.score;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// A team's valuation of an offered player set.
///
/// Each player contributes an exponential distance-from-mean term, and the
/// single best player of the set is counted once more at reduced weight:
/// star players disproportionately drive interest.
pub fn appeal(players: &[&Player], mean: f32) -> f32 {
    let term = |p: &Player| 2f32.powf((p.score - mean) / APPEAL_STEP);
    let sum: f32 = players.iter().map(|p| term(p)).sum();
    let star = players.iter().map(|p| term(p)).fold(0.0f32, f32::max);
    sum + STAR_PLAYER_WEIGHT * star
}

/// Whether `team` can carry the payroll swing of an exchange: under the cap
/// after the trade, or at least strictly cheaper than before.
fn affordable(team: &Team, incoming: &[&Player], outgoing: &[&Player]) -> bool {
    let pre = team.payroll() as i64;
    let in_sum: i64 = incoming.iter().map(|p| p.contract.salary as i64).sum();
    let out_sum: i64 = outgoing.iter().map(|p| p.contract.salary as i64).sum();
    let post = pre - out_sum + in_sum;
    post <= SALARY_CAP as i64 || post < pre
}

/// Distance of a roster size from the legal band; 0 inside it.
fn band_distance(len: i64) -> i64 {
    if len < MIN_TEAM_SIZE as i64 {
        MIN_TEAM_SIZE as i64 - len
    } else if len > MAX_TEAM_SIZE as i64 {
        len - MAX_TEAM_SIZE as i64
    } else {
        0
    }
}

/// The exchange must leave the roster inside the legal band, or strictly
/// closer to it than before.
fn roster_size_valid(len: usize, incoming: usize, outgoing: usize) -> bool {
    let before = len as i64;
    let after = before + incoming as i64 - outgoing as i64;
    band_distance(after) == 0 || band_distance(after) < band_distance(before)
}

fn resolve<'a>(team: &'a Team, ids: &[PlayerId]) -> Option<Vec<&'a Player>> {
    ids.iter().map(|id| team.player(*id)).collect()
}

/// The full acceptability predicate for one side of an offer: both sides
/// non-empty, the payroll swing affordable, the roster size valid, and the
/// incoming appeal no more than tolerance below the outgoing appeal.
pub fn acceptable(offer: &TradeOffer, teams: &[Team], perspective: &str, mean: f32) -> bool {
    if offer.give.players.is_empty() || offer.get.players.is_empty() {
        return false;
    }
    let (mine, theirs) = match offer.outgoing_for(perspective) {
        Some(sides) => sides,
        None => return false,
    };
    let my_team = match teams.iter().find(|t| t.name == mine.team) {
        Some(t) => t,
        None => return false,
    };
    let partner = match teams.iter().find(|t| t.name == theirs.team) {
        Some(t) => t,
        None => return false,
    };
    let outgoing = match resolve(my_team, &mine.players) {
        Some(players) => players,
        None => return false,
    };
    let incoming = match resolve(partner, &theirs.players) {
        Some(players) => players,
        None => return false,
    };

    affordable(my_team, &incoming, &outgoing)
        && roster_size_valid(my_team.players.len(), incoming.len(), outgoing.len())
        && appeal(&incoming, mean) >= appeal(&outgoing, mean) * (1.0 - APPEAL_TOLERANCE)
}

/// Search team `a`'s roster for a give set matching a wish set drawn from
/// team `b`. Returns an offer the searcher itself already accepts, or `None`
/// when the bounded space holds no such set.
pub fn find_offer(
    a: &Team,
    b: &Team,
    teams: &[Team],
    mean: f32,
    rng: &mut impl Rng,
) -> Option<TradeOffer> {
    if a.players.is_empty() || b.players.is_empty() {
        return None;
    }

    // Wish set: one or two of the partner's players, sampled at random.
    let mut partner_pool: Vec<&Player> = b.players.iter().collect();
    partner_pool.shuffle(rng);
    partner_pool.truncate(TRADE_POOL_CAP);
    let wish_len = rng.gen_range(1..=2.min(partner_pool.len()));
    let wish: Vec<&Player> = partner_pool[..wish_len].to_vec();
    let target = appeal(&wish, mean);
    let wish_ids: Vec<PlayerId> = wish.iter().map(|p| p.id).collect();

    let mut candidates: Vec<&Player> = a.players.iter().collect();
    candidates.shuffle(rng);
    candidates.truncate(TRADE_POOL_CAP);

    let offer_for = |give_ids: Vec<PlayerId>| TradeOffer {
        give: TradeSide { team: a.name.clone(), players: give_ids },
        get: TradeSide { team: b.name.clone(), players: wish_ids.clone() },
    };

    // One hit per combination size; the final pick is random among them.
    let mut hits: Vec<TradeOffer> = Vec::new();
    for size in 1..=TRADE_MAX_PLAYERS {
        let mut combo = Vec::with_capacity(size);
        if let Some(ids) = search_combo(&candidates, size, 0, &mut combo, &|give| {
            let value = appeal(give, mean);
            if value < target * (1.0 - APPEAL_TOLERANCE)
                || value > target * (1.0 + APPEAL_TOLERANCE)
            {
                return false;
            }
            let offer = TradeOffer {
                give: TradeSide {
                    team: a.name.clone(),
                    players: give.iter().map(|p| p.id).collect(),
                },
                get: TradeSide { team: b.name.clone(), players: wish_ids.clone() },
            };
            acceptable(&offer, teams, &a.name, mean)
        }) {
            hits.push(offer_for(ids));
        }
    }

    if hits.is_empty() {
        debug!("{} found no acceptable offer for {}", a.name, b.name);
        return None;
    }
    let pick = rng.gen_range(0..hits.len());
    Some(hits.swap_remove(pick))
}

/// Depth-first walk over index-ordered combinations of `size` players,
/// stopping at the first set the predicate accepts.
fn search_combo<'a>(
    pool: &[&'a Player],
    size: usize,
    start: usize,
    combo: &mut Vec<&'a Player>,
    valid: &impl Fn(&[&Player]) -> bool,
) -> Option<Vec<PlayerId>> {
    if combo.len() == size {
        if valid(combo) {
            return Some(combo.iter().map(|p| p.id).collect());
        }
        return None;
    }
    for i in start..pool.len() {
        combo.push(pool[i]);
        if let Some(found) = search_combo(pool, size, i + 1, combo, valid) {
            combo.pop();
            return Some(found);
        }
        combo.pop();
    }
    None
}

/// Move the offered players both ways. Referencing a team or player the
/// roster no longer holds is a caller bug; both sides are validated before
/// any roster is touched, so a rejected offer leaves the league unchanged.
pub fn commit_trade(teams: &mut [Team], offer: &TradeOffer) -> Result<()> {
    let giver = teams
        .iter()
        .position(|t| t.name == offer.give.team)
        .ok_or_else(|| CoreError::NotFound(format!("team {}", offer.give.team)))?;
    let getter = teams
        .iter()
        .position(|t| t.name == offer.get.team)
        .ok_or_else(|| CoreError::NotFound(format!("team {}", offer.get.team)))?;

    for id in &offer.give.players {
        if teams[giver].player(*id).is_none() {
            return Err(CoreError::NotFound(format!("player {id}")));
        }
    }
    for id in &offer.get.players {
        if teams[getter].player(*id).is_none() {
            return Err(CoreError::NotFound(format!("player {id}")));
        }
    }

    let moving_out: Vec<Player> =
        offer.give.players.iter().filter_map(|id| teams[giver].release(*id)).collect();
    let moving_in: Vec<Player> =
        offer.get.players.iter().filter_map(|id| teams[getter].release(*id)).collect();
    for player in moving_out {
        teams[getter].sign(player);
    }
    for player in moving_in {
        teams[giver].sign(player);
    }
    Ok(())
}

/// One negotiation between an ordered pair of teams. The searcher's offer is
/// acceptable to it by construction; the trade commits only when the partner
/// accepts it too.
pub fn negotiate(
    teams: &mut [Team],
    a: usize,
    b: usize,
    rng: &mut impl Rng,
) -> Result<Option<TradeOffer>> {
    let mean = league_mean_score(teams);
    let offer = match find_offer(&teams[a], &teams[b], teams, mean, rng) {
        Some(offer) => offer,
        None => return Ok(None),
    };
    if !acceptable(&offer, teams, &offer.get.team, mean) {
        debug!("{} rejected the offer from {}", offer.get.team, offer.give.team);
        return Ok(None);
    }
    commit_trade(teams, &offer)?;
    info!(
        "trade committed: {} send {:?}, {} send {:?}",
        offer.give.team, offer.give.players, offer.get.team, offer.get.players
    );
    Ok(Some(offer))
}
