//! Best-effort lineup assignment.
//!
//! Approximates maximum-weight bipartite matching (players x spots) with a
//! cheap three-phase heuristic: strict fill per formation, shortlist the top
//! three formations, then complete and improve each before picking the best.
//! Close to optimum in practice, and cheap enough to rerun per team on every
//! roster change.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{spot_score, Formation, CATALOG};
use crate::error::{CoreError, Result};
use crate::models::{Player, PlayerId, Position};

/// Formations kept after the strict-fill pass. Formations with more
/// naturally-positioned players tend to score higher after completion too.
const SHORTLIST: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lineup {
    pub formation_key: String,

    /// One entry per formation spot, in catalog spot order. Injective: no
    /// player appears at two spots.
    pub spots: Vec<Option<PlayerId>>,

    pub score: f32,
}

impl Lineup {
    pub fn picked(&self) -> HashSet<PlayerId> {
        self.spots.iter().flatten().copied().collect()
    }

    pub fn is_full(&self) -> bool {
        self.spots.iter().all(|s| s.is_some())
    }
}

/// Per-run memo of (player, spot position) scores. A given pair is computed
/// at most once per assignment run.
#[derive(Default)]
struct ScoreCache {
    scores: HashMap<(PlayerId, Position), f32>,
}

impl ScoreCache {
    fn score(&mut self, player: &Player, spot: Position) -> f32 {
        *self.scores.entry((player.id, spot)).or_insert_with(|| spot_score(player, spot))
    }
}

struct Draft<'a> {
    formation: &'a Formation,
    spots: Vec<Option<PlayerId>>,
    /// Marks spots filled with a naturally-positioned player.
    strict: Vec<bool>,
    picked: HashSet<PlayerId>,
    score: f32,
}

/// Run the full procedure: strict fill every catalog formation, shortlist,
/// complete and improve, return the best. The result always names a catalog
/// formation, even for a pool too small to fill one.
pub fn best_formation(players: &[Player]) -> Lineup {
    let mut cache = ScoreCache::default();
    let mut drafts: Vec<Draft> =
        CATALOG.iter().map(|f| strict_fill(f, players, &mut cache)).collect();
    drafts.sort_by(|a, b| b.score.total_cmp(&a.score));
    drafts.truncate(SHORTLIST);

    let mut best: Option<Draft> = None;
    for mut draft in drafts {
        complete_and_improve(&mut draft, players, &mut cache);
        match &best {
            Some(b) if b.score >= draft.score => {}
            _ => best = Some(draft),
        }
    }
    // CATALOG is never empty, so the shortlist is not either.
    finish(best.expect("formation catalog is empty"))
}

/// Fill one already-chosen formation, skipping the catalog search. Used for
/// cheap single-substitution updates. Unknown keys are a caller bug.
pub fn fill_formation(players: &[Player], key: &str) -> Result<Lineup> {
    let formation = super::formation(key)
        .ok_or_else(|| CoreError::NotFound(format!("formation {key}")))?;
    Ok(fill_known(formation, players))
}

pub(crate) fn fill_known(formation: &Formation, players: &[Player]) -> Lineup {
    let mut cache = ScoreCache::default();
    let mut draft = strict_fill(formation, players, &mut cache);
    complete_and_improve(&mut draft, players, &mut cache);
    finish(draft)
}

/// Phase 1: each spot takes the best not-yet-picked player whose natural
/// position matches the spot. Ties break by pool iteration order.
fn strict_fill<'a>(
    formation: &'a Formation,
    players: &[Player],
    cache: &mut ScoreCache,
) -> Draft<'a> {
    let mut draft = Draft {
        formation,
        spots: vec![None; formation.spots.len()],
        strict: vec![false; formation.spots.len()],
        picked: HashSet::new(),
        score: 0.0,
    };

    for (i, spot) in formation.spots.iter().enumerate() {
        let mut best: Option<(PlayerId, f32)> = None;
        for player in players {
            if player.position != spot.position || draft.picked.contains(&player.id) {
                continue;
            }
            let score = cache.score(player, spot.position);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((player.id, score));
            }
        }
        if let Some((id, score)) = best {
            draft.spots[i] = Some(id);
            draft.strict[i] = true;
            draft.picked.insert(id);
            draft.score += score;
        }
    }
    draft
}

/// Phases 2-3: fill remaining spots with the best available player regardless
/// of position, then revisit strictly-filled spots and swap in any available
/// player who scores higher there, releasing the displaced player.
fn complete_and_improve(draft: &mut Draft, players: &[Player], cache: &mut ScoreCache) {
    for i in 0..draft.formation.spots.len() {
        if draft.spots[i].is_some() {
            continue;
        }
        let spot = draft.formation.spots[i].position;
        let mut best: Option<(PlayerId, f32)> = None;
        for player in players {
            if draft.picked.contains(&player.id) {
                continue;
            }
            let score = cache.score(player, spot);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((player.id, score));
            }
        }
        if let Some((id, _)) = best {
            draft.spots[i] = Some(id);
            draft.picked.insert(id);
        }
    }

    for i in 0..draft.formation.spots.len() {
        if !draft.strict[i] {
            continue;
        }
        let spot = draft.formation.spots[i].position;
        let incumbent = match draft.spots[i] {
            Some(id) => id,
            None => continue,
        };
        let incumbent_score = match players.iter().find(|p| p.id == incumbent) {
            Some(p) => cache.score(p, spot),
            None => continue,
        };
        let mut best: Option<(PlayerId, f32)> = None;
        for player in players {
            if draft.picked.contains(&player.id) {
                continue;
            }
            let score = cache.score(player, spot);
            if score > incumbent_score && best.map_or(true, |(_, s)| score > s) {
                best = Some((player.id, score));
            }
        }
        if let Some((id, _)) = best {
            draft.picked.remove(&incumbent);
            draft.picked.insert(id);
            draft.spots[i] = Some(id);
            draft.strict[i] = false;
        }
    }

    draft.score = 0.0;
    for (i, spot) in draft.formation.spots.iter().enumerate() {
        if let Some(id) = draft.spots[i] {
            if let Some(player) = players.iter().find(|p| p.id == id) {
                draft.score += cache.score(player, spot.position);
            }
        }
    }
}

fn finish(draft: Draft) -> Lineup {
    Lineup {
        formation_key: draft.formation.key.to_string(),
        spots: draft.spots,
        score: draft.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Contract;

    fn player(id: PlayerId, position: Position, score: f32) -> Player {
        Player {
            id,
            name: format!("Player {id}"),
            position,
            score,
            age: 25,
            contract: Contract { salary: 100_000, seasons_left: 1 },
        }
    }

    fn balanced_pool() -> Vec<Player> {
        use Position::*;
        let layout = [
            GK, GK, LB, CB, CB, CB, RB, CDM, CM, CM, CAM, LM, RM, LW, RW, ST, ST, CF,
        ];
        layout
            .iter()
            .enumerate()
            .map(|(i, &pos)| player(i as PlayerId + 1, pos, 40.0 + i as f32 * 2.0))
            .collect()
    }

    #[test]
    fn assignment_is_injective() {
        let pool = balanced_pool();
        let lineup = best_formation(&pool);
        let assigned: Vec<PlayerId> = lineup.spots.iter().flatten().copied().collect();
        let unique: HashSet<PlayerId> = assigned.iter().copied().collect();
        assert_eq!(assigned.len(), unique.len());
    }

    #[test]
    fn search_returns_a_catalog_formation() {
        let lineup = best_formation(&balanced_pool());
        assert!(super::super::formation(&lineup.formation_key).is_some());

        let empty_pool = best_formation(&[]);
        assert!(super::super::formation(&empty_pool.formation_key).is_some());
        assert_eq!(empty_pool.score, 0.0);
    }

    #[test]
    fn eleven_distinct_players_fully_fill_a_named_formation() {
        use Position::*;
        let positions = [GK, LB, CB, CB, RB, CDM, CM, CM, LW, ST, RW];
        let pool: Vec<Player> = positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| player(i as PlayerId + 1, pos, 50.0 + i as f32 * 3.0))
            .collect();
        let lineup = fill_formation(&pool, "4-3-3").unwrap();
        assert!(lineup.is_full());
        assert_eq!(lineup.picked().len(), 11);
    }

    #[test]
    fn unknown_formation_key_is_a_contract_violation() {
        assert!(fill_formation(&balanced_pool(), "2-2-6").is_err());
    }

    #[test]
    fn strict_fill_only_touches_naturally_compatible_spots() {
        let pool: Vec<Player> =
            (0..11).map(|i| player(i + 1, Position::CB, 60.0 + i as f32)).collect();
        let formation = super::super::formation("4-4-2").unwrap();
        let mut cache = ScoreCache::default();
        let draft = strict_fill(formation, &pool, &mut cache);

        for (i, spot) in formation.spots.iter().enumerate() {
            if spot.position == Position::CB {
                assert!(draft.spots[i].is_some());
                assert!(draft.strict[i]);
            } else {
                assert!(draft.spots[i].is_none());
            }
        }

        // Non-strict completion then fields the rest of the pool.
        let lineup = fill_formation(&pool, "4-4-2").unwrap();
        assert!(lineup.is_full());
    }

    #[test]
    fn strict_fill_prefers_the_higher_scorer_first_found_on_ties() {
        use Position::*;
        let pool = vec![
            player(1, ST, 70.0),
            player(2, ST, 70.0),
            player(3, ST, 90.0),
        ];
        let formation = super::super::formation("4-4-2").unwrap();
        let mut cache = ScoreCache::default();
        let draft = strict_fill(formation, &pool, &mut cache);

        let st_spots: Vec<PlayerId> = formation
            .spots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.position == ST)
            .filter_map(|(i, _)| draft.spots[i])
            .collect();
        // Best scorer first, then the first of the tied pair.
        assert_eq!(st_spots, vec![3, 1]);
    }

    #[test]
    fn improvement_swaps_in_a_stronger_out_of_position_player() {
        use Position::*;
        // Natural players at every 4-5-1 spot, a weak natural striker, and
        // one elite forward left on the bench after strict fill.
        let naturals = [GK, LB, CB, CB, RB, LM, CM, CDM, CM, RM];
        let mut pool: Vec<Player> = naturals
            .iter()
            .enumerate()
            .map(|(i, &pos)| player(i as PlayerId + 1, pos, 70.0))
            .collect();
        pool.push(player(11, ST, 10.0));
        pool.push(player(12, CF, 95.0));

        let lineup = fill_formation(&pool, "4-5-1").unwrap();
        let st_index = super::super::formation("4-5-1")
            .unwrap()
            .spots
            .iter()
            .position(|s| s.position == ST)
            .unwrap();
        // The CF outscores the natural ST even off-position (95 * 0.8 > 10).
        assert_eq!(lineup.spots[st_index], Some(12));
    }
}
