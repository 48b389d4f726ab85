//! Season fixture generation.
//!
//! Double round-robin via the classic circle method: fix the first team,
//! rotate the rest, then mirror the first half with home and away swapped.

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Round {
    pub date: NaiveDate,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub id: Uuid,
    pub date: NaiveDate,
    pub home: String,
    pub away: String,

    /// Absent until the round is simulated; never overwritten once set.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<Score>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub home: u8,
    pub away: u8,
}

/// Generate a double round-robin schedule, one round per week.
///
/// The team order is shuffled first, so repeated calls produce different but
/// always structurally valid pairings. Errors on an odd team count; that is a
/// caller bug, not a runtime condition.
pub fn generate_schedule(
    team_names: &[String],
    start: NaiveDate,
    rng: &mut impl Rng,
) -> Result<Vec<Round>> {
    let n = team_names.len();
    if n < 2 || n % 2 != 0 {
        return Err(CoreError::InvalidParameter(format!(
            "schedule requires an even team count of at least 2, got {n}"
        )));
    }

    let mut order: Vec<&String> = team_names.iter().collect();
    order.shuffle(rng);

    // Circle method: order[0] stays fixed, the rest rotate one slot per round.
    let mut rotation: Vec<&String> = order[1..].to_vec();
    let mut first_half: Vec<Vec<(String, String)>> = Vec::with_capacity(n - 1);

    for round_index in 0..n - 1 {
        let mut slots: Vec<&String> = Vec::with_capacity(n);
        slots.push(order[0]);
        slots.extend(rotation.iter().copied());

        let mut pairings = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            let a = slots[i];
            let b = slots[n - 1 - i];
            // Alternate sides per round so no team strings long home runs.
            if (round_index + i) % 2 == 0 {
                pairings.push((a.clone(), b.clone()));
            } else {
                pairings.push((b.clone(), a.clone()));
            }
        }
        first_half.push(pairings);
        rotation.rotate_right(1);
    }

    let mut rounds = Vec::with_capacity(2 * (n - 1));
    for (i, pairings) in first_half.iter().enumerate() {
        rounds.push(build_round(start + Duration::weeks(i as i64), pairings, false));
    }
    for (i, pairings) in first_half.iter().enumerate() {
        let date = start + Duration::weeks((n - 1 + i) as i64);
        rounds.push(build_round(date, pairings, true));
    }

    Ok(rounds)
}

fn build_round(date: NaiveDate, pairings: &[(String, String)], mirrored: bool) -> Round {
    let matches = pairings
        .iter()
        .map(|(home, away)| {
            let (home, away) = if mirrored { (away, home) } else { (home, away) };
            Match {
                id: Uuid::new_v4(),
                date,
                home: home.clone(),
                away: away.clone(),
                result: None,
            }
        })
        .collect();
    Round { date, matches }
}

/// First round at or after `date`, if any remains.
pub fn round_on_or_after(rounds: &[Round], date: NaiveDate) -> Option<&Round> {
    rounds.iter().find(|r| r.date >= date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Team {i}")).collect()
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    #[test]
    fn odd_team_count_is_a_contract_violation() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(generate_schedule(&names(5), start(), &mut rng).is_err());
        assert!(generate_schedule(&names(0), start(), &mut rng).is_err());
    }

    #[test]
    fn four_teams_produce_six_weekly_rounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let rounds = generate_schedule(&names(4), start(), &mut rng).unwrap();
        assert_eq!(rounds.len(), 6);
        for (i, round) in rounds.iter().enumerate() {
            assert_eq!(round.date, start() + Duration::weeks(i as i64));
            assert_eq!(round.matches.len(), 2);
        }
    }

    #[test]
    fn every_team_plays_exactly_once_per_round() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let teams = names(8);
        let rounds = generate_schedule(&teams, start(), &mut rng).unwrap();
        assert_eq!(rounds.len(), 14);
        for round in &rounds {
            let mut seen = HashSet::new();
            for m in &round.matches {
                assert!(seen.insert(m.home.clone()), "{} twice in a round", m.home);
                assert!(seen.insert(m.away.clone()), "{} twice in a round", m.away);
            }
            assert_eq!(seen.len(), teams.len());
        }
    }

    #[test]
    fn no_pair_repeats_within_the_single_round_half() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let teams = names(10);
        let rounds = generate_schedule(&teams, start(), &mut rng).unwrap();
        let mut pairs = HashSet::new();
        for round in &rounds[..teams.len() - 1] {
            for m in &round.matches {
                let mut key = [m.home.clone(), m.away.clone()];
                key.sort();
                assert!(pairs.insert(key), "repeated pairing {} / {}", m.home, m.away);
            }
        }
    }

    #[test]
    fn double_round_balances_home_and_away() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let teams = names(4);
        let rounds = generate_schedule(&teams, start(), &mut rng).unwrap();
        for name in &teams {
            let home =
                rounds.iter().flat_map(|r| &r.matches).filter(|m| &m.home == name).count();
            let away =
                rounds.iter().flat_map(|r| &r.matches).filter(|m| &m.away == name).count();
            assert_eq!(home, 3, "{name} home games");
            assert_eq!(away, 3, "{name} away games");
        }
    }

    #[test]
    fn second_half_mirrors_the_first() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let teams = names(6);
        let rounds = generate_schedule(&teams, start(), &mut rng).unwrap();
        let half = teams.len() - 1;
        for i in 0..half {
            let forward: HashSet<(String, String)> = rounds[i]
                .matches
                .iter()
                .map(|m| (m.home.clone(), m.away.clone()))
                .collect();
            let mirrored: HashSet<(String, String)> = rounds[half + i]
                .matches
                .iter()
                .map(|m| (m.away.clone(), m.home.clone()))
                .collect();
            assert_eq!(forward, mirrored);
        }
    }
}
