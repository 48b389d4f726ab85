//! Demo league generation.
//!
//! Builds a ready-to-run world with plausible squads and a free-agent pool.
//! Used by the CLI driver and the test harnesses; real hosts construct their
//! own `World` from persisted data.

use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::{Contract, Player, Position, Team};
use crate::state::World;

const CLUB_NAMES: [&str; 16] = [
    "Northbridge United",
    "Harbor City",
    "Red Valley",
    "Oakmont Rovers",
    "Silverlake FC",
    "Eastport Athletic",
    "Kingsfield Town",
    "Westgate Wanderers",
    "Stonehill Rangers",
    "Lakeside Albion",
    "Ironworth County",
    "Southmoor FC",
    "Highfield Orient",
    "Millbrook City",
    "Ashford Forest",
    "Bayview Victoria",
];

/// Squad template: two keepers plus a sensible outfield spread.
const SQUAD_LAYOUT: [Position; 18] = [
    Position::GK,
    Position::GK,
    Position::LB,
    Position::LB,
    Position::CB,
    Position::CB,
    Position::CB,
    Position::RB,
    Position::CDM,
    Position::CM,
    Position::CM,
    Position::CAM,
    Position::LM,
    Position::RM,
    Position::LW,
    Position::RW,
    Position::ST,
    Position::ST,
];

pub fn demo_world(team_count: usize, season_start: NaiveDate, seed: u64) -> World {
    let mut gen = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let mut world = World::new(Vec::new(), season_start, seed);

    for i in 0..team_count {
        let name = CLUB_NAMES
            .get(i)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("Club {}", i + 1));
        let mut team = Team::new(name.clone());
        for position in SQUAD_LAYOUT {
            let id = world.alloc_player_id();
            team.sign(Player {
                id,
                name: format!("{} #{}", name, id),
                position,
                score: gen.gen_range(35.0..85.0),
                age: gen.gen_range(18..=33),
                contract: Contract {
                    salary: gen.gen_range(200_000..2_000_000),
                    seasons_left: gen.gen_range(1..=4),
                },
            });
        }
        world.teams.push(team);
    }

    for _ in 0..team_count * 3 {
        let id = world.alloc_player_id();
        let positions = Position::all();
        world.free_agents.push(Player {
            id,
            name: format!("Free Agent #{id}"),
            position: positions[gen.gen_range(0..positions.len())],
            score: gen.gen_range(25.0..70.0),
            age: gen.gen_range(19..=32),
            contract: Contract {
                salary: gen.gen_range(150_000..900_000),
                seasons_left: 0,
            },
        });
    }

    world
}
