//! Headless driver for the simulation core.
//!
//! Stands in for the presentation layer: builds a demo league, pumps the
//! budgeted driver, and prints standings and transaction logs.

use std::collections::HashMap;
use std::time::Duration as WallDuration;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sm_core::demo::demo_world;
use sm_core::{generate_schedule, Driver, SliceOutcome, StopCondition, World};

#[derive(Parser)]
#[command(name = "sm_cli")]
#[command(about = "Run the season-management simulation headless", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a demo league for a stretch of virtual days
    Run {
        /// Number of teams (must be even)
        #[arg(long, default_value_t = 8)]
        teams: usize,

        /// Virtual days to simulate
        #[arg(long, default_value_t = 420)]
        days: i64,

        /// RNG seed for the league build and the simulation
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Season start date
        #[arg(long, default_value = "2024-09-01")]
        start: NaiveDate,
    },

    /// Print a generated fixture list as JSON
    Schedule {
        #[arg(long, default_value_t = 8)]
        teams: usize,

        #[arg(long, default_value = "2024-09-01")]
        start: NaiveDate,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { teams, days, seed, start } => run(teams, days, seed, start),
        Commands::Schedule { teams, start, seed } => print_schedule(teams, start, seed),
    }
}

fn run(teams: usize, days: i64, seed: u64, start: NaiveDate) -> Result<()> {
    let mut world = demo_world(teams, start, seed);
    let mut driver = Driver::new();
    let _handle = driver.begin_run();
    let condition = Some(StopCondition::Elapsed(Duration::days(days)));

    loop {
        let outcome =
            driver.run_slice(&mut world, WallDuration::from_millis(50), condition, |_| {})?;
        match outcome {
            SliceOutcome::BudgetExhausted | SliceOutcome::Paused => continue,
            SliceOutcome::ConditionMet | SliceOutcome::Stopped => break,
        }
    }
    info!("simulation stopped on {}", world.now.date());

    print_standings(&world);
    print_transactions(&world);
    Ok(())
}

#[derive(Default)]
struct Standing {
    played: u32,
    wins: u32,
    draws: u32,
    losses: u32,
    goals_for: u32,
    goals_against: u32,
}

impl Standing {
    fn points(&self) -> u32 {
        self.wins * 3 + self.draws
    }
}

fn print_standings(world: &World) {
    let mut table: HashMap<&str, Standing> = HashMap::new();
    for rounds in world.schedules.values() {
        for round in rounds {
            for m in &round.matches {
                let score = match m.result {
                    Some(score) => score,
                    None => continue,
                };
                let home = table.entry(m.home.as_str()).or_default();
                home.played += 1;
                home.goals_for += score.home as u32;
                home.goals_against += score.away as u32;
                match score.home.cmp(&score.away) {
                    std::cmp::Ordering::Greater => home.wins += 1,
                    std::cmp::Ordering::Equal => home.draws += 1,
                    std::cmp::Ordering::Less => home.losses += 1,
                }
                let away = table.entry(m.away.as_str()).or_default();
                away.played += 1;
                away.goals_for += score.away as u32;
                away.goals_against += score.home as u32;
                match score.away.cmp(&score.home) {
                    std::cmp::Ordering::Greater => away.wins += 1,
                    std::cmp::Ordering::Equal => away.draws += 1,
                    std::cmp::Ordering::Less => away.losses += 1,
                }
            }
        }
    }

    let mut entries: Vec<(&str, Standing)> = table.into_iter().collect();
    entries.sort_by(|a, b| b.1.points().cmp(&a.1.points()));

    println!("{:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4}", "Team", "P", "W", "D", "L", "GF", "GA", "Pts");
    for (name, s) in entries {
        println!(
            "{:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4}",
            name,
            s.played,
            s.wins,
            s.draws,
            s.losses,
            s.goals_for,
            s.goals_against,
            s.points()
        );
    }
}

fn print_transactions(world: &World) {
    let mut keys: Vec<&String> = world.transactions.keys().collect();
    keys.sort();
    for key in keys {
        let log = &world.transactions[key];
        println!("\nseason {key}: {} transactions", log.len());
        for t in log {
            println!("  {} {:?} {} [{}]", t.date, t.kind, t.team, t.players.join(", "));
        }
    }
}

fn print_schedule(teams: usize, start: NaiveDate, seed: u64) -> Result<()> {
    let names: Vec<String> = (1..=teams).map(|i| format!("Team {i}")).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let rounds = generate_schedule(&names, start, &mut rng)?;
    println!("{}", serde_json::to_string_pretty(&rounds)?);
    Ok(())
}
