#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Maze Chase round with an autopilot player.

mod autopilot;

use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use maze_chase_core::{Clock, Event, ManualClock, RoundStatus};
use maze_chase_rendering::{
    event_message, palette, FrameControl, Presentation, RenderingBackend, Scene, TextBackend,
};
use maze_chase_session::{
    RoundConfig, Session, SessionConfig, DEFAULT_CATCHERS, DEFAULT_GRID_SIDE,
    DEFAULT_POWERUPS_PER_KIND, DEFAULT_SEED,
};
use maze_chase_world::{query, World};

use crate::autopilot::Autopilot;

/// Simulated time between two ticks.
const FRAME_DELTA: Duration = Duration::from_millis(16);

/// Pause between a won round and the next one.
const ROUND_RESTART_DELAY: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "maze-chase")]
#[command(about = "Play a Maze Chase round with an autopilot player")]
struct Args {
    /// Number of maze rows.
    #[arg(long, default_value_t = DEFAULT_GRID_SIDE)]
    rows: u32,
    /// Number of maze columns.
    #[arg(long, default_value_t = DEFAULT_GRID_SIDE)]
    columns: u32,
    /// Catchers placed in the maze.
    #[arg(long, default_value_t = DEFAULT_CATCHERS)]
    catchers: usize,
    /// Power-ups placed for each kind.
    #[arg(long, default_value_t = DEFAULT_POWERUPS_PER_KIND)]
    powerups: usize,
    /// Seed of the random source.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Rounds to play; a won round restarts until this many have been played.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    rounds: u32,
    /// Ticks simulated before giving up.
    #[arg(long, default_value_t = 3_000)]
    ticks: u64,
    /// Print a frame every this many ticks.
    #[arg(long, default_value_t = 250)]
    frame_every: u64,
    /// Ticks the autopilot waits between two moves.
    #[arg(long, default_value_t = 8)]
    player_step_every: u32,
}

/// Entry point for the Maze Chase command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let round = RoundConfig::new(args.rows, args.columns, args.catchers, args.powerups)
        .context("invalid round configuration")?;
    let mut session = Session::new(SessionConfig::new(args.seed, round), ManualClock::default());
    let mut autopilot = Autopilot::new(args.player_step_every);

    let stdout = io::stdout();
    let colored = stdout.is_terminal();
    let backend = TextBackend::new(stdout.lock(), FRAME_DELTA, args.frame_every)
        .context("invalid frame interval")?
        .with_ansi_colors(colored);

    let presentation = Presentation::new(
        query::welcome_banner(session.world()),
        palette::BACKGROUND,
        snapshot(session.world()),
    );

    let mut ticks = 0_u64;
    let mut played = 1_u32;
    let mut won = 0_u32;
    let mut restart_at: Option<Duration> = None;
    let mut message: Option<String> = None;
    backend
        .run(presentation, |delta, scene| {
            session.clock().advance(delta);
            if restart_at.is_some_and(|at| session.clock().now() >= at) {
                restart_at = None;
                played += 1;
                let _ = session.reset_round(round);
                message = Some(format!("Round {played} begins."));
            }

            let acted = if query::status(session.world()) == RoundStatus::InProgress {
                autopilot.act(&mut session)
            } else {
                None
            };
            let events = session.tick();
            ticks += 1;

            if events
                .iter()
                .any(|event| matches!(event, Event::GoalReached { .. }))
            {
                won += 1;
                if played < args.rounds {
                    restart_at = Some(session.clock().now() + ROUND_RESTART_DELAY);
                }
            }

            if let Some(latest) = events.iter().filter_map(event_message).last().or(acted) {
                message = Some(latest);
            }
            *scene = snapshot(session.world());
            scene.hud.message = message.clone();

            let finished = match query::status(session.world()) {
                RoundStatus::InProgress => false,
                RoundStatus::Caught => true,
                RoundStatus::Won => restart_at.is_none(),
            };
            if finished || ticks >= args.ticks {
                FrameControl::Exit
            } else {
                FrameControl::Continue
            }
        })
        .context("presenting frames")?;

    let outcome = match query::status(session.world()) {
        RoundStatus::Won => "reached the goal",
        RoundStatus::Caught => "was caught",
        RoundStatus::InProgress => "ran out of time",
    };
    println!(
        "Autopilot {outcome} after {ticks} ticks, winning {won} of {played} rounds (seed {}).",
        session.seed()
    );
    Ok(())
}

fn snapshot(world: &World) -> Scene {
    Scene::new(
        query::maze(world),
        query::goal(world),
        query::player(world),
        &query::catcher_view(world),
        &query::powerup_view(world),
        query::status(world),
    )
}
