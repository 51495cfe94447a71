#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement system responsible for emitting catcher and power-up spawn commands.

use maze_chase_core::{CellCoord, Command, Event, GridDimensions, PowerupKind};
use rand::Rng;

/// Configuration parameters required to construct the placement system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    catchers: usize,
    powerups_per_kind: usize,
}

impl Config {
    /// Creates a new configuration placing `catchers` catchers and
    /// `powerups_per_kind` power-ups of each kind every round.
    #[must_use]
    pub const fn new(catchers: usize, powerups_per_kind: usize) -> Self {
        Self {
            catchers,
            powerups_per_kind,
        }
    }

    /// Number of catchers requested per round.
    #[must_use]
    pub const fn catchers(&self) -> usize {
        self.catchers
    }

    /// Number of power-ups of each kind requested per round.
    #[must_use]
    pub const fn powerups_per_kind(&self) -> usize {
        self.powerups_per_kind
    }
}

/// Pure system that seeds a freshly carved maze with catchers and power-ups.
///
/// Placement waits for the maze to be installed after a round is configured.
/// When the grid is too small to hold every requested entity of a type, no
/// entity of that type is placed at all.
#[derive(Debug)]
pub struct Placement {
    config: Config,
    pending: Option<RoundLayout>,
}

impl Placement {
    /// Creates a new placement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            pending: None,
        }
    }

    /// Consumes world events and emits spawn commands once the maze is in place.
    pub fn handle<R>(&mut self, events: &[Event], rng: &mut R, out: &mut Vec<Command>)
    where
        R: Rng + ?Sized,
    {
        for event in events {
            match event {
                Event::RoundConfigured {
                    dimensions,
                    player_start,
                    goal,
                } => {
                    self.pending = Some(RoundLayout {
                        dimensions: *dimensions,
                        player: *player_start,
                        goal: *goal,
                    });
                }
                Event::MazeInstalled { .. } => {
                    if let Some(layout) = self.pending.take() {
                        self.place(layout, rng, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn place<R>(&self, layout: RoundLayout, rng: &mut R, out: &mut Vec<Command>)
    where
        R: Rng + ?Sized,
    {
        let catchers = catcher_cells(
            layout.dimensions,
            layout.player,
            layout.goal,
            self.config.catchers,
            rng,
        );
        if catchers.len() < self.config.catchers {
            tracing::debug!(
                requested = self.config.catchers,
                "grid too small for catchers, placing none"
            );
        }

        let mut occupied = Vec::with_capacity(catchers.len() + 2);
        occupied.push(layout.player);
        occupied.push(layout.goal);
        occupied.extend_from_slice(&catchers);

        let powerups = powerup_cells(
            layout.dimensions,
            &occupied,
            self.config.powerups_per_kind,
            rng,
        );
        if powerups.len() < self.config.powerups_per_kind * 2 {
            tracing::debug!(
                requested = self.config.powerups_per_kind * 2,
                "grid too small for power-ups, placing none"
            );
        }

        out.extend(catchers.into_iter().map(|cell| Command::SpawnCatcher { cell }));
        out.extend(
            powerups
                .into_iter()
                .map(|(cell, kind)| Command::SpawnPowerup { cell, kind }),
        );
    }
}

/// Draws `count` distinct catcher cells avoiding the player start and the goal.
///
/// Returns an empty list when fewer than `count` cells qualify.
pub fn catcher_cells<R>(
    dimensions: GridDimensions,
    player: CellCoord,
    goal: CellCoord,
    count: usize,
    rng: &mut R,
) -> Vec<CellCoord>
where
    R: Rng + ?Sized,
{
    let pool: Vec<CellCoord> = dimensions
        .cells()
        .filter(|cell| *cell != player && *cell != goal)
        .collect();
    draw_without_replacement(pool, count, rng).unwrap_or_default()
}

/// Draws `2 * per_kind` distinct cells outside `occupied`; the first half
/// hold invisibility power-ups and the second half teleportation power-ups.
///
/// Returns an empty list when fewer than `2 * per_kind` cells qualify.
pub fn powerup_cells<R>(
    dimensions: GridDimensions,
    occupied: &[CellCoord],
    per_kind: usize,
    rng: &mut R,
) -> Vec<(CellCoord, PowerupKind)>
where
    R: Rng + ?Sized,
{
    let pool: Vec<CellCoord> = dimensions
        .cells()
        .filter(|cell| !occupied.contains(cell))
        .collect();
    let Some(cells) = draw_without_replacement(pool, per_kind.saturating_mul(2), rng) else {
        return Vec::new();
    };

    cells
        .into_iter()
        .enumerate()
        .map(|(index, cell)| {
            let kind = if index < per_kind {
                PowerupKind::Invisibility
            } else {
                PowerupKind::Teleportation
            };
            (cell, kind)
        })
        .collect()
}

fn draw_without_replacement<R>(
    mut pool: Vec<CellCoord>,
    count: usize,
    rng: &mut R,
) -> Option<Vec<CellCoord>>
where
    R: Rng + ?Sized,
{
    if pool.len() < count {
        return None;
    }

    let mut drawn = Vec::with_capacity(count);
    for _ in 0..count {
        let index = rng.gen_range(0..pool.len());
        drawn.push(pool.remove(index));
    }
    Some(drawn)
}

#[derive(Clone, Copy, Debug)]
struct RoundLayout {
    dimensions: GridDimensions,
    player: CellCoord,
    goal: CellCoord,
}
