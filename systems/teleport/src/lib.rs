#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Goal-biased teleport search with a forward walk as its fallback.

use std::{cmp::Reverse, collections::BinaryHeap, time::Duration};

use maze_chase_core::{
    CellCoord, Clock, Command, Direction, Event, FallbackReason, Maze, TeleportRoute,
};
use rand::Rng;

/// Wall-clock time the goal-biased search may spend before falling back.
pub const SEARCH_TIME_LIMIT: Duration = Duration::from_millis(500);

/// Path length at which the goal-biased search stops expanding.
pub const SEARCH_PATH_STEPS: u32 = 15;

/// Moves taken by the forward walk when the search is abandoned.
pub const FORWARD_STEPS: u32 = 10;

const FORWARD_ATTEMPTS: u32 = 100;

/// Time allowance measured against an injected [`Clock`].
#[derive(Debug)]
pub struct SearchBudget<C> {
    clock: C,
    started: Duration,
    limit: Duration,
}

impl<C: Clock> SearchBudget<C> {
    /// Starts a budget of `limit` at the clock's current time.
    pub fn new(clock: C, limit: Duration) -> Self {
        let started = clock.now();
        Self::started_at(clock, started, limit)
    }

    /// Creates a budget that started at `started` on the clock's timeline.
    pub fn started_at(clock: C, started: Duration, limit: Duration) -> Self {
        Self {
            clock,
            started,
            limit,
        }
    }

    /// Time spent since the budget started.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.started)
    }

    /// Reports whether the budget has been overrun.
    pub fn expired(&self) -> bool {
        self.elapsed() > self.limit
    }
}

/// Result of a teleport search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeleportOutcome {
    /// Cell the player should land on, or `None` when the player stays put.
    pub destination: Option<CellCoord>,
    /// Strategy that produced the destination.
    pub route: TeleportRoute,
}

impl TeleportOutcome {
    /// Reports whether the outcome moves the player.
    #[must_use]
    pub fn moved(&self) -> bool {
        self.destination.is_some()
    }
}

/// Pure system that answers teleport requests raised by the world.
#[derive(Debug, Default)]
pub struct Teleport {
    frontier: BinaryHeap<Reverse<Record>>,
    visited: Vec<bool>,
}

impl Teleport {
    /// Creates a teleport system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a [`Command::CompleteTeleport`] for every started teleport in `events`.
    pub fn handle<C, R>(
        &mut self,
        events: &[Event],
        maze: &Maze,
        goal: CellCoord,
        budget: &SearchBudget<C>,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        C: Clock,
        R: Rng + ?Sized,
    {
        for event in events {
            if let Event::TeleportStarted { from } = event {
                let outcome = self.toward_goal(maze, *from, goal, budget, rng);
                out.push(Command::CompleteTeleport {
                    destination: outcome.destination,
                    route: outcome.route,
                });
            }
        }
    }

    /// Searches for a cell up to [`SEARCH_PATH_STEPS`] moves along the maze
    /// that lies closer to `goal` than `start`.
    ///
    /// Records are expanded in order of their Manhattan distance to the goal,
    /// oldest first on ties. Timeouts, exhausted frontiers and candidates that
    /// make no progress hand over to [`teleport_forward`].
    pub fn toward_goal<C, R>(
        &mut self,
        maze: &Maze,
        start: CellCoord,
        goal: CellCoord,
        budget: &SearchBudget<C>,
        rng: &mut R,
    ) -> TeleportOutcome
    where
        C: Clock,
        R: Rng + ?Sized,
    {
        let dimensions = maze.dimensions();
        let initial_distance = start.manhattan_distance(goal);

        self.frontier.clear();
        self.visited.clear();
        self.visited.resize(dimensions.cell_count(), false);
        if let Some(index) = dimensions.index(start) {
            self.visited[index] = true;
        }

        let mut sequence = 0_u64;
        self.frontier.push(Reverse(Record {
            distance: initial_distance,
            sequence,
            cell: start,
            depth: 0,
        }));

        let reason = loop {
            if budget.expired() {
                break FallbackReason::TimedOut;
            }

            let Some(Reverse(record)) = self.frontier.pop() else {
                break FallbackReason::FrontierExhausted;
            };

            if record.cell == goal || record.depth >= SEARCH_PATH_STEPS {
                if record.depth == 0 {
                    return TeleportOutcome {
                        destination: None,
                        route: TeleportRoute::Direct,
                    };
                }
                if record.distance >= initial_distance {
                    break FallbackReason::NoProgress;
                }
                return TeleportOutcome {
                    destination: Some(record.cell),
                    route: TeleportRoute::Direct,
                };
            }

            for direction in maze.open_directions(record.cell) {
                let Some(next) = dimensions.neighbor(record.cell, direction) else {
                    continue;
                };
                let Some(index) = dimensions.index(next) else {
                    continue;
                };
                if self.visited[index] {
                    continue;
                }
                self.visited[index] = true;
                sequence += 1;
                self.frontier.push(Reverse(Record {
                    distance: next.manhattan_distance(goal),
                    sequence,
                    cell: next,
                    depth: record.depth + 1,
                }));
            }
        };

        tracing::debug!(?reason, elapsed = ?budget.elapsed(), "teleport search fell back");
        TeleportOutcome {
            destination: teleport_forward(maze, start, goal, FORWARD_STEPS, rng),
            route: TeleportRoute::Fallback { reason },
        }
    }
}

/// Runs the goal-biased teleport search with fresh scratch buffers.
pub fn teleport_toward_goal<C, R>(
    maze: &Maze,
    start: CellCoord,
    goal: CellCoord,
    budget: &SearchBudget<C>,
    rng: &mut R,
) -> TeleportOutcome
where
    C: Clock,
    R: Rng + ?Sized,
{
    Teleport::new().toward_goal(maze, start, goal, budget, rng)
}

/// Walks up to `steps` moves away from `start` and returns the farthest cell reached.
///
/// Each move takes the first open direction that increases the Manhattan
/// distance from `start`, or a random open direction when none does. Reaching
/// `goal` ends the walk on the goal. Returns `None` when the walk never left
/// `start`.
pub fn teleport_forward<R>(
    maze: &Maze,
    start: CellCoord,
    goal: CellCoord,
    steps: u32,
    rng: &mut R,
) -> Option<CellCoord>
where
    R: Rng + ?Sized,
{
    let dimensions = maze.dimensions();
    let mut current = start;
    let mut best = start;
    let mut best_distance = 0;
    let mut moves = 0;
    let mut attempts = FORWARD_ATTEMPTS;
    let mut open: Vec<(Direction, CellCoord)> = Vec::with_capacity(Direction::ALL.len());

    while moves < steps && attempts > 0 {
        attempts -= 1;

        open.clear();
        open.extend(maze.open_directions(current).filter_map(|direction| {
            dimensions
                .neighbor(current, direction)
                .map(|next| (direction, next))
        }));
        if open.is_empty() {
            break;
        }

        let here = current.manhattan_distance(start);
        let next = open
            .iter()
            .find(|(_, next)| next.manhattan_distance(start) > here)
            .copied()
            .unwrap_or_else(|| open[rng.gen_range(0..open.len())]);

        current = next.1;
        moves += 1;

        let distance = current.manhattan_distance(start);
        if distance > best_distance {
            best_distance = distance;
            best = current;
        }

        if current == goal {
            return Some(goal);
        }
    }

    (best_distance > 0).then_some(best)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Record {
    distance: u32,
    sequence: u64,
    cell: CellCoord,
    depth: u32,
}
