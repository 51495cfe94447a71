#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that carves a fresh maze whenever a round is configured.

use maze_chase_core::{CellCoord, Command, Direction, Event, GridDimensions, Maze};
use rand::Rng;

/// Corner the carving walk starts from.
pub const START_CELL: CellCoord = CellCoord::new(0, 0);

/// Randomized depth-first carving ("recursive backtracker") with an explicit stack.
///
/// Every push marks one previously unvisited cell and opens exactly one wall,
/// so a grid of `n` cells ends up with `n - 1` passages and no cycles.
#[derive(Debug, Default)]
pub struct MazeGeneration {
    stack: Vec<CellCoord>,
    candidates: Vec<(Direction, CellCoord)>,
}

impl MazeGeneration {
    /// Creates a generator with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits an [`Command::InstallMaze`] for every round configured in `events`.
    pub fn handle<R>(&mut self, events: &[Event], rng: &mut R, out: &mut Vec<Command>)
    where
        R: Rng + ?Sized,
    {
        for event in events {
            if let Event::RoundConfigured { dimensions, .. } = event {
                let maze = self.carve(*dimensions, rng);
                out.push(Command::InstallMaze { maze });
            }
        }
    }

    /// Carves a spanning-tree maze over the provided grid.
    pub fn carve<R>(&mut self, dimensions: GridDimensions, rng: &mut R) -> Maze
    where
        R: Rng + ?Sized,
    {
        let mut maze = Maze::fully_walled(dimensions);
        self.stack.clear();

        if !maze.mark_visited(START_CELL) {
            return maze;
        }
        self.stack.push(START_CELL);

        while let Some(&current) = self.stack.last() {
            self.candidates.clear();
            self.candidates.extend(maze.unvisited_neighbors(current));

            if self.candidates.is_empty() {
                let _ = self.stack.pop();
                continue;
            }

            let (direction, next) = self.candidates[rng.gen_range(0..self.candidates.len())];
            let carved = maze.remove_wall(current, direction);
            debug_assert!(carved, "unvisited neighbours always lie inside the grid");
            let _ = maze.mark_visited(next);
            self.stack.push(next);
        }

        tracing::debug!(
            columns = dimensions.columns(),
            rows = dimensions.rows(),
            passages = maze.passage_count(),
            "carved maze"
        );
        maze
    }
}
