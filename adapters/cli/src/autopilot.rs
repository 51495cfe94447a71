//! Scripted player used by the command-line adapter.

use std::collections::VecDeque;

use maze_chase_core::{CellCoord, Clock, Direction, Maze, PowerupKind};
use maze_chase_session::Session;
use maze_chase_world::query;

/// Plays a round on its own: walks the maze path to the goal, turns invisible
/// when a catcher comes close and teleports whenever it holds a charge.
#[derive(Debug)]
pub(crate) struct Autopilot {
    step_every: u32,
    waited: u32,
}

impl Autopilot {
    pub(crate) fn new(step_every: u32) -> Self {
        Self {
            step_every: step_every.max(1),
            waited: 0,
        }
    }

    /// Takes at most one action, returning a message describing it when notable.
    pub(crate) fn act<C: Clock>(&mut self, session: &mut Session<C>) -> Option<String> {
        let world = session.world();
        let player = query::player(world);

        if player.held.count(PowerupKind::Teleportation) > 0 {
            let message = if session.request_teleport() {
                "Teleported!"
            } else {
                "Teleportation failed!"
            };
            return Some(message.to_owned());
        }

        let threatened = query::catcher_view(world)
            .iter()
            .any(|catcher| catcher.cell.manhattan_distance(player.cell) <= 1);
        if threatened
            && !player.is_invisible()
            && player.held.count(PowerupKind::Invisibility) > 0
            && session.activate_powerup(PowerupKind::Invisibility)
        {
            return Some("Invisibility activated!".to_owned());
        }

        self.waited += 1;
        if self.waited < self.step_every {
            return None;
        }
        self.waited = 0;

        let world = session.world();
        let goal = query::goal(world).cell();
        if let Some(direction) = next_step(query::maze(world), player.cell, goal) {
            let _ = session.move_player(direction);
        }
        None
    }
}

/// First move along the open path from `from` to `to`.
pub(crate) fn next_step(maze: &Maze, from: CellCoord, to: CellCoord) -> Option<Direction> {
    let dimensions = maze.dimensions();
    if from == to {
        return None;
    }

    let mut first_move: Vec<Option<Direction>> = vec![None; dimensions.cell_count()];
    let mut seen = vec![false; dimensions.cell_count()];
    let mut queue = VecDeque::new();
    seen[dimensions.index(from)?] = true;
    queue.push_back(from);

    while let Some(cell) = queue.pop_front() {
        let inherited = first_move[dimensions.index(cell)?];
        for direction in maze.open_directions(cell) {
            let Some(next) = dimensions.neighbor(cell, direction) else {
                continue;
            };
            let index = dimensions.index(next)?;
            if seen[index] {
                continue;
            }
            seen[index] = true;
            let step = inherited.or(Some(direction));
            if next == to {
                return step;
            }
            first_move[index] = step;
            queue.push_back(next);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_core::{GridDimensions, ManualClock};
    use maze_chase_session::{RoundConfig, SessionConfig};

    #[test]
    fn next_step_follows_the_only_opening() {
        let mut maze = Maze::fully_walled(GridDimensions::new(2, 2));
        assert!(maze.remove_wall(CellCoord::new(0, 0), Direction::Down));
        assert!(maze.remove_wall(CellCoord::new(0, 1), Direction::Right));
        assert!(maze.remove_wall(CellCoord::new(1, 1), Direction::Up));

        assert_eq!(
            next_step(&maze, CellCoord::new(0, 0), CellCoord::new(1, 0)),
            Some(Direction::Down)
        );
        assert_eq!(
            next_step(&maze, CellCoord::new(1, 1), CellCoord::new(1, 0)),
            Some(Direction::Up)
        );
        assert_eq!(next_step(&maze, CellCoord::new(1, 0), CellCoord::new(1, 0)), None);
    }

    #[test]
    fn unreachable_goal_has_no_step() {
        let maze = Maze::fully_walled(GridDimensions::new(3, 3));
        assert_eq!(
            next_step(&maze, CellCoord::new(0, 0), CellCoord::new(2, 2)),
            None
        );
    }

    #[test]
    fn autopilot_reaches_goal_of_empty_round() {
        let round = RoundConfig::new(6, 6, 0, 0).expect("valid round");
        let mut session = Session::new(SessionConfig::new(9, round), ManualClock::default());
        let mut autopilot = Autopilot::new(1);

        for _ in 0..200 {
            let _ = autopilot.act(&mut session);
            let _ = session.tick();
        }

        assert_eq!(
            query::status(session.world()),
            maze_chase_core::RoundStatus::Won
        );
    }
}
