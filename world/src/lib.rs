#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative round state management for Maze Chase.

pub mod resolution;

use std::time::Duration;

use maze_chase_core::{
    ActivationError, CatcherId, CatcherSnapshot, CatcherView, CellCoord, Command, Direction, Event,
    Goal, GridDimensions, HeldPowerups, Maze, PlayerSnapshot, PowerupId, PowerupKind,
    PowerupSnapshot, PowerupView, RoundStatus, TeleportError, TeleportRoute,
    INVISIBILITY_DURATION, WELCOME_BANNER,
};

const DEFAULT_DIMENSIONS: GridDimensions = GridDimensions::new(20, 20);

/// Represents the authoritative state of a single maze round.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    maze: Maze,
    goal: Goal,
    player: Player,
    catchers: Vec<Catcher>,
    powerups: Vec<Powerup>,
    status: RoundStatus,
    now: Duration,
    tick_index: u64,
    next_catcher_id: u32,
    next_powerup_id: u32,
}

impl World {
    /// Creates a fully walled default round with the player and goal in opposite corners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            maze: Maze::fully_walled(DEFAULT_DIMENSIONS),
            goal: Goal::at(DEFAULT_DIMENSIONS.far_corner()),
            player: Player::at(CellCoord::new(0, 0)),
            catchers: Vec::new(),
            powerups: Vec::new(),
            status: RoundStatus::InProgress,
            now: Duration::ZERO,
            tick_index: 0,
            next_catcher_id: 0,
            next_powerup_id: 0,
        }
    }

    fn reset_round(&mut self, dimensions: GridDimensions, player_start: CellCoord, goal: CellCoord) {
        self.maze = Maze::fully_walled(dimensions);
        self.goal = Goal::at(goal);
        self.player = Player::at(player_start);
        self.catchers.clear();
        self.powerups.clear();
        self.status = RoundStatus::InProgress;
        self.tick_index = 0;
        self.next_catcher_id = 0;
        self.next_powerup_id = 0;
    }

    fn in_progress(&self) -> bool {
        self.status == RoundStatus::InProgress
    }

    fn catcher_mut(&mut self, catcher: CatcherId) -> Option<&mut Catcher> {
        self.catchers.iter_mut().find(|entry| entry.id == catcher)
    }

    fn player_snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            cell: self.player.cell,
            invisible_since: self.player.invisible_since,
            held: self.player.held,
            teleporting: self.player.teleporting,
        }
    }

    fn catcher_view(&self) -> CatcherView {
        CatcherView::from_snapshots(
            self.catchers
                .iter()
                .map(|catcher| CatcherSnapshot {
                    id: catcher.id,
                    cell: catcher.cell,
                })
                .collect(),
        )
    }

    fn powerup_view(&self) -> PowerupView {
        PowerupView::from_snapshots(
            self.powerups
                .iter()
                .map(|powerup| PowerupSnapshot {
                    id: powerup.id,
                    kind: powerup.kind,
                    cell: powerup.cell,
                    collected: powerup.collected,
                })
                .collect(),
        )
    }

    fn resolve_interactions(&mut self, out_events: &mut Vec<Event>) {
        let player = self.player_snapshot();

        if let Some(catcher) = resolution::catcher_on_player(&player, &self.catcher_view()) {
            self.status = RoundStatus::Caught;
            out_events.push(Event::PlayerCaught {
                catcher,
                cell: player.cell,
            });
        }

        let collectable: Vec<PowerupId> =
            resolution::collectable_powerups(&player, &self.powerup_view())
                .map(|powerup| powerup.id)
                .collect();
        for powerup in self
            .powerups
            .iter_mut()
            .filter(|powerup| collectable.contains(&powerup.id))
        {
            powerup.collected = true;
            self.player.held.add(powerup.kind);
            out_events.push(Event::PowerupCollected {
                powerup: powerup.id,
                kind: powerup.kind,
            });
        }

        if resolution::reached_goal(&player, self.goal) {
            if self.status == RoundStatus::InProgress {
                self.status = RoundStatus::Won;
            }
            out_events.push(Event::GoalReached {
                cell: self.goal.cell(),
            });
        }

        if resolution::invisibility_expired(&player, self.now) {
            self.player.invisible_since = None;
            out_events.push(Event::InvisibilityExpired);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureRound {
            dimensions,
            player_start,
            goal,
        } => {
            world.reset_round(dimensions, player_start, goal);
            out_events.push(Event::RoundConfigured {
                dimensions,
                player_start,
                goal,
            });
        }
        Command::InstallMaze { maze } => {
            if maze.dimensions() != world.maze.dimensions() {
                return;
            }
            let passages = maze.passage_count();
            world.maze = maze;
            out_events.push(Event::MazeInstalled { passages });
        }
        Command::SpawnCatcher { cell } => {
            if !world.maze.dimensions().contains(cell) {
                return;
            }
            let catcher = CatcherId::new(world.next_catcher_id);
            world.next_catcher_id = world.next_catcher_id.saturating_add(1);
            world.catchers.push(Catcher { id: catcher, cell });
            out_events.push(Event::CatcherSpawned { catcher, cell });
        }
        Command::SpawnPowerup { cell, kind } => {
            if !world.maze.dimensions().contains(cell) {
                return;
            }
            let powerup = PowerupId::new(world.next_powerup_id);
            world.next_powerup_id = world.next_powerup_id.saturating_add(1);
            world.powerups.push(Powerup {
                id: powerup,
                kind,
                cell,
                collected: false,
            });
            out_events.push(Event::PowerupSpawned {
                powerup,
                kind,
                cell,
            });
        }
        Command::Tick { now } => {
            if !world.in_progress() {
                return;
            }
            world.now = world.now.max(now);
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { now: world.now });
        }
        Command::StepCatcher { catcher, direction } => {
            if !world.in_progress() {
                return;
            }
            let Some(from) = world
                .catchers
                .iter()
                .find(|entry| entry.id == catcher)
                .map(|entry| entry.cell)
            else {
                return;
            };
            let Some(to) = open_step(&world.maze, from, direction) else {
                return;
            };
            if let Some(state) = world.catcher_mut(catcher) {
                state.cell = to;
            }
            out_events.push(Event::CatcherAdvanced { catcher, from, to });
        }
        Command::ResolveInteractions => {
            if world.in_progress() {
                world.resolve_interactions(out_events);
            }
        }
        Command::MovePlayer { direction } => {
            if !world.in_progress() {
                return;
            }
            let from = world.player.cell;
            if let Some(to) = open_step(&world.maze, from, direction) {
                world.player.cell = to;
                out_events.push(Event::PlayerMoved { from, to });
            }
        }
        Command::ActivateInvisibility { at } => {
            let kind = PowerupKind::Invisibility;
            if !world.in_progress() {
                out_events.push(Event::ActivationRejected {
                    kind,
                    reason: ActivationError::RoundOver,
                });
                return;
            }
            if !world.player.held.spend(kind) {
                out_events.push(Event::ActivationRejected {
                    kind,
                    reason: ActivationError::NoneHeld,
                });
                return;
            }
            world.player.invisible_since = Some(at);
            out_events.push(Event::InvisibilityActivated {
                expires_at: at.saturating_add(INVISIBILITY_DURATION),
            });
        }
        Command::BeginTeleport => {
            let rejection = if !world.in_progress() {
                Some(TeleportError::RoundOver)
            } else if world.player.teleporting {
                Some(TeleportError::AlreadyInProgress)
            } else if world.player.held.count(PowerupKind::Teleportation) == 0 {
                Some(TeleportError::NoneHeld)
            } else {
                None
            };

            if let Some(reason) = rejection {
                out_events.push(Event::TeleportRejected { reason });
                return;
            }

            world.player.teleporting = true;
            out_events.push(Event::TeleportStarted {
                from: world.player.cell,
            });
        }
        Command::CompleteTeleport { destination, route } => {
            if !world.player.teleporting {
                return;
            }
            world.player.teleporting = false;
            complete_teleport(world, destination, route, out_events);
        }
    }
}

fn complete_teleport(
    world: &mut World,
    destination: Option<CellCoord>,
    route: TeleportRoute,
    out_events: &mut Vec<Event>,
) {
    let from = world.player.cell;
    let landing = destination
        .filter(|cell| *cell != from && world.maze.dimensions().contains(*cell));

    match landing {
        Some(to) if world.player.held.spend(PowerupKind::Teleportation) => {
            world.player.cell = to;
            out_events.push(Event::PlayerTeleported { from, to, route });
        }
        _ => out_events.push(Event::TeleportFailed { at: from, route }),
    }
}

fn open_step(maze: &Maze, from: CellCoord, direction: Direction) -> Option<CellCoord> {
    if !maze.can_move(from, direction) {
        return None;
    }
    maze.dimensions().neighbor(from, direction)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use maze_chase_core::{
        CatcherView, Goal, GridDimensions, HeldPowerups, Maze, PlayerSnapshot, PowerupView,
        RoundStatus,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the maze walls.
    #[must_use]
    pub fn maze(world: &World) -> &Maze {
        &world.maze
    }

    /// Dimensions of the current round's grid.
    #[must_use]
    pub fn dimensions(world: &World) -> GridDimensions {
        world.maze.dimensions()
    }

    /// Goal the player must reach this round.
    #[must_use]
    pub fn goal(world: &World) -> Goal {
        world.goal
    }

    /// Captures the player's position, inventory and flags.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player_snapshot()
    }

    /// Power-ups the player currently carries.
    #[must_use]
    pub fn held_powerups(world: &World) -> HeldPowerups {
        world.player.held
    }

    /// Captures a read-only view of the catchers inhabiting the maze.
    #[must_use]
    pub fn catcher_view(world: &World) -> CatcherView {
        world.catcher_view()
    }

    /// Captures a read-only view of every power-up placed this round.
    #[must_use]
    pub fn powerup_view(world: &World) -> PowerupView {
        world.powerup_view()
    }

    /// Lifecycle state of the round.
    #[must_use]
    pub fn status(world: &World) -> RoundStatus {
        world.status
    }

    /// Reports whether a catcher ended the round.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.status == RoundStatus::Caught
    }

    /// Reports whether a visible player currently shares a cell with a catcher.
    #[must_use]
    pub fn is_player_caught(world: &World) -> bool {
        super::resolution::check_collision(&world.player_snapshot(), &world.catcher_view())
    }

    /// Simulation time recorded by the most recent tick.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Number of ticks processed since the round was configured.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[derive(Clone, Debug)]
struct Player {
    cell: CellCoord,
    invisible_since: Option<Duration>,
    held: HeldPowerups,
    teleporting: bool,
}

impl Player {
    fn at(cell: CellCoord) -> Self {
        Self {
            cell,
            invisible_since: None,
            held: HeldPowerups::default(),
            teleporting: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Catcher {
    id: CatcherId,
    cell: CellCoord,
}

#[derive(Clone, Copy, Debug)]
struct Powerup {
    id: PowerupId,
    kind: PowerupKind,
    cell: CellCoord,
    collected: bool,
}
