#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Chase engine.
//!
//! This crate defines the message surface that connects the session, the
//! authoritative world, and pure systems. Callers submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

mod clock;
mod maze;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use clock::{Clock, ManualClock, SystemClock};
pub use maze::{Cell, Maze, Walls};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Maze Chase.";

/// Duration an activated invisibility power-up keeps the player hidden.
pub const INVISIBILITY_DURATION: Duration = Duration::from_millis(5_000);

/// Number of positions remembered by each catcher to avoid backtracking.
pub const CATCHER_HISTORY_LEN: usize = 5;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards the current round and lays out a fully walled grid.
    ConfigureRound {
        /// Number of columns and rows of the new grid.
        dimensions: GridDimensions,
        /// Cell the player starts the round on.
        player_start: CellCoord,
        /// Cell the player must reach to win the round.
        goal: CellCoord,
    },
    /// Replaces the fully walled grid with a carved maze.
    InstallMaze {
        /// Maze produced by the generation system.
        maze: Maze,
    },
    /// Requests that a catcher be created at the provided cell.
    SpawnCatcher {
        /// Cell the catcher starts on.
        cell: CellCoord,
    },
    /// Requests that a power-up be placed at the provided cell.
    SpawnPowerup {
        /// Cell holding the power-up.
        cell: CellCoord,
        /// Ability granted once the power-up is collected.
        kind: PowerupKind,
    },
    /// Advances the simulation clock to the provided instant.
    Tick {
        /// Time elapsed since the session started.
        now: Duration,
    },
    /// Requests that a catcher advance a single step in the specified direction.
    StepCatcher {
        /// Identifier of the catcher attempting to move.
        catcher: CatcherId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Runs the end-of-tick checks: collision, power-up pickup, goal and invisibility expiry.
    ResolveInteractions,
    /// Requests that the player advance a single step in the specified direction.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Spends one held invisibility power-up.
    ActivateInvisibility {
        /// Instant the activation happened, used to expire the effect.
        at: Duration,
    },
    /// Raises the player's teleport guard before a teleport search runs.
    BeginTeleport,
    /// Lowers the teleport guard and applies the outcome of the search.
    CompleteTeleport {
        /// Cell the player should land on, or `None` when the search failed.
        destination: Option<CellCoord>,
        /// Search strategy that produced the outcome.
        route: TeleportRoute,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a new round was laid out.
    RoundConfigured {
        /// Dimensions of the new grid.
        dimensions: GridDimensions,
        /// Cell the player starts on.
        player_start: CellCoord,
        /// Cell the player must reach.
        goal: CellCoord,
    },
    /// Confirms that a carved maze replaced the fully walled grid.
    MazeInstalled {
        /// Number of open passages between adjacent cells.
        passages: usize,
    },
    /// Confirms that a catcher was created.
    CatcherSpawned {
        /// Identifier assigned to the catcher.
        catcher: CatcherId,
        /// Cell the catcher occupies after spawning.
        cell: CellCoord,
    },
    /// Confirms that a power-up was placed.
    PowerupSpawned {
        /// Identifier assigned to the power-up.
        powerup: PowerupId,
        /// Ability granted by the power-up.
        kind: PowerupKind,
        /// Cell holding the power-up.
        cell: CellCoord,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Time elapsed since the session started.
        now: Duration,
    },
    /// Confirms that a catcher moved between two cells.
    CatcherAdvanced {
        /// Identifier of the catcher that moved.
        catcher: CatcherId,
        /// Cell the catcher occupied before moving.
        from: CellCoord,
        /// Cell the catcher occupies after moving.
        to: CellCoord,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell the player occupied before moving.
        from: CellCoord,
        /// Cell the player occupies after moving.
        to: CellCoord,
    },
    /// Reports that a catcher shares the visible player's cell. Ends the round.
    PlayerCaught {
        /// First catcher found on the player's cell.
        catcher: CatcherId,
        /// Cell where the capture happened.
        cell: CellCoord,
    },
    /// Reports that the player picked up a power-up.
    PowerupCollected {
        /// Identifier of the collected power-up.
        powerup: PowerupId,
        /// Ability that was added to the player's inventory.
        kind: PowerupKind,
    },
    /// Reports that the player stands on the goal. Ends the round.
    GoalReached {
        /// Goal cell.
        cell: CellCoord,
    },
    /// Confirms that the player turned invisible.
    InvisibilityActivated {
        /// Instant at which the effect wears off.
        expires_at: Duration,
    },
    /// Reports that the invisibility effect wore off.
    InvisibilityExpired,
    /// Reports that a power-up could not be activated.
    ActivationRejected {
        /// Power-up the caller attempted to activate.
        kind: PowerupKind,
        /// Specific reason the activation failed.
        reason: ActivationError,
    },
    /// Confirms that the teleport guard was raised.
    TeleportStarted {
        /// Cell the player occupied when the search began.
        from: CellCoord,
    },
    /// Reports that a teleport request was refused before any search ran.
    TeleportRejected {
        /// Specific reason the request failed.
        reason: TeleportError,
    },
    /// Confirms that the player was teleported and a charge was spent.
    PlayerTeleported {
        /// Cell the player occupied before teleporting.
        from: CellCoord,
        /// Cell the player occupies after teleporting.
        to: CellCoord,
        /// Search strategy that produced the destination.
        route: TeleportRoute,
    },
    /// Reports that the teleport search left the player in place.
    TeleportFailed {
        /// Cell the player still occupies.
        at: CellCoord,
        /// Search strategy that was attempted last.
        route: TeleportRoute,
    },
}

/// Cardinal movement directions, listed in the order every system scans them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing column indices.
    Right,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
}

impl Direction {
    /// All directions in scan order: up, right, down, left.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Direction pointing back the way this one came.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Size of the rectangular cell lattice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    columns: u32,
    rows: u32,
}

impl GridDimensions {
    /// Creates a new dimension descriptor.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major offset of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Cell reached by one step in `direction`, if it stays inside the grid.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let next = match direction {
            Direction::Up => CellCoord::new(cell.column(), cell.row().checked_sub(1)?),
            Direction::Right => CellCoord::new(cell.column().checked_add(1)?, cell.row()),
            Direction::Down => CellCoord::new(cell.column(), cell.row().checked_add(1)?),
            Direction::Left => CellCoord::new(cell.column().checked_sub(1)?, cell.row()),
        };
        self.contains(next).then_some(next)
    }

    /// Iterator over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }

    /// Cell diagonally opposite the origin corner.
    #[must_use]
    pub fn far_corner(&self) -> CellCoord {
        CellCoord::new(self.columns.saturating_sub(1), self.rows.saturating_sub(1))
    }
}

/// Unique identifier assigned to a catcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatcherId(u32);

impl CatcherId {
    /// Creates a new catcher identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a power-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PowerupId(u32);

impl PowerupId {
    /// Creates a new power-up identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Abilities a power-up can grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Hides the player from catchers for [`INVISIBILITY_DURATION`].
    Invisibility,
    /// Jumps the player toward the goal.
    Teleportation,
}

impl PowerupKind {
    /// Human readable label used in logs and adapters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Invisibility => "invisibility",
            Self::Teleportation => "teleportation",
        }
    }
}

/// Count of power-ups the player carries, per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HeldPowerups {
    invisibility: u32,
    teleportation: u32,
}

impl HeldPowerups {
    /// Creates an inventory with explicit counts.
    #[must_use]
    pub const fn new(invisibility: u32, teleportation: u32) -> Self {
        Self {
            invisibility,
            teleportation,
        }
    }

    /// Number of power-ups of the given kind.
    #[must_use]
    pub const fn count(&self, kind: PowerupKind) -> u32 {
        match kind {
            PowerupKind::Invisibility => self.invisibility,
            PowerupKind::Teleportation => self.teleportation,
        }
    }

    /// Adds one power-up of the given kind.
    pub fn add(&mut self, kind: PowerupKind) {
        let slot = self.slot_mut(kind);
        *slot = slot.saturating_add(1);
    }

    /// Removes one power-up of the given kind, reporting whether one was held.
    pub fn spend(&mut self, kind: PowerupKind) -> bool {
        let slot = self.slot_mut(kind);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    fn slot_mut(&mut self, kind: PowerupKind) -> &mut u32 {
        match kind {
            PowerupKind::Invisibility => &mut self.invisibility,
            PowerupKind::Teleportation => &mut self.teleportation,
        }
    }
}

/// Canonical representation of the cell the player must reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Goal {
    cell: CellCoord,
}

impl Goal {
    /// Creates a goal anchored at the provided cell coordinate.
    #[must_use]
    pub const fn at(cell: CellCoord) -> Self {
        Self { cell }
    }

    /// Returns the cell that defines the goal.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }
}

/// Lifecycle of a single round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoundStatus {
    /// Catchers are moving and the player accepts input.
    #[default]
    InProgress,
    /// A catcher reached the visible player.
    Caught,
    /// The player reached the goal.
    Won,
}

/// Reasons an invisibility activation may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationError {
    /// The player holds no power-up of the requested kind.
    NoneHeld,
    /// The round already ended.
    RoundOver,
}

/// Reasons a teleport request may be rejected before searching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeleportError {
    /// A teleport search is already running for the player.
    AlreadyInProgress,
    /// The player holds no teleportation power-up.
    NoneHeld,
    /// The round already ended.
    RoundOver,
}

/// Strategy that produced a teleport outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeleportRoute {
    /// The goal-biased search found a cell closer to the goal.
    Direct,
    /// The forward walk away from the start was used instead.
    Fallback {
        /// Why the goal-biased search was abandoned.
        reason: FallbackReason,
    },
}

/// Reasons the goal-biased teleport search hands over to the forward walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallbackReason {
    /// The search exceeded its wall-clock budget.
    TimedOut,
    /// The best candidate was not closer to the goal than the start.
    NoProgress,
    /// Every reachable cell was explored without meeting the stop condition.
    FrontierExhausted,
}

/// Immutable representation of the player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Cell currently occupied by the player.
    pub cell: CellCoord,
    /// Instant invisibility was activated, while the effect lasts.
    pub invisible_since: Option<Duration>,
    /// Power-ups carried by the player.
    pub held: HeldPowerups,
    /// Whether a teleport search currently holds the guard.
    pub teleporting: bool,
}

impl PlayerSnapshot {
    /// Reports whether catchers currently ignore the player.
    #[must_use]
    pub const fn is_invisible(&self) -> bool {
        self.invisible_since.is_some()
    }
}

/// Immutable representation of a single catcher's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CatcherSnapshot {
    /// Unique identifier assigned to the catcher.
    pub id: CatcherId,
    /// Grid cell currently occupied by the catcher.
    pub cell: CellCoord,
}

/// Read-only snapshot describing all catchers within the maze.
#[derive(Clone, Debug, Default)]
pub struct CatcherView {
    snapshots: Vec<CatcherSnapshot>,
}

impl CatcherView {
    /// Creates a new catcher view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CatcherSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured catcher snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CatcherSnapshot> {
        self.snapshots.iter()
    }

    /// Number of catchers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no catchers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CatcherSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single power-up used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PowerupSnapshot {
    /// Unique identifier assigned to the power-up.
    pub id: PowerupId,
    /// Ability granted by the power-up.
    pub kind: PowerupKind,
    /// Cell holding the power-up.
    pub cell: CellCoord,
    /// Whether the player already picked the power-up up.
    pub collected: bool,
}

/// Read-only snapshot describing all power-ups of the round.
#[derive(Clone, Debug, Default)]
pub struct PowerupView {
    snapshots: Vec<PowerupSnapshot>,
}

impl PowerupView {
    /// Creates a new power-up view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PowerupSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured power-up snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &PowerupSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over power-ups that are still waiting to be collected.
    pub fn uncollected(&self) -> impl Iterator<Item = &PowerupSnapshot> {
        self.snapshots.iter().filter(|snapshot| !snapshot.collected)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PowerupSnapshot> {
        self.snapshots
    }
}
