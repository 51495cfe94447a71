//! Round and session configuration.

use maze_chase_core::{CellCoord, GridDimensions};
use thiserror::Error;

/// Rows and columns of the reference maze.
pub const DEFAULT_GRID_SIDE: u32 = 20;

/// Catchers placed in the reference round.
pub const DEFAULT_CATCHERS: usize = 3;

/// Power-ups of each kind placed in the reference round.
pub const DEFAULT_POWERUPS_PER_KIND: usize = 3;

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 0x6d61_7a65;

/// Errors raised while validating a round configuration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The maze needs at least one row and one column.
    #[error("maze needs at least one row and one column (got {rows} rows, {columns} columns)")]
    EmptyGrid {
        /// Requested number of rows.
        rows: u32,
        /// Requested number of columns.
        columns: u32,
    },
    /// The cell count does not fit the coordinate type.
    #[error("maze of {rows} rows by {columns} columns is too large")]
    TooLarge {
        /// Requested number of rows.
        rows: u32,
        /// Requested number of columns.
        columns: u32,
    },
}

/// Shape and population of a single round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundConfig {
    rows: u32,
    columns: u32,
    catchers: usize,
    powerups_per_kind: usize,
}

impl RoundConfig {
    /// Validates and creates a round configuration.
    ///
    /// Entity counts are not validated: rounds on grids too small to hold
    /// them are played with fewer entities.
    pub fn new(
        rows: u32,
        columns: u32,
        catchers: usize,
        powerups_per_kind: usize,
    ) -> Result<Self, ConfigError> {
        if rows == 0 || columns == 0 {
            return Err(ConfigError::EmptyGrid { rows, columns });
        }
        if rows.checked_mul(columns).is_none() {
            return Err(ConfigError::TooLarge { rows, columns });
        }

        Ok(Self {
            rows,
            columns,
            catchers,
            powerups_per_kind,
        })
    }

    /// Number of maze rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of maze columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of catchers requested.
    #[must_use]
    pub const fn catchers(&self) -> usize {
        self.catchers
    }

    /// Number of power-ups requested for each kind.
    #[must_use]
    pub const fn powerups_per_kind(&self) -> usize {
        self.powerups_per_kind
    }

    /// Grid dimensions of the round.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        GridDimensions::new(self.columns, self.rows)
    }

    /// Cell the player starts on.
    #[must_use]
    pub const fn player_start(&self) -> CellCoord {
        CellCoord::new(0, 0)
    }

    /// Cell the player has to reach.
    #[must_use]
    pub fn goal(&self) -> CellCoord {
        self.dimensions().far_corner()
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_GRID_SIDE,
            columns: DEFAULT_GRID_SIDE,
            catchers: DEFAULT_CATCHERS,
            powerups_per_kind: DEFAULT_POWERUPS_PER_KIND,
        }
    }
}

/// Settings that live for the whole session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    seed: u64,
    round: RoundConfig,
}

impl SessionConfig {
    /// Creates a session configuration with the provided seed and first round.
    #[must_use]
    pub const fn new(seed: u64, round: RoundConfig) -> Self {
        Self { seed, round }
    }

    /// Seed of the session's random source.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Configuration of the first round.
    #[must_use]
    pub const fn round(&self) -> RoundConfig {
        self.round
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, RoundConfig::default())
    }
}
