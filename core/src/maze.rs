//! Wall-based grid model shared by the generator, the world and the systems.

use serde::{Deserialize, Serialize};

use crate::{CellCoord, Direction, GridDimensions};

/// Wall flags on the four sides of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Walls {
    top: bool,
    right: bool,
    bottom: bool,
    left: bool,
}

impl Walls {
    /// Every side walled.
    pub const ALL: Walls = Walls {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    /// Reports whether the side facing `direction` is walled.
    #[must_use]
    pub const fn has(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.top,
            Direction::Right => self.right,
            Direction::Down => self.bottom,
            Direction::Left => self.left,
        }
    }

    fn clear(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.top = false,
            Direction::Right => self.right = false,
            Direction::Down => self.bottom = false,
            Direction::Left => self.left = false,
        }
    }
}

impl Default for Walls {
    fn default() -> Self {
        Self::ALL
    }
}

/// Single lattice cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    walls: Walls,
    visited: bool,
}

impl Cell {
    /// Wall flags of the cell.
    #[must_use]
    pub const fn walls(&self) -> Walls {
        self.walls
    }

    /// Whether the generator already reached this cell.
    #[must_use]
    pub const fn visited(&self) -> bool {
        self.visited
    }
}

/// Dense grid of cells stored in row-major order.
///
/// Walls are only ever removed in pairs through [`Maze::remove_wall`], so the
/// side of a cell facing a neighbour is open exactly when the neighbour's side
/// facing back is open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Maze {
    dimensions: GridDimensions,
    cells: Vec<Cell>,
}

impl Maze {
    /// Creates a grid where every cell keeps all four walls and is unvisited.
    #[must_use]
    pub fn fully_walled(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            cells: vec![Cell::default(); dimensions.cell_count()],
        }
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Cell stored at the provided coordinate, if it lies inside the grid.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.dimensions
            .index(coord)
            .and_then(|index| self.cells.get(index))
    }

    /// Marks the cell as reached by the generator. Returns `false` when it
    /// was already visited or lies outside the grid.
    pub fn mark_visited(&mut self, coord: CellCoord) -> bool {
        match self.cell_mut(coord) {
            Some(cell) if !cell.visited => {
                cell.visited = true;
                true
            }
            _ => false,
        }
    }

    /// In-bounds orthogonal neighbours not yet visited, paired with the
    /// direction leading to them. Only meaningful while generating.
    pub fn unvisited_neighbors(
        &self,
        coord: CellCoord,
    ) -> impl Iterator<Item = (Direction, CellCoord)> + '_ {
        Direction::ALL.into_iter().filter_map(move |direction| {
            let neighbor = self.dimensions.neighbor(coord, direction)?;
            let cell = self.cell(neighbor)?;
            (!cell.visited).then_some((direction, neighbor))
        })
    }

    /// Carves the wall on `direction` of `coord` together with the facing
    /// wall of its neighbour. Returns `false` without mutating anything when
    /// the neighbour lies outside the grid.
    pub fn remove_wall(&mut self, coord: CellCoord, direction: Direction) -> bool {
        let Some(neighbor) = self.dimensions.neighbor(coord, direction) else {
            return false;
        };
        if self.cell(coord).is_none() {
            return false;
        }

        if let Some(cell) = self.cell_mut(coord) {
            cell.walls.clear(direction);
        }
        if let Some(cell) = self.cell_mut(neighbor) {
            cell.walls.clear(direction.opposite());
        }
        true
    }

    /// Reports whether a single step from `coord` in `direction` is open.
    #[must_use]
    pub fn can_move(&self, coord: CellCoord, direction: Direction) -> bool {
        let Some(cell) = self.cell(coord) else {
            return false;
        };
        !cell.walls.has(direction) && self.dimensions.neighbor(coord, direction).is_some()
    }

    /// Directions a traveller may take from `coord`, in up/right/down/left order.
    pub fn open_directions(&self, coord: CellCoord) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.can_move(coord, *direction))
    }

    /// Number of carved passages, counting each shared edge once.
    #[must_use]
    pub fn passage_count(&self) -> usize {
        self.dimensions
            .cells()
            .map(|coord| {
                usize::from(self.can_move(coord, Direction::Right))
                    + usize::from(self.can_move(coord, Direction::Down))
            })
            .sum()
    }

    fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        let index = self.dimensions.index(coord)?;
        self.cells.get_mut(index)
    }
}
