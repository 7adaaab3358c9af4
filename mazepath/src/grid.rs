use std::fmt::Display;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{MazeError, Result};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Number of 4-directional moves between two points, ignoring walls
    pub fn manhattan(&self, other: &Point) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Neighbor order used everywhere adjacency is enumerated. Search tie-breaking depends on it.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    fn wall_index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::Up => "up",
                Direction::Right => "right",
                Direction::Down => "down",
                Direction::Left => "left",
            }
        )
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "right" => Ok(Direction::Right),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            _ => Err(anyhow::anyhow!("Invalid direction: {}", s)),
        }
    }
}

/// The four walls of a cell, indexed top, right, bottom, left
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Walls([bool; 4]);

impl Walls {
    pub const ALL: Walls = Walls([true; 4]);
    pub const NONE: Walls = Walls([false; 4]);

    pub fn has(&self, direction: Direction) -> bool {
        self.0[direction.wall_index()]
    }

    fn set(&mut self, direction: Direction, present: bool) {
        self.0[direction.wall_index()] = present;
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|w| **w).count()
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    #[default]
    Empty,
    Wall,
    Start,
    End,
    Frontier,
    Closed,
    Path,
}

impl CellKind {
    /// Kinds written by a search, as opposed to the ones placed by the user
    pub fn is_search_mark(&self) -> bool {
        matches!(self, CellKind::Frontier | CellKind::Closed | CellKind::Path)
    }
}

impl Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CellKind::Empty => " ",
                CellKind::Wall => "#",
                CellKind::Start => "S",
                CellKind::End => "E",
                CellKind::Frontier => "o",
                CellKind::Closed => ".",
                CellKind::Path => "*",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub walls: Walls,
    pub kind: CellKind,
    /// Only meaningful while a maze is being carved
    pub visited: bool,
}

/// How adjacency between neighboring cells is decided
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridVariant {
    /// Cells start fully walled and a maze is carved into them
    #[default]
    Maze,
    /// No walls between cells; whole cells are tagged `CellKind::Wall` instead
    Open,
}

static NEXT_GRID_ID: AtomicU64 = AtomicU64::new(0);

/// A rectangular grid of cells, stored row-major in a single vec
#[derive(Clone, Debug)]
pub struct Grid {
    rows: usize,
    columns: usize,
    variant: GridVariant,
    /// Unique per `Grid::new`, shared by clones
    id: u64,
    epoch: u64,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, columns: usize, variant: GridVariant) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(MazeError::InvalidDimensions { rows, columns });
        }

        let walls = match variant {
            GridVariant::Maze => Walls::ALL,
            GridVariant::Open => Walls::NONE,
        };

        Ok(Self {
            rows,
            columns,
            variant,
            id: NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed),
            epoch: 0,
            cells: vec![
                Cell {
                    walls,
                    ..Default::default()
                };
                rows * columns
            ],
        })
    }

    /// Tag the grid with the session epoch it belongs to
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn variant(&self) -> GridVariant {
        self.variant
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn is_valid(&self, point: Point) -> bool {
        point.row < self.rows && point.col < self.columns
    }

    fn index(&self, point: Point) -> Result<usize> {
        if self.is_valid(point) {
            Ok(point.row * self.columns + point.col)
        } else {
            Err(MazeError::OutOfBounds {
                row: point.row,
                col: point.col,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Result<&Cell> {
        self.cell(Point { row, col })
    }

    pub fn cell(&self, point: Point) -> Result<&Cell> {
        let index = self.index(point)?;
        Ok(&self.cells[index])
    }

    pub fn kind(&self, point: Point) -> Result<CellKind> {
        Ok(self.cell(point)?.kind)
    }

    /// Overwrite the kind of a cell and return the kind it had before
    pub fn set_kind(&mut self, point: Point, kind: CellKind) -> Result<CellKind> {
        let index = self.index(point)?;
        Ok(std::mem::replace(&mut self.cells[index].kind, kind))
    }

    pub fn has_wall(&self, point: Point, direction: Direction) -> Result<bool> {
        Ok(self.cell(point)?.walls.has(direction))
    }

    /// The in-bounds neighbor of `point` in `direction`, walls ignored
    pub fn neighbor(&self, point: Point, direction: Direction) -> Option<Point> {
        let next = match direction {
            Direction::Up => Point {
                row: point.row.checked_sub(1)?,
                col: point.col,
            },
            Direction::Right => Point {
                row: point.row,
                col: point.col + 1,
            },
            Direction::Down => Point {
                row: point.row + 1,
                col: point.col,
            },
            Direction::Left => Point {
                row: point.row,
                col: point.col.checked_sub(1)?,
            },
        };

        self.is_valid(next).then_some(next)
    }

    /// Neighbors reachable in one move from `point`, in up, right, down, left order
    pub fn neighbors_open(&self, point: Point) -> Result<impl Iterator<Item = Point>> {
        let cell = *self.cell(point)?;
        let mut points = Vec::with_capacity(4);

        for direction in Direction::ALL {
            let Some(next) = self.neighbor(point, direction) else {
                continue;
            };

            let open = match self.variant {
                GridVariant::Maze => !cell.walls.has(direction),
                GridVariant::Open => self.cells[self.offset(next)].kind != CellKind::Wall,
            };

            if open {
                points.push(next);
            }
        }

        Ok(points.into_iter())
    }

    /// Iterate over every point of the grid in row-major order
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |col| Point { row, col }))
    }

    /// Reset every cell except Start and End back to Empty.
    /// Returns the cells that changed, in row-major order.
    pub fn reset_kinds(&mut self) -> Vec<Point> {
        self.retag_where(|kind| !matches!(kind, CellKind::Empty | CellKind::Start | CellKind::End))
    }

    /// Reset only the marks left behind by a search (Frontier, Closed, Path)
    pub fn clear_search_marks(&mut self) -> Vec<Point> {
        self.retag_where(|kind| kind.is_search_mark())
    }

    fn retag_where(&mut self, clear: impl Fn(CellKind) -> bool) -> Vec<Point> {
        let mut changed = Vec::new();
        for point in self.points() {
            let index = self.offset(point);
            if clear(self.cells[index].kind) {
                self.cells[index].kind = CellKind::Empty;
                changed.push(point);
            }
        }
        changed
    }

    /// Number of open passages between neighboring cells
    pub fn passage_count(&self) -> usize {
        self.points()
            .map(|point| {
                [Direction::Right, Direction::Down]
                    .into_iter()
                    .filter(|d| {
                        self.neighbor(point, *d).is_some()
                            && !self.cells[self.offset(point)].walls.has(*d)
                    })
                    .count()
            })
            .sum()
    }

    /// Create a per-cell storage for values of type T with the same dimensions as the grid
    pub fn create_storage<T: Copy>(&self, default_value: T) -> CellStorage<T> {
        CellStorage {
            columns: self.columns,
            values: vec![default_value; self.rows * self.columns],
        }
    }

    // unchecked offset, only for points already known to be in bounds
    fn offset(&self, point: Point) -> usize {
        point.row * self.columns + point.col
    }

    /// Put every wall back up, forget carving progress and become a maze grid.
    /// Returns the cells whose Wall kind was cleared, in row-major order.
    pub(crate) fn seal(&mut self) -> Vec<Point> {
        self.variant = GridVariant::Maze;
        for cell in &mut self.cells {
            cell.walls = Walls::ALL;
            cell.visited = false;
        }
        self.retag_where(|kind| kind == CellKind::Wall)
    }

    pub(crate) fn is_visited(&self, point: Point) -> bool {
        self.cells[self.offset(point)].visited
    }

    pub(crate) fn mark_visited(&mut self, point: Point) {
        let index = self.offset(point);
        self.cells[index].visited = true;
    }

    /// Knock down the wall pair between `point` and its neighbor in `direction`.
    /// Returns the neighbor, or None when it lies outside the grid.
    pub(crate) fn remove_wall_between(&mut self, point: Point, direction: Direction) -> Option<Point> {
        let next = self.neighbor(point, direction)?;
        let (here, there) = (self.offset(point), self.offset(next));
        self.cells[here].walls.set(direction, false);
        self.cells[there].walls.set(direction.opposite(), false);
        Some(next)
    }
}

/// A per-cell side table with the dimensions of the grid it was created from
#[derive(Debug, Clone)]
pub struct CellStorage<T> {
    columns: usize,
    values: Vec<T>,
}

impl<T: Copy> CellStorage<T> {
    pub fn is_valid(&self, point: Point) -> bool {
        point.col < self.columns && point.row * self.columns + point.col < self.values.len()
    }

    pub fn get(&self, point: Point) -> T {
        self.values[point.row * self.columns + point.col]
    }

    pub fn get_mut(&mut self, point: Point) -> &mut T {
        &mut self.values[point.row * self.columns + point.col]
    }
}

impl<T: Display> Display for CellStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.values.chunks(self.columns) {
            for value in row {
                write!(f, "{}", value)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.variant {
            GridVariant::Open => {
                for row in self.cells.chunks(self.columns) {
                    for cell in row {
                        write!(f, "{}", cell.kind)?;
                    }
                    writeln!(f)?;
                }
            }
            GridVariant::Maze => {
                for row in self.cells.chunks(self.columns) {
                    for cell in row {
                        let top = if cell.walls.has(Direction::Up) { "---" } else { "   " };
                        write!(f, "+{}", top)?;
                    }
                    writeln!(f, "+")?;

                    for cell in row {
                        let left = if cell.walls.has(Direction::Left) { "|" } else { " " };
                        write!(f, "{} {} ", left, cell.kind)?;
                    }
                    let right = match row.last() {
                        Some(cell) if cell.walls.has(Direction::Right) => "|",
                        _ => " ",
                    };
                    writeln!(f, "{}", right)?;
                }

                // the bottom border comes from the last row's bottom walls
                if let Some(last_row) = self.cells.chunks(self.columns).last() {
                    for cell in last_row {
                        let bottom = if cell.walls.has(Direction::Down) { "---" } else { "   " };
                        write!(f, "+{}", bottom)?;
                    }
                    writeln!(f, "+")?;
                }
            }
        }

        Ok(())
    }
}
