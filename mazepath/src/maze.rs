use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::grid::{CellKind, Direction, Grid, Point};
use crate::observer::CellObserver;

/// Carves perfect mazes (exactly one simple path between any two cells) with
/// randomized depth-first backtracking
#[derive(Debug, Clone)]
pub struct MazeGenerator<R: Rng> {
    rng: R,
}

impl MazeGenerator<StdRng> {
    /// Same seed, same mazes
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> MazeGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Carve a maze into `grid`, returning the number of passages opened.
    ///
    /// Any previous walls and carving progress are discarded first, so the grid
    /// always ends up as a spanning tree over its cells.
    pub fn carve(&mut self, grid: &mut Grid, observer: &mut impl CellObserver) -> usize {
        for point in grid.seal() {
            observer.on_cell_changed(point, CellKind::Empty);
        }

        let mut stack: Vec<Point> = Vec::with_capacity(grid.rows() * grid.columns());
        let mut current = Point::new(0, 0);
        let mut carved = 0;
        grid.mark_visited(current);

        loop {
            let candidates: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|d| {
                    grid.neighbor(current, *d)
                        .is_some_and(|next| !grid.is_visited(next))
                })
                .collect();

            let step = candidates.choose(&mut self.rng).and_then(|direction| {
                grid.remove_wall_between(current, *direction)
                    .map(|next| (*direction, next))
            });

            match step {
                Some((direction, next)) => {
                    trace!("carved {} -> {} ({})", current, next, direction);
                    observer.on_passage_carved(current, next);

                    stack.push(current);
                    grid.mark_visited(next);
                    carved += 1;
                    current = next;
                }
                None => match stack.pop() {
                    Some(previous) => current = previous,
                    None => break,
                },
            }
        }

        debug!(
            "carved {}x{} maze with {} passages",
            grid.rows(),
            grid.columns(),
            carved
        );
        carved
    }
}

#[cfg(test)]
mod test {

    use std::collections::VecDeque;

    use super::*;
    use crate::grid::{CellStorage, GridVariant};
    use crate::observer::{ChangeLog, NoopObserver};

    fn reachable_from_origin(grid: &Grid) -> usize {
        let mut seen = grid.create_storage(false);
        let mut queue = VecDeque::from([Point::new(0, 0)]);
        *seen.get_mut(Point::new(0, 0)) = true;
        let mut count = 0;

        while let Some(point) = queue.pop_front() {
            count += 1;
            for next in grid.neighbors_open(point).unwrap() {
                if !seen.get(next) {
                    *seen.get_mut(next) = true;
                    queue.push_back(next);
                }
            }
        }

        count
    }

    fn assert_walls_symmetric(grid: &Grid) {
        for point in grid.points() {
            for direction in Direction::ALL {
                if let Some(next) = grid.neighbor(point, direction) {
                    assert_eq!(
                        grid.has_wall(point, direction).unwrap(),
                        grid.has_wall(next, direction.opposite()).unwrap(),
                        "asymmetric wall between {} and {}",
                        point,
                        next
                    );
                } else {
                    // the outer border always stays closed
                    assert!(grid.has_wall(point, direction).unwrap());
                }
            }
        }
    }

    /// Replays every reported carve onto a sealed copy of the grid, so wall
    /// symmetry is checked after each step and not only on the finished maze
    struct CarveReplay {
        shadow: Grid,
        reached: CellStorage<bool>,
        steps: usize,
    }

    impl CarveReplay {
        fn new(rows: usize, columns: usize) -> Self {
            let shadow = Grid::new(rows, columns, GridVariant::Maze).unwrap();
            let mut reached = shadow.create_storage(false);
            *reached.get_mut(Point::new(0, 0)) = true;
            Self {
                shadow,
                reached,
                steps: 0,
            }
        }
    }

    impl CellObserver for CarveReplay {
        fn on_cell_changed(&mut self, _point: Point, _kind: CellKind) {}

        fn on_passage_carved(&mut self, from: Point, to: Point) {
            // the passage grows the tree by exactly one new cell
            assert!(self.reached.get(from), "{} carved before it was reached", from);
            assert!(!self.reached.get(to), "{} reached twice", to);
            *self.reached.get_mut(to) = true;

            let direction = Direction::ALL
                .into_iter()
                .find(|d| self.shadow.neighbor(from, *d) == Some(to))
                .unwrap();
            self.shadow.remove_wall_between(from, direction).unwrap();
            self.steps += 1;
            assert_walls_symmetric(&self.shadow);
        }
    }

    #[test]
    fn test_walls_symmetric_after_every_step() {
        for seed in 0..6 {
            let mut grid = Grid::new(5, 7, GridVariant::Maze).unwrap();
            let mut replay = CarveReplay::new(5, 7);
            let carved = MazeGenerator::from_seed(seed).carve(&mut grid, &mut replay);

            assert_eq!(replay.steps, carved);
            // the replayed steps are all the carve did to the walls
            let walls = |g: &Grid| g.cells().iter().map(|c| c.walls).collect::<Vec<_>>();
            assert_eq!(walls(&replay.shadow), walls(&grid));
        }
    }

    #[test]
    fn test_perfect_maze_for_many_sizes() {
        for rows in 1..=6 {
            for columns in 1..=7 {
                for seed in 0..4 {
                    let mut grid = Grid::new(rows, columns, GridVariant::Maze).unwrap();
                    let carved = MazeGenerator::from_seed(seed).carve(&mut grid, &mut NoopObserver);

                    let cells = rows * columns;
                    assert_eq!(carved, cells - 1);
                    assert_eq!(grid.passage_count(), cells - 1);
                    assert_eq!(reachable_from_origin(&grid), cells);
                    assert!(grid.cells().iter().all(|c| c.visited));
                    assert_walls_symmetric(&grid);

                    // each passage removes one wall from both of its cells
                    let removed: usize =
                        grid.cells().iter().map(|c| 4 - c.walls.count()).sum();
                    assert_eq!(removed, 2 * (cells - 1));
                }
            }
        }
    }

    #[test]
    fn test_single_cell_maze() {
        let mut grid = Grid::new(1, 1, GridVariant::Maze).unwrap();
        let mut log = ChangeLog::default();
        assert_eq!(MazeGenerator::from_seed(1).carve(&mut grid, &mut log), 0);
        assert!(log.carved.is_empty());
        assert!(log.changes.is_empty());
    }

    #[test]
    fn test_same_seed_same_maze() {
        let mut first = Grid::new(8, 8, GridVariant::Maze).unwrap();
        let mut second = Grid::new(8, 8, GridVariant::Maze).unwrap();
        let mut first_log = ChangeLog::default();
        let mut second_log = ChangeLog::default();

        MazeGenerator::from_seed(42).carve(&mut first, &mut first_log);
        MazeGenerator::from_seed(42).carve(&mut second, &mut second_log);

        assert_eq!(first.cells(), second.cells());
        assert_eq!(first_log, second_log);
        assert_eq!(first_log.carved.len(), 63);
        // every carve starts from a cell that was already part of the maze
        assert_eq!(first_log.carved[0].0, Point::new(0, 0));
    }

    #[test]
    fn test_carve_replaces_previous_layout() {
        let mut grid = Grid::new(4, 4, GridVariant::Open).unwrap();
        grid.set_kind(Point::new(1, 1), CellKind::Wall).unwrap();
        grid.set_kind(Point::new(0, 0), CellKind::Start).unwrap();

        let mut generator = MazeGenerator::from_seed(7);
        let mut log = ChangeLog::default();
        generator.carve(&mut grid, &mut log);
        // the cleared wall is reported, the start is left alone
        assert_eq!(log.changes, vec![(Point::new(1, 1), CellKind::Empty)]);

        // carving twice still yields a spanning tree
        log.clear();
        generator.carve(&mut grid, &mut log);
        assert!(log.changes.is_empty());
        assert_eq!(log.carved.len(), 15);

        assert_eq!(grid.variant(), GridVariant::Maze);
        assert_eq!(grid.kind(Point::new(1, 1)).unwrap(), CellKind::Empty);
        assert_eq!(grid.kind(Point::new(0, 0)).unwrap(), CellKind::Start);
        assert_eq!(grid.passage_count(), 15);
        assert_eq!(reachable_from_origin(&grid), 16);
        assert_walls_symmetric(&grid);
    }
}
