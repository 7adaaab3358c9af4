use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    fmt::Display,
    ops::{Deref, DerefMut},
};

use log::{debug, trace};
use serde::Serialize;

use crate::error::{MazeError, Result};
use crate::grid::{CellKind, CellStorage, Grid, Point};
use crate::observer::CellObserver;

/// Manhattan distance, admissible and consistent for unit-cost 4-directional moves
pub fn heuristic(from: Point, to: Point) -> usize {
    from.manhattan(&to)
}

/// The objects that we store in the priority queue
#[derive(Debug, PartialEq, Eq)]
struct ToVisit {
    f_score: usize,
    order: u64,
    g_score: usize,
    point: Point,
}

impl Ord for ToVisit {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed for BinaryHeap to be a min-heap, earlier insertions win ties
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for ToVisit {
    fn partial_cmp(&self, other: &ToVisit) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisitedItem {
    /// Best known number of moves from the start
    pub cost: usize,
    pub from: Option<Point>,
}

/// Best known route to a cell, if the search has reached it at all
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Visited(Option<VisitedItem>);

impl Deref for Visited {
    type Target = Option<VisitedItem>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for Visited {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
impl Display for Visited {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(item) => write!(f, "{:03} ", item.cost),
            None => write!(f, "{:>3} ", ""),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Eq, Serialize)]
pub struct PathResult {
    /// Every cell from start to goal, both included
    pub path: Vec<Point>,
    pub start: Point,
    pub goal: Point,
    pub total_cost: usize,
}

impl PathResult {
    /// Number of moves along the path
    pub fn len(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepResult {
    InProgress,
    Found(PathResult),
    Exhausted,
}

impl StepResult {
    pub fn is_done(&self) -> bool {
        !matches!(self, StepResult::InProgress)
    }
}

/// Incremental A* search between two cells of a grid.
///
/// Each call to [`PathFinder::step`] expands at most one cell, so a caller can
/// interleave the search with rendering at whatever pace it likes.
#[derive(Debug)]
pub struct PathFinder {
    start: Point,
    goal: Point,
    grid_id: u64,
    epoch: u64,
    visited: CellStorage<Visited>,
    closed: CellStorage<bool>,
    in_frontier: CellStorage<bool>,
    visit_list: BinaryHeap<ToVisit>,
    insertions: u64,
    expanded: usize,
    state: StepResult,
}

impl PathFinder {
    pub fn new(grid: &Grid, start: Point, goal: Point) -> Result<Self> {
        if !grid.is_valid(start) || !grid.is_valid(goal) {
            return Err(MazeError::InvalidEndpoints { start, goal });
        }

        let mut finder = Self {
            start,
            goal,
            grid_id: grid.id(),
            epoch: grid.epoch(),
            visited: grid.create_storage(Visited::default()),
            closed: grid.create_storage(false),
            in_frontier: grid.create_storage(false),
            visit_list: BinaryHeap::new(),
            insertions: 0,
            expanded: 0,
            state: StepResult::InProgress,
        };

        *finder.visited.get_mut(start) = Visited(Some(VisitedItem {
            cost: 0,
            from: None,
        }));

        if start == goal {
            finder.state = StepResult::Found(PathResult {
                path: vec![start],
                start,
                goal,
                total_cost: 0,
            });
        } else {
            finder.visit_list.push(ToVisit {
                f_score: heuristic(start, goal),
                order: 0,
                g_score: 0,
                point: start,
            });
            *finder.in_frontier.get_mut(start) = true;
        }

        debug!("search {} -> {} started", start, goal);
        Ok(finder)
    }

    /// Run the search until it either finds the goal or runs out of cells
    pub fn finish(&mut self, grid: &mut Grid, observer: &mut impl CellObserver) -> Result<StepResult> {
        while !self.state.is_done() {
            self.step(grid, observer)?;
        }
        Ok(self.state.clone())
    }

    pub fn step(&mut self, grid: &mut Grid, observer: &mut impl CellObserver) -> Result<StepResult> {
        // a finder only ever steps the grid (and epoch) it was created for
        if self.state.is_done() || grid.id() != self.grid_id || grid.epoch() != self.epoch {
            return Err(MazeError::SearchAlreadyTerminated);
        }

        let Some(visit) = self.visit_list.pop() else {
            debug!("search {} -> {} exhausted", self.start, self.goal);
            self.state = StepResult::Exhausted;
            return Ok(self.state.clone());
        };

        // we have a point to process, unless a better entry for it was already handled
        let best = self.visited.get(visit.point).map_or(usize::MAX, |v| v.cost);
        if self.closed.get(visit.point) || visit.g_score > best {
            trace!("skipping stale entry for {}", visit.point);
            return Ok(self.state.clone());
        }
        *self.in_frontier.get_mut(visit.point) = false;

        if visit.point == self.goal {
            let path = self.backtrack();
            for point in &path[1..path.len() - 1] {
                self.mark(grid, observer, *point, CellKind::Path)?;
            }

            debug!(
                "found path {} -> {} with cost {} after {} expansions",
                self.start, self.goal, visit.g_score, self.expanded
            );
            self.state = StepResult::Found(PathResult {
                path,
                start: self.start,
                goal: self.goal,
                total_cost: visit.g_score,
            });
            return Ok(self.state.clone());
        }

        *self.closed.get_mut(visit.point) = true;
        self.expanded += 1;
        self.mark(grid, observer, visit.point, CellKind::Closed)?;

        let neighbors: Vec<Point> = grid.neighbors_open(visit.point)?.collect();
        for neighbor in neighbors {
            if self.closed.get(neighbor) {
                continue;
            }

            let tentative = visit.g_score + 1;
            let improves = self
                .visited
                .get(neighbor)
                .map_or(true, |v| tentative < v.cost);
            if !improves {
                continue;
            }

            *self.visited.get_mut(neighbor) = Visited(Some(VisitedItem {
                cost: tentative,
                from: Some(visit.point),
            }));

            self.insertions += 1;
            self.visit_list.push(ToVisit {
                f_score: tentative + heuristic(neighbor, self.goal),
                order: self.insertions,
                g_score: tentative,
                point: neighbor,
            });

            if !self.in_frontier.get(neighbor) {
                *self.in_frontier.get_mut(neighbor) = true;
                self.mark(grid, observer, neighbor, CellKind::Frontier)?;
            }
        }

        Ok(self.state.clone())
    }

    /// Retag a cell and tell the observer, leaving the endpoints untouched
    fn mark(
        &self,
        grid: &mut Grid,
        observer: &mut impl CellObserver,
        point: Point,
        kind: CellKind,
    ) -> Result<()> {
        if point == self.start || point == self.goal {
            return Ok(());
        }

        if grid.set_kind(point, kind)? != kind {
            trace!("{} -> {:?}", point, kind);
            observer.on_cell_changed(point, kind);
        }
        Ok(())
    }

    /// Follow the predecessor links from the goal back to the start
    fn backtrack(&self) -> Vec<Point> {
        let mut path: Vec<Point> = vec![self.goal];
        let mut previous = self.visited.get(self.goal);

        while let Some(VisitedItem {
            from: Some(from), ..
        }) = *previous
        {
            path.push(from);
            previous = self.visited.get(from);
        }

        path.reverse();
        path
    }

    pub fn state(&self) -> &StepResult {
        &self.state
    }

    pub fn get_visited(&self) -> &CellStorage<Visited> {
        &self.visited
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    /// Entries still queued, stale ones included
    pub fn frontier_len(&self) -> usize {
        self.visit_list.len()
    }

    /// Number of cells closed so far
    pub fn expanded(&self) -> usize {
        self.expanded
    }
}
