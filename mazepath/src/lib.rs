//! Maze generation and step-by-step shortest path search on a grid.
//!
//! A [`Controller`] owns the [`Grid`] of a session, carves it with a
//! [`MazeGenerator`] (or lets the user draw walls on an open grid), and runs a
//! [`PathFinder`] one expansion per tick. Every change of a cell's kind is
//! reported through a [`CellObserver`], which is where rendering plugs in.

mod controller;
mod error;
mod find;
mod grid;
mod maze;
mod observer;
pub mod util;

pub use controller::{Command, Controller, SessionConfig, SessionState};
pub use error::{MazeError, Result};
pub use find::{heuristic, PathFinder, PathResult, StepResult, Visited, VisitedItem};
pub use grid::{Cell, CellKind, CellStorage, Direction, Grid, GridVariant, Point, Walls};
pub use maze::MazeGenerator;
pub use observer::{CellObserver, ChangeLog, FnObserver, NoopObserver};
pub use util::parse_img;
