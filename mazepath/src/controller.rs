use log::{debug, info, warn};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{MazeError, Result};
use crate::find::{PathFinder, PathResult, StepResult};
use crate::grid::{CellKind, Direction, Grid, GridVariant, Point};
use crate::maze::MazeGenerator;
use crate::observer::CellObserver;

/// Discrete commands delivered by whatever owns the input devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Reset,
    PlaceStart(Point),
    PlaceEnd(Point),
    ToggleWall(Point),
    /// Clear a single cell back to Empty
    Erase(Point),
    /// Walk the player one cell through the maze
    Move(Direction),
    Advance,
    Quit,
}

impl Command {
    fn is_edit(&self) -> bool {
        matches!(
            self,
            Command::PlaceStart(_)
                | Command::PlaceEnd(_)
                | Command::ToggleWall(_)
                | Command::Erase(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Countdown { remaining: u32 },
    Building,
    Ready,
    Searching,
    Solved(PathResult),
    NoPath,
    Escaped { moves: usize },
    Quit,
}

impl SessionState {
    fn accepts_edits(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Ready)
    }

    fn search_ended(&self) -> bool {
        matches!(self, SessionState::Solved(_) | SessionState::NoPath)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub rows: usize,
    pub columns: usize,
    pub variant: GridVariant,
    /// Ticks to wait between the start trigger and the build
    pub countdown_ticks: u32,
    /// Fixed seed for reproducible mazes, entropy otherwise
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            columns: 8,
            variant: GridVariant::Maze,
            countdown_ticks: 0,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn maze(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            variant: GridVariant::Maze,
            ..Default::default()
        }
    }

    pub fn open(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            variant: GridVariant::Open,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_countdown(mut self, ticks: u32) -> Self {
        self.countdown_ticks = ticks;
        self
    }
}

/// Drives one interactive session: maze building, endpoint editing and the
/// step-by-step search. It neither renders nor polls input; the caller feeds it
/// commands and ticks and receives progress through a [`CellObserver`].
#[derive(Debug)]
pub struct Controller {
    config: SessionConfig,
    grid: Grid,
    state: SessionState,
    finder: Option<PathFinder>,
    generator: MazeGenerator<StdRng>,
    start: Option<Point>,
    end: Option<Point>,
    player: Option<Point>,
    moves: usize,
}

impl Controller {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let grid = Grid::new(config.rows, config.columns, config.variant)?;
        Ok(Self::with_grid(config, grid))
    }

    /// Start a session on a prepared grid, e.g. one parsed from an image.
    /// Start and End cells already present on the grid become the endpoints.
    pub fn with_grid(mut config: SessionConfig, grid: Grid) -> Self {
        config.rows = grid.rows();
        config.columns = grid.columns();
        config.variant = grid.variant();

        let generator = match config.seed {
            Some(seed) => MazeGenerator::from_seed(seed),
            None => MazeGenerator::from_entropy(),
        };

        let start = crate::util::find_kind(&grid, CellKind::Start);
        let end = crate::util::find_kind(&grid, CellKind::End);

        Self {
            config,
            grid,
            state: SessionState::Idle,
            finder: None,
            generator,
            start,
            end,
            player: None,
            moves: 0,
        }
    }

    pub fn handle(&mut self, command: Command, observer: &mut impl CellObserver) -> Result<()> {
        if self.state == SessionState::Quit {
            return Err(MazeError::SessionClosed);
        }
        if command.is_edit() && self.state.search_ended() {
            self.reopen(observer)?;
        }

        match command {
            Command::Start => self.trigger(observer),
            Command::Reset => self.reset(observer),
            Command::PlaceStart(point) => self.place_endpoint(point, CellKind::Start, observer),
            Command::PlaceEnd(point) => self.place_endpoint(point, CellKind::End, observer),
            Command::ToggleWall(point) => self.toggle_wall(point, observer),
            Command::Erase(point) => self.erase(point, observer),
            Command::Move(direction) => self.move_player(direction, observer),
            Command::Advance => self.advance(observer).map(|_| ()),
            Command::Quit => {
                info!("session quit");
                self.finder = None;
                self.state = SessionState::Quit;
                Ok(())
            }
        }
    }

    /// One tick of the session clock. Returns the search progress when a search ran.
    pub fn advance(&mut self, observer: &mut impl CellObserver) -> Result<Option<StepResult>> {
        match &mut self.state {
            SessionState::Quit => Err(MazeError::SessionClosed),
            SessionState::Countdown { remaining } => {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    self.begin(observer)?;
                }
                Ok(None)
            }
            SessionState::Searching => {
                let finder = self
                    .finder
                    .as_mut()
                    .ok_or(MazeError::SearchAlreadyTerminated)?;
                let result = finder.step(&mut self.grid, observer)?;

                match &result {
                    StepResult::InProgress => {}
                    StepResult::Found(path) => {
                        info!("solved with {} moves", path.len());
                        self.state = SessionState::Solved(path.clone());
                    }
                    StepResult::Exhausted => {
                        info!("no path between the endpoints");
                        self.state = SessionState::NoPath;
                    }
                }
                Ok(Some(result))
            }
            _ => Ok(None),
        }
    }

    /// Tick until the running search ends, returning its final result
    pub fn finish(&mut self, observer: &mut impl CellObserver) -> Result<Option<StepResult>> {
        let mut last = None;
        while self.state == SessionState::Searching {
            last = self.advance(observer)?;
        }
        Ok(last)
    }

    fn trigger(&mut self, observer: &mut impl CellObserver) -> Result<()> {
        match self.state {
            SessionState::Idle if self.config.countdown_ticks > 0 => {
                debug!("counting down {} ticks", self.config.countdown_ticks);
                self.state = SessionState::Countdown {
                    remaining: self.config.countdown_ticks,
                };
                Ok(())
            }
            SessionState::Idle => self.begin(observer),
            SessionState::Ready => self.start_search(),
            _ if self.state.search_ended() => {
                self.clear_search(observer)?;
                self.start_search()
            }
            _ => {
                debug!("ignoring start while {:?}", self.state);
                Ok(())
            }
        }
    }

    /// Leave Idle (or the countdown): build the maze, or go straight to the search
    fn begin(&mut self, observer: &mut impl CellObserver) -> Result<()> {
        match self.config.variant {
            GridVariant::Maze => {
                self.state = SessionState::Building;
                self.generator.carve(&mut self.grid, observer);

                if self.start.is_none() {
                    self.place_endpoint(Point::new(0, 0), CellKind::Start, observer)?;
                }
                if self.end.is_none() {
                    let corner = Point::new(self.grid.rows() - 1, self.grid.columns() - 1);
                    self.place_endpoint(corner, CellKind::End, observer)?;
                }
                self.player = self.start;
                self.moves = 0;
                if let Some(player) = self.player {
                    observer.on_player_moved(player);
                }

                info!("maze built, ready");
                self.state = SessionState::Ready;
                Ok(())
            }
            GridVariant::Open => {
                // a countdown may have ended without endpoints
                self.state = SessionState::Idle;
                self.start_search()
            }
        }
    }

    fn start_search(&mut self) -> Result<()> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            warn!("cannot search without both a start and an end");
            return Ok(());
        };

        let finder = PathFinder::new(&self.grid, start, end)?;
        self.state = match finder.state() {
            StepResult::Found(path) => SessionState::Solved(path.clone()),
            StepResult::Exhausted => SessionState::NoPath,
            StepResult::InProgress => SessionState::Searching,
        };
        self.finder = Some(finder);
        debug!("searching {} -> {}", start, end);
        Ok(())
    }

    /// Wipe the marks of the previous search before running another one
    fn clear_search(&mut self, observer: &mut impl CellObserver) -> Result<()> {
        self.finder = None;
        let changed = match self.grid.variant() {
            GridVariant::Maze => self.grid.reset_kinds(),
            GridVariant::Open => self.grid.clear_search_marks(),
        };
        for point in changed {
            observer.on_cell_changed(point, CellKind::Empty);
        }
        Ok(())
    }

    /// Drop a finished search so the grid can be edited before the next run
    fn reopen(&mut self, observer: &mut impl CellObserver) -> Result<()> {
        self.clear_search(observer)?;
        self.state = match self.grid.variant() {
            GridVariant::Maze => SessionState::Ready,
            GridVariant::Open => SessionState::Idle,
        };
        debug!("search cleared for editing, now {:?}", self.state);
        Ok(())
    }

    fn reset(&mut self, observer: &mut impl CellObserver) -> Result<()> {
        let epoch = self.grid.epoch() + 1;
        self.grid = Grid::new(self.config.rows, self.config.columns, self.config.variant)?
            .with_epoch(epoch);
        self.finder = None;
        self.start = None;
        self.end = None;
        self.player = None;
        self.moves = 0;
        self.state = SessionState::Idle;

        debug!("session reset, grid epoch {}", epoch);
        observer.on_grid_reset(self.grid.rows(), self.grid.columns());
        Ok(())
    }

    fn place_endpoint(
        &mut self,
        point: Point,
        kind: CellKind,
        observer: &mut impl CellObserver,
    ) -> Result<()> {
        if !self.state.accepts_edits() && self.state != SessionState::Building {
            debug!("ignoring {:?} placement while {:?}", kind, self.state);
            return Ok(());
        }
        self.grid.cell(point)?;

        let previous = match kind {
            CellKind::Start => self.start.replace(point),
            _ => self.end.replace(point),
        };
        if let Some(previous) = previous.filter(|p| *p != point) {
            self.retag(previous, CellKind::Empty, observer)?;
        }

        self.retag(point, kind, observer)?;
        if kind == CellKind::Start && self.state == SessionState::Ready {
            self.player = Some(point);
            self.moves = 0;
            observer.on_player_moved(point);
        }
        Ok(())
    }

    fn toggle_wall(&mut self, point: Point, observer: &mut impl CellObserver) -> Result<()> {
        if !self.state.accepts_edits() {
            debug!("ignoring wall toggle while {:?}", self.state);
            return Ok(());
        }
        if self.grid.variant() != GridVariant::Open {
            debug!("walls of a maze grid come from carving only");
            return Ok(());
        }

        let kind = match self.grid.kind(point)? {
            CellKind::Wall => CellKind::Empty,
            _ => CellKind::Wall,
        };
        self.retag(point, kind, observer)
    }

    fn erase(&mut self, point: Point, observer: &mut impl CellObserver) -> Result<()> {
        if !self.state.accepts_edits() {
            debug!("ignoring erase while {:?}", self.state);
            return Ok(());
        }
        self.retag(point, CellKind::Empty, observer)
    }

    fn move_player(&mut self, direction: Direction, observer: &mut impl CellObserver) -> Result<()> {
        if self.state != SessionState::Ready {
            debug!("ignoring move while {:?}", self.state);
            return Ok(());
        }
        let Some(player) = self.player else {
            return Ok(());
        };

        let target = self.grid.neighbor(player, direction);
        let Some(next) = self.grid.neighbors_open(player)?.find(|p| Some(*p) == target) else {
            debug!("bumped into a wall moving {} from {}", direction, player);
            return Ok(());
        };

        self.player = Some(next);
        self.moves += 1;
        observer.on_player_moved(next);

        if self.end == Some(next) {
            info!("escaped the maze in {} moves", self.moves);
            self.state = SessionState::Escaped { moves: self.moves };
        }
        Ok(())
    }

    /// Set the kind of one cell, keeping the endpoint bookkeeping in sync
    fn retag(&mut self, point: Point, kind: CellKind, observer: &mut impl CellObserver) -> Result<()> {
        let previous = self.grid.set_kind(point, kind)?;

        // an overwritten endpoint is no longer an endpoint
        if previous == CellKind::Start && kind != CellKind::Start && self.start == Some(point) {
            self.start = None;
        }
        if previous == CellKind::End && kind != CellKind::End && self.end == Some(point) {
            self.end = None;
        }

        if previous != kind {
            observer.on_cell_changed(point, kind);
        }
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn finder(&self) -> Option<&PathFinder> {
        self.finder.as_ref()
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    pub fn end(&self) -> Option<Point> {
        self.end
    }

    pub fn player(&self) -> Option<Point> {
        self.player
    }
}
