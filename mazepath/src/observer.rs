use crate::grid::{CellKind, Point};

/// The only channel through which the engine reports progress to the outside world.
///
/// Implementations are notified synchronously, in the order things happen, and
/// never get access to the grid itself.
pub trait CellObserver {
    /// A cell changed its kind
    fn on_cell_changed(&mut self, point: Point, kind: CellKind);

    /// The wall pair between two neighboring cells was knocked down
    fn on_passage_carved(&mut self, _from: Point, _to: Point) {}

    /// The maze-game player moved onto a new cell
    fn on_player_moved(&mut self, _point: Point) {}

    /// The whole grid was replaced by a fresh one
    fn on_grid_reset(&mut self, _rows: usize, _columns: usize) {}
}

impl<O: CellObserver + ?Sized> CellObserver for &mut O {
    fn on_cell_changed(&mut self, point: Point, kind: CellKind) {
        (**self).on_cell_changed(point, kind)
    }

    fn on_passage_carved(&mut self, from: Point, to: Point) {
        (**self).on_passage_carved(from, to)
    }

    fn on_player_moved(&mut self, point: Point) {
        (**self).on_player_moved(point)
    }

    fn on_grid_reset(&mut self, rows: usize, columns: usize) {
        (**self).on_grid_reset(rows, columns)
    }
}

/// Ignores every notification, for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CellObserver for NoopObserver {
    fn on_cell_changed(&mut self, _point: Point, _kind: CellKind) {}
}

/// Adapts a closure into an observer of cell changes
pub struct FnObserver<F>(pub F);

impl<F: FnMut(Point, CellKind)> CellObserver for FnObserver<F> {
    fn on_cell_changed(&mut self, point: Point, kind: CellKind) {
        (self.0)(point, kind)
    }
}

/// Records every notification so a run can be inspected or compared afterwards
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeLog {
    pub changes: Vec<(Point, CellKind)>,
    pub carved: Vec<(Point, Point)>,
    pub player_moves: Vec<Point>,
    pub resets: usize,
}

impl ChangeLog {
    /// Changes that tagged a cell with `kind`, in order
    pub fn of_kind(&self, kind: CellKind) -> impl Iterator<Item = Point> + '_ {
        self.changes
            .iter()
            .filter(move |(_, k)| *k == kind)
            .map(|(p, _)| *p)
    }

    pub fn clear(&mut self) {
        self.changes.clear();
        self.carved.clear();
        self.player_moves.clear();
        self.resets = 0;
    }
}

impl CellObserver for ChangeLog {
    fn on_cell_changed(&mut self, point: Point, kind: CellKind) {
        self.changes.push((point, kind));
    }

    fn on_passage_carved(&mut self, from: Point, to: Point) {
        self.carved.push((from, to));
    }

    fn on_player_moved(&mut self, point: Point) {
        self.player_moves.push(point);
    }

    fn on_grid_reset(&mut self, _rows: usize, _columns: usize) {
        self.resets += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fn_observer_forwards_changes() {
        let mut seen = Vec::new();
        {
            let mut observer = FnObserver(|point: Point, kind: CellKind| seen.push((point, kind)));
            observer.on_cell_changed(Point::new(1, 2), CellKind::Closed);
            // defaulted notifications are ignored
            observer.on_passage_carved(Point::new(0, 0), Point::new(0, 1));
        }
        assert_eq!(seen, vec![(Point::new(1, 2), CellKind::Closed)]);
    }

    fn notify_all(mut observer: impl CellObserver) {
        observer.on_cell_changed(Point::new(0, 0), CellKind::Frontier);
        observer.on_cell_changed(Point::new(0, 1), CellKind::Closed);
        observer.on_cell_changed(Point::new(0, 2), CellKind::Frontier);
        observer.on_grid_reset(3, 3);
    }

    #[test]
    fn test_change_log_through_reference() {
        let mut log = ChangeLog::default();
        notify_all(&mut log);

        assert_eq!(
            log.of_kind(CellKind::Frontier).collect::<Vec<_>>(),
            vec![Point::new(0, 0), Point::new(0, 2)]
        );
        assert_eq!(log.resets, 1);

        log.clear();
        assert_eq!(log, ChangeLog::default());
    }
}
