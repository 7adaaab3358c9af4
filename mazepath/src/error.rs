use thiserror::Error;

use crate::grid::Point;

pub type Result<T> = std::result::Result<T, MazeError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MazeError {
    #[error("cell ({row}, {col}) is outside the {rows}x{columns} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        columns: usize,
    },

    #[error("invalid search endpoints: start {start:?}, goal {goal:?}")]
    InvalidEndpoints { start: Point, goal: Point },

    #[error("search has already terminated")]
    SearchAlreadyTerminated,

    #[error("grid must be at least 1x1, got {rows}x{columns}")]
    InvalidDimensions { rows: usize, columns: usize },

    #[error("session has quit and accepts no further commands")]
    SessionClosed,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn out_of_bounds_message_names_the_cell() {
        let error = MazeError::OutOfBounds {
            row: 9,
            col: 2,
            rows: 8,
            columns: 8,
        };
        assert_eq!(error.to_string(), "cell (9, 2) is outside the 8x8 grid");
    }

    #[test]
    fn dimensions_message() {
        let error = MazeError::InvalidDimensions {
            rows: 0,
            columns: 4,
        };
        assert_eq!(error.to_string(), "grid must be at least 1x1, got 0x4");
    }
}
