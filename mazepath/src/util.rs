use image::{DynamicImage, GenericImageView};

use crate::error::Result;
use crate::grid::{CellKind, Grid, GridVariant, Point};

/// Build an open grid from a thresholded image, dark pixels become walls
pub fn parse_img(img: &DynamicImage) -> Result<Grid> {
    let width = img.width() as usize;
    let height = img.height() as usize;

    let mut grid = Grid::new(height, width, GridVariant::Open)?;

    for row in 0..height {
        for col in 0..width {
            let p = img.get_pixel(col as u32, row as u32);

            if p.0[0] < 128 {
                grid.set_kind(Point { row, col }, CellKind::Wall)?;
            }
        }
    }

    Ok(grid)
}

/// Build an open grid from rows of text.
///
/// `#` is a wall, `S` and `E` mark the endpoints and anything else is empty.
/// Shorter rows are padded with empty cells.
pub fn parse_ascii(rows: &[&str]) -> Result<Grid> {
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut grid = Grid::new(rows.len(), width, GridVariant::Open)?;

    for (row, line) in rows.iter().enumerate() {
        for (col, c) in line.chars().enumerate() {
            let kind = match c {
                '#' => CellKind::Wall,
                'S' => CellKind::Start,
                'E' => CellKind::End,
                _ => continue,
            };
            grid.set_kind(Point { row, col }, kind)?;
        }
    }

    Ok(grid)
}

/// Locate the first cell of the given kind, in row-major order
pub fn find_kind(grid: &Grid, kind: CellKind) -> Option<Point> {
    grid.points()
        .find(|p| grid.kind(*p).is_ok_and(|k| k == kind))
}

#[cfg(test)]
mod test {
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::error::MazeError;

    #[test]
    fn test_parse_img_threshold() {
        let img = RgbImage::from_fn(3, 2, |x, y| {
            if x == 1 && y == 0 {
                Rgb([20, 20, 20])
            } else if x == 2 && y == 1 {
                Rgb([127, 255, 255])
            } else {
                Rgb([255, 255, 255])
            }
        });

        let grid = parse_img(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!((grid.rows(), grid.columns()), (2, 3));
        assert_eq!(grid.variant(), GridVariant::Open);
        assert_eq!(grid.kind(Point::new(0, 1)).unwrap(), CellKind::Wall);
        assert_eq!(grid.kind(Point::new(1, 2)).unwrap(), CellKind::Wall);
        assert_eq!(grid.kind(Point::new(0, 0)).unwrap(), CellKind::Empty);
    }

    #[test]
    fn test_parse_ascii() {
        let grid = parse_ascii(&["S.#", "#", "..E"]).unwrap();
        assert_eq!((grid.rows(), grid.columns()), (3, 3));
        assert_eq!(find_kind(&grid, CellKind::Start), Some(Point::new(0, 0)));
        assert_eq!(find_kind(&grid, CellKind::End), Some(Point::new(2, 2)));
        assert_eq!(grid.kind(Point::new(1, 0)).unwrap(), CellKind::Wall);
        // padded
        assert_eq!(grid.kind(Point::new(1, 2)).unwrap(), CellKind::Empty);
        assert_eq!(grid.to_string(), "S #\n#  \n  E\n");
    }

    #[test]
    fn test_parse_ascii_empty() {
        assert_eq!(
            parse_ascii(&[]).unwrap_err(),
            MazeError::InvalidDimensions {
                rows: 0,
                columns: 0
            }
        );
    }
}
