use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mazepath::{Grid, GridVariant, MazeGenerator, NoopObserver, PathFinder, Point, StepResult};

fn carved_maze(size: usize) -> Grid {
    let mut grid = Grid::new(size, size, GridVariant::Maze).unwrap();
    MazeGenerator::from_seed(7).carve(&mut grid, &mut NoopObserver);
    grid
}

fn bench_carve(c: &mut Criterion, size: usize) {
    c.bench_function(&format!("carve_{}", size), |b| {
        let mut grid = Grid::new(size, size, GridVariant::Maze).unwrap();
        let mut generator = MazeGenerator::from_seed(7);
        b.iter(|| generator.carve(black_box(&mut grid), &mut NoopObserver))
    });
}

fn bench_solve(c: &mut Criterion, size: usize) {
    let maze = carved_maze(size);
    let start = Point::new(0, 0);
    let goal = Point::new(size - 1, size - 1);

    c.bench_function(&format!("solve_{}", size), |b| {
        b.iter(|| {
            let mut grid = maze.clone();
            let mut finder = PathFinder::new(&grid, black_box(start), black_box(goal)).unwrap();
            let res = finder.finish(&mut grid, &mut NoopObserver).unwrap();
            assert!(matches!(res, StepResult::Found(_)));
        })
    });
}

pub fn maze_small(c: &mut Criterion) {
    bench_carve(c, 16);
    bench_solve(c, 16);
}

pub fn maze_medium(c: &mut Criterion) {
    bench_carve(c, 64);
    bench_solve(c, 64);
}

pub fn maze_large(c: &mut Criterion) {
    bench_carve(c, 256);
    bench_solve(c, 256);
}

criterion_group!(benches, maze_small, maze_medium, maze_large);
criterion_main!(benches);
