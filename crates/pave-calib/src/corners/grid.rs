//! Assemble loose corner candidates into an ordered chessboard lattice.
//!
//! Starting from a seed corner, the lattice grows one step at a time along
//! two local basis vectors. Each accepted neighbour updates the basis along
//! the axis it was reached by, so gradual perspective and lens bending are
//! followed. A growth result is accepted only if it forms a complete
//! `columns x rows` rectangle without holes.

use pave_core::{Pt2, Real, Vec2};
use std::collections::{HashMap, VecDeque};

/// Lattice growth parameters.
#[derive(Clone, Copy, Debug)]
pub struct GridParams {
    /// Neighbours considered per candidate.
    pub k_neighbors: usize,
    /// Accept a neighbour within this fraction of the step length from the
    /// predicted position.
    pub step_tolerance: Real,
    /// Number of strongest candidates tried as seeds.
    pub max_seeds: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            k_neighbors: 8,
            step_tolerance: 0.3,
            max_seeds: 40,
        }
    }
}

type Cell = (i32, i32);

/// Order `points` (sorted strongest first) into a `columns x rows` grid.
///
/// The result is row-major: the column index varies fastest, the column
/// axis runs along the board dimension of length `columns`, the lattice is
/// right-handed in image coordinates (x right, y down), and the first
/// corner is the one closest to the image origin among the orientations
/// that satisfy the rest.
pub fn assemble_grid(
    points: &[Pt2],
    columns: usize,
    rows: usize,
    params: &GridParams,
) -> Option<Vec<Pt2>> {
    let expected = columns * rows;
    if columns < 2 || rows < 2 || points.len() < expected {
        return None;
    }

    let neighbors = nearest_neighbors(points, params.k_neighbors);
    for seed in 0..points.len().min(params.max_seeds) {
        let Some(cells) = grow(points, &neighbors, seed, params) else {
            continue;
        };
        if cells.len() != expected {
            continue;
        }
        if let Some(ordered) = extract(points, &cells, columns, rows) {
            return Some(ordered);
        }
    }
    None
}

fn nearest_neighbors(points: &[Pt2], k: usize) -> Vec<Vec<usize>> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut others: Vec<(Real, usize)> = points
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, q)| ((q - p).norm_squared(), j))
                .collect();
            others.sort_by(|a, b| a.0.total_cmp(&b.0));
            others.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

fn initial_basis(points: &[Pt2], neighbors: &[usize], seed: usize) -> Option<(Vec2, Vec2)> {
    let p = points[seed];
    let first = *neighbors.first()?;
    let e1 = points[first] - p;
    let len1 = e1.norm();
    if len1 < 1.0 {
        return None;
    }
    neighbors[1..].iter().find_map(|&n| {
        let v = points[n] - p;
        let ratio = v.norm() / len1;
        let cos = e1.dot(&v) / (len1 * v.norm());
        (cos.abs() < 0.5 && (0.5..2.0).contains(&ratio)).then_some((e1, v))
    })
}

fn grow(
    points: &[Pt2],
    neighbors: &[Vec<usize>],
    seed: usize,
    params: &GridParams,
) -> Option<HashMap<Cell, usize>> {
    let (e1, e2) = initial_basis(points, &neighbors[seed], seed)?;

    let mut cells: HashMap<Cell, usize> = HashMap::new();
    let mut owner: HashMap<usize, Cell> = HashMap::new();
    let mut queue = VecDeque::new();

    cells.insert((0, 0), seed);
    owner.insert(seed, (0, 0));
    queue.push_back((seed, (0, 0), e1, e2));

    while let Some((idx, (a, b), e1, e2)) = queue.pop_front() {
        let steps = [(1, 0, e1), (-1, 0, -e1), (0, 1, e2), (0, -1, -e2)];
        for (da, db, step) in steps {
            let cell = (a + da, b + db);
            if cells.contains_key(&cell) {
                continue;
            }
            let predicted = points[idx] + step;
            let tol = params.step_tolerance * step.norm();
            let Some(found) = neighbors[idx]
                .iter()
                .copied()
                .map(|n| (n, (points[n] - predicted).norm()))
                .filter(|(_, d)| *d < tol)
                .min_by(|x, y| x.1.total_cmp(&y.1))
                .map(|(n, _)| n)
            else {
                continue;
            };
            if owner.contains_key(&found) {
                continue;
            }

            let actual = points[found] - points[idx];
            let (n1, n2) = if da != 0 {
                (actual * da as Real, e2)
            } else {
                (e1, actual * db as Real)
            };
            cells.insert(cell, found);
            owner.insert(found, cell);
            queue.push_back((found, cell, n1, n2));
        }
    }

    Some(cells)
}

fn extract(
    points: &[Pt2],
    cells: &HashMap<Cell, usize>,
    columns: usize,
    rows: usize,
) -> Option<Vec<Pt2>> {
    let a_min = cells.keys().map(|c| c.0).min()?;
    let a_max = cells.keys().map(|c| c.0).max()?;
    let b_min = cells.keys().map(|c| c.1).min()?;
    let b_max = cells.keys().map(|c| c.1).max()?;
    let na = (a_max - a_min + 1) as usize;
    let nb = (b_max - b_min + 1) as usize;
    if na * nb != cells.len() {
        return None;
    }

    let a_is_column = if (na, nb) == (columns, rows) {
        true
    } else if (na, nb) == (rows, columns) {
        false
    } else {
        return None;
    };

    // grid[j][i], i along columns, j along rows
    let mut grid = vec![vec![Pt2::origin(); columns]; rows];
    for (&(a, b), &idx) in cells {
        let (da, db) = ((a - a_min) as usize, (b - b_min) as usize);
        let (i, j) = if a_is_column { (da, db) } else { (db, da) };
        grid[j][i] = points[idx];
    }

    let col_dir = grid[0][columns - 1] - grid[0][0] + (grid[rows - 1][columns - 1] - grid[rows - 1][0]);
    let row_dir = grid[rows - 1][0] - grid[0][0] + (grid[rows - 1][columns - 1] - grid[0][columns - 1]);
    if col_dir.x * row_dir.y - col_dir.y * row_dir.x < 0.0 {
        grid.reverse();
    }

    Some(canonical_order(&grid, columns, rows))
}

/// Pick, among the handedness-preserving relabelings, the one whose first
/// corner is closest to the image origin.
fn canonical_order(grid: &[Vec<Pt2>], columns: usize, rows: usize) -> Vec<Pt2> {
    // quarter turns only relabel a square lattice
    let turns = if columns == rows { 4 } else { 2 };
    let relabel = |turn: usize, i: usize, j: usize| -> (usize, usize) {
        match turn {
            0 => (i, j),
            1 => (columns - 1 - i, rows - 1 - j),
            2 => (j, columns - 1 - i),
            _ => (columns - 1 - j, i),
        }
    };

    let mut best = 0;
    let mut best_score = Real::INFINITY;
    for turn in 0..turns {
        let (i, j) = relabel(turn, 0, 0);
        let p = grid[j][i];
        if p.x + p.y < best_score {
            best_score = p.x + p.y;
            best = turn;
        }
    }

    let mut out = Vec::with_capacity(columns * rows);
    for j in 0..rows {
        for i in 0..columns {
            let (si, sj) = relabel(best, i, j);
            out.push(grid[sj][si]);
        }
    }
    out
}
