//! External contour extraction from boolean occupancy grids.
//!
//! Foreground is 8-connected and background 4-connected. Each foreground
//! component that touches the outer background gets one closed contour,
//! traced clockwise with Moore-neighbor boundary following. Holes are not
//! traced, and components sitting inside another component's hole are
//! skipped entirely.

use std::collections::VecDeque;

use ndarray::Array2;

/// A closed polygon as pixel coordinates `(x, y)`; the last point connects
/// back to the first.
pub type Contour = Vec<(u32, u32)>;

/// Moore neighborhood directions (8-connected, clockwise from right)
const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),   // 0: right
    (1, 1),   // 1: down-right
    (0, 1),   // 2: down
    (-1, 1),  // 3: down-left
    (-1, 0),  // 4: left
    (-1, -1), // 5: up-left
    (0, -1),  // 6: up
    (1, -1),  // 7: up-right
];

/// Direction index pointing left; the topmost-leftmost pixel of a component
/// always has background there.
const WEST: usize = 4;

/// Trace the outer contour of every external component of `grid`.
///
/// Contours come out in raster order of their topmost-leftmost pixel, with
/// straight runs compressed to their endpoints.
pub fn trace_external_contours(grid: &Array2<bool>) -> Vec<Contour> {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    let outer = outer_background(grid);
    let mut visited = Array2::from_elem((rows, cols), false);
    let mut contours = Vec::new();

    for ((y, x), &occupied) in grid.indexed_iter() {
        if !occupied || visited[[y, x]] {
            continue;
        }
        let external = flood_component(grid, &outer, &mut visited, (y, x));
        if !external {
            log::trace!("Skipping nested component at ({}, {})", x, y);
            continue;
        }
        // Raster order makes (x, y) the component's topmost-leftmost pixel.
        let contour = trace_boundary(grid, (x as i64, y as i64));
        contours.push(compress_runs(contour));
    }

    contours
}

/// Check if a pixel is foreground (treating out-of-bounds as background).
#[inline]
fn is_set(grid: &Array2<bool>, x: i64, y: i64) -> bool {
    if x < 0 || y < 0 {
        return false;
    }
    grid.get((y as usize, x as usize)).copied().unwrap_or(false)
}

/// Mark background pixels 4-connected to the area outside the grid.
fn outer_background(grid: &Array2<bool>) -> Array2<bool> {
    let (rows, cols) = grid.dim();
    let mut outer = Array2::from_elem((rows, cols), false);
    let mut queue = VecDeque::new();

    let border = (0..cols)
        .flat_map(|x| [(0, x), (rows - 1, x)])
        .chain((0..rows).flat_map(|y| [(y, 0), (y, cols - 1)]));
    for (y, x) in border {
        if !grid[[y, x]] && !outer[[y, x]] {
            outer[[y, x]] = true;
            queue.push_back((y, x));
        }
    }

    while let Some((y, x)) = queue.pop_front() {
        for (dx, dy) in [(1i64, 0i64), (-1, 0), (0, 1), (0, -1)] {
            let (nx, ny) = (x as i64 + dx, y as i64 + dy);
            if nx < 0 || ny < 0 || nx >= cols as i64 || ny >= rows as i64 {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            if !grid[[ny, nx]] && !outer[[ny, nx]] {
                outer[[ny, nx]] = true;
                queue.push_back((ny, nx));
            }
        }
    }

    outer
}

/// Visit one 8-connected component; returns whether it borders the outside.
fn flood_component(
    grid: &Array2<bool>,
    outer: &Array2<bool>,
    visited: &mut Array2<bool>,
    start: (usize, usize),
) -> bool {
    let (rows, cols) = grid.dim();
    let mut external = false;
    let mut queue = VecDeque::from([start]);
    visited[start] = true;

    while let Some((y, x)) = queue.pop_front() {
        for (dx, dy) in DIRECTIONS {
            let (nx, ny) = (x as i64 + dx, y as i64 + dy);
            if nx < 0 || ny < 0 || nx >= cols as i64 || ny >= rows as i64 {
                // Only 4-neighbors count as touching the outside.
                external |= dx == 0 || dy == 0;
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            if grid[[ny, nx]] {
                if !visited[[ny, nx]] {
                    visited[[ny, nx]] = true;
                    queue.push_back((ny, nx));
                }
            } else if (dx == 0 || dy == 0) && outer[[ny, nx]] {
                external = true;
            }
        }
    }

    external
}

/// Index of the unit step `(dx, dy)` in [`DIRECTIONS`].
fn direction_of(dx: i64, dy: i64) -> usize {
    DIRECTIONS
        .iter()
        .position(|&d| d == (dx, dy))
        .unwrap_or(WEST)
}

/// Find the next boundary pixel clockwise from `back`.
///
/// Returns the pixel and the direction from it back to the last background
/// pixel examined.
fn next_boundary(grid: &Array2<bool>, (x, y): (i64, i64), back: usize) -> Option<((i64, i64), usize)> {
    for i in 1..8 {
        let dir = (back + i) % 8;
        let (dx, dy) = DIRECTIONS[dir];
        let (nx, ny) = (x + dx, y + dy);
        if is_set(grid, nx, ny) {
            let (px, py) = DIRECTIONS[(dir + 7) % 8];
            let (bx, by) = (x + px, y + py);
            return Some(((nx, ny), direction_of(bx - nx, by - ny)));
        }
    }
    None
}

/// Moore-neighbor tracing from the topmost-leftmost pixel of a component.
///
/// Stops when the walk leaves `start` toward the same pixel as its first
/// move, which closes the loop even through one-pixel-wide necks.
fn trace_boundary(grid: &Array2<bool>, start: (i64, i64)) -> Contour {
    let (rows, cols) = grid.dim();
    let max_steps = rows * cols * 8 + 8;

    let mut contour = Vec::new();
    let mut current = start;
    let mut back = WEST;
    let mut first_move = None;

    for _ in 0..max_steps {
        let Some((next, next_back)) = next_boundary(grid, current, back) else {
            // Isolated pixel
            contour.push(current);
            break;
        };
        if current == start {
            match first_move {
                Some(first) if first == next => break,
                Some(_) => {}
                None => first_move = Some(next),
            }
        }
        contour.push(current);
        current = next;
        back = next_back;
    }

    contour
        .into_iter()
        .map(|(x, y)| (x as u32, y as u32))
        .collect()
}

/// Drop interior points of straight runs (same step direction in and out).
fn compress_runs(contour: Contour) -> Contour {
    let n = contour.len();
    if n < 3 {
        return contour;
    }
    let step = |a: (u32, u32), b: (u32, u32)| {
        (
            (i64::from(b.0) - i64::from(a.0)).signum(),
            (i64::from(b.1) - i64::from(a.1)).signum(),
        )
    };
    let compressed: Contour = (0..n)
        .filter(|&i| {
            let prev = contour[(i + n - 1) % n];
            let cur = contour[i];
            let next = contour[(i + 1) % n];
            step(prev, cur) != step(cur, next)
        })
        .map(|i| contour[i])
        .collect();

    if compressed.is_empty() {
        contour
    } else {
        compressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid_from(rows: &[&str]) -> Array2<bool> {
        let height = rows.len();
        let width = rows[0].len();
        Array2::from_shape_fn((height, width), |(y, x)| rows[y].as_bytes()[x] == b'#')
    }

    #[test]
    fn test_empty_grid() {
        let grid = Array2::from_elem((4, 4), false);
        assert!(trace_external_contours(&grid).is_empty());
        assert!(trace_external_contours(&Array2::from_elem((0, 0), false)).is_empty());
    }

    #[test]
    fn test_single_pixel() {
        let grid = grid_from(&["...", ".#.", "..."]);
        assert_eq!(trace_external_contours(&grid), vec![vec![(1, 1)]]);
    }

    #[test]
    fn test_rectangle_compresses_to_corners() {
        let grid = grid_from(&["......", ".####.", ".####.", ".####.", "......"]);
        let contours = trace_external_contours(&grid);
        assert_eq!(contours, vec![vec![(1, 1), (4, 1), (4, 3), (1, 3)]]);
    }

    #[test]
    fn test_full_grid() {
        let grid = Array2::from_elem((3, 3), true);
        let contours = trace_external_contours(&grid);
        assert_eq!(contours, vec![vec![(0, 0), (2, 0), (2, 2), (0, 2)]]);
    }

    #[test]
    fn test_two_disjoint_blobs() {
        let grid = grid_from(&["##...", "##...", ".....", "...##", "...##"]);
        let contours = trace_external_contours(&grid);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0], vec![(0, 0), (1, 0), (1, 1), (0, 1)]);
        assert_eq!(contours[1], vec![(3, 3), (4, 3), (4, 4), (3, 4)]);
    }

    #[test]
    fn test_diagonal_pixels_are_one_component() {
        let grid = array![[true, false], [false, true]];
        let contours = trace_external_contours(&grid);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0], vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_ring_ignores_hole_and_nested_island() {
        let grid = grid_from(&[
            "#######", //
            "#.....#", //
            "#..#..#", //
            "#.....#", //
            "#######",
        ]);
        let contours = trace_external_contours(&grid);
        assert_eq!(contours.len(), 1, "island inside the hole is not external");
        assert_eq!(contours[0], vec![(0, 0), (6, 0), (6, 4), (0, 4)]);
    }

    #[test]
    fn test_hourglass_through_single_pixel_neck() {
        let grid = grid_from(&["###", ".#.", "###"]);
        let contours = trace_external_contours(&grid);
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        // The neck pixel is passed twice, once on each side.
        assert_eq!(contour.iter().filter(|&&p| p == (1, 1)).count(), 2);
        for corner in [(0, 0), (2, 0), (2, 2), (0, 2)] {
            assert!(contour.contains(&corner), "missing corner {:?}", corner);
        }
    }

    #[test]
    fn test_contours_are_clockwise() {
        let grid = grid_from(&[".....", ".###.", ".###.", "....."]);
        let contour = &trace_external_contours(&grid)[0];
        // Shoelace sum is positive for clockwise order with y pointing down.
        let n = contour.len();
        let area2: i64 = (0..n)
            .map(|i| {
                let (x0, y0) = contour[i];
                let (x1, y1) = contour[(i + 1) % n];
                i64::from(x0) * i64::from(y1) - i64::from(x1) * i64::from(y0)
            })
            .sum();
        assert!(area2 > 0);
    }
}
