/// Nearest-neighbor displacement vectors `(dx, dy)` on the 2D square lattice.
///
/// Order is fixed: up, right, down, left. Direction `d` and `(d + 2) % 4` are
/// opposite to each other.
pub const SQUARE: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Number of nearest neighbors per site.
pub const N_NEIGHBORS: usize = SQUARE.len();

/// Direction pointing back along `dir`.
#[inline]
pub fn opposite(dir: usize) -> usize {
    (dir + 2) % N_NEIGHBORS
}

/// Wrap a coordinate that has moved at most one step outside `0..size`.
#[inline]
fn wrap(r: isize, size: isize) -> isize {
    if r < 0 {
        r + size
    } else if r >= size {
        r - size
    } else {
        r
    }
}

/// Linear index of the neighbor of site `i` in direction `dir`.
///
/// Sites are row-major, `i = y * width + x`. Periodic boundaries are applied
/// independently on each axis.
#[inline]
pub fn neighbor_index(i: usize, dir: usize, width: usize, height: usize) -> usize {
    let (dx, dy) = SQUARE[dir];
    let x = wrap((i % width) as isize + dx, width as isize);
    let y = wrap((i / width) as isize + dy, height as isize);
    y as usize * width + x as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_wraps() {
        // 4x3 lattice:
        // 0 1 2 3
        // 4 5 6 7
        // 8 9 10 11
        assert_eq!(neighbor_index(0, 0, 4, 3), 4);
        assert_eq!(neighbor_index(0, 1, 4, 3), 1);
        assert_eq!(neighbor_index(0, 2, 4, 3), 8);
        assert_eq!(neighbor_index(0, 3, 4, 3), 3);

        assert_eq!(neighbor_index(11, 0, 4, 3), 3);
        assert_eq!(neighbor_index(11, 1, 4, 3), 8);
        assert_eq!(neighbor_index(11, 2, 4, 3), 7);
        assert_eq!(neighbor_index(11, 3, 4, 3), 10);
    }

    #[test]
    fn test_opposite_direction_is_inverse() {
        for width in 3..7 {
            for height in 3..7 {
                for i in 0..width * height {
                    for dir in 0..N_NEIGHBORS {
                        let j = neighbor_index(i, dir, width, height);
                        assert!(j < width * height);
                        assert_ne!(i, j);
                        assert_eq!(neighbor_index(j, opposite(dir), width, height), i);
                    }
                }
            }
        }
    }
}
