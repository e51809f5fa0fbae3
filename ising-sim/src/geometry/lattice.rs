use super::offsets::{neighbor_index, N_NEIGHBORS};

/// Periodic 2D square lattice of ±1 spins.
///
/// Sites are indexed in row-major order, `i = y * width + x`. Neighbors are
/// computed on the fly from [`super::offsets::SQUARE`] rather than stored.
#[derive(Debug, Clone)]
pub struct Lattice {
    /// Extent along x.
    pub width: usize,
    /// Extent along y.
    pub height: usize,
    /// Total number of sites (`width * height`).
    pub n_spins: usize,
    spins: Vec<i8>,
}

impl Lattice {
    /// Create a cold-start lattice with every spin set to +1.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(
            width >= 3 && height >= 3,
            "lattice must be at least 3x3, got {width}x{height}"
        );
        let n_spins = width * height;
        Self {
            width,
            height,
            n_spins,
            spins: vec![1; n_spins],
        }
    }

    /// Current spin configuration, row-major.
    #[inline]
    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    /// Copy of the spin configuration, for handing to an observer.
    pub fn snapshot(&self) -> Vec<i8> {
        self.spins.clone()
    }

    #[inline]
    pub fn spin(&self, i: usize) -> i8 {
        self.spins[i]
    }

    #[inline]
    pub fn neighbor(&self, i: usize, dir: usize) -> usize {
        neighbor_index(i, dir, self.width, self.height)
    }

    /// Σ of the four nearest-neighbor spins of site `i`.
    #[inline]
    pub fn neighbor_spin_sum(&self, i: usize) -> i64 {
        (0..N_NEIGHBORS)
            .map(|dir| self.spins[self.neighbor(i, dir)] as i64)
            .sum()
    }

    /// Negate the spin at `i`.
    #[inline]
    pub fn flip(&mut self, i: usize) {
        self.spins[i] = -self.spins[i];
    }

    /// Σ spins.
    pub fn total_magnetization(&self) -> i64 {
        self.spins.iter().map(|&s| s as i64).sum()
    }

    /// Total energy with the coupling factored out: `-½ Σ_i s_i Σ_nn s_j`.
    ///
    /// Every bond is visited from both ends, hence the halving. The sum over
    /// four neighbors of a ±1 spin is even, so the result is exact.
    pub fn total_energy_over_epsilon(&self) -> i64 {
        let double_counted: i64 = (0..self.n_spins)
            .map(|i| -(self.spins[i] as i64) * self.neighbor_spin_sum(i))
            .sum();
        double_counted / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start() {
        let lat = Lattice::new(4, 5);
        assert_eq!(lat.n_spins, 20);
        assert!(lat.spins().iter().all(|&s| s == 1));
        assert_eq!(lat.total_magnetization(), 20);
        assert_eq!(lat.total_energy_over_epsilon(), -40);
        assert_eq!(lat.neighbor_spin_sum(7), 4);
    }

    #[test]
    #[should_panic]
    fn test_rejects_degenerate_size() {
        Lattice::new(2, 8);
    }

    #[test]
    fn test_flip_changes_magnetization_by_twice_new_spin() {
        let mut lat = Lattice::new(3, 4);
        for i in 0..lat.n_spins {
            let before = lat.total_magnetization();
            lat.flip(i);
            let after = lat.total_magnetization();
            assert_eq!(after - before, 2 * lat.spin(i) as i64);
            assert_eq!(after, lat.spins().iter().map(|&s| s as i64).sum::<i64>());
        }
        assert_eq!(lat.total_magnetization(), -12);
    }

    #[test]
    fn test_double_flip_is_identity() {
        let mut lat = Lattice::new(5, 3);
        lat.flip(2);
        lat.flip(9);
        let saved = lat.snapshot();
        for i in 0..lat.n_spins {
            lat.flip(i);
            lat.flip(i);
            assert_eq!(lat.spins(), saved.as_slice());
        }
    }

    #[test]
    fn test_single_flip_energy() {
        let mut lat = Lattice::new(4, 4);
        // Breaking four bonds raises E/eps by 8.
        lat.flip(5);
        assert_eq!(lat.total_energy_over_epsilon(), -32 + 8);
        assert_eq!(lat.neighbor_spin_sum(5), 4);
        assert_eq!(lat.neighbor_spin_sum(6), 2);
    }

    #[test]
    fn test_checkerboard_bounds() {
        let mut lat = Lattice::new(4, 4);
        for i in 0..lat.n_spins {
            if (i % 4 + i / 4) % 2 == 1 {
                lat.flip(i);
            }
        }
        let n = lat.n_spins as i64;
        assert_eq!(lat.total_magnetization(), 0);
        assert_eq!(lat.total_energy_over_epsilon(), 2 * n);
    }
}
