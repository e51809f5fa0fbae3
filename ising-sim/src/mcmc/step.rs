use crate::geometry::Lattice;
use rand::Rng;

/// Outcome of one proposed single-spin flip, for O(1) bookkeeping of the
/// running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub accepted: bool,
    /// Change in Σ s (0 if rejected).
    pub delta_magnetization: i64,
    /// Change in E/ε (0 if rejected).
    pub delta_energy_over_eps: i64,
}

impl StepInfo {
    pub const REJECTED: Self = Self {
        accepted: false,
        delta_magnetization: 0,
        delta_energy_over_eps: 0,
    };
}

/// Propose flipping site `i` and apply the Metropolis rule at coupling `epsilon`.
///
/// Moves that do not raise the energy are always taken; uphill moves are taken
/// with probability `exp(-ΔE)`. A uniform draw is consumed only for uphill
/// moves.
#[inline]
pub fn try_flip<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    i: usize,
    epsilon: f64,
    rng: &mut R,
) -> StepInfo {
    let si = lattice.spin(i) as i64;
    let d_e_eps = 2 * si * lattice.neighbor_spin_sum(i);
    let d_e = d_e_eps as f64 * epsilon;

    if d_e <= 0.0 || rng.gen::<f64>() < (-d_e).exp() {
        lattice.flip(i);
        StepInfo {
            accepted: true,
            delta_magnetization: 2 * lattice.spin(i) as i64,
            delta_energy_over_eps: d_e_eps,
        }
    } else {
        StepInfo::REJECTED
    }
}

/// One elementary Metropolis move on a uniformly chosen site.
#[inline]
pub fn metropolis_step<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    epsilon: f64,
    rng: &mut R,
) -> StepInfo {
    let i = rng.gen_range(0..lattice.n_spins);
    try_flip(lattice, i, epsilon, rng)
}
