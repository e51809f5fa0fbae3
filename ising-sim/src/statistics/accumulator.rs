/// Thermodynamic averages derived from an [`Accumulator`], all per site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermoResults {
    /// ⟨|M|⟩/N.
    pub magnetization: f64,
    /// Binder cumulant U4 = 1 − ⟨M⁴⟩ / (3⟨M²⟩²).
    pub binder_cumulant: f64,
    /// Cv/N = ε² (⟨H²⟩ − ⟨H⟩²) / N.
    pub specific_heat: f64,
    /// χ/N = ε (⟨M²⟩ − ⟨|M|⟩²) / N.
    pub susceptibility: f64,
    /// ⟨H⟩/N in units of kT.
    pub energy: f64,
}

/// Running moments of |M| and H over the sampling phase.
///
/// Magnetization is sampled as an absolute value; energy is sampled signed and
/// already scaled by ε.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    pub sample_count: u64,
    pub m_sum: f64,
    pub m2_sum: f64,
    pub m4_sum: f64,
    pub h_sum: f64,
    pub h2_sum: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Add one sample. `abs_magnetization` is |Σ s|, `energy` is H/kT for the
    /// whole lattice.
    pub fn push(&mut self, abs_magnetization: f64, energy: f64) {
        let m2 = abs_magnetization * abs_magnetization;
        self.sample_count += 1;
        self.m_sum += abs_magnetization;
        self.m2_sum += m2;
        self.m4_sum += m2 * m2;
        self.h_sum += energy;
        self.h2_sum += energy * energy;
    }

    pub fn is_finite(&self) -> bool {
        [self.m_sum, self.m2_sum, self.m4_sum, self.h_sum, self.h2_sum]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Per-site averages over `n_spins` sites at coupling `epsilon`.
    ///
    /// `None` until at least one sample has been pushed.
    pub fn derived(&self, n_spins: usize, epsilon: f64) -> Option<ThermoResults> {
        if self.sample_count == 0 {
            return None;
        }
        let n = self.sample_count as f64;
        let sites = n_spins as f64;

        let m_avg = self.m_sum / n;
        let m2_avg = self.m2_sum / n;
        let m4_avg = self.m4_sum / n;
        let h_avg = self.h_sum / n;
        let h2_avg = self.h2_sum / n;

        // A run that only ever saw M = 0 has no defined ratio; report the
        // disordered-phase limit.
        let binder_cumulant = if m2_avg > 0.0 {
            1.0 - m4_avg / (3.0 * m2_avg * m2_avg)
        } else {
            0.0
        };

        Some(ThermoResults {
            magnetization: m_avg / sites,
            binder_cumulant,
            specific_heat: epsilon * epsilon * (h2_avg - h_avg * h_avg) / sites,
            susceptibility: epsilon * (m2_avg - m_avg * m_avg) / sites,
            energy: h_avg / sites,
        })
    }
}
