use std::sync::atomic::AtomicBool;
use std::time::Instant;

use ising_sim::config::*;
use ising_sim::run_blocking;

const L: usize = 32;
const N_TEMPS: usize = 8;
const N_EQUIL: usize = 1000;
const N_SAMPLE: usize = 1000;

fn main() {
    let temperatures: Vec<f64> = (0..N_TEMPS)
        .map(|i| 1.5 + 1.5 * i as f64 / (N_TEMPS - 1) as f64)
        .collect();

    let config = ExperimentConfig {
        lattice: LatticeConfig::square(L),
        schedule: ScheduleConfig {
            equilibration_sweeps: N_EQUIL,
            sampling_sweeps: N_SAMPLE,
            sample_interval: 10,
            report_interval: 1000,
        },
        temperatures,
        seed: Some(42),
    };

    println!(
        "Lattice: {}x{}  |  Temps: {}  |  Equilibration: {}  |  Sampling: {}",
        L, L, N_TEMPS, N_EQUIL, N_SAMPLE
    );
    println!("{}", "-".repeat(70));

    let interrupted = AtomicBool::new(false);
    let t0 = Instant::now();
    let reports = match run_blocking(&config, &interrupted) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return;
        }
    };
    let elapsed = t0.elapsed().as_secs_f64();

    for r in &reports {
        if let Some(res) = r.results {
            println!(
                "kT/J = {:.3}  M = {:.4}  Cv = {:.4}  chi = {:.4}",
                r.kt_j, res.magnetization, res.specific_heat, res.susceptibility
            );
        }
    }

    let total_sweeps = (N_TEMPS * (N_EQUIL + N_SAMPLE)) as f64;
    let flips = total_sweeps * (L * L) as f64;
    println!("{}", "-".repeat(70));
    println!(
        "Total: {:.3} s  |  {:.0} sweeps/s  |  {:.1} Mflips/s",
        elapsed,
        total_sweeps / elapsed,
        flips / elapsed / 1e6
    );
}
