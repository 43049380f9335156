//! Parallel parameter sweeps.
//!
//! Each entry of a sweep builds its own mesh and configuration and runs to
//! completion independently, so entries are distributed across the rayon
//! thread pool. A single run is never split across threads.

use rayon::prelude::*;
use tracing::info;

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::solver::{run_explicit, OutputSeries};

/// Run one simulation per entry of `params`.
///
/// `build` turns a parameter set into a ready-to-run mesh and configuration.
/// Results are returned in the order of `params`; a failing entry does not
/// stop the others.
pub fn run_sweep<P, F>(params: &[P], build: F) -> Vec<Result<OutputSeries>>
where
    P: Sync,
    F: Fn(&P) -> Result<(Mesh, SimulationConfig)> + Sync,
{
    info!(runs = params.len(), "starting sweep");

    params
        .par_iter()
        .map(|p| {
            let (mut mesh, config) = build(p)?;
            run_explicit(&mut mesh, &config)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateScheme;
    use crate::error::Error;
    use crate::material::Material;

    fn single_mass(velocity: &f64) -> Result<(Mesh, SimulationConfig)> {
        let mut mesh = Mesh::new(1.0, 1)?;
        mesh.seed_particles(1, Material::linear_elastic(50.0, 1.0)?)?;
        mesh.particles_mut()[0].set_velocity(*velocity);
        Ok((mesh, SimulationConfig::new(UpdateScheme::Musl, 0.5, 0.001)))
    }

    #[test]
    fn test_sweep_matches_sequential_runs() {
        let velocities = [0.05, 0.1, 0.2];
        let results = run_sweep(&velocities, single_mass);

        assert_eq!(results.len(), 3);
        for (v, result) in velocities.iter().zip(results) {
            let series = result.unwrap();
            let (mut mesh, config) = single_mass(v).unwrap();
            let sequential = run_explicit(&mut mesh, &config).unwrap();
            assert_eq!(series, sequential);
        }
    }

    #[test]
    fn test_sweep_keeps_failures_per_entry() {
        let dts = [0.01, -1.0];
        let results = run_sweep(&dts, |&dt| {
            let (mesh, config) = single_mass(&0.1)?;
            Ok((mesh, SimulationConfig { dt, ..config }))
        });

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::Config(_))));
    }
}
