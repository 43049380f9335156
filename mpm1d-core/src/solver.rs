//! Explicit time integration.
//!
//! The solver advances the mesh one tick at a time. A tick runs a fixed
//! sequence of [`Phase`]s chosen by the configured [`UpdateScheme`]; the
//! schemes differ only in where the stress update sits relative to the
//! momentum update, so the whole ordering lives in [`UpdateScheme::phases`].
//!
//! [`ExplicitSolver`] is an iterator: each call to `next` runs one tick and
//! yields the recorded [`Sample`]. [`run_explicit`] drives a solver to
//! completion and collects the [`OutputSeries`].

use std::io;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::config::{OutputField, SimulationConfig, UpdateScheme};
use crate::error::{Error, Result};
use crate::integration::{advance_momentum, total_force};
use crate::interpolation::{
    external_force_to_nodes, internal_force_to_nodes, mass_to_nodes, momentum_to_nodes,
};
use crate::mesh::Mesh;
use crate::particle::Particle;
use crate::update::{
    particle_position, particle_velocity, rebuild_nodal_momentum, refresh_interpolation,
    relocate_particles, reset_nodes, update_stress,
};

/// One stage of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Relocate particles and refresh their interpolation values.
    Locate,
    /// Transfer particle mass and momentum to the grid.
    ParticlesToGrid,
    /// Zero momentum on fixed nodes.
    FixMomentum,
    /// Nodal velocity, strain increment, density and stress.
    StressUpdate,
    /// Transfer internal and external forces, then assemble total force.
    ForcesToGrid,
    /// Zero total force on fixed nodes.
    FixForce,
    /// Integrate nodal momentum.
    IntegrateMomentum,
    /// Update particle velocity and position.
    UpdateParticles,
    /// Rebuild nodal momentum from the updated particle velocities and
    /// re-impose the fixed nodes.
    RebuildMomentum,
    /// Zero every nodal accumulator.
    ResetGrid,
}

const USF_PHASES: &[Phase] = &[
    Phase::Locate,
    Phase::ParticlesToGrid,
    Phase::FixMomentum,
    Phase::StressUpdate,
    Phase::ForcesToGrid,
    Phase::FixForce,
    Phase::IntegrateMomentum,
    Phase::UpdateParticles,
    Phase::ResetGrid,
];

const USL_PHASES: &[Phase] = &[
    Phase::Locate,
    Phase::ParticlesToGrid,
    Phase::FixMomentum,
    Phase::ForcesToGrid,
    Phase::FixForce,
    Phase::IntegrateMomentum,
    Phase::UpdateParticles,
    Phase::StressUpdate,
    Phase::ResetGrid,
];

const MUSL_PHASES: &[Phase] = &[
    Phase::Locate,
    Phase::ParticlesToGrid,
    Phase::FixMomentum,
    Phase::ForcesToGrid,
    Phase::FixForce,
    Phase::IntegrateMomentum,
    Phase::UpdateParticles,
    Phase::RebuildMomentum,
    Phase::StressUpdate,
    Phase::ResetGrid,
];

impl UpdateScheme {
    /// Ordered phases of one tick under this scheme.
    pub fn phases(self) -> &'static [Phase] {
        match self {
            UpdateScheme::Usf => USF_PHASES,
            UpdateScheme::Usl => USL_PHASES,
            UpdateScheme::Musl => MUSL_PHASES,
        }
    }
}

/// Lifecycle of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// Created, no tick run yet.
    Idle,
    /// At least one tick run, more to go.
    Stepping,
    /// Total time reached.
    Done,
}

/// Recorded value at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

/// Time series of one particle field over a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSeries {
    /// Scheme used for the run.
    pub scheme: UpdateScheme,
    /// Recorded field.
    pub field: OutputField,
    /// Recorded particle id.
    pub particle: usize,
    /// Samples in time order.
    pub samples: Vec<Sample>,
}

impl OutputSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Largest absolute recorded value after `from_time`.
    pub fn peak_after(&self, from_time: f64) -> f64 {
        self.samples
            .iter()
            .filter(|s| s.time >= from_time)
            .map(|s| s.value.abs())
            .fold(0.0, f64::max)
    }

    /// Write the series as CSV with a `time,<field>` header.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["time", self.field.name()])?;
        for s in &self.samples {
            wtr.write_record([s.time.to_string(), s.value.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn field_value(particle: &Particle, field: OutputField) -> f64 {
    match field {
        OutputField::Position => particle.position,
        OutputField::Velocity => particle.velocity,
        OutputField::Stress => particle.stress,
    }
}

/// Explicit MPM solver bound to one mesh for one run.
pub struct ExplicitSolver<'m> {
    mesh: &'m mut Mesh,
    config: SimulationConfig,
    output_particle: usize,
    state: SolverState,
    step: usize,
    n_steps: usize,
}

impl<'m> ExplicitSolver<'m> {
    /// Bind a solver to `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid, a fixed
    /// node does not exist, or the recorded particle does not exist.
    pub fn new(mesh: &'m mut Mesh, config: &SimulationConfig) -> Result<Self> {
        config.validate()?;

        if let Some(&node) = config.fixed_nodes.iter().find(|&&n| n >= mesh.n_nodes()) {
            return Err(Error::Config(format!(
                "fixed node {} does not exist (mesh has {} nodes)",
                node,
                mesh.n_nodes()
            )));
        }

        let output_particle = config
            .output_particle
            .resolve(mesh.n_particles())
            .ok_or_else(|| {
                Error::Config(format!(
                    "output particle {:?} does not exist (mesh has {} particles)",
                    config.output_particle,
                    mesh.n_particles()
                ))
            })?;

        Ok(Self {
            mesh,
            config: config.clone(),
            output_particle,
            state: SolverState::Idle,
            step: 0,
            n_steps: config.n_samples(),
        })
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn mesh(&self) -> &Mesh {
        &*self.mesh
    }

    /// Id of the recorded particle.
    pub fn output_particle(&self) -> usize {
        self.output_particle
    }

    /// Number of ticks completed.
    pub fn steps_taken(&self) -> usize {
        self.step
    }

    /// Simulation time of the next tick.
    pub fn time(&self) -> f64 {
        self.step as f64 * self.config.dt
    }

    /// Run one tick, calling `observer` after every completed phase.
    ///
    /// Returns `None` once the solver is done.
    pub fn tick_with<F>(&mut self, mut observer: F) -> Option<Sample>
    where
        F: FnMut(Phase, &Mesh),
    {
        if self.state == SolverState::Done {
            return None;
        }
        self.state = SolverState::Stepping;

        let dt = self.config.dt;
        // Half step on the first tick staggers velocities for leapfrog.
        let dt_momentum = if self.step == 0 { dt / 2.0 } else { dt };

        for &phase in self.config.scheme.phases() {
            self.run_phase(phase, dt, dt_momentum);
            observer(phase, &*self.mesh);
        }

        let sample = Sample {
            time: self.time(),
            value: field_value(
                &self.mesh.particles[self.output_particle],
                self.config.output_field,
            ),
        };
        trace!(step = self.step, time = sample.time, value = sample.value, "tick");

        self.step += 1;
        if self.step >= self.n_steps {
            self.state = SolverState::Done;
        }
        Some(sample)
    }

    fn run_phase(&mut self, phase: Phase, dt: f64, dt_momentum: f64) {
        let mesh = &mut *self.mesh;
        match phase {
            Phase::Locate => {
                relocate_particles(mesh);
                refresh_interpolation(mesh, self.config.shape_function);
            }
            Phase::ParticlesToGrid => {
                mass_to_nodes(mesh);
                momentum_to_nodes(mesh);
            }
            Phase::FixMomentum => {
                for &n in &self.config.fixed_nodes {
                    mesh.nodes[n].momentum = 0.0;
                }
            }
            Phase::StressUpdate => update_stress(mesh, dt),
            Phase::ForcesToGrid => {
                internal_force_to_nodes(mesh);
                external_force_to_nodes(mesh);
                total_force(mesh, self.config.damping);
            }
            Phase::FixForce => {
                for &n in &self.config.fixed_nodes {
                    mesh.nodes[n].f_tot = 0.0;
                }
            }
            Phase::IntegrateMomentum => advance_momentum(mesh, dt_momentum),
            Phase::UpdateParticles => {
                particle_velocity(mesh, dt_momentum);
                particle_position(mesh, dt);
            }
            Phase::RebuildMomentum => {
                rebuild_nodal_momentum(mesh);
                for &n in &self.config.fixed_nodes {
                    mesh.nodes[n].velocity = 0.0;
                    mesh.nodes[n].momentum = 0.0;
                }
            }
            Phase::ResetGrid => reset_nodes(mesh),
        }
    }
}

impl Iterator for ExplicitSolver<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        self.tick_with(|_, _| {})
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_steps - self.step;
        (remaining, Some(remaining))
    }
}

/// Run an explicit simulation over `[0, config.time]`.
///
/// The mesh is left in its final state.
pub fn run_explicit(mesh: &mut Mesh, config: &SimulationConfig) -> Result<OutputSeries> {
    let start = Instant::now();
    let solver = ExplicitSolver::new(mesh, config)?;
    let particle = solver.output_particle();

    info!(
        scheme = %config.scheme,
        dt = config.dt,
        time = config.time,
        steps = config.n_samples(),
        particles = solver.mesh().n_particles(),
        "starting explicit run"
    );

    let samples: Vec<Sample> = solver.collect();

    info!(
        samples = samples.len(),
        elapsed_seconds = start.elapsed().as_secs_f64(),
        "explicit run finished"
    );

    Ok(OutputSeries {
        scheme: config.scheme,
        field: config.output_field,
        particle,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParticleSelector;
    use crate::material::Material;
    use approx::assert_relative_eq;

    fn single_mass(velocity: f64) -> Mesh {
        let mut mesh = Mesh::new(1.0, 1).unwrap();
        mesh.seed_particles(1, Material::linear_elastic(50.0, 1.0).unwrap())
            .unwrap();
        mesh.particles_mut()[0].set_velocity(velocity);
        mesh
    }

    #[test]
    fn test_phase_tables() {
        for scheme in [UpdateScheme::Usl, UpdateScheme::Usf, UpdateScheme::Musl] {
            let phases = scheme.phases();
            assert_eq!(phases.first(), Some(&Phase::Locate));
            assert_eq!(phases.last(), Some(&Phase::ResetGrid));
            assert_eq!(phases.iter().filter(|&&p| p == Phase::StressUpdate).count(), 1);
        }

        let position = |scheme: UpdateScheme, phase| {
            scheme.phases().iter().position(|&p| p == phase).unwrap()
        };
        assert!(
            position(UpdateScheme::Usf, Phase::StressUpdate)
                < position(UpdateScheme::Usf, Phase::ForcesToGrid)
        );
        assert!(
            position(UpdateScheme::Usl, Phase::StressUpdate)
                > position(UpdateScheme::Usl, Phase::UpdateParticles)
        );
        assert!(
            position(UpdateScheme::Musl, Phase::StressUpdate)
                > position(UpdateScheme::Musl, Phase::RebuildMomentum)
        );
        assert!(!UpdateScheme::Usl.phases().contains(&Phase::RebuildMomentum));
    }

    #[test]
    fn test_state_machine() {
        let mut mesh = single_mass(0.1);
        let config = SimulationConfig::new(UpdateScheme::Musl, 0.02, 0.01);
        let mut solver = ExplicitSolver::new(&mut mesh, &config).unwrap();

        assert_eq!(solver.state(), SolverState::Idle);
        assert_eq!(solver.size_hint(), (3, Some(3)));

        let first = solver.next().unwrap();
        assert_eq!(first.time, 0.0);
        assert_eq!(solver.state(), SolverState::Stepping);

        assert!(solver.next().is_some());
        let last = solver.next().unwrap();
        assert_relative_eq!(last.time, 0.02);
        assert_eq!(solver.state(), SolverState::Done);
        assert!(solver.next().is_none());
        assert_eq!(solver.steps_taken(), 3);
    }

    #[test]
    fn test_series_covers_total_time() {
        let mut mesh = single_mass(0.1);
        let config = SimulationConfig::new(UpdateScheme::Usf, 1.0, 0.001);
        let series = run_explicit(&mut mesh, &config).unwrap();

        assert_eq!(series.len(), 1001);
        assert_eq!(series.particle, 0);
        for (i, s) in series.samples.iter().enumerate() {
            assert_relative_eq!(s.time, i as f64 * 0.001, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_first_tick_uses_half_step() {
        // With zero stress the first tick only sees the external force.
        let mut mesh = single_mass(0.0);
        mesh.particles_mut()[0].set_external_force(2.0);
        let config = SimulationConfig::new(UpdateScheme::Usf, 0.1, 0.1)
            .with_fixed_nodes(vec![])
            .with_output(ParticleSelector::First, OutputField::Velocity);

        let mut solver = ExplicitSolver::new(&mut mesh, &config).unwrap();
        let sample = solver.next().unwrap();
        // a = f / m = 2, v = a dt / 2
        assert_relative_eq!(sample.value, 0.1, epsilon = 1e-12);

        let sample = solver.next().unwrap();
        assert!(sample.value > 0.1);
    }

    #[test]
    fn test_fixed_node_invariant() {
        for scheme in [UpdateScheme::Usl, UpdateScheme::Usf, UpdateScheme::Musl] {
            let mut mesh = Mesh::new(4.0, 8).unwrap();
            mesh.seed_particles(2, Material::linear_elastic(100.0, 1.0).unwrap())
                .unwrap();
            for p in mesh.particles_mut() {
                p.velocity = 0.05 * (1.0 + p.position);
                p.f_ext = -0.3;
            }
            let config = SimulationConfig::new(scheme, 0.5, 0.01).with_damping(0.05);
            let mut solver = ExplicitSolver::new(&mut mesh, &config).unwrap();

            let mut checked = 0;
            while solver
                .tick_with(|phase, mesh| {
                    let fixed = &mesh.nodes()[0];
                    match phase {
                        Phase::FixMomentum => assert_eq!(fixed.momentum, 0.0),
                        Phase::FixForce => {
                            assert_eq!(fixed.momentum, 0.0);
                            assert_eq!(fixed.f_tot, 0.0);
                            checked += 1;
                        }
                        Phase::IntegrateMomentum => assert_eq!(fixed.momentum, 0.0),
                        Phase::RebuildMomentum => {
                            assert_eq!(fixed.momentum, 0.0);
                            assert_eq!(fixed.velocity, 0.0);
                        }
                        _ => {}
                    }
                })
                .is_some()
            {}
            assert_eq!(checked, 51, "{}", scheme);
        }
    }

    #[test]
    fn test_nodes_are_reset_after_every_tick() {
        let mut mesh = single_mass(0.1);
        let config = SimulationConfig::new(UpdateScheme::Musl, 0.05, 0.01);
        run_explicit(&mut mesh, &config).unwrap();

        for node in mesh.nodes() {
            assert_eq!(node.mass, 0.0);
            assert_eq!(node.momentum, 0.0);
            assert_eq!(node.f_tot, 0.0);
        }
    }

    #[test]
    fn test_invalid_solver_setup() {
        let mut mesh = single_mass(0.1);
        let bad_dt = SimulationConfig::new(UpdateScheme::Musl, 1.0, 0.0);
        assert!(matches!(run_explicit(&mut mesh, &bad_dt), Err(Error::Config(_))));

        let too_long = SimulationConfig::new(UpdateScheme::Musl, 1e20, 1.0);
        assert!(matches!(
            ExplicitSolver::new(&mut mesh, &too_long),
            Err(Error::Config(_))
        ));

        let bad_node =
            SimulationConfig::new(UpdateScheme::Musl, 1.0, 0.1).with_fixed_nodes(vec![2]);
        assert!(matches!(run_explicit(&mut mesh, &bad_node), Err(Error::Config(_))));

        let bad_particle = SimulationConfig::new(UpdateScheme::Musl, 1.0, 0.1)
            .with_output(ParticleSelector::Index(1), OutputField::Position);
        assert!(matches!(run_explicit(&mut mesh, &bad_particle), Err(Error::Config(_))));

        let mut empty = Mesh::new(1.0, 1).unwrap();
        let config = SimulationConfig::new(UpdateScheme::Musl, 1.0, 0.1);
        assert!(run_explicit(&mut empty, &config).is_err());
    }

    #[test]
    fn test_bar_at_rest_stays_at_rest() {
        let mut mesh = Mesh::new(2.0, 4).unwrap();
        mesh.seed_particles(2, Material::linear_elastic(10.0, 1.0).unwrap())
            .unwrap();
        let initial: Vec<f64> = mesh.particles().iter().map(|p| p.position).collect();

        let config = SimulationConfig::new(UpdateScheme::Usl, 1.0, 0.01);
        let series = run_explicit(&mut mesh, &config).unwrap();

        assert!(series.values().iter().all(|&x| x == initial[7]));
        for (p, x0) in mesh.particles().iter().zip(initial) {
            assert_eq!(p.position, x0);
            assert_eq!(p.stress, 0.0);
        }
    }

    #[test]
    fn test_write_csv() {
        let series = OutputSeries {
            scheme: UpdateScheme::Musl,
            field: OutputField::Velocity,
            particle: 0,
            samples: vec![
                Sample { time: 0.0, value: 0.5 },
                Sample { time: 0.25, value: -1.0 },
            ],
        };
        let mut buf = Vec::new();
        series.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "time,velocity\n0,0.5\n0.25,-1\n");
    }
}
