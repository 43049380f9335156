//! mpm1d Core - One-dimensional Material Point Method
//!
//! Explicit dynamics of a 1D continuum (bar or pile) with:
//! - Linear and contiguous-particle GIMP shape functions
//! - Linear elastic and Newtonian fluid materials
//! - USL, USF and MUSL stress update schemes
//! - Local damping and fixed-node boundary conditions
//! - Parallel parameter sweeps using Rayon
//!
//! # Architecture
//!
//! The solver is designed around these core abstractions:
//!
//! - [`Mesh`]: Background grid of nodes and elements owning the particles
//! - [`Material`]: Constitutive stress update
//! - [`SimulationConfig`]: Scheme, time stepping and output selection
//! - [`ExplicitSolver`]: Tick-by-tick iterator over the output samples
//!
//! ```no_run
//! use mpm1d_core::{run_explicit, Material, Mesh, SimulationConfig, UpdateScheme};
//!
//! let mut mesh = Mesh::new(1.0, 1)?;
//! mesh.seed_particles(1, Material::linear_elastic(50.0, 1.0)?)?;
//! mesh.particles_mut()[0].set_velocity(0.1);
//!
//! let config = SimulationConfig::new(UpdateScheme::Musl, 10.0, 1e-3);
//! let series = run_explicit(&mut mesh, &config)?;
//! println!("{} samples", series.len());
//! # Ok::<(), mpm1d_core::Error>(())
//! ```

pub mod analytical;
pub mod config;
pub mod error;
pub mod integration;
pub mod interpolation;
pub mod material;
pub mod mesh;
pub mod particle;
pub mod shape;
pub mod solver;
pub mod sweep;
pub mod update;

pub use analytical::ElasticBar;
pub use config::{OutputField, ParticleSelector, SimulationConfig, UpdateScheme};
pub use error::{Error, Result};
pub use material::Material;
pub use mesh::{Element, Mesh, Node};
pub use particle::Particle;
pub use shape::ShapeFunction;
pub use solver::{run_explicit, ExplicitSolver, OutputSeries, Phase, Sample, SolverState};
pub use sweep::run_sweep;
