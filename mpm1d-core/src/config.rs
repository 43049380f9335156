//! Simulation configuration.
//!
//! A [`SimulationConfig`] selects the stress update scheme, the shape
//! function family, the time integration parameters and the particle field
//! recorded into the output series. It can be built in code or read from a
//! TOML file:
//!
//! ```toml
//! scheme = "MUSL"
//! shape_function = "linear"
//! time = 10.0
//! dt = 0.001
//! damping = 0.0
//! fixed_nodes = [0]
//! output_particle = "last"
//! output_field = "position"
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::shape::ShapeFunction;

/// Ordering of the stress update within a time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpdateScheme {
    /// Update Stress Last.
    #[serde(rename = "USL")]
    Usl,
    /// Update Stress First.
    #[serde(rename = "USF")]
    Usf,
    /// Modified Update Stress Last.
    #[default]
    #[serde(rename = "MUSL")]
    Musl,
}

impl UpdateScheme {
    pub fn name(self) -> &'static str {
        match self {
            UpdateScheme::Usl => "USL",
            UpdateScheme::Usf => "USF",
            UpdateScheme::Musl => "MUSL",
        }
    }
}

impl fmt::Display for UpdateScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpdateScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "USL" => Ok(UpdateScheme::Usl),
            "USF" => Ok(UpdateScheme::Usf),
            "MUSL" => Ok(UpdateScheme::Musl),
            _ => Err(Error::Config(format!(
                "unknown update scheme '{}', expected USL, USF or MUSL",
                s
            ))),
        }
    }
}

/// Particle field recorded into the output series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputField {
    #[default]
    Position,
    Velocity,
    Stress,
}

impl OutputField {
    pub fn name(self) -> &'static str {
        match self {
            OutputField::Position => "position",
            OutputField::Velocity => "velocity",
            OutputField::Stress => "stress",
        }
    }
}

impl FromStr for OutputField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "position" => Ok(OutputField::Position),
            "velocity" => Ok(OutputField::Velocity),
            "stress" => Ok(OutputField::Stress),
            _ => Err(Error::Config(format!(
                "unknown output field '{}', expected position, velocity or stress",
                s
            ))),
        }
    }
}

/// Which particle is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleSelector {
    First,
    #[default]
    Last,
    /// Particle with the given id.
    Index(usize),
}

impl ParticleSelector {
    /// Resolve to a particle id for a collection of `n_particles`.
    pub fn resolve(self, n_particles: usize) -> Option<usize> {
        match self {
            ParticleSelector::First => (n_particles > 0).then_some(0),
            ParticleSelector::Last => n_particles.checked_sub(1),
            ParticleSelector::Index(i) => (i < n_particles).then_some(i),
        }
    }
}

fn default_fixed_nodes() -> Vec<usize> {
    vec![0]
}

/// Parameters of one explicit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Stress update scheme.
    #[serde(default)]
    pub scheme: UpdateScheme,
    /// Shape function family.
    #[serde(default)]
    pub shape_function: ShapeFunction,
    /// Total simulated time.
    pub time: f64,
    /// Time step.
    pub dt: f64,
    /// Local damping coefficient (0 disables damping).
    #[serde(default)]
    pub damping: f64,
    /// Nodes with an essential (fixed) boundary condition.
    #[serde(default = "default_fixed_nodes")]
    pub fixed_nodes: Vec<usize>,
    /// Particle whose field is recorded.
    #[serde(default)]
    pub output_particle: ParticleSelector,
    /// Recorded field.
    #[serde(default)]
    pub output_field: OutputField,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scheme: UpdateScheme::Musl,
            shape_function: ShapeFunction::Linear,
            time: 1.0,
            dt: 1e-3,
            damping: 0.0,
            fixed_nodes: default_fixed_nodes(),
            output_particle: ParticleSelector::Last,
            output_field: OutputField::Position,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration with the given scheme, total time and step.
    pub fn new(scheme: UpdateScheme, time: f64, dt: f64) -> Self {
        Self {
            scheme,
            time,
            dt,
            ..Default::default()
        }
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_shape_function(mut self, shape_function: ShapeFunction) -> Self {
        self.shape_function = shape_function;
        self
    }

    pub fn with_output(mut self, particle: ParticleSelector, field: OutputField) -> Self {
        self.output_particle = particle;
        self.output_field = field;
        self
    }

    pub fn with_fixed_nodes(mut self, nodes: Vec<usize>) -> Self {
        self.fixed_nodes = nodes;
        self
    }

    /// Check the time integration parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a non-positive time step, a negative or
    /// non-finite total time, a negative damping coefficient, or a step
    /// count that does not fit in `usize`.
    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(Error::Config(format!(
                "time step must be positive, got {}",
                self.dt
            )));
        }
        if !(self.time >= 0.0) || !self.time.is_finite() {
            return Err(Error::Config(format!(
                "total time must be non-negative, got {}",
                self.time
            )));
        }
        if !(self.damping >= 0.0) {
            return Err(Error::Config(format!(
                "damping coefficient must be non-negative, got {}",
                self.damping
            )));
        }
        if self.time / self.dt >= usize::MAX as f64 {
            return Err(Error::Config(format!(
                "total time {} is too many steps of {}",
                self.time, self.dt
            )));
        }
        Ok(())
    }

    /// Number of samples the run records: steps at `0, dt, ..` up to `time`.
    pub fn n_samples(&self) -> usize {
        ((self.time / self.dt + 1e-9).floor() as usize).saturating_add(1)
    }

    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
