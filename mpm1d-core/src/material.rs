//! Constitutive models.
//!
//! Materials are immutable once created and shared by every particle that
//! references them. Each variant supplies one behaviour: updating the stress
//! of a particle from its current strain increment.

use crate::error::{Error, Result};
use crate::particle::Particle;
use serde::{Deserialize, Serialize};

/// Material behaviour for a 1D continuum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Material {
    /// Small-strain linear elasticity, `dσ = E dε`.
    LinearElastic {
        /// Young's modulus E (Pa).
        youngs_modulus: f64,
        /// Mass density (kg/m³).
        density: f64,
    },
    /// Newtonian viscous fluid, `σ = μ dε / dt`.
    NewtonianFluid {
        /// Dynamic viscosity μ (Pa·s).
        viscosity: f64,
        /// Mass density (kg/m³).
        density: f64,
    },
}

impl Material {
    /// Create a linear elastic material.
    ///
    /// # Errors
    ///
    /// Returns error if the modulus or density is not strictly positive.
    pub fn linear_elastic(youngs_modulus: f64, density: f64) -> Result<Self> {
        if !(youngs_modulus > 0.0) {
            return Err(Error::InvalidMaterial(
                "Young's modulus must be positive".into(),
            ));
        }
        check_density(density)?;
        Ok(Material::LinearElastic {
            youngs_modulus,
            density,
        })
    }

    /// Create a Newtonian fluid.
    ///
    /// # Errors
    ///
    /// Returns error if the viscosity is negative or the density is not
    /// strictly positive.
    pub fn newtonian_fluid(viscosity: f64, density: f64) -> Result<Self> {
        if !(viscosity >= 0.0) {
            return Err(Error::InvalidMaterial(
                "viscosity must be non-negative".into(),
            ));
        }
        check_density(density)?;
        Ok(Material::NewtonianFluid { viscosity, density })
    }

    /// Reference mass density.
    pub fn density(&self) -> f64 {
        match *self {
            Material::LinearElastic { density, .. } => density,
            Material::NewtonianFluid { density, .. } => density,
        }
    }

    /// 1D elastic wave speed `c = sqrt(E / ρ)`, `None` for fluids.
    pub fn wave_speed(&self) -> Option<f64> {
        match *self {
            Material::LinearElastic {
                youngs_modulus,
                density,
            } => Some((youngs_modulus / density).sqrt()),
            Material::NewtonianFluid { .. } => None,
        }
    }

    /// Largest stable explicit time step for a grid of the given spacing.
    pub fn critical_time_step(&self, cell_length: f64) -> Option<f64> {
        self.wave_speed().map(|c| cell_length / c)
    }

    /// Update the stress of `particle` from its strain increment.
    ///
    /// Only `particle.stress` is written.
    pub fn update_stress(&self, particle: &mut Particle, dt: f64) {
        match *self {
            Material::LinearElastic { youngs_modulus, .. } => {
                particle.stress += particle.dstrain * youngs_modulus;
            }
            Material::NewtonianFluid { viscosity, .. } => {
                particle.stress = viscosity * particle.dstrain / dt;
            }
        }
    }
}

fn check_density(density: f64) -> Result<()> {
    if !(density > 0.0) {
        return Err(Error::InvalidMaterial("density must be positive".into()));
    }
    Ok(())
}
