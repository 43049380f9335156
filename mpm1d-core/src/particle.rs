//! Material points.

use serde::{Deserialize, Serialize};

/// A material point carrying mass, kinematic and stress state.
///
/// Particles reference their material and containing element by index into
/// the owning [`Mesh`](crate::mesh::Mesh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Particle identifier (index in the mesh particle list).
    pub id: usize,
    /// Current position.
    pub position: f64,
    /// Particle mass.
    pub mass: f64,
    /// Current mass density.
    pub density: f64,
    /// Velocity.
    pub velocity: f64,
    /// Axial stress.
    pub stress: f64,
    /// Strain increment of the last stress update.
    pub dstrain: f64,
    /// External force applied to the particle.
    pub f_ext: f64,
    /// Index into the mesh material table.
    pub material: usize,
    /// Index of the element currently containing the particle.
    pub element: usize,
    /// Weight of the element's left node.
    pub n1: f64,
    /// Weight of the element's right node.
    pub n2: f64,
    /// Weight gradient of the element's left node.
    pub dn1: f64,
    /// Weight gradient of the element's right node.
    pub dn2: f64,
}

impl Particle {
    /// Create a particle at rest with zero stress.
    pub fn new(id: usize, position: f64, mass: f64, material: usize, density: f64) -> Self {
        Self {
            id,
            position,
            mass,
            density,
            velocity: 0.0,
            stress: 0.0,
            dstrain: 0.0,
            f_ext: 0.0,
            material,
            element: 0,
            n1: 0.0,
            n2: 0.0,
            dn1: 0.0,
            dn2: 0.0,
        }
    }

    /// Set the initial velocity.
    pub fn set_velocity(&mut self, velocity: f64) -> &mut Self {
        self.velocity = velocity;
        self
    }

    /// Set the external force.
    pub fn set_external_force(&mut self, force: f64) -> &mut Self {
        self.f_ext = force;
        self
    }

    /// Momentum `m v`.
    pub fn momentum(&self) -> f64 {
        self.mass * self.velocity
    }

    /// Current volume per unit cross-section, `m / ρ`.
    pub fn volume(&self) -> f64 {
        self.mass / self.density
    }

    /// Current half-length of the particle domain, used by GIMP.
    pub fn half_size(&self) -> f64 {
        0.5 * self.volume()
    }
}
