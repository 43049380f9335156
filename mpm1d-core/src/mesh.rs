//! Background grid and particle storage.
//!
//! The mesh is an arena: nodes, elements, particles and materials live in
//! vectors owned by [`Mesh`], and cross references are plain indices.
//! Element `i` spans nodes `i` and `i + 1`, so every interior node is shared
//! by two neighbouring elements.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::material::Material;
use crate::particle::Particle;

/// Grid node with its per-step accumulators.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier.
    pub id: usize,
    /// Node position (fixed for the whole run).
    pub x: f64,
    /// Interpolated mass.
    pub mass: f64,
    /// Velocity `momentum / mass`.
    pub velocity: f64,
    /// Interpolated momentum.
    pub momentum: f64,
    /// Internal force.
    pub f_int: f64,
    /// External force.
    pub f_ext: f64,
    /// Local damping force.
    pub f_damp: f64,
    /// Total force.
    pub f_tot: f64,
}

impl Node {
    /// Create a node with zeroed accumulators.
    pub fn new(id: usize, x: f64) -> Self {
        Self {
            id,
            x,
            ..Default::default()
        }
    }

    /// Zero every accumulator, keeping the position.
    pub fn reset(&mut self) {
        *self = Self::new(self.id, self.x);
    }
}

/// Two-node bar element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element identifier.
    pub id: usize,
    /// Left node index.
    pub n1: usize,
    /// Right node index.
    pub n2: usize,
    /// Element length.
    pub length: f64,
    /// Indices of the particles currently inside `[x(n1), x(n2))`.
    pub particles: Vec<usize>,
}

/// 1D Eulerian grid with its material points.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) nodes: Vec<Node>,
    pub(crate) elements: Vec<Element>,
    pub(crate) particles: Vec<Particle>,
    pub(crate) materials: Vec<Material>,
    length: f64,
    ppelem: usize,
}

impl Mesh {
    /// Create a uniform grid of `n_elements` bars covering `[0, length]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mesh`] if the length is not positive or there are no
    /// elements. Grid geometry errors are reported as mesh errors, not
    /// configuration errors.
    pub fn new(length: f64, n_elements: usize) -> Result<Self> {
        if !(length > 0.0) || !length.is_finite() {
            return Err(Error::Mesh(format!(
                "mesh length must be positive and finite, got {}",
                length
            )));
        }
        if n_elements == 0 {
            return Err(Error::Mesh("mesh needs at least one element".into()));
        }

        let le = length / n_elements as f64;
        let nodes: Vec<Node> = (0..=n_elements)
            .map(|i| Node::new(i, i as f64 * le))
            .collect();
        let elements = (0..n_elements)
            .map(|i| Element {
                id: i,
                n1: i,
                n2: i + 1,
                length: le,
                particles: Vec::new(),
            })
            .collect();

        debug!(length, n_elements, cell_length = le, "created mesh");

        Ok(Self {
            nodes,
            elements,
            particles: Vec::new(),
            materials: Vec::new(),
            length,
            ppelem: 0,
        })
    }

    /// Seed `ppelem` particles of `material` in every element.
    pub fn seed_particles(&mut self, ppelem: usize, material: Material) -> Result<()> {
        let last = self.elements.len() - 1;
        self.seed_particles_in_elements(ppelem, material, 0..=last)
    }

    /// Seed `ppelem` particles of `material` in the elements with ids in `range`.
    ///
    /// Particles are evenly spaced inside each element, the first at
    /// `le / (2 ppelem)` from the left node and the last at the same distance
    /// from the right node. Each carries mass `le ρ / ppelem`.
    ///
    /// # Errors
    ///
    /// Returns error if `ppelem` is zero or the range is empty or exceeds the mesh.
    pub fn seed_particles_in_elements(
        &mut self,
        ppelem: usize,
        material: Material,
        range: RangeInclusive<usize>,
    ) -> Result<()> {
        if ppelem == 0 {
            return Err(Error::Mesh("particles per element must be positive".into()));
        }
        if range.is_empty() || *range.end() >= self.elements.len() {
            return Err(Error::Mesh(format!(
                "element range {:?} is outside the mesh (0..={})",
                range,
                self.elements.len() - 1
            )));
        }

        let material_id = self.register_material(material);
        let density = material.density();
        let n = ppelem as f64;
        let first_id = self.particles.len();

        for eid in range.clone() {
            let element = &mut self.elements[eid];
            let x1 = self.nodes[element.n1].x;
            let x2 = self.nodes[element.n2].x;
            let le = element.length;
            let mass = le * density / n;

            for k in 0..ppelem {
                let position = if k == 0 {
                    x1 + le / (2.0 * n)
                } else if k == ppelem - 1 {
                    x2 - le / (2.0 * n)
                } else {
                    x1 + le / (2.0 * n) + k as f64 * (le / n)
                };

                let id = self.particles.len();
                let mut particle = Particle::new(id, position, mass, material_id, density);
                particle.element = eid;
                element.particles.push(id);
                self.particles.push(particle);
            }
        }

        self.ppelem = ppelem;
        debug!(
            ppelem,
            elements = ?range,
            seeded = self.particles.len() - first_id,
            "seeded particles"
        );
        Ok(())
    }

    /// Add `material` to the material table, reusing an identical entry.
    pub fn register_material(&mut self, material: Material) -> usize {
        if let Some(idx) = self.materials.iter().position(|m| *m == material) {
            return idx;
        }
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Index of the element whose span `[x1, x2)` contains `x`.
    ///
    /// Positions left of the grid map to the first element, positions at or
    /// beyond the right end map to the last one.
    pub fn locate(&self, x: f64) -> usize {
        let nodes = &self.nodes;
        let idx = self
            .elements
            .partition_point(|e| nodes[e.n2].x <= x);
        idx.min(self.elements.len() - 1)
    }

    /// Domain length.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Uniform element length.
    pub fn cell_length(&self) -> f64 {
        self.length / self.elements.len() as f64
    }

    /// Particles per element used by the last seeding.
    pub fn ppelem(&self) -> usize {
        self.ppelem
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn n_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to the particles, for setting initial conditions.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Smallest critical time step over the elastic materials in the mesh.
    ///
    /// `None` when no material has a finite wave speed.
    pub fn critical_time_step(&self) -> Option<f64> {
        let le = self.cell_length();
        self.materials
            .iter()
            .filter_map(|m| m.critical_time_step(le))
            .reduce(f64::min)
    }

    /// Sum of particle masses.
    pub fn total_particle_mass(&self) -> f64 {
        self.particles.iter().map(|p| p.mass).sum()
    }

    /// Sum of nodal masses.
    pub fn total_nodal_mass(&self) -> f64 {
        self.nodes.iter().map(|n| n.mass).sum()
    }

    /// Sum of particle momenta.
    pub fn total_particle_momentum(&self) -> f64 {
        self.particles.iter().map(Particle::momentum).sum()
    }
}
