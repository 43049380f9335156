//! Particle-to-grid transfers.
//!
//! Every transfer has the form `f_I += Σ_p N_I(x_p) f_p` (or its gradient
//! counterpart for the internal force) and accumulates into nodal fields that
//! are expected to be zero on entry. Particles are visited once each, in id
//! order, so repeated runs are bit-for-bit reproducible.

use crate::mesh::{Mesh, Node};
use crate::particle::Particle;

/// Scatter a per-particle pair of nodal contributions onto the grid.
fn scatter<F>(mesh: &mut Mesh, mut contribution: F)
where
    F: FnMut(&Particle, &mut Node, &mut Node),
{
    let Mesh {
        nodes,
        elements,
        particles,
        ..
    } = mesh;

    for p in particles.iter() {
        let element = &elements[p.element];
        let (left, right) = nodes.split_at_mut(element.n2);
        contribution(p, &mut left[element.n1], &mut right[0]);
    }
}

/// Interpolate particle mass to the nodes.
pub fn mass_to_nodes(mesh: &mut Mesh) {
    scatter(mesh, |p, n1, n2| {
        n1.mass += p.mass * p.n1;
        n2.mass += p.mass * p.n2;
    });
}

/// Interpolate particle momentum to the nodes.
pub fn momentum_to_nodes(mesh: &mut Mesh) {
    scatter(mesh, |p, n1, n2| {
        n1.momentum += p.mass * p.velocity * p.n1;
        n2.momentum += p.mass * p.velocity * p.n2;
    });
}

/// Interpolate the divergence of particle stress to nodal internal forces.
pub fn internal_force_to_nodes(mesh: &mut Mesh) {
    scatter(mesh, |p, n1, n2| {
        let volume = p.mass / p.density;
        n1.f_int -= p.dn1 * p.stress * volume;
        n2.f_int -= p.dn2 * p.stress * volume;
    });
}

/// Interpolate particle external forces to the nodes.
pub fn external_force_to_nodes(mesh: &mut Mesh) {
    scatter(mesh, |p, n1, n2| {
        n1.f_ext += p.n1 * p.f_ext;
        n2.f_ext += p.n2 * p.f_ext;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::shape::ShapeFunction;
    use crate::update::{refresh_interpolation, relocate_particles};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn bar(n_elements: usize, ppelem: usize) -> Mesh {
        let mut mesh = Mesh::new(2.0, n_elements).unwrap();
        mesh.seed_particles(ppelem, Material::linear_elastic(10.0, 3.0).unwrap())
            .unwrap();
        refresh_interpolation(&mut mesh, ShapeFunction::Linear);
        mesh
    }

    #[test]
    fn test_mass_is_conserved() {
        let mut mesh = bar(5, 3);
        mass_to_nodes(&mut mesh);
        assert_relative_eq!(mesh.total_nodal_mass(), mesh.total_particle_mass(), epsilon = 1e-12);
        assert_relative_eq!(mesh.total_particle_mass(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mass_is_conserved_for_scattered_particles() {
        let mut mesh = bar(4, 2);
        let shifts = [0.31, -0.07, 0.45, 0.02, -0.2, 0.13, 0.38, -0.49];
        for (p, dx) in mesh.particles_mut().iter_mut().zip(shifts) {
            p.position = (p.position + dx).clamp(0.0, 1.999);
        }
        relocate_particles(&mut mesh);
        refresh_interpolation(&mut mesh, ShapeFunction::Linear);

        mass_to_nodes(&mut mesh);
        assert_relative_eq!(mesh.total_nodal_mass(), mesh.total_particle_mass(), epsilon = 1e-12);
    }

    #[test]
    fn test_momentum_is_conserved() {
        let mut mesh = bar(3, 2);
        for (i, p) in mesh.particles_mut().iter_mut().enumerate() {
            p.velocity = 0.1 * i as f64 - 0.2;
        }
        momentum_to_nodes(&mut mesh);
        let nodal: f64 = mesh.nodes().iter().map(|n| n.momentum).sum();
        assert_relative_eq!(nodal, mesh.total_particle_momentum(), epsilon = 1e-12);
    }

    #[test]
    fn test_internal_forces_are_self_equilibrated() {
        let mut mesh = bar(4, 2);
        for (i, p) in mesh.particles_mut().iter_mut().enumerate() {
            p.stress = (i as f64).sin();
        }
        internal_force_to_nodes(&mut mesh);
        let total: f64 = mesh.nodes().iter().map(|n| n.f_int).sum();
        assert_abs_diff_eq!(total, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_stress_loads_only_the_ends() {
        let mut mesh = bar(4, 2);
        for p in mesh.particles_mut() {
            p.stress = 5.0;
        }
        internal_force_to_nodes(&mut mesh);
        let nodes = mesh.nodes();
        // Tension pulls the end nodes inwards with the full stress.
        assert_relative_eq!(nodes[0].f_int, 5.0, epsilon = 1e-12);
        assert_relative_eq!(nodes[4].f_int, -5.0, epsilon = 1e-12);
        for n in &nodes[1..4] {
            assert_abs_diff_eq!(n.f_int, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_external_force_split() {
        let mut mesh = Mesh::new(1.0, 1).unwrap();
        mesh.seed_particles(1, Material::linear_elastic(1.0, 1.0).unwrap())
            .unwrap();
        mesh.particles_mut()[0].position = 0.75;
        mesh.particles_mut()[0].f_ext = -4.0;
        refresh_interpolation(&mut mesh, ShapeFunction::Linear);

        external_force_to_nodes(&mut mesh);
        assert_relative_eq!(mesh.nodes()[0].f_ext, -1.0);
        assert_relative_eq!(mesh.nodes()[1].f_ext, -3.0);
    }
}
