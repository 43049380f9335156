//! Grid-to-particle updates and per-step bookkeeping.
//!
//! These operations read nodal fields produced by the transfer and
//! integration passes and update the particles, or prepare the grid for the
//! next step. Quantities divided by nodal mass are skipped for massless
//! nodes.

use crate::mesh::{Mesh, Node};
use crate::shape::ShapeFunction;

/// `value / mass`, or zero for a massless node.
fn per_unit_mass(value: f64, mass: f64) -> f64 {
    if mass == 0.0 {
        0.0
    } else {
        value / mass
    }
}

/// Compute nodal velocity `v = p / m` on nodes carrying mass.
pub fn nodal_velocity(mesh: &mut Mesh) {
    for node in mesh.nodes.iter_mut().filter(|n| n.mass != 0.0) {
        node.velocity = node.momentum / node.mass;
    }
}

/// Recompute nodal momentum from the current particle velocities.
pub fn rebuild_nodal_momentum(mesh: &mut Mesh) {
    for node in mesh.nodes.iter_mut() {
        node.momentum = 0.0;
    }
    crate::interpolation::momentum_to_nodes(mesh);
}

/// Particle strain increment `dε = (dN1 v1 + dN2 v2) dt`.
pub fn particle_strain_increment(mesh: &mut Mesh, dt: f64) {
    let Mesh {
        nodes,
        elements,
        particles,
        ..
    } = mesh;

    for p in particles.iter_mut() {
        let e = &elements[p.element];
        let (v1, v2) = (nodes[e.n1].velocity, nodes[e.n2].velocity);
        p.dstrain = (p.dn1 * v1 + p.dn2 * v2) * dt;
    }
}

/// Update particle density from the strain increment, `ρ = ρ / (1 + dε)`.
pub fn particle_density(mesh: &mut Mesh) {
    for p in mesh.particles.iter_mut() {
        p.density /= 1.0 + p.dstrain;
    }
}

/// Update particle stress through each particle's material.
pub fn particle_stress(mesh: &mut Mesh, dt: f64) {
    let Mesh {
        particles,
        materials,
        ..
    } = mesh;

    for p in particles.iter_mut() {
        materials[p.material].update_stress(p, dt);
    }
}

/// Full stress update: nodal velocity, strain increment, density and stress.
pub fn update_stress(mesh: &mut Mesh, dt: f64) {
    nodal_velocity(mesh);
    particle_strain_increment(mesh, dt);
    particle_density(mesh);
    particle_stress(mesh, dt);
}

/// Interpolate a nodal field per unit mass back to every particle.
fn gather(mesh: &Mesh, field: fn(&Node) -> f64) -> impl Iterator<Item = f64> + '_ {
    mesh.particles.iter().map(move |p| {
        let e = &mesh.elements[p.element];
        let (n1, n2) = (&mesh.nodes[e.n1], &mesh.nodes[e.n2]);
        per_unit_mass(field(n1), n1.mass) * p.n1 + per_unit_mass(field(n2), n2.mass) * p.n2
    })
}

/// Update particle velocity from nodal accelerations, `v += Σ f_I / m_I N_I dt`.
pub fn particle_velocity(mesh: &mut Mesh, dt: f64) {
    let accelerations: Vec<f64> = gather(mesh, |n| n.f_tot).collect();
    for (p, a) in mesh.particles.iter_mut().zip(accelerations) {
        p.velocity += a * dt;
    }
}

/// Update particle position from nodal velocities, `x += Σ p_I / m_I N_I dt`.
pub fn particle_position(mesh: &mut Mesh, dt: f64) {
    let velocities: Vec<f64> = gather(mesh, |n| n.momentum).collect();
    for (p, v) in mesh.particles.iter_mut().zip(velocities) {
        p.position += v * dt;
    }
}

/// Recompute `N1, N2, dN1, dN2` of every particle against its element nodes.
///
/// Only the two nodes of the containing element receive weights. The linear
/// family sums to one there, so transferred mass is conserved; cpGIMP
/// support reaching into a neighbouring cell is dropped and the grid mass
/// can fall slightly short of the particle mass.
pub fn refresh_interpolation(mesh: &mut Mesh, shape: ShapeFunction) {
    let Mesh {
        nodes,
        elements,
        particles,
        ..
    } = mesh;

    for p in particles.iter_mut() {
        let e = &elements[p.element];
        let lp = p.half_size();
        (p.n1, p.dn1) = shape.evaluate(p.position, nodes[e.n1].x, e.length, lp);
        (p.n2, p.dn2) = shape.evaluate(p.position, nodes[e.n2].x, e.length, lp);
    }
}

/// Reassign every particle to the element containing its position and
/// rebuild the element particle lists.
pub fn relocate_particles(mesh: &mut Mesh) {
    for element in mesh.elements.iter_mut() {
        element.particles.clear();
    }
    for pid in 0..mesh.particles.len() {
        let eid = mesh.locate(mesh.particles[pid].position);
        mesh.particles[pid].element = eid;
        mesh.elements[eid].particles.push(pid);
    }
}

/// Zero all nodal accumulators.
pub fn reset_nodes(mesh: &mut Mesh) {
    for node in mesh.nodes.iter_mut() {
        node.reset();
    }
}
