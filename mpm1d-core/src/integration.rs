//! Nodal force assembly and momentum integration.

use crate::mesh::{Mesh, Node};

/// Sign function that is exactly zero at zero.
pub(crate) fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Local damping force opposing the nodal velocity.
///
/// The magnitude is `alpha |f_int + f_ext|`. Nodes without mass have no
/// defined velocity and receive no damping.
pub fn damping_force(node: &Node, alpha: f64) -> f64 {
    if alpha <= 0.0 || node.mass == 0.0 {
        return 0.0;
    }
    let velocity = node.momentum / node.mass;
    -alpha * (node.f_int + node.f_ext).abs() * sign(velocity)
}

/// Compute the total nodal force `f_int + f_ext + f_damp`.
pub fn total_force(mesh: &mut Mesh, damping: f64) {
    for node in mesh.nodes.iter_mut() {
        node.f_damp = damping_force(node, damping);
        node.f_tot = node.f_int + node.f_ext + node.f_damp;
    }
}

/// Advance nodal momentum by one step, `p += f_tot dt`.
pub fn advance_momentum(mesh: &mut Mesh, dt: f64) {
    for node in mesh.nodes.iter_mut() {
        node.momentum += node.f_tot * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn loaded_node(mass: f64, momentum: f64) -> Node {
        let mut node = Node::new(0, 0.0);
        node.mass = mass;
        node.momentum = momentum;
        node.f_int = -3.0;
        node.f_ext = 1.0;
        node
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(2.5), 1.0);
        assert_eq!(sign(-1e-300), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
    }

    #[test]
    fn test_damping_opposes_velocity() {
        assert_relative_eq!(damping_force(&loaded_node(2.0, 4.0), 0.1), -0.2);
        assert_relative_eq!(damping_force(&loaded_node(2.0, -4.0), 0.1), 0.2);
    }

    #[test]
    fn test_damping_guards() {
        // Zero velocity, zero mass and zero coefficient all give no damping.
        assert_eq!(damping_force(&loaded_node(2.0, 0.0), 0.1), 0.0);
        assert_eq!(damping_force(&loaded_node(0.0, 1.0), 0.1), 0.0);
        assert_eq!(damping_force(&loaded_node(2.0, 4.0), 0.0), 0.0);
    }

    #[test]
    fn test_total_force_and_momentum() {
        let mut mesh = Mesh::new(1.0, 1).unwrap();
        mesh.nodes[1].mass = 1.0;
        mesh.nodes[1].momentum = 0.5;
        mesh.nodes[1].f_int = 2.0;
        mesh.nodes[1].f_ext = 2.0;

        total_force(&mut mesh, 0.25);
        assert_relative_eq!(mesh.nodes[1].f_damp, -1.0);
        assert_relative_eq!(mesh.nodes[1].f_tot, 3.0);
        assert_eq!(mesh.nodes[0].f_tot, 0.0);

        advance_momentum(&mut mesh, 0.1);
        assert_relative_eq!(mesh.nodes[1].momentum, 0.8);
    }
}
