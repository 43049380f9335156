//! Closed-form reference solutions for verification problems.
//!
//! All solutions assume a bar of unit cross-section with uniform linear
//! elastic properties, fixed at `x = 0`.

use std::f64::consts::PI;

use crate::solver::Sample;

/// Number of series terms used by default for the wave in a pile.
pub const PILE_SERIES_TERMS: usize = 1000;

/// Geometry and elastic constants of a reference bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticBar {
    pub length: f64,
    pub youngs_modulus: f64,
    pub density: f64,
}

impl ElasticBar {
    pub fn new(length: f64, youngs_modulus: f64, density: f64) -> Self {
        Self {
            length,
            youngs_modulus,
            density,
        }
    }

    /// Elastic wave speed `sqrt(E / ρ)`.
    pub fn wave_speed(&self) -> f64 {
        (self.youngs_modulus / self.density).sqrt()
    }

    /// Natural frequency of a single mass point on a spring of this bar,
    /// `w = sqrt(E / ρ) / L`.
    pub fn single_mass_frequency(&self) -> f64 {
        self.wave_speed() / self.length
    }

    /// First-mode natural frequency of the fixed-free bar.
    pub fn first_mode_frequency(&self) -> f64 {
        PI / 2.0 / self.length * self.wave_speed()
    }
}

/// Position and velocity of a single mass point.
///
/// `x(t) = x0 exp(v0 / (L w) sin(w t))` with `w = sqrt(E / ρ) / L`.
pub fn single_mass_point(bar: &ElasticBar, x0: f64, v0: f64, t: f64) -> (f64, f64) {
    let w = bar.single_mass_frequency();
    let x = x0 * (v0 / (bar.length * w) * (w * t).sin()).exp();
    let v = x * v0 / bar.length * (w * t).cos();
    (x, v)
}

/// Displacement and velocity of the first vibration mode of a fixed-free
/// bar at position `x`.
pub fn continuum_bar(bar: &ElasticBar, v0: f64, x: f64, t: f64) -> (f64, f64) {
    let w1 = bar.first_mode_frequency();
    let b1 = PI / 2.0 / bar.length;
    let u = v0 / w1 * (w1 * t).sin() * (b1 * x).sin();
    let v = v0 * (w1 * t).cos() * (b1 * x).sin();
    (u, v)
}

/// Displacement and velocity at `x` of a pile fixed at its base and loaded
/// by a step traction `p0` at its free end, truncated to `n_terms` terms.
pub fn wave_in_pile(bar: &ElasticBar, p0: f64, x: f64, t: f64, n_terms: usize) -> (f64, f64) {
    let l = bar.length;
    let c = bar.wave_speed();

    let (mut u_sum, mut v_sum) = (0.0, 0.0);
    for n in 1..=n_terms {
        let k = (2 * n - 1) as f64;
        let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
        let lambda = k * PI / 2.0 / l;
        let coeff = sign / (k * k) * (lambda * x).sin();
        u_sum += coeff * (lambda * c * t).cos();
        v_sum -= coeff * lambda * c * (lambda * c * t).sin();
    }

    let scale = p0 / bar.youngs_modulus;
    let series = 8.0 * l / (PI * PI);
    (scale * (x + series * u_sum), scale * series * v_sum)
}

/// Evaluate `f` at `t = i dt` for every sample in `[0, time]`.
pub fn sample_reference<F>(time: f64, dt: f64, f: F) -> Vec<Sample>
where
    F: Fn(f64) -> f64,
{
    let n = ((time / dt + 1e-9).floor() as usize).saturating_add(1);
    (0..n)
        .map(|i| {
            let t = i as f64 * dt;
            Sample { time: t, value: f(t) }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_single_mass_point() {
        let bar = ElasticBar::new(1.0, 50.0, 1.0);
        let (x, v) = single_mass_point(&bar, 0.5, 0.1, 0.0);
        assert_relative_eq!(x, 0.5);
        assert_relative_eq!(v, 0.05);

        // Back at the initial position after one period.
        let period = 2.0 * PI / bar.single_mass_frequency();
        let (x, _) = single_mass_point(&bar, 0.5, 0.1, period);
        assert_relative_eq!(x, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_continuum_bar() {
        let bar = ElasticBar::new(25.0, 100.0, 1.0);
        assert_relative_eq!(bar.first_mode_frequency(), PI / 5.0);

        let (u, v) = continuum_bar(&bar, 0.1, 25.0, 0.0);
        assert_eq!(u, 0.0);
        assert_relative_eq!(v, 0.1);

        let quarter = PI / 2.0 / bar.first_mode_frequency();
        let (u, v) = continuum_bar(&bar, 0.1, 25.0, quarter);
        assert_relative_eq!(u, 0.1 / bar.first_mode_frequency());
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);

        // The fixed end never moves.
        assert_eq!(continuum_bar(&bar, 0.1, 0.0, 1.3).0, 0.0);
    }

    #[test]
    fn test_wave_in_pile_starts_at_rest() {
        let bar = ElasticBar::new(15.0, 100e6, 2500.0);
        let (u, v) = wave_in_pile(&bar, -10e3, 7.5, 0.0, PILE_SERIES_TERMS);
        assert_abs_diff_eq!(u, 0.0, epsilon = 1e-9);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_wave_in_pile_free_end() {
        // Before the reflection reaches it the tip moves at p0 c / E.
        let bar = ElasticBar::new(15.0, 100e6, 2500.0);
        let p0 = -10e3;
        let c = bar.wave_speed();
        let t = 0.5 * bar.length / c;

        let (u, v) = wave_in_pile(&bar, p0, bar.length, t, PILE_SERIES_TERMS);
        assert_relative_eq!(u, p0 * bar.length / (2.0 * bar.youngs_modulus), max_relative = 1e-3);
        assert_relative_eq!(v, p0 * c / bar.youngs_modulus, max_relative = 1e-2);
    }

    #[test]
    fn test_sample_reference() {
        let samples = sample_reference(1.0, 0.25, |t| 2.0 * t);
        assert_eq!(samples.len(), 5);
        assert_relative_eq!(samples[4].time, 1.0);
        assert_relative_eq!(samples[4].value, 2.0);
    }
}
