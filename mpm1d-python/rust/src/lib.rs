//! Python bindings for the mpm1d solver.
//!
//! This crate provides PyO3 bindings exposing mpm1d-core functionality to Python.
//! The bindings follow a minimal wrapper pattern - most logic stays in Rust.

use std::fs::File;

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::{PyIOError, PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use mpm1d_core::analytical::{self, ElasticBar, PILE_SERIES_TERMS};
use mpm1d_core::config::{OutputField, ParticleSelector, SimulationConfig, UpdateScheme};
use mpm1d_core::error::Error;
use mpm1d_core::material::Material as CoreMaterial;
use mpm1d_core::mesh::Mesh;
use mpm1d_core::shape::ShapeFunction;
use mpm1d_core::solver::OutputSeries;

fn to_py_err(err: Error) -> PyErr {
    match err {
        Error::Io(e) => PyIOError::new_err(e.to_string()),
        Error::Csv(e) => PyIOError::new_err(e.to_string()),
        Error::Mesh(_) | Error::Config(_) | Error::InvalidMaterial(_) | Error::Toml(_) => {
            PyValueError::new_err(err.to_string())
        }
    }
}

/// Resolve a Python-style index (negative counts from the end).
fn resolve_index(index: isize, len: usize) -> PyResult<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        Some(index as usize).filter(|&i| i < len)
    };
    resolved.ok_or_else(|| {
        PyIndexError::new_err(format!("Index {} out of bounds (length {})", index, len))
    })
}

/// Material definition for Python.
#[pyclass(name = "Material")]
#[derive(Clone)]
pub struct PyMaterial {
    inner: CoreMaterial,
}

#[pymethods]
impl PyMaterial {
    /// Linear elastic material with Young's modulus `e` and density `rho`.
    #[staticmethod]
    fn linear_elastic(e: f64, rho: f64) -> PyResult<Self> {
        let inner = CoreMaterial::linear_elastic(e, rho).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Newtonian fluid with dynamic viscosity `mu` and density `rho`.
    #[staticmethod]
    fn newtonian_fluid(mu: f64, rho: f64) -> PyResult<Self> {
        let inner = CoreMaterial::newtonian_fluid(mu, rho).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn model(&self) -> &'static str {
        match self.inner {
            CoreMaterial::LinearElastic { .. } => "linear_elastic",
            CoreMaterial::NewtonianFluid { .. } => "newtonian_fluid",
        }
    }

    #[getter]
    fn density(&self) -> f64 {
        self.inner.density()
    }

    /// Elastic wave speed, or None for fluids.
    #[getter]
    fn wave_speed(&self) -> Option<f64> {
        self.inner.wave_speed()
    }

    fn __repr__(&self) -> String {
        match self.inner {
            CoreMaterial::LinearElastic {
                youngs_modulus,
                density,
            } => format!("Material(linear_elastic, E={:.3e}, rho={})", youngs_modulus, density),
            CoreMaterial::NewtonianFluid { viscosity, density } => {
                format!("Material(newtonian_fluid, mu={:.3e}, rho={})", viscosity, density)
            }
        }
    }
}

/// Background grid with its material points.
#[pyclass(name = "Mesh")]
pub struct PyMesh {
    inner: Mesh,
}

#[pymethods]
impl PyMesh {
    /// Create a uniform grid of `n_elements` elements over `[0, length]`.
    #[new]
    fn new(length: f64, n_elements: usize) -> PyResult<Self> {
        let inner = Mesh::new(length, n_elements).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Seed `ppelem` particles per element.
    ///
    /// Args:
    ///     ppelem: Particles per element
    ///     material: Material of the seeded particles
    ///     elements: Optional (first, last) inclusive element range; all elements if omitted
    #[pyo3(signature = (ppelem, material, elements=None))]
    fn seed_particles(
        &mut self,
        ppelem: usize,
        material: &PyMaterial,
        elements: Option<(usize, usize)>,
    ) -> PyResult<()> {
        let seeded = match elements {
            Some((first, last)) => {
                self.inner
                    .seed_particles_in_elements(ppelem, material.inner, first..=last)
            }
            None => self.inner.seed_particles(ppelem, material.inner),
        };
        seeded.map_err(to_py_err)
    }

    /// Set the velocity of one particle (negative indices count from the end).
    fn set_velocity(&mut self, particle: isize, velocity: f64) -> PyResult<()> {
        let idx = resolve_index(particle, self.inner.n_particles())?;
        self.inner.particles_mut()[idx].set_velocity(velocity);
        Ok(())
    }

    /// Set the velocity of every particle from an array.
    fn set_velocities(&mut self, velocities: PyReadonlyArray1<f64>) -> PyResult<()> {
        let values = velocities.as_array();
        if values.len() != self.inner.n_particles() {
            return Err(PyValueError::new_err(format!(
                "velocities must have {} elements",
                self.inner.n_particles()
            )));
        }
        for (p, &v) in self.inner.particles_mut().iter_mut().zip(values.iter()) {
            p.set_velocity(v);
        }
        Ok(())
    }

    /// Set the external force on one particle (negative indices count from the end).
    fn set_external_force(&mut self, particle: isize, force: f64) -> PyResult<()> {
        let idx = resolve_index(particle, self.inner.n_particles())?;
        self.inner.particles_mut()[idx].set_external_force(force);
        Ok(())
    }

    /// Apply a body force `m * g` to every particle.
    fn set_gravity(&mut self, g: f64) {
        for p in self.inner.particles_mut() {
            p.f_ext = p.mass * g;
        }
    }

    /// Largest stable time step over the elastic materials, or None.
    fn critical_time_step(&self) -> Option<f64> {
        self.inner.critical_time_step()
    }

    #[getter]
    fn length(&self) -> f64 {
        self.inner.length()
    }

    #[getter]
    fn cell_length(&self) -> f64 {
        self.inner.cell_length()
    }

    #[getter]
    fn n_nodes(&self) -> usize {
        self.inner.n_nodes()
    }

    #[getter]
    fn n_elements(&self) -> usize {
        self.inner.n_elements()
    }

    #[getter]
    fn n_particles(&self) -> usize {
        self.inner.n_particles()
    }

    /// Node coordinates as a numpy array.
    #[getter]
    fn node_positions<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.nodes().iter().map(|n| n.x).collect())
    }

    /// Particle positions as a numpy array.
    #[getter]
    fn positions<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.particles().iter().map(|p| p.position).collect())
    }

    /// Particle velocities as a numpy array.
    #[getter]
    fn velocities<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.particles().iter().map(|p| p.velocity).collect())
    }

    /// Particle stresses as a numpy array.
    #[getter]
    fn stresses<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.particles().iter().map(|p| p.stress).collect())
    }

    /// Particle densities as a numpy array.
    #[getter]
    fn densities<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.particles().iter().map(|p| p.density).collect())
    }

    fn __repr__(&self) -> String {
        format!(
            "Mesh(length={}, elements={}, particles={})",
            self.inner.length(),
            self.inner.n_elements(),
            self.inner.n_particles()
        )
    }
}

/// Explicit run configuration.
#[pyclass(name = "SimulationConfig")]
#[derive(Clone)]
pub struct PySimulationConfig {
    inner: SimulationConfig,
    output_particle: isize,
}

#[pymethods]
impl PySimulationConfig {
    /// Create a configuration.
    ///
    /// Args:
    ///     scheme: "USL", "USF" or "MUSL"
    ///     time: Total simulated time
    ///     dt: Time step
    ///     damping: Local damping coefficient
    ///     shape_function: "linear" or "cpgimp"
    ///     fixed_nodes: Nodes with zero velocity (default [0])
    ///     output_particle: Recorded particle index (negative counts from the end)
    ///     output_field: "position", "velocity" or "stress"
    #[new]
    #[pyo3(signature = (
        scheme="MUSL",
        time=1.0,
        dt=1e-3,
        damping=0.0,
        shape_function="linear",
        fixed_nodes=None,
        output_particle=-1,
        output_field="position"
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        scheme: &str,
        time: f64,
        dt: f64,
        damping: f64,
        shape_function: &str,
        fixed_nodes: Option<Vec<usize>>,
        output_particle: isize,
        output_field: &str,
    ) -> PyResult<Self> {
        let scheme: UpdateScheme = scheme.parse().map_err(to_py_err)?;
        let shape: ShapeFunction = shape_function.parse().map_err(to_py_err)?;
        let field: OutputField = output_field.parse().map_err(to_py_err)?;

        let mut inner = SimulationConfig::new(scheme, time, dt)
            .with_damping(damping)
            .with_shape_function(shape)
            .with_output(ParticleSelector::Last, field);
        if let Some(nodes) = fixed_nodes {
            inner = inner.with_fixed_nodes(nodes);
        }
        inner.validate().map_err(to_py_err)?;

        Ok(Self {
            inner,
            output_particle,
        })
    }

    /// Load a configuration from a TOML file.
    #[staticmethod]
    fn from_toml(path: &str) -> PyResult<Self> {
        let inner = SimulationConfig::from_file(path).map_err(to_py_err)?;
        let output_particle = match inner.output_particle {
            ParticleSelector::First => 0,
            ParticleSelector::Last => -1,
            ParticleSelector::Index(i) => i as isize,
        };
        Ok(Self {
            inner,
            output_particle,
        })
    }

    #[getter]
    fn scheme(&self) -> &'static str {
        self.inner.scheme.name()
    }

    #[getter]
    fn time(&self) -> f64 {
        self.inner.time
    }

    #[getter]
    fn dt(&self) -> f64 {
        self.inner.dt
    }

    #[getter]
    fn damping(&self) -> f64 {
        self.inner.damping
    }

    #[getter]
    fn fixed_nodes(&self) -> Vec<usize> {
        self.inner.fixed_nodes.clone()
    }

    #[getter]
    fn output_field(&self) -> &'static str {
        self.inner.output_field.name()
    }

    /// Number of samples a run records.
    #[getter]
    fn n_samples(&self) -> usize {
        self.inner.n_samples()
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationConfig(scheme={}, time={}, dt={}, damping={})",
            self.inner.scheme, self.inner.time, self.inner.dt, self.inner.damping
        )
    }
}

/// Recorded time series of one particle field.
#[pyclass(name = "OutputSeries")]
pub struct PyOutputSeries {
    inner: OutputSeries,
}

#[pymethods]
impl PyOutputSeries {
    #[getter]
    fn times<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.times())
    }

    #[getter]
    fn values<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.values())
    }

    #[getter]
    fn scheme(&self) -> &'static str {
        self.inner.scheme.name()
    }

    #[getter]
    fn field(&self) -> &'static str {
        self.inner.field.name()
    }

    #[getter]
    fn particle(&self) -> usize {
        self.inner.particle
    }

    /// Write the series to a CSV file.
    fn write_csv(&self, path: &str) -> PyResult<()> {
        let file = File::create(path).map_err(|e| PyIOError::new_err(e.to_string()))?;
        self.inner.write_csv(file).map_err(to_py_err)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "OutputSeries(scheme={}, field={}, particle={}, samples={})",
            self.inner.scheme,
            self.inner.field.name(),
            self.inner.particle,
            self.inner.len()
        )
    }
}

/// Run an explicit simulation, updating the mesh in place.
///
/// Args:
///     mesh: Mesh with seeded particles and initial conditions
///     config: Run configuration
///
/// Returns:
///     OutputSeries with the recorded particle field
#[pyfunction]
fn run_explicit(
    mut mesh: PyRefMut<'_, PyMesh>,
    config: &PySimulationConfig,
) -> PyResult<PyOutputSeries> {
    let n_particles = mesh.inner.n_particles();
    if n_particles == 0 {
        return Err(PyRuntimeError::new_err("mesh has no particles"));
    }
    let particle = resolve_index(config.output_particle, n_particles)?;
    let core_config = config.inner.clone().with_output(
        ParticleSelector::Index(particle),
        config.inner.output_field,
    );

    let inner = mpm1d_core::run_explicit(&mut mesh.inner, &core_config).map_err(to_py_err)?;
    Ok(PyOutputSeries { inner })
}

type Reference<'py> = (
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
);

/// Sample a (value, rate) reference solution at `0, dt, ..` up to `time`.
fn reference<'py, F>(py: Python<'py>, time: f64, dt: f64, f: F) -> PyResult<Reference<'py>>
where
    F: Fn(f64) -> (f64, f64),
{
    if !(dt > 0.0) {
        return Err(PyValueError::new_err("dt must be positive"));
    }
    let values = analytical::sample_reference(time, dt, |t| f(t).0);
    let rates = analytical::sample_reference(time, dt, |t| f(t).1);
    Ok((
        PyArray1::from_vec(py, values.iter().map(|s| s.time).collect()),
        PyArray1::from_vec(py, values.iter().map(|s| s.value).collect()),
        PyArray1::from_vec(py, rates.iter().map(|s| s.value).collect()),
    ))
}

/// Analytical position and velocity of a single mass point.
///
/// Returns:
///     (times, positions, velocities) numpy arrays
#[pyfunction]
#[allow(clippy::too_many_arguments)]
fn single_mass_point_solution<'py>(
    py: Python<'py>,
    length: f64,
    e: f64,
    rho: f64,
    x0: f64,
    v0: f64,
    time: f64,
    dt: f64,
) -> PyResult<Reference<'py>> {
    let bar = ElasticBar::new(length, e, rho);
    reference(py, time, dt, |t| analytical::single_mass_point(&bar, x0, v0, t))
}

/// Analytical first-mode displacement and velocity of a fixed-free bar at `x`.
///
/// Returns:
///     (times, displacements, velocities) numpy arrays
#[pyfunction]
#[allow(clippy::too_many_arguments)]
fn continuum_bar_solution<'py>(
    py: Python<'py>,
    length: f64,
    e: f64,
    rho: f64,
    v0: f64,
    x: f64,
    time: f64,
    dt: f64,
) -> PyResult<Reference<'py>> {
    let bar = ElasticBar::new(length, e, rho);
    reference(py, time, dt, |t| analytical::continuum_bar(&bar, v0, x, t))
}

/// Analytical displacement and velocity at `x` of a pile loaded at its free end.
///
/// Returns:
///     (times, displacements, velocities) numpy arrays
#[pyfunction]
#[pyo3(signature = (length, e, rho, p0, x, time, dt, n_terms=PILE_SERIES_TERMS))]
#[allow(clippy::too_many_arguments)]
fn wave_in_pile_solution<'py>(
    py: Python<'py>,
    length: f64,
    e: f64,
    rho: f64,
    p0: f64,
    x: f64,
    time: f64,
    dt: f64,
    n_terms: usize,
) -> PyResult<Reference<'py>> {
    let bar = ElasticBar::new(length, e, rho);
    reference(py, time, dt, |t| analytical::wave_in_pile(&bar, p0, x, t, n_terms))
}

/// Get library version.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Python module definition.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyMaterial>()?;
    m.add_class::<PyMesh>()?;
    m.add_class::<PySimulationConfig>()?;
    m.add_class::<PyOutputSeries>()?;
    m.add_function(wrap_pyfunction!(run_explicit, m)?)?;
    m.add_function(wrap_pyfunction!(single_mass_point_solution, m)?)?;
    m.add_function(wrap_pyfunction!(continuum_bar_solution, m)?)?;
    m.add_function(wrap_pyfunction!(wave_in_pile_solution, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    Ok(())
}

