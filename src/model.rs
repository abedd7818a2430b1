use std::sync::atomic::AtomicBool;

use indicatif::{ProgressBar, ProgressStyle};
use kmc_core::{run_kmc_loop, run_kmc_parallel, ControlParameters, KmcState, LatticeModel, RunResult};
use numpy::ndarray::{Array1, Array2};
use numpy::IntoPyArray;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use validator::Validate;

use crate::interactions::PyInteractions;
use crate::lattice::PyConfiguration;
use crate::{core_err, Error};

#[pyclass(name = "KMCControlParameters", module = "kmclib._core")]
#[derive(Clone)]
pub struct PyControlParameters {
    inner: ControlParameters,
    seed: u64,
}

#[pymethods]
impl PyControlParameters {
    /// Settings for a KMC run.
    ///
    /// Arguments:
    ///   number_of_steps: events to execute
    ///   dump_interval: record observables every N events (default 1)
    ///   seed: PRNG seed (default 42)
    ///   time_limit: stop once simulation time passes this value
    ///   record_types: keep the full type array at every dump (default False)
    ///   sequential: run ensembles on one thread (default False)
    #[new]
    #[pyo3(signature = (number_of_steps=None, dump_interval=None, seed=None, time_limit=None, record_types=None, sequential=None))]
    fn new(
        number_of_steps: Option<u64>,
        dump_interval: Option<u64>,
        seed: Option<u64>,
        time_limit: Option<f64>,
        record_types: Option<bool>,
        sequential: Option<bool>,
    ) -> PyResult<Self> {
        let n_steps = number_of_steps.ok_or_else(|| Error::new_err("number_of_steps must be given"))?;
        let inner = ControlParameters {
            n_steps,
            dump_interval: dump_interval.unwrap_or(1),
            time_limit,
            record_types: record_types.unwrap_or(false),
            sequential: sequential.unwrap_or(false),
        };
        inner
            .validate()
            .map_err(|e| Error::new_err(format!("invalid control parameters: {e}")))?;
        Ok(Self {
            inner,
            seed: seed.unwrap_or(42),
        })
    }

    #[getter]
    fn number_of_steps(&self) -> u64 {
        self.inner.n_steps
    }

    #[getter]
    fn dump_interval(&self) -> u64 {
        self.inner.dump_interval
    }

    #[getter]
    fn seed(&self) -> u64 {
        self.seed
    }
}

/// Lattice model: configuration, interactions and the running KMC state.
#[pyclass(name = "KMCLatticeModel", module = "kmclib._core")]
pub struct PyLatticeModel {
    model: LatticeModel,
    state: KmcState,
}

fn progress_bar(len: u64) -> PyResult<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{msg} [{bar:40}] {pos}/{len} [{elapsed_precise} < {eta_precise}, {per_sec}]",
        )
        .map_err(|e| PyValueError::new_err(e.to_string()))?
        .progress_chars("=> "),
    );
    pb.set_message("steps");
    Ok(pb)
}

fn result_to_dict<'py>(
    py: Python<'py>,
    model: &LatticeModel,
    result: RunResult,
) -> PyResult<Bound<'py, PyDict>> {
    let n_types = result.type_ids.len();
    let n_dumps = result.times.len();
    let to_shape_err = |e: numpy::ndarray::ShapeError| PyValueError::new_err(e.to_string());

    let dict = PyDict::new(py);
    let labels: Vec<String> = model.labels(&result.type_ids);
    dict.set_item("type_labels", labels)?;
    dict.set_item("steps", Array1::from(result.steps).into_pyarray(py))?;
    dict.set_item("times", Array1::from(result.times).into_pyarray(py))?;
    dict.set_item(
        "type_counts",
        Array2::from_shape_vec(
            (n_dumps, n_types),
            result.type_counts.into_iter().flatten().collect(),
        )
        .map_err(to_shape_err)?
        .into_pyarray(py),
    )?;
    dict.set_item(
        "type_fractions",
        Array1::from(result.type_fractions).into_pyarray(py),
    )?;
    dict.set_item(
        "process_counts",
        Array1::from(result.process_counts).into_pyarray(py),
    )?;
    dict.set_item("n_executed", result.n_executed)?;
    dict.set_item("final_time", result.final_time)?;

    if !result.snapshots.is_empty() {
        let n_sites = model.n_sites();
        let n_snapshots = result.snapshots.len();
        dict.set_item(
            "snapshots",
            Array2::from_shape_vec(
                (n_snapshots, n_sites),
                result.snapshots.into_iter().flatten().collect(),
            )
            .map_err(to_shape_err)?
            .into_pyarray(py),
        )?;
    }

    Ok(dict)
}

#[pymethods]
impl PyLatticeModel {
    /// Combine a configuration with interactions.
    ///
    /// Arguments:
    ///   configuration: KMCConfiguration; its possible types must cover every
    ///     label the interactions use
    ///   interactions: KMCInteractions
    ///   sequential: build neighbor tables on one thread (default False)
    #[new]
    #[pyo3(signature = (configuration, interactions, sequential=None))]
    fn new(
        configuration: PyConfiguration,
        interactions: PyRef<'_, PyInteractions>,
        sequential: Option<bool>,
    ) -> PyResult<Self> {
        let model = LatticeModel::new(
            configuration.inner,
            &interactions.inner,
            sequential.unwrap_or(false),
        )
        .map_err(core_err)?;
        let state = KmcState::new(&model, 42);
        Ok(Self { model, state })
    }

    /// Run the KMC loop from the current state.
    ///
    /// The PRNG is reseeded from `control_parameters.seed`; configuration and
    /// time carry over from previous runs.
    ///
    /// Returns: dict with keys "type_labels", "steps", "times", "type_counts"
    ///   (shape (n_dumps, n_types)), "type_fractions", "process_counts",
    ///   "n_executed", "final_time", and "snapshots" when record_types is set.
    fn run<'py>(
        &mut self,
        py: Python<'py>,
        control_parameters: PyRef<'_, PyControlParameters>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let control = &control_parameters.inner;
        self.state.rng = Xoshiro256StarStar::seed_from_u64(control_parameters.seed);

        let pb = progress_bar(control.n_steps)?;
        let interrupted = AtomicBool::new(false);
        let result = run_kmc_loop(&self.model, &mut self.state, control, &interrupted, &|| {
            pb.inc(1)
        })
        .map_err(core_err)?;
        pb.finish();

        result_to_dict(py, &self.model, result)
    }

    /// Run `n_runs` independent trajectories from the initial configuration
    /// and average their observables. The current state is left untouched.
    ///
    /// Run `i` is seeded with `seed + i`, wrapping at `2**64`.
    fn run_ensemble<'py>(
        &self,
        py: Python<'py>,
        control_parameters: PyRef<'_, PyControlParameters>,
        n_runs: usize,
    ) -> PyResult<Bound<'py, PyDict>> {
        let control = &control_parameters.inner;
        let seed = control_parameters.seed;
        let mut states = KmcState::ensemble(&self.model, seed, n_runs);

        let pb = progress_bar(control.n_steps.saturating_mul(n_runs as u64))?;
        let interrupted = AtomicBool::new(false);
        let result = run_kmc_parallel(&self.model, &mut states, control, &interrupted, &|| {
            pb.inc(1)
        })
        .map_err(core_err)?;
        pb.finish();

        result_to_dict(py, &self.model, result)
    }

    /// Current type label of every site.
    fn types(&self) -> Vec<String> {
        self.model.labels(&self.state.types)
    }

    #[getter]
    fn time(&self) -> f64 {
        self.state.time
    }

    #[getter]
    fn step(&self) -> u64 {
        self.state.step
    }

    /// Number of sites each process can currently fire at.
    fn available_events(&self) -> Vec<usize> {
        (0..self.model.n_processes())
            .map(|p| self.state.events.count(p))
            .collect()
    }

    /// Return to the initial configuration at time zero.
    #[pyo3(signature = (seed=None))]
    fn reset(&mut self, seed: Option<u64>) {
        self.state.reset(&self.model, seed.unwrap_or(42));
    }
}
