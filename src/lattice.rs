use std::collections::HashMap;

use kmc_core::geometry::Coordinate;
use kmc_core::{Configuration, Lattice, PossibleTypes, UnitCell};
use numpy::PyArray2;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::{coordinates_to_py, core_err, extract_coordinates, Error};

#[pyclass(name = "KMCUnitCell", module = "kmclib._core")]
#[derive(Clone)]
pub struct PyUnitCell {
    pub inner: UnitCell,
}

#[pymethods]
impl PyUnitCell {
    /// Create a unit cell.
    ///
    /// Arguments:
    ///   cell_vectors: three cartesian cell vectors, shape (3, 3)
    ///   basis_points: fractional site positions inside the cell, shape (n, 3)
    #[new]
    fn new(cell_vectors: &Bound<'_, PyAny>, basis_points: &Bound<'_, PyAny>) -> PyResult<Self> {
        let vectors = extract_coordinates(cell_vectors, "cell_vectors")?;
        let vectors: [Coordinate; 3] = vectors
            .try_into()
            .map_err(|v: Vec<_>| Error::new_err(format!("expected 3 cell vectors, got {}", v.len())))?;
        let basis = extract_coordinates(basis_points, "basis_points")?;
        let inner = UnitCell::new(vectors, basis).map_err(core_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn cell_vectors<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        coordinates_to_py(py, &self.inner.cell_vectors())
    }

    #[getter]
    fn basis_points<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        coordinates_to_py(py, &self.inner.basis)
    }
}

#[pyclass(name = "KMCLattice", module = "kmclib._core")]
#[derive(Clone)]
pub struct PyLattice {
    pub inner: Lattice,
}

#[pymethods]
impl PyLattice {
    /// Repeat a unit cell into a lattice.
    ///
    /// Arguments:
    ///   unit_cell: KMCUnitCell
    ///   repetitions: cells along each cell vector (default (1, 1, 1))
    ///   periodic: periodic boundaries per direction (default all True)
    #[new]
    #[pyo3(signature = (unit_cell, repetitions=None, periodic=None))]
    fn new(
        unit_cell: PyUnitCell,
        repetitions: Option<[usize; 3]>,
        periodic: Option<[bool; 3]>,
    ) -> PyResult<Self> {
        let inner = Lattice::new(
            unit_cell.inner,
            repetitions.unwrap_or([1, 1, 1]),
            periodic.unwrap_or([true; 3]),
        )
        .map_err(core_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn n_sites(&self) -> usize {
        self.inner.n_sites
    }

    /// Cartesian position of every site, shape (n_sites, 3).
    fn sites<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let coords: Vec<Coordinate> = (0..self.inner.n_sites)
            .map(|i| self.inner.site_coordinate(i))
            .collect();
        coordinates_to_py(py, &coords)
    }
}

/// Accept either a dict of label -> id or a list of labels.
fn extract_possible_types(obj: &Bound<'_, PyAny>) -> PyResult<PossibleTypes> {
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let map: HashMap<String, u32> = dict
            .extract()
            .map_err(|_| Error::new_err("possible_types must map labels to integer ids"))?;
        return PossibleTypes::from_map(map).map_err(core_err);
    }
    let labels: Vec<String> = obj
        .extract()
        .map_err(|_| Error::new_err("possible_types must be a dict or a list of labels"))?;
    Ok(PossibleTypes::from_labels(labels.iter().map(String::as_str)))
}

#[pyclass(name = "KMCConfiguration", module = "kmclib._core")]
#[derive(Clone)]
pub struct PyConfiguration {
    pub inner: Configuration,
}

#[pymethods]
impl PyConfiguration {
    /// Assign a type label to every lattice site.
    ///
    /// Arguments:
    ///   lattice: KMCLattice
    ///   types: list of n_sites labels
    ///   possible_types: every label the simulation may produce, as a list or
    ///     a dict of label -> id (default: the labels in `types`)
    #[new]
    #[pyo3(signature = (lattice, types, possible_types=None))]
    fn new(
        lattice: PyLattice,
        types: Vec<String>,
        possible_types: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<Self> {
        let possible_types = possible_types.map(extract_possible_types).transpose()?;
        let inner = Configuration::new(lattice.inner, &types, possible_types).map_err(core_err)?;
        Ok(Self { inner })
    }

    fn types(&self) -> Vec<String> {
        self.inner.labels()
    }

    fn possible_types(&self) -> HashMap<String, u32> {
        self.inner.possible_types.as_map().clone()
    }

    fn __len__(&self) -> usize {
        self.inner.n_sites()
    }
}
