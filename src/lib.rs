use kmc_core::geometry::Coordinate;
use kmc_core::KmcError;
use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2, PyArrayMethods, PyUntypedArrayMethods};
use pyo3::create_exception;
use pyo3::exceptions::PyException;
use pyo3::prelude::*;

mod backend;
mod interactions;
mod lattice;
mod local_config;
mod model;

create_exception!(_core, Error, PyException, "Raised for invalid KMC input.");

/// Convert a core error into the module's `Error` exception.
pub(crate) fn core_err(e: KmcError) -> PyErr {
    Error::new_err(e.to_string())
}

/// Read an `(n, 3)` float numpy array or a list of 3-sequences of numbers.
pub(crate) fn extract_coordinates(obj: &Bound<'_, PyAny>, what: &str) -> PyResult<Vec<Coordinate>> {
    if let Ok(array) = obj.downcast::<PyArray2<f64>>() {
        let array = array.readonly();
        if array.shape()[1] != 3 {
            return Err(Error::new_err(format!(
                "{what} must have shape (n, 3), got {:?}",
                array.shape()
            )));
        }
        let view = array.as_array();
        return Ok(view
            .rows()
            .into_iter()
            .map(|r| Coordinate::new(r[0], r[1], r[2]))
            .collect());
    }

    let rows: Vec<Vec<f64>> = obj
        .extract()
        .map_err(|_| Error::new_err(format!("{what} must be a list of 3-vectors of numbers")))?;
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            <[f64; 3]>::try_from(row.as_slice())
                .map(Coordinate::from)
                .map_err(|_| {
                    core_err(KmcError::BadCoordinate {
                        index,
                        actual: row.len(),
                    })
                })
        })
        .collect()
}

/// Copy a list of coordinates into an `(n, 3)` numpy array.
pub(crate) fn coordinates_to_py<'py>(
    py: Python<'py>,
    coords: &[Coordinate],
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let flat: Vec<f64> = coords.iter().flat_map(|c| c.iter().copied()).collect();
    let array = Array2::from_shape_vec((coords.len(), 3), flat)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
    Ok(array.into_pyarray(py))
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add("Error", py.get_type::<Error>())?;
    m.add_class::<local_config::PyLocalConfiguration>()?;
    m.add_class::<interactions::PyInteractions>()?;
    m.add_class::<lattice::PyUnitCell>()?;
    m.add_class::<lattice::PyLattice>()?;
    m.add_class::<lattice::PyConfiguration>()?;
    m.add_class::<model::PyControlParameters>()?;
    m.add_class::<model::PyLatticeModel>()?;

    let backend = PyModule::new(py, "Backend")?;
    backend.add_class::<backend::PyBackendInteractions>()?;
    backend.add_class::<backend::PyProcess>()?;
    backend.add_class::<backend::PyMatchListEntry>()?;
    m.add_submodule(&backend)?;
    Ok(())
}
