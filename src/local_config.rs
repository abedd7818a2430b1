use kmc_core::LocalConfiguration;
use numpy::ndarray::Array1;
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::prelude::*;

use crate::{coordinates_to_py, core_err, extract_coordinates, Error};

/// A labeled point cloud around a center site.
#[pyclass(name = "KMCLocalConfiguration", module = "kmclib._core")]
#[derive(Clone)]
pub struct PyLocalConfiguration {
    pub inner: LocalConfiguration,
}

#[pymethods]
impl PyLocalConfiguration {
    /// Create a local configuration.
    ///
    /// Arguments:
    ///   cartesian_coordinates: list or numpy array of shape (n, 3)
    ///   types: list of n type labels
    ///   center: index of the center point
    ///   coordinates: alias for cartesian_coordinates
    ///
    /// Coordinates are shifted so the center sits at the origin and sorted by
    /// distance from it.
    #[new]
    #[pyo3(signature = (cartesian_coordinates=None, types=None, center=None, coordinates=None))]
    fn new(
        cartesian_coordinates: Option<&Bound<'_, PyAny>>,
        types: Option<&Bound<'_, PyAny>>,
        center: Option<&Bound<'_, PyAny>>,
        coordinates: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<Self> {
        let coords = cartesian_coordinates
            .or(coordinates)
            .ok_or_else(|| Error::new_err("coordinates must be given"))?;
        let types = types.ok_or_else(|| Error::new_err("types must be given"))?;
        let center = center.ok_or_else(|| Error::new_err("center must be given"))?;

        let coords = extract_coordinates(coords, "coordinates")?;
        let types: Vec<String> = types
            .extract()
            .map_err(|_| Error::new_err("types must be a list of strings"))?;
        let center: i64 = center
            .extract()
            .map_err(|_| Error::new_err("center must be an integer"))?;
        let center = usize::try_from(center)
            .map_err(|_| Error::new_err(format!("center must be non-negative, got {center}")))?;

        let inner = LocalConfiguration::new(coords, types, center).map_err(core_err)?;
        Ok(Self { inner })
    }

    /// Coordinates relative to the center, shape (n, 3), sorted by distance.
    #[getter]
    fn cartesian_coordinates<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        coordinates_to_py(py, self.inner.coordinates())
    }

    #[getter]
    fn types(&self) -> Vec<String> {
        self.inner.types().to_vec()
    }

    #[getter]
    fn distances<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        Array1::from(self.inner.distances().to_vec()).into_pyarray(py)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "KMCLocalConfiguration(types={:?}, cutoff={:.4})",
            self.inner.types(),
            self.inner.cutoff()
        )
    }
}
