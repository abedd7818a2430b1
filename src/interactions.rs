use std::collections::HashMap;

use kmc_core::{Interaction, Interactions, PossibleTypes};
use pyo3::prelude::*;
use pyo3::types::{PyFloat, PyList, PyTuple};

use crate::backend::PyBackendInteractions;
use crate::local_config::PyLocalConfiguration;
use crate::{core_err, Error};

/// Validated list of `(before, after, rate)` interactions.
#[pyclass(name = "KMCInteractions", module = "kmclib._core")]
pub struct PyInteractions {
    raw: Py<PyList>,
    pub inner: Interactions,
}

fn parse_interaction(idx: usize, item: &Bound<'_, PyAny>) -> PyResult<Interaction> {
    let parts: Vec<Bound<'_, PyAny>> = if let Ok(tuple) = item.downcast::<PyTuple>() {
        tuple.iter().collect()
    } else if let Ok(list) = item.downcast::<PyList>() {
        list.iter().collect()
    } else {
        return Err(Error::new_err(format!(
            "interaction {idx} must be a list or tuple of (before, after, rate)"
        )));
    };
    if parts.len() != 3 {
        return Err(Error::new_err(format!(
            "interaction {idx} has {} elements, expected 3",
            parts.len()
        )));
    }

    let config = |obj: &Bound<'_, PyAny>, what: &str| -> PyResult<_> {
        obj.extract::<PyRef<'_, PyLocalConfiguration>>()
            .map(|c| c.inner.clone())
            .map_err(|_| {
                Error::new_err(format!(
                    "{what} configuration of interaction {idx} must be a KMCLocalConfiguration"
                ))
            })
    };
    let before = config(&parts[0], "before")?;
    let after = config(&parts[1], "after")?;

    if !parts[2].is_instance_of::<PyFloat>() {
        return Err(Error::new_err(format!(
            "rate of interaction {idx} must be a float"
        )));
    }
    let rate: f64 = parts[2].extract()?;

    Ok(Interaction::new(before, after, rate))
}

#[pymethods]
impl PyInteractions {
    /// Create the interactions object.
    ///
    /// Arguments:
    ///   interactions: list of (before, after, rate) tuples, where before and
    ///     after are KMCLocalConfiguration objects over the same points with
    ///     different types, and rate is a positive float
    #[new]
    #[pyo3(signature = (interactions=None))]
    fn new(interactions: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        let obj = interactions.ok_or_else(|| Error::new_err("interactions must be given"))?;
        let list = obj
            .downcast::<PyList>()
            .map_err(|_| Error::new_err("interactions must be a list"))?;

        let parsed = list
            .iter()
            .enumerate()
            .map(|(idx, item)| parse_interaction(idx, &item))
            .collect::<PyResult<Vec<_>>>()?;
        let inner = Interactions::new(parsed).map_err(core_err)?;

        Ok(Self {
            raw: list.clone().unbind(),
            inner,
        })
    }

    /// The list passed to the constructor.
    #[getter]
    fn raw_interactions(&self, py: Python<'_>) -> Py<PyList> {
        self.raw.clone_ref(py)
    }

    /// Build the backend process table.
    ///
    /// Arguments:
    ///   possible_types: dict mapping every type label to a positive integer id
    ///     ("*" may map to 0 for the wildcard)
    fn backend(&self, possible_types: HashMap<String, u32>) -> PyResult<PyBackendInteractions> {
        let possible_types = PossibleTypes::from_map(possible_types).map_err(core_err)?;
        let table = self.inner.backend(&possible_types).map_err(core_err)?;
        Ok(PyBackendInteractions { table })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}
