use kmc_core::{MatchListEntry, Process, ProcessTable};
use pyo3::prelude::*;

/// Process table in the form the engine consumes.
#[pyclass(name = "Interactions", module = "kmclib._core.Backend")]
pub struct PyBackendInteractions {
    pub table: ProcessTable,
}

#[pymethods]
impl PyBackendInteractions {
    fn processes(&self) -> Vec<PyProcess> {
        self.table
            .processes()
            .iter()
            .cloned()
            .map(|inner| PyProcess { inner })
            .collect()
    }

    fn cutoff(&self) -> f64 {
        self.table.cutoff()
    }

    fn __len__(&self) -> usize {
        self.table.len()
    }
}

#[pyclass(name = "Process", module = "kmclib._core.Backend")]
#[derive(Clone)]
pub struct PyProcess {
    inner: Process,
}

#[pymethods]
impl PyProcess {
    #[pyo3(name = "matchList")]
    fn match_list(&self) -> Vec<PyMatchListEntry> {
        self.inner
            .match_list
            .iter()
            .cloned()
            .map(|inner| PyMatchListEntry { inner })
            .collect()
    }

    fn rate(&self) -> f64 {
        self.inner.rate
    }
}

#[pyclass(name = "MatchListEntry", module = "kmclib._core.Backend")]
#[derive(Clone)]
pub struct PyMatchListEntry {
    inner: MatchListEntry,
}

#[pymethods]
impl PyMatchListEntry {
    #[pyo3(name = "matchType")]
    fn match_type(&self) -> u32 {
        self.inner.match_type
    }

    #[pyo3(name = "updateType")]
    fn update_type(&self) -> u32 {
        self.inner.update_type
    }

    fn distance(&self) -> f64 {
        self.inner.distance
    }

    fn coordinate(&self) -> [f64; 3] {
        self.inner.coordinate.into()
    }

    fn __repr__(&self) -> String {
        format!(
            "MatchListEntry(match={}, update={}, distance={:.4})",
            self.inner.match_type, self.inner.update_type, self.inner.distance
        )
    }
}
