use rayon::prelude::*;
use tracing::debug;

use crate::configuration::{labels_of, Configuration};
use crate::error::Result;
use crate::geometry::{Lattice, Neighbor};
use crate::interactions::Interactions;
use crate::process::ProcessTable;
use crate::types::PossibleTypes;

/// Immutable part of a KMC simulation: geometry, processes and the starting
/// configuration.
///
/// Mutable state lives in [`super::KmcState`], so one model can drive many
/// independent runs.
pub struct LatticeModel {
    pub lattice: Lattice,
    pub possible_types: PossibleTypes,
    pub processes: ProcessTable,
    /// Rate per process, indexed like `processes`.
    pub rates: Vec<f64>,
    /// Largest process radius; neighborhoods reach this far.
    pub cutoff: f64,
    /// Per-site neighborhood within `cutoff`, sorted by distance.
    pub neighborhoods: Vec<Vec<Neighbor>>,
    /// Type ids the model starts from, length `n_sites`.
    pub initial_types: Vec<u32>,
    /// Concrete type ids, ascending. Column order of all per-type observables.
    pub type_ids: Vec<u32>,
    /// Build neighborhoods and event lists on the current thread.
    pub sequential: bool,
}

impl LatticeModel {
    pub fn new(
        configuration: Configuration,
        interactions: &Interactions,
        sequential: bool,
    ) -> Result<Self> {
        let Configuration {
            lattice,
            possible_types,
            types,
        } = configuration;

        let processes = interactions.backend(&possible_types)?;
        let cutoff = processes.cutoff();
        let neighborhoods = lattice.neighborhoods(cutoff, sequential)?;
        let rates = processes.rates();
        let type_ids = possible_types.type_ids();

        debug!(
            n_sites = lattice.n_sites,
            n_processes = processes.len(),
            cutoff,
            max_neighbors = neighborhoods.iter().map(Vec::len).max().unwrap_or(0),
            "built lattice model"
        );

        Ok(Self {
            lattice,
            possible_types,
            processes,
            rates,
            cutoff,
            neighborhoods,
            initial_types: types,
            type_ids,
            sequential,
        })
    }

    pub fn n_sites(&self) -> usize {
        self.lattice.n_sites
    }

    pub fn n_processes(&self) -> usize {
        self.processes.len()
    }

    /// Indices of the processes that match at `site` under `types`.
    pub fn matching_processes(&self, site: usize, types: &[u32]) -> Vec<usize> {
        let hood = &self.neighborhoods[site];
        self.processes
            .processes()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.matches_at(hood, types))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Matching processes for every site, computed in parallel unless the
    /// model is sequential.
    pub fn match_all(&self, types: &[u32]) -> Vec<Vec<usize>> {
        let work = |site: usize| self.matching_processes(site, types);
        if self.sequential {
            (0..self.n_sites()).map(work).collect()
        } else {
            (0..self.n_sites()).into_par_iter().map(work).collect()
        }
    }

    /// Position of a type id in [`LatticeModel::type_ids`].
    #[inline]
    pub fn type_index(&self, id: u32) -> Option<usize> {
        self.type_ids.binary_search(&id).ok()
    }

    pub fn labels(&self, types: &[u32]) -> Vec<String> {
        labels_of(&self.possible_types, types)
    }
}
