use crate::error::{KmcError, Result};
use crate::geometry::Lattice;
use crate::types::{PossibleTypes, WILDCARD_LABEL};

/// A lattice with one type on every site.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub lattice: Lattice,
    pub possible_types: PossibleTypes,
    /// Type id per site, length `lattice.n_sites`.
    pub types: Vec<u32>,
}

impl Configuration {
    /// Assign a label to every site. When `possible_types` is `None` the ids
    /// are derived from the site labels themselves.
    pub fn new(
        lattice: Lattice,
        labels: &[String],
        possible_types: Option<PossibleTypes>,
    ) -> Result<Self> {
        if labels.len() != lattice.n_sites {
            return Err(KmcError::LengthMismatch {
                what: "site types",
                expected: lattice.n_sites,
                actual: labels.len(),
            });
        }
        if labels.iter().any(|l| l == WILDCARD_LABEL) {
            return Err(KmcError::InvalidLabel(WILDCARD_LABEL.to_string()));
        }

        let possible_types = possible_types
            .unwrap_or_else(|| PossibleTypes::from_labels(labels.iter().map(String::as_str)));
        let types = labels
            .iter()
            .map(|l| possible_types.id(l))
            .collect::<Result<Vec<u32>>>()?;

        Ok(Self {
            lattice,
            possible_types,
            types,
        })
    }

    /// Every site labelled `label`.
    pub fn uniform(lattice: Lattice, label: &str, possible_types: Option<PossibleTypes>) -> Result<Self> {
        let labels = vec![label.to_string(); lattice.n_sites];
        Self::new(lattice, &labels, possible_types)
    }

    pub fn n_sites(&self) -> usize {
        self.types.len()
    }

    /// Current labels, one per site.
    pub fn labels(&self) -> Vec<String> {
        labels_of(&self.possible_types, &self.types)
    }

    /// Number of sites carrying each concrete type, aligned with
    /// [`PossibleTypes::type_ids`].
    pub fn type_counts(&self) -> Vec<u64> {
        count_types(&self.possible_types.type_ids(), &self.types)
    }
}

pub(crate) fn labels_of(possible_types: &PossibleTypes, types: &[u32]) -> Vec<String> {
    types
        .iter()
        .map(|&id| possible_types.label(id).unwrap_or(WILDCARD_LABEL).to_string())
        .collect()
}

pub(crate) fn count_types(type_ids: &[u32], types: &[u32]) -> Vec<u64> {
    let mut counts = vec![0u64; type_ids.len()];
    for t in types {
        if let Ok(pos) = type_ids.binary_search(t) {
            counts[pos] += 1;
        }
    }
    counts
}
