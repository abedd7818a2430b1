use crate::error::{KmcError, Result};
use crate::local_config::LocalConfiguration;
use crate::process::{MatchListEntry, Process, ProcessTable};
use crate::types::PossibleTypes;

/// Before and after configurations must agree point by point within this distance.
const COORDINATE_TOLERANCE: f64 = 1e-10;

/// A possible lattice event: the local configuration it applies to, the one it
/// leaves behind, and the rate at which it happens.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub before: LocalConfiguration,
    pub after: LocalConfiguration,
    pub rate: f64,
}

impl Interaction {
    pub fn new(before: LocalConfiguration, after: LocalConfiguration, rate: f64) -> Self {
        Self {
            before,
            after,
            rate,
        }
    }
}

/// Validated list of interactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Interactions {
    interactions: Vec<Interaction>,
}

impl Interactions {
    /// Validate and store interactions in the order given.
    ///
    /// Every rate must be finite and positive, the before and after
    /// configurations must hold the same points, and their types must differ.
    pub fn new(interactions: Vec<Interaction>) -> Result<Self> {
        if interactions.is_empty() {
            return Err(KmcError::Empty("interactions"));
        }
        for (index, interaction) in interactions.iter().enumerate() {
            let rate = interaction.rate;
            if !rate.is_finite() || rate <= 0.0 {
                return Err(KmcError::InvalidRate { index, rate });
            }
            if !interaction
                .before
                .same_coordinates(&interaction.after, COORDINATE_TOLERANCE)
            {
                return Err(KmcError::CoordinateMismatch(index));
            }
            if interaction.before.types() == interaction.after.types() {
                return Err(KmcError::IdenticalTypes(index));
            }
        }
        Ok(Self { interactions })
    }

    /// The interactions exactly as they were stored.
    pub fn raw_interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Translate into the process table the engine runs on, one process per
    /// interaction in the same order.
    pub fn backend(&self, possible_types: &PossibleTypes) -> Result<ProcessTable> {
        let mut processes = Vec::with_capacity(self.interactions.len());
        for interaction in &self.interactions {
            let before = &interaction.before;
            let after = &interaction.after;
            let mut match_list = Vec::with_capacity(before.len());
            for i in 0..before.len() {
                match_list.push(MatchListEntry {
                    match_type: possible_types.id(&before.types()[i])?,
                    update_type: possible_types.id(&after.types()[i])?,
                    distance: before.distances()[i],
                    coordinate: before.coordinates()[i],
                });
            }
            processes.push(Process {
                match_list,
                rate: interaction.rate,
            });
        }
        Ok(ProcessTable { processes })
    }
}
