pub mod config;
pub mod configuration;
pub mod error;
pub mod geometry;
pub mod interactions;
pub mod local_config;
pub mod process;
pub mod simulation;
pub mod statistics;
pub mod types;

pub use config::ControlParameters;
pub use configuration::Configuration;
pub use error::{KmcError, Result};
pub use geometry::{Lattice, UnitCell};
pub use interactions::{Interaction, Interactions};
pub use local_config::LocalConfiguration;
pub use process::{MatchListEntry, Process, ProcessTable};
pub use simulation::{kmc_step, run_kmc_loop, run_kmc_parallel, KmcState, LatticeModel};
pub use statistics::RunResult;
pub use types::{PossibleTypes, WILDCARD_LABEL, WILDCARD_TYPE};
