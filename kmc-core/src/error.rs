//! Error types for the KMC core.

use thiserror::Error;

/// Result type alias for KMC core operations.
pub type Result<T> = std::result::Result<T, KmcError>;

/// Errors raised while building or running a KMC model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KmcError {
    /// A list argument that must hold at least one element was empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Two parallel lists differ in length.
    #[error("length mismatch: {what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An index points outside the list it refers to.
    #[error("{what} index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A coordinate row did not have three components.
    #[error("coordinate {index} has {actual} components, expected 3")]
    BadCoordinate { index: usize, actual: usize },

    /// Two points of a local configuration coincide.
    #[error("points {0} and {1} of the local configuration coincide")]
    DuplicatePoint(usize, usize),

    /// A type label was empty or otherwise unusable.
    #[error("invalid type label: {0:?}")]
    InvalidLabel(String),

    /// A type label has no id in the possible-types map.
    #[error("unknown type label: {0:?}")]
    UnknownType(String),

    /// The possible-types map is inconsistent.
    #[error("invalid possible types: {0}")]
    InvalidTypeMap(String),

    /// A rate constant was zero, negative or not finite.
    #[error("interaction {index} has invalid rate {rate}")]
    InvalidRate { index: usize, rate: f64 },

    /// Before and after configurations of an interaction have different points.
    #[error("interaction {0}: before and after configurations have different coordinates")]
    CoordinateMismatch(usize),

    /// Before and after configurations of an interaction carry identical types.
    #[error("interaction {0}: before and after configurations have identical types")]
    IdenticalTypes(usize),

    /// Geometry parameters that cannot describe a lattice.
    #[error("invalid lattice: {0}")]
    InvalidLattice(String),

    /// A periodic direction is too short for the interaction cutoff.
    #[error("lattice too small along direction {direction}: extent {extent:.4} must exceed twice the cutoff {cutoff:.4}")]
    LatticeTooSmall {
        direction: usize,
        extent: f64,
        cutoff: f64,
    },

    /// Control parameters failed validation.
    #[error("invalid control parameters: {0}")]
    InvalidControl(String),

    /// An event was selected at a site where its process no longer matches.
    #[error("process {process} selected at site {site} but does not match there")]
    StaleEvent { process: usize, site: usize },

    /// The run was interrupted from outside.
    #[error("interrupted")]
    Interrupted,
}
