pub mod cell;
pub mod lattice;

use nalgebra::Vector3;

pub use cell::UnitCell;
pub use lattice::{Lattice, Neighbor};

/// Cartesian (or fractional) position in three dimensions.
pub type Coordinate = Vector3<f64>;
