use nalgebra::Matrix3;

use super::Coordinate;
use crate::error::{KmcError, Result};

/// Parallelepiped cell spanned by three vectors, holding basis points given
/// in fractional coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    /// Cell vectors `a`, `b`, `c` as the columns of a cartesian matrix.
    pub cell: Matrix3<f64>,
    /// Site positions inside the cell, each component in `[0, 1)`.
    pub basis: Vec<Coordinate>,
}

impl UnitCell {
    pub fn new(cell_vectors: [Coordinate; 3], basis: Vec<Coordinate>) -> Result<Self> {
        if basis.is_empty() {
            return Err(KmcError::Empty("basis points"));
        }
        let cell = Matrix3::from_columns(&cell_vectors);
        let volume = cell.determinant();
        if !volume.is_finite() || volume.abs() < 1e-12 {
            return Err(KmcError::InvalidLattice(format!(
                "cell vectors span a degenerate volume ({volume})"
            )));
        }
        for (idx, point) in basis.iter().enumerate() {
            if point.iter().any(|&x| !(0.0..1.0).contains(&x)) {
                return Err(KmcError::InvalidLattice(format!(
                    "basis point {idx} {:?} is outside the unit cell",
                    point.as_slice()
                )));
            }
        }
        Ok(Self { cell, basis })
    }

    /// Simple cubic cell with one basis point at the origin.
    pub fn cubic(a: f64) -> Result<Self> {
        Self::new(
            [Coordinate::x() * a, Coordinate::y() * a, Coordinate::z() * a],
            vec![Coordinate::zeros()],
        )
    }

    pub fn n_basis(&self) -> usize {
        self.basis.len()
    }

    /// Cell vectors `a`, `b`, `c` in cartesian coordinates.
    pub fn cell_vectors(&self) -> [Coordinate; 3] {
        [
            self.cell.column(0).into_owned(),
            self.cell.column(1).into_owned(),
            self.cell.column(2).into_owned(),
        ]
    }

    pub fn volume(&self) -> f64 {
        self.cell.determinant().abs()
    }

    /// Distance between opposite faces of the cell, per cell vector.
    ///
    /// A displacement of length `r` can change fractional coordinate `d` by at
    /// most `r / heights()[d]`.
    pub fn heights(&self) -> [f64; 3] {
        let v = self.volume();
        let [a, b, c] = self.cell_vectors();
        [
            v / b.cross(&c).norm(),
            v / c.cross(&a).norm(),
            v / a.cross(&b).norm(),
        ]
    }

    /// Convert fractional coordinates to cartesian.
    #[inline]
    pub fn to_cartesian(&self, frac: &Coordinate) -> Coordinate {
        self.cell * frac
    }
}
