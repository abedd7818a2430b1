use rayon::prelude::*;

use super::cell::UnitCell;
use super::Coordinate;
use crate::error::{KmcError, Result};

/// Slack added to the cutoff so that points sitting exactly on it are kept.
const CUTOFF_SLACK: f64 = 1e-8;

/// A site inside another site's neighborhood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub site: usize,
    /// Cartesian displacement from the center site (minimum image).
    pub offset: Coordinate,
    pub distance: f64,
}

/// Repeated unit cell with optional periodic boundaries.
///
/// Sites are indexed in row-major (C) order over cells, with the basis index
/// varying fastest: site `((a * rb + b) * rc + c) * n_basis + k` is basis
/// point `k` of cell `(a, b, c)`.
#[derive(Debug, Clone)]
pub struct Lattice {
    pub unit_cell: UnitCell,
    /// Number of cells along each cell vector.
    pub repetitions: [usize; 3],
    pub periodic: [bool; 3],
    /// Row-major cell strides: `strides[d] = product of repetitions[d+1..]`.
    pub strides: [usize; 3],
    pub n_basis: usize,
    /// Total number of sites (`n_cells * n_basis`).
    pub n_sites: usize,
}

impl Lattice {
    pub fn new(unit_cell: UnitCell, repetitions: [usize; 3], periodic: [bool; 3]) -> Result<Self> {
        if let Some(d) = repetitions.iter().position(|&r| r == 0) {
            return Err(KmcError::InvalidLattice(format!(
                "repetitions along direction {d} must be >= 1"
            )));
        }

        let mut strides = [1usize; 3];
        for d in (0..2).rev() {
            strides[d] = strides[d + 1] * repetitions[d + 1];
        }

        let n_basis = unit_cell.n_basis();
        let n_sites = repetitions.iter().product::<usize>() * n_basis;

        Ok(Self {
            unit_cell,
            repetitions,
            periodic,
            strides,
            n_basis,
            n_sites,
        })
    }

    /// Split a flat site index into its cell and basis index.
    #[inline]
    pub fn cell_index(&self, site: usize) -> ([usize; 3], usize) {
        let k = site % self.n_basis;
        let flat = site / self.n_basis;
        let cell = [
            (flat / self.strides[0]) % self.repetitions[0],
            (flat / self.strides[1]) % self.repetitions[1],
            flat % self.repetitions[2],
        ];
        (cell, k)
    }

    #[inline]
    pub fn site_index(&self, cell: [usize; 3], basis: usize) -> usize {
        let flat = cell[0] * self.strides[0] + cell[1] * self.strides[1] + cell[2];
        flat * self.n_basis + basis
    }

    /// Cartesian position of a site.
    pub fn site_coordinate(&self, site: usize) -> Coordinate {
        let (cell, k) = self.cell_index(site);
        let b = &self.unit_cell.basis[k];
        let shift = Coordinate::new(cell[0] as f64, cell[1] as f64, cell[2] as f64);
        self.unit_cell.to_cartesian(&(shift + b))
    }

    /// Neighborhood of every site: all sites within `cutoff`, the site itself
    /// included at zero offset, sorted by distance then site index.
    ///
    /// Periodic directions use the minimum image, which is only unique when
    /// the periodic extent exceeds twice the cutoff.
    pub fn neighborhoods(&self, cutoff: f64, sequential: bool) -> Result<Vec<Vec<Neighbor>>> {
        let heights = self.unit_cell.heights();
        for d in 0..3 {
            let extent = self.repetitions[d] as f64 * heights[d];
            if self.periodic[d] && extent <= 2.0 * cutoff {
                return Err(KmcError::LatticeTooSmall {
                    direction: d,
                    extent,
                    cutoff,
                });
            }
        }

        let ranges: [isize; 3] =
            std::array::from_fn(|d| (cutoff / heights[d]).ceil() as isize + 1);

        let build = |site: usize| self.neighbors_of(site, cutoff, &ranges);
        let out = if sequential {
            (0..self.n_sites).map(build).collect()
        } else {
            (0..self.n_sites).into_par_iter().map(build).collect()
        };
        Ok(out)
    }

    fn neighbors_of(&self, site: usize, cutoff: f64, ranges: &[isize; 3]) -> Vec<Neighbor> {
        let (cell, k) = self.cell_index(site);
        let origin = self.unit_cell.basis[k];
        let mut out = Vec::new();

        for da in -ranges[0]..=ranges[0] {
            for db in -ranges[1]..=ranges[1] {
                for dc in -ranges[2]..=ranges[2] {
                    let shift = [da, db, dc];
                    let Some(target) = self.shifted_cell(cell, shift) else {
                        continue;
                    };
                    for (kk, b) in self.unit_cell.basis.iter().enumerate() {
                        let frac =
                            Coordinate::new(da as f64, db as f64, dc as f64) + b - origin;
                        let offset = self.unit_cell.to_cartesian(&frac);
                        let distance = offset.norm();
                        if distance <= cutoff + CUTOFF_SLACK {
                            out.push(Neighbor {
                                site: self.site_index(target, kk),
                                offset,
                                distance,
                            });
                        }
                    }
                }
            }
        }

        out.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.site.cmp(&b.site))
        });
        out
    }

    /// Apply a cell shift, wrapping periodic directions via `rem_euclid`.
    /// Returns `None` when the shift leaves a non-periodic boundary.
    #[inline]
    fn shifted_cell(&self, cell: [usize; 3], shift: [isize; 3]) -> Option<[usize; 3]> {
        let mut target = [0usize; 3];
        for d in 0..3 {
            let n = self.repetitions[d] as isize;
            let c = cell[d] as isize + shift[d];
            target[d] = if self.periodic[d] {
                c.rem_euclid(n) as usize
            } else if (0..n).contains(&c) {
                c as usize
            } else {
                return None;
            };
        }
        Some(target)
    }
}
