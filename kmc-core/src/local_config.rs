use crate::error::{KmcError, Result};
use crate::geometry::Coordinate;

/// Points closer than this are considered the same position.
const COINCIDENCE_TOLERANCE: f64 = 1e-10;

/// A labeled point cloud around a center site.
///
/// Construction shifts the cloud so that the center sits at the origin, then
/// orders points by distance from it. The sort is stable, so points at equal
/// distance keep the order they were given in. After normalization the center
/// is always the first point.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalConfiguration {
    coordinates: Vec<Coordinate>,
    types: Vec<String>,
    distances: Vec<f64>,
}

impl LocalConfiguration {
    /// Build a local configuration from raw coordinates, one label per point
    /// and the index of the center point.
    pub fn new(coordinates: Vec<Coordinate>, types: Vec<String>, center: usize) -> Result<Self> {
        if coordinates.is_empty() {
            return Err(KmcError::Empty("coordinates"));
        }
        if types.len() != coordinates.len() {
            return Err(KmcError::LengthMismatch {
                what: "types",
                expected: coordinates.len(),
                actual: types.len(),
            });
        }
        if center >= coordinates.len() {
            return Err(KmcError::IndexOutOfBounds {
                what: "center",
                index: center,
                len: coordinates.len(),
            });
        }
        if let Some(label) = types.iter().find(|t| t.trim().is_empty()) {
            return Err(KmcError::InvalidLabel(label.clone()));
        }

        let origin = coordinates[center];
        let shifted: Vec<Coordinate> = coordinates.iter().map(|c| c - origin).collect();

        for i in 0..shifted.len() {
            for j in (i + 1)..shifted.len() {
                if (shifted[i] - shifted[j]).norm() < COINCIDENCE_TOLERANCE {
                    return Err(KmcError::DuplicatePoint(i, j));
                }
            }
        }

        let raw_distances: Vec<f64> = shifted.iter().map(|c| c.norm()).collect();

        let mut order: Vec<usize> = (0..shifted.len()).collect();
        order.sort_by(|&a, &b| raw_distances[a].total_cmp(&raw_distances[b]));

        Ok(Self {
            coordinates: order.iter().map(|&i| shifted[i]).collect(),
            types: order.iter().map(|&i| types[i].clone()).collect(),
            distances: order.iter().map(|&i| raw_distances[i]).collect(),
        })
    }

    /// Coordinates relative to the center, sorted by distance.
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Distance of the farthest point from the center.
    pub fn cutoff(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    /// True when both configurations hold the same points in the same order.
    pub fn same_coordinates(&self, other: &Self, tolerance: f64) -> bool {
        self.len() == other.len()
            && self
                .coordinates
                .iter()
                .zip(other.coordinates.iter())
                .all(|(a, b)| (a - b).norm() < tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn points(v: &[[f64; 3]]) -> Vec<Coordinate> {
        v.iter().map(|&p| Coordinate::from(p)).collect()
    }

    #[test]
    fn test_construction() {
        let coords = points(&[[1.0, 2.0, 3.4], [1.1, 1.2, 1.3]]);
        assert!(LocalConfiguration::new(coords.clone(), labels(&["A", "B"]), 1).is_ok());
        assert!(LocalConfiguration::new(coords, labels(&["A", "B"]), 0).is_ok());
    }

    #[test]
    fn test_centered_and_sorted() {
        let coords = points(&[[1.0, 2.0, 3.0], [1.0, 1.0, 3.0], [3.0, 8.0, 9.0]]);
        let local = LocalConfiguration::new(coords, labels(&["C", "B", "A"]), 1).unwrap();

        let ref_coords = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [2.0, 7.0, 6.0]];
        for (c, r) in local.coordinates().iter().zip(ref_coords.iter()) {
            assert!((c - Coordinate::from(*r)).norm() < 1e-10);
        }
        assert_eq!(local.types(), &labels(&["B", "C", "A"])[..]);

        let ref_distances = [0.0, 1.0, (4.0f64 + 49.0 + 36.0).sqrt()];
        for (d, r) in local.distances().iter().zip(ref_distances.iter()) {
            assert!((d - r).abs() < 1e-10);
        }
        assert!((local.cutoff() - ref_distances[2]).abs() < 1e-10);
    }

    #[test]
    fn test_equal_distances_keep_input_order() {
        let coords = points(&[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]]);
        let local = LocalConfiguration::new(coords, labels(&["X", "A", "B", "C"]), 0).unwrap();
        assert_eq!(local.types(), &labels(&["X", "A", "B", "C"])[..]);
        assert_eq!(local.coordinates()[1], Coordinate::new(0.0, 0.0, 1.0));
        assert_eq!(local.coordinates()[3], Coordinate::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_construction_fails() {
        let coords = points(&[[1.0, 2.0, 3.4], [1.1, 1.2, 1.3]]);

        assert_eq!(
            LocalConfiguration::new(vec![], vec![], 0),
            Err(KmcError::Empty("coordinates"))
        );
        assert!(matches!(
            LocalConfiguration::new(coords.clone(), labels(&["A", "B"]), 2),
            Err(KmcError::IndexOutOfBounds { index: 2, .. })
        ));
        assert!(matches!(
            LocalConfiguration::new(coords.clone(), labels(&["A"]), 0),
            Err(KmcError::LengthMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            LocalConfiguration::new(coords, labels(&["A", " "]), 0),
            Err(KmcError::InvalidLabel(_))
        ));
        assert_eq!(
            LocalConfiguration::new(points(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]), labels(&["A", "B"]), 0),
            Err(KmcError::DuplicatePoint(0, 1))
        );
    }

    #[test]
    fn test_same_coordinates() {
        let coords = points(&[[1.0, 2.0, 3.4], [1.1, 1.2, 1.3]]);
        let a = LocalConfiguration::new(coords.clone(), labels(&["A", "B"]), 0).unwrap();
        let b = LocalConfiguration::new(coords, labels(&["B", "A"]), 0).unwrap();
        let c = LocalConfiguration::new(
            points(&[[1.0, 2.0, 3.4], [1.1, 1.2, 1.2]]),
            labels(&["B", "A"]),
            0,
        )
        .unwrap();
        assert!(a.same_coordinates(&b, 1e-10));
        assert!(!a.same_coordinates(&c, 1e-10));
    }
}
