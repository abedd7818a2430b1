use crate::geometry::{Coordinate, Neighbor};
use crate::types::WILDCARD_TYPE;

/// Relative coordinates closer than this identify the same neighbor.
pub const MATCH_TOLERANCE: f64 = 1e-6;

/// One point of a process template.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchListEntry {
    /// Type the site must carry for the process to apply.
    pub match_type: u32,
    /// Type written to the site when the process fires.
    pub update_type: u32,
    pub distance: f64,
    /// Position relative to the process center.
    pub coordinate: Coordinate,
}

impl MatchListEntry {
    #[inline]
    pub fn matches(&self, site_type: u32) -> bool {
        self.match_type == WILDCARD_TYPE || self.match_type == site_type
    }

    #[inline]
    pub fn changes_site(&self) -> bool {
        self.update_type != WILDCARD_TYPE && self.update_type != self.match_type
    }
}

/// A possible lattice event: a template of sites and their before/after types.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    /// Entries sorted by distance; the first one is the center.
    pub match_list: Vec<MatchListEntry>,
    pub rate: f64,
}

impl Process {
    pub fn cutoff(&self) -> f64 {
        self.match_list.last().map_or(0.0, |e| e.distance)
    }

    /// Match this process against the neighborhood of a site.
    ///
    /// Returns the matched site for every entry, or `None` if any entry finds
    /// no neighbor at its coordinate or a neighbor of the wrong type.
    #[cfg_attr(feature = "profile", inline(never))]
    pub fn match_sites(&self, neighborhood: &[Neighbor], types: &[u32]) -> Option<Vec<usize>> {
        let mut sites = Vec::with_capacity(self.match_list.len());
        for entry in &self.match_list {
            let site = find_neighbor(neighborhood, entry)?;
            if !entry.matches(types[site]) {
                return None;
            }
            sites.push(site);
        }
        Some(sites)
    }

    /// Cheaper variant of [`Process::match_sites`] that only reports whether it matches.
    pub fn matches_at(&self, neighborhood: &[Neighbor], types: &[u32]) -> bool {
        self.match_list.iter().all(|entry| {
            find_neighbor(neighborhood, entry).is_some_and(|site| entry.matches(types[site]))
        })
    }
}

/// Neighborhoods are sorted by distance, so the scan skips everything closer
/// than the entry and stops once past it.
#[inline]
fn find_neighbor(neighborhood: &[Neighbor], entry: &MatchListEntry) -> Option<usize> {
    let start = neighborhood.partition_point(|n| n.distance < entry.distance - MATCH_TOLERANCE);
    neighborhood[start..]
        .iter()
        .take_while(|n| n.distance <= entry.distance + MATCH_TOLERANCE)
        .find(|n| (n.offset - entry.coordinate).norm() < MATCH_TOLERANCE)
        .map(|n| n.site)
}

/// Ordered set of processes handed to the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessTable {
    pub processes: Vec<Process>,
}

impl ProcessTable {
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Largest template radius over all processes.
    pub fn cutoff(&self) -> f64 {
        self.processes
            .iter()
            .map(Process::cutoff)
            .fold(0.0, f64::max)
    }

    pub fn rates(&self) -> Vec<f64> {
        self.processes.iter().map(|p| p.rate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(match_type: u32, update_type: u32, coordinate: [f64; 3]) -> MatchListEntry {
        let coordinate = Coordinate::from(coordinate);
        MatchListEntry {
            match_type,
            update_type,
            distance: coordinate.norm(),
            coordinate,
        }
    }

    fn line_neighborhood() -> Vec<Neighbor> {
        // Sites 0..3 on a line, centered on site 1.
        vec![
            Neighbor { site: 1, offset: Coordinate::zeros(), distance: 0.0 },
            Neighbor { site: 0, offset: -Coordinate::x(), distance: 1.0 },
            Neighbor { site: 2, offset: Coordinate::x(), distance: 1.0 },
        ]
    }

    #[test]
    fn test_match_sites() {
        let hop = Process {
            match_list: vec![entry(1, 2, [0.0; 3]), entry(2, 1, [1.0, 0.0, 0.0])],
            rate: 1.0,
        };
        let hood = line_neighborhood();

        assert_eq!(hop.match_sites(&hood, &[2, 1, 2]), Some(vec![1, 2]));
        assert!(hop.matches_at(&hood, &[2, 1, 2]));
        assert_eq!(hop.match_sites(&hood, &[2, 1, 1]), None);
        assert!(!hop.matches_at(&hood, &[2, 2, 2]));
    }

    #[test]
    fn test_wildcard() {
        let any_left = Process {
            match_list: vec![entry(1, 2, [0.0; 3]), entry(WILDCARD_TYPE, WILDCARD_TYPE, [-1.0, 0.0, 0.0])],
            rate: 1.0,
        };
        let hood = line_neighborhood();
        assert!(any_left.matches_at(&hood, &[7, 1, 3]));
        assert!(!any_left.match_list[1].changes_site());
        assert!(any_left.match_list[0].changes_site());
    }

    #[test]
    fn test_missing_neighbor() {
        let far = Process {
            match_list: vec![entry(1, 2, [0.0; 3]), entry(1, 2, [0.0, 2.0, 0.0])],
            rate: 1.0,
        };
        assert!(!far.matches_at(&line_neighborhood(), &[1, 1, 1]));
        assert!((far.cutoff() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_table_cutoff() {
        let table = ProcessTable {
            processes: vec![
                Process { match_list: vec![entry(1, 2, [0.0; 3]), entry(1, 2, [0.0, 1.5, 0.0])], rate: 2.0 },
                Process { match_list: vec![entry(1, 2, [0.0; 3])], rate: 3.0 },
            ],
        };
        assert_eq!(table.len(), 2);
        assert!((table.cutoff() - 1.5).abs() < 1e-12);
        assert_eq!(table.rates(), vec![2.0, 3.0]);
    }
}
