use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use super::model::LatticeModel;
use crate::configuration::count_types;

const ABSENT: usize = usize::MAX;

/// Sites at which each process currently matches.
///
/// `sites[p]` lists the matching sites of process `p` in no particular order;
/// `slots[p * n_sites + s]` is the position of site `s` in that list, or
/// `ABSENT`. Insert and remove are O(1) via swap-remove.
#[derive(Debug, Clone)]
pub struct EventList {
    n_sites: usize,
    sites: Vec<Vec<usize>>,
    slots: Vec<usize>,
}

impl EventList {
    pub fn new(n_processes: usize, n_sites: usize) -> Self {
        Self {
            n_sites,
            sites: vec![Vec::new(); n_processes],
            slots: vec![ABSENT; n_processes * n_sites],
        }
    }

    pub fn insert(&mut self, process: usize, site: usize) {
        let idx = process * self.n_sites + site;
        if self.slots[idx] == ABSENT {
            self.slots[idx] = self.sites[process].len();
            self.sites[process].push(site);
        }
    }

    pub fn remove(&mut self, process: usize, site: usize) {
        let idx = process * self.n_sites + site;
        let slot = self.slots[idx];
        if slot == ABSENT {
            return;
        }
        let list = &mut self.sites[process];
        list.swap_remove(slot);
        if let Some(&moved) = list.get(slot) {
            self.slots[process * self.n_sites + moved] = slot;
        }
        self.slots[idx] = ABSENT;
    }

    #[inline]
    pub fn set(&mut self, process: usize, site: usize, available: bool) {
        if available {
            self.insert(process, site);
        } else {
            self.remove(process, site);
        }
    }

    pub fn contains(&self, process: usize, site: usize) -> bool {
        self.slots[process * self.n_sites + site] != ABSENT
    }

    pub fn sites(&self, process: usize) -> &[usize] {
        &self.sites[process]
    }

    pub fn count(&self, process: usize) -> usize {
        self.sites[process].len()
    }

    /// Sum over processes of `rate * available sites`.
    pub fn total_rate(&self, rates: &[f64]) -> f64 {
        rates
            .iter()
            .zip(self.sites.iter())
            .map(|(&r, s)| r * s.len() as f64)
            .sum()
    }

    /// Pick a process with probability proportional to its total rate, then
    /// one of its sites uniformly.
    pub fn select(
        &self,
        rates: &[f64],
        total_rate: f64,
        rng: &mut Xoshiro256StarStar,
    ) -> Option<(usize, usize)> {
        let target = rng.gen::<f64>() * total_rate;
        let mut acc = 0.0;
        let mut chosen = None;
        for (p, (&rate, sites)) in rates.iter().zip(self.sites.iter()).enumerate() {
            if sites.is_empty() {
                continue;
            }
            chosen = Some(p);
            acc += rate * sites.len() as f64;
            if target < acc {
                break;
            }
        }
        // Rounding can leave `target` just past the last partial sum; the last
        // non-empty process is then the right pick.
        let p = chosen?;
        let sites = &self.sites[p];
        Some((p, sites[rng.gen_range(0..sites.len())]))
    }
}

/// Mutable state of one KMC trajectory.
pub struct KmcState {
    /// Type id per site.
    pub types: Vec<u32>,
    /// Sites per concrete type, aligned with [`LatticeModel::type_ids`].
    pub counts: Vec<u64>,
    pub time: f64,
    /// Events executed since construction or the last reset.
    pub step: u64,
    pub rng: Xoshiro256StarStar,
    pub events: EventList,
}

impl KmcState {
    /// Start from the model's initial configuration with a seeded PRNG.
    pub fn new(model: &LatticeModel, seed: u64) -> Self {
        let types = model.initial_types.clone();
        let events = build_events(model, &types);
        Self {
            counts: count_types(&model.type_ids, &types),
            types,
            time: 0.0,
            step: 0,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            events,
        }
    }

    /// One fresh state per run, run `i` seeded with `seed + i` (wrapping).
    pub fn ensemble(model: &LatticeModel, seed: u64, n_runs: usize) -> Vec<Self> {
        (0..n_runs as u64)
            .map(|i| Self::new(model, seed.wrapping_add(i)))
            .collect()
    }

    /// Return to the initial configuration, time zero and a fresh PRNG.
    pub fn reset(&mut self, model: &LatticeModel, seed: u64) {
        self.types.clone_from(&model.initial_types);
        self.counts = count_types(&model.type_ids, &self.types);
        self.time = 0.0;
        self.step = 0;
        self.rng = Xoshiro256StarStar::seed_from_u64(seed);
        self.events = build_events(model, &self.types);
    }

    /// Re-evaluate every process at every site within the cutoff of a
    /// changed site.
    pub fn refresh(&mut self, model: &LatticeModel, changed: &[usize]) {
        let mut affected: Vec<usize> = changed
            .iter()
            .flat_map(|&c| model.neighborhoods[c].iter().map(|n| n.site))
            .collect();
        affected.sort_unstable();
        affected.dedup();

        for site in affected {
            let hood = &model.neighborhoods[site];
            for (p, process) in model.processes.processes().iter().enumerate() {
                self.events.set(p, site, process.matches_at(hood, &self.types));
            }
        }
    }
}

fn build_events(model: &LatticeModel, types: &[u32]) -> EventList {
    let mut events = EventList::new(model.n_processes(), model.n_sites());
    for (site, matching) in model.match_all(types).into_iter().enumerate() {
        for p in matching {
            events.insert(p, site);
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_list_insert_remove() {
        let mut events = EventList::new(2, 5);
        events.insert(0, 3);
        events.insert(0, 1);
        events.insert(0, 4);
        events.insert(0, 1);
        assert_eq!(events.sites(0), &[3, 1, 4]);

        events.remove(0, 3);
        assert_eq!(events.sites(0), &[4, 1]);
        assert!(events.contains(0, 4));
        assert!(!events.contains(0, 3));

        events.remove(0, 1);
        events.remove(0, 2);
        assert_eq!(events.sites(0), &[4]);
        assert_eq!(events.count(1), 0);

        events.set(1, 2, true);
        events.set(0, 4, false);
        assert_eq!(events.total_rate(&[10.0, 0.5]), 0.5);
    }

    #[test]
    fn test_select_respects_rates() {
        let mut events = EventList::new(3, 4);
        events.insert(0, 0);
        events.insert(2, 1);
        events.insert(2, 2);
        let rates = [1.0, 100.0, 4.5];
        let total = events.total_rate(&rates);
        assert_eq!(total, 10.0);

        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        let mut hits = [0usize; 3];
        for _ in 0..10_000 {
            let (p, site) = events.select(&rates, total, &mut rng).unwrap();
            assert!(events.contains(p, site));
            hits[p] += 1;
        }
        assert_eq!(hits[1], 0);
        // Process 0 carries 10% of the total rate.
        assert!((hits[0] as f64 / 10_000.0 - 0.1).abs() < 0.02);
    }

    #[test]
    fn test_select_empty() {
        let events = EventList::new(2, 3);
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        assert_eq!(events.select(&[1.0, 1.0], 0.0, &mut rng), None);
    }
}
