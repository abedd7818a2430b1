pub mod model;
pub mod state;

pub use model::LatticeModel;
pub use state::{EventList, KmcState};

use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use rayon::prelude::*;
use tracing::{info, warn};
use validator::Validate;

use crate::config::ControlParameters;
use crate::error::{KmcError, Result};
use crate::statistics::{RunResult, TimeAverage};

/// One executed event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutedEvent {
    pub process: usize,
    /// Center site the process was applied at.
    pub site: usize,
    /// Time increment drawn for this event.
    pub dt: f64,
}

/// Execute one KMC event, or return `None` when no process matches anywhere.
///
/// The process is chosen with probability `rate_p * n_p / R` where `R` is the
/// total rate, the site uniformly among that process's matches. Time advances
/// by `-ln(u) / R` with `u` uniform in `(0, 1]`.
#[cfg_attr(feature = "profile", inline(never))]
pub fn kmc_step(model: &LatticeModel, state: &mut KmcState) -> Result<Option<ExecutedEvent>> {
    let total_rate = state.events.total_rate(&model.rates);
    if total_rate <= 0.0 {
        return Ok(None);
    }
    let Some((process_id, site)) = state.events.select(&model.rates, total_rate, &mut state.rng)
    else {
        return Ok(None);
    };

    let process = &model.processes.processes()[process_id];
    let matched = process
        .match_sites(&model.neighborhoods[site], &state.types)
        .ok_or(KmcError::StaleEvent {
            process: process_id,
            site,
        })?;

    let mut changed = Vec::with_capacity(matched.len());
    for (entry, &s) in process.match_list.iter().zip(matched.iter()) {
        if !entry.changes_site() || state.types[s] == entry.update_type {
            continue;
        }
        if let Some(old) = model.type_index(state.types[s]) {
            state.counts[old] -= 1;
        }
        if let Some(new) = model.type_index(entry.update_type) {
            state.counts[new] += 1;
        }
        state.types[s] = entry.update_type;
        changed.push(s);
    }
    state.refresh(model, &changed);

    let u = 1.0 - state.rng.gen::<f64>();
    let dt = -u.ln() / total_rate;
    state.time += dt;
    state.step += 1;

    Ok(Some(ExecutedEvent {
        process: process_id,
        site,
        dt,
    }))
}

fn record_dump(result: &mut RunResult, state: &KmcState, record_types: bool) {
    result.steps.push(state.step);
    result.times.push(state.time);
    result
        .type_counts
        .push(state.counts.iter().map(|&c| c as f64).collect());
    if record_types {
        result.snapshots.push(state.types.clone());
    }
}

/// Run the KMC loop for one [`KmcState`].
///
/// The starting state is dumped first, then every `dump_interval` executed
/// events, and the final state once more if the last event fell between
/// dumps. The loop stops early when no process matches anywhere or when
/// `time_limit` is passed.
///
/// `on_step` is called once per attempted event (useful for progress bars).
pub fn run_kmc_loop(
    model: &LatticeModel,
    state: &mut KmcState,
    control: &ControlParameters,
    interrupted: &AtomicBool,
    on_step: &(dyn Fn() + Sync),
) -> Result<RunResult> {
    control
        .validate()
        .map_err(|e| KmcError::InvalidControl(format!("{e}")))?;

    let n_types = model.type_ids.len();
    let n_sites = model.n_sites() as f64;

    let mut fractions = TimeAverage::new(n_types);
    let mut fractions_buf = vec![0.0f64; n_types];
    let mut process_counts = vec![0u64; model.n_processes()];
    let mut n_executed = 0u64;

    let mut result = RunResult {
        type_ids: model.type_ids.clone(),
        steps: Vec::new(),
        times: Vec::new(),
        type_counts: Vec::new(),
        snapshots: Vec::new(),
        type_fractions: Vec::new(),
        process_counts: Vec::new(),
        n_executed: 0,
        final_time: 0.0,
    };
    record_dump(&mut result, state, control.record_types);

    for _ in 0..control.n_steps {
        if interrupted.load(Ordering::Relaxed) {
            return Err(KmcError::Interrupted);
        }
        on_step();

        for (f, &c) in fractions_buf.iter_mut().zip(state.counts.iter()) {
            *f = c as f64 / n_sites;
        }

        let Some(event) = kmc_step(model, state)? else {
            warn!(step = state.step, time = state.time, "no available events, stopping early");
            break;
        };
        fractions.update(&fractions_buf, event.dt);
        process_counts[event.process] += 1;
        n_executed += 1;

        if n_executed % control.dump_interval == 0 {
            record_dump(&mut result, state, control.record_types);
        }

        if control.time_limit.is_some_and(|limit| state.time >= limit) {
            info!(step = state.step, time = state.time, "time limit reached");
            break;
        }
    }

    if result.steps.last() != Some(&state.step) {
        record_dump(&mut result, state, control.record_types);
    }

    result.type_fractions = if fractions.total_weight > 0.0 {
        fractions.average()
    } else {
        state.counts.iter().map(|&c| c as f64 / n_sites).collect()
    };
    result.process_counts = process_counts;
    result.n_executed = n_executed;
    result.final_time = state.time;

    info!(
        n_executed,
        time = state.time,
        step = state.step,
        "kmc run finished"
    );
    Ok(result)
}

/// Run the KMC loop over several independent states of one model.
///
/// Each state is processed by [`run_kmc_loop`], then results are averaged via
/// [`RunResult::aggregate`]. A single state is run directly, skipping rayon
/// thread-pool overhead; `control.sequential` keeps every run on the current
/// thread.
pub fn run_kmc_parallel(
    model: &LatticeModel,
    states: &mut [KmcState],
    control: &ControlParameters,
    interrupted: &AtomicBool,
    on_step: &(dyn Fn() + Sync),
) -> Result<RunResult> {
    if states.is_empty() {
        return Err(KmcError::Empty("states"));
    }
    if states.len() == 1 {
        return run_kmc_loop(model, &mut states[0], control, interrupted, on_step);
    }

    let run = |state: &mut KmcState| run_kmc_loop(model, state, control, interrupted, on_step);
    let results: Vec<Result<RunResult>> = if control.sequential {
        states.iter_mut().map(run).collect()
    } else {
        states.par_iter_mut().map(run).collect()
    };

    let results: Vec<RunResult> = results.into_iter().collect::<Result<Vec<_>>>()?;
    Ok(RunResult::aggregate(&results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Configuration;
    use crate::geometry::{Coordinate, Lattice, UnitCell};
    use crate::interactions::{Interaction, Interactions};
    use crate::local_config::LocalConfiguration;
    use crate::types::{PossibleTypes, WILDCARD_TYPE};

    fn local(coords: &[[f64; 3]], types: &[&str]) -> LocalConfiguration {
        LocalConfiguration::new(
            coords.iter().map(|&c| Coordinate::from(c)).collect(),
            types.iter().map(|s| s.to_string()).collect(),
            0,
        )
        .unwrap()
    }

    fn chain_model(labels: &[&str], interactions: Vec<Interaction>) -> LatticeModel {
        let lattice = Lattice::new(
            UnitCell::cubic(1.0).unwrap(),
            [labels.len(), 1, 1],
            [true, false, false],
        )
        .unwrap();
        let labels: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        let possible = PossibleTypes::from_labels(["A", "B", "V"]);
        let config = Configuration::new(lattice, &labels, Some(possible)).unwrap();
        LatticeModel::new(config, &Interactions::new(interactions).unwrap(), true).unwrap()
    }

    fn conversion() -> Vec<Interaction> {
        vec![Interaction::new(
            local(&[[0.0; 3]], &["A"]),
            local(&[[0.0; 3]], &["B"]),
            2.0,
        )]
    }

    fn hopping() -> Vec<Interaction> {
        [[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]
            .into_iter()
            .map(|dir| {
                let coords = [[0.0; 3], dir];
                Interaction::new(local(&coords, &["A", "V"]), local(&coords, &["V", "A"]), 1.0)
            })
            .collect()
    }

    fn assert_events_consistent(model: &LatticeModel, state: &KmcState) {
        for site in 0..model.n_sites() {
            for (p, process) in model.processes.processes().iter().enumerate() {
                assert_eq!(
                    state.events.contains(p, site),
                    process.matches_at(&model.neighborhoods[site], &state.types),
                    "process {p} at site {site}"
                );
            }
        }
    }

    #[test]
    fn test_conversion_runs_to_completion() {
        let model = chain_model(&["A"; 10], conversion());
        let mut state = KmcState::new(&model, 42);
        assert_eq!(state.events.count(0), 10);

        let interrupted = AtomicBool::new(false);
        let control = ControlParameters::new(25, 1);
        let result = run_kmc_loop(&model, &mut state, &control, &interrupted, &|| {}).unwrap();

        assert_eq!(result.n_executed, 10);
        assert_eq!(result.process_counts, vec![10]);
        assert_eq!(state.counts, vec![0, 10, 0]);
        assert_eq!(result.type_counts.last().unwrap(), &vec![0.0, 10.0, 0.0]);
        assert_eq!(result.steps.len(), 11);
        assert!(result.times.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(result.final_time, state.time);
        assert_events_consistent(&model, &state);
    }

    #[test]
    fn test_hopping_conserves_particles() {
        let mut labels = ["V"; 12];
        labels[0] = "A";
        labels[4] = "A";
        labels[5] = "A";
        let model = chain_model(&labels, hopping());
        let mut state = KmcState::new(&model, 7);
        assert_events_consistent(&model, &state);

        let interrupted = AtomicBool::new(false);
        let control = ControlParameters::new(500, 50);
        let result = run_kmc_loop(&model, &mut state, &control, &interrupted, &|| {}).unwrap();

        assert_eq!(result.n_executed, 500);
        for counts in &result.type_counts {
            assert_eq!(counts, &vec![3.0, 0.0, 9.0]);
        }
        assert_eq!(state.types.iter().filter(|&&t| t == 1).count(), 3);
        assert!((result.type_fractions[0] - 0.25).abs() < 1e-12);
        assert_events_consistent(&model, &state);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let mut labels = ["V"; 10];
        labels[2] = "A";
        labels[3] = "A";
        let model = chain_model(&labels, hopping());
        let interrupted = AtomicBool::new(false);
        let mut control = ControlParameters::new(100, 10);
        control.record_types = true;

        let mut a = KmcState::new(&model, 3);
        let mut b = KmcState::new(&model, 3);
        let ra = run_kmc_loop(&model, &mut a, &control, &interrupted, &|| {}).unwrap();
        let rb = run_kmc_loop(&model, &mut b, &control, &interrupted, &|| {}).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(ra.snapshots.len(), 11);

        a.reset(&model, 3);
        assert_eq!(a.types, model.initial_types);
        assert_eq!(a.time, 0.0);
        let rc = run_kmc_loop(&model, &mut a, &control, &interrupted, &|| {}).unwrap();
        assert_eq!(ra, rc);
    }

    #[test]
    fn test_dump_schedule() {
        let model = chain_model(&["A"; 20], conversion());
        let mut state = KmcState::new(&model, 1);
        let interrupted = AtomicBool::new(false);
        let control = ControlParameters::new(10, 3);
        let result = run_kmc_loop(&model, &mut state, &control, &interrupted, &|| {}).unwrap();
        assert_eq!(result.steps, vec![0, 3, 6, 9, 10]);
        assert_eq!(result.type_counts[1], vec![17.0, 3.0, 0.0]);
    }

    #[test]
    fn test_time_limit() {
        let model = chain_model(&["A"; 50], conversion());
        let mut state = KmcState::new(&model, 5);
        let interrupted = AtomicBool::new(false);
        let mut control = ControlParameters::new(1000, 1);
        control.time_limit = Some(0.01);
        let result = run_kmc_loop(&model, &mut state, &control, &interrupted, &|| {}).unwrap();
        assert!(result.final_time >= 0.01);
        assert!(result.n_executed < 50);
    }

    #[test]
    fn test_interrupted_and_invalid_control() {
        let model = chain_model(&["A"; 5], conversion());
        let mut state = KmcState::new(&model, 5);
        let interrupted = AtomicBool::new(true);
        let control = ControlParameters::new(3, 1);
        assert_eq!(
            run_kmc_loop(&model, &mut state, &control, &interrupted, &|| {}),
            Err(KmcError::Interrupted)
        );

        let interrupted = AtomicBool::new(false);
        let bad = ControlParameters::new(0, 1);
        assert!(matches!(
            run_kmc_loop(&model, &mut state, &bad, &interrupted, &|| {}),
            Err(KmcError::InvalidControl(_))
        ));
    }

    #[test]
    fn test_parallel_runs_aggregate() {
        let mut labels = ["V"; 8];
        labels[0] = "A";
        let model = chain_model(&labels, hopping());
        let mut states: Vec<KmcState> = (0..4).map(|i| KmcState::new(&model, 100 + i)).collect();
        let interrupted = AtomicBool::new(false);
        let control = ControlParameters::new(40, 10);
        let result = run_kmc_parallel(&model, &mut states, &control, &interrupted, &|| {}).unwrap();

        assert_eq!(result.steps, vec![0, 10, 20, 30, 40]);
        assert_eq!(result.n_executed, 160);
        assert_eq!(result.process_counts.iter().sum::<u64>(), 160);
        for counts in &result.type_counts {
            assert_eq!(counts, &vec![1.0, 0.0, 7.0]);
        }
        assert!(states.iter().all(|s| s.step == 40));

        assert_eq!(
            run_kmc_parallel(&model, &mut [], &control, &interrupted, &|| {}),
            Err(KmcError::Empty("states"))
        );
    }

    #[test]
    fn test_wildcard_neighbor_matches_and_is_kept() {
        let coords = [[0.0; 3], [1.0, 0.0, 0.0]];
        let interactions = vec![Interaction::new(
            local(&coords, &["A", "*"]),
            local(&coords, &["V", "*"]),
            1.0,
        )];
        let model = chain_model(&["A", "B", "A", "V", "A", "B"], interactions);
        let wildcard = &model.processes.processes()[0].match_list[1];
        assert_eq!(wildcard.match_type, WILDCARD_TYPE);
        assert_eq!(wildcard.update_type, WILDCARD_TYPE);

        let mut state = KmcState::new(&model, 9);
        assert_eq!(state.events.sites(0).len(), 3);

        let interrupted = AtomicBool::new(false);
        let control = ControlParameters::new(10, 1);
        let result = run_kmc_loop(&model, &mut state, &control, &interrupted, &|| {}).unwrap();

        assert_eq!(result.n_executed, 3);
        assert_eq!(model.labels(&state.types), vec!["V", "B", "V", "V", "V", "B"]);
        assert_eq!(state.counts, vec![0, 2, 4]);
        assert_events_consistent(&model, &state);
    }

    #[test]
    fn test_ensemble_seeds_wrap() {
        let model = chain_model(&["A"; 4], conversion());
        let mut states = KmcState::ensemble(&model, u64::MAX, 2);
        assert_eq!(states.len(), 2);

        let interrupted = AtomicBool::new(false);
        let control = ControlParameters::new(4, 1);
        let mut last = KmcState::new(&model, u64::MAX);
        let mut first = KmcState::new(&model, 0);
        let r_last = run_kmc_loop(&model, &mut last, &control, &interrupted, &|| {}).unwrap();
        let r_first = run_kmc_loop(&model, &mut first, &control, &interrupted, &|| {}).unwrap();
        assert_eq!(
            run_kmc_loop(&model, &mut states[0], &control, &interrupted, &|| {}).unwrap(),
            r_last
        );
        assert_eq!(
            run_kmc_loop(&model, &mut states[1], &control, &interrupted, &|| {}).unwrap(),
            r_first
        );
    }

    #[test]
    fn test_adsorption_desorption_balance() {
        let lattice = Lattice::new(
            UnitCell::cubic(1.0).unwrap(),
            [10, 10, 1],
            [true, true, false],
        )
        .unwrap();
        let config = Configuration::uniform(
            lattice,
            "V",
            Some(PossibleTypes::from_labels(["A", "V"])),
        )
        .unwrap();
        let interactions = Interactions::new(vec![
            Interaction::new(local(&[[0.0; 3]], &["V"]), local(&[[0.0; 3]], &["A"]), 1.0),
            Interaction::new(local(&[[0.0; 3]], &["A"]), local(&[[0.0; 3]], &["V"]), 1.0),
        ])
        .unwrap();
        let model = LatticeModel::new(config, &interactions, false).unwrap();
        let mut state = KmcState::new(&model, 11);

        let interrupted = AtomicBool::new(false);
        let control = ControlParameters::new(20_000, 1000);
        let result = run_kmc_loop(&model, &mut state, &control, &interrupted, &|| {}).unwrap();

        assert_eq!(result.n_executed, 20_000);
        assert!((result.type_fractions[0] - 0.5).abs() < 0.03);
        assert!((result.type_fractions.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
