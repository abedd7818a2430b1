/// Observables recorded over one KMC run.
///
/// Dump series (`steps`, `times`, `type_counts`, `snapshots`) share one index:
/// entry `i` describes the state after `steps[i]` executed events. The first
/// dump is always the state the run started from.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Concrete type ids, the column order of `type_counts` and `type_fractions`.
    pub type_ids: Vec<u32>,
    /// Step counter at each dump.
    pub steps: Vec<u64>,
    /// Simulation time at each dump.
    pub times: Vec<f64>,
    /// Sites per type at each dump, shape `[n_dumps][n_types]`.
    pub type_counts: Vec<Vec<f64>>,
    /// Type id of every site at each dump. Empty unless `record_types` is set.
    pub snapshots: Vec<Vec<u32>>,
    /// Time-averaged fraction of sites per type.
    pub type_fractions: Vec<f64>,
    /// Times each process fired, indexed like the process table.
    pub process_counts: Vec<u64>,
    /// Events executed in this run.
    pub n_executed: u64,
    /// Simulation time when the run ended.
    pub final_time: f64,
}

impl RunResult {
    /// Average [`RunResult`]s of independent runs over the same model.
    ///
    /// Dump series are truncated to the shortest run, since runs that stalled
    /// or hit the time limit record fewer dumps. Snapshots are not averaged and
    /// come back empty. Process and event counts are summed.
    pub fn aggregate(results: &[Self]) -> Self {
        let n = results.len() as f64;
        let first = &results[0];
        let n_types = first.type_ids.len();
        let n_dumps = results.iter().map(|r| r.times.len()).min().unwrap_or(0);

        let mut agg = RunResult {
            type_ids: first.type_ids.clone(),
            steps: first.steps[..n_dumps].to_vec(),
            times: vec![0.0; n_dumps],
            type_counts: (0..n_dumps).map(|_| vec![0.0; n_types]).collect(),
            snapshots: vec![],
            type_fractions: vec![0.0; n_types],
            process_counts: vec![0; first.process_counts.len()],
            n_executed: 0,
            final_time: 0.0,
        };

        for r in results {
            for (a, &v) in agg.times.iter_mut().zip(r.times.iter()) {
                *a += v;
            }
            for (a_row, r_row) in agg.type_counts.iter_mut().zip(r.type_counts.iter()) {
                for (a, &v) in a_row.iter_mut().zip(r_row.iter()) {
                    *a += v;
                }
            }
            for (a, &v) in agg.type_fractions.iter_mut().zip(r.type_fractions.iter()) {
                *a += v;
            }
            for (a, &v) in agg.process_counts.iter_mut().zip(r.process_counts.iter()) {
                *a += v;
            }
            agg.n_executed += r.n_executed;
            agg.final_time += r.final_time;
        }

        for v in agg
            .times
            .iter_mut()
            .chain(agg.type_counts.iter_mut().flatten())
            .chain(agg.type_fractions.iter_mut())
        {
            *v /= n;
        }
        agg.final_time /= n;

        agg
    }
}
