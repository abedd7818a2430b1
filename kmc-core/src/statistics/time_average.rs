/// Time-weighted running average of per-type observables.
///
/// Each update adds `values * weight`; in the KMC loop the weight is the time
/// the system spent in the state the values were measured on.
pub struct TimeAverage {
    pub total_weight: f64,
    pub aggregate: Vec<f64>,
}

impl TimeAverage {
    pub fn new(n_values: usize) -> Self {
        Self {
            total_weight: 0.0,
            aggregate: vec![0.0; n_values],
        }
    }

    pub fn update(&mut self, values: &[f64], weight: f64) {
        self.total_weight += weight;
        for (agg, &v) in self.aggregate.iter_mut().zip(values.iter()) {
            *agg += v * weight;
        }
    }

    pub fn average(&self) -> Vec<f64> {
        if self.total_weight <= 0.0 {
            return self.aggregate.clone();
        }
        self.aggregate
            .iter()
            .map(|&a| a / self.total_weight)
            .collect()
    }
}
