use validator::{Validate, ValidationError};

fn validate_control_parameters(cfg: &ControlParameters) -> Result<(), ValidationError> {
    if cfg.n_steps < 1 {
        return Err(ValidationError::new("n_steps must be >= 1"));
    }
    if cfg.dump_interval < 1 {
        return Err(ValidationError::new("dump_interval must be >= 1"));
    }
    if let Some(t) = cfg.time_limit {
        if !t.is_finite() || t <= 0.0 {
            return Err(ValidationError::new(
                "time_limit must be finite and positive",
            ));
        }
    }
    Ok(())
}

/// Settings for one call of the KMC loop.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_control_parameters"))]
pub struct ControlParameters {
    /// Number of events to execute.
    pub n_steps: u64,
    /// Record a dump every `dump_interval` executed events.
    pub dump_interval: u64,
    /// Stop once simulation time passes this value.
    pub time_limit: Option<f64>,
    /// Store the full type array at every dump.
    pub record_types: bool,
    /// Run several states one after another instead of on the rayon pool.
    pub sequential: bool,
}

impl ControlParameters {
    pub fn new(n_steps: u64, dump_interval: u64) -> Self {
        Self {
            n_steps,
            dump_interval,
            time_limit: None,
            record_types: false,
            sequential: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(ControlParameters::new(10, 1).validate().is_ok());
        assert!(ControlParameters::new(0, 1).validate().is_err());
        assert!(ControlParameters::new(10, 0).validate().is_err());

        let mut cfg = ControlParameters::new(10, 5);
        cfg.time_limit = Some(-1.0);
        assert!(cfg.validate().is_err());
        cfg.time_limit = Some(2.5);
        assert!(cfg.validate().is_ok());
    }
}
