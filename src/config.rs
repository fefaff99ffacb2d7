//! Engine configuration.

use std::env;

use crate::error::ConfigError;

pub const DEFAULT_ROUTINE_CAPACITY: usize = 20;
pub const DEFAULT_DIRECTORY_CAPACITY: usize = 31;
pub const DEFAULT_LOG_FILTER: &str = "clinic_dispatch=info";

pub const ROUTINE_CAPACITY_VAR: &str = "CLINIC_ROUTINE_CAPACITY";
pub const DIRECTORY_CAPACITY_VAR: &str = "CLINIC_DIRECTORY_CAPACITY";
pub const LOG_FILTER_VAR: &str = "CLINIC_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Hard limit of the routine queue.
    pub routine_capacity: usize,
    /// Sizing hint for the patient directory.
    pub directory_capacity: usize,
    /// Fallback `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            routine_capacity: DEFAULT_ROUTINE_CAPACITY,
            directory_capacity: DEFAULT_DIRECTORY_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new(routine_capacity: usize) -> Result<Self, ConfigError> {
        Self {
            routine_capacity,
            ..Self::default()
        }
        .validate()
    }

    /// Defaults overridden by `CLINIC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(ROUTINE_CAPACITY_VAR) {
            config.routine_capacity = parse_usize(ROUTINE_CAPACITY_VAR, &value)?;
        }
        if let Some(value) = lookup(DIRECTORY_CAPACITY_VAR) {
            config.directory_capacity = parse_usize(DIRECTORY_CAPACITY_VAR, &value)?;
        }
        if let Some(value) = lookup(LOG_FILTER_VAR) {
            config.log_filter = value;
        }
        config.validate()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.routine_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: "routine_capacity",
            });
        }
        Ok(self)
    }
}

fn parse_usize(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}
