use std::{env, path::PathBuf, time::Duration};

use crate::error::ConfigError;

const TICK_INTERVAL_MS: u64 = 1000 / 60;
const INITIAL_CADENCE: f64 = 4.0;
const CADENCE_STEP: f64 = 0.1;
const MIN_COLUMNS: u16 = 62;
const MIN_ROWS: u16 = 10;

/// Runtime knobs. `Default` is the canonical game.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tick_interval: Duration,
    pub initial_cadence: f64,
    pub cadence_step: f64,
    pub min_columns: u16,
    pub min_rows: u16,
    pub log_file: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
            initial_cadence: INITIAL_CADENCE,
            cadence_step: CADENCE_STEP,
            min_columns: MIN_COLUMNS,
            min_rows: MIN_ROWS,
            log_file: None,
            seed: None,
        }
    }
}

impl Config {
    /// Defaults overridden by `SNAKE_TICK_MS`, `SNAKE_CADENCE`, `SNAKE_SEED`
    /// and `SNAKE_LOG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(value) = lookup("SNAKE_TICK_MS") {
            match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.tick_interval = Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "SNAKE_TICK_MS",
                        value,
                        expected: "a positive number of milliseconds",
                    })
                }
            }
        }

        if let Some(value) = lookup("SNAKE_CADENCE") {
            match value.trim().parse::<f64>() {
                Ok(cadence) if cadence.is_finite() && cadence >= 1.0 => {
                    config.initial_cadence = cadence
                }
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "SNAKE_CADENCE",
                        value,
                        expected: "a number >= 1",
                    })
                }
            }
        }

        if let Some(value) = lookup("SNAKE_SEED") {
            match value.trim().parse::<u64>() {
                Ok(seed) => config.seed = Some(seed),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        var: "SNAKE_SEED",
                        value,
                        expected: "an unsigned integer",
                    })
                }
            }
        }

        config.log_file = lookup("SNAKE_LOG")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}
