//! CLI configuration: flags, validation, and the exit-code mapping used by
//! `main.rs`.
//!
//! `-h/--help` is handled by `clap` itself. Queue sizes must be `>= 1`
//! (a zero-capacity queue can never hold anything), timeout must be a
//! positive float, and `--plugins` is accepted for interface parity even
//! though this build does not load plugins.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::{Error, Result};

/// Process exit codes returned by `main.rs`.
pub mod exit_code {
    /// Success.
    pub const SUCCESS: i32 = 0;
    /// Bad CLI arguments.
    pub const BAD_ARGS: i32 = -1;
    /// Plugin load failure. This build never produces it itself since it
    /// does not load plugins, but the code is reserved for a caller that
    /// wires in a real plugin loader.
    pub const PLUGIN_LOAD_FAILURE: i32 = -2;
    /// Environment init or input-file failure.
    pub const ENV_OR_INPUT_FAILURE: i32 = -3;
    /// Uncaught exception.
    pub const UNCAUGHT: i32 = -42;
}

/// Command-line configuration for the scheduling core's standalone binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "zenith-scheduler", about = "FCFS scheduling core: chains, controllers, and the command processor")]
pub struct Config {
    /// Enable debug-level logging.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Read commands from a file instead of the HTTP control surface.
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Plugin directory. Accepted for interface parity; this build does
    /// not load plugins, so a value here is logged and ignored.
    #[arg(short = 'p', long = "plugins", value_name = "DIR")]
    pub plugins: Option<PathBuf>,

    /// Input command queue capacity.
    #[arg(long = "in-queue", default_value_t = 64)]
    pub in_queue: i64,

    /// Output response queue capacity.
    #[arg(long = "out-queue", default_value_t = 64)]
    pub out_queue: i64,

    /// Handshake and interrupt timeout, in seconds.
    #[arg(long = "timeout", default_value_t = 5.0)]
    pub timeout: f64,

    /// Address the HTTP control surface binds to.
    #[arg(long = "listen", default_value = "0.0.0.0:7878")]
    pub listen: String,
}

impl Config {
    /// Parses `std::env::args()` and validates the result.
    pub fn parse_and_validate() -> Result<Self> {
        let config = Config::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validates flag combinations and value ranges: queue sizes must be
    /// `>= 1`, timeout must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.in_queue < 1 {
            return Err(Error::Config(format!(
                "--in-queue must be >= 1, got {}",
                self.in_queue
            )));
        }
        if self.out_queue < 1 {
            return Err(Error::Config(format!(
                "--out-queue must be >= 1, got {}",
                self.out_queue
            )));
        }
        if !(self.timeout > 0.0) {
            return Err(Error::Config(format!(
                "--timeout must be a positive number, got {}",
                self.timeout
            )));
        }
        if self.plugins.is_some() {
            tracing::warn!("--plugins was given but this build does not support plugin loading; ignoring");
        }
        Ok(())
    }

    /// The in-queue capacity as a `usize`, after validation.
    pub fn in_queue_capacity(&self) -> usize {
        self.in_queue as usize
    }

    /// The out-queue capacity as a `usize`, after validation.
    pub fn out_queue_capacity(&self) -> usize {
        self.out_queue as usize
    }

    /// The handshake/interrupt timeout as a [`Duration`].
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            debug: false,
            input: None,
            plugins: None,
            in_queue: 64,
            out_queue: 64,
            timeout: 5.0,
            listen: "0.0.0.0:7878".to_string(),
        }
    }

    #[test]
    fn defaults_validate() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn zero_queue_size_is_rejected() {
        let mut config = base_config();
        config.in_queue = 0;
        assert!(config.validate().is_err());
        config = base_config();
        config.out_queue = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_timeout_is_rejected() {
        let mut config = base_config();
        config.timeout = 0.0;
        assert!(config.validate().is_err());
        config.timeout = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeout_duration_round_trips() {
        let config = base_config();
        assert_eq!(config.timeout_duration(), Duration::from_secs(5));
    }
}
