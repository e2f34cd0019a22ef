use std::path::PathBuf;
use thiserror::Error;

use crate::session::Phase;

/// Rejected state-machine input. The session state is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("'{event}' is not accepted during the {phase} phase")]
    InvalidTransition { phase: Phase, event: &'static str },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Out-of-domain durations or recommender settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("work duration must be {min}..={max} minutes in steps of {step}, got {got}")]
    WorkMinutes {
        got: u32,
        min: u32,
        max: u32,
        step: u32,
    },

    #[error("rest duration must be one of {allowed:?} minutes, got {got}")]
    RestMinutes { got: u32, allowed: &'static [u32] },

    #[error("epsilon must lie in [0, 1], got {0}")]
    Epsilon(f64),
}

/// Failures of the append-only session log.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("failed to access session log at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed session log at {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// A stimulus key that is not in the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown stimulus key '{0}'")]
pub struct UnknownStimulus(pub String);
