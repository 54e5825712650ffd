//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum QrDqnError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// A batch larger than the number of stored transitions was requested.
    #[error("Cannot sample {requested} transitions from a buffer holding {available}")]
    InsufficientTransitions {
        /// Requested batch size.
        requested: usize,
        /// Number of transitions in the buffer.
        available: usize,
    },

    /// Action index outside of `[0, action_dim)`.
    #[error("Invalid action {action}, the action space has {action_dim} actions")]
    InvalidAction {
        /// Given action.
        action: usize,
        /// Number of actions.
        action_dim: usize,
    },

    /// Observation index outside of `[0, observation_dim)`.
    #[error("Observation {obs} is out of range, the observation space has {observation_dim} states")]
    ObservationOutOfRange {
        /// Given observation.
        obs: usize,
        /// Number of observations.
        observation_dim: usize,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The training loss became NaN or infinite.
    #[error("Non-finite loss {0} at optimization step {1}")]
    NonFiniteLoss(f32, usize),
}
