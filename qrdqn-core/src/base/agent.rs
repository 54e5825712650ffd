//! Agent.
use super::{Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
pub trait Agent<R: ReplayBufferBase>: Policy {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step and returns some information.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters. The caller is responsible for having
    /// enough transitions in the buffer; sampling failures are returned as
    /// errors.
    fn opt(&mut self, buffer: &mut R) -> Result<Record>;

    /// Called by the trainer when an episode ends.
    ///
    /// Agents with per-episode schedules, like the decay of epsilon,
    /// update them here.
    fn on_episode_end(&mut self) -> Record {
        Record::empty()
    }

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
