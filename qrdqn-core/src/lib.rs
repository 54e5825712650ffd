#![warn(missing_docs)]
//! Backend-independent building blocks for quantile regression DQN.
//!
//! This crate defines the interfaces between an environment, an agent and a
//! replay memory, together with the episode-based training loop that drives
//! them. Neural network backends live in separate crates.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Agent, Configurable, Env, ExperienceBufferBase, Info, Policy, ReplayBufferBase, Step,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Trainer, TrainerConfig};
