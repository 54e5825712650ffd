//! QR-DQN agent.
//!
//! The agent learns, for every action, `quant_num` quantiles of the return
//! distribution at the fixed levels `tau_hat[i] = (i + 0.5) / quant_num`.
//! Targets are built with a target network that is a hard copy of the online
//! network, refreshed every `update_freq` optimization steps.
mod base;
mod config;
mod explorer;
mod model;
mod target;
pub use base::QrDqn;
pub use config::QrDqnConfig;
pub use explorer::EpsilonGreedy;
pub use model::{QrDqnModel, QrDqnModelConfig};
pub use target::{rank_tau, target_distribution};
