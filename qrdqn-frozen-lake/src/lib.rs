//! FrozenLake grid world.
//!
//! The agent walks on a frozen lake from the start tile `S` to the goal tile
//! `G` without falling into a hole `H`. `F` tiles are frozen and safe.
//! Observations are tile indices `row * ncol + col` and actions are
//! `0: Left, 1: Down, 2: Right, 3: Up`. Reaching the goal pays 1 and ends the
//! episode, falling into a hole ends it with nothing.
//!
//! ```
//! use qrdqn_core::Env;
//! use qrdqn_frozen_lake::{FrozenLake, FrozenLakeConfig};
//!
//! let config = FrozenLakeConfig::default();
//! let mut env = FrozenLake::build(&config, 0).unwrap();
//! let (obs, _) = env.reset().unwrap();
//! assert_eq!(obs, 0);
//! let step = env.step(2).unwrap(); // Right
//! assert_eq!(step.obs, 1);
//! ```
mod base;
mod config;
mod map;
pub use base::{FrozenLake, FrozenLakeInfo};
pub use config::FrozenLakeConfig;
pub use map::{FrozenLakeMap, Tile};
