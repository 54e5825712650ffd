//! Configuration of [`FrozenLake`](super::FrozenLake).
use super::FrozenLakeMap;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`FrozenLake`](super::FrozenLake).
pub struct FrozenLakeConfig {
    pub(super) map: FrozenLakeMap,
    pub(super) is_slippery: bool,
    pub(super) max_episode_steps: Option<usize>,
    pub(super) progress_bonus: f32,
}

impl Default for FrozenLakeConfig {
    fn default() -> Self {
        Self {
            map: FrozenLakeMap::Map4x4,
            is_slippery: false,
            max_episode_steps: Some(100),
            progress_bonus: 0.0,
        }
    }
}

impl FrozenLakeConfig {
    /// Set the map.
    pub fn map(mut self, v: FrozenLakeMap) -> Self {
        self.map = v;
        self
    }

    /// If `true`, the agent moves in the intended direction with probability
    /// 1/3 and in each of the two perpendicular directions with 1/3.
    pub fn is_slippery(mut self, v: bool) -> Self {
        self.is_slippery = v;
        self
    }

    /// Episodes are truncated after this many steps, `None` for no limit.
    pub fn max_episode_steps(mut self, v: Option<usize>) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Scale of the reward for getting closer to the goal.
    ///
    /// Each step adds `progress_bonus * (d_prev - d_next) / d_start`, where
    /// `d` is the Manhattan distance to the nearest goal. Zero disables it.
    pub fn progress_bonus(mut self, v: f32) -> Self {
        self.progress_bonus = v;
        self
    }

    /// Constructs [`FrozenLakeConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`FrozenLakeConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
