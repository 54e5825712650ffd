//! Configuration of [`Trainer`](super::Trainer).
use crate::error::QrDqnError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of episodes to run.
    pub episodes: usize,

    /// Optimization starts once the replay buffer holds more than this many
    /// transitions. It must not be smaller than the batch size of the agent.
    pub exploration: usize,

    /// Interval of flushing records in episodes.
    pub flush_record_interval: usize,

    /// Where to save the trained model at the end of training.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            exploration: 200,
            flush_record_interval: usize::MAX,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of episodes.
    pub fn episodes(mut self, v: usize) -> Self {
        self.episodes = v;
        self
    }

    /// Sets the number of transitions collected before optimization starts.
    pub fn exploration(mut self, v: usize) -> Self {
        self.exploration = v;
        self
    }

    /// Sets the interval of flushing records in episodes.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = v;
        self
    }

    /// Sets the directory where the trained model is saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Rejects values the trainer cannot work with.
    pub fn check(&self) -> Result<(), QrDqnError> {
        if self.flush_record_interval == 0 {
            return Err(QrDqnError::Config(
                "flush_record_interval must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
