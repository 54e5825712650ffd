//! Ring-buffer replay memory.
use super::{SimpleReplayBufferConfig, Transition, TransitionBatch};
use crate::{error::QrDqnError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, seq::index, SeedableRng};
use std::collections::VecDeque;

/// A transition whose observations are already one-hot encoded.
#[derive(Debug, Clone)]
struct Entry {
    obs: Vec<f32>,
    act: usize,
    reward: f32,
    next_obs: Vec<f32>,
    is_done: bool,
}

/// A fixed-capacity replay memory.
///
/// Transitions are kept in insertion order. Once the buffer is full, pushing
/// a new transition evicts the oldest one. Batches are drawn uniformly at
/// random without replacement, so the order of a batch is independent of the
/// insertion order.
pub struct SimpleReplayBuffer {
    capacity: usize,
    observation_dim: usize,
    memory: VecDeque<Entry>,
    rng: StdRng,
}

impl SimpleReplayBuffer {
    fn one_hot(&self, obs: usize) -> Result<Vec<f32>, QrDqnError> {
        if obs >= self.observation_dim {
            return Err(QrDqnError::ObservationOutOfRange {
                obs,
                observation_dim: self.observation_dim,
            });
        }
        let mut v = vec![0f32; self.observation_dim];
        v[obs] = 1.0;
        Ok(v)
    }

    /// Stores a transition, evicting the oldest one if the buffer is full.
    ///
    /// Observations are converted into one-hot vectors here.
    pub fn store(
        &mut self,
        obs: usize,
        act: usize,
        reward: f32,
        next_obs: usize,
        is_done: bool,
    ) -> Result<()> {
        let entry = Entry {
            obs: self.one_hot(obs)?,
            act,
            reward,
            next_obs: self.one_hot(next_obs)?,
            is_done,
        };

        if self.memory.len() == self.capacity {
            self.memory.pop_front();
        }
        self.memory.push_back(entry);

        Ok(())
    }

    /// Draws `size` distinct transitions uniformly at random.
    ///
    /// Fails with [`QrDqnError::InsufficientTransitions`] if `size` exceeds
    /// the number of stored transitions.
    pub fn sample(&mut self, size: usize) -> Result<TransitionBatch> {
        let available = self.memory.len();
        if size > available {
            return Err(QrDqnError::InsufficientTransitions {
                requested: size,
                available,
            }
            .into());
        }
        trace!("Sample {} of {} transitions", size, available);

        let ixs = index::sample(&mut self.rng, available, size);
        let mut batch = TransitionBatch {
            obs: Vec::with_capacity(size * self.observation_dim),
            act: Vec::with_capacity(size),
            reward: Vec::with_capacity(size),
            next_obs: Vec::with_capacity(size * self.observation_dim),
            is_done: Vec::with_capacity(size),
            observation_dim: self.observation_dim,
        };

        for ix in ixs.iter() {
            let e = &self.memory[ix];
            batch.obs.extend_from_slice(&e.obs);
            batch.act.push(e.act);
            batch.reward.push(e.reward);
            batch.next_obs.extend_from_slice(&e.next_obs);
            batch.is_done.push(e.is_done);
        }

        Ok(batch)
    }

    /// Returns the maximum number of transitions held by the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the length of one-hot observation vectors.
    pub fn observation_dim(&self) -> usize {
        self.observation_dim
    }
}

impl ExperienceBufferBase for SimpleReplayBuffer {
    type Item = Transition;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.store(tr.obs, tr.act, tr.reward, tr.next_obs, tr.is_done)
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}

impl ReplayBufferBase for SimpleReplayBuffer {
    type Config = SimpleReplayBufferConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> Result<Self> {
        config.check()?;

        Ok(Self {
            capacity: config.capacity,
            observation_dim: config.observation_dim,
            memory: VecDeque::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.sample(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn buffer(capacity: usize, observation_dim: usize) -> SimpleReplayBuffer {
        let config = SimpleReplayBufferConfig::default()
            .capacity(capacity)
            .observation_dim(observation_dim);
        SimpleReplayBuffer::build(&config).unwrap()
    }

    #[test]
    fn test_store_one_hot() -> Result<()> {
        let mut buf = buffer(4, 3);
        buf.store(2, 1, 0.5, 0, true)?;
        let batch = buf.sample(1)?;
        assert_eq!(batch.obs, vec![0., 0., 1.]);
        assert_eq!(batch.next_obs, vec![1., 0., 0.]);
        assert_eq!(batch.act, vec![1]);
        assert_eq!(batch.reward, vec![0.5]);
        assert_eq!(batch.is_done, vec![true]);
        Ok(())
    }

    #[test]
    fn test_ring_eviction() -> Result<()> {
        let capacity = 5;
        let k = 3;
        let mut buf = buffer(capacity, 2);

        // Rewards mark insertion order
        for i in 0..capacity + k {
            buf.push(Transition::new(0, 0, i as f32, 1, false))?;
            assert!(buf.len() <= capacity);
        }
        assert_eq!(buf.len(), capacity);

        let rewards = buf.memory.iter().map(|e| e.reward).collect::<Vec<_>>();
        let expected = (k..capacity + k).map(|i| i as f32).collect::<Vec<_>>();
        assert_eq!(rewards, expected);
        Ok(())
    }

    #[test]
    fn test_sample_distinct() -> Result<()> {
        let mut buf = buffer(100, 4);
        for i in 0..50 {
            buf.store(i % 4, 0, i as f32, (i + 1) % 4, false)?;
        }

        for n in [0, 1, 10, 50] {
            let batch = buf.sample(n)?;
            assert_eq!(batch.len(), n);
            let rewards = batch
                .reward
                .iter()
                .map(|r| *r as usize)
                .collect::<HashSet<_>>();
            assert_eq!(rewards.len(), n);

            // Pairing of fields is preserved
            for i in 0..n {
                let r = batch.reward[i] as usize;
                assert_eq!(batch.obs_row(i)[r % 4], 1.0);
                assert_eq!(batch.next_obs_row(i)[(r + 1) % 4], 1.0);
            }
        }
        Ok(())
    }

    #[test]
    fn test_sample_too_many() -> Result<()> {
        let mut buf = buffer(10, 2);
        for _ in 0..3 {
            buf.store(0, 1, 0.0, 1, false)?;
        }
        let err = buf.sample(4).unwrap_err();
        assert_eq!(
            err.downcast_ref::<QrDqnError>(),
            Some(&QrDqnError::InsufficientTransitions {
                requested: 4,
                available: 3
            })
        );
        Ok(())
    }

    #[test]
    fn test_invalid_observation() {
        let mut buf = buffer(10, 2);
        assert!(buf.store(2, 0, 0.0, 0, false).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let config = SimpleReplayBufferConfig::default()
            .capacity(0)
            .observation_dim(4);
        assert!(SimpleReplayBuffer::build(&config).is_err());

        let config = SimpleReplayBufferConfig::default().capacity(4);
        assert!(SimpleReplayBuffer::build(&config).is_err());
    }
}
