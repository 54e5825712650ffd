//! Transitions and batches of transitions.

/// A transition `(o_t, a_t, r_t, o_t+1, done)` as produced by the training loop.
///
/// Observations are indices of the discrete observation space. They are
/// converted into one-hot vectors when pushed into the replay buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation `o_t`.
    pub obs: usize,

    /// Action `a_t`.
    pub act: usize,

    /// Reward `r_t`.
    pub reward: f32,

    /// Next observation `o_t+1`.
    pub next_obs: usize,

    /// Terminated or truncated.
    pub is_done: bool,
}

impl Transition {
    /// Constructs a transition.
    pub fn new(obs: usize, act: usize, reward: f32, next_obs: usize, is_done: bool) -> Self {
        Self {
            obs,
            act,
            reward,
            next_obs,
            is_done,
        }
    }
}

/// A batch of transitions sampled from the replay buffer.
///
/// The five fields are parallel: the `i`-th transition consists of row `i` of
/// `obs` and `next_obs` and element `i` of the other vectors. `obs` and
/// `next_obs` are one-hot vectors flattened in row-major order with
/// `observation_dim` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch {
    /// One-hot observations, `[len, observation_dim]`.
    pub obs: Vec<f32>,

    /// Actions.
    pub act: Vec<usize>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// One-hot next observations, `[len, observation_dim]`.
    pub next_obs: Vec<f32>,

    /// Done flags.
    pub is_done: Vec<bool>,

    /// Number of columns of `obs` and `next_obs`.
    pub observation_dim: usize,
}

impl TransitionBatch {
    /// Returns the number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.act.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.act.is_empty()
    }

    /// Returns the one-hot observation of the `i`-th transition.
    pub fn obs_row(&self, i: usize) -> &[f32] {
        &self.obs[i * self.observation_dim..(i + 1) * self.observation_dim]
    }

    /// Returns the one-hot next observation of the `i`-th transition.
    pub fn next_obs_row(&self, i: usize) -> &[f32] {
        &self.next_obs[i * self.observation_dim..(i + 1) * self.observation_dim]
    }
}
