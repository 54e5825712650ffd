//! Train [`Agent`].
mod config;
use crate::{
    record::{
        AggregateRecorder, Record,
        RecordValue::{DateTime, Scalar},
    },
    replay_buffer::Transition,
    Agent, Env, ExperienceBufferBase, ReplayBufferBase,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
use log::{debug, info};
use std::path::Path;

/// Smoothing factor of the running episode return.
const WEIGHT_REWARD_DECAY: f32 = 0.99;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episode-based training loop.
///
/// # Training loop
///
/// 1. Reset a global counter of environment steps `env_steps = 0`.
/// 2. For each episode, reset [`Env`] and repeat until the episode ends:
///     1. The agent samples an action for the current observation.
///     2. The environment performs the action.
///     3. The transition `(o_t, a_t, r_t, o_t+1, done)` is pushed into the
///        replay buffer and `env_steps += 1`.
///     4. If the buffer holds more than `exploration` transitions, the agent
///        performs an optimization step.
/// 3. When the episode ends, [`Agent::on_episode_end`] is called (the agent
///    decays its exploration rate there) and the running return
///    `weight_reward = 0.99 * weight_reward + 0.01 * episode_return` is
///    updated. It is seeded with the return of the first episode and is only
///    used for monitoring.
/// 4. Each episode is stored in the recorder with its index and a timestamp
///    and the recorder is flushed every `flush_record_interval` episodes.
/// 5. After the last episode, the agent is saved in `model_dir` if given.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|action|B[Env]
///     B -->|observation, reward|A
///     B -->|Transition|D[ReplayBuffer]
///     D -->|TransitionBatch|A
/// ```
pub struct Trainer {
    /// The number of episodes to run.
    episodes: usize,

    /// Warmup period, for filling replay buffer, in transitions.
    exploration: usize,

    /// Interval of flushing records in episodes.
    flush_record_interval: usize,

    /// Where to save the trained model.
    model_dir: Option<String>,

    /// Environment steps over all episodes.
    env_steps: usize,

    /// Optimization steps over all episodes.
    opt_steps: usize,

    /// Exponentially weighted episode return.
    weight_reward: Option<f32>,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Result<Self> {
        config.check()?;
        Ok(Self {
            episodes: config.episodes,
            exploration: config.exploration,
            flush_record_interval: config.flush_record_interval,
            model_dir: config.model_dir,
            env_steps: 0,
            opt_steps: 0,
            weight_reward: None,
        })
    }

    /// Returns the number of environment steps done so far.
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    /// Returns the number of optimization steps done so far.
    pub fn opt_steps(&self) -> usize {
        self.opt_steps
    }

    /// Returns the exponentially weighted episode return, `None` before the
    /// first episode ends.
    pub fn weight_reward(&self) -> Option<f32> {
        self.weight_reward
    }

    fn update_weight_reward(&mut self, episode_return: f32) -> f32 {
        let w = match self.weight_reward {
            None => episode_return,
            Some(w) => WEIGHT_REWARD_DECAY * w + (1.0 - WEIGHT_REWARD_DECAY) * episode_return,
        };
        self.weight_reward = Some(w);
        w
    }

    /// Runs a single episode.
    ///
    /// The returned record contains `reward` (the return of the episode),
    /// `weight_reward`, `episode_steps`, the information returned by
    /// [`Agent::on_episode_end`] and that of the last optimization step,
    /// if any.
    pub fn train_episode<E, A, R>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        buffer: &mut R,
    ) -> Result<Record>
    where
        E: Env,
        A: Agent<R>,
        R: ExperienceBufferBase<Item = Transition> + ReplayBufferBase,
    {
        let (mut obs, _) = env.reset()?;
        let mut reward_total = 0f32;
        let mut episode_steps = 0usize;
        let mut record = Record::empty();

        loop {
            let act = agent.sample(obs)?;
            let step = env.step(act)?;
            let is_done = step.is_done();
            buffer.push(Transition::new(obs, act, step.reward, step.obs, is_done))?;
            reward_total += step.reward;
            self.env_steps += 1;
            episode_steps += 1;
            obs = step.obs;

            if buffer.len() > self.exploration {
                let record_opt = agent.opt(buffer)?;
                self.opt_steps += 1;
                record.merge_inplace(record_opt);
            }

            if is_done {
                break;
            }
        }

        let weight_reward = self.update_weight_reward(reward_total);
        record.merge_inplace(agent.on_episode_end());
        record.insert("reward", Scalar(reward_total));
        record.insert("weight_reward", Scalar(weight_reward));
        record.insert("episode_steps", Scalar(episode_steps as f32));

        Ok(record)
    }

    /// Train the agent.
    pub fn train<E, A, R>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        buffer: &mut R,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<()>
    where
        E: Env,
        A: Agent<R>,
        R: ExperienceBufferBase<Item = Transition> + ReplayBufferBase,
    {
        agent.train();

        for episode in 0..self.episodes {
            let mut record = self.train_episode(env, agent, buffer)?;
            let reward = record.get_scalar("reward")?;
            let weight_reward = record.get_scalar("weight_reward")?;
            match record.get_scalar("epsilon") {
                Ok(eps) => info!(
                    "episode: {}  reward: {}  weight_reward: {:.3}  epsilon: {:.2}",
                    episode + 1,
                    reward,
                    weight_reward,
                    eps
                ),
                Err(_) => info!(
                    "episode: {}  reward: {}  weight_reward: {:.3}",
                    episode + 1,
                    reward,
                    weight_reward
                ),
            }
            debug!(
                "env_steps: {}  opt_steps: {}",
                self.env_steps, self.opt_steps
            );

            record.insert("episode", Scalar((episode + 1) as f32));
            record.insert("datetime", DateTime(Local::now()));
            recorder.store(record);

            if (episode + 1) % self.flush_record_interval == 0 {
                recorder.flush((episode + 1) as _);
            }
        }

        if let Some(model_dir) = &self.model_dir {
            agent.save_params(Path::new(model_dir))?;
            info!("Saved the model in {:?}.", model_dir);
        }

        Ok(())
    }
}
