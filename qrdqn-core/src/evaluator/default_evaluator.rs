//! Default implementation of the [`Evaluator`] trait.
//!
//! Runs a fixed number of episodes and reports the average return.
use super::Evaluator;
use crate::{record::Record, Env, Policy};
use anyhow::Result;

/// Runs `n_episodes` episodes and records the mean return as `episode_return`.
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::<FrozenLake>::new(&env_config, 42, 100)?;
/// agent.eval();
/// let record = evaluator.evaluate(&mut agent)?;
/// println!("{}", record.get_scalar("episode_return")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy>(&mut self, policy: &mut P) -> Result<Record> {
        let mut r_total = 0f32;

        for _ in 0..self.n_episodes {
            let (mut prev_obs, _) = self.env.reset()?;

            loop {
                let act = policy.sample(prev_obs)?;
                let step = self.env.step(act)?;
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }
        }

        Ok(Record::from_scalar(
            "episode_return",
            r_total / self.n_episodes as f32,
        ))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration for the environment
    /// * `seed` - Random seed for environment initialization
    /// * `n_episodes` - Number of episodes to run during evaluation, must be positive
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        if n_episodes == 0 {
            return Err(crate::error::QrDqnError::Config(
                "n_episodes of the evaluator must be positive".to_string(),
            )
            .into());
        }
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Step;

    /// Walks right on a line of `len` states; the last state pays 1.
    struct Line {
        len: usize,
        pos: usize,
    }

    impl Env for Line {
        type Config = usize;
        type Info = ();

        fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
            Ok(Self {
                len: *config,
                pos: 0,
            })
        }

        fn reset(&mut self) -> Result<(usize, ())> {
            self.pos = 0;
            Ok((0, ()))
        }

        fn step(&mut self, act: usize) -> Result<Step<Self>> {
            if act == 1 {
                self.pos += 1;
            }
            let done = self.pos + 1 == self.len;
            let reward = if done { 1.0 } else { 0.0 };
            Ok(Step::new(self.pos, act, reward, done, false, ()))
        }

        fn observation_dim(&self) -> usize {
            self.len
        }

        fn action_dim(&self) -> usize {
            2
        }
    }

    struct AlwaysRight;

    impl Policy for AlwaysRight {
        fn sample(&mut self, _obs: usize) -> Result<usize> {
            Ok(1)
        }
    }

    #[test]
    fn test_mean_return() -> Result<()> {
        let mut evaluator = DefaultEvaluator::<Line>::new(&4, 0, 3)?;
        let record = evaluator.evaluate(&mut AlwaysRight)?;
        assert_eq!(record.get_scalar("episode_return")?, 1.0);
        Ok(())
    }

    #[test]
    fn test_zero_episodes() {
        assert!(DefaultEvaluator::<Line>::new(&4, 0, 0).is_err());
    }
}
