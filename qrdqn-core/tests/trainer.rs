use anyhow::Result;
use qrdqn_core::{
    error::QrDqnError,
    record::{BufferedRecorder, NullRecorder, Record},
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig, TransitionBatch},
    Agent, Env, Policy, ReplayBufferBase, Step, Trainer, TrainerConfig,
};
use std::path::Path;

/// Pays `reward` at the end of an episode of `len` steps.
struct Fixed {
    len: usize,
    reward: f32,
    t: usize,
}

impl Env for Fixed {
    type Config = (usize, f32);
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            len: config.0,
            reward: config.1,
            t: 0,
        })
    }

    fn reset(&mut self) -> Result<(usize, ())> {
        self.t = 0;
        Ok((0, ()))
    }

    fn step(&mut self, act: usize) -> Result<Step<Self>> {
        self.t += 1;
        let done = self.t == self.len;
        let reward = if done { self.reward } else { 0.0 };
        Ok(Step::new(self.t % 2, act, reward, done, false, ()))
    }

    fn observation_dim(&self) -> usize {
        2
    }

    fn action_dim(&self) -> usize {
        2
    }
}

/// Counts calls and checks batches.
#[derive(Default)]
struct Counting {
    n_opts: usize,
    n_episodes: usize,
    train: bool,
}

impl Policy for Counting {
    fn sample(&mut self, _obs: usize) -> Result<usize> {
        Ok(1)
    }
}

impl Agent<SimpleReplayBuffer> for Counting {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut SimpleReplayBuffer) -> Result<Record> {
        let batch: TransitionBatch = buffer.batch(4)?;
        assert_eq!(batch.len(), 4);
        self.n_opts += 1;
        Ok(Record::from_scalar("loss", self.n_opts as f32))
    }

    fn on_episode_end(&mut self) -> Record {
        self.n_episodes += 1;
        Record::from_scalar("epsilon", 1.0 / self.n_episodes as f32)
    }

    fn save_params(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

fn buffer() -> Result<SimpleReplayBuffer> {
    SimpleReplayBuffer::build(
        &SimpleReplayBufferConfig::default()
            .capacity(100)
            .observation_dim(2),
    )
}

#[test]
fn test_warmup_and_counters() -> Result<()> {
    let mut env = Fixed::build(&(5, 1.0), 0)?;
    let mut agent = Counting::default();
    let mut buffer = buffer()?;
    let mut trainer = Trainer::build(TrainerConfig::default().episodes(4).exploration(7))?;

    trainer.train(&mut env, &mut agent, &mut buffer, &mut NullRecorder::new())?;

    assert!(agent.is_train());
    assert_eq!(trainer.env_steps(), 20);
    // Training starts once the buffer holds more than 7 transitions
    assert_eq!(trainer.opt_steps(), 20 - 7);
    assert_eq!(agent.n_opts, 13);
    assert_eq!(agent.n_episodes, 4);
    Ok(())
}

#[test]
fn test_weight_reward() -> Result<()> {
    let mut env = Fixed::build(&(3, 2.0), 0)?;
    let mut agent = Counting::default();
    let mut buffer = buffer()?;
    let mut recorder = BufferedRecorder::new();
    let mut trainer = Trainer::build(TrainerConfig::default().episodes(3).exploration(100))?;

    assert_eq!(trainer.weight_reward(), None);
    trainer.train(&mut env, &mut agent, &mut buffer, &mut recorder)?;

    // Seeded with the first return, then 0.99 * w + 0.01 * r
    let records = recorder.iter().collect::<Vec<_>>();
    assert_eq!(records.len(), 3);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.get_scalar("episode")?, (i + 1) as f32);
        assert_eq!(record.get_scalar("reward")?, 2.0);
        assert!((record.get_scalar("weight_reward")? - 2.0).abs() < 1e-6);
        assert_eq!(record.get_scalar("episode_steps")?, 3.0);
        assert!(record.get_scalar("loss").is_err());
        assert!(record.get_datetime("datetime").is_ok());
    }
    assert!(records[0].get_datetime("datetime")? <= records[2].get_datetime("datetime")?);
    assert_eq!(records[2].get_scalar("epsilon")?, 1.0 / 3.0);
    Ok(())
}

#[test]
fn test_weight_reward_smoothing() -> Result<()> {
    let mut agent = Counting::default();
    let mut buffer = buffer()?;
    let mut trainer = Trainer::build(TrainerConfig::default().exploration(100))?;

    let mut env = Fixed::build(&(2, 1.0), 0)?;
    trainer.train_episode(&mut env, &mut agent, &mut buffer)?;
    assert_eq!(trainer.weight_reward(), Some(1.0));

    let mut env = Fixed::build(&(2, 0.0), 0)?;
    let record = trainer.train_episode(&mut env, &mut agent, &mut buffer)?;
    assert!((record.get_scalar("weight_reward")? - 0.99).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_zero_flush_interval_rejected() {
    let err = match Trainer::build(TrainerConfig::default().flush_record_interval(0)) {
        Ok(_) => panic!("a zero flush interval must be rejected"),
        Err(err) => err,
    };
    assert!(matches!(
        err.downcast_ref::<QrDqnError>(),
        Some(QrDqnError::Config(_))
    ));
}
