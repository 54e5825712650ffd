use anyhow::Result;
use qrdqn_candle_agent::qrdqn::{QrDqn, QrDqnConfig};
use qrdqn_core::{
    record::BufferedRecorder,
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig},
    Agent, Configurable, DefaultEvaluator, Env, Evaluator, ExperienceBufferBase,
    ReplayBufferBase, Trainer, TrainerConfig,
};
use qrdqn_frozen_lake::{FrozenLake, FrozenLakeConfig};
use tempdir::TempDir;

const EPISODES: usize = 30;
const EXPLORATION: usize = 64;
const BATCH_SIZE: usize = 32;

#[test]
fn test_qrdqn_frozen_lake() -> Result<()> {
    let tmp_dir = TempDir::new("qrdqn_frozen_lake")?;
    let model_dir = match tmp_dir.as_ref().to_str() {
        Some(s) => s,
        None => panic!("Failed to get string of temporary directory"),
    };

    let env_config = FrozenLakeConfig::default().max_episode_steps(Some(20));
    let mut env = FrozenLake::build(&env_config, 0)?;
    let agent_config = QrDqnConfig::default()
        .observation_dim(env.observation_dim())
        .action_dim(env.action_dim())
        .quant_num(8)
        .batch_size(BATCH_SIZE)
        .update_freq(10);
    let mut agent = QrDqn::build(agent_config.clone())?;
    let mut buffer = SimpleReplayBuffer::build(
        &SimpleReplayBufferConfig::default()
            .capacity(1000)
            .observation_dim(env.observation_dim()),
    )?;
    let mut recorder = BufferedRecorder::new();
    let mut trainer = Trainer::build(
        TrainerConfig::default()
            .episodes(EPISODES)
            .exploration(EXPLORATION)
            .model_dir(model_dir),
    )?;

    let eps0 = agent.epsilon();
    trainer.train(&mut env, &mut agent, &mut buffer, &mut recorder)?;

    // One record per episode
    assert_eq!(recorder.len(), EPISODES);
    assert!(trainer.env_steps() >= EPISODES);
    assert_eq!(buffer.len(), trainer.env_steps().min(1000));

    // Optimization runs once per step after the buffer exceeds the warmup size
    assert_eq!(
        trainer.opt_steps(),
        trainer.env_steps().saturating_sub(EXPLORATION)
    );
    assert_eq!(agent.n_opts(), trainer.opt_steps());

    // Epsilon decays once per episode
    let expected_eps = (eps0 * 0.995f64.powi(EPISODES as i32)).max(0.01);
    assert!((agent.epsilon() - expected_eps).abs() < 1e-9);

    for record in recorder.iter() {
        let reward = record.get_scalar("reward")?;
        assert!(reward == 0.0 || reward == 1.0);
        assert!(record.get_scalar("weight_reward")?.is_finite());
        if let Ok(loss) = record.get_scalar("loss") {
            assert!(loss.is_finite() && loss >= 0.0);
        }
    }
    let weight_reward = trainer.weight_reward().unwrap();
    assert!((0.0..=1.0).contains(&weight_reward));

    // The trained model is saved and can be evaluated greedily
    let mut agent_ = QrDqn::build(agent_config)?;
    <QrDqn as Agent<SimpleReplayBuffer>>::load_params(&mut agent_, tmp_dir.path())?;
    <QrDqn as Agent<SimpleReplayBuffer>>::eval(&mut agent_);
    for obs in 0..env.observation_dim() {
        assert_eq!(agent_.q_values(obs)?, agent.q_values(obs)?);
    }

    let mut evaluator = DefaultEvaluator::<FrozenLake>::new(&env_config, 0, 3)?;
    let record = evaluator.evaluate(&mut agent_)?;
    let ret = record.get_scalar("episode_return")?;
    assert!((0.0..=1.0).contains(&ret));

    Ok(())
}
