use anyhow::Result;
use clap::Parser;
use qrdqn_candle_agent::{
    opt::OptimizerConfig,
    qrdqn::{EpsilonGreedy, QrDqn, QrDqnConfig},
    Device,
};
use qrdqn_core::{
    record::BufferedRecorder,
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig},
    Agent, Configurable, DefaultEvaluator, Env as _, Evaluator as _, ReplayBufferBase, Trainer,
    TrainerConfig,
};
use qrdqn_frozen_lake::{FrozenLake, FrozenLakeConfig, FrozenLakeMap};
use std::path::Path;

const EPSILON_INIT: f64 = 0.95;
const EPSILON_DECAY: f64 = 0.995;
const EPSILON_MIN: f64 = 0.01;
const GAMMA: f64 = 0.99;
const LEARNING_RATE: f64 = 1e-3;
const CAPACITY: usize = 100_000;
const EXPLORATION: usize = 200;
const EPISODES: usize = 500;
const QUANT_NUM: usize = 10;
const UPDATE_FREQ: usize = 200;
const BATCH_SIZE: usize = 64;
const K: f64 = 1.0;
const N_EPISODES_PER_EVAL: usize = 100;
const MODEL_DIR: &str = "./qrdqn-candle-agent/examples/model/qrdqn_frozen_lake";

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train QR-DQN agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate QR-DQN agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// Use the 8x8 map
    #[arg(long, default_value_t = false)]
    map8x8: bool,

    /// Slippery ice
    #[arg(short, long, default_value_t = false)]
    slippery: bool,

    /// Number of training episodes
    #[arg(long, default_value_t = EPISODES)]
    episodes: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn env_config(args: &Args) -> FrozenLakeConfig {
    let map = match args.map8x8 {
        true => FrozenLakeMap::Map8x8,
        false => FrozenLakeMap::Map4x4,
    };
    FrozenLakeConfig::default()
        .map(map)
        .is_slippery(args.slippery)
}

fn agent_config(observation_dim: usize, action_dim: usize, seed: u64) -> QrDqnConfig {
    QrDqnConfig::default()
        .observation_dim(observation_dim)
        .action_dim(action_dim)
        .quant_num(QUANT_NUM)
        .opt_config(OptimizerConfig::Adam { lr: LEARNING_RATE })
        .gamma(GAMMA)
        .batch_size(BATCH_SIZE)
        .update_freq(UPDATE_FREQ)
        .k(K)
        .explorer(
            EpsilonGreedy::new()
                .eps(EPSILON_INIT)
                .eps_decay(EPSILON_DECAY)
                .eps_min(EPSILON_MIN),
        )
        .seed(seed)
        .device(Device::Cpu)
}

fn train(args: &Args, model_dir: &str) -> Result<()> {
    let env_config = env_config(args);
    let mut env = FrozenLake::build(&env_config, args.seed as i64)?;
    let agent_config = agent_config(env.observation_dim(), env.action_dim(), args.seed);
    let buffer_config = SimpleReplayBufferConfig::default()
        .capacity(CAPACITY)
        .observation_dim(env.observation_dim())
        .seed(args.seed);
    let trainer_config = TrainerConfig::default()
        .episodes(args.episodes)
        .exploration(EXPLORATION)
        .model_dir(model_dir);

    std::fs::create_dir_all(model_dir)?;
    agent_config.save(Path::new(model_dir).join("agent.yaml"))?;
    env_config.save(Path::new(model_dir).join("env.yaml"))?;

    let mut agent = QrDqn::build(agent_config)?;
    let mut buffer = SimpleReplayBuffer::build(&buffer_config)?;
    let mut recorder = BufferedRecorder::new();
    let mut trainer = Trainer::build(trainer_config)?;

    trainer.train(&mut env, &mut agent, &mut buffer, &mut recorder)?;

    Ok(())
}

fn eval(args: &Args, model_dir: &str) -> Result<()> {
    let env_config = FrozenLakeConfig::load(Path::new(model_dir).join("env.yaml"))?;
    let mut agent = QrDqn::build_from_path(Path::new(model_dir).join("agent.yaml"))?;
    <QrDqn as Agent<SimpleReplayBuffer>>::load_params(&mut agent, Path::new(model_dir))?;
    <QrDqn as Agent<SimpleReplayBuffer>>::eval(&mut agent);

    let mut evaluator =
        DefaultEvaluator::<FrozenLake>::new(&env_config, args.seed as i64, N_EPISODES_PER_EVAL)?;
    let record = evaluator.evaluate(&mut agent)?;
    println!(
        "Mean return over {} episodes: {}",
        N_EPISODES_PER_EVAL,
        record.get_scalar("episode_return")?
    );

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.train {
        train(&args, MODEL_DIR)?;
    } else if args.eval {
        eval(&args, MODEL_DIR)?;
    } else {
        train(&args, MODEL_DIR)?;
        eval(&args, MODEL_DIR)?;
    }

    Ok(())
}
