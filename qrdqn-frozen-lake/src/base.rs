//! FrozenLake environment.
use super::{FrozenLakeConfig, Tile};
use anyhow::Result;
use log::trace;
use qrdqn_core::{error::QrDqnError, Env, Info, Step};
use rand::{rngs::StdRng, Rng, SeedableRng};

const LEFT: usize = 0;
const DOWN: usize = 1;
const RIGHT: usize = 2;
const UP: usize = 3;
const N_ACTIONS: usize = 4;

/// Information attached to each step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrozenLakeInfo {
    /// `true` if the agent slipped into a direction other than the chosen one.
    pub slipped: bool,
}

impl Info for FrozenLakeInfo {}

/// FrozenLake grid world.
pub struct FrozenLake {
    tiles: Vec<Tile>,
    nrow: usize,
    ncol: usize,
    start: usize,
    is_slippery: bool,
    max_episode_steps: Option<usize>,
    progress_bonus: f32,
    start_distance: usize,
    state: usize,
    episode_steps: usize,
    rng: StdRng,
}

impl FrozenLake {
    /// Returns the tile index after moving from `state` in direction `act`.
    ///
    /// Moves off the grid leave the agent in place.
    fn moved(&self, state: usize, act: usize) -> usize {
        let (row, col) = (state / self.ncol, state % self.ncol);
        let (row, col) = match act {
            LEFT => (row, col.saturating_sub(1)),
            DOWN => ((row + 1).min(self.nrow - 1), col),
            RIGHT => (row, (col + 1).min(self.ncol - 1)),
            UP => (row.saturating_sub(1), col),
            _ => unreachable!("action {} is checked in step", act),
        };
        row * self.ncol + col
    }

    /// Manhattan distance from `state` to the nearest goal.
    fn distance_to_goal(&self, state: usize) -> usize {
        let (row, col) = (state / self.ncol, state % self.ncol);
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == Tile::Goal)
            .map(|(i, _)| {
                let (r, c) = (i / self.ncol, i % self.ncol);
                row.abs_diff(r) + col.abs_diff(c)
            })
            .min()
            .unwrap_or(0)
    }

    /// Shaping reward for moving from `prev` to `next`.
    ///
    /// Zero when the start tile is already at distance zero from a goal.
    fn progress(&self, prev: usize, next: usize) -> f32 {
        if self.progress_bonus == 0.0 || self.start_distance == 0 {
            return 0.0;
        }
        let d_prev = self.distance_to_goal(prev) as f32;
        let d_next = self.distance_to_goal(next) as f32;
        self.progress_bonus * (d_prev - d_next) / self.start_distance as f32
    }

    /// Returns the current tile index.
    pub fn state(&self) -> usize {
        self.state
    }

    /// Returns the tile at the given index.
    pub fn tile(&self, state: usize) -> Option<Tile> {
        self.tiles.get(state).copied()
    }
}

impl Env for FrozenLake {
    type Config = FrozenLakeConfig;
    type Info = FrozenLakeInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let (tiles, nrow, ncol) = config.map.parse()?;
        let start = tiles
            .iter()
            .position(|t| *t == Tile::Start)
            .ok_or_else(|| QrDqnError::Config("The map has no start tile".into()))?;
        if config.max_episode_steps == Some(0) {
            return Err(QrDqnError::Config("max_episode_steps must be positive".into()).into());
        }

        let mut env = Self {
            tiles,
            nrow,
            ncol,
            start,
            is_slippery: config.is_slippery,
            max_episode_steps: config.max_episode_steps,
            progress_bonus: config.progress_bonus,
            start_distance: 0,
            state: start,
            episode_steps: 0,
            rng: StdRng::seed_from_u64(seed as u64),
        };
        env.start_distance = env.distance_to_goal(start);

        Ok(env)
    }

    fn reset(&mut self) -> Result<(usize, Self::Info)> {
        self.state = self.start;
        self.episode_steps = 0;
        Ok((self.state, FrozenLakeInfo::default()))
    }

    fn step(&mut self, act: usize) -> Result<Step<Self>> {
        if act >= N_ACTIONS {
            return Err(QrDqnError::InvalidAction {
                action: act,
                action_dim: N_ACTIONS,
            }
            .into());
        }

        let direction = match self.is_slippery {
            true => (act + N_ACTIONS - 1 + self.rng.gen_range(0..3)) % N_ACTIONS,
            false => act,
        };
        let prev = self.state;
        self.state = self.moved(prev, direction);
        self.episode_steps += 1;

        let tile = self.tiles[self.state];
        let reward = match tile {
            Tile::Goal => 1.0,
            _ => 0.0,
        } + self.progress(prev, self.state);
        let is_terminated = tile.is_terminal();
        let is_truncated = !is_terminated
            && self
                .max_episode_steps
                .map_or(false, |max| self.episode_steps >= max);
        trace!(
            "state: {} -> {}, act: {}, direction: {}",
            prev,
            self.state,
            act,
            direction
        );

        let info = FrozenLakeInfo {
            slipped: direction != act,
        };
        Ok(Step::new(
            self.state,
            act,
            reward,
            is_terminated,
            is_truncated,
            info,
        ))
    }

    fn observation_dim(&self) -> usize {
        self.nrow * self.ncol
    }

    fn action_dim(&self) -> usize {
        N_ACTIONS
    }
}
