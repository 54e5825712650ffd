//! Maps of the lake.
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF",
    "FFFHFFFG",
];

/// A tile of the lake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    /// Start, frozen.
    Start,
    /// Frozen.
    Frozen,
    /// Hole, terminates the episode.
    Hole,
    /// Goal, terminates the episode with reward 1.
    Goal,
}

impl Tile {
    fn from_char(c: char) -> Result<Self> {
        Ok(match c {
            'S' => Tile::Start,
            'F' => Tile::Frozen,
            'H' => Tile::Hole,
            'G' => Tile::Goal,
            _ => bail!("Unknown tile {:?}, expected one of S, F, H, G", c),
        })
    }

    /// Returns `true` if the episode ends on this tile.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Tile::Hole | Tile::Goal)
    }
}

/// Layout of the lake.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum FrozenLakeMap {
    /// The standard 4x4 map.
    Map4x4,

    /// The standard 8x8 map.
    Map8x8,

    /// Rows of `S`, `F`, `H` and `G`.
    Custom(Vec<String>),
}

impl FrozenLakeMap {
    fn rows(&self) -> Vec<String> {
        match self {
            Self::Map4x4 => MAP_4X4.iter().map(|s| s.to_string()).collect(),
            Self::Map8x8 => MAP_8X8.iter().map(|s| s.to_string()).collect(),
            Self::Custom(rows) => rows.clone(),
        }
    }

    /// Parses the map into `(tiles, nrow, ncol)` with tiles in row-major order.
    ///
    /// The map must be a non-empty rectangle with exactly one start tile and
    /// at least one goal tile.
    pub fn parse(&self) -> Result<(Vec<Tile>, usize, usize)> {
        let rows = self.rows();
        let nrow = rows.len();
        let ncol = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if nrow == 0 || ncol == 0 {
            bail!("The map is empty");
        }

        let mut tiles = Vec::with_capacity(nrow * ncol);
        for row in rows.iter() {
            if row.chars().count() != ncol {
                bail!("Rows of the map have different lengths");
            }
            for c in row.chars() {
                tiles.push(Tile::from_char(c)?);
            }
        }

        let n_start = tiles.iter().filter(|t| **t == Tile::Start).count();
        if n_start != 1 {
            bail!("The map must have exactly one start tile, found {}", n_start);
        }
        if !tiles.contains(&Tile::Goal) {
            bail!("The map has no goal tile");
        }

        Ok((tiles, nrow, ncol))
    }
}
