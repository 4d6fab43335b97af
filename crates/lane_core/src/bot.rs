//! Scripted opponent.
//!
//! Bots are memoryless: every tick they bank a difficulty-tuned income and
//! with a difficulty-tuned probability try to spawn one random archetype
//! they can afford. The attempt goes through the regular spawn gate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeId, ArchetypeTable};
use crate::economy::PlayerEconomy;
use crate::error::GameError;
use crate::math::Fixed;
use crate::rng::SimRng;

/// Bot difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Slow income, rare spawns.
    Easy,
    /// Human-equivalent income.
    #[default]
    Normal,
    /// Fast income, frequent spawns.
    Hard,
}

impl Difficulty {
    /// Resource earned per tick.
    #[must_use]
    pub fn income_per_tick(self) -> Fixed {
        match self {
            Self::Easy => Fixed::from_num(0.15),
            Self::Normal => Fixed::from_num(0.25),
            Self::Hard => Fixed::from_num(0.35),
        }
    }

    /// Chance per tick of attempting a spawn.
    #[must_use]
    pub fn spawn_chance(self) -> Fixed {
        match self {
            Self::Easy => Fixed::from_num(0.01),
            Self::Normal => Fixed::from_num(0.02),
            Self::Hard => Fixed::from_num(0.04),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        })
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            other => Err(GameError::InvalidState(format!("unknown difficulty '{other}'"))),
        }
    }
}

/// Bot brain for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BotController {
    /// Difficulty.
    pub difficulty: Difficulty,
}

impl BotController {
    /// Create a controller.
    #[must_use]
    pub const fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    /// Roll this tick's decision. Always consumes one RNG draw for the
    /// aggression roll, plus one for the pick when it fires.
    pub fn decide(
        &self,
        economy: &PlayerEconomy,
        table: &ArchetypeTable,
        rng: &mut SimRng,
    ) -> Option<ArchetypeId> {
        if !rng.chance(self.difficulty.spawn_chance()) {
            return None;
        }
        let affordable: Vec<ArchetypeId> = table
            .iter()
            .filter(|spec| economy.can_afford(Fixed::from_num(spec.cost)))
            .map(|spec| spec.id)
            .collect();
        if affordable.is_empty() {
            return None;
        }
        Some(affordable[rng.next_index(affordable.len())])
    }
}
