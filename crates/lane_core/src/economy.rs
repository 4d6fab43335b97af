//! Player resources and the spawn gate.
//!
//! Resource is a fixed-point amount bounded by `[0, capacity]`. The gate
//! checks a spawn request against cost, population cap and cooldown without
//! touching state; the caller deducts and spawns in the same call so a spawn
//! is never half-applied.

use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeId, ArchetypeSpec};
use crate::bot::BotController;
use crate::components::{PlayerId, Side, Tick};
use crate::error::SpawnRejection;
use crate::math::{fixed_serde, Fixed};

/// A player's resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerEconomy {
    /// Current resource.
    #[serde(with = "fixed_serde")]
    pub resource: Fixed,
    /// Resource ceiling.
    #[serde(with = "fixed_serde")]
    pub capacity: Fixed,
    /// Income added every tick.
    #[serde(with = "fixed_serde")]
    pub income_per_tick: Fixed,
}

impl PlayerEconomy {
    /// Create an economy, clamping the starting amount into range.
    #[must_use]
    pub fn new(resource: Fixed, capacity: Fixed, income_per_tick: Fixed) -> Self {
        Self {
            resource: resource.clamp(Fixed::ZERO, capacity),
            capacity,
            income_per_tick,
        }
    }

    /// Room left below the capacity.
    #[must_use]
    pub fn available_storage(&self) -> Fixed {
        self.capacity - self.resource
    }

    /// Add resource up to capacity. Returns the amount actually added.
    pub fn deposit(&mut self, amount: Fixed) -> Fixed {
        let deposited = amount.max(Fixed::ZERO).min(self.available_storage());
        self.resource += deposited;
        deposited
    }

    /// Apply one tick of income.
    pub fn regenerate(&mut self) -> Fixed {
        self.deposit(self.income_per_tick)
    }

    /// Spend if affordable. Returns true when the transaction succeeded.
    pub fn spend(&mut self, cost: Fixed) -> bool {
        if self.can_afford(cost) {
            self.resource -= cost;
            true
        } else {
            false
        }
    }

    /// Whether the pool covers `cost`.
    #[must_use]
    pub fn can_afford(&self, cost: Fixed) -> bool {
        self.resource >= cost
    }
}

/// Who drives a player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    /// A connected client.
    Human,
    /// The built-in bot.
    Bot(BotController),
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Lobby id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Lane side.
    pub side: Side,
    /// Lobby-assigned color, opaque to the simulation.
    pub color: String,
    /// Human or bot.
    pub controller: Controller,
    /// Resource pool.
    pub economy: PlayerEconomy,
    spawn_ready_at: Vec<Tick>,
}

impl Player {
    /// Create a player with no spawn cooldowns running.
    #[must_use]
    pub fn new(
        id: PlayerId,
        name: String,
        side: Side,
        color: String,
        controller: Controller,
        economy: PlayerEconomy,
    ) -> Self {
        Self {
            id,
            name,
            side,
            color,
            controller,
            economy,
            spawn_ready_at: vec![0; ArchetypeId::COUNT],
        }
    }

    /// Whether the bot controller drives this player.
    #[must_use]
    pub const fn is_bot(&self) -> bool {
        matches!(self.controller, Controller::Bot(_))
    }

    /// First tick the player may spawn `archetype` again.
    #[must_use]
    pub fn spawn_ready_at(&self, archetype: ArchetypeId) -> Tick {
        self.spawn_ready_at
            .get(archetype.index())
            .copied()
            .unwrap_or(0)
    }

    fn start_cooldown(&mut self, archetype: ArchetypeId, until: Tick) {
        if let Some(slot) = self.spawn_ready_at.get_mut(archetype.index()) {
            *slot = until;
        }
    }
}

/// Check a spawn against the gate. On success returns the batch size to
/// create, already trimmed to the remaining population room.
///
/// Checks run in a fixed order: cost, population cap, cooldown.
pub fn check_spawn(
    player: &Player,
    spec: &ArchetypeSpec,
    live_population: u32,
    now: Tick,
) -> Result<u32, SpawnRejection> {
    if !player.economy.can_afford(Fixed::from_num(spec.cost)) {
        return Err(SpawnRejection::InsufficientResource(spec.id));
    }
    if live_population >= spec.population_cap {
        return Err(SpawnRejection::PopulationCapReached(spec.id));
    }
    if now < player.spawn_ready_at(spec.id) {
        return Err(SpawnRejection::CoolingDown(spec.id));
    }
    Ok(spec.batch_size.min(spec.population_cap - live_population))
}

/// Deduct the cost and start the cooldown of an accepted spawn.
pub(crate) fn commit_spawn(player: &mut Player, spec: &ArchetypeSpec, now: Tick) -> bool {
    if !player.economy.spend(Fixed::from_num(spec.cost)) {
        return false;
    }
    player.start_cooldown(spec.id, now.saturating_add(spec.spawn_cooldown));
    true
}
