//! Out-of-battle progression
//!
//! Currency earned from battles and permanent stat upgrades bought with it.
//! Persistence goes through the [`KeyValueStore`] seam so the simulation
//! never touches platform storage directly; tests and the headless runner
//! use the in-memory store.

use bevy::prelude::*;
use std::collections::HashMap;

use super::data::PassiveStat;

/// Gold keys in the store
const GOLD_KEY: &str = "gold";

/// Maximum level of each permanent upgrade
pub const UPGRADE_MAX_LEVEL: u32 = 10;
/// Bonus per upgrade level (5%)
pub const UPGRADE_STEP: f32 = 0.05;

/// Minimal persistence seam for progression data
pub trait KeyValueStore: Send + Sync {
    fn get_i64(&self, key: &str) -> Option<i64>;
    fn set_i64(&mut self, key: &str, value: i64);
}

/// In-memory store used by tests and headless runs
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, i64>,
}

impl KeyValueStore for MemoryStore {
    fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_i64(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }
}

/// Currency and permanent upgrades, backed by a [`KeyValueStore`]
#[derive(Resource)]
pub struct PlayerBank {
    store: Box<dyn KeyValueStore>,
}

impl Default for PlayerBank {
    fn default() -> Self {
        Self::new(Box::new(MemoryStore::default()))
    }
}

impl PlayerBank {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn gold(&self) -> i64 {
        self.store.get_i64(GOLD_KEY).unwrap_or(0)
    }

    pub fn add_gold(&mut self, amount: i64) {
        if amount <= 0 {
            return;
        }
        let total = self.gold().saturating_add(amount);
        self.store.set_i64(GOLD_KEY, total);
    }

    /// Spend gold if the balance covers it. The balance never goes negative.
    pub fn try_spend(&mut self, amount: i64) -> bool {
        if amount < 0 {
            return false;
        }
        let balance = self.gold();
        if balance < amount {
            return false;
        }
        self.store.set_i64(GOLD_KEY, balance - amount);
        true
    }

    fn upgrade_key(stat: PassiveStat) -> String {
        format!("upgrade_{:?}", stat).to_lowercase()
    }

    fn character_key(name: &str) -> String {
        format!("unlocked_{}", name.to_lowercase().replace(' ', "_"))
    }

    /// Free characters count as unlocked without a record
    pub fn is_character_unlocked(&self, name: &str, unlock_cost: i64) -> bool {
        unlock_cost <= 0 || self.store.get_i64(&Self::character_key(name)).unwrap_or(0) != 0
    }

    /// Buy a character unlock if affordable and not already owned
    pub fn try_unlock_character(&mut self, name: &str, unlock_cost: i64) -> bool {
        if self.is_character_unlocked(name, unlock_cost) {
            return false;
        }
        if !self.try_spend(unlock_cost) {
            return false;
        }
        self.store.set_i64(&Self::character_key(name), 1);
        true
    }

    pub fn upgrade_level(&self, stat: PassiveStat) -> u32 {
        self.store
            .get_i64(&Self::upgrade_key(stat))
            .unwrap_or(0)
            .clamp(0, UPGRADE_MAX_LEVEL as i64) as u32
    }

    /// Bonus granted by an upgrade track, e.g. 0.15 at level 3
    pub fn upgrade_bonus(&self, stat: PassiveStat) -> f32 {
        self.upgrade_level(stat) as f32 * UPGRADE_STEP
    }

    /// Gold cost of the next level of an upgrade, or None at the cap
    pub fn upgrade_cost(&self, stat: PassiveStat) -> Option<i64> {
        let level = self.upgrade_level(stat);
        if level >= UPGRADE_MAX_LEVEL {
            None
        } else {
            Some(100 * (level as i64 + 1))
        }
    }

    /// Buy the next level of an upgrade if affordable and below the cap
    pub fn try_buy_upgrade(&mut self, stat: PassiveStat) -> bool {
        let Some(cost) = self.upgrade_cost(stat) else {
            return false;
        };
        if !self.try_spend(cost) {
            return false;
        }
        let level = self.upgrade_level(stat) + 1;
        self.store.set_i64(&Self::upgrade_key(stat), level as i64);
        true
    }
}

/// Gold earned for a battle: one per full second survived
pub fn battle_reward(survival_secs: f32) -> i64 {
    survival_secs.max(0.0).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_guards_against_overdraft() {
        let mut bank = PlayerBank::default();
        bank.add_gold(50);
        assert!(!bank.try_spend(60));
        assert_eq!(bank.gold(), 50);
        assert!(bank.try_spend(50));
        assert_eq!(bank.gold(), 0);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut bank = PlayerBank::default();
        bank.add_gold(-10);
        assert_eq!(bank.gold(), 0);
        assert!(!bank.try_spend(-5));
    }

    #[test]
    fn upgrades_cost_and_cap() {
        let mut bank = PlayerBank::default();
        bank.add_gold(100_000);

        assert_eq!(bank.upgrade_cost(PassiveStat::Damage), Some(100));
        assert!(bank.try_buy_upgrade(PassiveStat::Damage));
        assert_eq!(bank.upgrade_level(PassiveStat::Damage), 1);
        assert_eq!(bank.upgrade_cost(PassiveStat::Damage), Some(200));
        assert!((bank.upgrade_bonus(PassiveStat::Damage) - UPGRADE_STEP).abs() < 1e-6);

        for _ in 0..UPGRADE_MAX_LEVEL {
            bank.try_buy_upgrade(PassiveStat::Damage);
        }
        assert_eq!(bank.upgrade_level(PassiveStat::Damage), UPGRADE_MAX_LEVEL);
        assert!(!bank.try_buy_upgrade(PassiveStat::Damage));
        assert_eq!(bank.upgrade_cost(PassiveStat::Damage), None);
    }

    #[test]
    fn broke_player_cannot_upgrade() {
        let mut bank = PlayerBank::default();
        assert!(!bank.try_buy_upgrade(PassiveStat::Cooldown));
        assert_eq!(bank.upgrade_level(PassiveStat::Cooldown), 0);
    }

    #[test]
    fn character_unlocks_are_bought_once() {
        let mut bank = PlayerBank::default();
        assert!(bank.is_character_unlocked("Knight", 0));

        assert!(!bank.is_character_unlocked("Pyromancer", 500));
        assert!(!bank.try_unlock_character("Pyromancer", 500));

        bank.add_gold(500);
        assert!(bank.try_unlock_character("Pyromancer", 500));
        assert!(bank.is_character_unlocked("Pyromancer", 500));
        assert_eq!(bank.gold(), 0);

        // Already owned, nothing spent
        bank.add_gold(500);
        assert!(!bank.try_unlock_character("Pyromancer", 500));
        assert_eq!(bank.gold(), 500);
    }

    #[test]
    fn reward_is_floor_of_survival_seconds() {
        assert_eq!(battle_reward(0.0), 0);
        assert_eq!(battle_reward(59.9), 59);
        assert_eq!(battle_reward(300.0), 300);
        assert_eq!(battle_reward(-5.0), 0);
    }
}
