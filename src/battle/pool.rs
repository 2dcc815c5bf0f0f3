//! Entity pooling
//!
//! Enemies, projectiles, pickups, and hit effects churn constantly, so they
//! are recycled through string-keyed pools instead of being despawned. A
//! pooled entity keeps its components between uses; whoever checks it out is
//! responsible for resetting state before activating it.

use bevy::prelude::*;
use std::collections::HashMap;

/// Marker for entities managed by [`EntityPools`].
///
/// Systems must skip entities whose `active` flag is false; an idle pooled
/// entity still exists in the world with stale components.
#[derive(Component, Debug, Clone)]
pub struct Pooled {
    /// Key of the pool this entity returns to
    pub key: String,
    /// Whether the entity is currently checked out and simulating
    pub active: bool,
}

impl Pooled {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            active: true,
        }
    }

    /// An inactive marker for pre-warmed entities sitting in their pool
    pub fn idle(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            active: false,
        }
    }
}

/// What the caller should do with an entity after a release attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Entity was returned to its pool and deactivated
    Returned,
    /// The pool no longer exists; the caller must despawn the entity
    Despawn,
    /// Entity was already idle; nothing to do
    AlreadyIdle,
}

/// String-keyed LIFO pools of idle entities.
///
/// LIFO order keeps recently-used entities hot: the entity checked in last
/// is handed out first.
#[derive(Resource, Default)]
pub struct EntityPools {
    pools: HashMap<String, Vec<Entity>>,
}

impl EntityPools {
    /// Register an empty pool. Returns false if the key already exists.
    pub fn create_pool(&mut self, key: &str) -> bool {
        if self.pools.contains_key(key) {
            return false;
        }
        self.pools.insert(key.to_string(), Vec::new());
        true
    }

    pub fn has_pool(&self, key: &str) -> bool {
        self.pools.contains_key(key)
    }

    /// Number of idle entities in a pool
    pub fn idle_count(&self, key: &str) -> usize {
        self.pools.get(key).map_or(0, |p| p.len())
    }

    /// Take the most recently returned entity from a pool.
    ///
    /// Returns None if the pool is missing or empty; the caller then spawns
    /// a fresh entity tagged with [`Pooled`] instead.
    pub fn checkout(&mut self, key: &str) -> Option<Entity> {
        self.pools.get_mut(key)?.pop()
    }

    /// Return an entity to its pool.
    ///
    /// Returns false if the pool is missing (caller must despawn) or if the
    /// entity is already idle in the pool.
    pub fn checkin(&mut self, key: &str, entity: Entity) -> bool {
        match self.pools.get_mut(key) {
            Some(pool) => {
                if pool.contains(&entity) {
                    return false;
                }
                pool.push(entity);
                true
            }
            None => false,
        }
    }

    /// Remove a pool, returning its idle entities for the caller to despawn
    pub fn destroy_pool(&mut self, key: &str) -> Option<Vec<Entity>> {
        self.pools.remove(key)
    }

    /// Drain every pool, returning all idle entities for the caller to despawn
    pub fn clear_all(&mut self) -> Vec<Entity> {
        let mut all = Vec::new();
        for (_, mut pool) in self.pools.drain() {
            all.append(&mut pool);
        }
        all
    }
}

/// Deactivate a pooled entity and return it to its pool.
///
/// The `active` flag is the double-release guard: releasing an already idle
/// entity is a no-op even if some pool has dropped its record of it.
pub fn release_entity(pools: &mut EntityPools, pooled: &mut Pooled, entity: Entity) -> ReleaseOutcome {
    if !pooled.active {
        return ReleaseOutcome::AlreadyIdle;
    }
    pooled.active = false;
    if pools.checkin(&pooled.key, entity) {
        ReleaseOutcome::Returned
    } else {
        ReleaseOutcome::Despawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_is_lifo() {
        let mut pools = EntityPools::default();
        pools.create_pool("enemy");
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        assert!(pools.checkin("enemy", a));
        assert!(pools.checkin("enemy", b));

        assert_eq!(pools.checkout("enemy"), Some(b));
        assert_eq!(pools.checkout("enemy"), Some(a));
        assert_eq!(pools.checkout("enemy"), None);
    }

    #[test]
    fn create_pool_rejects_duplicate_keys() {
        let mut pools = EntityPools::default();
        assert!(pools.create_pool("gem"));
        assert!(!pools.create_pool("gem"));
    }

    #[test]
    fn checkin_missing_pool_fails() {
        let mut pools = EntityPools::default();
        assert!(!pools.checkin("nope", Entity::from_raw(7)));
    }

    #[test]
    fn checkin_guards_double_push() {
        let mut pools = EntityPools::default();
        pools.create_pool("fx");
        let e = Entity::from_raw(3);
        assert!(pools.checkin("fx", e));
        assert!(!pools.checkin("fx", e));
        assert_eq!(pools.idle_count("fx"), 1);
    }

    #[test]
    fn release_entity_guards_double_release() {
        let mut pools = EntityPools::default();
        pools.create_pool("shot");
        let e = Entity::from_raw(9);
        let mut pooled = Pooled::new("shot");

        assert_eq!(release_entity(&mut pools, &mut pooled, e), ReleaseOutcome::Returned);
        assert!(!pooled.active);
        assert_eq!(release_entity(&mut pools, &mut pooled, e), ReleaseOutcome::AlreadyIdle);
        assert_eq!(pools.idle_count("shot"), 1);
    }

    #[test]
    fn release_to_destroyed_pool_requests_despawn() {
        let mut pools = EntityPools::default();
        pools.create_pool("temp");
        pools.destroy_pool("temp");

        let mut pooled = Pooled::new("temp");
        let outcome = release_entity(&mut pools, &mut pooled, Entity::from_raw(4));
        assert_eq!(outcome, ReleaseOutcome::Despawn);
    }

    #[test]
    fn clear_all_drains_every_pool() {
        let mut pools = EntityPools::default();
        pools.create_pool("a");
        pools.create_pool("b");
        pools.checkin("a", Entity::from_raw(1));
        pools.checkin("b", Entity::from_raw(2));
        pools.checkin("b", Entity::from_raw(3));

        let drained = pools.clear_all();
        assert_eq!(drained.len(), 3);
        assert!(!pools.has_pool("a"));
        assert!(!pools.has_pool("b"));
    }
}
