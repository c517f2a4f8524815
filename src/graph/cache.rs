//! Read-through caches for things.
//!
//! Each kind owns an id-to-entity cache and an id-to-exists cache, and all
//! kinds share one id-to-thing cache. The same id is reachable through the
//! kind cache and the shared one, so every write evicts both through
//! [`ThingCache::evict`] or [`ThingCache::evict_all`].

use std::hash::Hash;

use moka::sync::Cache;

use super::entities::{Class, Literal, Predicate, Resource, Thing, ThingKind};
use super::value_objects::ThingId;
use crate::config::CacheSettings;

fn build<K, V>(settings: &CacheSettings) -> Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut builder = Cache::builder().max_capacity(settings.max_capacity);
    if let Some(ttl) = settings.time_to_live() {
        builder = builder.time_to_live(ttl);
    }
    builder.build()
}

/// The entity and existence caches of one kind.
pub struct EntityCache<V: Clone + Send + Sync + 'static> {
    entities: Cache<ThingId, V>,
    exists: Cache<ThingId, bool>,
}

impl<V: Clone + Send + Sync + 'static> EntityCache<V> {
    fn new(settings: &CacheSettings) -> Self {
        Self {
            entities: build(settings),
            exists: build(settings),
        }
    }

    #[must_use]
    pub fn get(&self, id: &ThingId) -> Option<V> {
        self.entities.get(id)
    }

    pub fn put(&self, id: ThingId, value: V) {
        self.entities.insert(id, value);
    }

    #[must_use]
    pub fn get_exists(&self, id: &ThingId) -> Option<bool> {
        self.exists.get(id)
    }

    pub fn put_exists(&self, id: ThingId, exists: bool) {
        self.exists.insert(id, exists);
    }

    fn invalidate(&self, id: &ThingId) {
        self.entities.invalidate(id);
        self.exists.invalidate(id);
    }

    fn invalidate_all(&self) {
        self.entities.invalidate_all();
        self.exists.invalidate_all();
    }
}

pub struct ThingCache {
    resources: EntityCache<Resource>,
    literals: EntityCache<Literal>,
    predicates: EntityCache<Predicate>,
    classes: EntityCache<Class>,
    things: Cache<ThingId, Thing>,
}

impl ThingCache {
    #[must_use]
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            resources: EntityCache::new(settings),
            literals: EntityCache::new(settings),
            predicates: EntityCache::new(settings),
            classes: EntityCache::new(settings),
            things: build(settings),
        }
    }

    #[must_use]
    pub fn resources(&self) -> &EntityCache<Resource> {
        &self.resources
    }

    #[must_use]
    pub fn literals(&self) -> &EntityCache<Literal> {
        &self.literals
    }

    #[must_use]
    pub fn predicates(&self) -> &EntityCache<Predicate> {
        &self.predicates
    }

    #[must_use]
    pub fn classes(&self) -> &EntityCache<Class> {
        &self.classes
    }

    #[must_use]
    pub fn thing(&self, id: &ThingId) -> Option<Thing> {
        self.things.get(id)
    }

    pub fn put_thing(&self, thing: Thing) {
        self.things.insert(thing.id().clone(), thing);
    }

    /// Drops `id` from the cache of `kind` and from the shared thing cache.
    pub fn evict(&self, kind: ThingKind, id: &ThingId) {
        tracing::trace!(?kind, %id, "evicting cached thing");
        match kind {
            ThingKind::Resource => self.resources.invalidate(id),
            ThingKind::Literal => self.literals.invalidate(id),
            ThingKind::Predicate => self.predicates.invalidate(id),
            ThingKind::Class => self.classes.invalidate(id),
        }
        self.things.invalidate(id);
    }

    /// Clears the cache of `kind` and the shared thing cache.
    pub fn evict_all(&self, kind: ThingKind) {
        tracing::trace!(?kind, "evicting all cached things of kind");
        match kind {
            ThingKind::Resource => self.resources.invalidate_all(),
            ThingKind::Literal => self.literals.invalidate_all(),
            ThingKind::Predicate => self.predicates.invalidate_all(),
            ThingKind::Class => self.classes.invalidate_all(),
        }
        self.things.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::graph::value_objects::ContributorId;

    fn predicate(id: &str, label: &str) -> Predicate {
        Predicate {
            id: ThingId::new(id).expect("valid id"),
            label: label.to_string(),
            description: None,
            created_by: ContributorId::UNKNOWN,
            created_at: Utc::now(),
            modifiable: true,
        }
    }

    #[test]
    fn evict_clears_kind_and_shared_entries() {
        let cache = ThingCache::new(&CacheSettings::default());
        let p1 = predicate("P1", "has author");
        cache.predicates().put(p1.id.clone(), p1.clone());
        cache.predicates().put_exists(p1.id.clone(), true);
        cache.put_thing(Thing::Predicate(p1.clone()));

        cache.evict(ThingKind::Predicate, &p1.id);

        assert!(cache.predicates().get(&p1.id).is_none());
        assert!(cache.predicates().get_exists(&p1.id).is_none());
        assert!(cache.thing(&p1.id).is_none());
    }

    #[test]
    fn evict_all_leaves_other_kinds_alone() {
        let cache = ThingCache::new(&CacheSettings::default());
        let p1 = predicate("P1", "has author");
        cache.predicates().put(p1.id.clone(), p1.clone());
        cache.resources().put_exists(p1.id.clone(), false);

        cache.evict_all(ThingKind::Predicate);

        assert!(cache.predicates().get(&p1.id).is_none());
        assert_eq!(cache.resources().get_exists(&p1.id), Some(false));
    }
}
