//! Caching decorators over the thing and list ports.
//!
//! Reads go through the [`ThingCache`] first. Writes and deletes are applied
//! to the wrapped adapter and evict afterwards, so a failed write leaves the
//! cache as it was.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::{
    cache::ThingCache,
    entities::{
        well_known, Class, List, Literal, Predicate, Resource, Thing, ThingKind, VisibilityFilter,
    },
    errors::GraphError,
    pagination::{Page, Pageable},
    repositories::{
        ClassRepository, ListRepository, LiteralRepository, PredicateRepository,
        ResourceRepository, ThingRepository,
    },
    value_objects::{ContributorId, SearchString, ThingId, Uri},
    ClassHandle, ListHandle, LiteralHandle, PredicateHandle, ResourceHandle, ThingHandle,
};

pub struct CachedThingRepository {
    inner: Arc<ThingHandle>,
    cache: Arc<ThingCache>,
}

impl CachedThingRepository {
    #[must_use]
    pub fn new(inner: Arc<ThingHandle>, cache: Arc<ThingCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ThingRepository for CachedThingRepository {
    type Error = GraphError;

    async fn find_by_thing_id(&self, id: &ThingId) -> Result<Option<Thing>, Self::Error> {
        if let Some(thing) = self.cache.thing(id) {
            return Ok(Some(thing));
        }
        let thing = self.inner.find_by_thing_id(id).await?;
        if let Some(thing) = &thing {
            self.cache.put_thing(thing.clone());
        }
        Ok(thing)
    }

    async fn exists_all(&self, ids: &BTreeSet<ThingId>) -> Result<bool, Self::Error> {
        self.inner.exists_all(ids).await
    }
}

/// Generates the cached read and evicting write half shared by every kind.
macro_rules! cached_thing_repository {
    ($name:ident, $handle:ident, $entity:ident, $kind:expr, $cache:ident) => {
        pub struct $name {
            inner: Arc<$handle>,
            cache: Arc<ThingCache>,
        }

        impl $name {
            #[must_use]
            pub fn new(inner: Arc<$handle>, cache: Arc<ThingCache>) -> Self {
                Self { inner, cache }
            }

            async fn cached_find(&self, id: &ThingId) -> Result<Option<$entity>, GraphError> {
                if let Some(entity) = self.cache.$cache().get(id) {
                    return Ok(Some(entity));
                }
                let entity = self.inner.find_by_id(id).await?;
                if let Some(entity) = &entity {
                    self.cache.$cache().put(id.clone(), entity.clone());
                }
                Ok(entity)
            }

            async fn cached_exists(&self, id: &ThingId) -> Result<bool, GraphError> {
                if let Some(exists) = self.cache.$cache().get_exists(id) {
                    return Ok(exists);
                }
                let exists = self.inner.exists(id).await?;
                self.cache.$cache().put_exists(id.clone(), exists);
                Ok(exists)
            }

            async fn evicting_save(&self, entity: $entity) -> Result<(), GraphError> {
                let id = entity.id.clone();
                self.inner.save(entity).await?;
                self.cache.evict($kind, &id);
                Ok(())
            }

            async fn evicting_delete(&self, id: &ThingId) -> Result<(), GraphError> {
                self.inner.delete_by_id(id).await?;
                self.cache.evict($kind, id);
                Ok(())
            }

            async fn evicting_delete_all(&self) -> Result<(), GraphError> {
                self.inner.delete_all().await?;
                self.cache.evict_all($kind);
                Ok(())
            }
        }
    };
}

cached_thing_repository!(
    CachedResourceRepository,
    ResourceHandle,
    Resource,
    ThingKind::Resource,
    resources
);
cached_thing_repository!(
    CachedLiteralRepository,
    LiteralHandle,
    Literal,
    ThingKind::Literal,
    literals
);
cached_thing_repository!(
    CachedPredicateRepository,
    PredicateHandle,
    Predicate,
    ThingKind::Predicate,
    predicates
);
cached_thing_repository!(CachedClassRepository, ClassHandle, Class, ThingKind::Class, classes);

#[async_trait]
impl ResourceRepository for CachedResourceRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        self.inner.next_identity().await
    }

    async fn save(&self, resource: Resource) -> Result<(), Self::Error> {
        self.evicting_save(resource).await
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Resource>, Self::Error> {
        self.cached_find(id).await
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        self.cached_exists(id).await
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Resource>, Self::Error> {
        self.inner.find_all(pageable).await
    }

    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error> {
        self.inner.find_all_by_label(label, pageable).await
    }

    async fn find_all_by_class(
        &self,
        class: &ThingId,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error> {
        self.inner.find_all_by_class(class, pageable).await
    }

    async fn find_all_by_visibility(
        &self,
        filter: VisibilityFilter,
        classes: &BTreeSet<ThingId>,
        pageable: &Pageable,
    ) -> Result<Page<Resource>, Self::Error> {
        self.inner
            .find_all_by_visibility(filter, classes, pageable)
            .await
    }

    async fn find_all_contributor_ids(
        &self,
        pageable: &Pageable,
    ) -> Result<Page<ContributorId>, Self::Error> {
        self.inner.find_all_contributor_ids(pageable).await
    }

    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.evicting_delete(id).await
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.evicting_delete_all().await
    }
}

#[async_trait]
impl LiteralRepository for CachedLiteralRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        self.inner.next_identity().await
    }

    async fn save(&self, literal: Literal) -> Result<(), Self::Error> {
        self.evicting_save(literal).await
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Literal>, Self::Error> {
        self.cached_find(id).await
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        self.cached_exists(id).await
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Literal>, Self::Error> {
        self.inner.find_all(pageable).await
    }

    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Literal>, Self::Error> {
        self.inner.find_all_by_label(label, pageable).await
    }

    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.evicting_delete(id).await
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.evicting_delete_all().await
    }
}

#[async_trait]
impl PredicateRepository for CachedPredicateRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        self.inner.next_identity().await
    }

    async fn save(&self, predicate: Predicate) -> Result<(), Self::Error> {
        self.evicting_save(predicate).await
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Predicate>, Self::Error> {
        self.cached_find(id).await
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        self.cached_exists(id).await
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Predicate>, Self::Error> {
        self.inner.find_all(pageable).await
    }

    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Predicate>, Self::Error> {
        self.inner.find_all_by_label(label, pageable).await
    }

    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.evicting_delete(id).await
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.evicting_delete_all().await
    }
}

#[async_trait]
impl ClassRepository for CachedClassRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        self.inner.next_identity().await
    }

    async fn save(&self, class: Class) -> Result<(), Self::Error> {
        self.evicting_save(class).await
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<Class>, Self::Error> {
        self.cached_find(id).await
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        self.cached_exists(id).await
    }

    async fn exists_all(&self, ids: &BTreeSet<ThingId>) -> Result<bool, Self::Error> {
        self.inner.exists_all(ids).await
    }

    async fn find_by_uri(&self, uri: &Uri) -> Result<Option<Class>, Self::Error> {
        self.inner.find_by_uri(uri).await
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Class>, Self::Error> {
        self.inner.find_all(pageable).await
    }

    async fn find_all_by_label(
        &self,
        label: &SearchString,
        pageable: &Pageable,
    ) -> Result<Page<Class>, Self::Error> {
        self.inner.find_all_by_label(label, pageable).await
    }

    async fn delete_by_id(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.evicting_delete(id).await
    }

    async fn delete_all(&self) -> Result<(), Self::Error> {
        self.evicting_delete_all().await
    }
}

/// Lists are resources underneath, so list writes evict the resource caches.
/// Saving a list may also create the `hasListElement` predicate.
pub struct CachedListRepository {
    inner: Arc<ListHandle>,
    cache: Arc<ThingCache>,
}

impl CachedListRepository {
    #[must_use]
    pub fn new(inner: Arc<ListHandle>, cache: Arc<ThingCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ListRepository for CachedListRepository {
    type Error = GraphError;

    async fn next_identity(&self) -> Result<ThingId, Self::Error> {
        self.inner.next_identity().await
    }

    async fn save(&self, list: List, contributor: ContributorId) -> Result<(), Self::Error> {
        let id = list.id.clone();
        self.inner.save(list, contributor).await?;
        self.cache.evict(ThingKind::Resource, &id);
        self.cache.evict(
            ThingKind::Predicate,
            &well_known::predicates::has_list_element(),
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &ThingId) -> Result<Option<List>, Self::Error> {
        self.inner.find_by_id(id).await
    }

    async fn exists(&self, id: &ThingId) -> Result<bool, Self::Error> {
        self.inner.exists(id).await
    }

    async fn delete(&self, id: &ThingId) -> Result<(), Self::Error> {
        self.inner.delete(id).await?;
        self.cache.evict(ThingKind::Resource, id);
        Ok(())
    }
}
