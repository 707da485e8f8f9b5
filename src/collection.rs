//! The keyed cache container.
//!
//! A [`Collection`] is an insertion-ordered map from snowflake ID to a shared,
//! mutable entity. Construction is type-directed: [`Collection::update`]
//! hydrates a new entity on a miss and merges the partial payload into the
//! existing entity on a hit, so outstanding references observe the change
//! without ever being invalidated.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::client::WeakClient;
use crate::structures::Entity;
use crate::wire::Snowflake;

/// A shared handle to a cached entity. Same-ID lookups always return clones
/// of the same handle, so `Rc::ptr_eq` is the identity check.
pub type Shared<T> = Rc<RefCell<T>>;

/// Insertion-ordered cache of one entity kind.
pub struct Collection<V> {
    client: WeakClient,
    map: RefCell<IndexMap<Snowflake, Shared<V>>>,
}

impl<V> Collection<V> {
    pub fn new(client: WeakClient) -> Self {
        Self {
            client,
            map: RefCell::new(IndexMap::new()),
        }
    }

    /// Look up an entity by ID. No side effects.
    pub fn get(&self, id: &str) -> Option<Shared<V>> {
        self.map.borrow().get(id).cloned()
    }

    pub fn has(&self, id: &str) -> bool {
        self.map.borrow().contains_key(id)
    }

    /// Remove an entity. This is the only way membership ends; nothing in the
    /// cache evicts silently.
    pub fn delete(&self, id: &str) -> bool {
        self.map.borrow_mut().shift_remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    /// The cached IDs, in insertion order.
    pub fn keys(&self) -> Vec<Snowflake> {
        self.map.borrow().keys().cloned().collect()
    }

    /// Apply `f` to every entity, in insertion order.
    pub fn map<T>(&self, mut f: impl FnMut(&V) -> T) -> Vec<T> {
        // Snapshot the handles first so `f` may re-enter the collection.
        let entities: Vec<Shared<V>> = self.map.borrow().values().cloned().collect();
        entities.iter().map(|e| f(&e.borrow())).collect()
    }

    /// Update-or-insert with explicit strategies, for entity kinds whose
    /// construction needs context beyond the raw payload (members carry their
    /// guild ID and a user object resolved by the caller).
    pub fn upsert_with(
        &self,
        id: &str,
        insert: impl FnOnce() -> V,
        update: impl FnOnce(&mut V),
    ) -> Shared<V> {
        let existing = self.map.borrow().get(id).cloned();
        match existing {
            Some(entity) => {
                update(&mut entity.borrow_mut());
                entity
            }
            None => {
                let entity = Rc::new(RefCell::new(insert()));
                self.map
                    .borrow_mut()
                    .insert(id.to_string(), Rc::clone(&entity));
                entity
            }
        }
    }
}

impl<V: Entity> Collection<V> {
    /// Merge a raw payload into the cache.
    ///
    /// On a hit the existing entity is mutated in place and the same handle is
    /// returned; on a miss a new entity is fully hydrated and inserted. The
    /// map borrow is never held across hydration or merge, so an update that
    /// fans out back into this collection (a message resolving its referenced
    /// message, say) does not deadlock on the `RefCell`.
    pub fn update(&self, data: &V::Raw) -> Shared<V> {
        let id = V::raw_id(data);
        let existing = self.map.borrow().get(id).cloned();
        match existing {
            Some(entity) => {
                entity.borrow_mut().update(data);
                entity
            }
            None => {
                trace!(%id, kind = std::any::type_name::<V>(), "caching new entity");
                let entity = Rc::new(RefCell::new(V::hydrate(data, self.client.clone())));
                self.map
                    .borrow_mut()
                    .insert(id.to_string(), Rc::clone(&entity));
                entity
            }
        }
    }

    /// Insert an already-constructed entity under its own ID. If the ID is
    /// already cached the existing entity wins and is returned instead.
    pub fn add(&self, entity: Shared<V>) -> Shared<V> {
        let id = entity.borrow().id().clone();
        let existing = self.map.borrow().get(&id).cloned();
        match existing {
            Some(present) => present,
            None => {
                self.map.borrow_mut().insert(id, Rc::clone(&entity));
                entity
            }
        }
    }
}

impl<V> std::fmt::Debug for Collection<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("len", &self.map.borrow().len())
            .finish_non_exhaustive()
    }
}
