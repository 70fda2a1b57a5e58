//! Entity registry.
//!
//! Holds one immutable [`EntityRegistration`] per entity type. Registering a
//! type replaces the previous record wholesale with a single insert, so a
//! reader sees either the old or the new registration, never a mix.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::core::EntityRepository;
use crate::types::{FieldType, FilterDescriptor};

/// Identity of a registered entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityType {
    id: TypeId,
    name: String,
}

impl EntityType {
    /// Creates the identity of `T` under the given display name.
    pub fn of<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: name.into(),
        }
    }

    /// Returns the type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The registration record of one entity type.
pub struct EntityRegistration {
    entity: EntityType,
    filters: Vec<FilterDescriptor>,
    // Holds an `Arc<dyn EntityRepository<T>>` for the registered `T`.
    repository: Box<dyn Any + Send + Sync>,
}

impl EntityRegistration {
    /// Creates a registration record.
    pub fn new<T: Send + 'static>(
        entity: EntityType,
        filters: Vec<FilterDescriptor>,
        repository: Arc<dyn EntityRepository<T>>,
    ) -> Self {
        Self {
            entity,
            filters,
            repository: Box::new(repository),
        }
    }

    /// Returns the entity identity.
    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    /// Returns the filter descriptors.
    pub fn filters(&self) -> &[FilterDescriptor] {
        &self.filters
    }

    /// Returns the descriptor for a key.
    pub fn filter(&self, key: &str) -> Option<&FilterDescriptor> {
        self.filters.iter().find(|f| f.key() == key)
    }

    /// Returns the field type for a key.
    pub fn field_type(&self, key: &str) -> Option<FieldType> {
        self.filter(key).map(|f| f.field_type())
    }

    /// Returns the repository adapter if this record was registered for `T`.
    pub fn repository<T: Send + 'static>(&self) -> Option<Arc<dyn EntityRepository<T>>> {
        self.repository
            .downcast_ref::<Arc<dyn EntityRepository<T>>>()
            .cloned()
    }
}

impl fmt::Debug for EntityRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistration")
            .field("entity", &self.entity.name)
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Notification sent when the registry changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryUpdate {
    /// A type was registered for the first time.
    Registered(String),
    /// An existing registration was replaced.
    Replaced(String),
}

/// Process-wide map of entity registrations.
///
/// Lookups take a shared lock and clone an [`Arc`] out, so no lock is held
/// while a search runs.
pub struct EntityRegistry {
    entries: RwLock<HashMap<TypeId, Arc<EntityRegistration>>>,
    update_tx: broadcast::Sender<RegistryUpdate>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let (update_tx, _) = broadcast::channel(64);
        Self {
            entries: RwLock::new(HashMap::new()),
            update_tx,
        }
    }

    /// Inserts or replaces a registration, returning the previous one.
    pub fn register(&self, registration: EntityRegistration) -> Option<Arc<EntityRegistration>> {
        let name = registration.entity.name.clone();
        let id = registration.entity.id;
        let previous = self.entries.write().insert(id, Arc::new(registration));

        let update = if previous.is_some() {
            RegistryUpdate::Replaced(name)
        } else {
            RegistryUpdate::Registered(name)
        };
        let _ = self.update_tx.send(update);

        previous
    }

    /// Returns the registration for a type id.
    pub fn get(&self, id: TypeId) -> Option<Arc<EntityRegistration>> {
        self.entries.read().get(&id).cloned()
    }

    /// Returns the registration for `T`.
    pub fn get_for<T: 'static>(&self) -> Option<Arc<EntityRegistration>> {
        self.get(TypeId::of::<T>())
    }

    /// Returns the registration with the given display name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<EntityRegistration>> {
        self.entries
            .read()
            .values()
            .find(|r| r.entity.name == name)
            .cloned()
    }

    /// Returns true if a type id is registered.
    pub fn contains(&self, id: TypeId) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the display names of all registered types, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .values()
            .map(|r| r.entity.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Subscribes to registry updates.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryUpdate> {
        self.update_tx.subscribe()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("entities", &self.entity_names())
            .finish()
    }
}
