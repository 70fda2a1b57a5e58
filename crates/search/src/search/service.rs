//! Search dispatch service.
//!
//! The entry points used by a host application:
//!
//! - [`SearchService::register_entity`] - extract descriptors and store the adapter
//! - [`SearchService::search`] - route a search to the entity's adapter
//! - [`SearchService::available_filters`] - advisory filter discovery
//! - [`SearchService::resolve_field_type`] / [`SearchService::field_type`] - field lookups

use std::sync::Arc;

use crate::core::EntityRepository;
use crate::error::{EngineError, EngineResult};
use crate::metadata::{FilterMetadataExtractor, SearchableEntity};
use crate::types::{FieldType, FilterDescriptor, SearchCriteria, SearchResult};

use super::registry::{EntityRegistration, EntityRegistry, EntityType};

/// Dispatches searches to the repository adapter registered for each entity type.
///
/// Cheap to share: wrap in an [`Arc`] and call from any number of tasks.
#[derive(Debug, Default)]
pub struct SearchService {
    registry: EntityRegistry,
}

impl SearchService {
    /// Creates a service with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Registers `T` with its repository adapter, replacing any previous registration.
    pub fn register_entity<T>(
        &self,
        repository: Arc<dyn EntityRepository<T>>,
    ) -> EngineResult<()>
    where
        T: SearchableEntity,
    {
        let schema = T::schema();
        let filters = FilterMetadataExtractor::extract_schema(&schema)?;
        let entity = EntityType::of::<T>(schema.name());

        tracing::info!(
            entity = %entity,
            filters = filters.len(),
            "Registering searchable entity"
        );

        if self
            .registry
            .register(EntityRegistration::new(entity, filters, repository))
            .is_some()
        {
            tracing::info!(entity = %schema.name(), "Replaced existing registration");
        }
        Ok(())
    }

    /// Returns true if `T` is registered.
    pub fn is_registered<T: SearchableEntity>(&self) -> bool {
        self.registry.get_for::<T>().is_some()
    }

    /// Searches `T` with the given criteria.
    ///
    /// Filters without a field type are resolved from the registered
    /// descriptors (STRING when unknown) before the adapter is called.
    pub async fn search<T>(&self, criteria: &SearchCriteria) -> EngineResult<SearchResult<T>>
    where
        T: SearchableEntity,
    {
        let registration = self.registry.get_for::<T>().ok_or_else(|| not_registered::<T>())?;
        let repository = registration
            .repository::<T>()
            .ok_or_else(|| not_registered::<T>())?;

        let mut resolved = criteria.clone();
        for filter in resolved.filters_mut() {
            if filter.field_type.is_none() {
                filter.field_type = Some(
                    registration
                        .field_type(&filter.key)
                        .unwrap_or(FieldType::String),
                );
            }
        }

        tracing::debug!(
            entity = %registration.entity(),
            filters = resolved.filters().len(),
            sorts = resolved.sorts().len(),
            page = resolved.page().number,
            size = resolved.page().size,
            "Dispatching search"
        );

        repository.find_by_criteria(&resolved).await
    }

    /// Returns the descriptors of `T`, or an empty list if it is not registered.
    pub fn available_filters<T: SearchableEntity>(&self) -> Vec<FilterDescriptor> {
        self.registry
            .get_for::<T>()
            .map(|r| r.filters().to_vec())
            .unwrap_or_default()
    }

    /// Returns the descriptors of the entity with the given name, or an empty list.
    pub fn available_filters_by_name(&self, entity: &str) -> Vec<FilterDescriptor> {
        self.registry
            .get_by_name(entity)
            .map(|r| r.filters().to_vec())
            .unwrap_or_default()
    }

    /// Returns the field type of a key on `T`, defaulting to STRING.
    pub fn resolve_field_type<T: SearchableEntity>(&self, key: &str) -> FieldType {
        self.registry
            .get_for::<T>()
            .and_then(|r| r.field_type(key))
            .unwrap_or(FieldType::String)
    }

    /// Returns the field type of a key on `T`, failing when the type or key is unknown.
    pub fn field_type<T: SearchableEntity>(&self, key: &str) -> EngineResult<FieldType> {
        let registration = self.registry.get_for::<T>().ok_or_else(|| not_registered::<T>())?;
        registration
            .field_type(key)
            .ok_or_else(|| EngineError::FieldNotFound {
                entity: registration.entity().name().to_string(),
                field: key.to_string(),
            })
    }
}

fn not_registered<T: SearchableEntity>() -> EngineError {
    EngineError::NotRegistered {
        entity: T::schema().name().to_string(),
    }
}
