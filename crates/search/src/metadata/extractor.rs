//! Derives filter descriptors from an entity schema.

use crate::error::ValidationError;
use crate::types::{FilterDescriptor, FilterOperator};

use super::schema::{Attribute, EntitySchema, SearchableEntity};

/// Discovers the searchable attributes of an entity type.
///
/// Every attribute is searchable unless it is excluded, type-level,
/// transient, a collection or map, or of a type with no field type.
/// Attributes with explicit [`Searchable`](super::Searchable) metadata use
/// it verbatim; all others are auto-detected and nullable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterMetadataExtractor;

impl FilterMetadataExtractor {
    /// Extracts descriptors for a registered entity type.
    pub fn extract<T: SearchableEntity>() -> Result<Vec<FilterDescriptor>, ValidationError> {
        Self::extract_schema(&T::schema())
    }

    /// Extracts descriptors from a schema, own attributes before inherited ones.
    pub fn extract_schema(schema: &EntitySchema) -> Result<Vec<FilterDescriptor>, ValidationError> {
        let mut filters = Vec::new();

        for attribute in schema.all_attributes() {
            if let Some(descriptor) = Self::describe(attribute)? {
                filters.push(descriptor);
            }
        }

        tracing::debug!(
            entity = %schema.name(),
            count = filters.len(),
            "Extracted filter descriptors"
        );

        Ok(filters)
    }

    fn describe(attribute: &Attribute) -> Result<Option<FilterDescriptor>, ValidationError> {
        if attribute.is_excluded() || attribute.is_static() || attribute.is_transient() {
            return Ok(None);
        }
        if attribute.kind().is_composite() {
            return Ok(None);
        }

        if let Some(searchable) = attribute.searchable_override() {
            let key = searchable
                .field_name
                .as_deref()
                .unwrap_or_else(|| attribute.name());
            return FilterDescriptor::new(
                key,
                searchable.field_type,
                searchable.nullable,
                FilterOperator::defaults_for(searchable.field_type),
            )
            .map(Some);
        }

        match attribute.kind().detect_field_type() {
            Some(field_type) => {
                FilterDescriptor::with_default_operators(attribute.name(), field_type, true)
                    .map(Some)
            }
            None => Ok(None),
        }
    }
}
