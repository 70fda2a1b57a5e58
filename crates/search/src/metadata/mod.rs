//! Field metadata discovery.
//!
//! Entity types describe themselves with an [`EntitySchema`]; the
//! [`FilterMetadataExtractor`] turns that schema into the list of
//! [`FilterDescriptor`](crate::types::FilterDescriptor) values exposed by the
//! search service.

mod extractor;
mod schema;

pub use extractor::FilterMetadataExtractor;
pub use schema::{
    Attribute, AttributeKind, AttributeType, EntitySchema, Searchable, SearchableEntity,
};
