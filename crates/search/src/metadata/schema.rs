//! Explicit entity schemas.
//!
//! An entity type describes its attributes once through
//! [`SearchableEntity::schema`]. Each attribute carries its name, the kind of
//! its declared type, the static/transient flags and an optional
//! [`Searchable`] override or exclusion marker. Parent schemas are chained
//! with [`EntitySchema::extends`].
//!
//! ```
//! use dynamic_search::metadata::{Attribute, EntitySchema, Searchable};
//! use dynamic_search::types::FieldType;
//!
//! let schema = EntitySchema::new("Device")
//!     .field::<i64>("id")
//!     .field::<String>("label")
//!     .field::<Vec<String>>("tags")
//!     .attribute(Attribute::of::<String>("serial").searchable(
//!         Searchable::new(FieldType::String).nullable(false).field_name("serialNumber"),
//!     ))
//!     .attribute(Attribute::of::<String>("secret").exclude());
//!
//! assert_eq!(schema.attributes().len(), 5);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;

use crate::types::FieldType;

/// The kind of an attribute's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Any integer width.
    Integer,
    /// `f32` or `f64`.
    Float,
    /// Arbitrary precision decimal.
    Decimal,
    /// Calendar date without time.
    Date,
    /// Date with time, zoned or not.
    DateTime,
    /// Boolean.
    Boolean,
    /// Text or character.
    Text,
    /// Sequence or set of values.
    Collection,
    /// Key/value map.
    Map,
    /// Any other type, named for diagnostics.
    Other(&'static str),
}

impl AttributeKind {
    /// Returns the field type auto-detected for this kind, if searchable.
    pub fn detect_field_type(&self) -> Option<FieldType> {
        match self {
            AttributeKind::Integer | AttributeKind::Float | AttributeKind::Decimal => {
                Some(FieldType::Number)
            }
            AttributeKind::Date | AttributeKind::DateTime => Some(FieldType::Date),
            AttributeKind::Boolean => Some(FieldType::Boolean),
            AttributeKind::Text => Some(FieldType::String),
            AttributeKind::Collection | AttributeKind::Map | AttributeKind::Other(_) => None,
        }
    }

    /// Returns true for collection and map kinds.
    pub fn is_composite(&self) -> bool {
        matches!(self, AttributeKind::Collection | AttributeKind::Map)
    }
}

/// Maps a Rust type to its [`AttributeKind`].
pub trait AttributeType {
    /// The kind of this type.
    fn attribute_kind() -> AttributeKind;
}

macro_rules! attribute_kind {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl AttributeType for $ty {
                fn attribute_kind() -> AttributeKind {
                    $kind
                }
            }
        )+
    };
}

attribute_kind!(AttributeKind::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
attribute_kind!(AttributeKind::Float => f32, f64);
attribute_kind!(AttributeKind::Decimal => Decimal);
attribute_kind!(AttributeKind::Date => NaiveDate);
attribute_kind!(AttributeKind::DateTime => NaiveDateTime);
attribute_kind!(AttributeKind::Boolean => bool);
attribute_kind!(AttributeKind::Text => String, &str, char);
attribute_kind!(AttributeKind::Other("json") => serde_json::Value);

impl<Tz: TimeZone> AttributeType for DateTime<Tz> {
    fn attribute_kind() -> AttributeKind {
        AttributeKind::DateTime
    }
}

impl<T: AttributeType> AttributeType for Option<T> {
    fn attribute_kind() -> AttributeKind {
        T::attribute_kind()
    }
}

impl<T: AttributeType> AttributeType for Box<T> {
    fn attribute_kind() -> AttributeKind {
        T::attribute_kind()
    }
}

impl<T> AttributeType for Vec<T> {
    fn attribute_kind() -> AttributeKind {
        AttributeKind::Collection
    }
}

impl<T> AttributeType for VecDeque<T> {
    fn attribute_kind() -> AttributeKind {
        AttributeKind::Collection
    }
}

impl<T, S> AttributeType for HashSet<T, S> {
    fn attribute_kind() -> AttributeKind {
        AttributeKind::Collection
    }
}

impl<T> AttributeType for BTreeSet<T> {
    fn attribute_kind() -> AttributeKind {
        AttributeKind::Collection
    }
}

impl<K, V, S> AttributeType for HashMap<K, V, S> {
    fn attribute_kind() -> AttributeKind {
        AttributeKind::Map
    }
}

impl<K, V> AttributeType for BTreeMap<K, V> {
    fn attribute_kind() -> AttributeKind {
        AttributeKind::Map
    }
}

/// Explicit search metadata for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Searchable {
    /// Declared field type.
    pub field_type: FieldType,
    /// Declared nullability (defaults to true).
    pub nullable: bool,
    /// Key override; the attribute name is used when absent.
    pub field_name: Option<String>,
}

impl Searchable {
    /// Declares an attribute as searchable with the given field type.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            nullable: true,
            field_name: None,
        }
    }

    /// Sets the nullability.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Overrides the key used in filters.
    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.field_name = if name.is_empty() { None } else { Some(name) };
        self
    }
}

/// One attribute of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
    is_static: bool,
    is_transient: bool,
    excluded: bool,
    searchable: Option<Searchable>,
}

impl Attribute {
    /// Creates an attribute of the given kind.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_static: false,
            is_transient: false,
            excluded: false,
            searchable: None,
        }
    }

    /// Creates an attribute whose kind is derived from a Rust type.
    pub fn of<T: AttributeType + ?Sized>(name: impl Into<String>) -> Self {
        Self::new(name, T::attribute_kind())
    }

    /// Marks the attribute as excluded from search.
    pub fn exclude(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// Marks the attribute as type-level (shared by all instances).
    pub fn type_level(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the attribute as transient (not persisted).
    pub fn transient(mut self) -> Self {
        self.is_transient = true;
        self
    }

    /// Attaches explicit search metadata.
    pub fn searchable(mut self, searchable: Searchable) -> Self {
        self.searchable = Some(searchable);
        self
    }

    /// Returns the attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attribute kind.
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Returns true if the attribute is type-level.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Returns true if the attribute is transient.
    pub fn is_transient(&self) -> bool {
        self.is_transient
    }

    /// Returns true if the attribute is excluded from search.
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    /// Returns the explicit search metadata, if any.
    pub fn searchable_override(&self) -> Option<&Searchable> {
        self.searchable.as_ref()
    }
}

/// The attribute list of an entity type and its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    name: String,
    attributes: Vec<Attribute>,
    parent: Option<Box<EntitySchema>>,
}

impl EntitySchema {
    /// Creates an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            parent: None,
        }
    }

    /// Adds an attribute.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Adds a plain attribute typed by `T`.
    pub fn field<T: AttributeType + ?Sized>(self, name: impl Into<String>) -> Self {
        self.attribute(Attribute::of::<T>(name))
    }

    /// Sets the parent schema whose attributes are inherited.
    pub fn extends(mut self, parent: EntitySchema) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Returns the entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attributes declared directly on this schema.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns the parent schema, if any.
    pub fn parent(&self) -> Option<&EntitySchema> {
        self.parent.as_deref()
    }

    /// Iterates own attributes first, then each ancestor's in turn.
    pub fn all_attributes(&self) -> impl Iterator<Item = &Attribute> {
        std::iter::successors(Some(self), |schema| schema.parent())
            .flat_map(|schema| schema.attributes.iter())
    }
}

/// An entity type that can be registered for search.
pub trait SearchableEntity: Send + Sync + 'static {
    /// Describes the entity's attributes.
    fn schema() -> EntitySchema;
}
