//! The capability an in-memory record must expose to be hydrated.

use indexmap::IndexMap;

use crate::filter::FilterValue;
use crate::record::{Record, Related};

/// An already-loaded record whose relation slots the engine may fill.
///
/// The engine only reads columns and writes relation slots; it never creates
/// or drops entities.
///
/// ```rust
/// use tether_query::{Entity, FilterValue, Related};
///
/// struct User {
///     id: i64,
///     orders: Vec<tether_query::Record>,
/// }
///
/// impl Entity for User {
///     fn model_name(&self) -> &str {
///         "User"
///     }
///
///     fn get_column(&self, column: &str) -> FilterValue {
///         match column {
///             "id" => self.id.into(),
///             _ => FilterValue::Null,
///         }
///     }
///
///     fn set_relation(&mut self, relation: &str, value: Related) {
///         if relation == "orders" {
///             self.orders = value.as_slice().to_vec();
///         }
///     }
/// }
/// ```
pub trait Entity {
    /// Declared model name, used to look relations up in the catalog.
    fn model_name(&self) -> &str;

    /// Read a column value; null when the entity has no such column.
    fn get_column(&self, column: &str) -> FilterValue;

    /// Write a relation slot.
    fn set_relation(&mut self, relation: &str, value: Related);
}

impl<T: Entity + ?Sized> Entity for Box<T> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn get_column(&self, column: &str) -> FilterValue {
        (**self).get_column(column)
    }

    fn set_relation(&mut self, relation: &str, value: Related) {
        (**self).set_relation(relation, value)
    }
}

/// An entity backed by an untyped [`Record`] and a map of relation slots.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicEntity {
    columns: Record,
    relations: IndexMap<String, Related>,
}

impl DynamicEntity {
    /// Create an entity of the given model with no columns.
    pub fn new(model: impl Into<String>) -> Self {
        Self::from_record(Record::new(model))
    }

    /// Wrap an existing record.
    pub fn from_record(columns: Record) -> Self {
        Self {
            columns,
            relations: IndexMap::new(),
        }
    }

    /// Set a column value (builder style).
    pub fn set(mut self, column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.columns.insert(column, value);
        self
    }

    /// The underlying column record.
    pub fn columns(&self) -> &Record {
        &self.columns
    }

    /// A relation slot, if it has been written.
    pub fn relation(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    /// Names of the relation slots written so far.
    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }
}

impl Entity for DynamicEntity {
    fn model_name(&self) -> &str {
        self.columns.model()
    }

    fn get_column(&self, column: &str) -> FilterValue {
        self.columns.value(column).clone()
    }

    fn set_relation(&mut self, relation: &str, value: Related) {
        self.relations.insert(relation.to_string(), value);
    }
}
