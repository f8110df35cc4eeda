//! Common repository traits
//!
//! This module defines the generic interfaces between the repository and the
//! stores that persist entities: what an entity must expose, how callers
//! express a filter, and the store port itself.

use crate::core::StoreError;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::future::Future;

/// A single persisted value, as seen by filters and store bindings.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// A persisted, non-identifier column of an entity.
pub trait Column: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Column name in the relational schema
    fn name(self) -> &'static str;
}

/// Trait for records that can be persisted by an [`EntityStore`]
///
/// The identifier is kept out of [`Entity::Column`]: it is assigned by the
/// store on insert and addressed through [`Filter::Id`].
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Column: Column;

    /// Name of the table (or collection) holding the records
    const TABLE: &'static str;

    /// Name of the identifier column
    const ID_COLUMN: &'static str;

    fn id(&self) -> i32;

    fn set_id(&mut self, id: i32);

    /// Every persisted column except the identifier, in schema order
    fn columns() -> &'static [Self::Column];

    /// Columns rewritten by an update. Columns missing here are written once
    /// on insert and never touched again.
    fn updatable_columns() -> &'static [Self::Column];

    /// Columns whose values must be unique across records, compared with
    /// [`eq_ignore_case`] for text. The store rejects a clashing write with
    /// [`StoreError::Duplicate`].
    fn unique_columns() -> &'static [Self::Column] {
        &[]
    }

    fn field(&self, column: Self::Column) -> FieldValue;

    /// Writes a value into a column
    ///
    /// # Returns
    /// * `Err(StoreError::Constraint)` - the value variant does not fit the column
    fn set_field(&mut self, column: Self::Column, value: FieldValue) -> Result<(), StoreError>;
}

/// Predicate over an entity, evaluated in memory or rendered to SQL
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<C> {
    /// Identifier equality
    Id(i32),
    /// Exact equality on a column
    Eq(C, FieldValue),
    /// Case-insensitive text equality on a column
    ///
    /// In memory the comparison is [`eq_ignore_case`] (Unicode lowercase).
    /// MySQL renders `LOWER(col) = LOWER(?)`, which follows the column
    /// collation: the two agree on ASCII but may differ on some non-ASCII
    /// names (for example `ß` against `SS` under `utf8mb4_0900_ai_ci`).
    EqIgnoreCase(C, String),
    /// Every inner filter must match (an empty list matches everything)
    And(Vec<Filter<C>>),
}

impl<C: Column> Filter<C> {
    pub fn matches<T>(&self, entity: &T) -> bool
    where
        T: Entity<Column = C>,
    {
        match self {
            Filter::Id(id) => entity.id() == *id,
            Filter::Eq(column, value) => entity.field(*column) == *value,
            Filter::EqIgnoreCase(column, needle) => match entity.field(*column) {
                FieldValue::Text(text) => eq_ignore_case(&text, needle),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(entity)),
        }
    }
}

/// Text comparison used by the in-memory binding for case-insensitive
/// filters and unique columns.
pub fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

/// Store port: the only way the repository reaches persisted records
///
/// # Type Parameters
/// * `T` - Entity persisted by the store
///
/// Reads go straight to the store; writes go through a [`StoreTransaction`]
/// obtained from [`EntityStore::begin`].
pub trait EntityStore<T: Entity>: Send + Sync + 'static {
    type Transaction: StoreTransaction<T> + Send;

    /// Opens a write transaction
    ///
    /// # Returns
    /// * `Ok(Transaction)` - Transaction to be committed; dropping it rolls back
    /// * `Err(StoreError)` - The store could not start a transaction
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, StoreError>> + Send;

    /// Reads the first record matching `filter` (any record when `None`)
    ///
    /// # Returns
    /// * `Ok(Some(T))` - Record found
    /// * `Ok(None)` - No record matches
    /// * `Err(StoreError)` - Error during reading
    fn find_first(
        &self,
        filter: Option<&Filter<T::Column>>,
    ) -> impl Future<Output = Result<Option<T>, StoreError>> + Send;

    /// Reads every record matching `filter`
    ///
    /// # Note
    /// Records come back in the order the store yields them. No sort is applied.
    fn find_all(
        &self,
        filter: Option<&Filter<T::Column>>,
    ) -> impl Future<Output = Result<Vec<T>, StoreError>> + Send;
}

/// A write scope on a store. Changes become visible on [`commit`](Self::commit).
pub trait StoreTransaction<T: Entity> {
    /// Inserts a record, ignoring its identifier
    ///
    /// # Returns
    /// * `Ok(i32)` - Identifier assigned by the store
    fn insert(&mut self, entity: &T) -> impl Future<Output = Result<i32, StoreError>> + Send;

    /// Rewrites the updatable columns of the record with the same identifier
    ///
    /// # Returns
    /// * `Ok(true)` - Record replaced
    /// * `Ok(false)` - No record with that identifier
    fn replace(&mut self, entity: &T) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Deletes the record with the given identifier
    ///
    /// # Returns
    /// * `Ok(true)` - Record deleted
    /// * `Ok(false)` - No record with that identifier
    fn delete(&mut self, id: i32) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Makes every change of this transaction durable
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
