//! MySqlStore - binding dello store su MySQL tramite sqlx
//!
//! Le query sono costruite a runtime con `sqlx::QueryBuilder` perché il nome
//! della tabella e le colonne arrivano dal trait `Entity`: i macro `query!`
//! vogliono SQL statico. Tutti i valori passano comunque da `push_bind`.

use super::{Column, Entity, EntityStore, FieldValue, Filter, StoreTransaction};
use crate::core::StoreError;
use sqlx::mysql::MySqlRow;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder, Transaction};
use std::marker::PhantomData;
use tracing::{debug, instrument};

pub struct MySqlStore<T> {
    connection_pool: MySqlPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> MySqlStore<T> {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self {
            connection_pool,
            _entity: PhantomData,
        }
    }
}

impl<T> Clone for MySqlStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.connection_pool.clone())
    }
}

impl<T> EntityStore<T> for MySqlStore<T>
where
    T: Entity + for<'r> FromRow<'r, MySqlRow> + Unpin,
{
    type Transaction = MySqlTransaction<T>;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        let tx = self.connection_pool.begin().await?;
        Ok(MySqlTransaction {
            tx,
            _entity: PhantomData,
        })
    }

    #[instrument(skip(self), fields(table = T::TABLE))]
    async fn find_first(&self, filter: Option<&Filter<T::Column>>) -> Result<Option<T>, StoreError> {
        let mut query_builder = select_query::<T>(filter);
        query_builder.push(" LIMIT 1");
        debug!(sql = query_builder.sql(), "Selecting first row");

        let row = query_builder
            .build()
            .fetch_optional(&self.connection_pool)
            .await?;

        // decodifica fuori dal future della query
        row.map(|r| T::from_row(&r)).transpose().map_err(StoreError::from)
    }

    #[instrument(skip(self), fields(table = T::TABLE))]
    async fn find_all(&self, filter: Option<&Filter<T::Column>>) -> Result<Vec<T>, StoreError> {
        let mut query_builder = select_query::<T>(filter);
        debug!(sql = query_builder.sql(), "Selecting rows");

        let rows = query_builder
            .build()
            .fetch_all(&self.connection_pool)
            .await?;

        rows.iter()
            .map(|r| T::from_row(r).map_err(StoreError::from))
            .collect()
    }
}

/// Transazione MySQL: il rollback avviene nel drop di `sqlx::Transaction`.
pub struct MySqlTransaction<T> {
    tx: Transaction<'static, MySql>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> StoreTransaction<T> for MySqlTransaction<T> {
    async fn insert(&mut self, entity: &T) -> Result<i32, StoreError> {
        let mut query_builder = insert_query(entity);
        let result = query_builder.build().execute(&mut *self.tx).await?;

        let new_id = i32::try_from(result.last_insert_id()).map_err(|_| {
            StoreError::Constraint(format!("identifier overflow in table '{}'", T::TABLE))
        })?;
        debug!(table = T::TABLE, id = new_id, "Row inserted");
        Ok(new_id)
    }

    async fn replace(&mut self, entity: &T) -> Result<bool, StoreError> {
        // MySQL non conta le righe con valori invariati: verifichiamo prima l'esistenza
        let mut lock_query = QueryBuilder::<MySql>::new("SELECT 1 FROM ");
        lock_query
            .push(T::TABLE)
            .push(" WHERE ")
            .push(T::ID_COLUMN)
            .push(" = ")
            .push_bind(entity.id())
            .push(" FOR UPDATE");
        let exists = lock_query
            .build()
            .fetch_optional(&mut *self.tx)
            .await?
            .is_some();
        if !exists {
            return Ok(false);
        }

        let mut query_builder = update_query(entity);
        query_builder.build().execute(&mut *self.tx).await?;
        Ok(true)
    }

    async fn delete(&mut self, id: i32) -> Result<bool, StoreError> {
        let mut query_builder = QueryBuilder::<MySql>::new("DELETE FROM ");
        query_builder
            .push(T::TABLE)
            .push(" WHERE ")
            .push(T::ID_COLUMN)
            .push(" = ")
            .push_bind(id);
        let result = query_builder.build().execute(&mut *self.tx).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

fn select_query<T: Entity>(filter: Option<&Filter<T::Column>>) -> QueryBuilder<'static, MySql> {
    let mut query_builder = QueryBuilder::new("SELECT ");
    query_builder.push(T::ID_COLUMN);
    for column in T::columns() {
        query_builder.push(", ").push(column.name());
    }
    query_builder.push(" FROM ").push(T::TABLE);

    if let Some(filter) = filter {
        query_builder.push(" WHERE ");
        push_filter(&mut query_builder, filter, T::ID_COLUMN);
    }
    query_builder
}

fn insert_query<T: Entity>(entity: &T) -> QueryBuilder<'static, MySql> {
    let mut query_builder = QueryBuilder::new("INSERT INTO ");
    query_builder.push(T::TABLE).push(" (");

    let mut columns = query_builder.separated(", ");
    for column in T::columns() {
        columns.push(column.name());
    }
    query_builder.push(") VALUES (");

    for (i, column) in T::columns().iter().enumerate() {
        if i > 0 {
            query_builder.push(", ");
        }
        push_value(&mut query_builder, entity.field(*column));
    }
    query_builder.push(")");
    query_builder
}

fn update_query<T: Entity>(entity: &T) -> QueryBuilder<'static, MySql> {
    let mut query_builder = QueryBuilder::new("UPDATE ");
    query_builder.push(T::TABLE).push(" SET ");

    for (i, column) in T::updatable_columns().iter().enumerate() {
        if i > 0 {
            query_builder.push(", ");
        }
        query_builder.push(column.name()).push(" = ");
        push_value(&mut query_builder, entity.field(*column));
    }

    query_builder.push(" WHERE ").push(T::ID_COLUMN).push(" = ");
    query_builder.push_bind(entity.id());
    query_builder
}

fn push_filter<C: Column>(
    query_builder: &mut QueryBuilder<'static, MySql>,
    filter: &Filter<C>,
    id_column: &str,
) {
    match filter {
        Filter::Id(id) => {
            query_builder.push(id_column).push(" = ").push_bind(*id);
        }
        Filter::Eq(column, value) => {
            query_builder.push(column.name()).push(" = ");
            push_value(query_builder, value.clone());
        }
        Filter::EqIgnoreCase(column, text) => {
            query_builder
                .push("LOWER(")
                .push(column.name())
                .push(") = LOWER(")
                .push_bind(text.clone())
                .push(")");
        }
        Filter::And(filters) if filters.is_empty() => {
            query_builder.push("1 = 1");
        }
        Filter::And(filters) => {
            query_builder.push("(");
            for (i, inner) in filters.iter().enumerate() {
                if i > 0 {
                    query_builder.push(" AND ");
                }
                push_filter(query_builder, inner, id_column);
            }
            query_builder.push(")");
        }
    }
}

fn push_value(query_builder: &mut QueryBuilder<'static, MySql>, value: FieldValue) {
    match value {
        FieldValue::Int(v) => query_builder.push_bind(v),
        FieldValue::Float(v) => query_builder.push_bind(v),
        FieldValue::Text(v) => query_builder.push_bind(v),
        FieldValue::Timestamp(v) => query_builder.push_bind(v),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Villa, VillaColumn};

    #[test]
    fn test_select_without_filter() {
        let query_builder = select_query::<Villa>(None);
        assert_eq!(
            query_builder.sql(),
            "SELECT id, name, detail, image_url, occupancy, rate, area, amenities, \
             created_at, updated_at FROM villas"
        );
    }

    #[test]
    fn test_select_with_case_insensitive_name() {
        let filter = Filter::EqIgnoreCase(VillaColumn::Name, "Sunset Villa".into());
        let query_builder = select_query::<Villa>(Some(&filter));
        assert!(query_builder.sql().ends_with(" FROM villas WHERE LOWER(name) = LOWER(?)"));
    }

    #[test]
    fn test_select_with_and_filter() {
        let filter = Filter::And(vec![
            Filter::Id(3),
            Filter::Eq(VillaColumn::Occupancy, FieldValue::Int(4)),
        ]);
        let query_builder = select_query::<Villa>(Some(&filter));
        assert!(query_builder.sql().ends_with(" WHERE (id = ? AND occupancy = ?)"));
    }

    #[test]
    fn test_insert_binds_every_column() {
        let query_builder = insert_query(&Villa::default());
        assert_eq!(
            query_builder.sql(),
            "INSERT INTO villas (name, detail, image_url, occupancy, rate, area, amenities, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_update_skips_created_at() {
        let query_builder = update_query(&Villa::default());
        let sql = query_builder.sql();
        assert!(sql.starts_with("UPDATE villas SET name = ?, "));
        assert!(!sql.contains("created_at"));
        assert!(sql.ends_with("updated_at = ? WHERE id = ?"));
    }
}
