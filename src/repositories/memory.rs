//! InMemoryStore - store in memoria ordinato per id
//!
//! Usato dai test e da `STORE_BACKEND=memory`. Le righe vivono in una
//! `BTreeMap` quindi l'ordine "nativo" è quello crescente degli id.
//! Una transazione tiene il lock per tutta la sua durata e lavora su una copia:
//! il commit sostituisce la tabella, il drop senza commit la scarta.

use super::{Column, Entity, EntityStore, FieldValue, Filter, StoreTransaction};
use super::traits::eq_ignore_case;
use crate::core::StoreError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Debug, Clone)]
struct MemoryTable<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

impl<T> Default for MemoryTable<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

#[derive(Debug)]
pub struct InMemoryStore<T> {
    table: Arc<Mutex<MemoryTable<T>>>,
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(MemoryTable::default())),
        }
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Clone condivide la stessa tabella
impl<T> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<T: Entity> EntityStore<T> for InMemoryStore<T> {
    type Transaction = InMemoryTransaction<T>;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        let guard = Arc::clone(&self.table).lock_owned().await;
        let staged = (*guard).clone();
        Ok(InMemoryTransaction { guard, staged })
    }

    async fn find_first(&self, filter: Option<&Filter<T::Column>>) -> Result<Option<T>, StoreError> {
        let table = self.table.lock().await;
        let found = table
            .rows
            .values()
            .find(|row| filter.is_none_or(|f| f.matches(*row)))
            .cloned();
        Ok(found)
    }

    async fn find_all(&self, filter: Option<&Filter<T::Column>>) -> Result<Vec<T>, StoreError> {
        let table = self.table.lock().await;
        let rows = table
            .rows
            .values()
            .filter(|row| filter.is_none_or(|f| f.matches(*row)))
            .cloned()
            .collect();
        Ok(rows)
    }
}

/// Transazione sullo store in memoria.
pub struct InMemoryTransaction<T> {
    guard: OwnedMutexGuard<MemoryTable<T>>,
    staged: MemoryTable<T>,
}

impl<T: Entity> StoreTransaction<T> for InMemoryTransaction<T> {
    async fn insert(&mut self, entity: &T) -> Result<i32, StoreError> {
        check_unique(&self.staged.rows, entity, None)?;

        let id = self.staged.next_id;
        self.staged.next_id = id.checked_add(1).ok_or_else(|| {
            StoreError::Constraint(format!("identifier overflow in table '{}'", T::TABLE))
        })?;

        let mut row = entity.clone();
        row.set_id(id);
        self.staged.rows.insert(id, row);

        debug!(table = T::TABLE, id, "Staged insert");
        Ok(id)
    }

    async fn replace(&mut self, entity: &T) -> Result<bool, StoreError> {
        if !self.staged.rows.contains_key(&entity.id()) {
            return Ok(false);
        }
        check_unique(&self.staged.rows, entity, Some(entity.id()))?;

        let Some(stored) = self.staged.rows.get_mut(&entity.id()) else {
            return Ok(false);
        };
        for column in T::updatable_columns() {
            stored.set_field(*column, entity.field(*column))?;
        }
        Ok(true)
    }

    async fn delete(&mut self, id: i32) -> Result<bool, StoreError> {
        Ok(self.staged.rows.remove(&id).is_some())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let InMemoryTransaction { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }
}

/// Rifiuta la scrittura se un'altra riga ha già lo stesso valore in una
/// colonna unica. Il controllo gira sotto il lock della transazione.
fn check_unique<T: Entity>(
    rows: &BTreeMap<i32, T>,
    entity: &T,
    except_id: Option<i32>,
) -> Result<(), StoreError> {
    for column in T::unique_columns() {
        let value = entity.field(*column);
        let clash = rows
            .values()
            .filter(|row| Some(row.id()) != except_id)
            .any(|row| match (&row.field(*column), &value) {
                (FieldValue::Text(a), FieldValue::Text(b)) => eq_ignore_case(a, b),
                (a, b) => a == b,
            });
        if clash {
            return Err(StoreError::Duplicate(format!(
                "value {:?} already used in column '{}' of table '{}'",
                value,
                column.name(),
                T::TABLE
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Villa, VillaColumn};

    fn villa(name: &str) -> Villa {
        Villa {
            name: name.to_string(),
            rate: 100.0,
            ..Villa::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = InMemoryStore::<Villa>::new();

        let mut tx = store.begin().await.unwrap();
        let first = tx.insert(&villa("A")).await.unwrap();
        let second = tx.insert(&villa("B")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!((first, second), (1, 2));
        let all = store.find_all(None).await.unwrap();
        assert_eq!(all.iter().map(|v| v.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = InMemoryStore::<Villa>::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert(&villa("Ghost")).await.unwrap();
            // nessun commit
        }

        assert!(store.find_all(None).await.unwrap().is_empty());

        // l'id non viene consumato da una transazione annullata
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.insert(&villa("Real")).await.unwrap(), 1);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_keeps_created_at() {
        let store = InMemoryStore::<Villa>::new();
        let created_at = chrono::Utc::now() - chrono::Duration::days(3);

        let mut tx = store.begin().await.unwrap();
        let id = tx
            .insert(&Villa {
                created_at,
                ..villa("Old")
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let replacement = Villa {
            id,
            created_at: chrono::Utc::now(),
            ..villa("New")
        };
        let mut tx = store.begin().await.unwrap();
        assert!(tx.replace(&replacement).await.unwrap());
        tx.commit().await.unwrap();

        let stored = store.find_first(Some(&Filter::Id(id))).await.unwrap().unwrap();
        assert_eq!(stored.name, "New");
        assert_eq!(stored.created_at, created_at);
    }

    #[tokio::test]
    async fn test_replace_and_delete_missing_row() {
        let store = InMemoryStore::<Villa>::new();
        let mut tx = store.begin().await.unwrap();

        assert!(!tx.replace(&Villa { id: 42, ..villa("X") }).await.unwrap());
        assert!(!tx.delete(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_first_with_filter() {
        let store = InMemoryStore::<Villa>::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&villa("Casa Blu")).await.unwrap();
        tx.insert(&villa("Casa Rossa")).await.unwrap();
        tx.commit().await.unwrap();

        let filter = Filter::EqIgnoreCase(VillaColumn::Name, "casa rossa".into());
        let found = store.find_first(Some(&filter)).await.unwrap().unwrap();
        assert_eq!(found.id, 2);

        let first = store.find_first(None).await.unwrap().unwrap();
        assert_eq!(first.name, "Casa Blu");
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_name_ignoring_case() {
        let store = InMemoryStore::<Villa>::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&villa("Sunset Villa")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx.insert(&villa("SUNSET VILLA")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref detail) if detail.contains("SUNSET VILLA")));
        drop(tx);

        assert_eq!(store.find_all(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_rejects_name_of_other_row() {
        let store = InMemoryStore::<Villa>::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&villa("Casa Blu")).await.unwrap();
        let id = tx.insert(&villa("Casa Rossa")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .replace(&Villa { id, ..villa("casa blu") })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // la riga può tenere il proprio nome, anche cambiando maiuscole
        assert!(tx.replace(&Villa { id, ..villa("CASA ROSSA") }).await.unwrap());
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_reports_identifier_overflow() {
        let store = InMemoryStore::<Villa>::new();
        store.table.lock().await.next_id = i32::MAX;

        let mut tx = store.begin().await.unwrap();
        let err = tx.insert(&villa("Last")).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(ref detail) if detail.contains("overflow")));
        drop(tx);

        assert!(store.find_all(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_rows() {
        let store = InMemoryStore::<Villa>::new();
        let other = store.clone();

        let mut tx = store.begin().await.unwrap();
        tx.insert(&villa("Shared")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(other.find_all(None).await.unwrap().len(), 1);
    }
}
