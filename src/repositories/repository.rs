//! Repository generico - unico accesso alle entità persistite di un tipo
//!
//! `Repository<T, S>` incapsula la costruzione dei filtri e le chiamate allo
//! store. Non cattura mai gli errori dello store: li propaga così come sono.

use super::{Entity, EntityStore, Filter, StoreTransaction};
use crate::core::StoreError;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use tracing::{debug, info, instrument};

/// Entità letta da questo repository (lettura "tracked").
///
/// Modificarla non salva nulla: serve sempre una chiamata esplicita a
/// [`Repository::update`]. È invece l'unico argomento accettato da
/// [`Repository::remove`], che così cancella solo righe già lette.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    entity: T,
}

impl<T> Tracked<T> {
    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.entity
    }
}

/// Singola scrittura eseguita da [`Repository::commit`]
#[derive(Debug)]
pub enum PendingWrite<'a, T> {
    Insert(&'a T),
    Replace(&'a T),
    Delete(i32),
}

/// Esito di una [`PendingWrite`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted(i32),
    Replaced(bool),
    Deleted(bool),
}

pub struct Repository<T, S> {
    store: S,
    _entity: PhantomData<fn() -> T>,
}

impl<T, S> Repository<T, S>
where
    T: Entity,
    S: EntityStore<T>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Inserisce una nuova entità
    ///
    /// # Returns
    /// * `Ok(T)` - L'entità con l'id assegnato dallo store
    #[instrument(skip(self, entity), fields(table = T::TABLE))]
    pub async fn create(&self, entity: T) -> Result<T, StoreError> {
        let mut created = entity;
        let outcome = self.commit(PendingWrite::Insert(&created)).await?;
        if let WriteOutcome::Inserted(id) = outcome {
            created.set_id(id);
        }
        info!(id = created.id(), "Entity created");
        Ok(created)
    }

    /// Prima entità che soddisfa il filtro (o la prima in assoluto senza filtro)
    #[instrument(skip(self), fields(table = T::TABLE, tracked = true))]
    pub async fn get_one(
        &self,
        filter: Option<&Filter<T::Column>>,
    ) -> Result<Option<Tracked<T>>, StoreError> {
        let entity = self.store.find_first(filter).await?;
        debug!(found = entity.is_some(), "Lookup completed");
        Ok(entity.map(|entity| Tracked { entity }))
    }

    /// Come [`get_one`](Self::get_one) ma restituisce una copia staccata,
    /// da usare nei flussi leggi-modifica-aggiorna (patch).
    #[instrument(skip(self), fields(table = T::TABLE, tracked = false))]
    pub async fn get_one_detached(
        &self,
        filter: Option<&Filter<T::Column>>,
    ) -> Result<Option<T>, StoreError> {
        let entity = self.store.find_first(filter).await?;
        debug!(found = entity.is_some(), "Lookup completed");
        Ok(entity)
    }

    /// Tutte le entità che soddisfano il filtro, nell'ordine dello store.
    /// Un risultato vuoto non è un errore.
    #[instrument(skip(self), fields(table = T::TABLE))]
    pub async fn get_all(
        &self,
        filter: Option<&Filter<T::Column>>,
    ) -> Result<Vec<Tracked<T>>, StoreError> {
        let entities = self.store.find_all(filter).await?;
        debug!(count = entities.len(), "Lookup completed");
        Ok(entities.into_iter().map(|entity| Tracked { entity }).collect())
    }

    /// Sostituisce la riga con lo stesso id dell'entità passata
    ///
    /// # Returns
    /// * `Err(StoreError::RowNotFound)` - Nessuna riga con quell'id
    #[instrument(skip(self, entity), fields(table = T::TABLE, id = entity.id()))]
    pub async fn update(&self, entity: &T) -> Result<(), StoreError> {
        match self.commit(PendingWrite::Replace(entity)).await? {
            WriteOutcome::Replaced(true) => {
                info!("Entity updated");
                Ok(())
            }
            _ => Err(StoreError::RowNotFound {
                table: T::TABLE,
                id: entity.id(),
            }),
        }
    }

    /// Cancella un'entità letta in precedenza da questo repository
    #[instrument(skip(self, entity), fields(table = T::TABLE, id = entity.id()))]
    pub async fn remove(&self, entity: Tracked<T>) -> Result<(), StoreError> {
        match self.commit(PendingWrite::Delete(entity.id())).await? {
            WriteOutcome::Deleted(true) => {
                info!("Entity removed");
                Ok(())
            }
            // cancellata da qualcun altro tra la lettura e la remove
            _ => Err(StoreError::RowNotFound {
                table: T::TABLE,
                id: entity.id(),
            }),
        }
    }

    /// Esegue una scrittura dentro una transazione dello store.
    ///
    /// La transazione viene confermata solo se la scrittura riesce; su ogni
    /// `?` viene droppata e quindi annullata.
    pub async fn commit(&self, write: PendingWrite<'_, T>) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.store.begin().await?;
        let outcome = match write {
            PendingWrite::Insert(entity) => WriteOutcome::Inserted(tx.insert(entity).await?),
            PendingWrite::Replace(entity) => WriteOutcome::Replaced(tx.replace(entity).await?),
            PendingWrite::Delete(id) => WriteOutcome::Deleted(tx.delete(id).await?),
        };
        tx.commit().await?;
        Ok(outcome)
    }
}
