//! Application State - Stato globale dell'applicazione
//!
//! Contiene il repository delle ville, costruito sopra lo store scelto
//! all'avvio (MySQL in produzione, memoria nei test).

use crate::entities::Villa;
use crate::repositories::{EntityStore, VillaRepository};

/// Stato globale dell'applicazione condiviso tra tutte le route
pub struct AppState<S> {
    /// Repository per la gestione delle ville
    pub villa: VillaRepository<S>,
}

impl<S> AppState<S>
where
    S: EntityStore<Villa>,
{
    /// Crea una nuova istanza di AppState sopra lo store fornito
    ///
    /// # Arguments
    /// * `store` - Store delle ville (pool MySQL o tabella in memoria)
    pub fn new(store: S) -> Self {
        Self {
            villa: VillaRepository::new(store),
        }
    }
}
