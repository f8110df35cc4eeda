//! Repositories module - accesso ai dati persistiti
//!
//! Il repository è generico sul tipo di entità e parla con uno store astratto
//! (`EntityStore`). Gli store disponibili sono due:
//! - `MySqlStore`: produzione, su un pool MySQL di sqlx
//! - `InMemoryStore`: una `BTreeMap` indicizzata per id, per test e sviluppo
//!
//! Nessun altro componente scrive sullo store: tutte le scritture passano da
//! `Repository::create`, `Repository::update` e `Repository::remove`.

// ************************* NOTA SU SQLX ************************* //

/*
   Niente query! / query_as! qui: il controllo statico dei macro vuole SQL
   scritto a mano per ogni tabella, mentre lo store MySQL costruisce le query
   a partire dal trait Entity (tabella, colonne, valori).
   Si usa QueryBuilder con push_bind per ogni valore, mai format! sui dati.
   Le righe tornano come MySqlRow e vengono decodificate con FromRow
   (derive sull'entity, feature "macros" di sqlx).
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod memory;
pub mod mysql;
pub mod repository;
pub mod traits;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Column, Entity, EntityStore, FieldValue, Filter, StoreTransaction};

pub use memory::{InMemoryStore, InMemoryTransaction};
pub use mysql::{MySqlStore, MySqlTransaction};
pub use repository::{PendingWrite, Repository, Tracked, WriteOutcome};

use crate::entities::Villa;

/// Repository delle ville sullo store `S`
pub type VillaRepository<S> = Repository<Villa, S>;
