//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod path;
pub mod response;
pub mod villa;

// Re-exports per facilitare l'import
pub use path::VillaId;
pub use response::{ApiResponse, ResponseStatus};
pub use villa::{CreateVillaDTO, UpdateVillaDTO, VillaDTO};
