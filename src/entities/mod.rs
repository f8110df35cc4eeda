//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene le entità che rappresentano i dati persistiti.
//! Ogni entity corrisponde a una tabella nel database e implementa il trait
//! `Entity` per essere gestita dal repository generico.

pub mod villa;

// Re-exports per facilitare l'import
pub use villa::{Villa, VillaColumn};
