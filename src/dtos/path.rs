//! Path DTOs - parametri estratti dall'URL

use crate::core::AppError;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use tracing::warn;

/// Id di una villa preso dal path `/villa/{id}`.
///
/// Un id non numerico o non positivo (0 è il valore sentinella non valido)
/// viene rifiutato con 400 prima che l'handler tocchi lo store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VillaId(pub i32);

impl<S> FromRequestParts<S> for VillaId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state).await?;

        if id <= 0 {
            warn!(id, "Rejected invalid villa id");
            return Err(AppError::bad_request(format!(
                "Invalid villa id {}: must be a positive integer",
                id
            )));
        }
        Ok(VillaId(id))
    }
}
