//! Villa services - Gestione ville
//!
//! Ogni handler risponde con un `ApiResponse`. Gli errori dello store vengono
//! catturati qui e trasformati in envelope di fallimento: sul percorso di
//! lettura (list, get, create) lo status HTTP resta 200, sul percorso di
//! scrittura (delete, put, patch) diventa 400. `RowNotFound` è sempre 404.

use crate::core::{AppError, AppState, StoreError};
use crate::dtos::{ApiResponse, CreateVillaDTO, UpdateVillaDTO, VillaDTO, VillaId};
use crate::entities::{Villa, VillaColumn};
use crate::patch::PatchDocument;
use crate::repositories::{EntityStore, Filter};
use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state))]
pub async fn list_villas<S: EntityStore<Villa>>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ApiResponse<Vec<VillaDTO>>>, AppError> {
    debug!("Listing all villas");
    let villas = state.villa.get_all(None).await?;
    info!("Found {} villas", villas.len());

    let villas_dto = villas
        .into_iter()
        .map(|villa| VillaDTO::from(villa.into_inner()))
        .collect::<Vec<_>>();
    Ok(Json(ApiResponse::ok(villas_dto)))
}

#[instrument(skip(state), fields(villa_id = %villa_id))]
pub async fn get_villa<S: EntityStore<Villa>>(
    State(state): State<Arc<AppState<S>>>,
    VillaId(villa_id): VillaId,
) -> Result<Json<ApiResponse<VillaDTO>>, AppError> {
    debug!("Fetching villa by ID");
    let villa = state
        .villa
        .get_one(Some(&Filter::Id(villa_id)))
        .await?
        .ok_or_else(|| {
            warn!("Villa not found");
            AppError::not_found(format!("Villa with id {} not found", villa_id))
        })?;

    Ok(Json(ApiResponse::ok(VillaDTO::from(villa.into_inner()))))
}

#[instrument(skip(state, payload))]
pub async fn create_villa<S: EntityStore<Villa>>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateVillaDTO>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload.inspect_err(|rejection| {
        warn!(reason = %rejection.body_text(), "Rejected villa creation body");
    })?;
    body.validate()?;
    debug!(name = %body.name, "Creating villa");

    // 1. Il nome deve essere unico, senza distinguere maiuscole e minuscole
    let duplicate = state
        .villa
        .get_one_detached(Some(&Filter::EqIgnoreCase(
            VillaColumn::Name,
            body.name.clone(),
        )))
        .await?;
    if duplicate.is_some() {
        warn!(name = %body.name, "Villa name already taken");
        return Err(name_taken(&body.name));
    }

    // 2. Inserire la villa con i timestamp del server. Lo store ricontrolla
    //    il nome dentro la transazione: due create concorrenti passano
    //    entrambe il punto 1, solo una arriva qui senza errore.
    let name = body.name.clone();
    let created = state
        .villa
        .create(body.into_entity(Utc::now()))
        .await
        .map_err(|err| store_failure(err, &name, false))?;
    info!(villa_id = created.id, "Villa created");

    // 3. 201 con Location verso la get della nuova villa
    let location = format!("/villa/{}", created.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ApiResponse::created(VillaDTO::from(created))),
    ))
}

#[instrument(skip(state), fields(villa_id = %villa_id))]
pub async fn delete_villa<S: EntityStore<Villa>>(
    State(state): State<Arc<AppState<S>>>,
    VillaId(villa_id): VillaId,
) -> Result<Json<ApiResponse>, AppError> {
    debug!("Deleting villa");
    let villa = state
        .villa
        .get_one(Some(&Filter::Id(villa_id)))
        .await
        .map_err(AppError::write_failure)?
        .ok_or_else(|| {
            warn!("Villa not found");
            AppError::not_found(format!("Villa with id {} not found", villa_id))
        })?;

    state
        .villa
        .remove(villa)
        .await
        .map_err(AppError::write_failure)?;
    info!("Villa deleted");

    Ok(Json(ApiResponse::no_content()))
}

#[instrument(skip(state, payload), fields(villa_id = %villa_id))]
pub async fn update_villa<S: EntityStore<Villa>>(
    State(state): State<Arc<AppState<S>>>,
    VillaId(villa_id): VillaId,
    payload: Result<Json<UpdateVillaDTO>, JsonRejection>,
) -> Result<Json<ApiResponse>, AppError> {
    let Json(body) = payload.inspect_err(|rejection| {
        warn!(reason = %rejection.body_text(), "Rejected villa update body");
    })?;
    debug!("Replacing villa");

    validate_update(&state, villa_id, &body).await?;

    // created_at non viene riscritto dallo store: il valore qui è indifferente
    let now = Utc::now();
    let name = body.name.clone();
    state
        .villa
        .update(&body.into_entity(now, now))
        .await
        .map_err(|err| store_failure(err, &name, true))?;
    info!("Villa replaced");

    Ok(Json(ApiResponse::no_content()))
}

#[instrument(skip(state, payload), fields(villa_id = %villa_id))]
pub async fn patch_villa<S: EntityStore<Villa>>(
    State(state): State<Arc<AppState<S>>>,
    VillaId(villa_id): VillaId,
    payload: Result<Json<PatchDocument>, JsonRejection>,
) -> Result<Json<ApiResponse>, AppError> {
    let Json(patch) = payload.inspect_err(|rejection| {
        warn!(reason = %rejection.body_text(), "Rejected patch document");
    })?;
    debug!(operations = patch.operations().len(), "Patching villa");

    // 1. La villa deve esistere prima di applicare qualsiasi operazione
    let existing = state
        .villa
        .get_one_detached(Some(&Filter::Id(villa_id)))
        .await
        .map_err(AppError::write_failure)?
        .ok_or_else(|| {
            warn!("Villa not found");
            AppError::not_found(format!("Villa with id {} not found", villa_id))
        })?;
    let created_at = existing.created_at;

    // 2. Applicare la patch sulla forma di update
    let patched = patch
        .apply_to(&UpdateVillaDTO::from(existing))
        .inspect_err(|errors| warn!(count = errors.len(), "Patch rejected"))?;

    // 3. Stesse regole della put
    validate_update(&state, villa_id, &patched).await?;

    let name = patched.name.clone();
    state
        .villa
        .update(&patched.into_entity(created_at, Utc::now()))
        .await
        .map_err(|err| store_failure(err, &name, true))?;
    info!("Villa patched");

    Ok(Json(ApiResponse::no_content()))
}

/// Regole comuni a put e patch: id coerente col path, campi validi,
/// nome non usato da un'altra villa.
async fn validate_update<S: EntityStore<Villa>>(
    state: &AppState<S>,
    villa_id: i32,
    body: &UpdateVillaDTO,
) -> Result<(), AppError> {
    if body.id != villa_id {
        warn!(body_id = body.id, "Body id does not match path id");
        return Err(AppError::bad_request(format!(
            "Villa id {} in body does not match id {} in path",
            body.id, villa_id
        )));
    }
    body.validate()?;

    let same_name = state
        .villa
        .get_all(Some(&Filter::EqIgnoreCase(
            VillaColumn::Name,
            body.name.clone(),
        )))
        .await
        .map_err(AppError::write_failure)?;
    if same_name.iter().any(|villa| villa.id != villa_id) {
        warn!(name = %body.name, "Villa name already taken");
        return Err(name_taken(&body.name));
    }
    Ok(())
}

fn name_taken(name: &str) -> AppError {
    AppError::bad_request(format!("A villa named '{}' already exists", name))
}

/// Errore dello store su una scrittura. Il vincolo di unicità sul nome dà lo
/// stesso 400 del controllo preventivo.
fn store_failure(err: StoreError, name: &str, write_path: bool) -> AppError {
    match err {
        StoreError::Duplicate(detail) => {
            warn!(villa_name = name, %detail, "Villa name taken by a concurrent write");
            name_taken(name)
        }
        other if write_path => AppError::write_failure(other),
        other => AppError::from(other),
    }
}
