//! HTTP request handlers.
//!
//! Mutations run against a copy of the table. The copy replaces the shared
//! state only once it has been saved, so a failed save leaves nothing behind.

use super::types::{
    CountryResource, DataResponse, GuestResource, HealthResponse, LoginResponse, MessageResponse,
    UserResource,
};
use super::{ApiJson, AppState};
use crate::auth::{AuthenticatedUser, Credentials, RegisterUser};
use crate::error::ApiError;
use crate::store::Table;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use guest_core::{GuestInput, GuestPatch};
use tracing::info;

/// Ids that do not parse are treated like ids that do not exist.
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let guests = state.guests.read().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        guests: guests.count(),
        countries: state.countries.len(),
    })
}

/// Register a new API user.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterUser>,
) -> Result<(StatusCode, Json<UserResource>), ApiError> {
    let mut auth = state.auth.write().await;
    let mut next = auth.clone();
    let user = next.register(request)?;
    state.store.save(Table::Auth, next.tables()).await?;
    *auth = next;

    Ok((StatusCode::CREATED, Json(UserResource::from(&user))))
}

/// Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut auth = state.auth.write().await;
    let mut next = auth.clone();
    let (user, token) = next.login(request)?;
    state.store.save(Table::Auth, next.tables()).await?;
    *auth = next;

    Ok(Json(LoginResponse {
        user: UserResource::from(&user),
        token,
    }))
}

/// Revoke the token used for this request.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<AuthenticatedUser>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut auth = state.auth.write().await;
    let mut next = auth.clone();
    next.logout(current.token_id);
    state.store.save(Table::Auth, next.tables()).await?;
    *auth = next;

    Ok(Json(MessageResponse::new("Token removed")))
}

/// The authenticated user.
pub async fn current_user(Extension(current): Extension<AuthenticatedUser>) -> Json<UserResource> {
    Json(UserResource::from(&current.user))
}

/// List every country in id order.
pub async fn list_countries(
    State(state): State<AppState>,
) -> Json<DataResponse<Vec<CountryResource>>> {
    let countries = state
        .countries
        .all()
        .iter()
        .map(CountryResource::from)
        .collect();

    Json(DataResponse::new(countries))
}

/// List every guest in insertion order.
pub async fn list_guests(State(state): State<AppState>) -> Json<DataResponse<Vec<GuestResource>>> {
    let guests = state.guests.read().await;
    let data = guests.list().into_iter().map(GuestResource::from).collect();

    Json(DataResponse::new(data))
}

/// Create a guest, resolving its country from the phone number when needed.
pub async fn create_guest(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GuestInput>,
) -> Result<(StatusCode, Json<DataResponse<GuestResource>>), ApiError> {
    let mut guests = state.guests.write().await;
    let mut next = guests.clone();
    let guest = next.create(request)?;
    state.store.save(Table::Guests, next.table()).await?;
    *guests = next;

    info!(guest_id = guest.id, "Guest created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(GuestResource::from(guest))),
    ))
}

/// Show a single guest.
pub async fn show_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<GuestResource>>, ApiError> {
    let id = parse_id(&id)?;
    let guest = state.guests.read().await.get(id)?;

    Ok(Json(DataResponse::new(GuestResource::from(guest))))
}

/// Update any subset of a guest's fields.
pub async fn update_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<GuestPatch>,
) -> Result<Json<DataResponse<GuestResource>>, ApiError> {
    let id = parse_id(&id)?;
    let mut guests = state.guests.write().await;
    let mut next = guests.clone();
    let guest = next.update(id, request)?;
    state.store.save(Table::Guests, next.table()).await?;
    *guests = next;

    info!(guest_id = guest.id, "Guest updated");
    Ok(Json(DataResponse::new(GuestResource::from(guest))))
}

/// Delete a guest.
pub async fn delete_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut guests = state.guests.write().await;
    let mut next = guests.clone();
    next.delete(id)?;
    state.store.save(Table::Guests, next.table()).await?;
    *guests = next;

    info!(guest_id = id, "Guest deleted");
    Ok(Json(MessageResponse::new("Success")))
}
