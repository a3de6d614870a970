//! HTTP API for guest records.

mod extract;
mod handlers;
mod middleware;
mod types;

pub use extract::ApiJson;
pub use handlers::*;
pub use middleware::{
    debug_headers_middleware, logging_middleware, rate_limit_middleware, require_token,
    RateLimitState, DEBUG_TIME_HEADER,
};
pub use types::*;

use crate::auth::{AuthGateway, AuthTables};
use crate::error::ApiError;
use crate::store::{Store, Table};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use guest_core::{
    Country, CountryDirectory, CountrySeed, GuestRepository, GuestTable, PhoneNumberResolver,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Seeded countries, read-only after startup
    pub countries: Arc<CountryDirectory>,
    /// Guest records
    pub guests: Arc<RwLock<GuestRepository>>,
    /// API users and tokens
    pub auth: Arc<RwLock<AuthGateway>>,
    /// Persistent storage backend
    pub store: Arc<Store>,
}

impl AppState {
    /// Create state from already-built parts.
    pub fn new(
        countries: Arc<CountryDirectory>,
        guests: GuestRepository,
        auth: AuthGateway,
        store: Store,
    ) -> Self {
        Self {
            countries,
            guests: Arc::new(RwLock::new(guests)),
            auth: Arc::new(RwLock::new(auth)),
            store: Arc::new(store),
        }
    }

    /// Restore state from the store.
    ///
    /// Countries are seeded from `dataset_path` (or the bundled dataset) and
    /// saved only when no countries table has been persisted yet.
    pub async fn load(store: Store, dataset_path: Option<&Path>) -> Result<Self, ApiError> {
        let countries = match store.load::<Vec<Country>>(Table::Countries).await? {
            Some(records) if !records.is_empty() => CountryDirectory::from_records(records),
            _ => {
                let seeds = match dataset_path {
                    Some(path) => CountrySeed::load(path),
                    None => CountrySeed::bundled(),
                }
                .map_err(|e| ApiError::Internal(e.to_string()))?;

                let directory = CountryDirectory::seed(seeds);
                store.save(Table::Countries, &directory.all()).await?;
                directory
            }
        };
        let countries = Arc::new(countries);

        let guests = store
            .load::<GuestTable>(Table::Guests)
            .await?
            .unwrap_or_default();
        let guests =
            GuestRepository::from_table(guests, countries.clone(), PhoneNumberResolver::new())?;

        let auth = store
            .load::<AuthTables>(Table::Auth)
            .await?
            .unwrap_or_default();
        let auth = AuthGateway::from_tables(auth)?;

        info!(
            countries = countries.len(),
            guests = guests.count(),
            users = auth.user_count(),
            "Application state loaded"
        );

        Ok(Self::new(countries, guests, auth, store))
    }
}

/// Create the API router with the default rate limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(60))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let protected = Router::new()
        .route("/v1/logout", get(handlers::logout))
        .route("/v1/user", get(handlers::current_user))
        .route("/v1/countries", get(handlers::list_countries))
        .route(
            "/v1/guests",
            get(handlers::list_guests).post(handlers::create_guest),
        )
        .route(
            "/v1/guests/:id",
            get(handlers::show_guest)
                .put(handlers::update_guest)
                .patch(handlers::update_guest)
                .delete(handlers::delete_guest),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_token,
        ));

    let v1 = Router::new()
        .route("/v1/register", post(handlers::register))
        .route("/v1/login", post(handlers::login))
        .merge(protected)
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        .merge(v1)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wrap a router so every response carries the `X-Debug-Time` header.
pub fn with_debug_headers(router: Router) -> Router {
    router.layer(axum_middleware::from_fn(debug_headers_middleware))
}
