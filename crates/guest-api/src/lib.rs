//! Guest API - REST service for guest contact records.
//!
//! Guests are stored with the country their phone number belongs to,
//! resolved from the number's calling code when the client does not
//! supply one. All `/v1` routes except registration and login require a
//! bearer token.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod store;

pub use auth::{AuthGateway, AuthError, AuthenticatedUser};
pub use config::Config;
pub use error::ApiError;
pub use store::{Store, Table};
