//! API response types.

use crate::auth::User;
use chrono::{DateTime, Utc};
use guest_core::{Country, Guest};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub guests: usize,
    pub countries: usize,
}

/// `{"data": ...}` envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// `{"message": ...}` body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// User as exposed over HTTP. The password hash never leaves the service.
#[derive(Debug, Serialize)]
pub struct UserResource {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResource {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResource,
    pub token: String,
}

/// Guest as exposed over HTTP.
#[derive(Debug, Serialize)]
pub struct GuestResource {
    pub id: u64,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub email: Option<String>,
    pub country_id: Option<u64>,
}

impl From<Guest> for GuestResource {
    fn from(guest: Guest) -> Self {
        Self {
            id: guest.id,
            firstname: guest.firstname,
            lastname: guest.lastname,
            phone: guest.phone,
            email: guest.email,
            country_id: guest.country_id,
        }
    }
}

/// Country as exposed over HTTP. The region code stays internal.
#[derive(Debug, Serialize)]
pub struct CountryResource {
    pub id: u64,
    pub dial_code: String,
    pub name: String,
}

impl From<&Country> for CountryResource {
    fn from(country: &Country) -> Self {
        Self {
            id: country.id,
            dial_code: country.dial_code.clone(),
            name: country.name.clone(),
        }
    }
}
