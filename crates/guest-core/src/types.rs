//! Guest record and input types.

use crate::error::FieldErrors;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;
use validator::{Validate, ValidateEmail};

const EMAIL_INVALID: &str = "The email must be a valid email address.";

/// Optional leading "+", a 1-3 digit calling code, then 4-14 digits.
pub static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{1,3}\d{4,14}$").expect("phone pattern is valid"));

/// A stored guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: u64,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub email: Option<String>,
    pub country_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a guest.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GuestInput {
    #[validate(
        required(message = "The firstname field is required."),
        length(max = 64, message = "The firstname must not be greater than 64 characters.")
    )]
    pub firstname: Option<String>,

    #[validate(
        required(message = "The lastname field is required."),
        length(max = 64, message = "The lastname must not be greater than 64 characters.")
    )]
    pub lastname: Option<String>,

    #[validate(
        required(message = "The phone field is required."),
        length(max = 18, message = "The phone must not be greater than 18 characters."),
        regex(path = *PHONE_PATTERN, message = "The phone format is invalid.")
    )]
    pub phone: Option<String>,

    #[validate(email(message = "The email must be a valid email address."))]
    pub email: Option<String>,

    pub country_id: Option<u64>,
}

impl GuestInput {
    /// Trim strings and treat blank values as absent.
    pub fn normalized(self) -> Self {
        Self {
            firstname: normalize(self.firstname),
            lastname: normalize(self.lastname),
            phone: normalize(self.phone),
            email: normalize(self.email),
            country_id: self.country_id,
        }
    }
}

/// Partial update of a guest. Absent fields are left untouched.
///
/// `email` tells an absent key (`None`) apart from an explicit `null` or
/// blank value (`Some(None)`), which clears the stored address.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GuestPatch {
    #[validate(length(max = 64, message = "The firstname must not be greater than 64 characters."))]
    pub firstname: Option<String>,

    #[validate(length(max = 64, message = "The lastname must not be greater than 64 characters."))]
    pub lastname: Option<String>,

    #[validate(
        length(max = 18, message = "The phone must not be greater than 18 characters."),
        regex(path = *PHONE_PATTERN, message = "The phone format is invalid.")
    )]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "supplied")]
    pub email: Option<Option<String>>,

    pub country_id: Option<u64>,
}

impl GuestPatch {
    /// Trim supplied strings. Blank names and phones are kept so they can be
    /// rejected; a blank email becomes a clear.
    pub fn normalized(self) -> Self {
        Self {
            firstname: self.firstname.map(|v| v.trim().to_string()),
            lastname: self.lastname.map(|v| v.trim().to_string()),
            phone: self.phone.map(|v| v.trim().to_string()),
            email: self.email.map(normalize),
            country_id: self.country_id,
        }
    }

    /// Field errors for a normalized patch.
    pub fn errors(&self) -> FieldErrors {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };

        if let Some(Some(email)) = &self.email {
            if !email.validate_email() {
                errors.add("email", EMAIL_INVALID);
            }
        }

        // A supplied required field may not be blanked out.
        for (field, value) in [
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("phone", &self.phone),
        ] {
            if value.as_deref() == Some("") {
                errors.replace(field, format!("The {} field is required.", field));
            }
        }

        errors
    }

    pub fn is_empty(&self) -> bool {
        self.firstname.is_none()
            && self.lastname.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.country_id.is_none()
    }
}

/// Deserialize a present key, `null` included, as `Some`.
fn supplied<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
