//! Guest records and the phone-number-to-country resolution behind them.
//!
//! - [`PhoneNumberResolver`] turns a raw phone number into a dial code.
//! - [`CountryDirectory`] maps dial codes to seeded countries.
//! - [`GuestRepository`] stores guests, resolving their country on creation.

mod countries;
mod error;
mod guests;
mod phone;
mod types;

pub use countries::{Country, CountryDirectory, CountryLookup, CountrySeed};
pub use error::{CountryError, FieldErrors, GuestError};
pub use guests::{GuestRepository, GuestTable};
pub use phone::{DialCode, PhoneNumberResolver};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_input_deserialization() {
        let json = r#"{
            "firstname": "Ada",
            "lastname": "Lovelace",
            "phone": "+14155552671",
            "country_id": 3
        }"#;

        let input: GuestInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.firstname.as_deref(), Some("Ada"));
        assert!(input.email.is_none());
        assert_eq!(input.country_id, Some(3));
    }

    #[test]
    fn test_guest_input_normalization() {
        let input = GuestInput {
            firstname: Some(" Ada ".into()),
            lastname: Some("".into()),
            phone: Some("\t+14155552671\n".into()),
            email: None,
            country_id: None,
        }
        .normalized();

        assert_eq!(input.firstname.as_deref(), Some("Ada"));
        assert!(input.lastname.is_none());
        assert_eq!(input.phone.as_deref(), Some("+14155552671"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_PATTERN.is_match("+14155552671"));
        assert!(PHONE_PATTERN.is_match("14155552671"));
        assert!(PHONE_PATTERN.is_match("00000"));
        assert!(!PHONE_PATTERN.is_match("0000"));
        assert!(!PHONE_PATTERN.is_match("+1 415 555 2671"));
        assert!(!PHONE_PATTERN.is_match("+123456789012345678"));
    }

    #[test]
    fn test_guest_patch_allows_empty() {
        let patch = GuestPatch::default();
        assert!(patch.is_empty());
        assert!(patch.errors().is_empty());
    }

    #[test]
    fn test_guest_patch_validates_present_fields() {
        let patch = GuestPatch {
            email: Some(Some("nope".into())),
            ..Default::default()
        };
        let errors = patch.errors();
        assert_eq!(
            errors.messages("email"),
            ["The email must be a valid email address."]
        );
        assert!(!errors.contains("firstname"));
    }

    #[test]
    fn test_guest_patch_email_presence() {
        let absent: GuestPatch = serde_json::from_str(r#"{"firstname": "Ada"}"#).unwrap();
        assert!(absent.email.is_none());

        let null: GuestPatch = serde_json::from_str(r#"{"email": null}"#).unwrap();
        assert_eq!(null.email, Some(None));
        assert!(!null.is_empty());

        let blank = GuestPatch {
            email: Some(Some(" ".into())),
            ..Default::default()
        }
        .normalized();
        assert_eq!(blank.email, Some(None));
    }

    #[test]
    fn test_guest_patch_keeps_blank_names() {
        let patch = GuestPatch {
            lastname: Some("  ".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(patch.lastname.as_deref(), Some(""));
        assert_eq!(
            patch.errors().messages("lastname"),
            ["The lastname field is required."]
        );
    }

    #[test]
    fn test_field_errors_replace() {
        let mut errors = FieldErrors::new();
        errors.add("phone", "The phone format is invalid.");
        errors.replace("phone", "The phone field is required.");
        assert_eq!(errors.messages("phone"), ["The phone field is required."]);
    }

    #[test]
    fn test_field_errors_serialization() {
        let mut errors = FieldErrors::new();
        errors.add("phone", "The phone format is invalid.");
        errors.add("firstname", "The firstname field is required.");

        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(
            json,
            r#"{"firstname":["The firstname field is required."],"phone":["The phone format is invalid."]}"#
        );
    }

    #[test]
    fn test_field_errors_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.add("email", "bad");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_guest_serialization() {
        let guest = Guest {
            id: 1,
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            phone: "+14155552671".into(),
            email: None,
            country_id: Some(230),
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            updated_at: "2024-01-01T00:00:00Z".parse().unwrap(),
        };

        let json = serde_json::to_string(&guest).unwrap();
        assert!(json.contains("\"firstname\":\"Ada\""));
        assert!(json.contains("\"email\":null"));
        assert!(json.contains("\"country_id\":230"));

        let restored: Guest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, guest);
    }
}
