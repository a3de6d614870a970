//! Phone number to dial code resolution.

use phonenumber::country::Id;
use tracing::debug;

/// A calling code together with the region it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialCode {
    /// Formatted calling code, e.g. "+44".
    pub code: String,
    /// Region the number belongs to, e.g. `Id::GB`.
    pub region: Id,
}

impl DialCode {
    /// Whether an ISO 3166-1 alpha-2 code names this dial code's region.
    pub fn is_region(&self, iso_code: &str) -> bool {
        iso_code
            .trim()
            .to_ascii_uppercase()
            .parse::<Id>()
            .map(|id| id == self.region)
            .unwrap_or(false)
    }
}

/// Resolves raw phone numbers to international dial codes using the
/// libphonenumber metadata bundled with the `phonenumber` crate.
///
/// Numbers are parsed without a default region, so only numbers written in
/// international form ("+" followed by the calling code) resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneNumberResolver;

impl PhoneNumberResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a phone number to its dial code and region.
    ///
    /// Returns `None` for empty input, unparseable numbers and numbers that
    /// do not belong to a geographic region.
    pub fn resolve(&self, phone: &str) -> Option<DialCode> {
        let phone = phone.trim();
        if phone.is_empty() {
            return None;
        }

        let number = match phonenumber::parse(None, phone) {
            Ok(number) => number,
            Err(e) => {
                debug!(%phone, error = %e, "Phone number could not be parsed");
                return None;
            }
        };

        let country = number.country();
        let Some(region) = country.id() else {
            debug!(%phone, "Phone number has no geographic region");
            return None;
        };

        let code = country.code();
        if code == 0 {
            return None;
        }

        Some(DialCode {
            code: format!("+{}", code),
            region,
        })
    }

    /// Resolve a phone number to a dial code such as "+1".
    ///
    /// An empty string means the number could not be resolved.
    pub fn resolve_dial_code(&self, phone: &str) -> String {
        self.resolve(phone).map(|d| d.code).unwrap_or_default()
    }
}
