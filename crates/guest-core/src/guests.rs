//! Guest repository: CRUD over guest records with country resolution.

use crate::countries::{CountryDirectory, CountryLookup};
use crate::error::{FieldErrors, GuestError};
use crate::phone::PhoneNumberResolver;
use crate::types::{Guest, GuestInput, GuestPatch};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

const COUNTRY_INVALID: &str = "The selected country id is invalid.";

/// Guest rows in insertion order plus the id counter.
///
/// Ids are never reused, so insertion order is also id order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestTable {
    #[serde(default)]
    rows: Vec<Guest>,
    #[serde(default = "first_id")]
    next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for GuestTable {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: first_id(),
        }
    }
}

impl GuestTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.rows.binary_search_by_key(&id, |g| g.id).ok()
    }

    fn allocate_id(&mut self) -> Result<u64, GuestError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(GuestError::IdsExhausted)?;
        Ok(id)
    }

    /// Restore ordering and counter invariants after loading from disk.
    fn repaired(mut self) -> Result<Self, GuestError> {
        self.rows.sort_by_key(|g| g.id);
        self.rows.dedup_by_key(|g| g.id);
        if let Some(last) = self.rows.last() {
            let floor = last.id.checked_add(1).ok_or(GuestError::IdsExhausted)?;
            self.next_id = self.next_id.max(floor);
        }
        Ok(self)
    }
}

/// Guest storage backed by an in-memory table.
///
/// Country resolution goes through the injected [`CountryDirectory`] and
/// [`PhoneNumberResolver`].
#[derive(Debug, Clone)]
pub struct GuestRepository {
    table: GuestTable,
    directory: Arc<CountryDirectory>,
    resolver: PhoneNumberResolver,
}

impl GuestRepository {
    /// Create an empty repository.
    pub fn new(directory: Arc<CountryDirectory>) -> Self {
        Self {
            table: GuestTable::new(),
            directory,
            resolver: PhoneNumberResolver::new(),
        }
    }

    /// Create a repository over previously stored rows.
    ///
    /// Fails with [`GuestError::IdsExhausted`] when the stored ids leave no
    /// room for another guest.
    pub fn from_table(
        table: GuestTable,
        directory: Arc<CountryDirectory>,
        resolver: PhoneNumberResolver,
    ) -> Result<Self, GuestError> {
        Ok(Self {
            table: table.repaired()?,
            directory,
            resolver,
        })
    }

    /// Underlying rows, for persistence.
    pub fn table(&self) -> &GuestTable {
        &self.table
    }

    pub fn directory(&self) -> &CountryDirectory {
        &self.directory
    }

    pub fn count(&self) -> usize {
        self.table.len()
    }

    /// All guests in insertion order.
    pub fn list(&self) -> Vec<Guest> {
        self.table.rows.clone()
    }

    /// Get a guest by id.
    pub fn get(&self, id: u64) -> Result<Guest, GuestError> {
        self.table
            .position(id)
            .map(|i| self.table.rows[i].clone())
            .ok_or(GuestError::NotFound(id))
    }

    /// Validate and store a new guest.
    ///
    /// Without an explicit `country_id` the country is resolved from the
    /// phone number; if that fails nothing is stored and
    /// [`GuestError::UnresolvedCountry`] is returned.
    #[instrument(skip(self, input))]
    pub fn create(&mut self, input: GuestInput) -> Result<Guest, GuestError> {
        let input = input.normalized();

        let mut errors = match input.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };
        self.check_country(input.country_id, &mut errors);
        errors.into_result()?;

        // Required fields are present once validation has passed.
        let phone = input.phone.unwrap_or_default();
        let country_id = match input.country_id {
            Some(id) => id,
            None => self.resolve_country(&phone)?,
        };

        let now = Utc::now();
        let guest = Guest {
            id: self.table.allocate_id()?,
            firstname: input.firstname.unwrap_or_default(),
            lastname: input.lastname.unwrap_or_default(),
            phone,
            email: input.email,
            country_id: Some(country_id),
            created_at: now,
            updated_at: now,
        };
        self.table.rows.push(guest.clone());

        info!(guest_id = guest.id, country_id, "Guest created");
        Ok(guest)
    }

    /// Merge the supplied fields over an existing guest.
    ///
    /// Changing the phone number leaves `country_id` untouched. A supplied
    /// blank name or phone is rejected; a blank or null email clears it.
    #[instrument(skip(self, patch))]
    pub fn update(&mut self, id: u64, patch: GuestPatch) -> Result<Guest, GuestError> {
        let index = self.table.position(id).ok_or(GuestError::NotFound(id))?;
        let patch = patch.normalized();

        let mut errors = patch.errors();
        self.check_country(patch.country_id, &mut errors);
        errors.into_result()?;

        if patch.is_empty() {
            debug!(guest_id = id, "Empty update, nothing to change");
            return Ok(self.table.rows[index].clone());
        }

        let guest = &mut self.table.rows[index];
        if let Some(firstname) = patch.firstname {
            guest.firstname = firstname;
        }
        if let Some(lastname) = patch.lastname {
            guest.lastname = lastname;
        }
        if let Some(phone) = patch.phone {
            guest.phone = phone;
        }
        if let Some(email) = patch.email {
            guest.email = email;
        }
        if let Some(country_id) = patch.country_id {
            guest.country_id = Some(country_id);
        }
        guest.updated_at = Utc::now();

        info!(guest_id = id, "Guest updated");
        Ok(guest.clone())
    }

    /// Remove a guest.
    #[instrument(skip(self))]
    pub fn delete(&mut self, id: u64) -> Result<(), GuestError> {
        let index = self.table.position(id).ok_or(GuestError::NotFound(id))?;
        self.table.rows.remove(index);
        info!(guest_id = id, "Guest deleted");
        Ok(())
    }

    fn check_country(&self, country_id: Option<u64>, errors: &mut FieldErrors) {
        if let Some(id) = country_id {
            if !self.directory.contains(id) {
                errors.add("country_id", COUNTRY_INVALID);
            }
        }
    }

    fn resolve_country(&self, phone: &str) -> Result<u64, GuestError> {
        let Some(dial) = self.resolver.resolve(phone) else {
            warn!(%phone, "Cannot resolve dial code from phone number");
            return Err(GuestError::UnresolvedCountry(phone.to_string()));
        };

        match self.directory.lookup(&dial) {
            CountryLookup::Found(id) => Ok(id),
            CountryLookup::NotFound => {
                warn!(%phone, dial_code = %dial.code, "Dial code has no country");
                Err(GuestError::UnresolvedCountry(phone.to_string()))
            }
        }
    }
}
