//! In-memory user registry.
//!
//! Maps account address to the nonce that account must sign next. A single
//! readers-writer lock guards the whole table; every critical section is one
//! map operation, and callers do their signature and token work outside it.
//!
//! Keys are `Address` values, which are lowercase by construction, so two
//! spellings of the same account can never become two users.

use crate::error::AppError;
use crate::models::{Address, Nonce, UserRecord};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Concurrency-safe table of registered users.
///
/// Built once at startup and shared through `AppState` for the life of the
/// process.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<HashMap<Address, UserRecord>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user unless the address is already registered.
    ///
    /// Returns `AppError::Conflict` if the address exists; the stored record
    /// is left untouched in that case.
    pub fn create_if_absent(&self, address: Address, nonce: Nonce) -> Result<(), AppError> {
        let mut users = self.users.write();
        match users.entry(address) {
            Entry::Occupied(_) => Err(AppError::Conflict("User already exists".to_string())),
            Entry::Vacant(slot) => {
                let address = slot.key().clone();
                slot.insert(UserRecord { address, nonce });
                Ok(())
            }
        }
    }

    /// Get a user by address.
    pub fn get(&self, address: &Address) -> Result<UserRecord, AppError> {
        self.users
            .read()
            .get(address)
            .cloned()
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Insert or replace a user record. Last writer wins.
    pub fn update(&self, record: UserRecord) {
        self.users.write().insert(record.address.clone(), record);
    }

    /// Replace a user's nonce, but only if it still equals `expected`.
    ///
    /// This is the commit point of a sign-in: of several attempts that passed
    /// the nonce check concurrently, exactly one observes `expected` here.
    ///
    /// # Errors
    /// * `AppError::NotFound` if the address is not registered
    /// * `AppError::Unauthorized` if the nonce was already replaced
    pub fn rotate_nonce(
        &self,
        address: &Address,
        expected: &Nonce,
        replacement: Nonce,
    ) -> Result<(), AppError> {
        let mut users = self.users.write();
        let record = users
            .get_mut(address)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if record.nonce != *expected {
            return Err(AppError::Unauthorized("Nonce already consumed".to_string()));
        }

        record.nonce = replacement;
        Ok(())
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}
