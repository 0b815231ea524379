//! Signed-in admin tracking.
//!
//! [`Session`] is the only thing that moves the cache between scopes. It is
//! told about sign-in, sign-out, and a session restored at startup, and keeps
//! the cache scope equal to the signed-in admin's mobile number.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::ScopedReadCache;
use crate::store::Document;

/// Errors produced by [`Session`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("admin {name:?} has no mobile number")]
    MissingMobile { name: String },
}

/// The admin a session belongs to.
///
/// This is the shape kept in session storage by the web frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub name: String,
    pub mobile: String,
    pub role: String,
}

impl AdminIdentity {
    /// Builds an identity.
    pub fn new(
        name: impl Into<String>,
        mobile: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mobile: mobile.into(),
            role: role.into(),
        }
    }
}

/// Keeps the cache scoped to the signed-in admin.
pub struct Session {
    cache: Arc<ScopedReadCache<Document>>,
    current: Mutex<Option<AdminIdentity>>,
}

impl Session {
    /// Creates a signed-out session over `cache`.
    pub fn new(cache: Arc<ScopedReadCache<Document>>) -> Self {
        Self {
            cache,
            current: Mutex::new(None),
        }
    }

    /// Returns the signed-in admin, if any.
    pub fn current(&self) -> Option<AdminIdentity> {
        self.lock().clone()
    }

    /// Signs `admin` in and scopes the cache to them.
    ///
    /// Signing in a different admin drops everything cached for the previous
    /// one. Signing the same admin in again keeps the cache.
    ///
    /// # Errors
    ///
    /// [`SessionError::MissingMobile`] if the identity has an empty mobile
    /// number; the session is left unchanged.
    pub fn login(&self, admin: AdminIdentity) -> Result<(), SessionError> {
        if admin.mobile.trim().is_empty() {
            return Err(SessionError::MissingMobile { name: admin.name });
        }

        let mut current = self.lock();
        self.cache.set_scope(&admin.mobile);
        info!(admin = %admin.name, role = %admin.role, "admin signed in");
        *current = Some(admin);
        Ok(())
    }

    /// Re-establishes a session found at startup.
    ///
    /// `None`, or an identity without a mobile number, leaves the session
    /// signed out with an empty cache.
    pub fn restore(&self, admin: Option<AdminIdentity>) {
        match admin {
            Some(admin) if !admin.mobile.trim().is_empty() => {
                let mut current = self.lock();
                self.cache.set_scope(&admin.mobile);
                info!(admin = %admin.name, "admin session restored");
                *current = Some(admin);
            }
            Some(admin) => {
                warn!(admin = %admin.name, "stored session has no mobile number, ignoring it");
                self.clear();
            }
            None => self.clear(),
        }
    }

    /// Signs out: drops every cached read, then clears the scope.
    pub fn logout(&self) {
        self.cache.invalidate_all();
        let previous = self.lock().take();
        self.cache.set_scope("");
        if let Some(admin) = previous {
            info!(admin = %admin.name, "admin signed out");
        }
    }

    fn clear(&self) {
        *self.lock() = None;
        self.cache.set_scope("");
    }

    fn lock(&self) -> MutexGuard<'_, Option<AdminIdentity>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
