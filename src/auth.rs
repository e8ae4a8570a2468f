//! Password gate in front of every page.
//!
//! The configured password is stored as an Argon2 PHC string
//! (`$argon2id$v=19$...`); `hdb-advisor hash-password` produces one.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use log::{info, warn};

use crate::error::{AdvisorError, Result};

/// Shown after a failed login.
pub const INCORRECT_PASSWORD: &str = "Incorrect password";

/// Shown after a successful login.
pub const LOGIN_SUCCESS: &str = "Login successful!";

/// Checks submitted passwords against the configured hash.
#[derive(Debug, Clone)]
pub struct PasswordGate {
    hash: Option<String>,
}

impl PasswordGate {
    /// A gate with no hash lets everyone through.
    pub fn new(hash: Option<String>) -> Self {
        let hash = hash.filter(|h| !h.trim().is_empty());
        if hash.is_none() {
            warn!("No password hash configured; the login gate is disabled");
        }
        Self { hash }
    }

    pub fn is_enabled(&self) -> bool {
        self.hash.is_some()
    }

    pub fn verify(&self, password: &str) -> bool {
        let Some(stored) = &self.hash else {
            return true;
        };
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Configured password hash is not a valid PHC string: {}", e);
                return false;
            }
        };
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }

    /// Check `password` and update `session`, returning the message to show.
    pub fn login(&self, session: &mut Session, password: &str) -> std::result::Result<&'static str, &'static str> {
        if self.verify(password) {
            session.authenticated = true;
            info!("Login successful");
            Ok(LOGIN_SUCCESS)
        } else {
            warn!("Login failed");
            Err(INCORRECT_PASSWORD)
        }
    }

    /// A session that starts authenticated when the gate is disabled.
    pub fn session(&self) -> Session {
        Session {
            authenticated: !self.is_enabled(),
        }
    }
}

/// Hash `password` with a fresh salt, for pasting into the config file.
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(AdvisorError::InvalidInput("password must not be empty".to_string()));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AdvisorError::Auth(e.to_string()))
}

/// Per-user login state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
}

impl Session {
    pub fn logout(&mut self) {
        self.authenticated = false;
    }
}
