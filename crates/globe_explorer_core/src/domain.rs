//! crates/globe_explorer_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A registered user as seen by the rest of the application.
///
/// Never carries credential material; see [`UserCredentials`] for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Insertion-ordered, duplicate-free list of country codes.
    pub favorite_countries: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/registration - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// The data needed to persist a brand new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    /// Already normalized to lower case.
    pub email: String,
    pub hashed_password: String,
}

// Represents an issued bearer token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// An opaque country identifier (normally a 3-letter cca3 code).
///
/// The only rule enforced is that it is not blank. Case is preserved and the
/// value is never checked against any country list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountryCode(String);

impl CountryCode {
    /// Returns `None` when the input is missing or blank.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of an atomic conditional mutation of a user's favorites set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetMutation {
    /// The mutation was applied; carries the updated set.
    Applied(Vec<String>),
    /// The precondition did not hold, nothing changed; carries the current set.
    Unchanged(Vec<String>),
}

/// Descriptive country metadata returned by the external directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    pub code: String,
    pub common_name: String,
    pub official_name: String,
    pub flag: Option<String>,
    pub flag_url: Option<String>,
    pub population: u64,
    pub region: String,
    pub subregion: Option<String>,
    pub capitals: Vec<String>,
    pub languages: Vec<String>,
}
