//! crates/globe_explorer_core/src/accounts.rs
//!
//! Input rules for registration and login. Hashing and token issuance live
//! behind ports; this module only decides whether the input is acceptable.

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("Please provide a name")]
    MissingName,
    #[error("Please provide a valid email")]
    InvalidEmail,
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("Please provide an email and password")]
    MissingCredentials,
}

/// A registration request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(name: &str, email: &str, password: &str) -> Result<Self, AccountError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountError::MissingName);
        }
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AccountError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::PasswordTooShort);
        }
        Ok(Self {
            name: name.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

/// Login input after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub email: String,
    pub password: String,
}

impl LoginAttempt {
    pub fn validate(email: &str, password: &str) -> Result<Self, AccountError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AccountError::MissingCredentials);
        }
        Ok(Self {
            email,
            password: password.to_string(),
        })
    }
}

/// Emails are unique case-insensitively, so they are stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes_a_valid_registration() {
        let reg = Registration::validate(" Test User ", "Test@Example.com", "Password123").unwrap();
        assert_eq!(reg.name, "Test User");
        assert_eq!(reg.email, "test@example.com");
    }

    #[test]
    fn rejects_invalid_email() {
        for email in ["invalid-email", "a@b", "@example.com", "a b@example.com", "a@@b.com"] {
            assert_eq!(
                Registration::validate("Test User", email, "Password123"),
                Err(AccountError::InvalidEmail),
                "{email}"
            );
        }
    }

    #[test]
    fn rejects_short_password_and_blank_name() {
        assert_eq!(
            Registration::validate("Test User", "test@example.com", "pass"),
            Err(AccountError::PasswordTooShort)
        );
        assert_eq!(
            Registration::validate("  ", "test@example.com", "Password123"),
            Err(AccountError::MissingName)
        );
    }

    #[test]
    fn login_requires_both_fields() {
        assert_eq!(
            LoginAttempt::validate("", "secret"),
            Err(AccountError::MissingCredentials)
        );
        assert_eq!(
            LoginAttempt::validate("TEST@example.com", "secret").unwrap().email,
            "test@example.com"
        );
    }
}
