//! Structural email address validation.

use std::fmt;

use crate::error::ValidationError;

const MAX_EMAIL_LEN: usize = 254;

/// A trimmed, lowercased email address with a plausible shape.
///
/// Only the structure is checked: one `@`, a non-empty local part and a
/// dotted domain without whitespace. Deliverability is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Parses `raw`, reporting failures against `field`.
    pub fn parse(field: &str, raw: &str) -> Result<Self, ValidationError> {
        let email = raw.trim().to_lowercase();
        if email.is_empty() {
            return Err(ValidationError::required(field));
        }
        if email.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::new(field, "is too long"));
        }

        let invalid = || ValidationError::new(field, "is not a valid email address");
        let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
        let well_formed = !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !email.chars().any(char::is_whitespace);
        if !well_formed {
            return Err(invalid());
        }

        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
