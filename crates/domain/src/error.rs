//! Domain error types shared by every service.

use thiserror::Error;

/// A rejected input, naming the first offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the field, e.g. `cart[1].quantity`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a required field that was absent or blank.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// Trims a required text field, rejecting absent or blank values.
pub(crate) fn required_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field. Blank values are treated as absent.
pub(crate) fn optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(_) => required_text(field, value, max_len).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_field() {
        let err = ValidationError::required("shipping_address");
        assert_eq!(err.to_string(), "shipping_address: is required");
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("f", Some("  hi "), 10).unwrap(), "hi");
        assert!(required_text("f", Some("   "), 10).is_err());
        assert!(required_text("f", None, 10).is_err());
        assert!(required_text("f", Some("abcdef"), 3).is_err());
    }

    #[test]
    fn optional_text_treats_blank_as_absent() {
        assert_eq!(optional_text("f", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("f", None, 10).unwrap(), None);
        assert_eq!(
            optional_text("f", Some(" Asha "), 10).unwrap().as_deref(),
            Some("Asha")
        );
    }
}
