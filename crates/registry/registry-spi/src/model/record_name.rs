//! Record naming rules

use crate::error::{RegistryError, Result};

/// Names are non-empty, use only `[A-Za-z0-9_.-]` and do not start with `.`.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };
    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.starts_with('.') {
        return invalid("must not start with '.'");
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return invalid(&format!("character '{}' is not allowed", c));
    }
    Ok(())
}
