//! Composite keys
//!
//! ## Format
//! ```text
//! \0 object_type \0 attr_1 \0 attr_2 \0 ... attr_n \0
//! ```
//! The leading `\0` keeps composite keys out of the simple-key range.

use crate::error::{Result, WalletError};

/// Prefix marking a composite key
pub const COMPOSITE_KEY_NAMESPACE: char = '\u{0}';

const MIN_UNICODE_RUNE: char = '\u{0}';
const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Build a composite key for `object_type` from `attributes`
pub fn compose_key(object_type: &str, attributes: &[&str]) -> Result<String> {
    if object_type.is_empty() {
        return Err(WalletError::InvalidCompositeKey(
            "object type must not be empty".to_string(),
        ));
    }
    validate_attribute(object_type)?;

    let capacity = 2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>();
    let mut key = String::with_capacity(capacity);
    key.push(COMPOSITE_KEY_NAMESPACE);
    key.push_str(object_type);
    key.push(MIN_UNICODE_RUNE);

    for attribute in attributes {
        validate_attribute(attribute)?;
        key.push_str(attribute);
        key.push(MIN_UNICODE_RUNE);
    }

    Ok(key)
}

/// Split a composite key back into its object type and attributes
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>)> {
    let body = key.strip_prefix(COMPOSITE_KEY_NAMESPACE).ok_or_else(|| {
        WalletError::InvalidCompositeKey(format!("missing namespace prefix: {:?}", key))
    })?;
    let body = body.strip_suffix(MIN_UNICODE_RUNE).ok_or_else(|| {
        WalletError::InvalidCompositeKey(format!("missing trailing separator: {:?}", key))
    })?;

    let mut parts = body.split(MIN_UNICODE_RUNE).map(str::to_string);
    let object_type = parts.next().unwrap_or_default();
    if object_type.is_empty() {
        return Err(WalletError::InvalidCompositeKey("empty object type".to_string()));
    }

    Ok((object_type, parts.collect()))
}

fn validate_attribute(attribute: &str) -> Result<()> {
    if attribute.contains(MIN_UNICODE_RUNE) || attribute.contains(MAX_UNICODE_RUNE) {
        return Err(WalletError::InvalidCompositeKey(format!(
            "attribute contains a reserved character: {:?}",
            attribute
        )));
    }
    Ok(())
}
