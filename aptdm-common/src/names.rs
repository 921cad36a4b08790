//! Directory naming rules
//!
//! Samples, reconstructions and analyses are addressed by the name of their
//! directory, so those names are restricted to word characters.

use crate::{Error, Result};

/// Returns true for `[A-Za-z0-9_]`
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True when `name` is non-empty and made only of word characters
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_word_char)
}

/// Check a sample / reconstruction / analysis directory name.
///
/// `kind` is used in the error message ("Sample", "Reconstruction", ...).
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} name can only contain word characters: A-Z, a-z, 0-9, and _",
            kind
        )))
    }
}

/// Strip everything but word characters, for embedding user text in a name
pub fn sanitize_name_component(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| is_word_char(*c)).collect();
    if cleaned.is_empty() {
        "Unknown".to_string()
    } else {
        cleaned
    }
}
