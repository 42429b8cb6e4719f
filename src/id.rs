//! Surrogate identifier format
//!
//! Identifiers are 31-character, case-insensitive hexadecimal strings:
//! a microsecond-resolution timestamp zero-padded to 15 hex digits,
//! followed by 8 bytes of cryptographically random entropy (16 hex digits).
//! Uniqueness relies on the timestamp/entropy combination; there is no
//! collision check.

use rand::RngCore;

use crate::schema::ValidationError;

/// Required identifier length in characters.
pub const ID_LENGTH: usize = 31;

/// Generates a fresh identifier.
///
/// The output always satisfies [`validate_id`].
pub fn generate_id() -> String {
    let timestamp = chrono::Utc::now().timestamp_micros();

    let mut entropy = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut entropy);

    let mut id = format!("{:015x}", timestamp);
    for byte in entropy {
        id.push_str(&format!("{:02x}", byte));
    }

    id
}

/// Validates the identifier shape: exactly [`ID_LENGTH`] characters, all
/// hexadecimal (either case).
pub fn validate_id(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() != ID_LENGTH {
        return Err(ValidationError::InvalidIdentifierFormat {
            reason: format!("expected string of length {}", ID_LENGTH),
        });
    }

    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidIdentifierFormat {
            reason: "expected hex string".into(),
        });
    }

    Ok(())
}
