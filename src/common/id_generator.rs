// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates prefixed IDs such as `U_K7NP3X` for accounts and `L_8MWQT2` for
//! leave applications. The alphabet excludes I, L, O and U so IDs can be read
//! out over the phone to the student section office.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Number of random characters after the prefix
const ID_LENGTH: usize = 6;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Student account (U_)
    Account,
    /// Leave application (L_)
    Leave,
}

impl EntityPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Account => "U",
            EntityPrefix::Leave => "L",
        }
    }
}

fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID in the format "PREFIX_XXXXXX"
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(ID_LENGTH))
}

/// Generate an Account ID (U_XXXXXX)
pub fn generate_account_id() -> String {
    generate_id(EntityPrefix::Account)
}

/// Generate a Leave application ID (L_XXXXXX)
pub fn generate_leave_id() -> String {
    generate_id(EntityPrefix::Leave)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let account_id = generate_account_id();
        assert!(account_id.starts_with("U_"));
        assert_eq!(account_id.len(), 8);

        let leave_id = generate_leave_id();
        assert!(leave_id.starts_with("L_"));
        assert_eq!(leave_id.len(), 8);
    }

    #[test]
    fn test_crockford_alphabet_only() {
        let id = generate_leave_id();
        let random_part = &id[2..];

        for c in random_part.chars() {
            assert!(
                CROCKFORD_ALPHABET.contains(&(c as u8)),
                "Character '{}' not in Crockford alphabet",
                c
            );
        }
        assert!(!random_part.contains('I'));
        assert!(!random_part.contains('O'));
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            assert!(ids.insert(generate_account_id()), "Duplicate ID generated");
        }
    }
}
