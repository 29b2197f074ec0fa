//! Salted, iterated SHA-256 digests for account secrets.
//!
//! Digests are stretched but not memory-hard. Verifying an unknown login
//! costs one digest as well.

use std::hint::black_box;

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Rounds of SHA-256 applied after the salted first pass.
const STRETCH_ROUNDS: u32 = 4_096;

/// Salt hashed on behalf of logins with no stored account.
const UNKNOWN_LOGIN_SALT: [u8; 16] = [0x5a; 16];

/// Salt and digest persisted for one account.
pub(super) struct HashedSecret {
    pub(super) salt: Vec<u8>,
    pub(super) digest: Vec<u8>,
}

impl HashedSecret {
    /// Hashes `secret` under a fresh 16-byte random salt.
    pub(super) fn new(secret: &str) -> Self {
        let salt = Uuid::new_v4().into_bytes().to_vec();
        let digest = digest(&salt, secret);
        Self { salt, digest }
    }
}

/// Checks `secret` against a stored salt and digest.
pub(super) fn matches(salt: &[u8], expected: &[u8], secret: &str) -> bool {
    let actual = digest(salt, secret);
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .fold(0_u8, |diff, (left, right)| diff | (left ^ right))
            == 0
}

/// Verifies `secret` against an account that may not exist.
///
/// A missing account never verifies but costs the same digest work.
pub(super) fn verify(stored: Option<(&[u8], &[u8])>, secret: &str) -> bool {
    match stored {
        Some((salt, expected)) => matches(salt, expected, secret),
        None => {
            black_box(digest(&UNKNOWN_LOGIN_SALT, secret));
            false
        }
    }
}

fn digest(salt: &[u8], secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(secret.as_bytes());
    let mut current = hasher.finalize();
    for _ in 0..STRETCH_ROUNDS {
        let mut round = Sha256::new();
        round.update(current);
        round.update(salt);
        current = round.finalize();
    }
    current.to_vec()
}
