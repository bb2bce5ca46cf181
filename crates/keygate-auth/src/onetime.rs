//! One-time tokens for email verification and password resets.
//!
//! The plaintext token is handed to the user exactly once (via email); only
//! its SHA-256 digest is persisted, so a leaked store cannot be replayed.

use std::fmt::Write;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Number of random bytes in a generated token.
const TOKEN_BYTES: usize = 32;

/// A freshly generated one-time token and its storable digest.
#[derive(Debug, Clone)]
pub struct OneTimeToken {
    /// URL-safe token sent to the user. Never persisted.
    pub plaintext: String,
    /// SHA-256 hex digest, the only thing the store sees.
    pub hash: String,
}

impl OneTimeToken {
    /// Generates a new random token from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let plaintext = URL_SAFE_NO_PAD.encode(bytes);
        let hash = hash_token(&plaintext);
        Self { plaintext, hash }
    }
}

/// SHA-256 hex digest of a token string.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
