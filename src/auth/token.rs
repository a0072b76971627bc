//! Opaque bearer credentials.
//!
//! A token reads `<prefix>_<lookup>_<secret>`. The prefix names what the token
//! unlocks, the lookup finds its row, and only an Argon2id hash of the whole
//! token is stored.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;

use crate::error::{Error, Result};

// Sessions are verified on every request. The secret carries 128 random bits,
// so a light cost is enough.
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

const LOOKUP_BYTES: usize = 4;
const SECRET_BYTES: usize = 16;

/// What a token grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bearer token of a login session.
    Session,
    /// Single-use link sent by mail (confirmation, invite, password reset).
    EmailLink,
}

impl TokenKind {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            TokenKind::Session => "ags",
            TokenKind::EmailLink => "agl",
        }
    }
}

/// A freshly minted token. Only `hash` and `lookup` are persisted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub raw: String,
    pub lookup: String,
    pub hash: String,
}

pub struct TokenHasher {
    argon2: Argon2<'static>,
}

impl TokenHasher {
    pub fn new() -> Result<Self> {
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .map_err(|e| Error::Config(format!("invalid token hash parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn issue(&self, kind: TokenKind) -> Result<IssuedToken> {
        let lookup = random_hex(LOOKUP_BYTES);
        let raw = format!("{}_{lookup}_{}", kind.prefix(), random_hex(SECRET_BYTES));
        let hash = self.hash(&raw)?;
        Ok(IssuedToken { raw, lookup, hash })
    }

    fn hash(&self, raw: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| Error::Config(format!("failed to hash token: {e}")))?;
        Ok(hash.to_string())
    }

    /// Checks a raw token against a stored PHC hash.
    pub fn verify(&self, raw: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| Error::Config(format!("invalid hash format: {e}")))?;

        match self.argon2.verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Config(format!("failed to verify token: {e}"))),
        }
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_hex_of(segment: &str, bytes: usize) -> bool {
    segment.len() == bytes * 2 && segment.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Returns the lookup segment of a raw token of the given kind.
///
/// Tokens of another kind are rejected as `InvalidTokenFormat`.
pub fn token_lookup(raw: &str, kind: TokenKind) -> Result<&str> {
    let rest = raw
        .strip_prefix(kind.prefix())
        .and_then(|r| r.strip_prefix('_'))
        .ok_or(Error::InvalidTokenFormat)?;
    let (lookup, secret) = rest.split_once('_').ok_or(Error::InvalidTokenFormat)?;

    if !is_hex_of(lookup, LOOKUP_BYTES) || !is_hex_of(secret, SECRET_BYTES) {
        return Err(Error::InvalidTokenFormat);
    }
    Ok(lookup)
}
