//! Credential plumbing: argon2 secret hashing, HS256 bearer tokens, and the
//! extractor that turns an `Authorization` header into a [`Presented`].

use std::convert::Infallible;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use demos_core::{
  Error,
  access::{Claim, Presented},
  accounts::CredentialHasher,
  store::BookingStore,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;

use crate::AppState;

// ─── Hashing ─────────────────────────────────────────────────────────────────

/// Salted argon2id; hashes are PHC strings, e.g. `$argon2id$v=19$…`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
  fn hash(&self, secret: &str) -> demos_core::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| Error::Credential(format!("argon2 error: {e}")))
  }

  fn verify(&self, secret: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
      .and_then(|parsed| Argon2::default().verify_password(secret.as_bytes(), &parsed))
      .is_ok()
  }
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// Signs and verifies [`Claim`]s as HS256 JWTs with a shared secret.
pub struct TokenIssuer {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
}

impl TokenIssuer {
  pub fn new(secret: &[u8]) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
    }
  }

  pub fn sign(&self, claim: &Claim) -> demos_core::Result<String> {
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claim, &self.encoding)
      .map_err(|e| Error::Credential(format!("jwt error: {e}")))
  }

  /// The claim inside `token`, if the signature checks out and it has not
  /// expired.
  pub fn verify(&self, token: &str) -> Option<Claim> {
    jsonwebtoken::decode::<Claim>(token, &self.decoding, &self.validation)
      .map(|data| data.claims)
      .ok()
  }
}

/// Classify the `Authorization` header of a request.
pub fn presented(headers: &HeaderMap, tokens: &TokenIssuer) -> Presented {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Presented::Absent;
  };

  value
    .to_str()
    .ok()
    .and_then(|v| v.trim().split_once(' '))
    .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
    .and_then(|(_, token)| tokens.verify(token.trim()))
    .map_or(Presented::Rejected, Presented::Verified)
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Whatever credential the request carried. Never rejects on its own; the
/// access policy decides what an absent or invalid credential means.
pub struct Credential(pub Presented);

impl<S> FromRequestParts<AppState<S>> for Credential
where
  S: BookingStore + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Credential(presented(&parts.headers, &state.tokens)))
  }
}
