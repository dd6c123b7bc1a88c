//! Account enrolment and login.
//!
//! Hashing secrets and signing claims are collaborator concerns: this module
//! only requires that hashing be one-way ([`CredentialHasher`]) and hands back
//! an unsigned [`Claim`] for the caller to sign.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
  Error, Result,
  access::Claim,
  input::{check_email, required},
  record::{Account, IdentityKind, NewAccount},
  store::{BookingStore, StoreError as _},
};

/// One-way secret hashing.
pub trait CredentialHasher: Send + Sync {
  fn hash(&self, secret: &str) -> Result<String>;

  /// Whether `secret` matches a hash produced by [`Self::hash`].
  fn verify(&self, secret: &str, hash: &str) -> bool;
}

/// Body of `POST /api/signup`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupInput {
  #[serde(alias = "email", alias = "nickname")]
  pub identifier: Option<String>,
  #[serde(alias = "password")]
  pub secret:     Option<String>,
  pub course:     Option<String>,
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
  #[serde(alias = "email", alias = "nickname")]
  pub identifier: Option<String>,
  #[serde(alias = "password")]
  pub secret:     Option<String>,
}

pub struct AccountManager<S> {
  store:    Arc<S>,
  identity: IdentityKind,
  hasher:   Arc<dyn CredentialHasher>,
  ttl:      Duration,
  /// Verified against when the identifier is unknown, so a miss costs the
  /// same as a wrong secret.
  decoy:    Option<String>,
}

impl<S: BookingStore> AccountManager<S> {
  pub fn new(
    store: Arc<S>,
    identity: IdentityKind,
    hasher: Arc<dyn CredentialHasher>,
    ttl: Duration,
  ) -> Self {
    let decoy = hasher.hash("decoy secret").ok();
    Self { store, identity, hasher, ttl, decoy }
  }

  /// Enrol a new identity. Identifiers are unique.
  pub async fn signup(&self, input: SignupInput) -> Result<Account> {
    let identifier = required(input.identifier, "identifier")?;
    let secret = secret(input.secret)?;
    let course = required(input.course, "course")?;
    if self.identity == IdentityKind::Email {
      check_email(&identifier)?;
    }

    if self
      .store
      .account_by_identifier(identifier.clone())
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::DuplicateIdentity(identifier));
    }

    let secret_hash = self.hasher.hash(&secret)?;
    let new = NewAccount { identifier: identifier.clone(), course, secret_hash };
    let account = self.store.insert_account(new).await.map_err(|e| {
      if e.is_unique_violation() {
        Error::DuplicateIdentity(identifier)
      } else {
        Error::store(e)
      }
    })?;

    info!(id = %account.id, course = %account.course, "account created");
    Ok(account)
  }

  /// Exchange a credential pair for a claim valid for the configured TTL.
  pub async fn login(&self, input: LoginInput) -> Result<Claim> {
    let identifier = required(input.identifier, "identifier")?;
    let secret = secret(input.secret)?;

    let account = self
      .store
      .account_by_identifier(identifier)
      .await
      .map_err(Error::store)?;

    let account = match account {
      Some(a) if self.hasher.verify(&secret, &a.secret_hash) => a,
      Some(_) => return Err(rejected()),
      None => {
        if let Some(decoy) = &self.decoy {
          self.hasher.verify(&secret, decoy);
        }
        return Err(rejected());
      }
    };

    let now = Utc::now();
    let exp = now
      .checked_add_signed(self.ttl)
      .ok_or_else(|| Error::Credential(format!("token lifetime {} is out of range", self.ttl)))?;
    Ok(Claim {
      sub:        account.id,
      identifier: account.identifier,
      course:     account.course,
      iat:        now.timestamp(),
      exp:        exp.timestamp(),
    })
  }
}

fn rejected() -> Error {
  warn!("login rejected");
  Error::InvalidCredentials
}

/// Secrets are taken verbatim; only emptiness is checked.
fn secret(value: Option<String>) -> Result<String> {
  value
    .filter(|s| !s.is_empty())
    .ok_or_else(|| Error::missing("secret"))
}
