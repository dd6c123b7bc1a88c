//! Process wiring for the demos booking service: configuration, the
//! notification hub and the outer HTTP layers.

pub mod notify;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use demos_api::{ApiSettings, AppState};
use demos_core::{access::AccessMode, record::IdentityKind, store::BookingStore};
use serde::Deserialize;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use notify::{LogNotifier, Notifier, NotifyError, WebhookNotifier};

/// Upper bound on `token_ttl_secs`: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `demos.toml` and
/// `DEMOS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  pub identity:       IdentityKind,
  pub access:         AccessMode,
  pub jwt_secret:     Option<String>,
  pub token_ttl_secs: u64,
  pub webhook_url:    Option<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:           "0.0.0.0".to_string(),
      port:           3000,
      store_path:     PathBuf::from("demos.db"),
      identity:       IdentityKind::default(),
      access:         AccessMode::default(),
      jwt_secret:     None,
      token_ttl_secs: 3600,
      webhook_url:    None,
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("jwt_secret must be set when access is {0:?}")]
  MissingSecret(AccessMode),

  #[error("token_ttl_secs must be positive")]
  ZeroTtl,

  #[error("token_ttl_secs must be at most {max}, got {0}", max = MAX_TOKEN_TTL_SECS)]
  TtlTooLong(u64),
}

impl ServerConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    let secret_missing = self.jwt_secret.as_deref().is_none_or(|s| s.trim().is_empty());
    if self.access != AccessMode::Open && secret_missing {
      return Err(ConfigError::MissingSecret(self.access));
    }
    if self.token_ttl_secs == 0 {
      return Err(ConfigError::ZeroTtl);
    }
    if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
      return Err(ConfigError::TtlTooLong(self.token_ttl_secs));
    }
    Ok(())
  }

  /// Settings for the API layer. In open mode without a configured secret,
  /// tokens are signed with a per-process random key.
  pub fn api_settings(&self) -> Result<ApiSettings, ConfigError> {
    let token_ttl = i64::try_from(self.token_ttl_secs)
      .ok()
      .and_then(chrono::Duration::try_seconds)
      .ok_or(ConfigError::TtlTooLong(self.token_ttl_secs))?;
    let jwt_secret = match &self.jwt_secret {
      Some(secret) if !secret.trim().is_empty() => secret.clone(),
      _ => {
        tracing::warn!("no jwt_secret configured; issued tokens will not survive a restart");
        uuid::Uuid::new_v4().to_string()
      }
    };
    Ok(ApiSettings {
      identity: self.identity,
      access: self.access,
      jwt_secret,
      token_ttl,
    })
  }

  /// The notifiers this configuration asks for. The log notifier is always
  /// present.
  pub fn notifiers(&self) -> Result<Vec<Arc<dyn Notifier>>, NotifyError> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier)];
    if let Some(url) = &self.webhook_url {
      notifiers.push(Arc::new(WebhookNotifier::new(url.clone())?));
    }
    Ok(notifiers)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router wrapped in CORS and request tracing.
pub fn app<S>(state: AppState<S>) -> Router
where
  S: BookingStore + 'static,
{
  demos_api::router(state)
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
}
