//! Staff notifications for new bookings.
//!
//! The request path only ever touches [`NotificationHub::publish`], which is
//! an unbounded channel send. A background task drains the channel and hands
//! each event to every configured [`Notifier`]; failures are logged and
//! dropped.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use demos_core::event::{BookingEvent, EventSink};
use reqwest::{Client, StatusCode};
use serde_json::json;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("webhook answered {0}")]
  Status(StatusCode),
}

/// A destination for booking events.
#[async_trait]
pub trait Notifier: Send + Sync {
  /// Short name used in log lines.
  fn name(&self) -> &'static str;

  async fn notify(&self, event: &BookingEvent) -> Result<(), NotifyError>;
}

/// One-line markdown summary of an event.
pub fn summary(event: &BookingEvent) -> String {
  match event {
    BookingEvent::ReservationCreated(r) => format!(
      "**New reservation** for {} at {} ({}) by {}: {}",
      r.date,
      r.time,
      r.course,
      r.requester.value(),
      r.description,
    ),
  }
}

// ─── Webhook ─────────────────────────────────────────────────────────────────

/// Posts `{"content": <summary>}` to a Discord-style chat webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
  client: Client,
  url:    String,
}

impl WebhookNotifier {
  pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
    let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
    Ok(Self { client, url: url.into() })
  }
}

#[async_trait]
impl Notifier for WebhookNotifier {
  fn name(&self) -> &'static str { "webhook" }

  async fn notify(&self, event: &BookingEvent) -> Result<(), NotifyError> {
    let resp = self
      .client
      .post(&self.url)
      .json(&json!({ "content": summary(event) }))
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(NotifyError::Status(resp.status()));
    }
    Ok(())
  }
}

// ─── Log ─────────────────────────────────────────────────────────────────────

/// Writes each event to the log at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
  fn name(&self) -> &'static str { "log" }

  async fn notify(&self, event: &BookingEvent) -> Result<(), NotifyError> {
    tracing::info!(target: "demos::notify", "{}", summary(event));
    Ok(())
  }
}

// ─── Hub ─────────────────────────────────────────────────────────────────────

/// The [`EventSink`] handed to the managers.
pub struct NotificationHub {
  tx: mpsc::UnboundedSender<BookingEvent>,
}

impl NotificationHub {
  /// Start the delivery task. It exits once every clone of the hub's sender
  /// has been dropped and the queue is drained.
  pub fn spawn(notifiers: Vec<Arc<dyn Notifier>>) -> (Self, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<BookingEvent>();
    let worker = tokio::spawn(async move {
      while let Some(event) = rx.recv().await {
        for notifier in &notifiers {
          if let Err(e) = notifier.notify(&event).await {
            tracing::warn!(notifier = notifier.name(), error = %e, "notification failed");
          }
        }
      }
    });
    (Self { tx }, worker)
  }
}

impl EventSink for NotificationHub {
  fn publish(&self, event: BookingEvent) {
    if self.tx.send(event).is_err() {
      tracing::warn!("notification worker is gone; event dropped");
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use axum::{Json, Router, extract::State, http::StatusCode as AxumStatus, routing::post};
  use demos_core::{
    record::{Requester, Reservation},
    slot::SlotKey,
  };
  use serde_json::Value;
  use tokio::net::TcpListener;
  use uuid::Uuid;

  use super::*;

  fn created() -> BookingEvent {
    BookingEvent::ReservationCreated(Reservation {
      id:          Uuid::new_v4(),
      requester:   Requester::Nickname("ana".into()),
      description: "stuck on lab 3".into(),
      date:        "2024-05-01".into(),
      time:        "10:00".into(),
      course:      "CS101".into(),
      slot_key:    SlotKey::new("2024-05-01", "10:00"),
      tags:        vec![],
    })
  }

  #[derive(Default)]
  struct Counter {
    calls: AtomicUsize,
  }

  #[async_trait]
  impl Notifier for Counter {
    fn name(&self) -> &'static str { "counter" }

    async fn notify(&self, _event: &BookingEvent) -> Result<(), NotifyError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }
  }

  struct Broken;

  #[async_trait]
  impl Notifier for Broken {
    fn name(&self) -> &'static str { "broken" }

    async fn notify(&self, _event: &BookingEvent) -> Result<(), NotifyError> {
      Err(NotifyError::Status(StatusCode::BAD_GATEWAY))
    }
  }

  /// Serve a one-route webhook on an ephemeral port, returning its URL.
  async fn fake_webhook(status: AxumStatus, seen: Arc<Mutex<Vec<Value>>>) -> String {
    async fn hook(
      State((status, seen)): State<(AxumStatus, Arc<Mutex<Vec<Value>>>)>,
      Json(body): Json<Value>,
    ) -> AxumStatus {
      seen.lock().unwrap().push(body);
      status
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/hook", post(hook)).with_state((status, seen));
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/hook")
  }

  #[test]
  fn summary_mentions_slot_and_requester() {
    let text = summary(&created());
    assert!(text.contains("2024-05-01"));
    assert!(text.contains("10:00"));
    assert!(text.contains("CS101"));
    assert!(text.contains("ana"));
  }

  #[tokio::test]
  async fn hub_delivers_to_every_notifier_despite_failures() {
    let counter = Arc::new(Counter::default());
    let notifiers: Vec<Arc<dyn Notifier>> =
      vec![Arc::new(Broken), counter.clone(), Arc::new(LogNotifier)];
    let (hub, worker) = NotificationHub::spawn(notifiers);

    hub.publish(created());
    hub.publish(created());
    drop(hub);
    worker.await.unwrap();

    assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn webhook_posts_content_payload() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let url = fake_webhook(AxumStatus::NO_CONTENT, seen.clone()).await;

    WebhookNotifier::new(url).unwrap().notify(&created()).await.unwrap();

    let bodies = seen.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0]["content"].as_str().unwrap().contains("CS101"));
  }

  #[tokio::test]
  async fn webhook_non_success_is_an_error() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let url = fake_webhook(AxumStatus::INTERNAL_SERVER_ERROR, seen).await;

    let err = WebhookNotifier::new(url).unwrap().notify(&created()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Status(s) if s == StatusCode::INTERNAL_SERVER_ERROR));
  }
}
