//! Integration tests for `SqliteStore` and the core managers against an
//! in-memory database.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicUsize, Ordering},
};

use chrono::Duration;
use demos_core::{
  Error,
  accounts::{AccountManager, CredentialHasher, LoginInput, SignupInput},
  event::{BookingEvent, Discard, EventSink},
  input::{ProblemInput, ReservationInput},
  problems::ProblemManager,
  record::{IdentityKind, Requester},
  reservations::ReservationManager,
  slot::{SlotKey, is_slot_taken},
  store::{BookingStore, StoreError as _},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> Arc<SqliteStore> {
  Arc::new(
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store"),
  )
}

fn booking(who: &str, date: &str, time: &str, course: &str) -> ReservationInput {
  ReservationInput {
    identifier:  Some(who.into()),
    description: Some(format!("{who} needs help")),
    date:        Some(date.into()),
    time:        Some(time.into()),
    course:      Some(course.into()),
    tags:        None,
  }
}

fn report(who: &str, description: &str) -> ProblemInput {
  ProblemInput {
    identifier:  Some(who.into()),
    description: Some(description.into()),
    course:      Some("CS101".into()),
    ..Default::default()
  }
}

fn reservations(store: &Arc<SqliteStore>) -> ReservationManager<SqliteStore> {
  ReservationManager::new(store.clone(), IdentityKind::Nickname, Arc::new(Discard))
}

/// Records every published event.
#[derive(Default)]
struct Recorder(Mutex<Vec<BookingEvent>>);

impl EventSink for Recorder {
  fn publish(&self, event: BookingEvent) { self.0.lock().unwrap().push(event); }
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn store_enforces_unique_slot() {
  let s = store().await;
  let first = booking("ana", "2024-05-01", "10:00", "CS101")
    .validate(IdentityKind::Nickname, None)
    .unwrap();
  let second = booking("ivo", "2024-05-01", "10:00", "CS202")
    .validate(IdentityKind::Nickname, None)
    .unwrap();

  s.insert_reservation(first).await.unwrap();
  let err = s.insert_reservation(second).await.unwrap_err();
  assert!(err.is_unique_violation(), "{err}");
}

#[tokio::test]
async fn reservation_roundtrip_keeps_tags_and_requester() {
  let s = store().await;
  let mut input = booking("ana@uni.hr", "2024-05-01", "10:00", "CS101");
  input.tags = Some(vec!["rust".into(), "lab".into()]);
  let new = input.validate(IdentityKind::Email, None).unwrap();

  let created = s.insert_reservation(new).await.unwrap();
  let fetched = s.reservation(created.id).await.unwrap().unwrap();

  assert_eq!(fetched, created);
  assert_eq!(fetched.requester, Requester::Email("ana@uni.hr".into()));
  assert_eq!(fetched.tags, ["rust", "lab"]);
}

#[tokio::test]
async fn slot_check_excludes_only_the_given_id() {
  let s = store().await;
  let new = booking("ana", "2024-05-01", "10:00", "CS101")
    .validate(IdentityKind::Nickname, None)
    .unwrap();
  let r = s.insert_reservation(new).await.unwrap();
  let slot = SlotKey::new("2024-05-01", "10:00");

  assert!(is_slot_taken(&*s, &slot, None).await.unwrap());
  assert!(!is_slot_taken(&*s, &slot, Some(r.id)).await.unwrap());
  assert!(is_slot_taken(&*s, &slot, Some(Uuid::new_v4())).await.unwrap());
  assert!(
    !is_slot_taken(&*s, &SlotKey::new("2024-05-01", "11:00"), None)
      .await
      .unwrap()
  );
}

// ─── Reservations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_booking_of_a_slot_conflicts() {
  let s = store().await;
  let m = reservations(&s);

  m.create(booking("ana", "2024-05-01", "10:00", "CS101"), None)
    .await
    .unwrap();
  let err = m
    .create(booking("ivo", "2024-05-01", "10:00", "CS202"), None)
    .await
    .unwrap_err();

  assert!(matches!(err, Error::SlotTaken(ref k) if k.as_str() == "2024-05-01 10:00"));
  assert_eq!(m.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_bookings_of_one_slot_admit_one() {
  let s = store().await;
  let m = Arc::new(reservations(&s));

  let mut tasks = tokio::task::JoinSet::new();
  for i in 0..8 {
    let m = m.clone();
    tasks.spawn(async move {
      m.create(booking(&format!("student{i}"), "2024-05-01", "10:00", "CS101"), None)
        .await
    });
  }

  let mut ok = 0;
  while let Some(result) = tasks.join_next().await {
    match result.unwrap() {
      Ok(_) => ok += 1,
      Err(Error::SlotTaken(_)) => {}
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  assert_eq!(ok, 1);
  assert_eq!(s.list_reservations(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_may_keep_its_own_slot() {
  let s = store().await;
  let m = reservations(&s);
  let r = m
    .create(booking("ana", "2024-05-01", "10:00", "CS101"), None)
    .await
    .unwrap();

  let mut input = booking("ana", "2024-05-01", "10:00", "CS101");
  input.description = Some("changed my mind".into());
  let updated = m.update(r.id, input, None).await.unwrap();

  assert_eq!(updated.id, r.id);
  assert_eq!(updated.description, "changed my mind");
  assert_eq!(updated.slot_key, r.slot_key);
}

#[tokio::test]
async fn update_onto_another_live_slot_conflicts() {
  let s = store().await;
  let m = reservations(&s);
  let a = m
    .create(booking("ana", "2024-05-01", "10:00", "CS101"), None)
    .await
    .unwrap();
  m.create(booking("ivo", "2024-05-01", "11:00", "CS101"), None)
    .await
    .unwrap();

  let err = m
    .update(a.id, booking("ana", "2024-05-01", "11:00", "CS101"), None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SlotTaken(_)));

  let unchanged = s.reservation(a.id).await.unwrap().unwrap();
  assert_eq!(unchanged.time, "10:00");
}

#[tokio::test]
async fn deleted_slot_can_be_taken_by_update() {
  let s = store().await;
  let m = reservations(&s);
  let a = m
    .create(booking("ana", "2024-05-01", "10:00", "CS101"), None)
    .await
    .unwrap();
  let b = m
    .create(booking("ivo", "2024-05-01", "11:00", "CS101"), None)
    .await
    .unwrap();

  m.delete(b.id).await.unwrap();
  let moved = m
    .update(a.id, booking("ana", "2024-05-01", "11:00", "CS101"), None)
    .await
    .unwrap();
  assert_eq!(moved.slot_key.as_str(), "2024-05-01 11:00");
  assert!(
    !is_slot_taken(&*s, &SlotKey::new("2024-05-01", "10:00"), None)
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn update_of_absent_reservation_is_not_found() {
  let s = store().await;
  let m = reservations(&s);
  let err = m
    .update(Uuid::new_v4(), booking("ana", "2024-05-01", "10:00", "CS101"), None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound { kind: "reservation", .. }));
}

#[tokio::test]
async fn invalid_writes_leave_store_untouched() {
  let s = store().await;
  let m = reservations(&s);
  let r = m
    .create(booking("ana", "2024-05-01", "10:00", "CS101"), None)
    .await
    .unwrap();

  let mut missing = booking("ivo", "2024-05-02", "09:00", "CS101");
  missing.description = Some("".into());
  assert!(matches!(m.create(missing.clone(), None).await, Err(Error::Validation(_))));
  assert!(matches!(m.update(r.id, missing, None).await, Err(Error::Validation(_))));

  let all = s.list_reservations(None).await.unwrap();
  assert_eq!(all, vec![r]);
}

#[tokio::test]
async fn delete_of_absent_reservation_is_not_found() {
  let s = store().await;
  let m = reservations(&s);
  let r = m
    .create(booking("ana", "2024-05-01", "10:00", "CS101"), None)
    .await
    .unwrap();

  m.delete(r.id).await.unwrap();
  assert!(matches!(m.delete(r.id).await, Err(Error::NotFound { .. })));
  assert!(matches!(m.delete(Uuid::new_v4()).await, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn listing_can_be_scoped_to_a_course() {
  let s = store().await;
  let m = reservations(&s);
  m.create(booking("ana", "2024-05-01", "10:00", "CS101"), None)
    .await
    .unwrap();
  m.create(booking("ivo", "2024-05-01", "11:00", "CS202"), None)
    .await
    .unwrap();
  m.create(booking("eva", "2024-05-01", "12:00", "CS101"), None)
    .await
    .unwrap();

  let scoped = m.list(Some("CS101".into())).await.unwrap();
  assert_eq!(scoped.len(), 2);
  assert!(scoped.iter().all(|r| r.course == "CS101"));
  assert_eq!(m.list(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn create_publishes_one_event_per_booking() {
  let s = store().await;
  let recorder = Arc::new(Recorder::default());
  let m = ReservationManager::new(s.clone(), IdentityKind::Nickname, recorder.clone());

  let r = m
    .create(booking("ana", "2024-05-01", "10:00", "CS101"), None)
    .await
    .unwrap();
  let _ = m
    .create(booking("ivo", "2024-05-01", "10:00", "CS101"), None)
    .await;
  m.update(r.id, booking("ana", "2024-05-01", "12:00", "CS101"), None)
    .await
    .unwrap();

  let events = recorder.0.lock().unwrap();
  assert_eq!(*events, vec![BookingEvent::ReservationCreated(r)]);
}

// ─── Problems ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn problems_list_newest_first() {
  let s = store().await;
  let m = ProblemManager::new(s.clone(), IdentityKind::Nickname);

  let r1 = m.create(report("ana", "first")).await.unwrap();
  let r2 = m.create(report("ivo", "second")).await.unwrap();
  let r3 = m.create(report("eva", "third")).await.unwrap();

  let ids: Vec<Uuid> = m.list().await.unwrap().into_iter().map(|p| p.id).collect();
  assert_eq!(ids, vec![r3.id, r2.id, r1.id]);
}

#[tokio::test]
async fn problem_update_keeps_created_at() {
  let s = store().await;
  let m = ProblemManager::new(s.clone(), IdentityKind::Nickname);
  let p = m.create(report("ana", "segfault")).await.unwrap();

  let mut input = report("ana", "segfault in lab 2");
  input.language = Some("rust".into());
  input.images = Some(vec!["https://img/1.png".into()]);
  let updated = m.update(p.id, input).await.unwrap();

  assert_eq!(updated.created_at, p.created_at);
  assert_eq!(updated.language, "rust");
  assert_eq!(updated.images, ["https://img/1.png"]);

  let stored = s.problem(p.id).await.unwrap().unwrap();
  assert_eq!(stored, updated);
}

#[tokio::test]
async fn problem_missing_course_is_rejected() {
  let s = store().await;
  let m = ProblemManager::new(s.clone(), IdentityKind::Nickname);
  let mut input = report("ana", "segfault");
  input.course = None;

  assert!(matches!(m.create(input).await, Err(Error::Validation(_))));
  assert!(m.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn absent_problem_update_and_delete_are_not_found() {
  let s = store().await;
  let m = ProblemManager::new(s.clone(), IdentityKind::Nickname);
  let id = Uuid::new_v4();

  assert!(matches!(
    m.update(id, report("ana", "x")).await,
    Err(Error::NotFound { kind: "problem", .. })
  ));
  assert!(matches!(m.delete(id).await, Err(Error::NotFound { .. })));
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Reversible stand-in; the real hasher lives in the HTTP crate.
struct PlainHasher;

impl CredentialHasher for PlainHasher {
  fn hash(&self, secret: &str) -> demos_core::Result<String> { Ok(format!("plain:{secret}")) }

  fn verify(&self, secret: &str, hash: &str) -> bool {
    hash.strip_prefix("plain:") == Some(secret)
  }
}

fn accounts(store: &Arc<SqliteStore>) -> AccountManager<SqliteStore> {
  AccountManager::new(
    store.clone(),
    IdentityKind::Email,
    Arc::new(PlainHasher),
    Duration::hours(1),
  )
}

fn signup(identifier: &str, course: &str) -> SignupInput {
  SignupInput {
    identifier: Some(identifier.into()),
    secret:     Some("hunter2".into()),
    course:     Some(course.into()),
  }
}

#[tokio::test]
async fn signup_rejects_duplicates() {
  let s = store().await;
  let m = accounts(&s);

  let account = m.signup(signup("ana@uni.hr", "CS101")).await.unwrap();
  assert_eq!(account.secret_hash, "plain:hunter2");

  let err = m.signup(signup("ana@uni.hr", "CS202")).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateIdentity(ref who) if who == "ana@uni.hr"));
}

#[tokio::test]
async fn login_issues_claim_for_the_account_course() {
  let s = store().await;
  let m = accounts(&s);
  let account = m.signup(signup("ana@uni.hr", "CS101")).await.unwrap();

  let claim = m
    .login(LoginInput {
      identifier: Some("ana@uni.hr".into()),
      secret:     Some("hunter2".into()),
    })
    .await
    .unwrap();

  assert_eq!(claim.sub, account.id);
  assert_eq!(claim.course, "CS101");
  assert_eq!(claim.exp - claim.iat, 3600);
}

#[tokio::test]
async fn login_rejects_wrong_secret_and_unknown_identifier() {
  let s = store().await;
  let m = accounts(&s);
  m.signup(signup("ana@uni.hr", "CS101")).await.unwrap();

  for (who, secret) in [("ana@uni.hr", "wrong"), ("ivo@uni.hr", "hunter2")] {
    let err = m
      .login(LoginInput {
        identifier: Some(who.into()),
        secret:     Some(secret.into()),
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
  }
}

#[tokio::test]
async fn signup_with_email_identity_requires_an_address() {
  let s = store().await;
  let m = accounts(&s);
  assert!(matches!(
    m.signup(signup("ana", "CS101")).await,
    Err(Error::Validation(_))
  ));
}

/// Counts verifications so tests can see that every login attempt pays for
/// one.
#[derive(Default)]
struct CountingHasher {
  verifies: AtomicUsize,
}

impl CredentialHasher for CountingHasher {
  fn hash(&self, secret: &str) -> demos_core::Result<String> { PlainHasher.hash(secret) }

  fn verify(&self, secret: &str, hash: &str) -> bool {
    self.verifies.fetch_add(1, Ordering::SeqCst);
    PlainHasher.verify(secret, hash)
  }
}

#[tokio::test]
async fn unknown_identifier_still_runs_a_verification() {
  let s = store().await;
  let hasher = Arc::new(CountingHasher::default());
  let m = AccountManager::new(s.clone(), IdentityKind::Email, hasher.clone(), Duration::hours(1));

  let err = m
    .login(LoginInput {
      identifier: Some("nobody@uni.hr".into()),
      secret:     Some("hunter2".into()),
    })
    .await
    .unwrap_err();

  assert!(matches!(err, Error::InvalidCredentials));
  assert_eq!(hasher.verifies.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn oversized_token_lifetime_is_an_error_not_a_panic() {
  let s = store().await;
  let m = AccountManager::new(
    s.clone(),
    IdentityKind::Email,
    Arc::new(PlainHasher),
    Duration::seconds(i64::MAX / 1000),
  );
  m.signup(signup("ana@uni.hr", "CS101")).await.unwrap();

  let err = m
    .login(LoginInput {
      identifier: Some("ana@uni.hr".into()),
      secret:     Some("hunter2".into()),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Credential(_)));
}
