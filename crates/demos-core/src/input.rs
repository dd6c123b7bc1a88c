//! Request payloads and their validation into store-ready records.
//!
//! Every field is optional at the serde level so that a missing field is
//! reported as [`Error::Validation`] naming the field, instead of a generic
//! deserialisation failure.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::{
  Error, Result,
  record::{IdentityKind, NewProblem, NewReservation, Requester},
  slot::SlotKey,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

// ─── Payloads ────────────────────────────────────────────────────────────────

/// Body of `POST /api/reservations` and `PUT /api/reservations/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationInput {
  #[serde(alias = "nickname", alias = "email", alias = "discordNickname")]
  pub identifier:  Option<String>,
  pub description: Option<String>,
  pub date:        Option<String>,
  pub time:        Option<String>,
  pub course:      Option<String>,
  pub tags:        Option<Vec<String>>,
}

/// Body of `POST /api/problems` and `PUT /api/problems/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemInput {
  #[serde(alias = "nickname", alias = "email", alias = "discordNickname")]
  pub identifier:  Option<String>,
  pub description: Option<String>,
  pub course:      Option<String>,
  pub language:    Option<String>,
  pub images:      Option<Vec<String>>,
  pub tags:        Option<Vec<String>>,
}

// ─── Validation ──────────────────────────────────────────────────────────────

impl ReservationInput {
  /// Check required fields and normalise the rest.
  ///
  /// `fallback` is the verified caller's identifier, used when the body
  /// carries none.
  pub fn validate(
    self,
    kind: IdentityKind,
    fallback: Option<&str>,
  ) -> Result<NewReservation> {
    let requester = requester(kind, self.identifier, fallback)?;
    let description = required(self.description, "description")?;
    let date = canonical_date(&required(self.date, "date")?)?;
    let time = canonical_time(&required(self.time, "time")?)?;
    let course = required(self.course, "course")?;

    Ok(NewReservation {
      slot_key: SlotKey::new(&date, &time),
      requester,
      description,
      date,
      time,
      course,
      tags: normalise_tags(self.tags),
    })
  }
}

impl ProblemInput {
  pub fn validate(
    self,
    kind: IdentityKind,
    fallback: Option<&str>,
  ) -> Result<NewProblem> {
    Ok(NewProblem {
      requester:   requester(kind, self.identifier, fallback)?,
      description: required(self.description, "description")?,
      course:      required(self.course, "course")?,
      language:    self.language.map(|l| l.trim().to_owned()).unwrap_or_default(),
      images:      normalise_images(self.images),
      tags:        normalise_tags(self.tags),
    })
  }
}

/// Trim `value`; a missing or blank value is a validation failure.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String> {
  match value.as_deref().map(str::trim) {
    Some(v) if !v.is_empty() => Ok(v.to_owned()),
    _ => Err(Error::missing(field)),
  }
}

fn requester(
  kind: IdentityKind,
  identifier: Option<String>,
  fallback: Option<&str>,
) -> Result<Requester> {
  let identifier = identifier
    .filter(|v| !v.trim().is_empty())
    .or_else(|| fallback.map(str::to_owned));
  let value = required(identifier, "identifier")?;
  if kind == IdentityKind::Email {
    check_email(&value)?;
  }
  Ok(kind.tag(value))
}

pub(crate) fn check_email(value: &str) -> Result<()> {
  match value.split_once('@') {
    Some((local, domain))
      if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
    {
      Ok(())
    }
    _ => Err(Error::Validation(format!("not an email address: {value:?}"))),
  }
}

fn canonical_date(raw: &str) -> Result<String> {
  NaiveDate::parse_from_str(raw, DATE_FORMAT)
    .map(|d| d.format(DATE_FORMAT).to_string())
    .map_err(|_| Error::Validation(format!("date must be YYYY-MM-DD, got {raw:?}")))
}

fn canonical_time(raw: &str) -> Result<String> {
  NaiveTime::parse_from_str(raw, TIME_FORMAT)
    .map(|t| t.format(TIME_FORMAT).to_string())
    .map_err(|_| Error::Validation(format!("time must be HH:MM, got {raw:?}")))
}

/// Trimmed, non-empty, first occurrence wins.
fn normalise_tags(tags: Option<Vec<String>>) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for tag in tags.unwrap_or_default() {
    let tag = tag.trim();
    if !tag.is_empty() && !out.iter().any(|t| t == tag) {
      out.push(tag.to_owned());
    }
  }
  out
}

fn normalise_images(images: Option<Vec<String>>) -> Vec<String> {
  images
    .unwrap_or_default()
    .into_iter()
    .map(|i| i.trim().to_owned())
    .filter(|i| !i.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn booking() -> ReservationInput {
    ReservationInput {
      identifier:  Some("ana".into()),
      description: Some("help with lab 3".into()),
      date:        Some("2024-05-01".into()),
      time:        Some("10:00".into()),
      course:      Some("CS101".into()),
      tags:        None,
    }
  }

  fn message(err: Error) -> String {
    match err {
      Error::Validation(m) => m,
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn valid_booking_gets_slot_key_and_empty_tags() {
    let r = booking().validate(IdentityKind::Nickname, None).unwrap();
    assert_eq!(r.slot_key.as_str(), "2024-05-01 10:00");
    assert_eq!(r.requester, Requester::Nickname("ana".into()));
    assert!(r.tags.is_empty());
  }

  #[test]
  fn blank_field_is_reported_by_name() {
    let mut input = booking();
    input.time = Some("   ".into());
    let err = input.validate(IdentityKind::Nickname, None).unwrap_err();
    assert_eq!(message(err), "missing required field: time");

    let mut input = booking();
    input.course = None;
    let err = input.validate(IdentityKind::Nickname, None).unwrap_err();
    assert_eq!(message(err), "missing required field: course");
  }

  #[test]
  fn date_and_time_are_canonicalised() {
    let mut input = booking();
    input.date = Some("2024-5-1".into());
    input.time = Some("9:05".into());
    let r = input.validate(IdentityKind::Nickname, None).unwrap();
    assert_eq!(r.slot_key.as_str(), "2024-05-01 09:05");
  }

  #[test]
  fn malformed_date_is_rejected() {
    let mut input = booking();
    input.date = Some("01.05.2024".into());
    assert!(matches!(
      input.validate(IdentityKind::Nickname, None),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn email_identity_requires_an_address() {
    let err = booking().validate(IdentityKind::Email, None).unwrap_err();
    assert!(message(err).contains("not an email address"));

    let mut input = booking();
    input.identifier = Some("ana@uni.hr".into());
    let r = input.validate(IdentityKind::Email, None).unwrap();
    assert_eq!(r.requester, Requester::Email("ana@uni.hr".into()));
  }

  #[test]
  fn fallback_identifier_fills_missing_one() {
    let mut input = booking();
    input.identifier = None;
    let r = input
      .validate(IdentityKind::Email, Some("ana@uni.hr"))
      .unwrap();
    assert_eq!(r.requester.value(), "ana@uni.hr");
  }

  #[test]
  fn fallback_identifier_replaces_blank_one() {
    let mut input = booking();
    input.identifier = Some("  ".into());
    let r = input
      .validate(IdentityKind::Email, Some("ana@uni.hr"))
      .unwrap();
    assert_eq!(r.requester.value(), "ana@uni.hr");

    let mut input = booking();
    input.identifier = Some("".into());
    let err = input.validate(IdentityKind::Nickname, None).unwrap_err();
    assert_eq!(message(err), "missing required field: identifier");
  }

  #[test]
  fn tags_are_trimmed_and_deduplicated() {
    let mut input = booking();
    input.tags = Some(vec![
      " rust ".into(),
      "".into(),
      "lab".into(),
      "rust".into(),
    ]);
    let r = input.validate(IdentityKind::Nickname, None).unwrap();
    assert_eq!(r.tags, ["rust", "lab"]);
  }

  #[test]
  fn problem_defaults() {
    let input = ProblemInput {
      identifier:  Some("ana".into()),
      description: Some("segfault".into()),
      course:      Some("CS101".into()),
      ..Default::default()
    };
    let p = input.validate(IdentityKind::Nickname, None).unwrap();
    assert_eq!(p.language, "");
    assert!(p.images.is_empty());
    assert!(p.tags.is_empty());
  }

  #[test]
  fn problem_images_keep_order() {
    let input = ProblemInput {
      identifier:  Some("ana".into()),
      description: Some("segfault".into()),
      course:      Some("CS101".into()),
      images:      Some(vec!["b.png".into(), " ".into(), "a.png".into()]),
      ..Default::default()
    };
    let p = input.validate(IdentityKind::Nickname, None).unwrap();
    assert_eq!(p.images, ["b.png", "a.png"]);
  }

  #[test]
  fn identifier_aliases_deserialise() {
    let input: ReservationInput =
      serde_json::from_str(r#"{"discordNickname":"ana"}"#).unwrap();
    assert_eq!(input.identifier.as_deref(), Some("ana"));
    let input: ProblemInput = serde_json::from_str(r#"{"email":"a@b"}"#).unwrap();
    assert_eq!(input.identifier.as_deref(), Some("a@b"));
  }
}
