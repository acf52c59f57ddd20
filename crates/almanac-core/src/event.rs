use std::fmt;

use chrono::{
  NaiveDate,
  NaiveTime
};
use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

use crate::category::CategoryKey;
use crate::datetime::{
  clock_serde,
  parse_iso_date
};

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
  pub fn generate() -> Self {
    Self(Uuid::new_v4().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for EventId {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

impl fmt::Display for EventId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct EventLink {
  pub url:   String,
  pub title: String
}

/// A calendar entry. `date` stays a raw
/// string so malformed input survives in
/// the event list even though it never
/// lands on a day.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
  #[serde(default = "EventId::generate")]
  pub id: EventId,

  pub date: String,

  pub title: String,

  #[serde(rename = "type")]
  pub category: CategoryKey,

  #[serde(
    default,
    with = "clock_serde::option",
    skip_serializing_if = "Option::is_none"
  )]
  pub start_time: Option<NaiveTime>,

  #[serde(
    default,
    with = "clock_serde::option",
    skip_serializing_if = "Option::is_none"
  )]
  pub end_time: Option<NaiveTime>,

  #[serde(
    default,
    skip_serializing_if = "Vec::is_empty"
  )]
  pub links: Vec<EventLink>
}

impl CalendarEvent {
  pub fn new(
    date: NaiveDate,
    title: impl Into<String>,
    category: CategoryKey
  ) -> Self {
    Self {
      id: EventId::generate(),
      date: crate::datetime::format_iso_date(
        date
      ),
      title: title.into(),
      category,
      start_time: None,
      end_time: None,
      links: vec![]
    }
  }

  /// The day this event belongs to, if its
  /// date is a valid ISO date.
  pub fn day(&self) -> Option<NaiveDate> {
    parse_iso_date(&self.date)
  }

  pub fn is_all_day(&self) -> bool {
    self.start_time.is_none()
      && self.end_time.is_none()
  }

  /// `10:00 - 11:00`, `from 10:00`, or
  /// `All day`.
  pub fn time_label(&self) -> String {
    match (self.start_time, self.end_time)
    {
      | (Some(start), Some(end)) => {
        format!(
          "{} - {}",
          start.format("%H:%M"),
          end.format("%H:%M")
        )
      }
      | (Some(start), None) => {
        format!(
          "from {}",
          start.format("%H:%M")
        )
      }
      | (None, Some(end)) => {
        format!(
          "until {}",
          end.format("%H:%M")
        )
      }
      | (None, None) => {
        "All day".to_string()
      }
    }
  }
}
