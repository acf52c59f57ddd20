use chrono::{
  Datelike,
  NaiveDate,
  NaiveTime
};
use serde::{
  Deserialize,
  Serialize
};
use thiserror::Error;
use tracing::debug;

use crate::category::{
  CategoryError,
  CategoryKey,
  CategoryRegistry
};
use crate::datetime::{
  add_days,
  parse_clock_time,
  parse_iso_date
};
use crate::event::{
  CalendarEvent,
  EventId,
  EventLink
};

pub const DEFAULT_START_TIME: &str =
  "10:00";
pub const DEFAULT_END_TIME: &str =
  "11:00";

/// A recurring draft repeats Monday
/// through Friday.
const RECURRING_WEEKDAYS: i64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
  #[error("title is required")]
  TitleRequired,

  #[error("please select a date")]
  DateRequired,

  #[error("\"{0}\" is not a YYYY-MM-DD date")]
  InvalidDate(String),

  #[error("please select an event type")]
  CategoryRequired,

  #[error(
    "category \"{0}\" is not configured"
  )]
  CategoryNotFound(String),

  #[error("\"{0}\" is not an HH:MM time")]
  InvalidTime(String),

  #[error(
    "end time {end} is before start time \
     {start}"
  )]
  EndBeforeStart {
    start: NaiveTime,
    end:   NaiveTime
  }
}

/// Raw input from the add-event form.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct EventDraft {
  pub title:      String,
  pub date:       Option<String>,
  pub category:   Option<String>,
  pub start_time: String,
  pub end_time:   String,
  pub all_day:    bool,
  pub recurring:  bool,
  pub links:      Vec<EventLink>
}

impl Default for EventDraft {
  fn default() -> Self {
    Self {
      title:      String::new(),
      date:       None,
      category:   None,
      start_time: DEFAULT_START_TIME
        .to_string(),
      end_time:   DEFAULT_END_TIME
        .to_string(),
      all_day:    false,
      recurring:  false,
      links:      vec![]
    }
  }
}

impl EventDraft {
  pub fn new(
    title: impl Into<String>,
    date: NaiveDate,
    category: impl Into<String>
  ) -> Self {
    Self {
      title: title.into(),
      date: Some(
        crate::datetime::format_iso_date(
          date
        )
      ),
      category: Some(category.into()),
      ..Self::default()
    }
  }

  /// Checks the draft against `registry`
  /// and produces the events it stands for:
  /// one, or five for a recurring draft.
  /// Errors come back in form order.
  #[tracing::instrument(skip_all, fields(title = %self.title))]
  pub fn into_events(
    self,
    registry: &CategoryRegistry
  ) -> Result<Vec<CalendarEvent>, DraftError>
  {
    let title = self.title.trim();
    if title.is_empty() {
      return Err(
        DraftError::TitleRequired
      );
    }

    let raw_date = self
      .date
      .as_deref()
      .map(str::trim)
      .filter(|d| !d.is_empty())
      .ok_or(DraftError::DateRequired)?;
    let date = parse_iso_date(raw_date)
      .ok_or_else(|| {
        DraftError::InvalidDate(
          raw_date.to_string()
        )
      })?;

    let category =
      resolve_category(
        self.category.as_deref(),
        registry
      )?;

    let (start_time, end_time) =
      if self.all_day {
        (None, None)
      } else {
        let start = parse_time(
          &self.start_time
        )?;
        let end =
          parse_time(&self.end_time)?;
        if end < start {
          return Err(
            DraftError::EndBeforeStart {
              start,
              end
            }
          );
        }
        (Some(start), Some(end))
      };

    let dates = if self.recurring {
      recurring_dates(date)
    } else {
      vec![date]
    };

    debug!(
      count = dates.len(),
      category = %category,
      all_day = self.all_day,
      "draft accepted"
    );

    Ok(
      dates
        .into_iter()
        .map(|day| {
          CalendarEvent {
            id: EventId::generate(),
            date:
              crate::datetime::format_iso_date(
                day
              ),
            title: title.to_string(),
            category: category.clone(),
            start_time,
            end_time,
            links: self.links.clone()
          }
        })
        .collect()
    )
  }
}

/// Monday through Friday of the week that
/// holds `date`. Sunday closes the week, so
/// it maps back to the Monday six days
/// earlier.
pub fn recurring_dates(
  date: NaiveDate
) -> Vec<NaiveDate> {
  let offset = date
    .weekday()
    .num_days_from_monday()
    as i64;
  let Some(monday) = add_days(date, -offset)
  else {
    return Vec::new();
  };
  (0..RECURRING_WEEKDAYS)
    .filter_map(|i| add_days(monday, i))
    .collect()
}

fn resolve_category(
  raw: Option<&str>,
  registry: &CategoryRegistry
) -> Result<CategoryKey, DraftError> {
  let raw = raw.unwrap_or_default();
  let key = match CategoryKey::parse(raw)
  {
    | Ok(key) => key,
    | Err(CategoryError::EmptyKey) => {
      return Err(
        DraftError::CategoryRequired
      );
    }
    | Err(_) => {
      return Err(
        DraftError::CategoryNotFound(
          raw.trim().to_string()
        )
      );
    }
  };

  registry
    .lookup(&key)
    .map(|category| category.key.clone())
    .map_err(|_| {
      DraftError::CategoryNotFound(
        key.to_string()
      )
    })
}

fn parse_time(
  raw: &str
) -> Result<NaiveTime, DraftError> {
  parse_clock_time(raw).ok_or_else(|| {
    DraftError::InvalidTime(
      raw.trim().to_string()
    )
  })
}
