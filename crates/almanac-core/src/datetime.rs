use chrono::{
  Datelike,
  Duration,
  Local,
  NaiveDate,
  NaiveTime,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

pub const ISO_DATE_FORMAT: &str =
  "%Y-%m-%d";
pub const CLOCK_FORMAT: &str = "%H:%M";

/// Strict `YYYY-MM-DD` parsing. Anything
/// else, including `2024-2-10` or
/// trailing text, is rejected.
#[must_use]
pub fn parse_iso_date(
  raw: &str
) -> Option<NaiveDate> {
  let bytes = raw.as_bytes();
  if bytes.len() != 10
    || bytes[4] != b'-'
    || bytes[7] != b'-'
  {
    return None;
  }

  let digits_ok = bytes
    .iter()
    .enumerate()
    .filter(|(idx, _)| {
      *idx != 4 && *idx != 7
    })
    .all(|(_, b)| b.is_ascii_digit());
  if !digits_ok {
    return None;
  }

  NaiveDate::parse_from_str(
    raw,
    ISO_DATE_FORMAT
  )
  .ok()
}

#[must_use]
pub fn format_iso_date(
  date: NaiveDate
) -> String {
  date
    .format(ISO_DATE_FORMAT)
    .to_string()
}

/// Parses a 24h `H:MM` / `HH:MM` clock
/// value.
pub fn parse_clock_time(
  token: &str
) -> Option<NaiveTime> {
  let clock_re = Regex::new(
    r"^(?P<hour>\d{1,2}):(?P<minute>\d{2})$"
  )
  .ok()?;
  let captures =
    clock_re.captures(token.trim())?;

  let hour = captures
    .name("hour")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let minute = captures
    .name("minute")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  if hour > 23 || minute > 59 {
    return None;
  }

  NaiveTime::from_hms_opt(
    hour, minute, 0
  )
}

/// `None` for an invalid month or a year
/// chrono cannot represent.
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  if month == 12 {
    return NaiveDate::from_ymd_opt(
      year, 12, 31
    );
  }
  first_day_of_month(year, month + 1)?
    .pred_opt()
}

/// The 1st of `date`'s own month.
pub fn month_start(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  date.checked_add_signed(
    Duration::try_days(days)?
  )
}

/// The first day of the month `months`
/// away from `date`. Navigation always
/// lands on the 1st so short months never
/// clamp.
pub fn shift_month_start(
  date: NaiveDate,
  months: i32
) -> Option<NaiveDate> {
  let mut year = date.year();
  let mut month =
    date.month() as i32 + months;

  while month < 1 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 12 {
    month -= 12;
    year = year.saturating_add(1);
  }

  first_day_of_month(
    year,
    month as u32
  )
}

/// Most recent `week_start` on or before
/// `day`.
pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> Option<NaiveDate> {
  let day_idx = day
    .weekday()
    .num_days_from_sunday()
    as i64;
  let start_idx = week_start
    .num_days_from_sunday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

/// Nearest `week_end` on or after `day`.
pub fn end_of_week(
  day: NaiveDate,
  week_end: Weekday
) -> Option<NaiveDate> {
  let day_idx = day
    .weekday()
    .num_days_from_sunday()
    as i64;
  let end_idx = week_end
    .num_days_from_sunday()
    as i64;
  let diff = (7 + end_idx - day_idx) % 7;
  add_days(day, diff)
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(error) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %error,
        "invalid timezone id"
      );
      None
    }
  }
}

/// Today's date in `timezone`, or in the
/// machine's local zone when none is
/// configured.
pub fn today(
  timezone: Option<Tz>
) -> NaiveDate {
  match timezone {
    | Some(tz) => {
      Utc::now()
        .with_timezone(&tz)
        .date_naive()
    }
    | None => Local::now().date_naive()
  }
}


pub mod clock_serde {
  use chrono::NaiveTime;
  use serde::Serializer;

  pub fn serialize<S>(
    time: &NaiveTime,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &time
        .format(super::CLOCK_FORMAT)
        .to_string()
    )
  }

  pub mod option {
    use chrono::NaiveTime;
    use serde::{
      Deserialize,
      Deserializer,
      Serializer
    };

    pub fn serialize<S>(
      time: &Option<NaiveTime>,
      serializer: S
    ) -> Result<S::Ok, S::Error>
    where
      S: Serializer
    {
      match time {
        | Some(value) => {
          super::serialize(
            value, serializer
          )
        }
        | None => {
          serializer.serialize_none()
        }
      }
    }

    /// A malformed time reads as `None`
    /// rather than failing the whole file.
    pub fn deserialize<'de, D>(
      deserializer: D
    ) -> Result<Option<NaiveTime>, D::Error>
    where
      D: Deserializer<'de>
    {
      let opt =
        Option::<String>::deserialize(
          deserializer
        )?;
      Ok(opt.and_then(|raw| {
        let parsed =
          crate::datetime::parse_clock_time(
            &raw
          );
        if parsed.is_none() {
          tracing::warn!(
            time = %raw,
            "ignoring malformed clock time"
          );
        }
        parsed
      }))
    }
  }
}
