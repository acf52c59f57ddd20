use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use serde::Serialize;

use crate::datetime::{
  end_of_week,
  first_day_of_month,
  format_iso_date,
  last_day_of_month,
  start_of_week
};

pub const GRID_WEEK_START: Weekday =
  Weekday::Sun;
pub const GRID_WEEK_END: Weekday =
  Weekday::Sat;
pub const DAYS_PER_WEEK: usize = 7;
pub const MINI_CALENDAR_CELLS: usize = 35;

pub const WEEKDAY_HEADERS: [&str; 7] = [
  "SUN", "MON", "TUE", "WED", "THUR",
  "FRI", "SAT"
];
pub const MINI_WEEKDAY_HEADERS: [&str;
  7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// One square of the month view.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize,
)]
pub struct CalendarDay {
  pub date:             NaiveDate,
  pub day_of_month:     u32,
  pub is_current_month: bool
}

impl CalendarDay {
  pub fn date_key(&self) -> String {
    format_iso_date(self.date)
  }
}

/// Every day from the Sunday on or before
/// the 1st through the Saturday on or after
/// the last day of `reference`'s month.
/// Between 28 and 42 cells, always whole
/// weeks.
///
/// Supported for any month whose padded
/// weeks chrono can represent. At the very
/// ends of `NaiveDate::MIN..=MAX` the grid
/// would be cut short, so it comes back
/// empty instead.
#[tracing::instrument(level = "trace")]
pub fn generate_calendar_days(
  reference: NaiveDate
) -> Vec<CalendarDay> {
  let year = reference.year();
  let month = reference.month();
  let Some((grid_start, grid_end)) =
    grid_bounds(year, month)
  else {
    tracing::warn!(
      %reference,
      "month grid falls outside the supported date range"
    );
    return Vec::new();
  };

  let mut days = Vec::with_capacity(42);
  let mut cursor = grid_start;
  while cursor <= grid_end {
    days.push(CalendarDay {
      date:             cursor,
      day_of_month:     cursor.day(),
      is_current_month: cursor.year()
        == year
        && cursor.month() == month
    });
    match cursor.succ_opt() {
      | Some(next) => cursor = next,
      | None => break
    }
  }

  tracing::trace!(
    start = %grid_start,
    end = %grid_end,
    cells = days.len(),
    "generated month grid"
  );
  days
}

fn grid_bounds(
  year: i32,
  month: u32
) -> Option<(NaiveDate, NaiveDate)> {
  let first =
    first_day_of_month(year, month)?;
  let last =
    last_day_of_month(year, month)?;
  Some((
    start_of_week(first, GRID_WEEK_START)?,
    end_of_week(last, GRID_WEEK_END)?
  ))
}

/// The five-row sidebar calendar. Months
/// that need a sixth row lose it.
pub fn mini_calendar_days(
  reference: NaiveDate,
  cells: usize
) -> Vec<CalendarDay> {
  let mut days =
    generate_calendar_days(reference);
  days.truncate(cells);
  days
}

pub fn month_weeks(
  days: &[CalendarDay]
) -> Vec<&[CalendarDay]> {
  days.chunks(DAYS_PER_WEEK).collect()
}
