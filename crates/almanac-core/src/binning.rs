use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::event::CalendarEvent;

pub const DEFAULT_PREVIEW_LIMIT: usize = 2;

/// Events grouped by the day they fall on.
/// Input order is preserved inside each
/// bucket.
#[derive(Debug, Clone, Default)]
pub struct EventBins {
  buckets: HashMap<NaiveDate, Vec<CalendarEvent>>,
  dropped: usize
}

/// What a single grid cell shows: the first
/// few events and how many did not fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPreview<'a> {
  pub shown:    &'a [CalendarEvent],
  pub overflow: usize
}

impl DayPreview<'_> {
  /// `+ N more`, when anything overflowed.
  pub fn overflow_label(
    &self
  ) -> Option<String> {
    (self.overflow > 0).then(|| {
      format!("+ {} more", self.overflow)
    })
  }
}

impl EventBins {
  #[tracing::instrument(skip_all, fields(events = events.len()))]
  pub fn bin(
    events: &[CalendarEvent]
  ) -> Self {
    let mut bins = Self::default();

    for event in events {
      let Some(day) = event.day() else {
        debug!(
          id = %event.id,
          date = %event.date,
          "event date is not an ISO date; leaving it off the grid"
        );
        bins.dropped += 1;
        continue;
      };
      bins
        .buckets
        .entry(day)
        .or_default()
        .push(event.clone());
    }

    debug!(
      days = bins.buckets.len(),
      dropped = bins.dropped,
      "binned events"
    );
    bins
  }

  pub fn bucket(
    &self,
    day: NaiveDate
  ) -> &[CalendarEvent] {
    self
      .buckets
      .get(&day)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn preview(
    &self,
    day: NaiveDate,
    limit: usize
  ) -> DayPreview<'_> {
    let bucket = self.bucket(day);
    let shown_len = bucket.len().min(limit);
    DayPreview {
      shown:    &bucket[..shown_len],
      overflow: bucket.len() - shown_len
    }
  }

  /// Days that have at least one event.
  pub fn day_count(&self) -> usize {
    self.buckets.len()
  }

  pub fn binned_count(&self) -> usize {
    self.buckets.values().map(Vec::len).sum()
  }

  /// Events left off the grid because of a
  /// malformed date.
  pub fn dropped_count(&self) -> usize {
    self.dropped
  }
}
