use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{
  debug,
  info,
  warn
};

use crate::binning::EventBins;
use crate::category::{
  CategoryKey,
  CategoryRegistry
};
use crate::datetime::{
  month_start,
  shift_month_start
};
use crate::draft::{
  DraftError,
  EventDraft
};
use crate::event::{
  CalendarEvent,
  EventId
};
use crate::filter::CategoryFilter;
use crate::grid::{
  CalendarDay,
  MINI_CALENDAR_CELLS,
  generate_calendar_days,
  mini_calendar_days
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
  #[error("no event with id {0}")]
  EventNotFound(EventId),

  #[error(transparent)]
  Draft(#[from] DraftError)
}

/// The page-level calendar state. Every
/// change goes through one of the methods
/// below; renderers read a
/// [`CalendarSnapshot`].
#[derive(Debug, Clone)]
pub struct CalendarState {
  registry:       CategoryRegistry,
  events:         Vec<CalendarEvent>,
  archived:       Vec<CalendarEvent>,
  reference_date: NaiveDate,
  sidebar_month:  NaiveDate,
  filter:         CategoryFilter,
  mini_cells:     usize
}

/// Everything a render pass needs, computed
/// fresh from the state.
#[derive(Debug, Clone)]
pub struct CalendarSnapshot {
  pub reference_date: NaiveDate,
  pub title:          String,
  pub days:           Vec<CalendarDay>,
  pub sidebar_month:  NaiveDate,
  pub sidebar_title:  String,
  pub sidebar_days:   Vec<CalendarDay>,
  pub visible_events: Vec<CalendarEvent>,
  pub bins:           EventBins,
  pub active_filters: Vec<CategoryKey>,
  pub all_active:     bool,
  pub total_events:   usize,
  pub archived_count: usize
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
  pub key:    CategoryKey,
  pub active: bool
}

impl CalendarState {
  pub fn new(
    registry: CategoryRegistry,
    events: Vec<CalendarEvent>,
    today: NaiveDate
  ) -> Self {
    let filter =
      CategoryFilter::for_registry(
        &registry
      );
    info!(
      events = events.len(),
      categories = registry.len(),
      %today,
      "calendar state initialised"
    );
    Self {
      registry,
      events,
      archived: vec![],
      reference_date: today,
      sidebar_month: month_start(today),
      filter,
      mini_cells: MINI_CALENDAR_CELLS
    }
  }

  pub fn with_mini_cells(
    mut self,
    cells: usize
  ) -> Self {
    self.mini_cells = cells;
    self
  }

  pub fn registry(
    &self
  ) -> &CategoryRegistry {
    &self.registry
  }

  pub fn events(&self) -> &[CalendarEvent] {
    &self.events
  }

  pub fn archived(
    &self
  ) -> &[CalendarEvent] {
    &self.archived
  }

  pub fn reference_date(
    &self
  ) -> NaiveDate {
    self.reference_date
  }

  pub fn sidebar_month(
    &self
  ) -> NaiveDate {
    self.sidebar_month
  }

  pub fn filter(&self) -> &CategoryFilter {
    &self.filter
  }

  /// Validates and appends the events a
  /// draft expands to, returning their ids.
  #[tracing::instrument(skip_all)]
  pub fn add_event(
    &mut self,
    draft: EventDraft
  ) -> Result<Vec<EventId>, StateError> {
    let created =
      draft.into_events(&self.registry)?;
    let ids = created
      .iter()
      .map(|event| event.id.clone())
      .collect::<Vec<_>>();
    info!(
      count = created.len(),
      "events added"
    );
    self.events.extend(created);
    Ok(ids)
  }

  #[tracing::instrument(skip(self))]
  pub fn remove_event(
    &mut self,
    id: &EventId
  ) -> Result<CalendarEvent, StateError> {
    let removed = self.take_event(id)?;
    info!(title = %removed.title, "event deleted");
    Ok(removed)
  }

  /// Like [`Self::remove_event`], but the
  /// event is kept aside instead of being
  /// discarded.
  #[tracing::instrument(skip(self))]
  pub fn archive_event(
    &mut self,
    id: &EventId
  ) -> Result<(), StateError> {
    let archived = self.take_event(id)?;
    info!(title = %archived.title, "event archived");
    self.archived.push(archived);
    Ok(())
  }

  fn take_event(
    &mut self,
    id: &EventId
  ) -> Result<CalendarEvent, StateError> {
    let idx = self
      .events
      .iter()
      .position(|event| &event.id == id)
      .ok_or_else(|| {
        StateError::EventNotFound(
          id.clone()
        )
      })?;
    Ok(self.events.remove(idx))
  }

  /// Moves the month view; the sidebar
  /// follows to the same month.
  #[tracing::instrument(skip(self))]
  pub fn set_reference_date(
    &mut self,
    date: NaiveDate
  ) {
    self.reference_date = date;
    self.sidebar_month = month_start(date);
    debug!("reference date changed");
  }

  /// A click on a grid or sidebar cell.
  pub fn select_date(
    &mut self,
    date: NaiveDate
  ) {
    self.set_reference_date(date);
  }

  pub fn prev_month(&mut self) {
    self.step_month(-1);
  }

  pub fn next_month(&mut self) {
    self.step_month(1);
  }

  fn step_month(&mut self, months: i32) {
    match shift_month_start(
      self.reference_date,
      months
    ) {
      | Some(target) => {
        self.set_reference_date(target)
      }
      | None => {
        warn!(
          reference = %self.reference_date,
          months,
          "month view is at the end of the date range"
        )
      }
    }
  }

  pub fn go_to_today(
    &mut self,
    today: NaiveDate
  ) {
    self.set_reference_date(today);
  }

  /// Pages the sidebar calendar without
  /// touching the main view.
  pub fn sidebar_prev_month(&mut self) {
    self.step_sidebar(-1);
  }

  pub fn sidebar_next_month(&mut self) {
    self.step_sidebar(1);
  }

  fn step_sidebar(&mut self, months: i32) {
    match shift_month_start(
      self.sidebar_month,
      months
    ) {
      | Some(target) => {
        self.sidebar_month = target
      }
      | None => {
        warn!(
          sidebar = %self.sidebar_month,
          months,
          "sidebar is at the end of the date range"
        )
      }
    }
  }

  pub fn toggle_filter(
    &mut self,
    key: &CategoryKey
  ) -> bool {
    self.filter.toggle(key)
  }

  pub fn toggle_all_filters(&mut self) {
    self.filter.toggle_all();
  }

  /// The filter popover rows, in registry
  /// order.
  pub fn filter_options(
    &self
  ) -> Vec<FilterOption> {
    self
      .filter
      .all_keys()
      .iter()
      .map(|key| {
        FilterOption {
          key:    key.clone(),
          active: self.filter.is_active(key)
        }
      })
      .collect()
  }

  #[tracing::instrument(skip(self), fields(reference = %self.reference_date))]
  pub fn snapshot(
    &self
  ) -> CalendarSnapshot {
    let visible_events =
      self.filter.apply(&self.events);
    let bins =
      EventBins::bin(&visible_events);

    CalendarSnapshot {
      reference_date: self
        .reference_date,
      title: self
        .reference_date
        .format("%b %Y")
        .to_string(),
      days: generate_calendar_days(
        self.reference_date
      ),
      sidebar_month: self.sidebar_month,
      sidebar_title: self
        .sidebar_month
        .format("%B %Y")
        .to_string(),
      sidebar_days: mini_calendar_days(
        self.sidebar_month,
        self.mini_cells
      ),
      visible_events,
      bins,
      active_filters: self
        .filter
        .active_keys(),
      all_active: self
        .filter
        .is_all_active(),
      total_events: self.events.len(),
      archived_count: self.archived.len()
    }
  }
}
