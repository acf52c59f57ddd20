use std::collections::BTreeSet;

use tracing::{
  debug,
  warn
};

use crate::category::{
  CategoryKey,
  CategoryRegistry
};
use crate::event::CalendarEvent;

/// Which categories are visible. Starts
/// with everything on; lives as long as the
/// view does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
  all:    Vec<CategoryKey>,
  active: BTreeSet<CategoryKey>
}

impl CategoryFilter {
  pub fn new(
    categories: Vec<CategoryKey>
  ) -> Self {
    let active = categories
      .iter()
      .cloned()
      .collect::<BTreeSet<_>>();
    Self {
      all: categories,
      active
    }
  }

  pub fn for_registry(
    registry: &CategoryRegistry
  ) -> Self {
    Self::new(registry.keys())
  }

  /// Flips one category. Keys the view does
  /// not know about are ignored so the
  /// active set never outgrows the full set.
  #[tracing::instrument(skip(self, key), fields(key = %key))]
  pub fn toggle(
    &mut self,
    key: &CategoryKey
  ) -> bool {
    if !self.all.contains(key) {
      warn!(
        "ignoring toggle for unknown category"
      );
      return false;
    }

    let now_active =
      if self.active.remove(key) {
        false
      } else {
        self.active.insert(key.clone());
        true
      };
    debug!(
      now_active,
      active = self.active.len(),
      "toggled category"
    );
    now_active
  }

  /// The "All" checkbox: clears when every
  /// category is on, otherwise turns every
  /// category on.
  #[tracing::instrument(skip(self))]
  pub fn toggle_all(&mut self) {
    if self.is_all_active() {
      self.active.clear();
    } else {
      self.active =
        self.all.iter().cloned().collect();
    }
    debug!(
      active = self.active.len(),
      total = self.all.len(),
      "toggled all categories"
    );
  }

  pub fn is_all_active(&self) -> bool {
    self.active.len() == self.all.len()
  }

  pub fn is_active(
    &self,
    key: &CategoryKey
  ) -> bool {
    self.active.contains(key)
  }

  /// Active keys in display order.
  pub fn active_keys(
    &self
  ) -> Vec<CategoryKey> {
    self
      .all
      .iter()
      .filter(|key| self.active.contains(*key))
      .cloned()
      .collect()
  }

  pub fn all_keys(&self) -> &[CategoryKey] {
    &self.all
  }

  /// Events in an active category, in their
  /// original order. Nothing active means
  /// nothing shown.
  pub fn apply(
    &self,
    events: &[CalendarEvent]
  ) -> Vec<CalendarEvent> {
    if self.active.is_empty() {
      return Vec::new();
    }
    events
      .iter()
      .filter(|event| {
        self.active.contains(&event.category)
      })
      .cloned()
      .collect()
  }
}
