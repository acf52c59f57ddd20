use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{
  Deserialize,
  Serialize
};
use thiserror::Error;
use tracing::{
  debug,
  info
};

/// Filter pseudo-category that stands for
/// "every category"; never a real key.
pub const ALL_PSEUDO_CATEGORY: &str =
  "All";

/// Shown as "Frequently Requested" on the
/// add-event form, in this order.
pub const QUICK_PICK_CATEGORIES: [&str;
  3] = ["Tasks", "Meetings", "Time Off"];

const SEED_CATEGORIES_TOML: &str =
  include_str!(
    "../config/categories.toml"
  );

const FALLBACK_SWATCH: &str = "#888";

#[derive(Debug, Error)]
pub enum CategoryError {
  #[error("category key cannot be empty")]
  EmptyKey,

  #[error(
    "\"{0}\" is reserved and cannot name \
     a category"
  )]
  ReservedKey(String),

  #[error(
    "category \"{0}\" is not configured"
  )]
  NotFound(String),

  #[error(
    "failed to parse category list: {0}"
  )]
  Parse(#[from] toml::de::Error)
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(
  try_from = "String",
  into = "String"
)]
pub struct CategoryKey(String);

impl CategoryKey {
  pub fn parse(
    raw: &str
  ) -> Result<Self, CategoryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(
        CategoryError::EmptyKey
      );
    }
    if trimmed.eq_ignore_ascii_case(
      ALL_PSEUDO_CATEGORY
    ) {
      return Err(
        CategoryError::ReservedKey(
          trimmed.to_string()
        )
      );
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for CategoryKey {
  type Error = CategoryError;

  fn try_from(
    value: String
  ) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<CategoryKey> for String {
  fn from(value: CategoryKey) -> Self {
    value.0
  }
}

impl FromStr for CategoryKey {
  type Err = CategoryError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl fmt::Display for CategoryKey {
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
pub struct EventCategory {
  #[serde(rename = "type")]
  pub key:        CategoryKey,
  pub bg_color:   String,
  pub rect_color: String
}

impl EventCategory {
  pub fn bg_hex(&self) -> &str {
    swatch_hex(&self.bg_color)
  }

  pub fn rect_hex(&self) -> &str {
    swatch_hex(&self.rect_color)
  }
}

/// Pulls the color out of a utility-class
/// token such as `bg-[#697d67]`. Tokens
/// without a bracketed value fall back to
/// a neutral grey.
pub fn swatch_hex(token: &str) -> &str {
  token
    .split_once('[')
    .and_then(|(_, rest)| {
      rest.split_once(']')
    })
    .map(|(inner, _)| inner)
    .filter(|inner| !inner.is_empty())
    .unwrap_or(FALLBACK_SWATCH)
}

#[derive(Debug, Deserialize)]
struct CategorySeed {
  #[serde(default)]
  category: Vec<EventCategory>
}

/// Read-only category reference data with
/// keyed lookup.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
  categories: Vec<EventCategory>,
  index:      HashMap<CategoryKey, usize>
}

impl CategoryRegistry {
  pub fn seeded()
  -> Result<Self, CategoryError> {
    Self::from_toml(SEED_CATEGORIES_TOML)
  }

  #[tracing::instrument(skip(text))]
  pub fn from_toml(
    text: &str
  ) -> Result<Self, CategoryError> {
    let seed =
      toml::from_str::<CategorySeed>(
        text
      )?;
    let registry = Self::from_categories(
      seed.category
    );
    info!(
      categories = registry.len(),
      "loaded category registry"
    );
    Ok(registry)
  }

  pub fn from_categories<I>(
    categories: I
  ) -> Self
  where
    I: IntoIterator<Item = EventCategory>
  {
    let mut registry = Self::default();
    for category in categories {
      if registry
        .index
        .contains_key(&category.key)
      {
        debug!(
          key = %category.key,
          "duplicate category in seed; keeping first"
        );
        continue;
      }
      registry.index.insert(
        category.key.clone(),
        registry.categories.len()
      );
      registry.categories.push(category);
    }
    registry
  }

  pub fn lookup(
    &self,
    key: &CategoryKey
  ) -> Result<&EventCategory, CategoryError>
  {
    self
      .index
      .get(key)
      .and_then(|idx| {
        self.categories.get(*idx)
      })
      .ok_or_else(|| {
        CategoryError::NotFound(
          key.to_string()
        )
      })
  }

  pub fn lookup_str(
    &self,
    raw: &str
  ) -> Result<&EventCategory, CategoryError>
  {
    let key = CategoryKey::parse(raw)?;
    self.lookup(&key)
  }

  pub fn contains(
    &self,
    key: &CategoryKey
  ) -> bool {
    self.index.contains_key(key)
  }

  pub fn keys(&self) -> Vec<CategoryKey> {
    self
      .categories
      .iter()
      .map(|category| category.key.clone())
      .collect()
  }

  pub fn len(&self) -> usize {
    self.categories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.categories.is_empty()
  }

  /// "Frequently Requested" options that
  /// exist in this registry.
  pub fn quick_picks(
    &self
  ) -> Vec<&EventCategory> {
    QUICK_PICK_CATEGORIES
      .iter()
      .filter_map(|name| {
        self.lookup_str(name).ok()
      })
      .collect()
  }

  /// Everything that is not a quick pick,
  /// in registry order.
  pub fn other_options(
    &self
  ) -> Vec<&EventCategory> {
    self
      .categories
      .iter()
      .filter(|category| {
        !QUICK_PICK_CATEGORIES
          .contains(&category.key.as_str())
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn category(
    key: &str,
    rect: &str
  ) -> EventCategory {
    EventCategory {
      key:        CategoryKey::parse(key)
        .expect("valid key"),
      bg_color:   "bg-gray-100".to_string(),
      rect_color: rect.to_string()
    }
  }

  #[test]
  fn keys_are_trimmed_and_validated() {
    let key = CategoryKey::parse(
      "  Meetings "
    )
    .expect("valid key");
    assert_eq!(key.as_str(), "Meetings");

    assert!(matches!(
      CategoryKey::parse("   "),
      Err(CategoryError::EmptyKey)
    ));
    assert!(matches!(
      CategoryKey::parse("all"),
      Err(CategoryError::ReservedKey(_))
    ));
  }

  #[test]
  fn seeded_registry_has_quick_picks_first()
  {
    let registry =
      CategoryRegistry::seeded()
        .expect("embedded seed parses");
    assert_eq!(registry.len(), 5);

    let picks = registry
      .quick_picks()
      .into_iter()
      .map(|c| c.key.as_str())
      .collect::<Vec<_>>();
    assert_eq!(picks, vec![
      "Tasks", "Meetings", "Time Off"
    ]);

    let others = registry
      .other_options()
      .into_iter()
      .map(|c| c.key.as_str())
      .collect::<Vec<_>>();
    assert_eq!(others, vec![
      "Deadlines", "Holidays"
    ]);
  }

  #[test]
  fn lookup_reports_missing_category() {
    let registry =
      CategoryRegistry::from_categories(
        vec![category(
          "Tasks",
          "bg-[#697d67]"
        )]
      );

    let found = registry
      .lookup_str("Tasks")
      .expect("configured category");
    assert_eq!(found.rect_hex(), "#697d67");

    match registry.lookup_str("Standup") {
      | Err(CategoryError::NotFound(
        name
      )) => {
        assert_eq!(name, "Standup")
      }
      | other => {
        panic!("unexpected: {other:?}")
      }
    }
  }

  #[test]
  fn first_duplicate_wins() {
    let registry =
      CategoryRegistry::from_categories(
        vec![
          category("Tasks", "bg-[#111111]"),
          category("Tasks", "bg-[#222222]"),
        ]
      );
    assert_eq!(registry.len(), 1);
    assert_eq!(
      registry
        .lookup_str("Tasks")
        .expect("present")
        .rect_hex(),
      "#111111"
    );
  }

  #[test]
  fn swatch_falls_back_without_brackets()
  {
    assert_eq!(
      swatch_hex("bg-[#e9f2e7]"),
      "#e9f2e7"
    );
    assert_eq!(
      swatch_hex("bg-gray-100"),
      "#888"
    );
    assert_eq!(swatch_hex("bg-[]"), "#888");
  }
}
