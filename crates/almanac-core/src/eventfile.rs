use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::category::CategoryRegistry;
use crate::config::Config;
use crate::event::CalendarEvent;

/// Reads a JSON array of events. Events are
/// only read here; the calendar never
/// writes them back.
#[tracing::instrument(skip(path, registry), fields(path = %path.display()))]
pub fn load_events(path: &Path, registry: &CategoryRegistry) -> anyhow::Result<Vec<CalendarEvent>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let events: Vec<CalendarEvent> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse events in {}", path.display()))?;

    let undated = events.iter().filter(|event| event.day().is_none()).count();
    if undated > 0 {
        warn!(undated, "some events have malformed dates and will not appear on the grid");
    }

    for event in events.iter().filter(|event| !registry.contains(&event.category)) {
        warn!(
            id = %event.id,
            category = %event.category,
            "event category is not configured; it will never pass the filter"
        );
    }

    info!(events = events.len(), "loaded events");
    Ok(events)
}

/// The configured category list, or the
/// embedded seed when `categories.location`
/// is unset.
#[tracing::instrument(skip(cfg))]
pub fn load_registry(cfg: &Config) -> anyhow::Result<CategoryRegistry> {
    match cfg.get_path("categories.location") {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            CategoryRegistry::from_toml(&text)
                .with_context(|| format!("failed to load categories from {}", path.display()))
        }
        None => CategoryRegistry::seeded().context("embedded category seed is invalid"),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn loads_events_and_keeps_malformed_dates() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("events.json");
        fs::write(
            &path,
            r#"[
                {"date": "2024-02-10", "title": "Kickoff", "type": "Meetings"},
                {"date": "10/02/2024", "title": "Typo", "type": "Tasks"},
                {"date": "2024-02-11", "title": "Ghost", "type": "Standups"}
            ]"#,
        )
        .expect("write events");

        let registry = CategoryRegistry::seeded().expect("seed");
        let events = load_events(&path, &registry).expect("load events");
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].day(), None);
    }

    #[test]
    fn malformed_time_only_affects_its_event() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("events.json");
        fs::write(
            &path,
            r#"[
                {"date": "2024-02-10", "title": "Breakfast", "type": "Meetings", "startTime": "9am", "endTime": "10:00"},
                {"date": "2024-02-10", "title": "Review", "type": "Meetings", "startTime": "14:00", "endTime": "15:00"}
            ]"#,
        )
        .expect("write events");

        let registry = CategoryRegistry::seeded().expect("seed");
        let events = load_events(&path, &registry).expect("load events");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start_time, None);
        assert!(events[0].end_time.is_some());
        assert_eq!(events[1].time_label(), "14:00 - 15:00");
    }

    #[test]
    fn broken_json_reports_the_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("events.json");
        fs::write(&path, "{ not json").expect("write events");

        let registry = CategoryRegistry::seeded().expect("seed");
        let err = load_events(&path, &registry).expect_err("invalid json");
        assert!(format!("{err:#}").contains("events.json"));
    }

    #[test]
    fn registry_can_come_from_config() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("categories.toml");
        fs::write(
            &path,
            "[[category]]\ntype = \"Focus\"\nbg_color = \"bg-[#eeeeee]\"\nrect_color = \"bg-[#333333]\"\n",
        )
        .expect("write categories");

        let mut cfg = Config::defaults();
        cfg.apply_overrides(vec![(
            "categories.location".to_string(),
            path.display().to_string(),
        )]);

        let registry = load_registry(&cfg).expect("load registry");
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup_str("Focus").is_ok());
    }
}
