use almanac_core::binning::DEFAULT_PREVIEW_LIMIT;
use almanac_core::category::{CategoryKey, CategoryRegistry};
use almanac_core::draft::EventDraft;
use almanac_core::event::CalendarEvent;
use almanac_core::grid::generate_calendar_days;
use almanac_core::links::normalize_link;
use almanac_core::state::CalendarState;
use chrono::{Datelike, NaiveDate, Weekday};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn key(raw: &str) -> CategoryKey {
    CategoryKey::parse(raw).expect("valid key")
}

#[test]
fn month_view_flow_from_seed_to_snapshot() {
    let registry = CategoryRegistry::seeded().expect("seed");
    let mut typo = CalendarEvent::new(ymd(2024, 2, 10), "Typo", key("Tasks"));
    typo.date = "2024/02/10".to_string();

    let mut state = CalendarState::new(registry, vec![typo], ymd(2024, 2, 1));

    for title in ["Kickoff", "Lunch", "Retro"] {
        state
            .add_event(EventDraft::new(title, ymd(2024, 2, 10), "Meetings"))
            .expect("add meeting");
    }

    let mut draft = EventDraft::new("Docs sweep", ymd(2024, 2, 14), "Tasks");
    draft.recurring = true;
    draft.all_day = true;
    draft.links.push(normalize_link("wiki.example.com/docs", None).expect("link"));
    let recurring = state.add_event(draft).expect("add recurring");
    assert_eq!(recurring.len(), 5);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.title, "Feb 2024");
    assert_eq!(snapshot.days.len(), 35);
    assert_eq!(snapshot.days[0].date, ymd(2024, 1, 28));
    assert_eq!(snapshot.days[34].date, ymd(2024, 3, 2));
    assert_eq!(snapshot.total_events, 1 + 3 + 5);
    assert_eq!(snapshot.bins.dropped_count(), 1);

    let preview = snapshot.bins.preview(ymd(2024, 2, 10), DEFAULT_PREVIEW_LIMIT);
    let titles = preview.shown.iter().map(|e| e.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["Kickoff", "Lunch"]);
    assert_eq!(preview.overflow_label().as_deref(), Some("+ 1 more"));

    let friday = snapshot.bins.bucket(ymd(2024, 2, 16));
    assert_eq!(friday.len(), 1);
    assert_eq!(friday[0].links[0].url, "https://wiki.example.com/docs");

    // the malformed event is still in the list, just not on the grid
    assert!(state.events().iter().any(|e| e.title == "Typo"));
}

#[test]
fn filters_shape_the_snapshot() {
    let registry = CategoryRegistry::seeded().expect("seed");
    let mut state = CalendarState::new(registry, vec![], ymd(2024, 3, 1));
    state
        .add_event(EventDraft::new("Standup", ymd(2024, 3, 4), "Meetings"))
        .expect("add");
    state
        .add_event(EventDraft::new("Ship", ymd(2024, 3, 4), "Deadlines"))
        .expect("add");

    state.toggle_filter(&key("Meetings"));
    let snapshot = state.snapshot();
    assert!(!snapshot.all_active);
    assert_eq!(snapshot.visible_events.len(), 1);
    assert_eq!(snapshot.bins.bucket(ymd(2024, 3, 4))[0].title, "Ship");

    // partially active: "All" turns everything back on
    state.toggle_all_filters();
    assert!(state.snapshot().all_active);
    assert_eq!(state.snapshot().visible_events.len(), 2);

    // fully active: "All" clears, and nothing is shown
    state.toggle_all_filters();
    let snapshot = state.snapshot();
    assert!(snapshot.active_filters.is_empty());
    assert!(snapshot.visible_events.is_empty());
    assert_eq!(snapshot.bins.binned_count(), 0);
    assert_eq!(snapshot.total_events, 2);
}

#[test]
fn navigation_regenerates_grid_across_year_boundary() {
    let registry = CategoryRegistry::seeded().expect("seed");
    let mut state = CalendarState::new(registry, vec![], ymd(2024, 12, 31));

    state.next_month();
    let january = state.snapshot();
    assert_eq!(january.reference_date, ymd(2025, 1, 1));
    assert_eq!(january.title, "Jan 2025");
    assert_eq!(january.days[0].date, ymd(2024, 12, 29));
    assert_eq!(january.sidebar_title, "January 2025");
    assert_eq!(january.sidebar_days.len(), 35);

    state.prev_month();
    state.prev_month();
    assert_eq!(state.snapshot().title, "Nov 2024");
}

#[test]
fn grid_properties_hold_for_a_decade() {
    let mut month = ymd(2020, 1, 1);
    while month.year() < 2030 {
        let days = generate_calendar_days(month);
        assert_eq!(days.len() % 7, 0);
        assert_eq!(days[0].date.weekday(), Weekday::Sun);
        assert_eq!(days[days.len() - 1].date.weekday(), Weekday::Sat);
        assert_eq!(days, generate_calendar_days(month));

        let in_month = days.iter().filter(|d| d.is_current_month).count();
        let next = almanac_core::datetime::shift_month_start(month, 1).expect("in range");
        let expected = (next - month).num_days() as usize;
        assert_eq!(in_month, expected);

        month = next;
    }
}
