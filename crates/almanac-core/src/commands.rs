use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::category::CategoryKey;
use crate::cli::{Command, FilterArgs, NavArgs, parse_date_arg};
use crate::config::Config;
use crate::render::Renderer;
use crate::state::CalendarState;

#[tracing::instrument(skip(state, cfg, renderer))]
pub fn dispatch(
    state: &mut CalendarState,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
    today: NaiveDate,
) -> anyhow::Result<()> {
    match command {
        Command::Month { date, nav, filters } => {
            if let Some(raw) = date {
                state.set_reference_date(parse_date_arg(&raw, today)?);
            }
            navigate_month(state, &nav);
            apply_filters(state, &filters)?;

            let limit = cfg.preview_limit()?;
            let snapshot = state.snapshot();
            info!(
                month = %snapshot.title,
                visible = snapshot.visible_events.len(),
                "rendering month"
            );
            renderer.print_month(&snapshot, state.registry(), limit, today)
        }
        Command::Mini { date, nav } => {
            if let Some(raw) = date {
                state.set_reference_date(parse_date_arg(&raw, today)?);
            }
            navigate_sidebar(state, &nav);
            renderer.print_mini(&state.snapshot())
        }
        Command::Day { date, filters } => {
            let day = parse_date_arg(&date, today)?;
            state.select_date(day);
            apply_filters(state, &filters)?;
            renderer.print_day(&state.snapshot(), state.registry(), day)
        }
        Command::Categories { filters } => {
            apply_filters(state, &filters)?;
            renderer.print_categories(state)
        }
    }
}

fn navigate_month(state: &mut CalendarState, nav: &NavArgs) {
    let steps = nav.steps();
    debug!(steps, "navigating month view");
    for _ in 0..steps.max(0) {
        state.next_month();
    }
    for _ in 0..(-steps).max(0) {
        state.prev_month();
    }
}

fn navigate_sidebar(state: &mut CalendarState, nav: &NavArgs) {
    let steps = nav.steps();
    debug!(steps, "navigating sidebar");
    for _ in 0..steps.max(0) {
        state.sidebar_next_month();
    }
    for _ in 0..(-steps).max(0) {
        state.sidebar_prev_month();
    }
}

/// Drives the filter the same way the
/// popover does: `--none` is the "All"
/// checkbox, `--only` and `--hide` are
/// per-category toggles.
pub fn apply_filters(state: &mut CalendarState, args: &FilterArgs) -> anyhow::Result<()> {
    let only = resolve_keys(state, &args.only)?;
    let hide = resolve_keys(state, &args.hide)?;

    if args.none || !only.is_empty() {
        if !state.filter().is_all_active() {
            state.toggle_all_filters();
        }
        state.toggle_all_filters();
    }

    for key in &only {
        if !state.filter().is_active(key) {
            state.toggle_filter(key);
        }
    }

    for key in &hide {
        if state.filter().is_active(key) {
            state.toggle_filter(key);
        }
    }

    debug!(active = ?state.filter().active_keys(), "filters applied");
    Ok(())
}

fn resolve_keys(state: &CalendarState, raw: &[String]) -> anyhow::Result<Vec<CategoryKey>> {
    raw.iter()
        .map(|name| {
            state
                .registry()
                .lookup_str(name)
                .map(|category| category.key.clone())
                .with_context(|| format!("unknown category filter: {name}"))
        })
        .collect()
}
