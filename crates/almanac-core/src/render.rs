use std::io::{self, IsTerminal, Write};

use anyhow::Context;
use chrono::NaiveDate;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::category::{CategoryRegistry, swatch_hex};
use crate::config::Config;
use crate::event::CalendarEvent;
use crate::grid::{MINI_WEEKDAY_HEADERS, WEEKDAY_HEADERS, month_weeks};
use crate::state::{CalendarSnapshot, CalendarState};

const CELL_WIDTH: usize = 14;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = Self::color_setting(cfg)?;
        Ok(Self { color: color && io::stdout().is_terminal() })
    }

    /// The configured `color` switch, on when unset.
    fn color_setting(cfg: &Config) -> anyhow::Result<bool> {
        Ok(cfg.get_bool("color").context("invalid color setting")?.unwrap_or(true))
    }

    #[tracing::instrument(skip_all)]
    pub fn print_month(
        &mut self,
        snapshot: &CalendarSnapshot,
        registry: &CategoryRegistry,
        limit: usize,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_month(&mut out, snapshot, registry, limit, today)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_mini(&mut self, snapshot: &CalendarSnapshot) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_mini(&mut out, snapshot)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_day(
        &mut self,
        snapshot: &CalendarSnapshot,
        registry: &CategoryRegistry,
        day: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_day(&mut out, snapshot, registry, day)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_categories(&mut self, state: &CalendarState) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_categories(&mut out, state)
    }

    pub fn write_month<W: Write>(
        &self,
        mut out: W,
        snapshot: &CalendarSnapshot,
        registry: &CategoryRegistry,
        limit: usize,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let filter_note = if snapshot.all_active {
            "all categories".to_string()
        } else if snapshot.active_filters.is_empty() {
            "no categories".to_string()
        } else {
            snapshot
                .active_filters
                .iter()
                .map(|key| key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(out, "{}  ({filter_note})", snapshot.title)?;

        let border = format!("+{}", format!("{}+", "-".repeat(CELL_WIDTH)).repeat(7));
        writeln!(out, "{border}")?;
        write!(out, "|")?;
        for header in WEEKDAY_HEADERS {
            write!(out, "{}|", fit(&format!(" {header}"), CELL_WIDTH))?;
        }
        writeln!(out)?;
        writeln!(out, "{border}")?;

        for week in month_weeks(&snapshot.days) {
            write!(out, "|")?;
            for day in week {
                let mut label = format!(" {}", day.day_of_month);
                if day.date == snapshot.reference_date {
                    label.push('*');
                }
                if day.date == today {
                    label.push_str(" today");
                }
                let cell = fit(&label, CELL_WIDTH);
                let cell = if day.is_current_month { cell } else { self.paint(&cell, "2") };
                write!(out, "{cell}|")?;
            }
            writeln!(out)?;

            for line in 0..=limit {
                write!(out, "|")?;
                for day in week {
                    let preview = snapshot.bins.preview(day.date, limit);
                    let cell = if let Some(event) = preview.shown.get(line) {
                        self.event_chip(event, registry)
                    } else if line == preview.shown.len() {
                        match preview.overflow_label() {
                            Some(more) => fit(&format!(" {more}"), CELL_WIDTH),
                            None => " ".repeat(CELL_WIDTH),
                        }
                    } else {
                        " ".repeat(CELL_WIDTH)
                    };
                    write!(out, "{cell}|")?;
                }
                writeln!(out)?;
            }
            writeln!(out, "{border}")?;
        }

        let dropped = snapshot.bins.dropped_count();
        if dropped > 0 {
            writeln!(out, "{dropped} event(s) have no valid date and are not shown")?;
        }
        Ok(())
    }

    pub fn write_mini<W: Write>(&self, mut out: W, snapshot: &CalendarSnapshot) -> anyhow::Result<()> {
        writeln!(out, "{}", snapshot.sidebar_title)?;
        writeln!(out, "{}", MINI_WEEKDAY_HEADERS.map(|h| format!("{h:>3}")).concat())?;

        for week in month_weeks(&snapshot.sidebar_days) {
            for day in week {
                let selected = day.date == snapshot.reference_date;
                let cell = format!("{:>2}{}", day.day_of_month, if selected { "*" } else { " " });
                let cell = if selected {
                    self.paint(&cell, "7")
                } else if day.is_current_month {
                    cell
                } else {
                    self.paint(&cell, "2")
                };
                write!(out, "{cell}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn write_day<W: Write>(
        &self,
        mut out: W,
        snapshot: &CalendarSnapshot,
        registry: &CategoryRegistry,
        day: NaiveDate,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", day.format("%A, %Y-%m-%d"))?;

        let bucket = snapshot.bins.bucket(day);
        if bucket.is_empty() {
            writeln!(out, "No events.")?;
            return Ok(());
        }

        let rows = bucket
            .iter()
            .map(|event| {
                vec![
                    event.time_label(),
                    self.event_chip(event, registry).trim_end().to_string(),
                    event.category.to_string(),
                    event
                        .links
                        .iter()
                        .map(|link| format!("{} <{}>", link.title, link.url))
                        .collect::<Vec<_>>()
                        .join(", "),
                ]
            })
            .collect::<Vec<_>>();

        write_table(
            &mut out,
            vec![
                "Time".to_string(),
                "Title".to_string(),
                "Category".to_string(),
                "Links".to_string(),
            ],
            rows,
        )
    }

    pub fn write_categories<W: Write>(&self, mut out: W, state: &CalendarState) -> anyhow::Result<()> {
        let registry = state.registry();
        let quick = registry
            .quick_picks()
            .into_iter()
            .map(|category| category.key.clone())
            .collect::<Vec<_>>();

        let all_mark = if state.filter().is_all_active() { "[x]" } else { "[ ]" };
        let mut rows = vec![vec![
            all_mark.to_string(),
            "All".to_string(),
            String::new(),
            String::new(),
        ]];

        for option in state.filter_options() {
            let swatch = registry
                .lookup(&option.key)
                .map(|category| category.rect_hex().to_string())
                .unwrap_or_default();
            rows.push(vec![
                if option.active { "[x]" } else { "[ ]" }.to_string(),
                self.paint_hex(option.key.as_str(), &swatch),
                swatch,
                if quick.contains(&option.key) { "frequently requested" } else { "" }.to_string(),
            ]);
        }

        write_table(
            &mut out,
            vec![
                "Shown".to_string(),
                "Category".to_string(),
                "Color".to_string(),
                "Pick".to_string(),
            ],
            rows,
        )
    }

    /// One line of a cell: a colored bar and
    /// the event title, cut to fit.
    fn event_chip(&self, event: &CalendarEvent, registry: &CategoryRegistry) -> String {
        let cell = fit(&format!(" | {}", event.title), CELL_WIDTH);
        match registry.lookup(&event.category) {
            Ok(category) => {
                let (bar, rest) = cell.split_at(2);
                format!("{}{rest}", self.paint_hex(bar, swatch_hex(&category.rect_color)))
            }
            Err(_) => cell,
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn paint_hex(&self, text: &str, hex: &str) -> String {
        match parse_hex_rgb(hex) {
            Some((r, g, b)) => self.paint(text, &format!("38;2;{r};{g};{b}")),
            None => text.to_string(),
        }
    }
}

/// Cuts `text` to `width` columns (with an
/// ellipsis when it had to cut) and pads it
/// out to exactly `width`.
fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0usize;

    if UnicodeWidthStr::width(text) <= width {
        out.push_str(text);
        used = UnicodeWidthStr::width(text);
    } else {
        for ch in text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if used + w + 1 > width {
                break;
            }
            out.push(ch);
            used += w;
        }
        out.push('…');
        used += 1;
    }

    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn parse_hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    let expanded = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |idx: usize| u8::from_str_radix(expanded.get(idx..idx + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
